//! Participant registry
//!
//! Assigns each principal a stable, 1-based numeric id. Ids are never reused
//! and a participant's principal never changes once assigned.

use crate::errors::{EngineResult, ErrorCode};
use citymine_types::{ParticipantId, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A registered principal and its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub address: Principal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    ids: HashMap<Principal, ParticipantId>,
    /// Index `n` holds participant id `n + 1`.
    participants: Vec<Principal>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh id to `address`; fails if it already has one.
    pub fn register(&mut self, address: &Principal) -> EngineResult<ParticipantId> {
        if self.ids.contains_key(address) {
            return Err(ErrorCode::UserAlreadyRegistered);
        }
        Ok(self.allocate(address))
    }

    /// Existing id of `address`, or a newly allocated one.
    pub fn get_or_create(&mut self, address: &Principal) -> ParticipantId {
        match self.ids.get(address) {
            Some(id) => *id,
            None => self.allocate(address),
        }
    }

    fn allocate(&mut self, address: &Principal) -> ParticipantId {
        self.participants.push(*address);
        let id = ParticipantId(self.participants.len() as u64);
        self.ids.insert(*address, id);
        id
    }

    pub fn id_of(&self, address: &Principal) -> Option<ParticipantId> {
        self.ids.get(address).copied()
    }

    pub fn participant(&self, id: ParticipantId) -> Option<Participant> {
        let index = id.get().checked_sub(1)? as usize;
        self.participants.get(index).map(|address| Participant {
            id,
            address: *address,
        })
    }

    pub fn principal_of(&self, id: ParticipantId) -> Option<Principal> {
        self.participant(id).map(|p| p.address)
    }

    /// Highest id handed out so far.
    pub fn nonce(&self) -> u64 {
        self.participants.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
