//! Mining ledger
//!
//! Per-block commitment records. Every commitment occupies the half-open
//! sub-range `[low_value, high_value)` of the block's total, appended in
//! insertion order, so the ranges of one block tile `[0, total_commitment)`.

use citymine_types::{BlockHeight, NativeAmount, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One participant's commitment at one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MinerEntry {
    pub participant: ParticipantId,
    pub commitment: NativeAmount,
    pub low_value: u64,
    pub high_value: u64,
}

impl MinerEntry {
    /// Whether the reduced seed value lands in this entry's range.
    pub fn covers(&self, value: u64) -> bool {
        self.low_value <= value && value < self.high_value
    }
}

/// Everything committed at one block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MiningRecord {
    pub entries: Vec<MinerEntry>,
    pub total_commitment: NativeAmount,
    pub amount_to_city: NativeAmount,
    pub amount_to_stackers: NativeAmount,
    pub claimed_by: Option<ParticipantId>,
}

impl MiningRecord {
    pub fn entry_for(&self, participant: ParticipantId) -> Option<&MinerEntry> {
        self.entries.iter().find(|e| e.participant == participant)
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Upper bound of the last sub-range; equals `total_commitment`.
    pub fn last_high_value(&self) -> u64 {
        self.entries.last().map(|e| e.high_value).unwrap_or(0)
    }
}

/// Summary of a block, zero-valued for blocks nobody mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MiningStats {
    pub miners_count: u64,
    pub amount: NativeAmount,
    pub amount_to_city: NativeAmount,
    pub amount_to_stackers: NativeAmount,
    pub reward_claimed: bool,
}

impl From<&MiningRecord> for MiningStats {
    fn from(record: &MiningRecord) -> Self {
        Self {
            miners_count: record.entries.len() as u64,
            amount: record.total_commitment,
            amount_to_city: record.amount_to_city,
            amount_to_stackers: record.amount_to_stackers,
            reward_claimed: record.is_claimed(),
        }
    }
}

/// How one commitment is divided between the city wallet and the stacking pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitmentSplit {
    pub to_city: NativeAmount,
    pub to_stackers: NativeAmount,
}

impl CommitmentSplit {
    pub fn total(&self) -> NativeAmount {
        self.to_city + self.to_stackers
    }
}

/// Divide `amount` by `city_pct`. With nobody stacking the cycle, the whole
/// amount goes to the city.
pub fn split_commitment(amount: NativeAmount, city_pct: u64, stacking_active: bool) -> CommitmentSplit {
    if !stacking_active {
        return CommitmentSplit {
            to_city: amount,
            to_stackers: 0,
        };
    }
    let to_city = (amount as u128 * city_pct.min(100) as u128 / 100) as NativeAmount;
    CommitmentSplit {
        to_city,
        to_stackers: amount - to_city,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MiningLedger {
    blocks: BTreeMap<BlockHeight, MiningRecord>,
}

impl MiningLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, height: BlockHeight) -> Option<&MiningRecord> {
        self.blocks.get(&height)
    }

    pub fn stats(&self, height: BlockHeight) -> MiningStats {
        self.blocks
            .get(&height)
            .map(MiningStats::from)
            .unwrap_or_default()
    }

    pub fn miner(&self, height: BlockHeight, participant: ParticipantId) -> Option<MinerEntry> {
        self.blocks
            .get(&height)
            .and_then(|r| r.entry_for(participant))
            .copied()
    }

    pub fn has_mined(&self, height: BlockHeight, participant: ParticipantId) -> bool {
        self.miner(height, participant).is_some()
    }

    pub fn last_high_value(&self, height: BlockHeight) -> u64 {
        self.blocks
            .get(&height)
            .map(MiningRecord::last_high_value)
            .unwrap_or(0)
    }

    /// Append a commitment at `height`. Callers have already rejected zero
    /// amounts and duplicate entries.
    pub fn commit(
        &mut self,
        height: BlockHeight,
        participant: ParticipantId,
        split: CommitmentSplit,
    ) -> MinerEntry {
        let record = self.blocks.entry(height).or_default();
        let low_value = record.last_high_value();
        let entry = MinerEntry {
            participant,
            commitment: split.total(),
            low_value,
            high_value: low_value.saturating_add(split.total()),
        };
        record.entries.push(entry);
        record.total_commitment = record.total_commitment.saturating_add(split.total());
        record.amount_to_city = record.amount_to_city.saturating_add(split.to_city);
        record.amount_to_stackers = record.amount_to_stackers.saturating_add(split.to_stackers);
        entry
    }

    /// Record `winner` as the claimant of `height`. Returns false if the block
    /// was never mined or is already claimed.
    pub fn mark_claimed(&mut self, height: BlockHeight, winner: ParticipantId) -> bool {
        match self.blocks.get_mut(&height) {
            Some(record) if record.claimed_by.is_none() => {
                record.claimed_by = Some(winner);
                true
            }
            _ => false,
        }
    }

    /// Heights with at least one commitment, ascending.
    pub fn mined_heights(&self) -> impl Iterator<Item = BlockHeight> + '_ {
        self.blocks.keys().copied()
    }
}
