//! Scalar identifiers and amounts used across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain block height.
pub type BlockHeight = u64;

/// Reward cycle index, counted from the activation block.
pub type RewardCycle = u64;

/// Native-currency amount (the asset miners commit).
pub type NativeAmount = u64;

/// Engine token amount (the asset minted to winners and stacked).
pub type TokenAmount = u64;

/// 256-bit randomness seed for a block, big-endian.
pub type Seed = [u8; 32];

/// Stable numeric identity of a participant. Ids start at 1 and are never reused.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Encode a `u64` as a seed (big-endian, zero padded). Useful for fixed seeds
/// in tests and simulations.
pub fn seed_from_u64(value: u64) -> Seed {
    let mut seed = [0u8; 32];
    seed[24..].copy_from_slice(&value.to_be_bytes());
    seed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_from_u64_is_big_endian() {
        let seed = seed_from_u64(0x0102);
        assert_eq!(seed[30], 0x01);
        assert_eq!(seed[31], 0x02);
        assert!(seed[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn participant_id_serializes_as_number() {
        let json = serde_json::to_string(&ParticipantId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
