//! Error codes returned by engine entry points.
//!
//! Codes live in the 1000 range so integrations can branch on the number
//! without matching on message text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failures an engine call can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ErrorCode {
    #[error("principal is already registered")]
    UserAlreadyRegistered,

    #[error("participant id not found")]
    UserIdNotFound,

    #[error("activation threshold already reached; registration is closed")]
    ActivationThresholdReached,

    #[error("engine is not activated yet")]
    ContractNotActivated,

    #[error("participant already mined at this block")]
    UserAlreadyMined,

    #[error("commitment must be positive")]
    InsufficientCommitment,

    #[error("native balance is below the commitment")]
    InsufficientBalance,

    #[error("participant did not mine in this block")]
    UserDidNotMineInBlock,

    #[error("mining reward is not mature yet")]
    ClaimedBeforeMaturity,

    #[error("no miners at this block")]
    NoMinersAtBlock,

    #[error("mining reward for this block was already claimed")]
    RewardAlreadyClaimed,

    #[error("participant did not win this block")]
    MinerDidNotWin,

    #[error("no randomness seed available for this block")]
    NoVrfSeedFound,

    #[error("stacking amount or lock period out of range")]
    CannotStack,

    #[error("reward cycle has not completed")]
    RewardCycleNotCompleted,

    #[error("nothing to redeem for this cycle")]
    NothingToRedeem,

    #[error("token balance is below the stacking amount")]
    InsufficientTokenBalance,

    #[error("ledger rejected the settlement")]
    LedgerRejected,
}

impl ErrorCode {
    /// Stable numeric code. 1000, 1002 and 1015 are retired and never
    /// reassigned.
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::UserAlreadyRegistered => 1001,
            ErrorCode::UserIdNotFound => 1003,
            ErrorCode::ActivationThresholdReached => 1004,
            ErrorCode::ContractNotActivated => 1005,
            ErrorCode::UserAlreadyMined => 1006,
            ErrorCode::InsufficientCommitment => 1007,
            ErrorCode::InsufficientBalance => 1008,
            ErrorCode::UserDidNotMineInBlock => 1009,
            ErrorCode::ClaimedBeforeMaturity => 1010,
            ErrorCode::NoMinersAtBlock => 1011,
            ErrorCode::RewardAlreadyClaimed => 1012,
            ErrorCode::MinerDidNotWin => 1013,
            ErrorCode::NoVrfSeedFound => 1014,
            ErrorCode::CannotStack => 1016,
            ErrorCode::RewardCycleNotCompleted => 1017,
            ErrorCode::NothingToRedeem => 1018,
            ErrorCode::InsufficientTokenBalance => 1019,
            ErrorCode::LedgerRejected => 1020,
        }
    }

    /// Inverse of [`ErrorCode::code`].
    pub fn from_code(code: u32) -> Option<Self> {
        ALL_ERROR_CODES.iter().copied().find(|e| e.code() == code)
    }
}

/// Every variant, in code order.
pub const ALL_ERROR_CODES: [ErrorCode; 18] = [
    ErrorCode::UserAlreadyRegistered,
    ErrorCode::UserIdNotFound,
    ErrorCode::ActivationThresholdReached,
    ErrorCode::ContractNotActivated,
    ErrorCode::UserAlreadyMined,
    ErrorCode::InsufficientCommitment,
    ErrorCode::InsufficientBalance,
    ErrorCode::UserDidNotMineInBlock,
    ErrorCode::ClaimedBeforeMaturity,
    ErrorCode::NoMinersAtBlock,
    ErrorCode::RewardAlreadyClaimed,
    ErrorCode::MinerDidNotWin,
    ErrorCode::NoVrfSeedFound,
    ErrorCode::CannotStack,
    ErrorCode::RewardCycleNotCompleted,
    ErrorCode::NothingToRedeem,
    ErrorCode::InsufficientTokenBalance,
    ErrorCode::LedgerRejected,
];

/// Result of an engine call.
pub type EngineResult<T> = std::result::Result<T, ErrorCode>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_in_core_range() {
        let codes: HashSet<u32> = ALL_ERROR_CODES.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), ALL_ERROR_CODES.len());
        assert!(codes.iter().all(|c| (1000..2000).contains(c)));
    }

    #[test]
    fn codes_round_trip() {
        for err in ALL_ERROR_CODES {
            assert_eq!(ErrorCode::from_code(err.code()), Some(err));
        }
        assert_eq!(ErrorCode::from_code(42), None);
        for retired in [1000, 1002, 1015] {
            assert_eq!(ErrorCode::from_code(retired), None);
        }
    }

    #[test]
    fn known_codes() {
        assert_eq!(ErrorCode::ContractNotActivated.code(), 1005);
        assert_eq!(ErrorCode::MinerDidNotWin.code(), 1013);
        assert_eq!(ErrorCode::NothingToRedeem.code(), 1018);
    }
}
