//! Citymine Core: commitment-weighted mining lottery and stacking rewards.
//!
//! Participants commit native currency to blocks; one committer per block is
//! drawn with probability proportional to its commitment and may claim the
//! scheduled token reward once the block matures. Token holders stack tokens
//! for whole reward cycles and receive a pro-rata share of the commitments
//! made during those cycles.

pub mod activation;
pub mod chain;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod mining;
pub mod registry;
pub mod selector;
pub mod stacking;

pub use activation::ActivationGate;
pub use chain::{Chain, FixedSeedOracle, HashSeedOracle, RandomnessOracle, SimulatedChain};
pub use config::{ConfigError, EngineConfig, ACTIVATION_DELAY, LOCK_CYCLES_CEILING};
pub use engine::{EngineState, MiningEngine};
pub use errors::{EngineResult, ErrorCode, ALL_ERROR_CODES};
pub use events::EngineEvent;
pub use mining::{CommitmentSplit, MinerEntry, MiningLedger, MiningRecord, MiningStats};
pub use registry::{Participant, Registry};
pub use selector::{select_winner, winning_value};
pub use stacking::{CycleStats, LockWindow, StackerRecord, StakingLedger};

/// Engine over the in-memory chain and token ledger.
pub type SimulatedEngine<R = HashSeedOracle> =
    MiningEngine<SimulatedChain, R, citymine_treasury::InMemoryTokenLedger>;

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        Chain, EngineConfig, EngineEvent, EngineResult, ErrorCode, FixedSeedOracle,
        HashSeedOracle, MiningEngine, RandomnessOracle, SimulatedChain, SimulatedEngine,
    };
    pub use citymine_treasury::{InMemoryTokenLedger, NativeLedger, TokenLedger};
    pub use citymine_types::{
        seed_from_u64, BlockHeight, NativeAmount, ParticipantId, Principal, RewardCycle,
        TokenAmount,
    };
}
