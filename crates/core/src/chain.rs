//! Chain and randomness collaborators
//!
//! The engine reads the block height and moves native currency through
//! [`Chain`], and draws the per-block lottery seed from a [`RandomnessOracle`].
//! Both are injected so the engine stays deterministic under test.

use blake3::Hasher;
use citymine_treasury::{InMemoryNativeLedger, LedgerError, NativeLedger, NativeTransfer};
use citymine_types::{BlockHeight, NativeAmount, Principal, Seed};
use std::collections::BTreeMap;

/// View of the underlying chain.
pub trait Chain: NativeLedger {
    /// Height of the block currently being applied.
    fn block_height(&self) -> BlockHeight;
}

/// Source of the pseudo-random seed bound to each block.
///
/// Implementations must return the same seed for the same height every time
/// and may refuse heights whose seed is not yet known.
pub trait RandomnessOracle {
    fn seed_for(&self, height: BlockHeight) -> Option<Seed>;
}

impl<T: RandomnessOracle + ?Sized> RandomnessOracle for &T {
    fn seed_for(&self, height: BlockHeight) -> Option<Seed> {
        (**self).seed_for(height)
    }
}

// -----------------------------------------------------------------------------
// Simulated chain
// -----------------------------------------------------------------------------

/// Single-node chain simulation: a block counter plus an in-memory native
/// ledger.
#[derive(Debug, Clone, Default)]
pub struct SimulatedChain {
    height: BlockHeight,
    ledger: InMemoryNativeLedger,
}

impl SimulatedChain {
    pub fn new(start_height: BlockHeight) -> Self {
        Self {
            height: start_height,
            ledger: InMemoryNativeLedger::new(),
        }
    }

    /// Produce `blocks` empty blocks.
    pub fn advance(&mut self, blocks: u64) -> BlockHeight {
        self.height = self.height.saturating_add(blocks);
        self.height
    }

    /// Jump forward to `height`. Heights never move backwards.
    pub fn advance_to(&mut self, height: BlockHeight) -> BlockHeight {
        self.height = self.height.max(height);
        self.height
    }

    /// Credit native currency to an account.
    pub fn fund(&mut self, account: &Principal, amount: NativeAmount) -> Result<(), LedgerError> {
        self.ledger.fund(account, amount)
    }

    pub fn ledger(&self) -> &InMemoryNativeLedger {
        &self.ledger
    }

    pub fn transfers(&self) -> &[NativeTransfer] {
        self.ledger.transfers()
    }
}

impl NativeLedger for SimulatedChain {
    fn native_balance(&self, account: &Principal) -> NativeAmount {
        self.ledger.native_balance(account)
    }

    fn native_transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: NativeAmount,
    ) -> Result<(), LedgerError> {
        self.ledger.native_transfer(from, to, amount)
    }
}

impl Chain for SimulatedChain {
    fn block_height(&self) -> BlockHeight {
        self.height
    }
}

// -----------------------------------------------------------------------------
// Oracles
// -----------------------------------------------------------------------------

/// Seeds derived by hashing a domain tag with the block height.
#[derive(Debug, Clone)]
pub struct HashSeedOracle {
    domain: [u8; 32],
}

impl HashSeedOracle {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: *blake3::hash(domain.as_bytes()).as_bytes(),
        }
    }
}

impl RandomnessOracle for HashSeedOracle {
    fn seed_for(&self, height: BlockHeight) -> Option<Seed> {
        let mut hasher = Hasher::new();
        hasher.update(&self.domain);
        hasher.update(&height.to_be_bytes());
        Some(*hasher.finalize().as_bytes())
    }
}

/// Explicit per-height seeds; heights without a seed report none.
#[derive(Debug, Clone, Default)]
pub struct FixedSeedOracle {
    seeds: BTreeMap<BlockHeight, Seed>,
}

impl FixedSeedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_seed(&mut self, height: BlockHeight, seed: Seed) {
        self.seeds.insert(height, seed);
    }

    pub fn with_seed(mut self, height: BlockHeight, seed: Seed) -> Self {
        self.set_seed(height, seed);
        self
    }
}

impl RandomnessOracle for FixedSeedOracle {
    fn seed_for(&self, height: BlockHeight) -> Option<Seed> {
        self.seeds.get(&height).copied()
    }
}
