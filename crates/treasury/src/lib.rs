//! Citymine Treasury Module
//!
//! Balance bookkeeping for the two assets the mining engine moves:
//! the chain's native currency (commitments, stacking payouts) and the
//! engine token (mining rewards, stacked principal).

pub mod book;
pub mod errors;
pub mod native;
pub mod token;

pub use book::BalanceBook;
pub use errors::LedgerError;
pub use native::{InMemoryNativeLedger, NativeLedger, NativeTransfer};
pub use token::{InMemoryTokenLedger, TokenLedger, TokenMint, TokenTransfer};
