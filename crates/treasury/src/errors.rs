use citymine_types::Principal;
use thiserror::Error;

/// Failures reported by a ledger collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account {account} holds {balance}, cannot debit {requested}")]
    InsufficientFunds {
        account: Principal,
        balance: u64,
        requested: u64,
    },

    #[error("transfers and mints must move a positive amount")]
    ZeroAmount,

    #[error("balance overflow crediting account {0}")]
    Overflow(Principal),
}
