//! Native-currency ledger interface
//!
//! The engine never owns native currency: commitments move from miners to the
//! city wallet or the stacking pool, and stacking payouts move from the pool
//! back to stackers, all through this interface.

use crate::book::BalanceBook;
use crate::errors::LedgerError;
use citymine_types::{NativeAmount, Principal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interface to the chain's native currency.
pub trait NativeLedger {
    /// Spendable balance of `account`.
    fn native_balance(&self, account: &Principal) -> NativeAmount;

    /// Move `amount` from `from` to `to`.
    fn native_transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: NativeAmount,
    ) -> Result<(), LedgerError>;
}

/// A settled native-currency transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTransfer {
    pub from: Principal,
    pub to: Principal,
    pub amount: NativeAmount,
}

// -----------------------------------------------------------------------------
// In-memory implementation (simulation and testing)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryNativeLedger {
    book: BalanceBook,
    transfers: Vec<NativeTransfer>,
}

impl InMemoryNativeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account with funds (genesis allocation / faucet).
    pub fn fund(&mut self, account: &Principal, amount: NativeAmount) -> Result<(), LedgerError> {
        self.book.credit(account, amount)
    }

    /// Every transfer settled so far, oldest first.
    pub fn transfers(&self) -> &[NativeTransfer] {
        &self.transfers
    }

    /// Transfers received by `account`.
    pub fn transfers_to<'a>(
        &'a self,
        account: &'a Principal,
    ) -> impl Iterator<Item = &'a NativeTransfer> + 'a {
        self.transfers.iter().filter(move |t| &t.to == account)
    }

    pub fn clear_transfers(&mut self) {
        self.transfers.clear();
    }

    pub fn total_supply(&self) -> NativeAmount {
        self.book.total()
    }
}

impl NativeLedger for InMemoryNativeLedger {
    fn native_balance(&self, account: &Principal) -> NativeAmount {
        self.book.balance(account)
    }

    fn native_transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: NativeAmount,
    ) -> Result<(), LedgerError> {
        self.book.transfer(from, to, amount)?;
        self.transfers.push(NativeTransfer {
            from: *from,
            to: *to,
            amount,
        });
        debug!(target: "treasury", "native transfer {} -> {}: {}", from, to, amount);
        Ok(())
    }
}
