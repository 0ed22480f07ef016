//! Deterministic balance book shared by the native and token ledgers.

use crate::errors::LedgerError;
use citymine_types::Principal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-account balances plus the running total held across all accounts.
///
/// Ordered map so snapshots compare and serialise deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceBook {
    balances: BTreeMap<Principal, u64>,
    total: u64,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Principal) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Add `amount` to `account`, growing the total.
    pub fn credit(&mut self, account: &Principal, amount: u64) -> Result<(), LedgerError> {
        let balance = self
            .balance(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*account))?;
        let total = self
            .total
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(*account))?;
        self.balances.insert(*account, balance);
        self.total = total;
        Ok(())
    }

    /// Remove `amount` from `account`, shrinking the total.
    pub fn debit(&mut self, account: &Principal, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balance(account);
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *account,
                balance,
                requested: amount,
            });
        }
        self.balances.insert(*account, balance - amount);
        self.total -= amount;
        Ok(())
    }

    /// Move `amount` between accounts. Either both legs apply or neither does.
    pub fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: u64,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let balance = self.balance(from);
        if balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *from,
                balance,
                requested: amount,
            });
        }
        // Self-transfer is a balance check only.
        if from == to {
            return Ok(());
        }
        if self.balance(to).checked_add(amount).is_none() {
            return Err(LedgerError::Overflow(*to));
        }
        self.debit(from, amount)?;
        self.credit(to, amount)
    }

    /// Snapshot of every non-zero balance.
    pub fn balances(&self) -> impl Iterator<Item = (&Principal, &u64)> {
        self.balances.iter().filter(|(_, amount)| **amount > 0)
    }
}
