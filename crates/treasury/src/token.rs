//! Fungible token bookkeeping consumed by the mining engine.

use crate::book::BalanceBook;
use crate::errors::LedgerError;
use citymine_types::{Principal, TokenAmount};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Interface to the engine token.
pub trait TokenLedger {
    /// Token balance of `account`.
    fn balance_of(&self, account: &Principal) -> TokenAmount;

    /// Create `amount` new tokens for `to`.
    fn mint(&mut self, to: &Principal, amount: TokenAmount) -> Result<(), LedgerError>;

    /// Move `amount` tokens between accounts.
    fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: TokenAmount,
    ) -> Result<(), LedgerError>;

    /// Tokens in existence.
    fn total_supply(&self) -> TokenAmount;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMint {
    pub to: Principal,
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub from: Principal,
    pub to: Principal,
    pub amount: TokenAmount,
}

// -----------------------------------------------------------------------------
// In-memory implementation (simulation and testing)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryTokenLedger {
    book: BalanceBook,
    mints: Vec<TokenMint>,
    transfers: Vec<TokenTransfer>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mints(&self) -> &[TokenMint] {
        &self.mints
    }

    pub fn transfers(&self) -> &[TokenTransfer] {
        &self.transfers
    }

    /// Total minted to `account` over the ledger's lifetime.
    pub fn minted_to(&self, account: &Principal) -> TokenAmount {
        self.mints
            .iter()
            .filter(|m| &m.to == account)
            .map(|m| m.amount)
            .sum()
    }

    pub fn clear_calls(&mut self) {
        self.mints.clear();
        self.transfers.clear();
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, account: &Principal) -> TokenAmount {
        self.book.balance(account)
    }

    fn mint(&mut self, to: &Principal, amount: TokenAmount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        self.book.credit(to, amount)?;
        self.mints.push(TokenMint { to: *to, amount });
        info!(target: "treasury", "minted {} tokens to {}", amount, to);
        Ok(())
    }

    fn transfer(
        &mut self,
        from: &Principal,
        to: &Principal,
        amount: TokenAmount,
    ) -> Result<(), LedgerError> {
        self.book.transfer(from, to, amount)?;
        self.transfers.push(TokenTransfer {
            from: *from,
            to: *to,
            amount,
        });
        debug!(target: "treasury", "token transfer {} -> {}: {}", from, to, amount);
        Ok(())
    }

    fn total_supply(&self) -> TokenAmount {
        self.book.total()
    }
}
