//! In-process world state: token balances per holder.
//!
//! Pool reserves are the pool contract's own balances, so a snapshot of the
//! ledger captures every trader, pool and lender at once. `atomic` is the
//! transaction boundary the executor and flash-loan coordinator build on.

use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

use crate::domain::Address;

/// Ledger errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Holder does not own enough of the token.
    #[error("insufficient balance of {token} for {holder}: have {available}, need {required}")]
    InsufficientBalance {
        holder: Address,
        token: Address,
        available: Decimal,
        required: Decimal,
    },

    /// Transfers must move a positive amount.
    #[error("invalid transfer amount {0}")]
    InvalidAmount(Decimal),
}

/// Snapshot is an opaque copy of the ledger taken by `Ledger::snapshot`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    balances: HashMap<(Address, Address), Decimal>,
}

/// Ledger holds balances keyed by (holder, token).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    balances: HashMap<(Address, Address), Decimal>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of `token` held by `holder`.
    pub fn balance_of(&self, holder: Address, token: Address) -> Decimal {
        self.balances
            .get(&(holder, token))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Credits `amount` of `token` to `holder` out of thin air.
    pub fn mint(&mut self, holder: Address, token: Address, amount: Decimal) {
        *self.balances.entry((holder, token)).or_insert(Decimal::ZERO) += amount;
    }

    /// Moves `amount` of `token` from `from` to `to`.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let available = self.balance_of(from, token);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: from,
                token,
                available,
                required: amount,
            });
        }

        self.balances.insert((from, token), available - amount);
        *self.balances.entry((to, token)).or_insert(Decimal::ZERO) += amount;

        trace!(token = %token, from = %from, to = %to, amount = %amount, "transfer");
        Ok(())
    }

    /// Captures the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            balances: self.balances.clone(),
        }
    }

    /// Replaces the current state with a snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.balances = snapshot.balances;
    }

    /// Runs `f` as one indivisible unit: if it returns `Err`, every balance
    /// change it made is undone before the error is returned.
    pub fn atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Ledger) -> Result<T, E>,
    {
        let snapshot = self.snapshot();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.restore(snapshot);
                Err(e)
            }
        }
    }
}
