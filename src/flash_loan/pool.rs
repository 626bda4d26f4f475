//! Aave V2 style lending pool operating on the ledger.

use rust_decimal::Decimal;
use tracing::debug;

use super::{LendingPool, OnBorrowed};
use crate::domain::{Address, FlashLoanRequest, Token};
use crate::executor::ExecutionError;
use crate::ledger::Ledger;

/// AaveStylePool lends its own balances and charges a flat premium.
pub struct AaveStylePool {
    address: Address,
    /// Addresses-provider contract the pool was resolved from.
    provider: Address,
    premium_bps: u32,
}

impl AaveStylePool {
    pub fn new(address: Address, provider: Address, premium_bps: u32) -> Self {
        Self {
            address,
            provider,
            premium_bps,
        }
    }

    pub fn provider(&self) -> Address {
        self.provider
    }
}

impl LendingPool for AaveStylePool {
    fn address(&self) -> Address {
        self.address
    }

    fn premium_bps(&self) -> u32 {
        self.premium_bps
    }

    fn available_liquidity(&self, state: &Ledger, asset: &Token) -> Decimal {
        state.balance_of(self.address, asset.address)
    }

    fn flash_loan(
        &self,
        state: &mut Ledger,
        receiver: Address,
        request: &FlashLoanRequest,
        on_borrowed: &mut OnBorrowed<'_>,
    ) -> Result<(), ExecutionError> {
        let asset = request.asset.address;
        state.transfer(asset, self.address, receiver, request.amount)?;

        on_borrowed(state, request)?;

        let required = request.obligation();
        let available = state.balance_of(receiver, asset);
        if available < required {
            return Err(ExecutionError::InsufficientRepayment {
                required,
                available,
            });
        }
        state.transfer(asset, receiver, self.address, required)?;

        debug!(
            pool = %self.address,
            asset = %request.asset.symbol,
            amount = %request.amount,
            premium = %request.premium(),
            "Flash loan settled"
        );
        Ok(())
    }
}
