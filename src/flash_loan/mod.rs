//! Flash-loan coordination.
//!
//! The coordinator hands borrowed funds to a continuation, checks that the
//! receiver can cover principal plus premium once it returns, and runs the
//! whole loan inside `Ledger::atomic` so a failure anywhere leaves no trace.

mod pool;

pub use pool::AaveStylePool;

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{Address, FlashLoanRequest, Token};
use crate::executor::ExecutionError;
use crate::ledger::Ledger;

/// Continuation invoked with the borrowed funds in place.
pub type OnBorrowed<'a> =
    dyn FnMut(&mut Ledger, &FlashLoanRequest) -> Result<(), ExecutionError> + 'a;

/// LendingPool is the consumed lending-pool interface.
pub trait LendingPool: Send + Sync {
    /// Pool contract address; its balances are the lendable liquidity.
    fn address(&self) -> Address;

    /// Premium charged per loan, in basis points.
    fn premium_bps(&self) -> u32;

    /// Amount of `asset` the pool can lend right now.
    fn available_liquidity(&self, state: &Ledger, asset: &Token) -> Decimal;

    /// Sends `request.amount` to `receiver`, calls `on_borrowed`, then pulls
    /// the obligation back. Does not restore state on failure; callers wrap
    /// it in `Ledger::atomic`.
    fn flash_loan(
        &self,
        state: &mut Ledger,
        receiver: Address,
        request: &FlashLoanRequest,
        on_borrowed: &mut OnBorrowed<'_>,
    ) -> Result<(), ExecutionError>;
}

/// FlashLoanReceipt records a settled loan.
#[derive(Debug, Clone, PartialEq)]
pub struct FlashLoanReceipt {
    pub request: FlashLoanRequest,
    /// Principal plus premium returned to the pool.
    pub repaid: Decimal,
}

/// FlashLoanCoordinator borrows on behalf of one receiver contract.
pub struct FlashLoanCoordinator {
    pool: Arc<dyn LendingPool>,
    receiver: Address,
}

impl FlashLoanCoordinator {
    pub fn new(pool: Arc<dyn LendingPool>, receiver: Address) -> Self {
        Self { pool, receiver }
    }

    /// Borrows `amount` of `asset`, runs `on_borrowed`, and verifies repayment.
    ///
    /// On any error the ledger is restored to its state before the call.
    pub fn borrow<F>(
        &self,
        state: &mut Ledger,
        asset: &Token,
        amount: Decimal,
        mut on_borrowed: F,
    ) -> Result<FlashLoanReceipt, ExecutionError>
    where
        F: FnMut(&mut Ledger, &FlashLoanRequest) -> Result<(), ExecutionError>,
    {
        let amount = asset.truncate(amount);
        if amount <= Decimal::ZERO {
            return Err(ExecutionError::Reverted("loan amount must be positive".into()));
        }

        let liquidity = self.pool.available_liquidity(state, asset);
        if liquidity < amount {
            return Err(ExecutionError::Reverted(format!(
                "pool liquidity {} {} below requested {}",
                liquidity, asset.symbol, amount
            )));
        }

        let request = FlashLoanRequest::new(asset.clone(), amount, self.pool.premium_bps());
        let receiver = self.receiver;

        debug!(
            asset = %asset.symbol,
            amount = %amount,
            premium = %request.premium(),
            "Requesting flash loan"
        );

        state.atomic(|state| {
            let mut verified = |state: &mut Ledger,
                                request: &FlashLoanRequest|
             -> Result<(), ExecutionError> {
                on_borrowed(state, request)?;

                let available = state.balance_of(receiver, request.asset.address);
                let required = request.obligation();
                if available < required {
                    return Err(ExecutionError::InsufficientRepayment {
                        required,
                        available,
                    });
                }
                Ok(())
            };
            self.pool.flash_loan(state, receiver, &request, &mut verified)
        })?;

        let repaid = request.obligation();
        info!(
            asset = %asset.symbol,
            amount = %amount,
            repaid = %repaid,
            "Flash loan repaid"
        );

        Ok(FlashLoanReceipt { request, repaid })
    }
}
