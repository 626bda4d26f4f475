//! Arbitrage executor: one attempt as an explicit state machine.
//!
//! `Idle -> LoanRequested -> SwappedOnA -> SwappedOnB -> Repaid -> Completed`,
//! with `Reverted` reachable from every non-terminal state. The attempt runs
//! inside `Ledger::atomic`, so a revert leaves the world exactly as it was.

mod error;

pub use error::ExecutionError;

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::domain::fees::less_bps;
use crate::domain::{Address, ArbitrageOpportunity, ExecutionResult, ExecutionState};
use crate::exchanges::{Exchange, Manager, SwapRequest};
use crate::flash_loan::FlashLoanCoordinator;
use crate::ledger::Ledger;

/// Executor settings.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Contract that receives the loan and performs the swaps.
    pub address: Address,
    /// Account the residual profit is forwarded to.
    pub operator: Address,
    /// Allowed shortfall against each quoted leg output, in basis points.
    pub slippage_bps: u32,
    /// Realized profit must exceed this or the attempt reverts.
    pub min_profit: Decimal,
}

/// Settlement summarizes a completed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    /// `token_out` received on leg A.
    pub intermediate: Decimal,
    /// `token_in` received on leg B.
    pub output: Decimal,
    /// Principal plus premium returned to the pool.
    pub repaid: Decimal,
    /// Amount forwarded to the operator.
    pub profit: Decimal,
}

/// Tracks the state of one attempt and rejects out-of-order transitions.
#[derive(Debug)]
struct Attempt {
    state: ExecutionState,
}

impl Attempt {
    fn new() -> Self {
        Self {
            state: ExecutionState::Idle,
        }
    }

    fn advance(&mut self, next: ExecutionState) -> Result<(), ExecutionError> {
        if self.state.next() != Some(next) {
            return Err(ExecutionError::Reverted(format!(
                "invalid transition {} -> {}",
                self.state, next
            )));
        }
        trace!(from = %self.state, to = %next, "State transition");
        self.state = next;
        Ok(())
    }
}

/// Executor runs opportunities against the ledger.
pub struct Executor {
    settings: ExecutorSettings,
    exchanges: Manager,
    coordinator: FlashLoanCoordinator,
}

impl Executor {
    pub fn new(
        settings: ExecutorSettings,
        exchanges: Manager,
        coordinator: FlashLoanCoordinator,
    ) -> Self {
        Self {
            settings,
            exchanges,
            coordinator,
        }
    }

    /// Executes an opportunity and returns its terminal record.
    ///
    /// A failed attempt returns a record with `success == false`; the ledger
    /// is then unchanged.
    pub fn execute(
        &self,
        state: &mut Ledger,
        opportunity: &ArbitrageOpportunity,
    ) -> ExecutionResult {
        let attempted_at = Utc::now();
        let mut attempt = Attempt::new();

        match self.run(state, opportunity, &mut attempt) {
            Ok(settlement) => {
                info!(
                    id = %opportunity.id,
                    pair = %opportunity.pair(),
                    buy = %opportunity.buy_exchange,
                    sell = %opportunity.sell_exchange,
                    input = %opportunity.input_amount,
                    profit = %settlement.profit,
                    "Arbitrage completed"
                );
                ExecutionResult::completed(
                    &opportunity.id,
                    opportunity.pair(),
                    settlement.profit,
                    attempted_at,
                )
            }
            Err(e) => {
                warn!(
                    id = %opportunity.id,
                    pair = %opportunity.pair(),
                    failed_at = %attempt.state,
                    error = %e,
                    "Arbitrage reverted"
                );
                ExecutionResult::reverted(
                    &opportunity.id,
                    opportunity.pair(),
                    attempt.state,
                    e.to_string(),
                    attempted_at,
                )
            }
        }
    }

    /// Executes an opportunity, returning the settlement or the error that
    /// reverted it.
    pub fn try_execute(
        &self,
        state: &mut Ledger,
        opportunity: &ArbitrageOpportunity,
    ) -> Result<Settlement, ExecutionError> {
        let mut attempt = Attempt::new();
        self.run(state, opportunity, &mut attempt)
    }

    fn exchange(&self, name: &str) -> Result<Arc<dyn Exchange>, ExecutionError> {
        self.exchanges
            .get(name)
            .ok_or_else(|| ExecutionError::Reverted(format!("unknown exchange {}", name)))
    }

    fn run(
        &self,
        state: &mut Ledger,
        opportunity: &ArbitrageOpportunity,
        attempt: &mut Attempt,
    ) -> Result<Settlement, ExecutionError> {
        if !opportunity.is_profitable() {
            return Err(ExecutionError::Reverted(
                "opportunity is not profitable".into(),
            ));
        }

        let buy = self.exchange(&opportunity.buy_exchange)?;
        let sell = self.exchange(&opportunity.sell_exchange)?;
        let me = self.settings.address;
        let token_in = &opportunity.token_in;
        let token_out = &opportunity.token_out;

        let min_intermediate = token_out.truncate(less_bps(
            opportunity.expected_intermediate_amount,
            self.settings.slippage_bps,
        ));
        let min_output = token_in.truncate(less_bps(
            opportunity.expected_output_amount,
            self.settings.slippage_bps,
        ));

        state.atomic(|state| -> Result<Settlement, ExecutionError> {
            let balance_before = state.balance_of(me, token_in.address);
            let mut legs = (Decimal::ZERO, Decimal::ZERO);

            let receipt = self.coordinator.borrow(
                state,
                token_in,
                opportunity.input_amount,
                |state, request| {
                    attempt.advance(ExecutionState::LoanRequested)?;

                    let intermediate = swap_leg(
                        state,
                        buy.as_ref(),
                        SwapRequest {
                            amount_in: request.amount,
                            min_amount_out: min_intermediate,
                            token_in: token_in.address,
                            token_out: token_out.address,
                            payer: me,
                            recipient: me,
                        },
                    )?;
                    attempt.advance(ExecutionState::SwappedOnA)?;

                    let output = swap_leg(
                        state,
                        sell.as_ref(),
                        SwapRequest {
                            amount_in: intermediate,
                            min_amount_out: min_output,
                            token_in: token_out.address,
                            token_out: token_in.address,
                            payer: me,
                            recipient: me,
                        },
                    )?;
                    attempt.advance(ExecutionState::SwappedOnB)?;

                    legs = (intermediate, output);
                    Ok(())
                },
            )?;
            attempt.advance(ExecutionState::Repaid)?;

            let balance_after = state.balance_of(me, token_in.address);
            let profit = balance_after - balance_before;
            if profit <= Decimal::ZERO || profit < self.settings.min_profit {
                return Err(ExecutionError::Reverted(format!(
                    "realized profit {} below minimum {}",
                    profit, self.settings.min_profit
                )));
            }

            state.transfer(token_in.address, me, self.settings.operator, profit)?;
            attempt.advance(ExecutionState::Completed)?;

            debug!(
                id = %opportunity.id,
                intermediate = %legs.0,
                output = %legs.1,
                repaid = %receipt.repaid,
                profit = %profit,
                operator = %self.settings.operator,
                "Profit forwarded"
            );

            Ok(Settlement {
                intermediate: legs.0,
                output: legs.1,
                repaid: receipt.repaid,
                profit,
            })
        })
    }
}

/// Runs one swap and enforces its minimum output.
fn swap_leg(
    state: &mut Ledger,
    exchange: &dyn Exchange,
    request: SwapRequest,
) -> Result<Decimal, ExecutionError> {
    let received = exchange
        .swap(state, &request)
        .map_err(|e| ExecutionError::from_swap(exchange.name(), e))?;

    if received < request.min_amount_out {
        return Err(ExecutionError::SlippageExceeded {
            exchange: exchange.name().to_string(),
            minimum: request.min_amount_out,
            actual: received,
        });
    }
    Ok(received)
}

#[cfg(test)]
mod tests;
