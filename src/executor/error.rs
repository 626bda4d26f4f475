//! Execution error types.

use rust_decimal::Decimal;

use crate::exchanges::ExchangeError;
use crate::ledger::LedgerError;

/// Execution-layer errors. Each one fails the whole attempt and every
/// balance change made since `Idle` is undone.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("slippage exceeded on {exchange}: expected at least {minimum}, got {actual}")]
    SlippageExceeded {
        exchange: String,
        minimum: Decimal,
        actual: Decimal,
    },
    #[error("insufficient repayment: owed {required}, available {available}")]
    InsufficientRepayment {
        required: Decimal,
        available: Decimal,
    },
    #[error("execution reverted: {0}")]
    Reverted(String),
}

impl ExecutionError {
    /// Maps a failed swap on `exchange` into the execution taxonomy.
    pub fn from_swap(exchange: &str, err: ExchangeError) -> Self {
        match err {
            ExchangeError::InsufficientOutputAmount { minimum, actual } => {
                ExecutionError::SlippageExceeded {
                    exchange: exchange.to_string(),
                    minimum,
                    actual,
                }
            }
            other => ExecutionError::Reverted(format!("swap on {} failed: {}", exchange, other)),
        }
    }
}

impl From<LedgerError> for ExecutionError {
    fn from(err: LedgerError) -> Self {
        ExecutionError::Reverted(err.to_string())
    }
}
