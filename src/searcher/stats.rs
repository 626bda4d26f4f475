//! Runtime statistics for the searcher.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::domain::ExecutionResult;

/// Runtime statistics for the searcher.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub detection_cycles: u64,
    pub quote_errors: u64,
    pub opportunities_detected: u64,
    /// Opportunities dropped because a fresh quote no longer supported them.
    pub opportunities_stale: u64,
    pub executions_attempted: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    /// Realized profit per borrowed token symbol.
    pub profit_by_token: HashMap<String, Decimal>,
    pub best_profit: Decimal,
}

impl Stats {
    /// Folds one execution result into the counters.
    pub fn record(&mut self, token: &str, result: &ExecutionResult) {
        self.executions_attempted += 1;
        if result.success() {
            self.successful_executions += 1;
            *self.profit_by_token.entry(token.to_string()).or_default() += result.realized_profit();
            self.best_profit = self.best_profit.max(result.realized_profit());
        } else {
            self.failed_executions += 1;
        }
    }
}
