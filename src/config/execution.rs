//! Execution configuration.

use serde::Deserialize;

use crate::domain::Address;

/// Executor contract and profit routing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Address of the arbitrage contract that receives the loan.
    pub executor_address: Option<Address>,
    /// Account that receives realized profit. Required outside development;
    /// `SEARCHER_OPERATOR` overrides it.
    pub operator: Option<Address>,
    /// Allowed shortfall per swap leg in basis points (default: 50).
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            executor_address: None,
            operator: None,
            slippage_bps: default_slippage_bps(),
        }
    }
}

fn default_slippage_bps() -> u32 {
    50
}
