//! Simulated world configuration.
//!
//! Seeds the in-process ledger the searcher runs against: pool reserves on
//! both exchanges and the lending pool's liquidity.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

/// Initial state of the simulated chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationConfig {
    /// Lendable balance per token symbol.
    #[serde(default)]
    pub lending_liquidity: HashMap<String, Decimal>,
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

/// One pool and its starting reserves.
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Exchange name from the deployment (e.g., "sushiswap").
    pub exchange: String,
    /// Pair in "A/B" form; orientation does not matter.
    pub pair: String,
    /// Reserve per token symbol.
    pub reserves: HashMap<String, Decimal>,
}
