//! Arbitrage detection configuration.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::duration;
use crate::evaluator::{EvaluatorSettings, SizingMode};

/// Arbitrage detection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageConfig {
    /// Time between detection cycles (default: 2s).
    #[serde(default = "default_detection_interval", with = "duration")]
    pub detection_interval: Duration,
    /// "optimal" searches for the best size, "fixed" trades the cap.
    #[serde(default)]
    pub sizing: SizingMode,
    /// Iteration bound for the optimal-size search (default: 128).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Minimum profit in units of the borrowed token (default: 0).
    #[serde(default)]
    pub min_profit: Decimal,
    /// Trade-size cap per borrowed token symbol. Tokens without an entry are
    /// capped by what the lending pool can lend.
    #[serde(default)]
    pub max_input: HashMap<String, Decimal>,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            detection_interval: default_detection_interval(),
            sizing: SizingMode::default(),
            max_iterations: default_max_iterations(),
            min_profit: Decimal::ZERO,
            max_input: HashMap::new(),
        }
    }
}

impl ArbitrageConfig {
    /// Evaluator settings for a pool charging `premium_bps`.
    pub fn evaluator_settings(&self, premium_bps: u32) -> EvaluatorSettings {
        EvaluatorSettings {
            premium_bps,
            sizing: self.sizing,
            max_iterations: self.max_iterations,
            min_profit: self.min_profit,
        }
    }
}

fn default_detection_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_max_iterations() -> u32 {
    128
}
