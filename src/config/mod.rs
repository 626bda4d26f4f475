//! Configuration loading and validation for the searcher.
//!
//! Uses serde_yaml to load YAML configuration files. The target network and
//! the profit recipient can be overridden from the environment.

mod app;
mod arbitrage;
mod duration;
mod error;
mod execution;
mod network;
mod simulation;
mod storage;
mod token;

pub use app::AppConfig;
pub use arbitrage::ArbitrageConfig;
pub use error::ConfigError;
pub use execution::ExecutionConfig;
pub use network::{Deployment, ExchangeDeployment};
pub use simulation::{PoolConfig, SimulationConfig};
pub use storage::StorageConfig;
pub use token::TokenConfig;

use serde::Deserialize;
use std::collections::HashMap;
use std::{env, fs};

use crate::domain::{Address, Token, fees::BPS_DENOMINATOR, parse_pair};

/// Environment variable that selects the network.
pub const NETWORK_ENV: &str = "SEARCHER_NETWORK";
/// Environment variable that sets the profit recipient.
pub const OPERATOR_ENV: &str = "SEARCHER_OPERATOR";

/// Root configuration structure for the searcher.
///
/// Required sections: app, pairs.
/// Optional sections: network, networks, tokens, arbitrage, execution,
/// storage, simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Application-level settings like name and environment.
    pub app: AppConfig,
    /// Network whose deployment is used (default: "mainnet").
    #[serde(default = "default_network")]
    pub network: String,
    /// Extra or overriding deployments keyed by network name.
    #[serde(default)]
    pub networks: HashMap<String, Deployment>,
    /// Extra or overriding tokens.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Pairs to watch in "BORROWED/INTERMEDIATE" form (e.g., "USDC/WETH").
    pub pairs: Vec<String>,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Result persistence (optional).
    pub storage: Option<StorageConfig>,
    /// Seed state for the simulated chain (optional).
    pub simulation: Option<SimulationConfig>,
}

fn default_network() -> String {
    "mainnet".to_string()
}

impl Config {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Loads `.env` first (if it exists), then the YAML file, then applies
    /// `SEARCHER_NETWORK` and `SEARCHER_OPERATOR`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(network) = env::var(NETWORK_ENV) {
            if !network.is_empty() {
                self.network = network;
            }
        }
        if let Ok(operator) = env::var(OPERATOR_ENV) {
            if !operator.is_empty() {
                self.execution.operator = Some(operator.parse()?);
            }
        }
        Ok(())
    }

    /// Returns the deployment for the selected network. YAML entries take
    /// precedence over the built-in tables.
    pub fn deployment(&self) -> Result<Deployment, ConfigError> {
        if let Some(deployment) = self.networks.get(&self.network) {
            return Ok(deployment.clone());
        }
        network::builtin()?
            .remove(&self.network)
            .ok_or_else(|| ConfigError::Validation(format!("unknown network: {}", self.network)))
    }

    /// Returns every known token keyed by symbol.
    pub fn token_registry(&self) -> Result<HashMap<String, Token>, ConfigError> {
        let mut registry: HashMap<String, Token> = token::builtin()?
            .into_iter()
            .map(|t| (t.symbol.clone(), t))
            .collect();
        for entry in &self.tokens {
            registry.insert(entry.symbol.clone(), Token::from(entry));
        }
        Ok(registry)
    }

    /// Resolves every configured pair to (borrowed, intermediate) tokens.
    pub fn resolve_pairs(&self) -> Result<Vec<(Token, Token)>, ConfigError> {
        let registry = self.token_registry()?;
        let lookup = |symbol: &str| {
            registry
                .get(symbol)
                .cloned()
                .ok_or_else(|| ConfigError::Validation(format!("unknown token: {}", symbol)))
        };

        self.pairs
            .iter()
            .map(|pair| -> Result<(Token, Token), ConfigError> {
                let (token_in, token_out) = parse_pair(pair).ok_or_else(|| {
                    ConfigError::Validation(format!("invalid pair format: {}", pair))
                })?;
                if token_in == token_out {
                    return Err(ConfigError::Validation(format!(
                        "pair {} uses the same token twice",
                        pair
                    )));
                }
                Ok((lookup(token_in)?, lookup(token_out)?))
            })
            .collect()
    }

    /// Executor contract address, falling back to a fixed local address.
    pub fn executor_address(&self) -> Address {
        self.execution
            .executor_address
            .unwrap_or(Address::from_low_u64(0xa4b1))
    }

    /// Profit recipient, falling back to the executor itself.
    pub fn operator(&self) -> Address {
        self.execution
            .operator
            .unwrap_or_else(|| self.executor_address())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.is_empty() {
            return Err(ConfigError::Validation("app.name is required".into()));
        }

        if self.pairs.is_empty() {
            return Err(ConfigError::Validation(
                "at least one trading pair is required".into(),
            ));
        }
        self.resolve_pairs()?;

        let deployment = self.deployment()?;
        for exchange in [&deployment.exchange_a, &deployment.exchange_b] {
            if exchange.name.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "network {}: exchange name is required",
                    self.network
                )));
            }
            if exchange.fee_bps >= BPS_DENOMINATOR {
                return Err(ConfigError::Validation(format!(
                    "exchange {}: fee_bps must be below {}",
                    exchange.name, BPS_DENOMINATOR
                )));
            }
        }
        if deployment.exchange_a.name == deployment.exchange_b.name {
            return Err(ConfigError::Validation(format!(
                "network {}: exchanges must have distinct names",
                self.network
            )));
        }
        if deployment.flash_loan_premium_bps >= BPS_DENOMINATOR {
            return Err(ConfigError::Validation(format!(
                "network {}: flash_loan_premium_bps must be below {}",
                self.network, BPS_DENOMINATOR
            )));
        }

        if self.execution.slippage_bps >= BPS_DENOMINATOR {
            return Err(ConfigError::Validation(format!(
                "execution.slippage_bps must be below {}",
                BPS_DENOMINATOR
            )));
        }

        if self.arbitrage.max_iterations == 0 {
            return Err(ConfigError::Validation(
                "arbitrage.max_iterations must be positive".into(),
            ));
        }
        if self.arbitrage.detection_interval.is_zero() {
            return Err(ConfigError::Validation(
                "arbitrage.detection_interval must be positive".into(),
            ));
        }
        if self.arbitrage.min_profit.is_sign_negative() {
            return Err(ConfigError::Validation(
                "arbitrage.min_profit must not be negative".into(),
            ));
        }

        // Only require live settings outside development
        if self.app.is_production() {
            match self.execution.operator {
                Some(operator) if !operator.is_zero() => {}
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "execution.operator is required (set {} env var)",
                        OPERATOR_ENV
                    )));
                }
            }
            if deployment.lending_pool_provider.is_zero() {
                return Err(ConfigError::Validation(format!(
                    "network {}: lending_pool_provider is not deployed",
                    self.network
                )));
            }
        }

        Ok(())
    }
}
