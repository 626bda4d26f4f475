//! Per-network deployment tables.

use serde::Deserialize;
use std::collections::HashMap;

use crate::domain::{Address, AddressError};

/// Router and factory of one constant-product exchange.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExchangeDeployment {
    /// Exchange identifier used in quotes and logs (e.g., "uniswap").
    pub name: String,
    pub router: Address,
    pub factory: Address,
    /// Swap fee in basis points (default: 30).
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u32,
}

/// Deployment is the set of external contracts the searcher talks to on one
/// network. It is resolved once at startup and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Deployment {
    pub exchange_a: ExchangeDeployment,
    pub exchange_b: ExchangeDeployment,
    /// Aave lending-pool addresses provider.
    pub lending_pool_provider: Address,
    /// Flash-loan premium in basis points (default: 9).
    #[serde(default = "default_premium_bps")]
    pub flash_loan_premium_bps: u32,
}

fn default_fee_bps() -> u32 {
    30
}

fn default_premium_bps() -> u32 {
    9
}

fn exchange(name: &str, router: &str, factory: &str) -> Result<ExchangeDeployment, AddressError> {
    Ok(ExchangeDeployment {
        name: name.to_string(),
        router: router.parse()?,
        factory: factory.parse()?,
        fee_bps: default_fee_bps(),
    })
}

/// Built-in deployments keyed by network name.
pub fn builtin() -> Result<HashMap<String, Deployment>, AddressError> {
    let uniswap = exchange(
        "uniswap",
        "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
        "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
    )?;

    let mut networks = HashMap::new();
    networks.insert(
        "mainnet".to_string(),
        Deployment {
            exchange_a: uniswap.clone(),
            exchange_b: exchange(
                "sushiswap",
                "0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F",
                "0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac",
            )?,
            lending_pool_provider: "0xB53C1a33016B2DC2fF3653530bfF1848a515c8c5".parse()?,
            flash_loan_premium_bps: default_premium_bps(),
        },
    );
    // No Aave provider is deployed on the testnet; it has to come from YAML.
    networks.insert(
        "testnet".to_string(),
        Deployment {
            exchange_a: uniswap,
            exchange_b: exchange(
                "sushiswap",
                "0x1b02dA8Cb0d097eB8D57A175b88c7D8b47997506",
                "0xc35DADB65012eC5796536bD9864eD8773aBc74C4",
            )?,
            lending_pool_provider: Address::ZERO,
            flash_loan_premium_bps: default_premium_bps(),
        },
    );
    Ok(networks)
}
