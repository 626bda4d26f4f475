//! Simulated chain: the ledger plus the exchanges and lending pool that
//! operate on it.
//!
//! `World` is what the searcher runs against when no RPC backend is wired
//! in. `Scenario` builds small worlds for exercising the whole pipeline.

mod scenario;

pub use scenario::{Scenario, Simulation};

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, ConfigError, ExchangeDeployment};
use crate::domain::{Address, Token, parse_pair};
use crate::exchanges::{ConstantProductExchange, Exchange, ExchangeError, Manager, SwapRequest};
use crate::flash_loan::{AaveStylePool, LendingPool};
use crate::ledger::Ledger;
use crate::quote::QuoteError;

/// Account used for third-party trades.
pub const TRADER: Address = Address::from_low_u64(0x7ade);

/// Simulation errors.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),
    #[error("unknown token: {0}")]
    UnknownToken(String),
    #[error("invalid pool: {0}")]
    InvalidPool(String),
    #[error("exchange error: {0}")]
    Exchange(#[from] ExchangeError),
    #[error("quote error: {0}")]
    Quote(#[from] QuoteError),
}

/// World is a ledger with two constant-product exchanges and one lending
/// pool deployed on it.
pub struct World {
    pub ledger: Ledger,
    manager: Manager,
    exchanges: HashMap<String, Arc<ConstantProductExchange>>,
    lending_pool: Arc<AaveStylePool>,
}

impl World {
    /// Empty world around a funded ledger; exchanges are added with `install`.
    pub(crate) fn assemble(ledger: Ledger, lending_pool: Arc<AaveStylePool>) -> Self {
        Self {
            ledger,
            manager: Manager::new(),
            exchanges: HashMap::new(),
            lending_pool,
        }
    }

    pub(crate) fn install(
        &mut self,
        exchange: ConstantProductExchange,
    ) -> Result<(), SimulationError> {
        let exchange = Arc::new(exchange);
        self.manager.register(exchange.clone())?;
        self.exchanges.insert(exchange.name().to_string(), exchange);
        Ok(())
    }

    /// Builds the world described by the deployment and `simulation`
    /// section of a config.
    pub fn from_config(cfg: &Config) -> Result<Self, SimulationError> {
        let deployment = cfg.deployment()?;
        let registry = cfg.token_registry()?;
        let seed = cfg.simulation.clone().unwrap_or_default();
        let token = |symbol: &str| {
            registry
                .get(symbol)
                .cloned()
                .ok_or_else(|| SimulationError::UnknownToken(symbol.to_string()))
        };

        let mut exchanges: Vec<ConstantProductExchange> =
            [&deployment.exchange_a, &deployment.exchange_b]
                .into_iter()
                .map(deployed_exchange)
                .collect();

        let mut ledger = Ledger::new();
        for pool in &seed.pools {
            let exchange = exchanges
                .iter_mut()
                .find(|e| e.name() == pool.exchange)
                .ok_or_else(|| SimulationError::UnknownExchange(pool.exchange.clone()))?;

            let (a, b) = parse_pair(&pool.pair)
                .filter(|(a, b)| a != b)
                .ok_or_else(|| SimulationError::InvalidPool(format!("bad pair {}", pool.pair)))?;
            let (token_a, token_b) = (token(a)?, token(b)?);
            if exchange.pair(token_a.address, token_b.address).is_some() {
                return Err(SimulationError::InvalidPool(format!(
                    "{} already has a {} pool",
                    pool.exchange, pool.pair
                )));
            }

            let pair = exchange.add_pair(token_a.clone(), token_b.clone());
            for t in [&token_a, &token_b] {
                let reserve = pool.reserves.get(&t.symbol).copied().ok_or_else(|| {
                    SimulationError::InvalidPool(format!(
                        "{} {}: missing {} reserve",
                        pool.exchange, pool.pair, t.symbol
                    ))
                })?;
                ledger.mint(pair.address, t.address, t.truncate(reserve));
            }
            debug!(
                exchange = %pool.exchange,
                pair = %pair.label(),
                address = %pair.address,
                "Pool seeded"
            );
        }

        let lending_pool = Arc::new(AaveStylePool::new(
            deployment.lending_pool_provider.derive(1),
            deployment.lending_pool_provider,
            deployment.flash_loan_premium_bps,
        ));
        for (symbol, amount) in &seed.lending_liquidity {
            let t = token(symbol)?;
            ledger.mint(lending_pool.address(), t.address, t.truncate(*amount));
        }

        let mut world = World::assemble(ledger, lending_pool);
        for exchange in exchanges {
            world.install(exchange)?;
        }

        info!(
            network = %cfg.network,
            exchanges = ?world.manager.list(),
            lending_pool = %world.lending_pool.address(),
            provider = %world.lending_pool.provider(),
            pools = seed.pools.len(),
            "Simulated world ready"
        );
        Ok(world)
    }

    /// Registry of the deployed exchanges.
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn lending_pool(&self) -> &Arc<AaveStylePool> {
        &self.lending_pool
    }

    pub fn exchange(&self, name: &str) -> Result<&Arc<ConstantProductExchange>, SimulationError> {
        self.exchanges
            .get(name)
            .ok_or_else(|| SimulationError::UnknownExchange(name.to_string()))
    }

    /// Makes an exchange stop (or resume) serving reserves and swaps.
    pub fn halt(&self, exchange: &str, halted: bool) -> Result<(), SimulationError> {
        self.exchange(exchange)?.set_halted(halted);
        Ok(())
    }

    /// Swaps `amount` of `sell` for `buy` on behalf of a third party,
    /// moving the pool's price. Returns the amount the trader received.
    pub fn third_party_swap(
        &mut self,
        exchange: &str,
        sell: &Token,
        buy: &Token,
        amount: Decimal,
    ) -> Result<Decimal, SimulationError> {
        let exchange = self.exchange(exchange)?.clone();
        let amount = sell.truncate(amount);
        self.ledger.mint(TRADER, sell.address, amount);

        let received = exchange.swap(
            &mut self.ledger,
            &SwapRequest {
                amount_in: amount,
                min_amount_out: Decimal::ZERO,
                token_in: sell.address,
                token_out: buy.address,
                payer: TRADER,
                recipient: TRADER,
            },
        )?;

        debug!(
            exchange = %exchange.name(),
            sold = %amount,
            sell = %sell.symbol,
            received = %received,
            buy = %buy.symbol,
            "Third-party swap"
        );
        Ok(received)
    }

    /// Reserves of the `token_in`/`token_out` pool on `exchange`, oriented
    /// as (reserve of token_in, reserve of token_out).
    pub fn reserves(
        &self,
        exchange: &str,
        token_in: &Token,
        token_out: &Token,
    ) -> Result<(Decimal, Decimal), SimulationError> {
        let exchange = self.exchange(exchange)?;
        let pair = exchange
            .pair(token_in.address, token_out.address)
            .ok_or_else(|| {
                SimulationError::InvalidPool(format!("{}/{}", token_in.symbol, token_out.symbol))
            })?;
        Ok((
            self.ledger.balance_of(pair.address, token_in.address),
            self.ledger.balance_of(pair.address, token_out.address),
        ))
    }
}

fn deployed_exchange(deployment: &ExchangeDeployment) -> ConstantProductExchange {
    ConstantProductExchange::new(
        deployment.name.clone(),
        deployment.router,
        deployment.factory,
        deployment.fee_bps,
    )
}
