//! Scenario builder for end-to-end runs of quote, evaluate and execute.

use rust_decimal::Decimal;
use std::sync::Arc;

use super::{SimulationError, World};
use crate::domain::{Address, ArbitrageOpportunity, ExchangeQuote, ExecutionResult, Token};
use crate::evaluator::{Evaluator, EvaluatorSettings, SizingMode};
use crate::exchanges::ConstantProductExchange;
use crate::executor::{Executor, ExecutorSettings};
use crate::flash_loan::{AaveStylePool, FlashLoanCoordinator, LendingPool};
use crate::ledger::Ledger;
use crate::quote::QuoteProvider;

pub const EXECUTOR: Address = Address::from_low_u64(0xe0e0);
pub const OPERATOR: Address = Address::from_low_u64(0x0be0);
const LENDING_POOL: Address = Address::from_low_u64(0xaa01);
const LENDING_PROVIDER: Address = Address::from_low_u64(0xaa00);

#[derive(Debug, Clone)]
struct PoolSpec {
    exchange: String,
    fee_bps: u32,
    reserve_in: Decimal,
    reserve_out: Decimal,
}

/// Scenario describes a two-exchange world for one token pair.
#[derive(Debug, Clone)]
pub struct Scenario {
    token_in: Token,
    token_out: Token,
    pools: Vec<PoolSpec>,
    lending_liquidity: Decimal,
    premium_bps: u32,
    slippage_bps: u32,
    min_profit: Decimal,
    sizing: SizingMode,
    input_cap: Option<Decimal>,
}

impl Scenario {
    /// Empty scenario borrowing `token_in` and trading through `token_out`.
    pub fn new(token_in: Token, token_out: Token) -> Self {
        Self {
            token_in,
            token_out,
            pools: Vec::new(),
            lending_liquidity: Decimal::ZERO,
            premium_bps: 9,
            slippage_bps: 50,
            min_profit: Decimal::ZERO,
            sizing: SizingMode::Optimal,
            input_cap: None,
        }
    }

    /// 1000 WETH against 2,000,000 USDC on "uniswap" and 2,050,000 USDC on
    /// "sushiswap", 0.3% swap fee, 0.09% premium, 10M USDC to lend.
    pub fn reference() -> Self {
        let usdc = Token::new("USDC", Address::from_low_u64(0x0c01), 6);
        let weth = Token::new("WETH", Address::from_low_u64(0x0c02), 18);
        Self::new(usdc, weth)
            .pool("uniswap", 30, Decimal::from(2_000_000), Decimal::from(1000))
            .pool("sushiswap", 30, Decimal::from(2_050_000), Decimal::from(1000))
            .lending_liquidity(Decimal::from(10_000_000))
    }

    /// Adds a pool. Reserves are given as (token_in, token_out).
    pub fn pool(
        mut self,
        exchange: impl Into<String>,
        fee_bps: u32,
        reserve_in: Decimal,
        reserve_out: Decimal,
    ) -> Self {
        self.pools.push(PoolSpec {
            exchange: exchange.into(),
            fee_bps,
            reserve_in,
            reserve_out,
        });
        self
    }

    pub fn lending_liquidity(mut self, amount: Decimal) -> Self {
        self.lending_liquidity = amount;
        self
    }

    pub fn premium_bps(mut self, bps: u32) -> Self {
        self.premium_bps = bps;
        self
    }

    pub fn slippage_bps(mut self, bps: u32) -> Self {
        self.slippage_bps = bps;
        self
    }

    pub fn min_profit(mut self, amount: Decimal) -> Self {
        self.min_profit = amount;
        self
    }

    pub fn sizing(mut self, sizing: SizingMode) -> Self {
        self.sizing = sizing;
        self
    }

    /// Caps the trade size. The lending liquidity always bounds it.
    pub fn input_cap(mut self, amount: Decimal) -> Self {
        self.input_cap = Some(amount);
        self
    }

    /// Deploys the scenario.
    pub fn build(self) -> Result<Simulation, SimulationError> {
        if self.pools.len() != 2 {
            return Err(SimulationError::InvalidPool(format!(
                "expected two pools, got {}",
                self.pools.len()
            )));
        }

        let mut ledger = Ledger::new();
        let pool = Arc::new(AaveStylePool::new(
            LENDING_POOL,
            LENDING_PROVIDER,
            self.premium_bps,
        ));
        ledger.mint(
            LENDING_POOL,
            self.token_in.address,
            self.token_in.truncate(self.lending_liquidity),
        );

        let mut exchanges = Vec::with_capacity(self.pools.len());
        for (i, spec) in self.pools.iter().enumerate() {
            let base = Address::from_low_u64(0x1_0000 * (i as u64 + 1));
            let mut exchange = ConstantProductExchange::new(
                spec.exchange.clone(),
                base.derive(1),
                base.derive(2),
                spec.fee_bps,
            );
            let pair = exchange.add_pair(self.token_in.clone(), self.token_out.clone());
            let (token_in, token_out) = (&self.token_in, &self.token_out);
            ledger.mint(pair.address, token_in.address, token_in.truncate(spec.reserve_in));
            ledger.mint(pair.address, token_out.address, token_out.truncate(spec.reserve_out));
            exchanges.push(exchange);
        }

        let mut world = World::assemble(ledger, pool.clone());
        for exchange in exchanges {
            world.install(exchange)?;
        }

        let manager = world.manager().clone();
        let evaluator = Evaluator::new(EvaluatorSettings {
            premium_bps: pool.premium_bps(),
            sizing: self.sizing,
            min_profit: self.min_profit,
            ..EvaluatorSettings::default()
        });
        let executor = Executor::new(
            ExecutorSettings {
                address: EXECUTOR,
                operator: OPERATOR,
                slippage_bps: self.slippage_bps,
                min_profit: self.min_profit,
            },
            manager.clone(),
            FlashLoanCoordinator::new(pool, EXECUTOR),
        );

        Ok(Simulation {
            exchange_a: self.pools[0].exchange.clone(),
            exchange_b: self.pools[1].exchange.clone(),
            token_in: self.token_in,
            token_out: self.token_out,
            input_cap: self.input_cap,
            quotes: QuoteProvider::new(manager),
            evaluator,
            executor,
            world,
        })
    }
}

/// Simulation is a deployed scenario.
pub struct Simulation {
    pub world: World,
    pub token_in: Token,
    pub token_out: Token,
    pub exchange_a: String,
    pub exchange_b: String,
    input_cap: Option<Decimal>,
    quotes: QuoteProvider,
    evaluator: Evaluator,
    executor: Executor,
}

impl Simulation {
    /// Current quote on one exchange, oriented token_in -> token_out.
    pub fn quote(&self, exchange: &str) -> Result<ExchangeQuote, SimulationError> {
        Ok(self
            .quotes
            .get_quote(&self.world.ledger, exchange, &self.token_in, &self.token_out)?)
    }

    /// Trade-size cap passed to the evaluator: the configured cap, never
    /// more than the lending pool holds.
    pub fn cap(&self) -> Decimal {
        let liquidity = self
            .world
            .lending_pool()
            .available_liquidity(&self.world.ledger, &self.token_in);
        self.input_cap.map_or(liquidity, |cap| cap.min(liquidity))
    }

    /// Quotes both exchanges and evaluates them.
    pub fn evaluate(&self) -> Result<Option<ArbitrageOpportunity>, SimulationError> {
        let a = self.quote(&self.exchange_a)?;
        let b = self.quote(&self.exchange_b)?;
        Ok(self.evaluator.evaluate(&a, &b, self.cap()))
    }

    /// Executes an opportunity against the current state.
    pub fn execute(&mut self, opportunity: &ArbitrageOpportunity) -> ExecutionResult {
        self.executor.execute(&mut self.world.ledger, opportunity)
    }

    /// Evaluates and, if there is an opportunity, executes it.
    pub fn run(&mut self) -> Result<Option<ExecutionResult>, SimulationError> {
        match self.evaluate()? {
            Some(opportunity) => Ok(Some(self.execute(&opportunity))),
            None => Ok(None),
        }
    }

    /// Third-party swap of `amount` of `sell` on `exchange`.
    pub fn drift(
        &mut self,
        exchange: &str,
        sell: &Token,
        amount: Decimal,
    ) -> Result<Decimal, SimulationError> {
        let buy = if sell.address == self.token_in.address {
            self.token_out.clone()
        } else {
            self.token_in.clone()
        };
        self.world.third_party_swap(exchange, sell, &buy, amount)
    }

    pub fn halt(&self, exchange: &str) -> Result<(), SimulationError> {
        self.world.halt(exchange, true)
    }

    pub fn resume(&self, exchange: &str) -> Result<(), SimulationError> {
        self.world.halt(exchange, false)
    }

    /// Copy of the world state for before/after comparisons.
    pub fn snapshot(&self) -> Ledger {
        self.world.ledger.clone()
    }

    pub fn balance(&self, holder: Address, token: &Token) -> Decimal {
        self.world.ledger.balance_of(holder, token.address)
    }

    /// Reserves on `exchange` as (token_in, token_out).
    pub fn reserves(&self, exchange: &str) -> Result<(Decimal, Decimal), SimulationError> {
        self.world.reserves(exchange, &self.token_in, &self.token_out)
    }

    pub fn lending_pool_address(&self) -> Address {
        self.world.lending_pool().address()
    }
}
