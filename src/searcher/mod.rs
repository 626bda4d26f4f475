//! Searcher runtime.
//!
//! Runs the detection cycle on an interval: quote both exchanges for every
//! configured pair, evaluate, then re-quote under the write lock and execute
//! what is still profitable.

mod config;
mod error;
mod stats;

pub use config::SearcherConfig;
pub use error::SearcherError;
pub use stats::Stats;

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::{ArbitrageOpportunity, ExecutionResult, Token};
use crate::evaluator::Evaluator;
use crate::executor::{Executor, ExecutorSettings};
use crate::flash_loan::{FlashLoanCoordinator, LendingPool};
use crate::ledger::Ledger;
use crate::quote::{QuoteError, QuoteProvider};
use crate::simulation::World;
use crate::storage::{ResultStorage, SqliteStorage, SqliteStorageConfig};

/// Searcher drives detection and execution against the shared world state.
pub struct Searcher {
    cfg: Config,
    version: String,
    dry_run: bool,
    pairs: Vec<(Token, Token)>,
    exchanges: (String, String),

    world: Arc<RwLock<Ledger>>,
    quotes: QuoteProvider,
    evaluator: Evaluator,
    executor: Executor,
    lending_pool: Arc<dyn LendingPool>,
    storage: Option<Arc<dyn ResultStorage>>,

    // Runtime state
    started_at: Mutex<Option<Instant>>,
    running: Mutex<bool>,
    stats: Mutex<Stats>,
}

impl Searcher {
    /// Creates a searcher over an already deployed world.
    pub fn new(
        cfg: SearcherConfig,
        world: World,
        storage: Option<Arc<dyn ResultStorage>>,
    ) -> Result<Self, SearcherError> {
        let app = cfg.app_config;
        let deployment = app.deployment()?;
        let pairs = app.resolve_pairs()?;

        let lending_pool: Arc<dyn LendingPool> = world.lending_pool().clone();
        let manager = world.manager().clone();
        let executor_address = app.executor_address();

        let evaluator =
            Evaluator::new(app.arbitrage.evaluator_settings(lending_pool.premium_bps()));
        let executor = Executor::new(
            ExecutorSettings {
                address: executor_address,
                operator: app.operator(),
                slippage_bps: app.execution.slippage_bps,
                min_profit: app.arbitrage.min_profit,
            },
            manager.clone(),
            FlashLoanCoordinator::new(lending_pool.clone(), executor_address),
        );

        Ok(Self {
            dry_run: cfg.dry_run,
            version: cfg.version,
            pairs,
            exchanges: (deployment.exchange_a.name, deployment.exchange_b.name),
            world: Arc::new(RwLock::new(world.ledger)),
            quotes: QuoteProvider::new(manager),
            evaluator,
            executor,
            lending_pool,
            storage,
            started_at: Mutex::new(None),
            running: Mutex::new(false),
            stats: Mutex::new(Stats::default()),
            cfg: app,
        })
    }

    /// Builds the world from config and opens storage if it is enabled.
    pub async fn build(cfg: SearcherConfig) -> Result<Self, SearcherError> {
        let world = World::from_config(&cfg.app_config)?;

        let storage: Option<Arc<dyn ResultStorage>> = match cfg.app_config.storage {
            Some(ref storage) if storage.enabled => {
                let defaults = SqliteStorageConfig::default();
                let sqlite = SqliteStorage::new(SqliteStorageConfig {
                    path: storage.path.clone().unwrap_or(defaults.path),
                    max_connections: storage.max_connections.unwrap_or(defaults.max_connections),
                })
                .await?;
                Some(Arc::new(sqlite))
            }
            _ => None,
        };

        Self::new(cfg, world, storage)
    }

    /// Shared handle to the world state.
    pub fn world(&self) -> Arc<RwLock<Ledger>> {
        self.world.clone()
    }

    /// Starts the searcher and runs detection until stopped.
    pub async fn start(&self) -> Result<(), SearcherError> {
        {
            let mut running = self.running.lock().await;
            if *running {
                return Err(SearcherError::AlreadyRunning);
            }
            *running = true;
        }

        {
            let mut started_at = self.started_at.lock().await;
            *started_at = Some(Instant::now());
        }

        info!(
            name = %self.cfg.app.name,
            version = %self.version,
            network = %self.cfg.network,
            dry_run = self.dry_run,
            exchanges = ?self.exchanges,
            pairs = ?self.cfg.pairs,
            "Starting searcher"
        );

        self.run_main_loop().await
    }

    /// Gracefully stops the searcher.
    pub async fn stop(&self) -> Result<(), SearcherError> {
        {
            let mut running = self.running.lock().await;
            if !*running {
                return Ok(());
            }
            *running = false;
        }

        info!("Stopping searcher...");

        let uptime = self.uptime().await;
        let stats = self.stats().await;

        if let Some(ref storage) = self.storage {
            if let Err(e) = storage.close().await {
                warn!(error = %e, "Failed to close storage");
            }
        }

        info!(
            uptime = ?uptime,
            cycles = stats.detection_cycles,
            executed = stats.executions_attempted,
            succeeded = stats.successful_executions,
            profit = ?stats.profit_by_token,
            "Searcher stopped"
        );

        Ok(())
    }

    /// Returns a copy of the current statistics.
    pub async fn stats(&self) -> Stats {
        self.stats.lock().await.clone()
    }

    /// Returns true if the searcher is currently running.
    pub async fn is_running(&self) -> bool {
        *self.running.lock().await
    }

    /// Returns how long the searcher has been running.
    pub async fn uptime(&self) -> Duration {
        self.started_at
            .lock()
            .await
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    /// Main detection and execution loop.
    async fn run_main_loop(&self) -> Result<(), SearcherError> {
        let detection_interval = self.cfg.arbitrage.detection_interval;
        let mut interval = tokio::time::interval(detection_interval);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(detection_interval = ?detection_interval, "Starting main detection loop");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !self.is_running().await {
                        break;
                    }
                    self.run_once().await;
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Runs one detection cycle over every pair and returns the results of
    /// the attempts it made.
    pub async fn run_once(&self) -> Vec<ExecutionResult> {
        let cycles = {
            let mut stats = self.stats.lock().await;
            stats.detection_cycles += 1;
            stats.detection_cycles
        };

        if cycles % 20 == 1 {
            info!(cycle = cycles, pairs = self.pairs.len(), "Detection cycle running");
        }

        let mut results = Vec::new();
        for (token_in, token_out) in &self.pairs {
            if let Some(result) = self.process_pair(token_in, token_out).await {
                results.push(result);
            }
        }
        results
    }

    async fn process_pair(&self, token_in: &Token, token_out: &Token) -> Option<ExecutionResult> {
        let detected = {
            let ledger = self.world.read().await;
            self.detect(&ledger, token_in, token_out)
        };

        let opportunity = match detected {
            Ok(Some(opportunity)) => opportunity,
            Ok(None) => {
                debug!(
                    pair = %format!("{}/{}", token_in.symbol, token_out.symbol),
                    "No opportunity"
                );
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Quote failed");
                self.stats.lock().await.quote_errors += 1;
                return None;
            }
        };

        self.stats.lock().await.opportunities_detected += 1;
        info!(
            id = %opportunity.id,
            pair = %opportunity.pair(),
            buy = %opportunity.buy_exchange,
            sell = %opportunity.sell_exchange,
            input = %opportunity.input_amount,
            profit = %opportunity.expected_profit,
            "Opportunity detected"
        );

        if self.dry_run {
            return None;
        }

        let outcome = {
            let mut ledger = self.world.write().await;
            self.refresh_and_execute(&mut ledger, &opportunity)
        };

        let (executed, result) = match outcome {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                info!(id = %opportunity.id, "Opportunity went stale before execution");
                self.stats.lock().await.opportunities_stale += 1;
                return None;
            }
            Err(e) => {
                warn!(id = %opportunity.id, error = %e, "Re-quote failed");
                self.stats.lock().await.quote_errors += 1;
                return None;
            }
        };

        self.stats.lock().await.record(&token_in.symbol, &result);

        if let Some(ref storage) = self.storage {
            if let Err(e) = storage.save(&executed, &result).await {
                error!(
                    id = %result.opportunity_id(),
                    error = %e,
                    "Failed to save execution result"
                );
            }
        }

        Some(result)
    }

    /// Quotes both exchanges and evaluates them.
    fn detect(
        &self,
        ledger: &Ledger,
        token_in: &Token,
        token_out: &Token,
    ) -> Result<Option<ArbitrageOpportunity>, QuoteError> {
        let (ref a, ref b) = self.exchanges;
        let quote_a = self.quotes.get_quote(ledger, a, token_in, token_out)?;
        let quote_b = self.quotes.get_quote(ledger, b, token_in, token_out)?;
        let cap = self.input_cap(ledger, token_in);
        Ok(self.evaluator.evaluate(&quote_a, &quote_b, cap))
    }

    /// Re-quotes at the current state, drops the opportunity if it went
    /// stale, and otherwise executes the refreshed version.
    fn refresh_and_execute(
        &self,
        ledger: &mut Ledger,
        opportunity: &ArbitrageOpportunity,
    ) -> Result<Option<(ArbitrageOpportunity, ExecutionResult)>, QuoteError> {
        let buy = self.quotes.get_quote(
            ledger,
            &opportunity.buy_exchange,
            &opportunity.token_in,
            &opportunity.token_out,
        )?;
        let sell = self.quotes.get_quote(
            ledger,
            &opportunity.sell_exchange,
            &opportunity.token_in,
            &opportunity.token_out,
        )?;

        let Some(fresh) = self.evaluator.refresh(opportunity, &buy, &sell) else {
            return Ok(None);
        };
        let result = self.executor.execute(ledger, &fresh);
        Ok(Some((fresh, result)))
    }

    /// Trade-size cap for `token`: the configured maximum, never more than
    /// the lending pool holds.
    fn input_cap(&self, ledger: &Ledger, token: &Token) -> Decimal {
        let liquidity = self.lending_pool.available_liquidity(ledger, token);
        match self.cfg.arbitrage.max_input.get(&token.symbol) {
            Some(max) => liquidity.min(*max),
            None => liquidity,
        }
    }
}
