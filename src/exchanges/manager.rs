//! Registry of the exchanges the searcher trades on.

use super::{Exchange, ExchangeError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Manager maps exchange names to their adapters.
///
/// Built once at startup from the selected deployment and shared read-only
/// afterwards.
#[derive(Clone, Default)]
pub struct Manager {
    exchanges: HashMap<String, Arc<dyn Exchange>>,
}

impl Manager {
    /// Creates a new Manager instance.
    pub fn new() -> Self {
        Self {
            exchanges: HashMap::new(),
        }
    }

    /// Registers an exchange. Fails if the name is taken.
    pub fn register(&mut self, exchange: Arc<dyn Exchange>) -> Result<()> {
        let name = exchange.name().to_string();
        if self.exchanges.contains_key(&name) {
            warn!(exchange = %name, "Exchange already registered");
            return Err(ExchangeError::Internal(format!(
                "exchange {} already registered",
                name
            )));
        }
        info!(
            exchange = %name,
            router = %exchange.router(),
            factory = %exchange.factory(),
            fee_bps = exchange.fee_bps(),
            "Registering exchange"
        );
        self.exchanges.insert(name, exchange);
        Ok(())
    }

    /// Returns an exchange by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Exchange>> {
        self.exchanges.get(name).cloned()
    }

    /// Returns all registered exchange names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.exchanges.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered exchanges (test-only helper).
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Whether no exchanges are registered (test-only helper).
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}
