//! Searcher error types.

use crate::config::ConfigError;
use crate::simulation::SimulationError;
use crate::storage::StorageError;

/// Searcher error type.
#[derive(Debug, thiserror::Error)]
pub enum SearcherError {
    #[error("searcher is already running")]
    AlreadyRunning,
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("world setup failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
