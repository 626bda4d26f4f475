//! Storage configuration.

use serde::Deserialize;

/// Execution result storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Whether results are persisted.
    #[serde(default)]
    pub enabled: bool,
    /// Path to the SQLite database file.
    pub path: Option<String>,
    /// Connection pool size (default: 5).
    pub max_connections: Option<u32>,
}
