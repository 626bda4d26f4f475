//! Searcher configuration.

use crate::config::Config;

/// Searcher configuration options.
pub struct SearcherConfig {
    /// Application configuration.
    pub app_config: Config,
    /// Detect and log opportunities without executing them.
    pub dry_run: bool,
    /// Application version.
    pub version: String,
}
