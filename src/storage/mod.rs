//! Storage interfaces and implementations for persisting execution results.

mod sqlite;

pub use sqlite::{SqliteStorage, SqliteStorageConfig};

use crate::domain::{ArbitrageOpportunity, ExecutionResult};
use async_trait::async_trait;

/// StoredExecution is one persisted attempt: the opportunity as it was
/// executed and its terminal result.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredExecution {
    pub opportunity: ArbitrageOpportunity,
    pub result: ExecutionResult,
}

/// ResultStorage defines the interface for storing execution results.
#[async_trait]
pub trait ResultStorage: Send + Sync {
    /// Save persists one attempt.
    async fn save(
        &self,
        opportunity: &ArbitrageOpportunity,
        result: &ExecutionResult,
    ) -> Result<(), StorageError>;

    /// GetAll retrieves all stored attempts, newest first.
    async fn get_all(&self) -> Result<Vec<StoredExecution>, StorageError>;

    /// GetByPair retrieves attempts for a pair in "IN/OUT" form, newest first.
    async fn get_by_pair(&self, pair: &str) -> Result<Vec<StoredExecution>, StorageError>;

    /// Count returns the total number of stored attempts.
    async fn count(&self) -> Result<i64, StorageError>;

    /// Close closes the storage connection.
    async fn close(&self) -> Result<(), StorageError>;
}

/// StorageError represents errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
