//! SQLite implementation of ResultStorage.

use crate::domain::{ArbitrageOpportunity, ExecutionResult, ExecutionState};
use crate::storage::{ResultStorage, StorageError, StoredExecution};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use tracing::{debug, info};

const SELECT_COLUMNS: &str = "SELECT opportunity_id, pair, success, realized_profit, \
     failed_at, reason, attempted_at, opportunity FROM execution_results";

/// SqliteStorage implements ResultStorage using SQLite.
pub struct SqliteStorage {
    pool: Pool<Sqlite>,
}

/// SqliteStorageConfig holds SQLite storage configuration.
#[derive(Debug, Clone)]
pub struct SqliteStorageConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
}

impl Default for SqliteStorageConfig {
    fn default() -> Self {
        Self {
            path: "executions.db".to_string(),
            max_connections: 5,
        }
    }
}

impl SqliteStorage {
    /// Creates a new SQLite storage instance.
    pub async fn new(config: SqliteStorageConfig) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let storage = Self { pool };

        storage.migrate().await?;

        info!(path = %config.path, "SQLite storage initialized");
        Ok(storage)
    }

    /// Runs database migrations to create the schema.
    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS execution_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                opportunity_id TEXT NOT NULL,
                pair TEXT NOT NULL,
                buy_exchange TEXT NOT NULL,
                sell_exchange TEXT NOT NULL,
                success INTEGER NOT NULL,
                realized_profit TEXT NOT NULL,
                expected_profit TEXT NOT NULL,
                final_state TEXT NOT NULL,
                failed_at TEXT,
                reason TEXT,
                attempted_at TEXT NOT NULL,
                opportunity TEXT NOT NULL,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_execution_results_pair ON execution_results(pair)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_execution_results_attempted_at ON execution_results(attempted_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ResultStorage for SqliteStorage {
    async fn save(
        &self,
        opportunity: &ArbitrageOpportunity,
        result: &ExecutionResult,
    ) -> Result<(), StorageError> {
        let opportunity_json = serde_json::to_string(opportunity)?;

        sqlx::query(
            r#"
            INSERT INTO execution_results (
                opportunity_id, pair, buy_exchange, sell_exchange, success,
                realized_profit, expected_profit, final_state, failed_at, reason,
                attempted_at, opportunity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(result.opportunity_id())
        .bind(result.pair())
        .bind(&opportunity.buy_exchange)
        .bind(&opportunity.sell_exchange)
        .bind(result.success())
        .bind(result.realized_profit().to_string())
        .bind(opportunity.expected_profit.to_string())
        .bind(result.final_state().to_string())
        .bind(result.failed_at().map(|s| s.to_string()))
        .bind(result.reason())
        .bind(result.attempted_at().to_rfc3339())
        .bind(opportunity_json)
        .execute(&self.pool)
        .await?;

        debug!(
            id = %result.opportunity_id(),
            pair = %result.pair(),
            success = result.success(),
            "Execution result saved"
        );

        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<StoredExecution>, StorageError> {
        let rows = sqlx::query(&format!("{} ORDER BY attempted_at DESC, id DESC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(parse_execution_row).collect()
    }

    async fn get_by_pair(&self, pair: &str) -> Result<Vec<StoredExecution>, StorageError> {
        let rows = sqlx::query(&format!(
            "{} WHERE pair = ? ORDER BY attempted_at DESC, id DESC",
            SELECT_COLUMNS
        ))
        .bind(pair)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(parse_execution_row).collect()
    }

    async fn count(&self) -> Result<i64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM execution_results")
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

/// Parses an execution record from a database row.
fn parse_execution_row(row: &SqliteRow) -> Result<StoredExecution, StorageError> {
    let opportunity_json: String = row.try_get("opportunity")?;
    let opportunity: ArbitrageOpportunity = serde_json::from_str(&opportunity_json)?;

    let opportunity_id: String = row.try_get("opportunity_id")?;
    let pair: String = row.try_get("pair")?;
    let success: bool = row.try_get("success")?;

    let attempted_at_str: String = row.try_get("attempted_at")?;
    let attempted_at = DateTime::parse_from_rfc3339(&attempted_at_str)
        .map_err(|e| StorageError::InvalidData(format!("Invalid attempted_at: {}", e)))?
        .with_timezone(&Utc);

    let result = if success {
        let profit_str: String = row.try_get("realized_profit")?;
        let realized_profit = Decimal::from_str(&profit_str)
            .map_err(|e| StorageError::InvalidData(format!("Invalid realized_profit: {}", e)))?;
        ExecutionResult::completed(opportunity_id, pair, realized_profit, attempted_at)
    } else {
        let failed_at_str: Option<String> = row.try_get("failed_at")?;
        let failed_at = failed_at_str
            .as_deref()
            .map(ExecutionState::from_str)
            .transpose()
            .map_err(StorageError::InvalidData)?
            .ok_or_else(|| StorageError::InvalidData("reverted result without failed_at".into()))?;
        let reason: Option<String> = row.try_get("reason")?;
        ExecutionResult::reverted(
            opportunity_id,
            pair,
            failed_at,
            reason.unwrap_or_default(),
            attempted_at,
        )
    };

    Ok(StoredExecution {
        opportunity,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, Token};
    use tempfile::TempDir;

    fn opportunity(id: &str, token_out: &str) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            id: id.to_string(),
            token_in: Token::new("USDC", Address::from_low_u64(0x10), 6),
            token_out: Token::new(token_out, Address::from_low_u64(0x20), 18),
            buy_exchange: "uniswap".to_string(),
            sell_exchange: "sushiswap".to_string(),
            input_amount: Decimal::from(9000),
            expected_intermediate_amount: Decimal::from_str("4.48").unwrap(),
            expected_output_amount: Decimal::from(9090),
            premium: Decimal::from_str("8.1").unwrap(),
            expected_profit: Decimal::from_str("81.9").unwrap(),
            detected_at: Utc::now(),
        }
    }

    async fn storage(dir: &TempDir) -> SqliteStorage {
        let path = dir.path().join("results.db");
        SqliteStorage::new(SqliteStorageConfig {
            path: path.to_str().unwrap().to_string(),
            max_connections: 1,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_completed() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;

        let opp = opportunity("opp-1", "WETH");
        let result =
            ExecutionResult::completed(&opp.id, opp.pair(), opp.expected_profit, Utc::now());
        storage.save(&opp, &result).await.unwrap();

        let all = storage.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].opportunity, opp);
        assert_eq!(all[0].result, result);
        assert_eq!(storage.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_and_load_reverted() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;

        let opp = opportunity("opp-2", "WETH");
        let result = ExecutionResult::reverted(
            &opp.id,
            opp.pair(),
            ExecutionState::SwappedOnA,
            "slippage exceeded",
            Utc::now(),
        );
        storage.save(&opp, &result).await.unwrap();

        let all = storage.get_all().await.unwrap();
        assert_eq!(all[0].result, result);
        assert_eq!(all[0].result.failed_at(), Some(ExecutionState::SwappedOnA));
        assert_eq!(all[0].result.reason(), Some("slippage exceeded"));
    }

    #[tokio::test]
    async fn test_get_by_pair() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;

        for (id, out) in [("opp-1", "WETH"), ("opp-2", "DAI"), ("opp-3", "WETH")] {
            let opp = opportunity(id, out);
            let result = ExecutionResult::completed(&opp.id, opp.pair(), Decimal::ONE, Utc::now());
            storage.save(&opp, &result).await.unwrap();
        }

        let weth = storage.get_by_pair("USDC/WETH").await.unwrap();
        assert_eq!(weth.len(), 2);
        assert!(weth.iter().all(|r| r.result.pair() == "USDC/WETH"));
        assert_eq!(weth[0].opportunity.id, "opp-3");

        assert!(storage.get_by_pair("USDC/LINK").await.unwrap().is_empty());
        assert_eq!(storage.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let storage = storage(&dir).await;
            let opp = opportunity("opp-1", "WETH");
            let result = ExecutionResult::completed(&opp.id, opp.pair(), Decimal::ONE, Utc::now());
            storage.save(&opp, &result).await.unwrap();
            storage.close().await.unwrap();
        }

        let storage = storage(&dir).await;
        assert_eq!(storage.count().await.unwrap(), 1);
    }
}
