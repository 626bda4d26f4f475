//! Execution state machine states and terminal results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ExecutionState is a stage of one arbitrage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Idle,
    LoanRequested,
    SwappedOnA,
    SwappedOnB,
    Repaid,
    Completed,
    Reverted,
}

impl ExecutionState {
    /// Returns the state that legally follows this one on the success path.
    pub fn next(self) -> Option<ExecutionState> {
        match self {
            ExecutionState::Idle => Some(ExecutionState::LoanRequested),
            ExecutionState::LoanRequested => Some(ExecutionState::SwappedOnA),
            ExecutionState::SwappedOnA => Some(ExecutionState::SwappedOnB),
            ExecutionState::SwappedOnB => Some(ExecutionState::Repaid),
            ExecutionState::Repaid => Some(ExecutionState::Completed),
            ExecutionState::Completed | ExecutionState::Reverted => None,
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionState::Idle => "idle",
            ExecutionState::LoanRequested => "loan_requested",
            ExecutionState::SwappedOnA => "swapped_on_a",
            ExecutionState::SwappedOnB => "swapped_on_b",
            ExecutionState::Repaid => "repaid",
            ExecutionState::Completed => "completed",
            ExecutionState::Reverted => "reverted",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ExecutionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(ExecutionState::Idle),
            "loan_requested" => Ok(ExecutionState::LoanRequested),
            "swapped_on_a" => Ok(ExecutionState::SwappedOnA),
            "swapped_on_b" => Ok(ExecutionState::SwappedOnB),
            "repaid" => Ok(ExecutionState::Repaid),
            "completed" => Ok(ExecutionState::Completed),
            "reverted" => Ok(ExecutionState::Reverted),
            _ => Err(format!("Unknown execution state: {}", s)),
        }
    }
}

/// ExecutionResult is the terminal record of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    opportunity_id: String,
    pair: String,
    success: bool,
    realized_profit: Decimal,
    /// Completed or Reverted.
    final_state: ExecutionState,
    /// State the attempt had reached when it failed.
    failed_at: Option<ExecutionState>,
    reason: Option<String>,
    attempted_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Builds the record of a completed attempt.
    pub fn completed(
        opportunity_id: impl Into<String>,
        pair: impl Into<String>,
        realized_profit: Decimal,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            opportunity_id: opportunity_id.into(),
            pair: pair.into(),
            success: true,
            realized_profit,
            final_state: ExecutionState::Completed,
            failed_at: None,
            reason: None,
            attempted_at,
        }
    }

    /// Builds the record of a reverted attempt. `failed_at` is the state the
    /// attempt had reached when the failure occurred.
    pub fn reverted(
        opportunity_id: impl Into<String>,
        pair: impl Into<String>,
        failed_at: ExecutionState,
        reason: impl Into<String>,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            opportunity_id: opportunity_id.into(),
            pair: pair.into(),
            success: false,
            realized_profit: Decimal::ZERO,
            final_state: ExecutionState::Reverted,
            failed_at: Some(failed_at),
            reason: Some(reason.into()),
            attempted_at,
        }
    }

    pub fn opportunity_id(&self) -> &str {
        &self.opportunity_id
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn realized_profit(&self) -> Decimal {
        self.realized_profit
    }

    pub fn final_state(&self) -> ExecutionState {
        self.final_state
    }

    pub fn failed_at(&self) -> Option<ExecutionState> {
        self.failed_at
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn attempted_at(&self) -> DateTime<Utc> {
        self.attempted_at
    }
}
