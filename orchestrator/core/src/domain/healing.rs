// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Healing
//!
//! Provides healing execution functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements healing execution records and ledger statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::domain::analysis::{HealingRecommendation, RecommendationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(pub Uuid);

impl ExecutionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal state of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealingStatus {
    Success,
    Failed,
    Skipped,
    DryRunSuccess,
    ManualInterventionRequired,
}

impl HealingStatus {
    pub const ALL: [HealingStatus; 5] = [
        HealingStatus::Success,
        HealingStatus::Failed,
        HealingStatus::Skipped,
        HealingStatus::DryRunSuccess,
        HealingStatus::ManualInterventionRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealingStatus::Success => "SUCCESS",
            HealingStatus::Failed => "FAILED",
            HealingStatus::Skipped => "SKIPPED",
            HealingStatus::DryRunSuccess => "DRY_RUN_SUCCESS",
            HealingStatus::ManualInterventionRequired => "MANUAL_INTERVENTION_REQUIRED",
        }
    }
}

impl fmt::Display for HealingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a handler reports before timing is attached
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub status: HealingStatus,
    pub message: String,
    pub details: Option<String>,
}

impl HandlerOutcome {
    pub fn new(status: HealingStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingExecutionResult {
    pub execution_id: ExecutionId,
    pub recommendation_id: RecommendationId,
    pub action: String,
    pub status: HealingStatus,
    pub message: String,
    pub details: Option<String>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: i64,
}

impl HealingExecutionResult {
    pub fn completed(
        execution_id: ExecutionId,
        recommendation: &HealingRecommendation,
        outcome: HandlerOutcome,
        start_time: DateTime<Utc>,
    ) -> Self {
        let end_time = Utc::now();
        Self {
            execution_id,
            recommendation_id: recommendation.id,
            action: recommendation.action.clone(),
            status: outcome.status,
            message: outcome.message,
            details: outcome.details,
            error: None,
            start_time,
            end_time,
            duration_ms: (end_time - start_time).num_milliseconds(),
        }
    }

    pub fn failed(
        execution_id: ExecutionId,
        recommendation: &HealingRecommendation,
        error: impl fmt::Display,
        start_time: DateTime<Utc>,
    ) -> Self {
        let end_time = Utc::now();
        let error = error.to_string();
        Self {
            execution_id,
            recommendation_id: recommendation.id,
            action: recommendation.action.clone(),
            status: HealingStatus::Failed,
            message: format!("Execution failed: {}", error),
            details: None,
            error: Some(error),
            start_time,
            end_time,
            duration_ms: (end_time - start_time).num_milliseconds(),
        }
    }
}

/// Ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingExecution {
    pub execution_id: ExecutionId,
    pub recommendation: HealingRecommendation,
    pub result: HealingExecutionResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealingStatistics {
    pub total_executions: u64,
    /// Executions with status SUCCESS; dry runs are not counted
    pub successful_executions: u64,
    pub success_rate: f64,
    pub executions_by_status: BTreeMap<HealingStatus, u64>,
    pub automation_enabled: bool,
    pub dry_run: bool,
}

/// Errors raised inside healing handlers
#[derive(Debug, thiserror::Error)]
pub enum HealingError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("Handler task aborted: {0}")]
    Aborted(String),
}

impl HealingError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        HealingError::Io {
            context: context.into(),
            source,
        }
    }
}
