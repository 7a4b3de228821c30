// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Healing Executor
//!
//! Runs the automation-eligible recommendations of an analysis one after
//! another and records every attempt in the ledger. Each attempt ends in
//! exactly one terminal [`HealingStatus`]; handler errors and panics become
//! FAILED entries and the batch carries on. There are no retries.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Dispatch by action kind, dry-run simulation, ledger and statistics

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::analysis::{HealingActionKind, HealingRecommendation};
use crate::domain::config::AutomationConfig;
use crate::domain::healing::{
    ExecutionId, HandlerOutcome, HealingError, HealingExecution, HealingExecutionResult,
    HealingStatistics, HealingStatus,
};
use crate::infrastructure::healing_actions::HealingActions;
use crate::infrastructure::ledger::HealingLedger;

pub struct HealingExecutor {
    automation_enabled: bool,
    dry_run: bool,
    dry_run_delay_ms: (u64, u64),
    actions: Arc<HealingActions>,
    ledger: HealingLedger,
}

impl HealingExecutor {
    pub fn new(
        automation_enabled: bool,
        dry_run: bool,
        dry_run_delay_ms: (u64, u64),
        actions: HealingActions,
        ledger_capacity: usize,
    ) -> Self {
        let (min, max) = dry_run_delay_ms;
        Self {
            automation_enabled,
            dry_run,
            dry_run_delay_ms: (min.min(max), max.max(min)),
            actions: Arc::new(actions),
            ledger: HealingLedger::new(ledger_capacity),
        }
    }

    pub fn from_config(config: &AutomationConfig) -> Self {
        Self::new(
            config.enabled,
            config.dry_run,
            (config.dry_run_min_delay_ms, config.dry_run_max_delay_ms),
            HealingActions::from_config(config),
            config.ledger_capacity,
        )
    }

    pub fn automation_enabled(&self) -> bool {
        self.automation_enabled
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub async fn execute(&self, recommendations: &[HealingRecommendation]) -> Vec<HealingExecutionResult> {
        self.execute_with_cancellation(recommendations, &CancellationToken::new())
            .await
    }

    /// Stops before the next recommendation once `cancel` fires and returns
    /// what has completed so far.
    pub async fn execute_with_cancellation(
        &self,
        recommendations: &[HealingRecommendation],
        cancel: &CancellationToken,
    ) -> Vec<HealingExecutionResult> {
        info!(
            "Starting automated healing execution for {} recommendations",
            recommendations.len()
        );

        if !self.automation_enabled {
            info!("Automated healing is disabled");
            return Vec::new();
        }

        let mut results = Vec::new();
        for recommendation in recommendations {
            if cancel.is_cancelled() {
                warn!(
                    completed = results.len(),
                    "Healing batch cancelled, skipping remaining recommendations"
                );
                break;
            }

            if !recommendation.automated {
                info!("Skipping manual recommendation: {}", recommendation.action);
                continue;
            }

            results.push(self.execute_one(recommendation).await);
        }

        info!("Completed automated healing execution with {} results", results.len());
        results
    }

    async fn execute_one(&self, recommendation: &HealingRecommendation) -> HealingExecutionResult {
        let execution_id = ExecutionId::new();
        let start_time = Utc::now();
        info!(
            execution_id = %execution_id,
            kind = ?recommendation.kind,
            dry_run = self.dry_run,
            "Executing healing action: {}",
            recommendation.action
        );

        let outcome = AssertUnwindSafe(self.dispatch(recommendation))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(HealingError::Panicked(panic_message(panic))));

        let result = match outcome {
            Ok(outcome) => {
                HealingExecutionResult::completed(execution_id, recommendation, outcome, start_time)
            }
            Err(e) => {
                error!(execution_id = %execution_id, "Error executing healing action {}: {}", recommendation.action, e);
                HealingExecutionResult::failed(execution_id, recommendation, e, start_time)
            }
        };

        self.ledger.append(recommendation, &result);
        metrics::counter!("selfheal_healing_executions_total", "status" => result.status.as_str())
            .increment(1);
        info!(
            execution_id = %execution_id,
            duration_ms = result.duration_ms,
            "Healing action completed: {} - Status: {}",
            recommendation.action,
            result.status
        );
        result
    }

    async fn dispatch(&self, recommendation: &HealingRecommendation) -> Result<HandlerOutcome, HealingError> {
        if self.dry_run {
            return Ok(self.simulate(recommendation.kind).await);
        }

        match recommendation.kind {
            HealingActionKind::DiskCleanup => self.run_blocking(HealingActions::disk_cleanup).await,
            HealingActionKind::FileBackup => self.run_blocking(HealingActions::file_backup).await,
            HealingActionKind::ValidationEnhancement => Ok(self.actions.validation_enhancement()),
            HealingActionKind::MonitoringEnhancement => Ok(self.actions.monitoring_enhancement()),
            HealingActionKind::Generic => Ok(self.actions.generic(recommendation)),
        }
    }

    async fn simulate(&self, kind: HealingActionKind) -> HandlerOutcome {
        let (min, max) = self.dry_run_delay_ms;
        let delay = rand::rng().random_range(min..=max);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let details = match kind {
            HealingActionKind::DiskCleanup => "Would clean up temporary files and rotate logs",
            HealingActionKind::FileBackup => "Would implement file backup and retry mechanisms",
            HealingActionKind::ValidationEnhancement => {
                "Would enhance input validation and error messaging"
            }
            HealingActionKind::MonitoringEnhancement => {
                "Would enhance monitoring and alerting systems"
            }
            HealingActionKind::Generic => "Would execute generic healing action",
        };

        HandlerOutcome::new(
            HealingStatus::DryRunSuccess,
            "Dry run completed successfully - no actual changes made",
        )
        .with_details(details)
    }

    async fn run_blocking<F>(&self, handler: F) -> Result<HandlerOutcome, HealingError>
    where
        F: FnOnce(&HealingActions) -> Result<HandlerOutcome, HealingError> + Send + 'static,
    {
        let actions = self.actions.clone();
        match tokio::task::spawn_blocking(move || handler(&actions)).await {
            Ok(outcome) => outcome,
            Err(join) if join.is_panic() => Err(HealingError::Panicked(panic_message(join.into_panic()))),
            Err(join) => Err(HealingError::Aborted(join.to_string())),
        }
    }

    /// At most `limit` ledger entries, newest first
    pub fn history(&self, limit: usize) -> Vec<HealingExecution> {
        self.ledger.history(limit)
    }

    pub fn statistics(&self) -> HealingStatistics {
        let counts = self.ledger.counts();
        let mut executions_by_status = counts.by_status;
        for status in HealingStatus::ALL {
            executions_by_status.entry(status).or_insert(0);
        }

        let successful = executions_by_status
            .get(&HealingStatus::Success)
            .copied()
            .unwrap_or(0);
        let success_rate = if counts.total > 0 {
            successful as f64 / counts.total as f64
        } else {
            0.0
        };

        HealingStatistics {
            total_executions: counts.total,
            successful_executions: successful,
            success_rate,
            executions_by_status,
            automation_enabled: self.automation_enabled,
            dry_run: self.dry_run,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
