// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Runtime
//!
//! Owns every stateful component of the pipeline for one service instance.
//! Built once from configuration and shared by `Arc`; there are no globals.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Composition root for detection, analysis and healing

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::analysis_orchestrator::AnalysisOrchestrator;
use crate::application::healing_executor::HealingExecutor;
use crate::application::insight_generator::InsightGenerator;
use crate::application::pattern_store::PatternStore;
use crate::domain::analysis::AnalysisResult;
use crate::domain::config::ServiceConfigManifest;
use crate::domain::healing::HealingExecutionResult;
use crate::domain::insight::ErrorInsight;

/// Analysis plus whatever the executor did with it
#[derive(Debug, Clone, Serialize)]
pub struct HealingCycle {
    pub analysis: AnalysisResult,
    pub executions: Vec<HealingExecutionResult>,
}

pub struct HealingRuntime {
    pub patterns: Arc<PatternStore>,
    pub insights: Arc<InsightGenerator>,
    pub analysis: Arc<AnalysisOrchestrator>,
    pub healing: Arc<HealingExecutor>,
    started_at: DateTime<Utc>,
}

impl HealingRuntime {
    pub fn new(
        patterns: PatternStore,
        insights: InsightGenerator,
        analysis: AnalysisOrchestrator,
        healing: HealingExecutor,
    ) -> Self {
        Self {
            patterns: Arc::new(patterns),
            insights: Arc::new(insights),
            analysis: Arc::new(analysis),
            healing: Arc::new(healing),
            started_at: Utc::now(),
        }
    }

    pub fn from_config(config: &ServiceConfigManifest) -> Self {
        let spec = &config.spec;
        let runtime = Self::new(
            PatternStore::from_config(&spec.detection),
            InsightGenerator::new(spec.detection.anomaly_threshold),
            AnalysisOrchestrator::from_config(&spec.analysis),
            HealingExecutor::from_config(&spec.automation),
        );

        tracing::info!(
            analysis_enabled = spec.analysis.enabled,
            analysis_mode = ?spec.analysis.mode,
            automation_enabled = spec.automation.enabled,
            dry_run = spec.automation.dry_run,
            "Healing runtime initialized"
        );
        runtime
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Current ranked insights
    pub fn current_insights(&self) -> Vec<ErrorInsight> {
        self.insights.analyze(
            &self.patterns.anomalous_summaries(),
            self.patterns.recent_total(),
        )
    }

    /// Snapshot of pattern statistics passed to the analysis as context
    pub fn system_context(&self) -> serde_json::Value {
        let stats = self.patterns.statistics();
        serde_json::json!({
            "totalPatterns": stats.total_patterns,
            "anomalousPatterns": stats.anomalous_patterns,
            "errorsByType": stats.errors_by_type,
            "uptimeSeconds": (Utc::now() - self.started_at).num_seconds(),
        })
    }

    pub async fn analyze_current(&self) -> AnalysisResult {
        self.analysis
            .analyze(self.current_insights(), self.system_context())
            .await
    }

    pub async fn heal_current(&self) -> HealingCycle {
        self.heal_current_with_cancellation(&CancellationToken::new())
            .await
    }

    pub async fn heal_current_with_cancellation(&self, cancel: &CancellationToken) -> HealingCycle {
        let analysis = self
            .analysis
            .analyze_with_cancellation(self.current_insights(), self.system_context(), cancel)
            .await;
        let executions = self
            .healing
            .execute_with_cancellation(&analysis.recommendations, cancel)
            .await;
        HealingCycle {
            analysis,
            executions,
        }
    }
}
