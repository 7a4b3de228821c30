// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Analysis Results & Healing Recommendations
//!
//! Typed model of one analysis run. The language model (or the mock generator)
//! replies with loosely structured JSON; [`AnalysisPayload::parse`] turns that
//! text into a validated payload or an [`AnalysisError::Malformed`], never into
//! a partially populated result.
//!
//! Recommendations carry a [`HealingActionKind`] decided once, when the
//! recommendation is built, so the healing executor never has to re-read the
//! free-text action.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Analysis result vocabulary and response schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::insight::ErrorInsight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub Uuid);

impl AnalysisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecommendationId(pub Uuid);

impl RecommendationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecommendationId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "CRITICAL" => Ok(Priority::Critical),
            other => Err(AnalysisError::Malformed(format!("unknown priority '{}'", other))),
        }
    }
}

// Models are inconsistent about casing, so priorities are matched case-insensitively.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Closed set of healing handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealingActionKind {
    DiskCleanup,
    FileBackup,
    ValidationEnhancement,
    MonitoringEnhancement,
    Generic,
}

impl HealingActionKind {
    /// Classify free-text action. Groups are checked in a fixed order and the
    /// first match wins.
    pub fn classify(action: &str) -> Self {
        let action = action.to_lowercase();
        if action.contains("disk") || action.contains("cleanup") {
            HealingActionKind::DiskCleanup
        } else if action.contains("file") && action.contains("backup") {
            HealingActionKind::FileBackup
        } else if action.contains("validation") {
            HealingActionKind::ValidationEnhancement
        } else if action.contains("monitoring") {
            HealingActionKind::MonitoringEnhancement
        } else {
            HealingActionKind::Generic
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealingRecommendation {
    pub id: RecommendationId,
    pub action: String,
    pub priority: Priority,
    pub automated: bool,
    pub implementation: String,
    pub expected_outcome: String,
    pub kind: HealingActionKind,
}

impl HealingRecommendation {
    pub fn new(
        action: impl Into<String>,
        priority: Priority,
        automated: bool,
        implementation: impl Into<String>,
        expected_outcome: impl Into<String>,
    ) -> Self {
        let action = action.into();
        let kind = HealingActionKind::classify(&action);
        Self {
            id: RecommendationId::new(),
            action,
            priority,
            automated,
            implementation: implementation.into(),
            expected_outcome: expected_outcome.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    Completed,
    Disabled,
    Degraded,
}

/// Where the analysed text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Mock,
    Remote,
    /// Remote call failed and the mock generator answered instead
    MockFallback,
    None,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::Mock => "mock",
            AnalysisSource::Remote => "remote",
            AnalysisSource::MockFallback => "mock_fallback",
            AnalysisSource::None => "none",
        }
    }
}

/// Immutable snapshot of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: AnalysisId,
    pub status: AnalysisStatus,
    pub source: AnalysisSource,
    pub timestamp: DateTime<Utc>,
    pub root_cause_analysis: String,
    pub business_impact: String,
    pub correlations: Vec<String>,
    pub recommendations: Vec<HealingRecommendation>,
    pub prevention_strategies: Vec<String>,
    pub automation_opportunities: Vec<String>,
    pub confidence: f64,
    pub original_insights: Vec<ErrorInsight>,
}

impl AnalysisResult {
    pub fn from_payload(
        payload: AnalysisPayload,
        source: AnalysisSource,
        original_insights: Vec<ErrorInsight>,
    ) -> Self {
        let recommendations = payload
            .healing_recommendations
            .into_iter()
            .map(|r| {
                HealingRecommendation::new(
                    r.action,
                    r.priority,
                    r.automated,
                    r.implementation,
                    r.expected_outcome,
                )
            })
            .collect();

        Self {
            id: AnalysisId::new(),
            status: AnalysisStatus::Completed,
            source,
            timestamp: Utc::now(),
            root_cause_analysis: payload.root_cause_analysis,
            business_impact: payload.business_impact,
            correlations: payload.correlations,
            recommendations,
            prevention_strategies: payload.prevention_strategies,
            automation_opportunities: payload.automation_opportunities,
            confidence: payload.confidence,
            original_insights,
        }
    }

    pub fn disabled() -> Self {
        Self::empty(
            AnalysisStatus::Disabled,
            AnalysisSource::None,
            "AI analysis is disabled".to_string(),
            "N/A".to_string(),
        )
    }

    pub fn degraded(source: AnalysisSource, reason: impl fmt::Display) -> Self {
        Self::empty(
            AnalysisStatus::Degraded,
            source,
            format!("Error during analysis: {}", reason),
            "Unable to assess".to_string(),
        )
    }

    fn empty(
        status: AnalysisStatus,
        source: AnalysisSource,
        root_cause_analysis: String,
        business_impact: String,
    ) -> Self {
        Self {
            id: AnalysisId::new(),
            status,
            source,
            timestamp: Utc::now(),
            root_cause_analysis,
            business_impact,
            correlations: Vec::new(),
            recommendations: Vec::new(),
            prevention_strategies: Vec::new(),
            automation_opportunities: Vec::new(),
            confidence: 0.0,
            original_insights: Vec::new(),
        }
    }
}

/// Response schema the analysis backend is asked to follow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    pub root_cause_analysis: String,
    #[serde(default)]
    pub business_impact: String,
    #[serde(default)]
    pub correlations: Vec<String>,
    pub healing_recommendations: Vec<RecommendationPayload>,
    #[serde(default)]
    pub prevention_strategies: Vec<String>,
    #[serde(default)]
    pub automation_opportunities: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationPayload {
    pub action: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    /// Unspecified automation eligibility is treated as manual
    #[serde(default)]
    pub automated: bool,
    #[serde(default)]
    pub implementation: String,
    #[serde(default)]
    pub expected_outcome: String,
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl AnalysisPayload {
    /// Parse and validate a JSON reply
    pub fn parse(text: &str) -> Result<Self, AnalysisError> {
        let mut payload: AnalysisPayload = serde_json::from_str(text)
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        if !payload.confidence.is_finite() {
            return Err(AnalysisError::Malformed("confidence is not a finite number".into()));
        }
        payload.confidence = payload.confidence.clamp(0.0, 1.0);

        if let Some(blank) = payload
            .healing_recommendations
            .iter()
            .position(|r| r.action.trim().is_empty())
        {
            return Err(AnalysisError::Malformed(format!(
                "healing recommendation {} has an empty action",
                blank + 1
            )));
        }

        Ok(payload)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Malformed analysis response: {0}")]
    Malformed(String),

    #[error("No JSON object found in model response")]
    NoJsonObject,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Analysis cancelled")]
    Cancelled,
}
