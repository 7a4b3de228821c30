// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Analysis Orchestrator
//!
//! Turns a list of [`ErrorInsight`]s into an [`AnalysisResult`]. The contract
//! is total: every call returns a result, never an error.
//!
//! ## Flow
//!
//! ```text
//! insights + context
//!     │
//!     ├─ disabled ───────────────► DISABLED result (no prompt, no backend)
//!     │
//!     ├─ build prompt
//!     │
//!     ├─ mock ───► mock reply ──────────────┐
//!     │                                     │
//!     └─ remote ─► LLM ─► first {…} object ─┤
//!                   │                       │
//!                   └─ any failure ─► mock reply (empty inputs)
//!                                           │
//!                                  typed parse + validation
//!                                           │
//!                         COMPLETED result  or  DEGRADED result
//! ```
//!
//! Cancellation is observed before the backend is called and while a remote
//! call is in flight; a cancelled run yields a DEGRADED result.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Prompt building, backend selection and response parsing

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::domain::analysis::{AnalysisError, AnalysisPayload, AnalysisResult, AnalysisSource, AnalysisStatus};
use crate::domain::config::{AnalysisConfig, AnalysisMode};
use crate::domain::insight::ErrorInsight;
use crate::domain::llm::{GenerationOptions, LLMError, LLMProvider};
use crate::infrastructure::json_extract::extract_first_object;
use crate::infrastructure::llm::create_provider;
use crate::infrastructure::mock_analysis::mock_response;
use crate::infrastructure::service_context::{error_guidance, SERVICE_CONTEXT};

const ANALYSIS_REQUEST: &str = r#"## Analysis Request
As a specialist in self-healing systems, analyse the error patterns above and provide:

1. Root cause analysis: the underlying causes of these patterns
2. Business impact assessment: effect on user experience and reliability
3. Correlation analysis: relationships between the patterns
4. Healing recommendations: specific, actionable healing steps
5. Prevention strategies: long-term improvements against recurrence
6. Automation opportunities: which healing actions can be automated

Reply with a single JSON object using exactly this schema:
{
    "rootCauseAnalysis": "detailed analysis",
    "businessImpact": "impact assessment",
    "correlations": ["correlation1", "correlation2"],
    "healingRecommendations": [
        {
            "action": "specific action",
            "priority": "CRITICAL|HIGH|MEDIUM|LOW",
            "automated": true,
            "implementation": "how to implement",
            "expectedOutcome": "expected result"
        }
    ],
    "preventionStrategies": ["strategy1", "strategy2"],
    "automationOpportunities": ["opportunity1", "opportunity2"],
    "confidence": 0.95
}
Provide analysis in JSON format."#;

pub struct AnalysisOrchestrator {
    enabled: bool,
    mode: AnalysisMode,
    provider: Option<Arc<dyn LLMProvider>>,
    options: GenerationOptions,
}

impl AnalysisOrchestrator {
    pub fn new(enabled: bool, mode: AnalysisMode, provider: Option<Arc<dyn LLMProvider>>) -> Self {
        Self {
            enabled,
            mode,
            provider,
            options: GenerationOptions::default(),
        }
    }

    /// A provider that cannot be built is logged and the remote path then
    /// always falls back to the mock generator.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let provider = match config.mode {
            AnalysisMode::Mock => None,
            AnalysisMode::Remote => match create_provider(&config.llm) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    error!("Failed to configure LLM provider, remote analysis will fall back to mock: {}", e);
                    None
                }
            },
        };
        Self::new(config.enabled, config.mode, provider)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// `None` when no remote provider is configured
    pub async fn provider_health(&self) -> Option<Result<(), LLMError>> {
        match &self.provider {
            Some(provider) => Some(provider.health_check().await),
            None => None,
        }
    }

    pub async fn analyze(&self, insights: Vec<ErrorInsight>, context: serde_json::Value) -> AnalysisResult {
        self.analyze_with_cancellation(insights, context, &CancellationToken::new())
            .await
    }

    pub async fn analyze_with_cancellation(
        &self,
        insights: Vec<ErrorInsight>,
        context: serde_json::Value,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        info!("Starting analysis for {} error insights", insights.len());

        if !self.enabled {
            let result = AnalysisResult::disabled();
            record_metrics(&result);
            return result;
        }

        if cancel.is_cancelled() {
            return self.finish(AnalysisResult::degraded(AnalysisSource::None, AnalysisError::Cancelled));
        }

        let (reply, source) = match self.mode {
            AnalysisMode::Mock => (mock_response(&insights), AnalysisSource::Mock),
            AnalysisMode::Remote => {
                let prompt = build_prompt(&insights, &context);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!("Analysis cancelled while waiting for the LLM provider");
                        return self.finish(AnalysisResult::degraded(
                            AnalysisSource::Remote,
                            AnalysisError::Cancelled,
                        ));
                    }
                    outcome = self.call_remote(&prompt) => outcome,
                }
            }
        };

        let result = match reply.and_then(|text| AnalysisPayload::parse(&text)) {
            Ok(payload) => AnalysisResult::from_payload(payload, source, insights),
            Err(e) => {
                error!("Error parsing analysis response: {}", e);
                AnalysisResult::degraded(source, e)
            }
        };

        self.finish(result)
    }

    fn finish(&self, result: AnalysisResult) -> AnalysisResult {
        record_metrics(&result);
        info!(
            analysis_id = %result.id.0,
            status = status_label(result.status),
            source = result.source.as_str(),
            confidence = result.confidence,
            "Analysis completed with {} recommendations",
            result.recommendations.len()
        );
        result
    }

    async fn call_remote(&self, prompt: &str) -> (Result<String, AnalysisError>, AnalysisSource) {
        let Some(provider) = &self.provider else {
            warn!("No LLM provider available, falling back to mock analysis");
            return fallback();
        };

        info!(provider = provider.name(), "Calling LLM provider");
        match provider.generate(prompt, &self.options).await {
            Ok(response) => match extract_first_object(&response.text) {
                Some(object) => {
                    info!(
                        provider = %response.provider,
                        model = %response.model,
                        chars = object.len(),
                        "LLM analysis received"
                    );
                    (Ok(object.to_string()), AnalysisSource::Remote)
                }
                None => {
                    warn!("{}, falling back to mock analysis", AnalysisError::NoJsonObject);
                    fallback()
                }
            },
            Err(e) => {
                warn!("LLM provider call failed, falling back to mock analysis: {}", e);
                fallback()
            }
        }
    }
}

fn fallback() -> (Result<String, AnalysisError>, AnalysisSource) {
    (mock_response(&[]), AnalysisSource::MockFallback)
}

/// Prompt sent to the remote provider
pub fn build_prompt(insights: &[ErrorInsight], context: &serde_json::Value) -> String {
    let mut prompt = String::with_capacity(SERVICE_CONTEXT.len() + 2048);
    prompt.push_str(SERVICE_CONTEXT);
    prompt.push_str("\n\n");

    prompt.push_str("## Current System State\n");
    let _ = writeln!(prompt, "Timestamp: {}", Utc::now().to_rfc3339());
    let _ = writeln!(prompt, "System Context: {}\n", context);

    prompt.push_str("## Error Patterns Detected\n");
    for (i, insight) in insights.iter().enumerate() {
        let _ = writeln!(prompt, "{}. Error Type: {}", i + 1, insight.error_type);
        let _ = writeln!(prompt, "   Severity: {}", insight.severity);
        let _ = writeln!(prompt, "   Message: {}", insight.message);
        let _ = writeln!(prompt, "   Occurrences: {}", insight.occurrence_count);
        let _ = writeln!(prompt, "   Current Recommendation: {}\n", insight.recommendation);
    }

    let types: BTreeSet<&str> = insights.iter().map(|i| i.error_type.as_str()).collect();
    let guidance: Vec<(&str, &str)> = types
        .into_iter()
        .filter_map(|t| error_guidance(t).map(|g| (t, g)))
        .collect();
    if !guidance.is_empty() {
        prompt.push_str("## Error-Specific Guidance\n");
        for (error_type, note) in guidance {
            let _ = writeln!(prompt, "- {}: {}", error_type, note);
        }
        prompt.push('\n');
    }

    prompt.push_str(ANALYSIS_REQUEST);
    prompt
}

fn status_label(status: AnalysisStatus) -> &'static str {
    match status {
        AnalysisStatus::Completed => "completed",
        AnalysisStatus::Disabled => "disabled",
        AnalysisStatus::Degraded => "degraded",
    }
}

fn record_metrics(result: &AnalysisResult) {
    metrics::counter!(
        "selfheal_analyses_total",
        "status" => status_label(result.status),
        "source" => result.source.as_str()
    )
    .increment(1);
}
