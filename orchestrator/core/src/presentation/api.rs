// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! Axum router exposing the detection, analysis and healing pipeline. Every
//! response uses the same envelope:
//!
//! ```json
//! { "success": true, "data": { … }, "error": null, "timestamp": "…" }
//! ```
//!
//! Request validation failures are answered with a 400 envelope and also fed
//! back into the pattern store as `VALIDATION_ERROR` occurrences, so a
//! misbehaving client shows up in the error patterns like any other fault.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::runtime::{HealingCycle, HealingRuntime};
use crate::domain::analysis::AnalysisResult;
use crate::domain::config::AnalysisMode;
use crate::domain::healing::HealingExecution;
use crate::domain::insight::{error_types, ErrorInsight, ErrorStatistics, Severity};

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

const DEFAULT_HISTORY_LIMIT: usize = 10;

pub struct AppState {
    pub runtime: Arc<HealingRuntime>,
}

pub fn app(runtime: Arc<HealingRuntime>) -> Router {
    let state = Arc::new(AppState { runtime });

    Router::new()
        .route("/health", get(liveness))
        .route("/api/v1/ai/analyze", post(analyze))
        .route("/api/v1/ai/heal", post(heal))
        .route("/api/v1/ai/healing-history", get(healing_history))
        .route("/api/v1/ai/statistics", get(statistics))
        .route("/api/v1/ai/test-analysis", post(test_analysis))
        .route("/api/v1/ai/health", get(ai_health))
        .route("/api/v1/monitoring/error-patterns", get(error_patterns))
        .route("/api/v1/monitoring/error-statistics", get(error_statistics))
        .route("/api/v1/monitoring/errors", post(ingest_error))
        .route("/api/v1/monitoring/test-error", post(test_error))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorDetails>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorDetails {
                code: code.to_string(),
                message: message.into(),
                details,
            }),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Build a 400 and record it as a `VALIDATION_ERROR` occurrence
    fn validation(state: &AppState, message: impl Into<String>, correlation_id: Option<String>) -> Self {
        let message = message.into();
        warn!(correlation_id = correlation_id.as_deref().unwrap_or("-"), "Validation error: {}", message);
        state.runtime.patterns.record_occurrence(
            error_types::VALIDATION_ERROR,
            &message,
            None,
            correlation_id,
        );
        Self {
            status: StatusCode::BAD_REQUEST,
            code: error_types::VALIDATION_ERROR,
            message: "Validation failed".to_string(),
            details: Some(serde_json::json!({ "reason": message })),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.code, self.message, self.details);
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Liveness {
    status: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    uptime_seconds: i64,
}

async fn liveness(State(state): State<Arc<AppState>>) -> ApiResult<Liveness> {
    let started_at = state.runtime.started_at();
    ok(Liveness {
        status: "UP",
        version: env!("CARGO_PKG_VERSION"),
        started_at,
        uptime_seconds: (Utc::now() - started_at).num_seconds(),
    })
}

async fn analyze(State(state): State<Arc<AppState>>) -> ApiResult<AnalysisResult> {
    info!("POST /api/v1/ai/analyze - Triggering analysis");
    ok(state.runtime.analyze_current().await)
}

async fn heal(State(state): State<Arc<AppState>>) -> ApiResult<HealingCycle> {
    info!("POST /api/v1/ai/heal - Executing automated healing");
    ok(state.runtime.heal_current().await)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn healing_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Vec<HealingExecution>> {
    let Query(query) = query.map_err(|e| ApiError::validation(&state, e.body_text(), None))?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    ok(state.runtime.healing.history(limit))
}

async fn statistics(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    let runtime = &state.runtime;
    ok(serde_json::json!({
        "healingEngine": runtime.healing.statistics(),
        "errorPatterns": runtime.patterns.statistics(),
        "uptimeSeconds": (Utc::now() - runtime.started_at()).num_seconds(),
        "timestamp": Utc::now(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestAnalysisQuery {
    error_type: String,
    error_message: String,
    severity: Option<String>,
}

async fn test_analysis(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TestAnalysisQuery>, QueryRejection>,
) -> ApiResult<AnalysisResult> {
    let Query(query) = query.map_err(|e| ApiError::validation(&state, e.body_text(), None))?;
    let severity = match query.severity.as_deref() {
        None => Severity::Medium,
        Some(raw) => raw
            .parse::<Severity>()
            .map_err(|e| ApiError::validation(&state, e.to_string(), None))?,
    };

    info!(error_type = %query.error_type, "POST /api/v1/ai/test-analysis - Testing analysis with custom scenario");
    let insight = ErrorInsight::synthetic(&query.error_type, &query.error_message, severity);
    let result = state
        .runtime
        .analysis
        .analyze(vec![insight], state.runtime.system_context())
        .await;
    ok(result)
}

async fn ai_health(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    let runtime = &state.runtime;
    let analysis = &runtime.analysis;

    let provider = match analysis.provider_health().await {
        None => serde_json::json!({ "status": "NOT_CONFIGURED" }),
        Some(Ok(())) => serde_json::json!({
            "status": "OPERATIONAL",
            "name": analysis.provider_name(),
        }),
        Some(Err(e)) => serde_json::json!({
            "status": "UNAVAILABLE",
            "name": analysis.provider_name(),
            "error": e.to_string(),
        }),
    };
    let degraded = analysis.mode() == AnalysisMode::Remote && provider["status"] != "OPERATIONAL";

    ok(serde_json::json!({
        "status": if degraded { "DEGRADED" } else { "HEALTHY" },
        "components": {
            "analysisService": "OPERATIONAL",
            "healingEngine": "OPERATIONAL",
            "errorPatternDetector": "OPERATIONAL",
            "llmProvider": provider,
        },
        "configuration": {
            "aiEnabled": analysis.is_enabled(),
            "mockMode": analysis.mode() == AnalysisMode::Mock,
            "automationEnabled": runtime.healing.automation_enabled(),
            "dryRunMode": runtime.healing.dry_run(),
        },
        "recentActivity": {
            "totalPatterns": runtime.patterns.pattern_count(),
            "totalExecutions": runtime.healing.statistics().total_executions,
        },
        "timestamp": Utc::now(),
    }))
}

async fn error_patterns(State(state): State<Arc<AppState>>) -> ApiResult<Vec<ErrorInsight>> {
    ok(state.runtime.current_insights())
}

async fn error_statistics(State(state): State<Arc<AppState>>) -> ApiResult<ErrorStatistics> {
    ok(state.runtime.patterns.statistics())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestRequest {
    #[serde(alias = "error_type")]
    error_type: String,
    message: String,
    #[serde(default, alias = "stack_trace")]
    stack_trace: Option<String>,
    #[serde(default, alias = "correlation_id")]
    correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestAck {
    pattern_key: String,
    became_anomalous: bool,
    correlation_id: String,
}

async fn ingest_error(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> Response {
    let header_id = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => return ApiError::validation(&state, e.body_text(), header_id).into_response(),
    };

    let correlation_id = header_id
        .or_else(|| request.correlation_id.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if request.error_type.trim().is_empty() || request.message.trim().is_empty() {
        return ApiError::validation(
            &state,
            "errorType and message must not be empty",
            Some(correlation_id),
        )
        .into_response();
    }

    let outcome = state.runtime.patterns.record_occurrence(
        request.error_type.trim(),
        &request.message,
        request.stack_trace,
        Some(correlation_id.clone()),
    );

    let header = HeaderValue::from_str(&correlation_id).ok();
    let ack = ApiResponse::success(IngestAck {
        pattern_key: outcome.key.to_string(),
        became_anomalous: outcome.became_anomalous,
        correlation_id,
    });

    let mut response = (StatusCode::ACCEPTED, Json(ack)).into_response();
    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TestErrorQuery {
    error_type: String,
    error_message: String,
}

async fn test_error(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TestErrorQuery>, QueryRejection>,
) -> ApiResult<&'static str> {
    let Query(query) = query.map_err(|e| ApiError::validation(&state, e.body_text(), None))?;
    info!(
        error_type = %query.error_type,
        "POST /api/v1/monitoring/test-error - Recording test error"
    );
    state.runtime.patterns.record_occurrence(
        &query.error_type,
        &query.error_message,
        Some("Test stack trace".to_string()),
        Some("test-correlation-id".to_string()),
    );
    ok("Test error recorded successfully")
}
