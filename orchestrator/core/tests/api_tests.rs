// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Router tests for the HTTP API, driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use selfheal_core::application::HealingRuntime;
use selfheal_core::domain::config::ServiceConfigManifest;
use selfheal_core::domain::insight::error_types;
use selfheal_core::presentation::api::{app, CORRELATION_ID_HEADER};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn runtime(dir: &TempDir) -> Arc<HealingRuntime> {
    let mut config = ServiceConfigManifest::default();
    let automation = &mut config.spec.automation;
    automation.dry_run = true;
    automation.dry_run_min_delay_ms = 0;
    automation.dry_run_max_delay_ms = 1;
    automation.temp_dir = Some(dir.path().join("tmp"));
    automation.log_file = dir.path().join("app.log");
    automation.data_file = dir.path().join("users.json");
    automation.backup_dir = dir.path().join("backups");
    Arc::new(HealingRuntime::from_config(&config))
}

async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_liveness_reports_up() {
    let dir = TempDir::new().unwrap();
    let (status, body) = call(app(runtime(&dir)), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());
    assert_eq!(body["data"]["status"], "UP");
    assert!(body["data"]["uptimeSeconds"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn test_test_error_feeds_error_patterns() {
    let dir = TempDir::new().unwrap();
    let runtime = runtime(&dir);

    for _ in 0..5 {
        let (status, body) = call(
            app(runtime.clone()),
            post("/api/v1/monitoring/test-error?errorType=FILE_OPERATION_ERROR&errorMessage=disk%20full"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "Test error recorded successfully");
    }

    let (_, body) = call(app(runtime.clone()), get("/api/v1/monitoring/error-patterns")).await;
    let insights = body["data"].as_array().unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0]["error_type"], error_types::FILE_OPERATION_ERROR);
    assert_eq!(insights[0]["severity"], "MEDIUM");

    let (_, body) = call(app(runtime), get("/api/v1/monitoring/error-statistics")).await;
    assert_eq!(body["data"]["total_patterns"], 1);
    assert_eq!(body["data"]["anomalous_patterns"], 1);
}

#[tokio::test]
async fn test_ingest_echoes_correlation_id() {
    let dir = TempDir::new().unwrap();
    let request = Request::post("/api/v1/monitoring/errors")
        .header("content-type", "application/json")
        .header(CORRELATION_ID_HEADER, "req-42")
        .body(Body::from(
            r#"{"errorType":"USER_NOT_FOUND","message":"user 7 missing"}"#,
        ))
        .unwrap();

    let response = app(runtime(&dir)).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()[CORRELATION_ID_HEADER], "req-42");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["correlationId"], "req-42");
    assert_eq!(body["data"]["becameAnomalous"], false);
}

#[tokio::test]
async fn test_ingest_generates_correlation_id_when_absent() {
    let dir = TempDir::new().unwrap();
    let request = Request::post("/api/v1/monitoring/errors")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"errorType":"DUPLICATE_EMAIL","message":"a@b.c taken"}"#))
        .unwrap();

    let (status, body) = call(app(runtime(&dir)), request).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let id = body["data"]["correlationId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_empty_ingest_is_rejected_and_recorded() {
    let dir = TempDir::new().unwrap();
    let runtime = runtime(&dir);
    let request = Request::post("/api/v1/monitoring/errors")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"errorType":"","message":"x"}"#))
        .unwrap();

    let (status, body) = call(app(runtime.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert_eq!(body["error"]["code"], error_types::VALIDATION_ERROR);
    let stats = runtime.patterns.statistics();
    assert_eq!(stats.errors_by_type.get(error_types::VALIDATION_ERROR), Some(&1));
}

#[tokio::test]
async fn test_test_analysis_rejects_unknown_severity() {
    let dir = TempDir::new().unwrap();
    let (status, body) = call(
        app(runtime(&dir)),
        post("/api/v1/ai/test-analysis?errorType=X&errorMessage=y&severity=EXTREME"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], error_types::VALIDATION_ERROR);
}

#[tokio::test]
async fn test_test_analysis_requires_parameters() {
    let dir = TempDir::new().unwrap();
    let (status, body) = call(app(runtime(&dir)), post("/api/v1/ai/test-analysis?errorType=X")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], error_types::VALIDATION_ERROR);
}

#[tokio::test]
async fn test_test_analysis_returns_mock_result() {
    let dir = TempDir::new().unwrap();
    let (status, body) = call(
        app(runtime(&dir)),
        post("/api/v1/ai/test-analysis?errorType=VALIDATION_ERROR&errorMessage=bad%20email&severity=high"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["status"], "COMPLETED");
    assert_eq!(data["original_insights"][0]["occurrence_count"], 5);
    assert_eq!(data["original_insights"][0]["severity"], "HIGH");
    assert_eq!(
        data["original_insights"][0]["recommendation"],
        "Test recommendation for VALIDATION_ERROR"
    );
}

#[tokio::test]
async fn test_heal_then_history_and_statistics() {
    let dir = TempDir::new().unwrap();
    let runtime = runtime(&dir);
    for _ in 0..5 {
        runtime
            .patterns
            .record_occurrence(error_types::VALIDATION_ERROR, "email is required", None, None);
    }

    let (status, body) = call(app(runtime.clone()), post("/api/v1/ai/heal")).await;
    assert_eq!(status, StatusCode::OK);
    let executions = body["data"]["executions"].as_array().unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0]["status"], "DRY_RUN_SUCCESS");

    let (_, body) = call(app(runtime.clone()), get("/api/v1/ai/healing-history?limit=5")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call(app(runtime), get("/api/v1/ai/statistics")).await;
    assert_eq!(body["data"]["healingEngine"]["total_executions"], 1);
    assert_eq!(body["data"]["healingEngine"]["executions_by_status"]["DRY_RUN_SUCCESS"], 1);
    assert_eq!(body["data"]["errorPatterns"]["total_patterns"], 1);
}

#[tokio::test]
async fn test_ai_health_reports_configuration() {
    let dir = TempDir::new().unwrap();
    let (status, body) = call(app(runtime(&dir)), get("/api/v1/ai/health")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["status"], "HEALTHY");
    assert_eq!(data["configuration"]["aiEnabled"], true);
    assert_eq!(data["configuration"]["mockMode"], true);
    assert_eq!(data["configuration"]["dryRunMode"], true);
    assert_eq!(data["components"]["llmProvider"]["status"], "NOT_CONFIGURED");
}
