// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the detection → analysis → healing pipeline
//!
//! These tests drive the public application services end to end:
//! 1. Record occurrences into the pattern store
//! 2. Derive ranked insights
//! 3. Analyze them (mock and remote providers)
//! 4. Execute the resulting recommendations and inspect the ledger

use std::path::Path;

use selfheal_core::application::{
    AnalysisOrchestrator, HealingExecutor, HealingRuntime, InsightGenerator, PatternStore,
};
use selfheal_core::domain::analysis::{AnalysisSource, AnalysisStatus, HealingRecommendation, Priority};
use selfheal_core::domain::config::{
    AnalysisMode, AutomationConfig, DetectionConfig, LLMProviderConfig, ServiceConfigManifest,
};
use selfheal_core::domain::healing::HealingStatus;
use selfheal_core::domain::insight::{error_types, Severity};
use selfheal_core::infrastructure::llm::create_provider;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn automation_in(dir: &Path, dry_run: bool) -> AutomationConfig {
    let temp_dir = dir.join("tmp");
    std::fs::create_dir_all(&temp_dir).unwrap();
    AutomationConfig {
        enabled: true,
        dry_run,
        dry_run_min_delay_ms: 0,
        dry_run_max_delay_ms: 5,
        temp_dir: Some(temp_dir),
        log_file: dir.join("logs/app.log"),
        data_file: dir.join("data/users.json"),
        backup_dir: dir.join("data/backups"),
        ..AutomationConfig::default()
    }
}

fn store() -> PatternStore {
    PatternStore::from_config(&DetectionConfig::default())
}

#[tokio::test]
async fn test_repeated_file_errors_produce_one_medium_insight() {
    let patterns = store();
    for _ in 0..5 {
        patterns.record_occurrence(error_types::FILE_OPERATION_ERROR, "disk full", None, None);
    }

    let insights = InsightGenerator::new(5).analyze(
        &patterns.anomalous_summaries(),
        patterns.recent_total(),
    );

    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].error_type, error_types::FILE_OPERATION_ERROR);
    assert_eq!(insights[0].severity, Severity::Medium);
    assert_eq!(insights[0].occurrence_count, 5);

    let stats = patterns.statistics();
    assert_eq!(stats.total_patterns, 1);
    assert_eq!(stats.anomalous_patterns, 1);
    assert_eq!(stats.errors_by_type.get(error_types::FILE_OPERATION_ERROR), Some(&5));
}

#[tokio::test]
async fn test_validation_storm_yields_circuit_breaker_recommendation() {
    let patterns = store();
    for _ in 0..11 {
        patterns.record_occurrence(error_types::VALIDATION_ERROR, "email is required", None, None);
    }
    let insights = InsightGenerator::new(5).analyze(
        &patterns.anomalous_summaries(),
        patterns.recent_total(),
    );
    assert!(insights.iter().any(|i| i.error_type == error_types::HIGH_ERROR_RATE));

    let orchestrator = AnalysisOrchestrator::new(true, AnalysisMode::Mock, None);
    let result = orchestrator.analyze(insights, serde_json::json!({})).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.source, AnalysisSource::Mock);
    let summary: Vec<(&str, Priority, bool)> = result
        .recommendations
        .iter()
        .map(|r| (r.action.as_str(), r.priority, r.automated))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Enhance input validation and error messaging", Priority::High, true),
            ("Implement circuit breaker pattern", Priority::High, true),
            ("Enhance monitoring and alerting", Priority::Medium, false),
        ]
    );
    assert!((0.85..=0.95).contains(&result.confidence));
}

#[tokio::test]
async fn test_disk_cleanup_on_empty_temp_dir_succeeds() {
    let dir = TempDir::new().unwrap();
    let executor = HealingExecutor::from_config(&automation_in(dir.path(), false));
    let rec = HealingRecommendation::new("Disk cleanup and rotation", Priority::High, true, "", "");

    let results = executor.execute(&[rec]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, HealingStatus::Success);
    assert_eq!(results[0].message, "Disk cleanup completed. Cleaned 0 files");
}

#[tokio::test]
async fn test_file_backup_without_source_is_skipped() {
    let dir = TempDir::new().unwrap();
    let executor = HealingExecutor::from_config(&automation_in(dir.path(), false));
    let rec = HealingRecommendation::new("File backup", Priority::Critical, true, "", "");

    let results = executor.execute(&[rec]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, HealingStatus::Skipped);
    assert_eq!(results[0].message, "No data file found to backup");
    assert!(!dir.path().join("data/backups").exists());
}

#[tokio::test]
async fn test_file_backup_copies_existing_data_file() {
    let dir = TempDir::new().unwrap();
    let config = automation_in(dir.path(), false);
    std::fs::create_dir_all(config.data_file.parent().unwrap()).unwrap();
    std::fs::write(&config.data_file, r#"[{"id":1}]"#).unwrap();
    let executor = HealingExecutor::from_config(&config);

    let rec = HealingRecommendation::new("Implement file backup", Priority::Critical, true, "", "");
    let results = executor.execute(&[rec]).await;

    assert_eq!(results[0].status, HealingStatus::Success);
    let backups: Vec<_> = std::fs::read_dir(&config.backup_dir).unwrap().collect();
    assert_eq!(backups.len(), 1);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let dir = TempDir::new().unwrap();
    let config = automation_in(dir.path(), true);
    std::fs::create_dir_all(config.data_file.parent().unwrap()).unwrap();
    std::fs::write(&config.data_file, "[]").unwrap();
    let executor = HealingExecutor::from_config(&config);

    let recs = vec![
        HealingRecommendation::new("Disk cleanup", Priority::High, true, "", ""),
        HealingRecommendation::new("File backup", Priority::High, true, "", ""),
        HealingRecommendation::new("Page the on-call engineer", Priority::Low, false, "", ""),
    ];
    let results = executor.execute(&recs).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.status == HealingStatus::DryRunSuccess));
    assert!(!config.backup_dir.exists());
}

#[tokio::test]
async fn test_unroutable_action_needs_manual_intervention() {
    let dir = TempDir::new().unwrap();
    let executor = HealingExecutor::from_config(&automation_in(dir.path(), false));
    let rec = HealingRecommendation::new("Implement circuit breaker pattern", Priority::High, true, "wrap calls", "");

    let results = executor.execute(&[rec]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, HealingStatus::ManualInterventionRequired);
}

#[tokio::test]
async fn test_disabled_automation_executes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut config = automation_in(dir.path(), false);
    config.enabled = false;
    let executor = HealingExecutor::from_config(&config);
    let rec = HealingRecommendation::new("Disk cleanup", Priority::High, true, "", "");

    assert!(executor.execute(&[rec]).await.is_empty());
    assert_eq!(executor.statistics().total_executions, 0);
    assert!(executor.history(10).is_empty());
}

#[tokio::test]
async fn test_history_is_bounded_and_newest_first() {
    let dir = TempDir::new().unwrap();
    let executor = HealingExecutor::from_config(&automation_in(dir.path(), false));
    for i in 0..4 {
        let rec = HealingRecommendation::new(format!("Enhance monitoring #{}", i), Priority::Medium, true, "", "");
        executor.execute(&[rec]).await;
    }

    let history = executor.history(3);
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert_eq!(history[0].recommendation.action, "Enhance monitoring #3");

    let stats = executor.statistics();
    assert_eq!(stats.total_executions, 4);
    assert_eq!(stats.successful_executions, 4);
    assert_eq!(stats.executions_by_status.len(), HealingStatus::ALL.len());
}

#[tokio::test]
async fn test_cancelled_batch_returns_nothing() {
    let dir = TempDir::new().unwrap();
    let executor = HealingExecutor::from_config(&automation_in(dir.path(), false));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let rec = HealingRecommendation::new("Disk cleanup", Priority::High, true, "", "");
    assert!(executor.execute_with_cancellation(&[rec], &cancel).await.is_empty());
}

fn ollama_config(endpoint: String) -> LLMProviderConfig {
    LLMProviderConfig {
        provider_type: "ollama".to_string(),
        endpoint,
        model: "jamvant:v5.0".to_string(),
        ..LLMProviderConfig::default()
    }
}

#[tokio::test]
async fn test_remote_analysis_parses_chat_reply() {
    let mut server = mockito::Server::new_async().await;
    let reply = serde_json::json!({
        "rootCauseAnalysis": "Disk saturation on the data volume",
        "businessImpact": "HIGH",
        "correlations": ["writes spike at midnight"],
        "healingRecommendations": [
            { "action": "Disk cleanup", "priority": "critical", "automated": true }
        ],
        "confidence": 0.7
    });
    let body = serde_json::json!({
        "model": "jamvant:v5.0",
        "message": {
            "role": "assistant",
            "content": format!("Here is the analysis:\n{}\nLet me know.", reply)
        },
        "done": true
    });
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "jamvant:v5.0",
            "stream": false
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let provider = create_provider(&ollama_config(server.url())).unwrap();
    let orchestrator = AnalysisOrchestrator::new(true, AnalysisMode::Remote, Some(provider));
    let result = orchestrator.analyze(Vec::new(), serde_json::json!({})).await;

    mock.assert_async().await;
    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.source, AnalysisSource::Remote);
    assert_eq!(result.root_cause_analysis, "Disk saturation on the data volume");
    assert_eq!(result.recommendations.len(), 1);
    assert_eq!(result.recommendations[0].priority, Priority::Critical);
    assert!((result.confidence - 0.7).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_mock() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("model crashed")
        .create_async()
        .await;

    let provider = create_provider(&ollama_config(server.url())).unwrap();
    let orchestrator = AnalysisOrchestrator::new(true, AnalysisMode::Remote, Some(provider));
    let result = orchestrator.analyze(Vec::new(), serde_json::json!({})).await;

    assert_eq!(result.status, AnalysisStatus::Completed);
    assert_eq!(result.source, AnalysisSource::MockFallback);
    assert!(result
        .recommendations
        .iter()
        .any(|r| r.action == "Enhance monitoring and alerting"));
}

#[tokio::test]
async fn test_runtime_heal_cycle_records_ledger_entries() {
    let dir = TempDir::new().unwrap();
    let mut config = ServiceConfigManifest::default();
    config.spec.automation = automation_in(dir.path(), true);
    config.spec.detection = DetectionConfig {
        anomaly_threshold: 2,
        ..DetectionConfig::default()
    };
    let runtime = HealingRuntime::from_config(&config);

    for _ in 0..2 {
        runtime
            .patterns
            .record_occurrence(error_types::VALIDATION_ERROR, "name too long", None, None);
    }

    let cycle = runtime.heal_current().await;

    assert_eq!(cycle.analysis.status, AnalysisStatus::Completed);
    // validation enhancement is automated, monitoring is not
    assert_eq!(cycle.executions.len(), 1);
    assert_eq!(cycle.executions[0].status, HealingStatus::DryRunSuccess);
    assert_eq!(runtime.healing.history(10).len(), 1);
}
