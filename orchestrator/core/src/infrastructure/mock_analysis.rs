// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mock Analysis
//!
//! Deterministic stand-in for the language model. The reply is shaped by which
//! insight types are present and is emitted as JSON text so it travels through
//! the same parser as a remote reply.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Offline analysis backend and remote fallback

use rand::Rng;

use crate::domain::analysis::{AnalysisError, AnalysisPayload, Priority, RecommendationPayload};
use crate::domain::insight::{error_types, ErrorInsight};

const PREVENTION_STRATEGIES: [&str; 5] = [
    "Implement comprehensive input validation at API gateway level",
    "Add automated testing for concurrent file operations",
    "Implement proactive disk space monitoring and cleanup",
    "Add load testing to identify performance bottlenecks",
    "Implement database migration strategy for production scalability",
];

const AUTOMATION_OPPORTUNITIES: [&str; 5] = [
    "Automated disk cleanup and log rotation",
    "Self-healing file corruption detection and recovery",
    "Automated scaling based on error rate thresholds",
    "Intelligent retry mechanisms with adaptive backoff",
    "Automated performance optimization based on usage patterns",
];

const MIN_CONFIDENCE: f64 = 0.85;
const MAX_CONFIDENCE: f64 = 0.95;

fn recommendation(
    action: &str,
    priority: Priority,
    automated: bool,
    implementation: &str,
    expected_outcome: &str,
) -> RecommendationPayload {
    RecommendationPayload {
        action: action.to_string(),
        priority,
        automated,
        implementation: implementation.to_string(),
        expected_outcome: expected_outcome.to_string(),
    }
}

pub fn mock_payload(insights: &[ErrorInsight]) -> AnalysisPayload {
    let has = |kind: &str| insights.iter().any(|i| i.error_type == kind);
    let validation = has(error_types::VALIDATION_ERROR);
    let high_rate = has(error_types::HIGH_ERROR_RATE);
    let file = has(error_types::FILE_OPERATION_ERROR);

    let root_cause_analysis = if validation && high_rate {
        "Analysis indicates a cascade failure pattern. High validation error rates suggest \
         either client-side validation bypass or API misuse. The correlation with the overall \
         error rate indicates this is likely affecting user experience significantly. File-based \
         storage constraints may be amplifying the impact during concurrent access."
    } else if file {
        "File operation errors indicate potential infrastructure issues. Given the JSON \
         file-based storage, this could be disk I/O performance, file locking contention or \
         storage capacity constraints. This is critical for data integrity."
    } else {
        "Error patterns suggest normal operational issues that can be addressed through \
         improved error handling and user guidance. The patterns are within expected ranges \
         for a user management system."
    };

    let business_impact = if high_rate {
        "HIGH - Error rates above threshold indicate degraded user experience. Registration and \
         profile management are likely failing, directly impacting core functionality. \
         Immediate attention required."
    } else {
        "MEDIUM - Current error patterns are manageable but require monitoring. User experience \
         may be slightly degraded while core functionality remains operational."
    };

    let mut correlations = Vec::new();
    if validation {
        correlations.push("Validation errors correlate with client-side integration issues".to_string());
    }
    if high_rate {
        correlations.push("High error rate correlates with increased system load".to_string());
    }
    if file {
        correlations.push("File operation errors correlate with concurrent access patterns".to_string());
    }

    let mut healing_recommendations = Vec::new();
    if validation {
        healing_recommendations.push(recommendation(
            "Enhance input validation and error messaging",
            Priority::High,
            true,
            "Add client-side validation, return field-specific API errors, sanitize requests",
            "Reduce validation errors by 70%, improve user experience",
        ));
    }
    if file {
        healing_recommendations.push(recommendation(
            "Implement file operation resilience",
            Priority::Critical,
            true,
            "Retry with exponential backoff, back up files before writes, monitor disk space",
            "Eliminate data loss risk, reduce file operation errors by 90%",
        ));
    }
    if high_rate {
        healing_recommendations.push(recommendation(
            "Implement circuit breaker pattern",
            Priority::High,
            true,
            "Add a circuit breaker around file operations with graceful degradation to cached responses",
            "Prevent cascade failures, maintain availability during incidents",
        ));
    }
    healing_recommendations.push(recommendation(
        "Enhance monitoring and alerting",
        Priority::Medium,
        false,
        "Alert on error rate thresholds, add health check endpoints, add performance monitoring",
        "Faster issue detection and resolution, improved observability",
    ));

    let confidence = rand::rng().random_range(MIN_CONFIDENCE..=MAX_CONFIDENCE);

    AnalysisPayload {
        root_cause_analysis: root_cause_analysis.to_string(),
        business_impact: business_impact.to_string(),
        correlations,
        healing_recommendations,
        prevention_strategies: PREVENTION_STRATEGIES.iter().map(|s| s.to_string()).collect(),
        automation_opportunities: AUTOMATION_OPPORTUNITIES.iter().map(|s| s.to_string()).collect(),
        confidence: (confidence * 100.0).round() / 100.0,
    }
}

/// Mock reply as JSON text
pub fn mock_response(insights: &[ErrorInsight]) -> Result<String, AnalysisError> {
    serde_json::to_string_pretty(&mock_payload(insights))
        .map_err(|e| AnalysisError::Malformed(e.to_string()))
}
