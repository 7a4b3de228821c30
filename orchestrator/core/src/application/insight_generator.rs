// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Insight Generator
//!
//! Provides insight generation functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements ranking of anomalous patterns into insights

use crate::domain::insight::{error_types, ErrorInsight, Severity};
use crate::domain::pattern::PatternSummary;

pub struct InsightGenerator {
    threshold: usize,
}

impl InsightGenerator {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// One insight per anomalous pattern, plus a `HIGH_ERROR_RATE` insight when
    /// `recent_total` exceeds twice the threshold. Ranked by severity, then
    /// occurrence count, both descending.
    pub fn analyze(&self, patterns: &[PatternSummary], recent_total: usize) -> Vec<ErrorInsight> {
        let mut insights: Vec<ErrorInsight> = patterns
            .iter()
            .filter(|p| p.anomalous)
            .map(|p| ErrorInsight {
                error_type: p.error_type.clone(),
                severity: self.severity_for(p.occurrence_count),
                message: format!("Repeated error pattern detected: {}", p.message),
                occurrence_count: p.occurrence_count,
                recommendation: recommendation_for(&p.error_type).to_string(),
            })
            .collect();

        if recent_total > self.threshold * 2 {
            insights.push(ErrorInsight {
                error_type: error_types::HIGH_ERROR_RATE.to_string(),
                severity: Severity::High,
                message: format!("High error rate detected: {} errors recently", recent_total),
                occurrence_count: recent_total,
                recommendation:
                    "Investigate system health and consider scaling or restarting services"
                        .to_string(),
            });
        }

        insights.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(b.occurrence_count.cmp(&a.occurrence_count))
        });
        insights
    }

    fn severity_for(&self, occurrences: usize) -> Severity {
        let t = self.threshold;
        if occurrences >= t * 3 {
            Severity::Critical
        } else if occurrences >= t * 2 {
            Severity::High
        } else if occurrences >= t {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

fn recommendation_for(error_type: &str) -> &'static str {
    match error_type {
        error_types::VALIDATION_ERROR => "Review input validation rules and client-side validation",
        error_types::FILE_OPERATION_ERROR => "Check file system permissions and disk space",
        error_types::USER_NOT_FOUND => "Verify data integrity and implement proper error handling",
        error_types::DUPLICATE_EMAIL => "Implement better duplicate checking and user feedback",
        _ => "Investigate root cause and implement appropriate error handling",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pattern::PatternKey;
    use chrono::Utc;

    fn summary(error_type: &str, message: &str, count: usize, anomalous: bool) -> PatternSummary {
        PatternSummary {
            key: PatternKey::derive(error_type, message),
            error_type: error_type.to_string(),
            message: message.to_string(),
            occurrence_count: count,
            anomalous,
            first_seen: Utc::now(),
            last_seen: Some(Utc::now()),
        }
    }

    #[test]
    fn test_non_anomalous_patterns_are_ignored() {
        let generator = InsightGenerator::new(5);
        let insights = generator.analyze(&[summary("USER_NOT_FOUND", "x", 40, false)], 0);
        assert!(insights.is_empty());
    }

    #[test]
    fn test_severity_tiers() {
        let generator = InsightGenerator::new(5);
        assert_eq!(generator.severity_for(4), Severity::Low);
        assert_eq!(generator.severity_for(5), Severity::Medium);
        assert_eq!(generator.severity_for(10), Severity::High);
        assert_eq!(generator.severity_for(15), Severity::Critical);
    }

    #[test]
    fn test_single_file_error_pattern() {
        let generator = InsightGenerator::new(5);
        let insights = generator.analyze(&[summary("FILE_OPERATION_ERROR", "disk full", 5, true)], 5);
        assert_eq!(insights.len(), 1);
        let insight = &insights[0];
        assert_eq!(insight.severity, Severity::Medium);
        assert_eq!(insight.occurrence_count, 5);
        assert_eq!(insight.message, "Repeated error pattern detected: disk full");
        assert_eq!(insight.recommendation, "Check file system permissions and disk space");
    }

    #[test]
    fn test_high_error_rate_needs_more_than_twice_threshold() {
        let generator = InsightGenerator::new(5);
        assert!(generator.analyze(&[], 10).is_empty());

        let insights = generator.analyze(&[], 11);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].error_type, "HIGH_ERROR_RATE");
        assert_eq!(insights[0].severity, Severity::High);
        assert_eq!(insights[0].message, "High error rate detected: 11 errors recently");
        assert_eq!(insights[0].occurrence_count, 11);
    }

    #[test]
    fn test_ranking() {
        let generator = InsightGenerator::new(5);
        let insights = generator.analyze(
            &[
                summary("VALIDATION_ERROR", "a", 6, true),
                summary("DUPLICATE_EMAIL", "b", 16, true),
                summary("USER_NOT_FOUND", "c", 9, true),
            ],
            31,
        );
        let order: Vec<(&str, Severity)> = insights
            .iter()
            .map(|i| (i.error_type.as_str(), i.severity))
            .collect();
        assert_eq!(
            order,
            vec![
                ("DUPLICATE_EMAIL", Severity::Critical),
                ("HIGH_ERROR_RATE", Severity::High),
                ("USER_NOT_FOUND", Severity::Medium),
                ("VALIDATION_ERROR", Severity::Medium),
            ]
        );
    }
}
