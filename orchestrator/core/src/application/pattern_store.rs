// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pattern Store
//!
//! Concurrent store of [`ErrorPattern`]s keyed by [`PatternKey`]. Recording an
//! occurrence updates the owning pattern under its map shard lock, so two
//! writers on the same key never interleave, while writers on different keys
//! proceed in parallel. Readers get snapshots.
//!
//! The store is additive: patterns are never removed. The per-type recent
//! error window used by the global rate check is bounded separately (see
//! [`RecentErrorWindow`]).
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Occurrence ingestion and anomaly bookkeeping

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use crate::domain::config::DetectionConfig;
use crate::domain::insight::{error_types, ErrorStatistics};
use crate::domain::pattern::{AnomalyPolicy, ErrorOccurrence, ErrorPattern, PatternKey, PatternSummary};
use crate::infrastructure::recent_errors::RecentErrorWindow;

/// What happened to the pattern an occurrence landed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    pub key: PatternKey,
    pub became_anomalous: bool,
}

pub struct PatternStore {
    policy: AnomalyPolicy,
    patterns: DashMap<PatternKey, ErrorPattern>,
    recent: RecentErrorWindow,
}

impl PatternStore {
    pub fn new(policy: AnomalyPolicy, max_tracked_error_types: usize) -> Self {
        Self {
            policy,
            patterns: DashMap::new(),
            recent: RecentErrorWindow::new(policy.window, max_tracked_error_types),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        let policy = AnomalyPolicy {
            threshold: config.anomaly_threshold,
            window: Duration::minutes(config.window_minutes as i64),
        };
        Self::new(policy, config.max_tracked_error_types)
    }

    pub fn policy(&self) -> &AnomalyPolicy {
        &self.policy
    }

    pub fn record_occurrence(
        &self,
        error_type: &str,
        message: &str,
        stack_trace: Option<String>,
        correlation_id: Option<String>,
    ) -> RecordOutcome {
        self.record_occurrence_at(error_type, message, stack_trace, correlation_id, Utc::now())
    }

    /// Record with an explicit timestamp; the anomaly window is evaluated
    /// relative to `timestamp` rather than the wall clock.
    pub fn record_occurrence_at(
        &self,
        error_type: &str,
        message: &str,
        stack_trace: Option<String>,
        correlation_id: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> RecordOutcome {
        let key = PatternKey::derive(error_type, message);
        let occurrence = ErrorOccurrence::new(
            error_type,
            message,
            stack_trace,
            correlation_id.clone(),
            timestamp,
        );

        let became_anomalous = {
            let mut pattern = self
                .patterns
                .entry(key.clone())
                .or_insert_with(|| ErrorPattern::new(key.clone(), error_type, message));
            let flipped = pattern.record(occurrence, &self.policy);
            if flipped {
                warn!(
                    error_type,
                    pattern = %key,
                    occurrences = pattern.recent_count(timestamp, self.policy.window),
                    window_minutes = self.policy.window.num_minutes(),
                    "Anomalous error pattern detected"
                );
            }
            flipped
        };

        self.recent.record(error_type, timestamp);

        metrics::counter!(
            "selfheal_errors_recorded_total",
            "type" => error_types::metric_label(error_type)
        )
            .increment(1);
        if became_anomalous {
            metrics::counter!("selfheal_anomalies_detected_total").increment(1);
        }

        info!(
            error_type,
            pattern = %key,
            correlation_id = correlation_id.as_deref().unwrap_or("-"),
            "Error recorded for pattern analysis"
        );

        RecordOutcome {
            key,
            became_anomalous,
        }
    }

    pub fn statistics(&self) -> ErrorStatistics {
        self.statistics_at(Utc::now())
    }

    pub fn statistics_at(&self, now: DateTime<Utc>) -> ErrorStatistics {
        let (total_patterns, anomalous_patterns) = self
            .patterns
            .iter()
            .fold((0, 0), |(total, anomalous), p| {
                (total + 1, anomalous + usize::from(p.is_anomalous()))
            });

        ErrorStatistics {
            total_patterns,
            anomalous_patterns,
            errors_by_type: self.recent.counts(now),
        }
    }

    pub fn summaries(&self) -> Vec<PatternSummary> {
        self.patterns.iter().map(|p| p.summary()).collect()
    }

    pub fn anomalous_summaries(&self) -> Vec<PatternSummary> {
        self.patterns
            .iter()
            .filter(|p| p.is_anomalous())
            .map(|p| p.summary())
            .collect()
    }

    pub fn get(&self, key: &PatternKey) -> Option<ErrorPattern> {
        self.patterns.get(key).map(|p| p.value().clone())
    }

    pub fn recent_total(&self) -> usize {
        self.recent.total(Utc::now())
    }

    pub fn recent_total_at(&self, now: DateTime<Utc>) -> usize {
        self.recent.total(now)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn store() -> PatternStore {
        PatternStore::from_config(&DetectionConfig::default())
    }

    #[test]
    fn test_same_type_and_message_share_a_pattern() {
        let store = store();
        let a = store.record_occurrence("USER_NOT_FOUND", "no such user", None, None);
        let b = store.record_occurrence("USER_NOT_FOUND", "no such user", None, Some("c-1".into()));
        assert_eq!(a.key, b.key);
        assert_eq!(store.pattern_count(), 1);
        assert_eq!(store.get(&a.key).unwrap().occurrence_count(), 2);
    }

    #[test]
    fn test_flip_reported_once() {
        let store = store();
        let start = Utc::now();
        let flips: Vec<bool> = (0..7)
            .map(|i| {
                store
                    .record_occurrence_at("FILE_OPERATION_ERROR", "disk full", None, None, start + Duration::seconds(i))
                    .became_anomalous
            })
            .collect();
        assert_eq!(flips, vec![false, false, false, false, true, false, false]);

        let stats = store.statistics_at(start + Duration::seconds(7));
        assert_eq!(stats.total_patterns, 1);
        assert_eq!(stats.anomalous_patterns, 1);
        assert_eq!(stats.errors_by_type.get("FILE_OPERATION_ERROR"), Some(&7));
    }

    #[test]
    fn test_out_of_order_writers_still_flip() {
        let store = store();
        let start = Utc::now();
        let mut flips = Vec::new();
        for offset in [0, 0, 0, 2, 1] {
            flips.push(
                store
                    .record_occurrence_at("FILE_OPERATION_ERROR", "disk full", None, None, start + Duration::seconds(offset))
                    .became_anomalous,
            );
        }
        assert_eq!(flips, vec![false, false, false, false, true]);
        assert_eq!(store.anomalous_summaries().len(), 1);
    }

    #[test]
    fn test_replayed_old_occurrences_do_not_flag() {
        let store = store();
        let long_ago = Utc::now() - Duration::hours(1);
        for i in 0..5 {
            store.record_occurrence_at(
                "VALIDATION_ERROR",
                "bad email",
                None,
                None,
                long_ago - Duration::minutes(11 * i),
            );
        }
        assert!(store.anomalous_summaries().is_empty());
        assert_eq!(store.recent_total(), 0);
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        let store = Arc::new(store());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.record_occurrence("INTERNAL_ERROR", &format!("boom {}", t % 2), None, None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let total: usize = store.summaries().iter().map(|s| s.occurrence_count).sum();
        assert_eq!(total, 400);
        assert_eq!(store.pattern_count(), 2);
        assert_eq!(store.anomalous_summaries().len(), 2);
    }
}
