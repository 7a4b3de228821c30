// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Recent Errors
//!
//! Per-type sliding window of error timestamps used for the global error-rate
//! check. Each queue is pruned to the trailing window on every write and read,
//! and the number of tracked types is capped: when a new type would exceed the
//! cap, the type whose latest occurrence is oldest is evicted.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Bounded recent-error window

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::{BTreeMap, VecDeque};

pub struct RecentErrorWindow {
    window: Duration,
    max_types: usize,
    entries: DashMap<String, VecDeque<DateTime<Utc>>>,
}

impl RecentErrorWindow {
    pub fn new(window: Duration, max_types: usize) -> Self {
        Self {
            window,
            max_types: max_types.max(1),
            entries: DashMap::new(),
        }
    }

    pub fn record(&self, error_type: &str, at: DateTime<Utc>) {
        let cutoff = at - self.window;
        {
            let mut queue = self.entries.entry(error_type.to_string()).or_default();
            queue.push_back(at);
            queue.retain(|t| *t > cutoff);
        }

        if self.entries.len() > self.max_types {
            self.evict_stalest(error_type);
        }
    }

    fn evict_stalest(&self, keep: &str) {
        let victim = self
            .entries
            .iter()
            .filter(|entry| entry.key() != keep)
            .map(|entry| (entry.key().clone(), entry.value().iter().max().copied()))
            .min_by_key(|(_, latest)| *latest)
            .map(|(key, _)| key);

        if let Some(key) = victim {
            tracing::debug!(error_type = %key, "Evicting stalest error type from recent window");
            self.entries.remove(&key);
        }
    }

    /// Per-type counts inside the window ending at `now`. Types with no
    /// remaining timestamps are dropped.
    pub fn counts(&self, now: DateTime<Utc>) -> BTreeMap<String, usize> {
        let cutoff = now - self.window;
        self.entries.retain(|_, queue| {
            queue.retain(|t| *t > cutoff);
            !queue.is_empty()
        });

        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().len()))
            .collect()
    }

    pub fn total(&self, now: DateTime<Utc>) -> usize {
        self.counts(now).values().sum()
    }

    pub fn tracked_types(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_only_inside_window() {
        let window = RecentErrorWindow::new(Duration::minutes(10), 100);
        let now = Utc::now();
        window.record("VALIDATION_ERROR", now - Duration::minutes(30));
        window.record("VALIDATION_ERROR", now - Duration::minutes(1));
        window.record("USER_NOT_FOUND", now);

        let counts = window.counts(now);
        assert_eq!(counts.get("VALIDATION_ERROR"), Some(&1));
        assert_eq!(counts.get("USER_NOT_FOUND"), Some(&1));
        assert_eq!(window.total(now), 2);
    }

    #[test]
    fn test_drained_types_are_dropped_on_read() {
        let window = RecentErrorWindow::new(Duration::minutes(10), 100);
        let now = Utc::now();
        window.record("INTERNAL_ERROR", now);

        let later = now + Duration::minutes(11);
        assert!(window.counts(later).is_empty());
        assert_eq!(window.tracked_types(), 0);
    }

    #[test]
    fn test_type_cap_evicts_stalest() {
        let window = RecentErrorWindow::new(Duration::minutes(10), 2);
        let now = Utc::now();
        window.record("A", now - Duration::minutes(5));
        window.record("B", now - Duration::minutes(1));
        window.record("C", now);

        assert_eq!(window.tracked_types(), 2);
        let counts = window.counts(now);
        assert!(!counts.contains_key("A"));
        assert!(counts.contains_key("B"));
        assert!(counts.contains_key("C"));
    }
}
