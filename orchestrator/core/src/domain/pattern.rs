// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error Patterns
//!
//! An [`ErrorPattern`] aggregates every [`ErrorOccurrence`] that shares the same
//! error type and message. Patterns are append-only: occurrences are never
//! removed, and once a pattern has been flagged anomalous it stays anomalous for
//! the lifetime of the process.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pattern identity, occurrence log and anomaly rule

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Number of hex characters of the message digest kept in a [`PatternKey`]
const MESSAGE_DIGEST_LEN: usize = 16;

/// Deterministic identity of a pattern: `<error_type>:<digest(message)>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey(String);

impl PatternKey {
    pub fn derive(error_type: &str, message: &str) -> Self {
        let digest = hex::encode(Sha256::digest(message.as_bytes()));
        Self(format!("{}:{}", error_type, &digest[..MESSAGE_DIGEST_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatternKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single reported error. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOccurrence {
    pub error_type: String,
    pub message: String,
    pub stack_trace: Option<String>,
    pub correlation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorOccurrence {
    pub fn new(
        error_type: impl Into<String>,
        message: impl Into<String>,
        stack_trace: Option<String>,
        correlation_id: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            stack_trace,
            correlation_id,
            timestamp,
        }
    }
}

/// Recurrence rule deciding when a pattern becomes anomalous
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyPolicy {
    /// Occurrences inside the window needed to flag the pattern
    pub threshold: usize,

    /// Trailing window the occurrences are counted in
    pub window: Duration,
}

impl Default for AnomalyPolicy {
    fn default() -> Self {
        Self {
            threshold: 5,
            window: Duration::minutes(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub key: PatternKey,
    pub error_type: String,
    pub message: String,
    pub first_seen: DateTime<Utc>,
    occurrences: Vec<ErrorOccurrence>,
    anomalous: bool,
}

impl ErrorPattern {
    pub fn new(key: PatternKey, error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key,
            error_type: error_type.into(),
            message: message.into(),
            first_seen: Utc::now(),
            occurrences: Vec::new(),
            anomalous: false,
        }
    }

    /// Append an occurrence and re-evaluate the anomaly rule against the
    /// latest timestamp in the pattern. Occurrences may arrive out of order.
    ///
    /// Returns `true` only for the call that flips the pattern to anomalous.
    pub fn record(&mut self, occurrence: ErrorOccurrence, policy: &AnomalyPolicy) -> bool {
        let at = occurrence.timestamp;
        if self.occurrences.is_empty() || at < self.first_seen {
            self.first_seen = at;
        }
        self.occurrences.push(occurrence);

        if self.anomalous {
            return false;
        }

        let latest = self.latest_timestamp().unwrap_or(at);
        if self.recent_count(latest, policy.window) >= policy.threshold {
            self.anomalous = true;
            return true;
        }
        false
    }

    /// Occurrences stamped after `now - window`
    pub fn recent_count(&self, now: DateTime<Utc>, window: Duration) -> usize {
        let cutoff = now - window;
        self.occurrences
            .iter()
            .filter(|o| o.timestamp > cutoff)
            .count()
    }

    fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.occurrences.iter().map(|o| o.timestamp).max()
    }

    pub fn occurrences(&self) -> &[ErrorOccurrence] {
        &self.occurrences
    }

    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_anomalous(&self) -> bool {
        self.anomalous
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.latest_timestamp()
    }

    pub fn summary(&self) -> PatternSummary {
        PatternSummary {
            key: self.key.clone(),
            error_type: self.error_type.clone(),
            message: self.message.clone(),
            occurrence_count: self.occurrences.len(),
            anomalous: self.anomalous,
            first_seen: self.first_seen,
            last_seen: self.last_seen(),
        }
    }
}

/// Point-in-time view of a pattern without its occurrence log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub key: PatternKey,
    pub error_type: String,
    pub message: String,
    pub occurrence_count: usize,
    pub anomalous: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
}
