// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Insight
//!
//! Provides insight functionality for the system.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements insight

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Error types the host application reports
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const FILE_OPERATION_ERROR: &str = "FILE_OPERATION_ERROR";
    pub const USER_NOT_FOUND: &str = "USER_NOT_FOUND";
    pub const DUPLICATE_EMAIL: &str = "DUPLICATE_EMAIL";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

    /// Synthetic insight type raised by the global rate check
    pub const HIGH_ERROR_RATE: &str = "HIGH_ERROR_RATE";

    /// Label for reported types outside the catalogue
    pub const OTHER: &str = "OTHER";

    /// Fixed-cardinality label for metrics; reported types are client input
    pub fn metric_label(error_type: &str) -> &'static str {
        match error_type {
            VALIDATION_ERROR => VALIDATION_ERROR,
            FILE_OPERATION_ERROR => FILE_OPERATION_ERROR,
            USER_NOT_FOUND => USER_NOT_FOUND,
            DUPLICATE_EMAIL => DUPLICATE_EMAIL,
            INTERNAL_ERROR => INTERNAL_ERROR,
            HIGH_ERROR_RATE => HIGH_ERROR_RATE,
            _ => OTHER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// Human-readable summary of an anomalous pattern or a global rate condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInsight {
    pub error_type: String,
    pub severity: Severity,
    pub message: String,
    pub occurrence_count: usize,
    pub recommendation: String,
}

impl ErrorInsight {
    /// Hand-built insight for exercising the analysis path without live traffic
    pub fn synthetic(error_type: &str, message: &str, severity: Severity) -> Self {
        Self {
            error_type: error_type.to_string(),
            severity,
            message: message.to_string(),
            occurrence_count: 5,
            recommendation: format!("Test recommendation for {}", error_type),
        }
    }
}

/// Aggregate view of the pattern store for dashboards
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorStatistics {
    pub total_patterns: usize,
    pub anomalous_patterns: usize,
    /// Errors per type inside the trailing window
    pub errors_by_type: BTreeMap<String, usize>,
}

impl ErrorStatistics {
    pub fn recent_total(&self) -> usize {
        self.errors_by_type.values().sum()
    }
}
