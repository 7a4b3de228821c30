// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service Context
//!
//! Static knowledge about the monitored service that is prepended to every
//! analysis prompt, plus short per-error-type guidance notes.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Prompt context documents

use crate::domain::insight::error_types;

pub const SERVICE_CONTEXT: &str = r#"# Self-Healing User Management Service - Context

## System Overview
You are analysing a user management HTTP service that is watched by a
self-healing pipeline. Errors are grouped into patterns, anomalous patterns are
summarised as insights, and your recommendations may be executed automatically.

## Business Domain
- Primary function: create, read, update and delete user profiles
- Data model: name (2-100 chars), age (1-150), email (unique identifier)
- Storage: a single JSON file (data/users.json) with file locking

## Error Catalogue
- VALIDATION_ERROR: invalid input (empty name, malformed email, age out of range)
- USER_NOT_FOUND: lookup of an email that does not exist
- DUPLICATE_EMAIL: create request for an email that already exists
- FILE_OPERATION_ERROR: JSON store read or write failure
- INTERNAL_ERROR: unexpected failure inside the service

## Constraints
- Single instance, no external database
- Target response time under 200ms with about 10 concurrent users
- Designed for up to 1000 users
- Structured logs with correlation ids

## Healing Priorities
1. Data integrity
2. Service availability
3. User experience
4. Performance
5. Observability

## Guidelines
Weigh business impact, prefer actions that can be automated safely, account for
the limits of file-based storage and give specific, actionable steps."#;

/// Extra guidance for a known error type
pub fn error_guidance(error_type: &str) -> Option<&'static str> {
    match error_type {
        error_types::VALIDATION_ERROR => Some(
            "Client-side issues or API misuse. Look at input sanitisation, client validation and error messages.",
        ),
        error_types::USER_NOT_FOUND => Some(
            "Possible data consistency problems or user mistakes. Look at data integrity and soft deletes.",
        ),
        error_types::DUPLICATE_EMAIL => Some(
            "Race conditions or poor feedback on uniqueness. Look at concurrency control and duplicate detection.",
        ),
        error_types::FILE_OPERATION_ERROR => Some(
            "Critical, can lose data. Look at disk space, permissions, backups and retries.",
        ),
        error_types::INTERNAL_ERROR => Some(
            "Infrastructure or code instability. Look at resource monitoring and graceful degradation.",
        ),
        error_types::HIGH_ERROR_RATE => Some(
            "Service-wide degradation. Look at load, cascading failures and circuit breakers.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types_have_guidance() {
        assert!(error_guidance("FILE_OPERATION_ERROR").is_some());
        assert!(error_guidance("HIGH_ERROR_RATE").is_some());
        assert!(error_guidance("SOMETHING_ELSE").is_none());
    }
}
