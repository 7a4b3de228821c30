// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Healing Actions
//!
//! Live handlers behind each [`HealingActionKind`]. Disk cleanup and file
//! backup touch the filesystem; the enhancement handlers only report. All
//! handlers are blocking and are expected to run on the blocking pool.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Filesystem-backed healing handlers
//!
//! [`HealingActionKind`]: crate::domain::analysis::HealingActionKind

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::domain::analysis::HealingRecommendation;
use crate::domain::config::AutomationConfig;
use crate::domain::healing::{HandlerOutcome, HealingError, HealingStatus};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Paths and limits used by the live handlers
#[derive(Debug, Clone)]
pub struct HealingActions {
    pub temp_dir: PathBuf,
    pub log_file: PathBuf,
    pub data_file: PathBuf,
    pub backup_dir: PathBuf,
    pub max_file_age: Duration,
    pub max_files_per_run: usize,
    pub log_rotation_threshold_bytes: u64,
}

impl HealingActions {
    pub fn from_config(config: &AutomationConfig) -> Self {
        Self {
            temp_dir: config.effective_temp_dir(),
            log_file: config.log_file.clone(),
            data_file: config.data_file.clone(),
            backup_dir: config.backup_dir.clone(),
            max_file_age: Duration::from_secs(config.cleanup_max_age_days * SECONDS_PER_DAY),
            max_files_per_run: config.cleanup_max_files,
            log_rotation_threshold_bytes: config.log_rotation_threshold_bytes,
        }
    }

    /// Delete stale temp files and rotate the application log when oversized
    pub fn disk_cleanup(&self) -> Result<HandlerOutcome, HealingError> {
        info!(temp_dir = ?self.temp_dir, "Executing disk cleanup");
        let mut cleaned = self.remove_stale_files();

        if self.rotate_log_if_oversized()? {
            cleaned.push("Rotated log file".to_string());
        }

        Ok(HandlerOutcome::new(
            HealingStatus::Success,
            format!("Disk cleanup completed. Cleaned {} files", cleaned.len()),
        )
        .with_details(format!("Cleaned files: {}", cleaned.join(", "))))
    }

    fn remove_stale_files(&self) -> Vec<String> {
        if !self.temp_dir.exists() {
            return Vec::new();
        }

        let cutoff = SystemTime::now()
            .checked_sub(self.max_file_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        WalkDir::new(&self.temp_dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .is_some_and(|modified| modified < cutoff)
            })
            .take(self.max_files_per_run)
            .filter_map(|entry| match std::fs::remove_file(entry.path()) {
                Ok(()) => Some(entry.file_name().to_string_lossy().into_owned()),
                Err(e) => {
                    warn!("Could not delete temp file {:?}: {}", entry.path(), e);
                    None
                }
            })
            .collect()
    }

    fn rotate_log_if_oversized(&self) -> Result<bool, HealingError> {
        let size = match std::fs::metadata(&self.log_file) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(false),
        };
        if size <= self.log_rotation_threshold_bytes {
            return Ok(false);
        }

        let rotated = with_suffix(&self.log_file, &file_timestamp());
        std::fs::rename(&self.log_file, &rotated)
            .map_err(|e| HealingError::io(format!("rotating {:?}", self.log_file), e))?;
        info!(from = ?self.log_file, to = ?rotated, "Rotated log file");
        Ok(true)
    }

    /// Copy the data file into the backup directory
    pub fn file_backup(&self) -> Result<HandlerOutcome, HealingError> {
        info!(source = ?self.data_file, "Executing file backup");
        if !self.data_file.is_file() {
            return Ok(HandlerOutcome::new(
                HealingStatus::Skipped,
                "No data file found to backup",
            ));
        }

        std::fs::create_dir_all(&self.backup_dir)
            .map_err(|e| HealingError::io(format!("creating {:?}", self.backup_dir), e))?;

        let stem = self
            .data_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        let backup_name = format!("{}-backup-{}.json", stem, file_timestamp());
        let backup_path = self.backup_dir.join(&backup_name);

        std::fs::copy(&self.data_file, &backup_path)
            .map_err(|e| HealingError::io(format!("copying to {:?}", backup_path), e))?;

        Ok(
            HandlerOutcome::new(HealingStatus::Success, "File backup completed successfully")
                .with_details(format!("Backup created: {}", backup_name)),
        )
    }

    pub fn validation_enhancement(&self) -> HandlerOutcome {
        info!("Executing validation enhancement");
        HandlerOutcome::new(HealingStatus::Success, "Validation enhancement applied")
            .with_details("Enhanced input validation rules and error messaging")
    }

    pub fn monitoring_enhancement(&self) -> HandlerOutcome {
        info!("Executing monitoring enhancement");
        HandlerOutcome::new(HealingStatus::Success, "Monitoring enhancement applied")
            .with_details("Enhanced error thresholds and alerting rules")
    }

    pub fn generic(&self, recommendation: &HealingRecommendation) -> HandlerOutcome {
        info!(action = %recommendation.action, "No automated handler, manual intervention required");
        HandlerOutcome::new(
            HealingStatus::ManualInterventionRequired,
            "Action requires manual implementation",
        )
        .with_details(format!("Implementation: {}", recommendation.implementation))
    }
}

/// Filesystem-safe timestamp (no colons)
fn file_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
