// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for a selfheal service instance:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Pattern detection thresholds and window
// - Analysis mode (mock or remote) and LLM provider settings
// - Automated healing switches, handler paths and ledger capacity
// - Network and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "selfheal.io/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level Kubernetes-style service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "selfheal.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: ServiceConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Content under spec:
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Occurrences inside the window that flag a pattern anomalous
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: usize,

    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Upper bound on error types tracked by the recent-error window
    #[serde(default = "default_max_tracked_error_types")]
    pub max_tracked_error_types: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: default_anomaly_threshold(),
            window_minutes: default_window_minutes(),
            max_tracked_error_types: default_max_tracked_error_types(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Mock,
    Remote,
}

impl std::str::FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(AnalysisMode::Mock),
            "remote" => Ok(AnalysisMode::Remote),
            other => Err(format!("unknown analysis mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: AnalysisMode,

    #[serde(default)]
    pub llm: LLMProviderConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: AnalysisMode::Mock,
            llm: LLMProviderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Provider type ("ollama" or "openai")
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Base URL of the provider API
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for LLMProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl LLMProviderConfig {
    /// Resolve `env:VAR_NAME` indirection in `api_key`
    pub fn resolved_api_key(&self) -> Option<String> {
        let key = self.api_key.as_ref()?;
        match key.strip_prefix("env:") {
            Some(var) => std::env::var(var).ok(),
            None => Some(key.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_dry_run_min_delay")]
    pub dry_run_min_delay_ms: u64,

    #[serde(default = "default_dry_run_max_delay")]
    pub dry_run_max_delay_ms: u64,

    /// Directory swept by disk cleanup (defaults to the OS temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_cleanup_max_age_days")]
    pub cleanup_max_age_days: u64,

    #[serde(default = "default_cleanup_max_files")]
    pub cleanup_max_files: usize,

    #[serde(default = "default_log_rotation_bytes")]
    pub log_rotation_threshold_bytes: u64,

    /// Ledger entries kept in memory before the oldest are evicted
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dry_run: false,
            dry_run_min_delay_ms: default_dry_run_min_delay(),
            dry_run_max_delay_ms: default_dry_run_max_delay(),
            temp_dir: None,
            log_file: default_log_file(),
            data_file: default_data_file(),
            backup_dir: default_backup_dir(),
            cleanup_max_age_days: default_cleanup_max_age_days(),
            cleanup_max_files: default_cleanup_max_files(),
            log_rotation_threshold_bytes: default_log_rotation_bytes(),
            ledger_capacity: default_ledger_capacity(),
        }
    }
}

impl AutomationConfig {
    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_anomaly_threshold() -> usize {
    5
}

fn default_window_minutes() -> u64 {
    10
}

fn default_max_tracked_error_types() -> usize {
    100
}

fn default_provider_type() -> String {
    "ollama".to_string()
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "jamvant:v5.0".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_dry_run_min_delay() -> u64 {
    100
}

fn default_dry_run_max_delay() -> u64 {
    600
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/self-healing-app.log")
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/users.json")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("data/backups")
}

fn default_cleanup_max_age_days() -> u64 {
    7
}

fn default_cleanup_max_files() -> usize {
    10
}

fn default_log_rotation_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_ledger_capacity() -> usize {
    1000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "selfheal".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: ServiceConfigSpec::default(),
        }
    }
}

impl ServiceConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SELFHEAL_CONFIG_PATH environment variable
    /// 2. ./selfheal-config.yaml (working directory)
    /// 3. ~/.selfheal/config.yaml (user home)
    /// 4. /etc/selfheal/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SELFHEAL_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./selfheal-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".selfheal").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/selfheal/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Some(enabled) = env_flag("SELFHEAL_AI_ENABLED") {
            self.spec.analysis.enabled = enabled;
        }

        if let Ok(val) = std::env::var("SELFHEAL_AI_MODE") {
            match val.parse::<AnalysisMode>() {
                Ok(mode) => {
                    tracing::info!("Environment override: SELFHEAL_AI_MODE={}", val);
                    self.spec.analysis.mode = mode;
                }
                Err(e) => tracing::warn!("Invalid value for SELFHEAL_AI_MODE: {}. Ignoring.", e),
            }
        }

        if let Some(enabled) = env_flag("SELFHEAL_AUTOMATION_ENABLED") {
            self.spec.automation.enabled = enabled;
        }

        if let Some(dry_run) = env_flag("SELFHEAL_DRY_RUN") {
            self.spec.automation.dry_run = dry_run;
        }

        if let Ok(endpoint) = std::env::var("SELFHEAL_LLM_ENDPOINT") {
            tracing::info!("Environment override: SELFHEAL_LLM_ENDPOINT={}", endpoint);
            self.spec.analysis.llm.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("SELFHEAL_LLM_MODEL") {
            tracing::info!("Environment override: SELFHEAL_LLM_MODEL={}", model);
            self.spec.analysis.llm.model = model;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let detection = &self.spec.detection;
        if detection.anomaly_threshold == 0 {
            anyhow::bail!("spec.detection.anomaly_threshold must be at least 1");
        }
        if detection.window_minutes == 0 {
            anyhow::bail!("spec.detection.window_minutes must be at least 1");
        }
        if detection.max_tracked_error_types == 0 {
            anyhow::bail!("spec.detection.max_tracked_error_types must be at least 1");
        }

        let llm = &self.spec.analysis.llm;
        if self.spec.analysis.mode == AnalysisMode::Remote {
            if !matches!(llm.provider_type.as_str(), "ollama" | "openai") {
                anyhow::bail!(
                    "Unsupported LLM provider type: '{}'. Expected 'ollama' or 'openai'",
                    llm.provider_type
                );
            }
            if llm.endpoint.is_empty() {
                anyhow::bail!("spec.analysis.llm.endpoint cannot be empty in remote mode");
            }
            if llm.model.is_empty() {
                anyhow::bail!("spec.analysis.llm.model cannot be empty in remote mode");
            }
        }
        if llm.request_timeout_seconds == 0 || llm.connect_timeout_seconds == 0 {
            anyhow::bail!("LLM timeouts must be at least 1 second");
        }

        let automation = &self.spec.automation;
        if automation.dry_run_min_delay_ms > automation.dry_run_max_delay_ms {
            anyhow::bail!(
                "spec.automation.dry_run_min_delay_ms ({}) exceeds dry_run_max_delay_ms ({})",
                automation.dry_run_min_delay_ms,
                automation.dry_run_max_delay_ms
            );
        }
        if automation.ledger_capacity == 0 {
            anyhow::bail!("spec.automation.ledger_capacity must be at least 1");
        }

        if !matches!(
            self.spec.observability.logging.format.as_str(),
            "text" | "json"
        ) {
            anyhow::bail!(
                "Invalid log format: '{}'. Expected 'text' or 'json'",
                self.spec.observability.logging.format
            );
        }

        Ok(())
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => {
            tracing::info!("Environment override: {}=true", name);
            Some(true)
        }
        "false" | "0" | "no" | "off" => {
            tracing::info!("Environment override: {}=false", name);
            Some(false)
        }
        _ => {
            tracing::warn!(
                "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                name,
                val
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = ServiceConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.detection.anomaly_threshold, 5);
        assert_eq!(manifest.spec.analysis.mode, AnalysisMode::Mock);
        assert_eq!(manifest.spec.automation.ledger_capacity, 1000);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: selfheal.io/v1
kind: ServiceConfig
metadata:
  name: test-service
spec:
  analysis:
    mode: remote
    llm:
      type: openai
      endpoint: https://api.openai.com/v1
      model: gpt-4o-mini
      api_key: env:OPENAI_API_KEY
  automation:
    dry_run: true
"#;
        let manifest = ServiceConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "test-service");
        assert_eq!(manifest.spec.analysis.mode, AnalysisMode::Remote);
        assert_eq!(manifest.spec.analysis.llm.provider_type, "openai");
        assert_eq!(manifest.spec.analysis.llm.request_timeout_seconds, 30);
        assert!(manifest.spec.automation.dry_run);
        assert!(manifest.spec.automation.enabled);
        assert_eq!(manifest.spec.network.port, 8080);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip_via_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut manifest = ServiceConfigManifest::default();
        manifest.metadata.name = "roundtrip".to_string();
        manifest.spec.automation.temp_dir = Some(dir.path().to_path_buf());
        manifest.to_yaml_file(&path).unwrap();

        let parsed = ServiceConfigManifest::from_yaml_file(&path).unwrap();
        assert_eq!(parsed.metadata.name, "roundtrip");
        assert_eq!(parsed.spec.automation.temp_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_validation() {
        let mut manifest = ServiceConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "WrongKind".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.detection.anomaly_threshold = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.detection.anomaly_threshold = 5;

        manifest.spec.automation.dry_run_min_delay_ms = 900;
        assert!(manifest.validate().is_err());
        manifest.spec.automation.dry_run_min_delay_ms = 100;

        manifest.spec.analysis.mode = AnalysisMode::Remote;
        manifest.spec.analysis.llm.provider_type = "anthropic".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_resolved_api_key() {
        let mut llm = LLMProviderConfig::default();
        assert!(llm.resolved_api_key().is_none());

        llm.api_key = Some("sk-literal".to_string());
        assert_eq!(llm.resolved_api_key().as_deref(), Some("sk-literal"));

        llm.api_key = Some("env:SELFHEAL_TEST_KEY_THAT_IS_NOT_SET".to_string());
        assert!(llm.resolved_api_key().is_none());
    }
}
