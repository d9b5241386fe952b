//! Configuration schema types
//!
//! The root structure mapping the `aperture.toml` file. Every section
//! validates itself; validation errors are collected by
//! [`ApertureConfig::validate`] one section at a time.

use crate::config::SecretString;
use crate::core::deidentify::UnknownTagMode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use url::Url;

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Object store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// In-process memory store, for tests and dry runs
    #[default]
    Memory,
    /// Local filesystem store rooted at `storage.root`
    Filesystem,
    /// HTTP gateway store at `storage.base_url`
    Http,
}

/// Main Aperture configuration
///
/// The root configuration structure that maps to the TOML file.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApertureConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Ingestion trigger settings
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// De-identification settings
    pub deidentification: DeidentificationConfig,

    /// Workflow retry and budget settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Secure delivery settings
    pub delivery: DeliveryConfig,

    /// Object store settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ApertureConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid section.
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.ingestion.validate()?;
        self.deidentification.validate(&self.environment)?;
        self.workflow.validate()?;
        self.delivery.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (process but skip object store writes)
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Ingestion trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Object key suffix that starts a workflow execution
    #[serde(default = "default_suffix_filter")]
    pub suffix_filter: String,

    /// Key prefix for cleaned artifacts
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            suffix_filter: default_suffix_filter(),
            output_prefix: default_output_prefix(),
        }
    }
}

impl IngestionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.suffix_filter.is_empty() {
            return Err("ingestion.suffix_filter must not be empty".to_string());
        }
        if self.output_prefix.is_empty() {
            return Err("ingestion.output_prefix must not be empty".to_string());
        }
        Ok(())
    }
}

/// De-identification configuration
#[derive(Debug, Serialize, Deserialize)]
pub struct DeidentificationConfig {
    /// Key for the keyed pseudonym transform
    pub pseudonym_key: SecretString,

    /// Handling of unknown-VR tags outside the policy table
    #[serde(default)]
    pub unknown_tags: UnknownTagMode,
}

impl DeidentificationConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        let key = self.pseudonym_key.expose_secret();
        if key.is_empty() {
            return Err("deidentification.pseudonym_key must not be empty".to_string());
        }
        if *environment == Environment::Production && key.len() < 16 {
            return Err(
                "deidentification.pseudonym_key must be at least 16 bytes in production"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Workflow retry and budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum attempts per step for transient failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay in seconds; doubles on each further attempt
    #[serde(default = "default_retry_base_seconds")]
    pub retry_base_seconds: u64,

    /// Wall-clock budget per step attempt in seconds
    #[serde(default = "default_step_budget_seconds")]
    pub step_budget_seconds: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_base_seconds: default_retry_base_seconds(),
            step_budget_seconds: default_step_budget_seconds(),
        }
    }
}

impl WorkflowConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("workflow.max_attempts must be at least 1".to_string());
        }
        if self.step_budget_seconds == 0 {
            return Err("workflow.step_budget_seconds must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Secure delivery configuration
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Base URL the signed access URLs point at
    pub base_url: String,

    /// Key for the URL signature
    pub signing_key: SecretString,

    /// Descriptor lifetime when the caller does not supply one
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,
}

impl DeliveryConfig {
    fn validate(&self) -> Result<(), String> {
        Url::parse(&self.base_url)
            .map_err(|e| format!("delivery.base_url is not a valid URL: {e}"))?;
        if self.signing_key.expose_secret().is_empty() {
            return Err("delivery.signing_key must not be empty".to_string());
        }
        Ok(())
    }
}

/// Object store configuration
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: StorageBackend,

    /// Filesystem root (required for the filesystem backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Gateway base URL (required for the http backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Optional bearer token for the http backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<SecretString>,
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        match self.backend {
            StorageBackend::Memory => Ok(()),
            StorageBackend::Filesystem => {
                if self.root.as_deref().unwrap_or("").is_empty() {
                    Err("storage.root is required when storage.backend = 'filesystem'"
                        .to_string())
                } else {
                    Ok(())
                }
            }
            StorageBackend::Http => match self.base_url.as_deref() {
                None | Some("") => {
                    Err("storage.base_url is required when storage.backend = 'http'".to_string())
                }
                Some(base) => Url::parse(base)
                    .map(|_| ())
                    .map_err(|e| format!("storage.base_url is not a valid URL: {e}")),
            },
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable rolling JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation schedule: daily or hourly
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if !["daily", "hourly"].contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be daily or hourly",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_suffix_filter() -> String {
    ".dcm".to_string()
}

fn default_output_prefix() -> String {
    "deidentified/".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_seconds() -> u64 {
    2
}

fn default_step_budget_seconds() -> u64 {
    30
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn default_log_path() -> String {
    "./logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
