//! Configuration management
//!
//! TOML-backed configuration with `${VAR}` substitution, `APERTURE_*`
//! environment overrides, and secret-bearing fields that stay redacted in
//! logs and debug output.

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApertureConfig, ApplicationConfig, DeidentificationConfig, DeliveryConfig, Environment,
    IngestionConfig, LoggingConfig, StorageBackend, StorageConfig, WorkflowConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
