//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Loading pipeline: read the file, substitute `${VAR}` placeholders, parse
//! the TOML, apply `APERTURE_*` overrides, validate.

use super::schema::ApertureConfig;
use crate::config::secret_string;
use crate::core::deidentify::UnknownTagMode;
use crate::domain::errors::ApertureError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced environment
/// variable is unset, TOML parsing fails, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use aperture::config::load_config;
///
/// let config = load_config("aperture.toml").expect("failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ApertureConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ApertureError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ApertureError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ApertureConfig = toml::from_str(&contents)
        .map_err(|e| ApertureError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ApertureError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static regex"))
}

/// Substitutes `${VAR_NAME}` placeholders outside comment lines
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_re();
    let mut result = String::new();
    let mut missing = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed = line.to_string();
        for cap in re.captures_iter(line) {
            let name = &cap[1];
            match std::env::var(name) {
                Ok(value) => {
                    processed = processed.replace(&format!("${{{name}}}"), &value);
                }
                Err(_) => {
                    if !missing.contains(&name.to_string()) {
                        missing.push(name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing.is_empty() {
        return Err(ApertureError::Configuration(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )));
    }

    Ok(result)
}

/// Applies `APERTURE_<SECTION>_<KEY>` environment overrides
fn apply_env_overrides(config: &mut ApertureConfig) {
    if let Ok(val) = std::env::var("APERTURE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("APERTURE_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("APERTURE_INGESTION_SUFFIX_FILTER") {
        config.ingestion.suffix_filter = val;
    }
    if let Ok(val) = std::env::var("APERTURE_INGESTION_OUTPUT_PREFIX") {
        config.ingestion.output_prefix = val;
    }

    if let Ok(val) = std::env::var("APERTURE_DEIDENTIFICATION_PSEUDONYM_KEY") {
        config.deidentification.pseudonym_key = secret_string(val);
    }
    if let Ok(val) = std::env::var("APERTURE_DEIDENTIFICATION_UNKNOWN_TAGS") {
        match val.to_lowercase().as_str() {
            "lenient" => config.deidentification.unknown_tags = UnknownTagMode::Lenient,
            "strict" => config.deidentification.unknown_tags = UnknownTagMode::Strict,
            other => {
                tracing::warn!(value = other, "Ignoring invalid unknown_tags override");
            }
        }
    }

    if let Ok(val) = std::env::var("APERTURE_WORKFLOW_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.workflow.max_attempts = attempts;
        }
    }
    if let Ok(val) = std::env::var("APERTURE_WORKFLOW_RETRY_BASE_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.workflow.retry_base_seconds = seconds;
        }
    }
    if let Ok(val) = std::env::var("APERTURE_WORKFLOW_STEP_BUDGET_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.workflow.step_budget_seconds = seconds;
        }
    }

    if let Ok(val) = std::env::var("APERTURE_DELIVERY_BASE_URL") {
        config.delivery.base_url = val;
    }
    if let Ok(val) = std::env::var("APERTURE_DELIVERY_SIGNING_KEY") {
        config.delivery.signing_key = secret_string(val);
    }
    if let Ok(val) = std::env::var("APERTURE_DELIVERY_DEFAULT_TTL_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.delivery.default_ttl_seconds = seconds;
        }
    }

    if let Ok(val) = std::env::var("APERTURE_STORAGE_ROOT") {
        config.storage.root = Some(val);
    }
    if let Ok(val) = std::env::var("APERTURE_STORAGE_BASE_URL") {
        config.storage.base_url = Some(val);
    }
    if let Ok(val) = std::env::var("APERTURE_STORAGE_BEARER_TOKEN") {
        config.storage.bearer_token = Some(secret_string(val));
    }

    if let Ok(val) = std::env::var("APERTURE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("APERTURE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_TOML: &str = r#"
[deidentification]
pseudonym_key = "development-pseudonym-key"

[delivery]
base_url = "https://delivery.example.org/artifacts"
signing_key = "development-signing-key"
"#;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("APERTURE_TEST_SUBST", "from-env");
        let result = substitute_env_vars("key = \"${APERTURE_TEST_SUBST}\"").unwrap();
        assert_eq!(result.trim(), "key = \"from-env\"");
        std::env::remove_var("APERTURE_TEST_SUBST");
    }

    #[test]
    fn test_substitute_missing_var_fails() {
        std::env::remove_var("APERTURE_TEST_MISSING");
        let result = substitute_env_vars("key = \"${APERTURE_TEST_MISSING}\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_comment_lines_are_left_alone() {
        std::env::remove_var("APERTURE_TEST_COMMENT");
        let input = "# uses ${APERTURE_TEST_COMMENT}\nkey = \"plain\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${APERTURE_TEST_COMMENT}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("does-not-exist.toml").is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID_TOML.as_bytes()).unwrap();
        file.flush().unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.delivery.base_url, "https://delivery.example.org/artifacts");
        assert_eq!(config.workflow.max_attempts, 3);
    }
}
