//! `init` command: write a starter configuration file

use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

const TEMPLATE: &str = r#"# Aperture configuration

environment = "development"

[application]
log_level = "info"
dry_run = false

[ingestion]
suffix_filter = ".dcm"
output_prefix = "deidentified/"

[deidentification]
# Keyed pseudonym derivation; keep this out of version control.
pseudonym_key = "${APERTURE_PSEUDONYM_KEY}"
unknown_tags = "lenient"

[workflow]
max_attempts = 3
retry_base_seconds = 2
step_budget_seconds = 30

[delivery]
base_url = "https://delivery.example.org/artifacts"
signing_key = "${APERTURE_SIGNING_KEY}"
default_ttl_seconds = 3600

[storage]
backend = "filesystem"
root = "./data"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#;

/// Arguments for the `init` command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file
    #[arg(long, default_value = "aperture.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Executes the command, returning the process exit code
    pub async fn execute(&self, _shutdown: watch::Receiver<bool>) -> anyhow::Result<i32> {
        if self.output.exists() && !self.force {
            eprintln!(
                "{} already exists; pass --force to overwrite",
                self.output.display()
            );
            return Ok(2);
        }

        std::fs::write(&self.output, TEMPLATE)?;
        println!("Wrote starter configuration to {}", self.output.display());
        println!("Set APERTURE_PSEUDONYM_KEY and APERTURE_SIGNING_KEY before running.");
        Ok(0)
    }
}
