//! `validate-config` command

use crate::config::load_config;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the `validate-config` command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Executes the command, returning the process exit code
    pub async fn execute(
        &self,
        config_path: &str,
        _shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!("Configuration '{config_path}' is valid");
                println!("  environment:     {:?}", config.environment);
                println!("  storage backend: {:?}", config.storage.backend);
                println!("  suffix filter:   {}", config.ingestion.suffix_filter);
                println!("  output prefix:   {}", config.ingestion.output_prefix);
                println!("  max attempts:    {}", config.workflow.max_attempts);
                Ok(0)
            }
            Err(e) => {
                eprintln!("Configuration '{config_path}' is invalid: {e}");
                Ok(2)
            }
        }
    }
}
