//! `status` command: list cleaned artifacts in the configured store

use crate::adapters::storage::create_store;
use crate::config::load_config;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the `status` command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Prefix to list (defaults to the configured output prefix)
    #[arg(long)]
    pub prefix: Option<String>,
}

impl StatusArgs {
    /// Executes the command, returning the process exit code
    pub async fn execute(
        &self,
        config_path: &str,
        _shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let store = create_store(&config.storage)?;

        let prefix = self
            .prefix
            .clone()
            .unwrap_or_else(|| config.ingestion.output_prefix.clone());
        let keys = store.list(&prefix).await?;

        if keys.is_empty() {
            println!("No artifacts under '{prefix}'");
        } else {
            println!("{} artifact(s) under '{prefix}':", keys.len());
            for key in keys {
                println!("  {key}");
            }
        }
        Ok(0)
    }
}
