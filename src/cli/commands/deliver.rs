//! `deliver` command: issue signed access descriptors

use crate::adapters::storage::create_store;
use crate::config::load_config;
use crate::core::delivery::{DeliveryOutcome, DeliveryService, UrlSigner};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the `deliver` command
#[derive(Args, Debug)]
pub struct DeliverArgs {
    /// Object keys to issue descriptors for
    #[arg(required = true)]
    pub keys: Vec<String>,

    /// Descriptor lifetime in seconds (default from configuration)
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Skip the existence probe before issuance
    #[arg(long)]
    pub no_validate: bool,
}

impl DeliverArgs {
    /// Executes the command, returning the process exit code
    pub async fn execute(
        &self,
        config_path: &str,
        _shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let config = load_config(config_path)?;
        let store = create_store(&config.storage)?;
        let signer = UrlSigner::new(
            &config.delivery.base_url,
            config.delivery.signing_key.clone(),
        )?;
        let service =
            DeliveryService::new(store, signer, config.delivery.default_ttl_seconds);

        let outcomes = if self.keys.len() == 1 {
            let key = &self.keys[0];
            let outcome = service.issue(key, self.ttl, !self.no_validate).await?;
            std::collections::BTreeMap::from([(key.clone(), outcome)])
        } else {
            service.issue_batch(&self.keys, self.ttl).await
        };

        println!("{}", serde_json::to_string_pretty(&outcomes)?);

        let missing = outcomes
            .values()
            .filter(|o| matches!(o, DeliveryOutcome::NotFound { .. }))
            .count();
        Ok(if missing == outcomes.len() && !outcomes.is_empty() {
            1
        } else {
            0
        })
    }
}
