pub mod check;
pub mod init;
pub mod serve;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::warn;

use verdict_core::enrich::{Enricher, OpenRouterClient, TextCompletion};
use verdict_core::explain::Explainer;
use verdict_core::{DecisionStore, Pipeline};
use verdict_sandbox::{LocalSandbox, RemoteSandbox};

use crate::config::Config;

/// Assemble the pipeline and store from config. Optional capabilities
/// (remote sandbox, enrichment) are wired in here, once, or not at all.
pub fn build_pipeline(config: &Config) -> Result<(Arc<Pipeline>, Arc<DecisionStore>)> {
    let db_path = shellexpand::tilde(&config.store.db_path).into_owned();
    let store = Arc::new(DecisionStore::open(Path::new(&db_path))?);

    let template_dir = shellexpand::tilde(&config.sandbox.template_dir).into_owned();
    let local = Arc::new(LocalSandbox::new(
        PathBuf::from(template_dir),
        config.sandbox.test_command.clone(),
        Duration::from_secs(config.sandbox.timeout_secs),
    ));

    let mut pipeline = Pipeline::new(local, store.clone());

    if config.remote.enabled {
        if config.remote.repo_url.is_empty() {
            bail!("remote sandbox enabled but remote.repo_url is empty");
        }
        pipeline = pipeline.with_remote(Arc::new(RemoteSandbox::new(
            config.remote.repo_url.clone(),
            config.remote.test_command.clone(),
            Duration::from_secs(config.remote.timeout_secs),
        )));
    }

    if config.enrichment.enabled {
        match read_api_key(&config.enrichment.api_key_file) {
            Ok(key) => {
                let client: Arc<dyn TextCompletion> =
                    Arc::new(OpenRouterClient::new(&key).with_model(&config.enrichment.model));
                pipeline = pipeline
                    .with_enricher(Enricher::new(client.clone()))
                    .with_explainer(Explainer::with_provider(client));
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "enrichment unavailable, running without it");
            }
        }
    }

    Ok((Arc::new(pipeline), store))
}

fn read_api_key(path: &str) -> Result<String> {
    let expanded = shellexpand::tilde(path);
    let key = std::fs::read_to_string(expanded.as_ref())
        .with_context(|| format!("Failed to read API key file: {}", expanded))?;
    let key = key.trim().to_string();
    if key.is_empty() {
        bail!("API key file is empty: {}", expanded);
    }
    Ok(key)
}
