use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use verdict_gateway::{start_server, AppState, Metrics, WebhookNotifier};

use crate::commands::build_pipeline;
use crate::config::Config;

pub async fn execute(host: String, port: u16, config: &Config) -> Result<()> {
    info!(host = %host, port, "Starting gateway server");

    let (pipeline, store) = build_pipeline(config)?;

    let webhook = if config.webhook.url.is_empty() {
        None
    } else {
        Some(Arc::new(WebhookNotifier::new(config.webhook.url.clone())))
    };

    let state = AppState {
        pipeline,
        store,
        metrics: Arc::new(Metrics::new()),
        webhook,
        allowed_origins: config.gateway.allowed_origins.clone(),
    };

    start_server(state, &host, port).await?;

    Ok(())
}
