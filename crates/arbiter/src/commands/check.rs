use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use verdict_core::Action;

use crate::commands::build_pipeline;
use crate::config::Config;

/// Evaluate one change and print the resulting risk card as JSON.
/// Returns whether the action was allowed.
pub async fn execute(
    file: String,
    intent: String,
    contents: Option<PathBuf>,
    remote: bool,
    config: &Config,
) -> Result<bool> {
    let new_contents = match contents {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read contents file: {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read contents from stdin")?;
            buf
        }
    };

    let (pipeline, _store) = build_pipeline(config)?;
    let decision = pipeline
        .submit(Action {
            intent,
            file_path: file,
            new_contents,
            use_remote_sandbox: remote,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&decision.card)?);
    Ok(decision.allowed)
}
