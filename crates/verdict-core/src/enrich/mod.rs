//! Optional AI enrichment: best-effort risk annotations for a diff. Absence
//! or failure of the provider never surfaces as an error; callers receive
//! `None` and proceed with the deterministic pipeline.

pub mod openrouter;
pub mod provider;

pub use openrouter::OpenRouterClient;
pub use provider::TextCompletion;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

const DIFF_PROMPT_CHARS: usize = 2000;

/// AI-derived risk annotations attached to a diff analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub risks: Vec<String>,
    pub confidence: f64,
    pub recommendations: Vec<String>,
    pub summary: String,
}

/// Wraps a text-completion provider to produce structured risk annotations.
pub struct Enricher {
    client: Arc<dyn TextCompletion>,
}

impl Enricher {
    pub fn new(client: Arc<dyn TextCompletion>) -> Self {
        Self { client }
    }

    /// Analyze a diff with the AI provider. Returns None on any failure:
    /// provider error, timeout, empty answer, or unparseable response.
    pub async fn analyze(&self, diff: &str, file_path: &str, intent: &str) -> Option<Enrichment> {
        let prompt = build_prompt(diff, file_path, intent);
        match self.client.complete(&prompt).await {
            Ok(Some(text)) => {
                let parsed = parse_enrichment(&text);
                if parsed.is_none() {
                    debug!(model = self.client.model_name(), "unparseable enrichment response");
                }
                parsed
            }
            Ok(None) => {
                debug!(model = self.client.model_name(), "empty enrichment response");
                None
            }
            Err(e) => {
                debug!(error = %e, "enrichment call failed, continuing without it");
                None
            }
        }
    }
}

fn build_prompt(diff: &str, file_path: &str, intent: &str) -> String {
    let diff_head: String = diff.chars().take(DIFF_PROMPT_CHARS).collect();
    format!(
        "Analyze this code change for security risks and quality issues.\n\n\
         File: {file_path}\nIntent: {intent}\n\nDiff:\n{diff_head}\n\n\
         Respond with JSON only, keys: risks (array of strings), confidence \
         (0-1), recommendations (array of strings), summary (string)."
    )
}

fn parse_enrichment(text: &str) -> Option<Enrichment> {
    let value: serde_json::Value = serde_json::from_str(text.trim()).ok()?;
    Some(Enrichment {
        risks: string_list(value.get("risks")),
        confidence: value
            .get("confidence")
            .and_then(|c| c.as_f64())
            .unwrap_or(0.5),
        recommendations: string_list(value.get("recommendations")),
        summary: value
            .get("summary")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
