//! Human-readable explanations for a decision. AI-backed when a provider is
//! configured, deterministic rule-based text otherwise. Output is bounded.

use std::sync::Arc;

use tracing::debug;

use crate::card::{CheckResult, DiffAnalysis, Status};
use crate::enrich::TextCompletion;

const MAX_EXPLANATION_CHARS: usize = 280;
const LAST_RESORT: &str = "Risk assessment completed.";

/// Produces a one-paragraph explanation of a decision.
pub struct Explainer {
    provider: Option<Arc<dyn TextCompletion>>,
}

impl Default for Explainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Explainer {
    /// Rule-based explainer, no external provider.
    pub fn new() -> Self {
        Self { provider: None }
    }

    pub fn with_provider(provider: Arc<dyn TextCompletion>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Explain a decision. Provider failures fall back to rule-based text,
    /// never to an error.
    pub async fn explain(
        &self,
        status: Status,
        checks: &[CheckResult],
        analysis: &DiffAnalysis,
    ) -> String {
        if let Some(provider) = &self.provider {
            let prompt = build_prompt(status, checks, analysis);
            match provider.complete(&prompt).await {
                Ok(Some(text)) => return truncate(text.trim()),
                Ok(None) => {
                    debug!(model = provider.model_name(), "empty explanation response");
                }
                Err(e) => {
                    debug!(error = %e, "explanation call failed, using rule-based text");
                }
            }
        }

        let text = rule_based(status, checks, analysis);
        if text.is_empty() {
            LAST_RESORT.to_string()
        } else {
            truncate(&text)
        }
    }
}

fn build_prompt(status: Status, checks: &[CheckResult], analysis: &DiffAnalysis) -> String {
    let mut lines = vec![
        "Explain this change-approval decision in one short paragraph for an engineer."
            .to_string(),
        format!("Decision: {}", status.as_str()),
    ];
    for check in checks {
        lines.push(format!(
            "Check {}: {} ({})",
            check.name.as_str(),
            if check.passed { "passed" } else { "failed" },
            check.message
        ));
    }
    lines.push(format!("Diff summary: {}", analysis.summary));
    if !analysis.risky_patterns.is_empty() {
        lines.push(format!("Risky patterns: {}", analysis.risky_patterns.join(", ")));
    }
    lines.push("Respond with plain text only, at most two sentences.".to_string());
    lines.join("\n")
}

fn rule_based(status: Status, checks: &[CheckResult], analysis: &DiffAnalysis) -> String {
    let mut parts: Vec<String> = checks
        .iter()
        .filter(|c| !c.passed)
        .map(|c| match c.name {
            crate::card::CheckName::Policy => format!("policy violation: {}", c.message),
            crate::card::CheckName::Sandbox => format!("sandbox tests failed: {}", c.message),
            crate::card::CheckName::RemoteSandbox => {
                format!("remote sandbox unavailable: {}", c.message)
            }
        })
        .collect();

    if parts.is_empty() {
        parts.push(match status {
            Status::Allow => "Action is safe".to_string(),
            Status::Blocked => "Action is blocked".to_string(),
        });
    }

    if analysis.lines_added > 0 || analysis.lines_removed > 0 {
        parts.push(format!(
            "({} added, {} removed)",
            analysis.lines_added, analysis.lines_removed
        ));
    }

    parts.join("; ")
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_EXPLANATION_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(MAX_EXPLANATION_CHARS - 3).collect();
    format!("{}...", head)
}
