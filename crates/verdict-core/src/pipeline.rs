//! The approval pipeline: policy gate, sandboxed dry run, diff analysis,
//! scoring, explanation, and persistence, in that order. Every submission
//! produces exactly one persisted risk card.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::card::{
    Action, CheckName, CheckResult, DryRunError, DryRunResult, RiskCard, Status,
};
use crate::diff::analyze_diff;
use crate::enrich::{Enricher, Enrichment};
use crate::explain::Explainer;
use crate::policy;
use crate::sandbox::Sandbox;
use crate::scoring::{apply_enrichment, calculate_risk_score, risk_level};
use crate::store::DecisionStore;

const CHECK_MESSAGE_CHARS: usize = 200;

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct Decision {
    pub allowed: bool,
    pub card: RiskCard,
}

/// Orchestrates the gate stages for submitted actions.
pub struct Pipeline {
    local: Arc<dyn Sandbox>,
    remote: Option<Arc<dyn Sandbox>>,
    explainer: Explainer,
    enricher: Option<Enricher>,
    store: Arc<DecisionStore>,
    latest: RwLock<Option<RiskCard>>,
}

impl Pipeline {
    pub fn new(local: Arc<dyn Sandbox>, store: Arc<DecisionStore>) -> Self {
        Self {
            local,
            remote: None,
            explainer: Explainer::new(),
            enricher: None,
            store,
            latest: RwLock::new(None),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn Sandbox>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_explainer(mut self, explainer: Explainer) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_enricher(mut self, enricher: Enricher) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Run the full gate for one action. Err only on persistence failure; all
    /// check and sandbox failures become a blocked decision instead.
    pub async fn submit(&self, action: Action) -> Result<Decision> {
        let started = Instant::now();
        let request_id = new_request_id();
        info!(
            request_id = %request_id,
            intent = %action.intent,
            file_path = %action.file_path,
            "action submitted"
        );

        let mut checks = Vec::new();

        let outcome = policy::validate(&action);
        if !outcome.passed {
            checks.push(CheckResult::fail(CheckName::Policy, outcome.reason));
            return self
                .finish(
                    request_id,
                    Status::Blocked,
                    checks,
                    DryRunResult::skipped(),
                    None,
                    started,
                )
                .await;
        }
        checks.push(CheckResult::pass(CheckName::Policy, "OK"));

        let dry_run = self.run_dry_run(&action, &mut checks).await;
        checks.push(sandbox_check(&dry_run));
        let status = if dry_run.passed {
            Status::Allow
        } else {
            Status::Blocked
        };

        let enrichment = match &self.enricher {
            Some(enricher) if !dry_run.diff.is_empty() => {
                enricher
                    .analyze(&dry_run.diff, &action.file_path, &action.intent)
                    .await
            }
            _ => None,
        };

        self.finish(request_id, status, checks, dry_run, enrichment, started)
            .await
    }

    /// Most recently persisted card, if any submission has completed.
    pub async fn latest(&self) -> Option<RiskCard> {
        self.latest.read().await.clone()
    }

    /// Execute the dry run, preferring the remote backend when requested.
    ///
    /// A remote run that actually executed the tests (pass or fail) is
    /// authoritative. Any remote failure, timeout included, falls back to the
    /// local sandbox, recorded as a failed remote check; exactly one backend
    /// produces the result that gets scored.
    async fn run_dry_run(&self, action: &Action, checks: &mut Vec<CheckResult>) -> DryRunResult {
        if action.use_remote_sandbox {
            if let Some(remote) = &self.remote {
                let result = remote.run(&action.file_path, &action.new_contents).await;
                match result.error_kind {
                    None => {
                        checks.push(CheckResult::pass(
                            CheckName::RemoteSandbox,
                            format!("executed on {}", remote.name()),
                        ));
                        return result;
                    }
                    Some(_) => {
                        let detail = if result.stderr_tail.is_empty() {
                            "remote backend unavailable".to_string()
                        } else {
                            head(&result.stderr_tail, CHECK_MESSAGE_CHARS)
                        };
                        warn!(backend = remote.name(), detail = %detail, "remote dry run failed, falling back to local");
                        checks.push(CheckResult::fail(CheckName::RemoteSandbox, detail));
                    }
                }
            } else {
                checks.push(CheckResult::fail(
                    CheckName::RemoteSandbox,
                    "remote sandbox not configured",
                ));
            }
        }
        self.local.run(&action.file_path, &action.new_contents).await
    }

    async fn finish(
        &self,
        request_id: String,
        status: Status,
        checks: Vec<CheckResult>,
        dry_run: DryRunResult,
        enrichment: Option<Enrichment>,
        started: Instant,
    ) -> Result<Decision> {
        let mut diff_analysis = analyze_diff(&dry_run.diff);
        let base_score = calculate_risk_score(status, &checks, &dry_run.diff);
        let risk_score = apply_enrichment(base_score, enrichment.as_ref());
        diff_analysis.enrichment = enrichment;

        let explanation = self.explainer.explain(status, &checks, &diff_analysis).await;

        let card = RiskCard {
            request_id,
            status,
            checks,
            diff: dry_run.diff,
            stdout_tail: dry_run.stdout_tail,
            diff_analysis,
            risk_score,
            risk_level: risk_level(risk_score),
            explanation,
            created_at: Utc::now(),
            approved: false,
            approved_by: None,
            approved_at: None,
            execution_time_ms: Some(started.elapsed().as_millis() as u64),
        };

        self.store
            .insert(&card)
            .context("failed to persist risk card")?;
        *self.latest.write().await = Some(card.clone());

        info!(
            request_id = %card.request_id,
            status = card.status.as_str(),
            risk_score = card.risk_score,
            risk_level = card.risk_level.as_str(),
            "decision recorded"
        );

        Ok(Decision {
            allowed: status == Status::Allow,
            card,
        })
    }
}

fn sandbox_check(dry_run: &DryRunResult) -> CheckResult {
    if dry_run.passed {
        return CheckResult::pass(CheckName::Sandbox, "tests passed");
    }
    let message = match dry_run.error_kind {
        Some(DryRunError::Timeout) => "tests timed out".to_string(),
        _ if dry_run.stderr_tail.is_empty() => "tests failed".to_string(),
        _ => head(&dry_run.stderr_tail, CHECK_MESSAGE_CHARS),
    };
    CheckResult::fail(CheckName::Sandbox, message)
}

fn new_request_id() -> String {
    format!("req_{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn head(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_shape() {
        let id = new_request_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sandbox_check_messages() {
        let passed = DryRunResult {
            passed: true,
            diff: String::new(),
            stdout_tail: String::new(),
            stderr_tail: String::new(),
            error_kind: None,
        };
        assert_eq!(sandbox_check(&passed).message, "tests passed");

        let timed_out = DryRunResult {
            passed: false,
            error_kind: Some(DryRunError::Timeout),
            ..passed.clone()
        };
        assert_eq!(sandbox_check(&timed_out).message, "tests timed out");

        let failed = DryRunResult {
            passed: false,
            stderr_tail: "assert 1 == 2".to_string(),
            ..passed.clone()
        };
        assert_eq!(sandbox_check(&failed).message, "assert 1 == 2");

        let failed_silent = DryRunResult {
            passed: false,
            ..passed
        };
        assert_eq!(sandbox_check(&failed_silent).message, "tests failed");
    }
}
