//! Core data model: proposed actions, check results, dry-run outcomes, and
//! the persisted risk card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enrich::Enrichment;

/// A caller's proposed file-content change. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub intent: String,
    pub file_path: String,
    pub new_contents: String,
    #[serde(default)]
    pub use_remote_sandbox: bool,
}

/// Named pipeline checks, in the order they can appear in a risk card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Policy,
    Sandbox,
    RemoteSandbox,
}

impl CheckName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Policy => "policy",
            CheckName::Sandbox => "sandbox",
            CheckName::RemoteSandbox => "remote_sandbox",
        }
    }
}

/// One entry in the ordered check sequence of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: CheckName,
    pub passed: bool,
    pub message: String,
}

impl CheckResult {
    pub fn pass(name: CheckName, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(name: CheckName, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            message: message.into(),
        }
    }
}

/// Failure cause of a dry run, distinct from an ordinary test failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DryRunError {
    Timeout,
    BackendUnavailable,
    ExecError,
}

/// Outcome of executing the test suite against the proposed change in an
/// isolated environment. stdout/stderr are bounded tails, never full capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DryRunResult {
    pub passed: bool,
    pub diff: String,
    pub stdout_tail: String,
    pub stderr_tail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<DryRunError>,
}

impl DryRunResult {
    /// Placeholder for pipeline paths where no dry run was executed.
    pub fn skipped() -> Self {
        Self {
            passed: false,
            diff: String::new(),
            stdout_tail: String::new(),
            stderr_tail: String::new(),
            error_kind: None,
        }
    }
}

/// Statistics and flagged patterns computed from a unified diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffAnalysis {
    pub lines_added: usize,
    pub lines_removed: usize,
    pub risky_patterns: Vec<String>,
    pub contains_sensitive_terms: bool,
    pub summary: String,
    pub preview_added: Vec<String>,
    pub preview_removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<Enrichment>,
}

/// Final decision of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Allow,
    Blocked,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Allow => "allow",
            Status::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow" => Some(Status::Allow),
            "blocked" => Some(Status::Blocked),
            _ => None,
        }
    }
}

/// Severity tier derived from the risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            "critical" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

/// The persisted decision record for one action.
///
/// Decision fields (status, checks, diff, risk_score) are immutable once
/// written; only the approval fields may be mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCard {
    pub request_id: String,
    pub status: Status,
    pub checks: Vec<CheckResult>,
    pub diff: String,
    pub stdout_tail: String,
    pub diff_analysis: DiffAnalysis,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub execution_time_ms: Option<u64>,
}
