//! Additive, table-driven risk scoring. Every contribution is traceable to
//! the decision status, a failed check, a raw-diff pattern match, deletion
//! volume, or the clearly separated optional enrichment delta.

use crate::card::{CheckName, CheckResult, RiskLevel, Status};
use crate::enrich::Enrichment;

const BASE_BLOCKED: i64 = 50;
const BASE_ALLOW: i64 = 10;
const FAILED_CHECK_PENALTY: i64 = 15;
const POLICY_FAILURE_PENALTY: i64 = 20;
const SANDBOX_FAILURE_PENALTY: i64 = 25;

/// Penalties matched against the uppercased raw diff text. Intentionally a
/// separate table from the diff analyzer's pattern list; merging the two
/// would change scoring outcomes.
const RISKY_DIFF_PATTERNS: &[(&str, i64)] = &[
    ("DELETE", 10),
    ("DROP", 10),
    ("RM -RF", 15),
    ("DROP TABLE", 15),
    ("TRUNCATE", 12),
    ("--FORCE", 8),
    ("--NO-CHECK", 8),
];

const LARGE_DELETION_THRESHOLD: i64 = 10;
const LARGE_DELETION_CAP: i64 = 15;

const ENRICHMENT_ADJUSTMENT_CAP: u8 = 20;

/// Deterministic risk score in [0, 100].
pub fn calculate_risk_score(status: Status, checks: &[CheckResult], diff: &str) -> u8 {
    let mut score: i64 = match status {
        Status::Blocked => BASE_BLOCKED,
        Status::Allow => BASE_ALLOW,
    };

    for check in checks {
        if check.passed {
            continue;
        }
        score += FAILED_CHECK_PENALTY;
        score += match check.name {
            CheckName::Policy => POLICY_FAILURE_PENALTY,
            CheckName::Sandbox => SANDBOX_FAILURE_PENALTY,
            CheckName::RemoteSandbox => 0,
        };
    }

    if !diff.is_empty() {
        let diff_upper = diff.to_uppercase();
        for (pattern, penalty) in RISKY_DIFF_PATTERNS {
            if diff_upper.contains(pattern) {
                score += penalty;
            }
        }

        let deletions = diff
            .lines()
            .filter(|line| line.starts_with('-') && !line.starts_with("---"))
            .count() as i64;
        if deletions > LARGE_DELETION_THRESHOLD {
            score += (deletions / 5).min(LARGE_DELETION_CAP);
        }
    }

    score.clamp(0, 100) as u8
}

/// Severity tier for a score. Half-open intervals, critical is closed above.
pub fn risk_level(score: u8) -> RiskLevel {
    match score {
        0..=19 => RiskLevel::Low,
        20..=49 => RiskLevel::Medium,
        50..=79 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

/// Bounded delta contributed by AI enrichment, capped at +20. Kept separate
/// from the deterministic score so its absence never changes the result.
pub fn enrichment_adjustment(enrichment: &Enrichment) -> u8 {
    if enrichment.risks.is_empty() {
        return 0;
    }
    let mut adjustment = enrichment.risks.len() as u32 * 5;
    if enrichment.confidence > 0.7 {
        adjustment += 10;
    } else if enrichment.confidence > 0.5 {
        adjustment += 5;
    }
    adjustment.min(ENRICHMENT_ADJUSTMENT_CAP as u32) as u8
}

/// Apply the optional enrichment delta on top of a deterministic score.
pub fn apply_enrichment(score: u8, enrichment: Option<&Enrichment>) -> u8 {
    match enrichment {
        Some(e) => (score as u32 + enrichment_adjustment(e) as u32).min(100) as u8,
        None => score,
    }
}
