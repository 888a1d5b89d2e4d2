//! Policy validation: the fixed rule set gating which paths, intents, and
//! content structures may even be attempted. Rules run in order; the first
//! failure wins and its reason is surfaced verbatim on the risk card.

use std::ops::RangeInclusive;

use crate::card::Action;

/// Path roots that proposed changes may target.
pub const ALLOWED_ROOTS: [&str; 2] = ["config", "flags"];

const APP_CONFIG_TARGET: &str = "config/app.yaml";
const ROLLOUT_TARGET: &str = "flags/rollout.json";

const PAGINATION_RANGE: RangeInclusive<i64> = 1..=100;
/// Rollout percentages above this are rejected (no instant full rollout).
const ROLLOUT_MAX_PERCENTAGE: i64 = 50;

const PARSE_ERROR_CHARS: usize = 200;

/// Result of validating an action: a single pass/fail with one
/// human-readable reason. Scoring happens downstream, never here.
#[derive(Debug, Clone)]
pub struct PolicyOutcome {
    pub passed: bool,
    pub reason: String,
}

impl PolicyOutcome {
    fn pass() -> Self {
        Self {
            passed: true,
            reason: "OK".to_string(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }
}

/// Validate a proposed action against the fixed policy rules.
pub fn validate(action: &Action) -> PolicyOutcome {
    let fp = action.file_path.as_str();

    // Rule 1: only paths under the allowlisted roots may be edited.
    let under_allowed_root = ALLOWED_ROOTS
        .iter()
        .any(|root| fp == *root || fp.starts_with(&format!("{root}/")));
    if !under_allowed_root {
        return PolicyOutcome::fail(format!(
            "File '{}' not in allowlist {:?}",
            fp, ALLOWED_ROOTS
        ));
    }

    // Rule 2: block obviously destructive intents.
    if action.intent.to_lowercase().contains("delete") {
        return PolicyOutcome::fail("Destructive intent blocked");
    }

    // Rules 3-5 apply only to recognized structured-config targets.
    match fp {
        APP_CONFIG_TARGET => validate_app_config(&action.new_contents),
        ROLLOUT_TARGET => validate_rollout(&action.new_contents),
        _ => PolicyOutcome::pass(),
    }
}

/// Key/type/range allowlist for the YAML application config.
fn validate_app_config(contents: &str) -> PolicyOutcome {
    let data: serde_yaml::Value = match serde_yaml::from_str(contents) {
        Ok(v) => v,
        Err(e) => {
            return PolicyOutcome::fail(format!(
                "YAML parse error: {}",
                head(&e.to_string(), PARSE_ERROR_CHARS)
            ))
        }
    };

    let mapping = match data {
        // Empty document is an empty mapping.
        serde_yaml::Value::Null => return PolicyOutcome::pass(),
        serde_yaml::Value::Mapping(m) => m,
        _ => return PolicyOutcome::fail("app.yaml must be a key/value mapping"),
    };

    for (key, value) in &mapping {
        let Some(key) = key.as_str() else {
            return PolicyOutcome::fail("app.yaml keys must be strings");
        };
        match key {
            "service" => {
                if !value.is_string() {
                    return PolicyOutcome::fail("service must be a string");
                }
            }
            "pagination" => match value.as_i64() {
                Some(n) if PAGINATION_RANGE.contains(&n) => {}
                _ => return PolicyOutcome::fail("pagination must be 1..100"),
            },
            "featureX" => {
                if !value.is_bool() {
                    return PolicyOutcome::fail("featureX must be true/false");
                }
            }
            other => {
                return PolicyOutcome::fail(format!("Key '{}' not allowed in app.yaml", other))
            }
        }
    }

    PolicyOutcome::pass()
}

/// Flag-rollout target: nested JSON with a bounded percentage field.
fn validate_rollout(contents: &str) -> PolicyOutcome {
    let data: serde_json::Value = match serde_json::from_str(contents) {
        Ok(v) => v,
        Err(e) => {
            return PolicyOutcome::fail(format!(
                "JSON parse error: {}",
                head(&e.to_string(), PARSE_ERROR_CHARS)
            ))
        }
    };

    let pct = match data
        .get("featureX")
        .and_then(|f| f.get("percentage"))
        .and_then(|p| p.as_i64())
    {
        Some(p) => p,
        None => return PolicyOutcome::fail("flags must have featureX.percentage"),
    };

    if !(0..=ROLLOUT_MAX_PERCENTAGE).contains(&pct) {
        return PolicyOutcome::fail("percentage must be 0..50 (no instant 100%)");
    }

    PolicyOutcome::pass()
}

/// First `max` characters of a string, safe at char boundaries.
fn head(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
