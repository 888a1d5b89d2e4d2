//! Pure diff analysis: change statistics and risky textual patterns over a
//! unified diff. Stateless; calling twice on the same input yields identical
//! output.

use crate::card::DiffAnalysis;

/// Fixed pattern table, matched case-insensitively against the concatenation
/// of added and removed lines. Order here is the order descriptions appear
/// in the analysis.
const PATTERN_TABLE: &[(&str, &str)] = &[
    ("delete", "DELETE statement detected"),
    ("drop", "DROP statement detected"),
    ("truncate", "TRUNCATE statement detected"),
    ("rm -rf", "Recursive delete command"),
    ("--force", "Force flag detected"),
    ("--no-check", "Safety check bypass"),
    ("password", "Potential password exposure"),
    ("secret", "Potential secret exposure"),
    ("api_key", "Potential API key exposure"),
    ("token", "Potential token exposure"),
];

/// Keyword set for the sensitive-data flag. Intentionally separate from the
/// pattern table above.
const SENSITIVE_TERMS: &[&str] = &["password", "secret", "api_key", "token", "credential"];

const PREVIEW_LINES: usize = 10;

/// Analyze a unified diff for change statistics and risky patterns.
pub fn analyze_diff(diff: &str) -> DiffAnalysis {
    if diff.is_empty() {
        return DiffAnalysis {
            lines_added: 0,
            lines_removed: 0,
            risky_patterns: Vec::new(),
            contains_sensitive_terms: false,
            summary: "No changes detected".to_string(),
            preview_added: Vec::new(),
            preview_removed: Vec::new(),
            enrichment: None,
        };
    }

    let mut added: Vec<String> = Vec::new();
    let mut removed: Vec<String> = Vec::new();
    for line in diff.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if let Some(rest) = line.strip_prefix('+') {
            added.push(rest.to_string());
        } else if let Some(rest) = line.strip_prefix('-') {
            removed.push(rest.to_string());
        }
    }

    let all_text = added
        .iter()
        .chain(removed.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    let risky_patterns: Vec<String> = PATTERN_TABLE
        .iter()
        .filter(|(pattern, _)| all_text.contains(pattern))
        .map(|(_, description)| description.to_string())
        .collect();

    let contains_sensitive_terms = SENSITIVE_TERMS.iter().any(|term| all_text.contains(term));

    let mut summary_parts = Vec::new();
    if !added.is_empty() {
        summary_parts.push(format!("{} line(s) added", added.len()));
    }
    if !removed.is_empty() {
        summary_parts.push(format!("{} line(s) removed", removed.len()));
    }
    if !risky_patterns.is_empty() {
        summary_parts.push(format!("{} risky pattern(s) found", risky_patterns.len()));
    }
    let summary = if summary_parts.is_empty() {
        "No significant changes".to_string()
    } else {
        summary_parts.join(", ")
    };

    let preview_added = added.iter().take(PREVIEW_LINES).cloned().collect();
    let preview_removed = removed.iter().take(PREVIEW_LINES).cloned().collect();

    DiffAnalysis {
        lines_added: added.len(),
        lines_removed: removed.len(),
        risky_patterns,
        contains_sensitive_terms,
        summary,
        preview_added,
        preview_removed,
        enrichment: None,
    }
}
