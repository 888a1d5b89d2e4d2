//! Unified-diff rendering between old and new file contents.

use similar::TextDiff;

/// Unified diff between two versions of a file. Identical inputs yield an
/// empty string, never a header-only diff.
pub fn unified_diff(old: &str, new: &str, path: &str) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(path, path)
        .to_string()
}
