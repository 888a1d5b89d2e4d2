//! Working-copy staging: project copies, change application, output tails.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

pub const TAIL_CHARS: usize = 400;

/// Recursively copy a directory tree.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("failed to create directory {}", dst.display()))?;
    for entry in fs::read_dir(src)
        .with_context(|| format!("failed to read directory {}", src.display()))?
    {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

/// Write `new_contents` at `file_path` under `root`, creating parent
/// directories as needed. Returns the previous contents, empty for a new file.
pub fn stage_change(root: &Path, file_path: &str, new_contents: &str) -> Result<String> {
    let target = root.join(file_path);
    let old = if target.exists() {
        fs::read_to_string(&target)
            .with_context(|| format!("failed to read {}", target.display()))?
    } else {
        String::new()
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(&target, new_contents)
        .with_context(|| format!("failed to write {}", target.display()))?;
    Ok(old)
}

/// Last `max_chars` characters of `text`, on a character boundary.
pub fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else {
        text.chars().skip(count - max_chars).collect()
    }
}
