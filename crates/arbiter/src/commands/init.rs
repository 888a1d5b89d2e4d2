use anyhow::Result;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Verdict Configuration
version = 1

[sandbox]
template_dir = "./template"
test_command = "pytest -q"
timeout_secs = 30

[remote]
enabled = false
repo_url = ""
test_command = "pytest -q"
timeout_secs = 60

[store]
db_path = "./verdict.db"

[gateway]
allowed_origins = []

[webhook]
url = ""

[enrichment]
enabled = false
api_key_file = "~/.config/verdict/openrouter_key"
model = "anthropic/claude-3.5-sonnet"
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}
