use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SandboxConfig {
    #[serde(default = "default_template_dir")]
    pub template_dir: String,

    #[serde(default = "default_test_command")]
    pub test_command: String,

    #[serde(default = "default_local_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub repo_url: String,

    #[serde(default = "default_test_command")]
    pub test_command: String,

    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_api_key_file")]
    pub api_key_file: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_template_dir() -> String {
    "./template".to_string()
}

fn default_test_command() -> String {
    "pytest -q".to_string()
}

fn default_local_timeout() -> u64 {
    30
}

fn default_remote_timeout() -> u64 {
    60
}

fn default_db_path() -> String {
    "./verdict.db".to_string()
}

fn default_api_key_file() -> String {
    "~/.config/verdict/openrouter_key".to_string()
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            template_dir: default_template_dir(),
            test_command: default_test_command(),
            timeout_secs: default_local_timeout(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            repo_url: String::new(),
            test_command: default_test_command(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key_file: default_api_key_file(),
            model: default_model(),
        }
    }
}

/// Load config from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse TOML config")?;

        Ok(config)
    } else {
        Ok(Config::default())
    }
}
