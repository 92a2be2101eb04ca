use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "jira_outline";
const ENV_PREFIX: &str = "JIRA_OUTLINE";

/// Runtime settings: built-in defaults, then `jira_outline.toml` (optional),
/// then `JIRA_OUTLINE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub api_token: String,
    pub model_id: String,
    pub user_id: String,
    pub timeout_secs: u64,
    pub db_path: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("api_url", "http://127.0.0.1:8910/gauss/chat")?
            .set_default("api_token", "")?
            .set_default("model_id", "Gauss2.2-37B-Instruct-250515")?
            .set_default("user_id", "")?
            .set_default("timeout_secs", 30)?
            .set_default("db_path", "data/jira_outline.sqlite")?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
