use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::api_client::DEFAULT_TIMEOUT;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_APP_ORIGIN: &str = "http://localhost:3000";
const STATE_DIR_NAME: &str = "ai-resume-analyzer";
const STATE_FILE_NAME: &str = "local-storage.json";

/// Client configuration loaded from environment variables.
/// Every variable is optional; malformed numbers fail at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// Origin that share links point at.
    pub app_origin: String,
    pub request_timeout: Duration,
    pub health_probe_delay: Duration,
    pub state_dir: PathBuf,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let state_dir = match lookup("RESUME_ANALYZER_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(STATE_DIR_NAME),
        };

        let timeout_secs = parse_or(
            &lookup,
            "RESUME_ANALYZER_TIMEOUT_SECS",
            DEFAULT_TIMEOUT.as_secs(),
        )?;
        if timeout_secs == 0 {
            anyhow::bail!("RESUME_ANALYZER_TIMEOUT_SECS must be at least 1 second");
        }

        Ok(Config {
            api_url: lookup("RESUME_ANALYZER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            app_origin: lookup("RESUME_ANALYZER_APP_ORIGIN")
                .unwrap_or_else(|| DEFAULT_APP_ORIGIN.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            health_probe_delay: Duration::from_millis(parse_or(
                &lookup,
                "HEALTH_PROBE_DELAY_MS",
                1000,
            )?),
            state_dir,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// File backing the durable state slot.
    pub fn state_file(&self) -> PathBuf {
        self.state_dir.join(STATE_FILE_NAME)
    }
}

fn parse_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<u64> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}
