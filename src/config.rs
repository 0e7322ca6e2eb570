use std::{env, path::PathBuf, time::Duration};
use dotenv::dotenv;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a number, got {0:?}")]
    InvalidPort(String),

    #[error("UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub host: String,
    /// Base URL the inbound path is appended to, without a trailing slash.
    pub upstream_base_url: String,
    pub log_dir: PathBuf,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    /// Loads `.env` if present and overlays environment variables on the defaults.
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let mut config = Self::default();

        if let Ok(port) = env::var("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(base_url) = env::var("UPSTREAM_BASE_URL") {
            config = config.with_upstream_base_url(base_url);
        }
        if let Ok(log_dir) = env::var("LOG_DIR") {
            config.log_dir = PathBuf::from(log_dir);
        }
        if let Ok(secs) = env::var("UPSTREAM_TIMEOUT_SECS") {
            let parsed = secs
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(secs))?;
            config.upstream_timeout = Duration::from_secs(parsed);
        }

        Ok(config)
    }

    pub fn with_upstream_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.upstream_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5001,
            host: "0.0.0.0".to_string(),
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}
