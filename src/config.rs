//! Client configuration loaded from environment variables.
//!
//! Everything except the backend URL has a sensible default so the binary
//! works out of the box against a local Academy backend.

use std::env;
use std::path::PathBuf;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Academy backend (no trailing slash)
    pub api_base_url: String,
    /// Directory holding persisted tokens and the cached user record.
    /// `None` means persistence is unavailable and the session is in-memory only.
    pub data_dir: Option<PathBuf>,
    /// Loopback port for the OAuth callback listener
    pub callback_port: u16,
    /// How long to wait for the browser round-trip before giving up
    pub login_timeout_secs: u64,
    /// Transport-error retries before a failed refresh discards credentials
    pub refresh_retries: u32,
    /// Initial delay between refresh retries (doubles per attempt)
    pub refresh_retry_delay_ms: u64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            data_dir: None,
            callback_port: 8970,
            login_timeout_secs: 300,
            refresh_retries: 2,
            refresh_retry_delay_ms: 250,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `ACADEMY_API_URL` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            api_base_url: env::var("ACADEMY_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("ACADEMY_API_URL"))?,
            data_dir: env::var("ACADEMY_DATA_DIR")
                .map(PathBuf::from)
                .ok()
                .or_else(default_data_dir),
            callback_port: env::var("ACADEMY_CALLBACK_PORT")
                .unwrap_or_else(|_| "8970".to_string())
                .parse()
                .unwrap_or(8970),
            login_timeout_secs: env::var("ACADEMY_LOGIN_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            refresh_retries: env::var("ACADEMY_REFRESH_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),
            refresh_retry_delay_ms: env::var("ACADEMY_REFRESH_RETRY_DELAY_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .unwrap_or(250),
        })
    }
}

/// Default data directory: `~/.academy`.
fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".academy"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
