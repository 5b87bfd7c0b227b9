//! Application configuration loaded from environment variables.

use invite_core::tracking::TRACKING_CAP;

use crate::errors::{Result, ServerError};

#[derive(Debug, Clone)]
pub struct Config {
    /// Base under which `events/<slug>/config.json` is fetched
    pub config_base_url: String,
    /// Base for `events/<slug>/assets/<file>`; defaults to `config_base_url`
    pub asset_base_url: String,
    /// Absolute URL of the invitation page, used as the base of share links
    pub public_url: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the HTTP server
    pub api_port: u16,
    /// Timeout for the config fetch, in seconds
    pub fetch_timeout_secs: u64,
    /// Tracking records kept before the oldest are evicted
    pub tracking_cap: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config_base_url = env_var("CONFIG_BASE_URL").map_err(|_| {
            ServerError::Config("CONFIG_BASE_URL environment variable is required".to_string())
        })?;
        let api_port: u16 = env_var("API_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .map_err(|_| ServerError::Config("Invalid API_PORT".to_string()))?;

        Ok(Config {
            asset_base_url: env_var("ASSET_BASE_URL").unwrap_or_else(|_| config_base_url.clone()),
            public_url: env_var("PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{api_port}/")),
            config_base_url,
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./invite.db".to_string()),
            api_port,
            fetch_timeout_secs: env_var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .map_err(|_| ServerError::Config("Invalid FETCH_TIMEOUT_SECS".to_string()))?,
            tracking_cap: env_var("TRACKING_CAP")
                .unwrap_or_else(|_| TRACKING_CAP.to_string())
                .parse()
                .map_err(|_| ServerError::Config("Invalid TRACKING_CAP".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ServerError::Config(format!("Missing env var: {key}")))
}
