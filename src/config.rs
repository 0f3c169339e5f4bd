//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup; every component receives an explicit handle
//! instead of reading ambient globals.

use std::env;

/// Minimum seconds between committed position writes per flight.
const DEFAULT_SYNC_MIN_INTERVAL_SECS: u64 = 10;

/// Seconds a cached course layout stays fresh before a reload.
const DEFAULT_LAYOUT_CACHE_TTL_SECS: u64 = 300;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Debounce window for position sync (seconds)
    pub sync_min_interval_secs: u64,
    /// Course layout cache TTL (seconds)
    pub layout_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            sync_min_interval_secs: env::var("SYNC_MIN_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SYNC_MIN_INTERVAL_SECS),
            layout_cache_ttl_secs: env::var("LAYOUT_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LAYOUT_CACHE_TTL_SECS),
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            sync_min_interval_secs: DEFAULT_SYNC_MIN_INTERVAL_SECS,
            layout_cache_ttl_secs: DEFAULT_LAYOUT_CACHE_TTL_SECS,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::test_default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.sync_min_interval_secs, 10);
        assert_eq!(config.layout_cache_ttl_secs, 300);
    }
}
