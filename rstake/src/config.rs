use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{RstakeError, Result};

/// Default storage key for the bearer token.
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";
/// Default interval between pending-invoice polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Upper bound on a single HTTP request, connect to last body byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Delay between a confirmed deposit and the balance reload.
pub const DEFAULT_BALANCE_RELOAD_DELAY: Duration = Duration::from_secs(1);

/// Configuration for the staking client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the staking API (e.g. `https://app.example.com/api`).
    pub base_url: String,
    /// Storage key under which the bearer token is persisted.
    pub token_key: String,
    /// JSON file backing the persistent key-value store.
    pub storage_path: PathBuf,
    /// Interval between pending-invoice polls.
    pub poll_interval: Duration,
    /// Pause before reloading the balance after a confirmed deposit.
    pub balance_reload_delay: Duration,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            storage_path: default_storage_path(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            balance_reload_delay: DEFAULT_BALANCE_RELOAD_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, loading `.env` if present.
    ///
    /// Recognised variables: `RSTAKE_API_URL`, `RSTAKE_AUTH_TOKEN_KEY`,
    /// `RSTAKE_STORAGE_PATH`, `RSTAKE_POLL_INTERVAL_SECS`. Anything unset
    /// keeps its default.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RSTAKE_API_URL") {
            config.base_url = url;
        }
        if let Ok(key) = std::env::var("RSTAKE_AUTH_TOKEN_KEY") {
            if !key.is_empty() {
                config.token_key = key;
            }
        }
        if let Ok(path) = std::env::var("RSTAKE_STORAGE_PATH") {
            config.storage_path = PathBuf::from(path);
        }
        if let Ok(secs) = std::env::var("RSTAKE_POLL_INTERVAL_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                RstakeError::Config(format!("RSTAKE_POLL_INTERVAL_SECS is not a number: {secs}"))
            })?;
            config.poll_interval = Duration::from_secs(secs.max(1));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(RstakeError::Config(format!(
                "unsupported URL scheme '{other}' in {}",
                self.base_url
            ))),
        }
    }
}

fn default_storage_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rstake")
        .join("storage.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.token_key, "auth_token");
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let config = ClientConfig {
            base_url: "/api".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RstakeError::Url(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let config = ClientConfig {
            base_url: "ftp://example.com".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RstakeError::Config(_))));
    }
}
