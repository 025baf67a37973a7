use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bayes::RetryPolicy;

const APP_NAME: &str = "esports_wiki_cogs";
const CONFIG_FILE: &str = "config.json";

/// Default base URL of the Bayes API
pub const DEFAULT_BASE_URL: &str = "https://emh-api.bayesesports.com/";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL every endpoint is appended to; keep the trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Where the session is persisted; defaults to `bayes.json` in the config dir
    #[serde(default)]
    pub session_file: Option<PathBuf>,
    /// Attempts per call when rate limited, 0 retries forever
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    #[serde(default = "default_retry_initial_backoff")]
    pub retry_initial_backoff_ms: u64,
    #[serde(default = "default_retry_max_backoff")]
    pub retry_max_backoff_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_retry_max_attempts() -> u32 {
    8
}

fn default_retry_initial_backoff() -> u64 {
    500
}

fn default_retry_max_backoff() -> u64 {
    30_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_file: None,
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff(),
            retry_max_backoff_ms: default_retry_max_backoff(),
        }
    }
}

impl Config {
    /// Builds the retry policy described by this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        let max_attempts = (self.retry_max_attempts > 0).then_some(self.retry_max_attempts);
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(self.retry_initial_backoff_ms),
            Duration::from_millis(self.retry_max_backoff_ms),
        )
    }
}

/// Configuration manager
pub struct ConfigManager {
    config: Config,
}

impl ConfigManager {
    /// Loads the configuration from the default location
    pub fn new() -> Result<Self> {
        let config_file = Self::config_dir()?.join(CONFIG_FILE);
        Self::load_from(&config_file)
    }

    /// Loads the configuration from a file, using defaults if it is missing or malformed
    pub fn load_from(config_file: &Path) -> Result<Self> {
        let config = if config_file.exists() {
            let data =
                std::fs::read_to_string(config_file).context("Failed to read config file")?;
            serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", config_file.display(), e);
                Config::default()
            })
        } else {
            Config::default()
        };

        Ok(Self { config })
    }

    /// Gets a copy of the current configuration
    pub fn get(&self) -> Config {
        self.config.clone()
    }

    /// Returns the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Config default values tests ===

    #[test]
    fn default_base_url_is_bayes() {
        let config = Config::default();
        assert_eq!(config.base_url, "https://emh-api.bayesesports.com/");
    }

    #[test]
    fn default_session_file_is_unset() {
        assert!(Config::default().session_file.is_none());
    }

    #[test]
    fn default_retry_policy_is_capped() {
        let policy = Config::default().retry_policy();

        assert_eq!(policy.max_attempts, Some(8));
        assert_eq!(policy.initial_backoff, Duration::from_millis(500));
        assert_eq!(policy.max_backoff, Duration::from_secs(30));
    }

    #[test]
    fn zero_attempts_means_unbounded() {
        let config = Config {
            retry_max_attempts: 0,
            ..Config::default()
        };
        assert_eq!(config.retry_policy().max_attempts, None);
    }

    // === Partial deserialization tests ===

    #[test]
    fn deserialize_empty_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.retry_max_attempts, 8);
        assert_eq!(config.retry_initial_backoff_ms, 500);
        assert_eq!(config.retry_max_backoff_ms, 30_000);
    }

    #[test]
    fn deserialize_partial_uses_defaults_for_missing() {
        let json = r#"{"base_url": "http://localhost:8080/", "retry_max_attempts": 2}"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.base_url, "http://localhost:8080/"); // Overridden
        assert_eq!(config.retry_max_attempts, 2); // Overridden
        assert_eq!(config.retry_initial_backoff_ms, 500); // Default
    }

    #[test]
    fn deserialize_ignores_unknown_fields() {
        let json = r#"{
            "retry_max_attempts": 3,
            "unknown_field": "should be ignored"
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.retry_max_attempts, 3);
    }

    // === ConfigManager tests ===

    #[test]
    fn load_missing_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load_from(&temp_dir.path().join("config.json")).unwrap();

        assert_eq!(manager.get().base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn load_reads_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"session_file": "/tmp/session.json"}"#).unwrap();

        let manager = ConfigManager::load_from(&path).unwrap();

        assert_eq!(
            manager.get().session_file,
            Some(PathBuf::from("/tmp/session.json"))
        );
    }

    #[test]
    fn load_malformed_file_uses_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "not json at all").unwrap();

        let manager = ConfigManager::load_from(&path).unwrap();

        assert_eq!(manager.get().retry_max_attempts, 8);
    }
}
