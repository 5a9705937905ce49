//! On-disk configuration
//!
//! A TOML file under the platform config dir names the spreadsheet, the
//! acting user, and the retry policy. The API token can live in the file or
//! come from the environment (a `.env` file is honored at startup).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::api::RetryConfig;

/// Environment variable consulted when the config file carries no token.
pub const TOKEN_ENV: &str = "SEMEAR_SHEETS_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Id of the shared spreadsheet that is the whole store.
    pub spreadsheet_id: String,
    /// The acting user (mentor or student).
    pub username: String,
    /// Bearer token for the store API. Prefer `SEMEAR_SHEETS_TOKEN` over
    /// putting credentials in the file.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Retry knobs as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

impl AppConfig {
    /// `<config dir>/semear/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("could not determine the platform config dir")?;
        Ok(base.join("semear").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// The token from the file, or from the environment.
    pub fn token(&self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.is_empty() => Ok(token),
            _ => bail!(
                "no API token configured: set `token` in the config file or export {}",
                TOKEN_ENV
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_minimal_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "spreadsheet_id = \"abc123\"\nusername = \"mentor\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.spreadsheet_id, "abc123");
        assert_eq!(config.username, "mentor");
        assert!(config.token.is_none());
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.retry.jitter);
    }

    #[test]
    fn retry_settings_override_and_convert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            concat!(
                "spreadsheet_id = \"abc123\"\n",
                "username = \"mentor\"\n",
                "token = \"tok\"\n",
                "[retry]\n",
                "max_attempts = 5\n",
                "base_delay_ms = 100\n",
            ),
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.token().unwrap(), "tok");

        let retry = config.retry.to_retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay, Duration::from_millis(100));
        // Unspecified knobs keep their defaults.
        assert_eq!(retry.max_delay, Duration::from_millis(30_000));
    }

    #[test]
    fn missing_file_is_an_error_with_the_path() {
        let err = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.toml"));
    }
}
