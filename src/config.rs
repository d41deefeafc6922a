//! Runtime configuration for the Bitbucket upstream.
//!
//! Configuration is read once at startup from environment variables:
//! - `BITBUCKET_URL` - Base URL of the Bitbucket Server instance (required)
//! - `BITBUCKET_USERNAME` - User for HTTP basic auth (required)
//! - `BITBUCKET_PASSWORD` - Password or personal access token (required)
//! - `BITBUCKET_TIMEOUT_SECS` - Upstream request timeout (default: 30)
//!
//! A `.env` file in the working directory is loaded first when present.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

pub const URL_VAR: &str = "BITBUCKET_URL";
pub const USERNAME_VAR: &str = "BITBUCKET_USERNAME";
pub const PASSWORD_VAR: &str = "BITBUCKET_PASSWORD";
pub const TIMEOUT_VAR: &str = "BITBUCKET_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} is not a valid base URL: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Connection settings for the Bitbucket Server instance.
#[derive(Clone)]
pub struct Config {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if any).
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| -> Result<String, ConfigError> {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let raw_url = required(URL_VAR)?;
        let base_url = parse_base_url(&raw_url).ok_or(ConfigError::InvalidUrl {
            var: URL_VAR,
            value: raw_url.clone(),
        })?;

        let username = required(USERNAME_VAR)?;
        let password = required(PASSWORD_VAR)?;

        let timeout = match lookup(TIMEOUT_VAR).map(|v| v.trim().to_string()) {
            Some(value) if !value.is_empty() => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTimeout {
                        var: TIMEOUT_VAR,
                        value,
                    })
                }
            },
            _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            username,
            password,
            timeout,
        })
    }

    /// Create with explicit credentials and the default timeout.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url).ok_or(ConfigError::InvalidUrl {
            var: URL_VAR,
            value: base_url.to_string(),
        })?;
        Ok(Self {
            base_url,
            username: username.into(),
            password: password.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_base_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return None;
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            (URL_VAR, "https://bitbucket.example.com/"),
            (USERNAME_VAR, "alice"),
            (PASSWORD_VAR, "secret"),
        ]
    }

    #[test]
    fn loads_required_settings_with_default_timeout() {
        let config = Config::from_lookup(lookup(&complete())).unwrap();
        assert_eq!(config.base_url.as_str(), "https://bitbucket.example.com/");
        assert_eq!(config.username, "alice");
        assert_eq!(config.password, "secret");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn reports_the_first_missing_variable() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != USERNAME_VAR);
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(USERNAME_VAR));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let mut pairs = complete();
        pairs[2] = (PASSWORD_VAR, "   ");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing(PASSWORD_VAR));
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut pairs = complete();
        pairs[0] = (URL_VAR, "ftp://bitbucket.example.com");
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn parses_custom_timeout() {
        let mut pairs = complete();
        pairs.push((TIMEOUT_VAR, "5"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut pairs = complete();
        pairs.push((TIMEOUT_VAR, "0"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
    }

    #[test]
    fn debug_output_hides_password() {
        let config = Config::from_lookup(lookup(&complete())).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
