//! Runtime configuration for the Tracker.gg client.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the caller). The API key is optional at load time so read-only
//! commands work without it; the client refuses to fetch without one.

use std::collections::HashMap;
use std::env;
use std::fmt;

use thiserror::Error;

/// Default Tracker.gg public API base URL.
pub const DEFAULT_BASE_URL: &str = "https://public-api.tracker.gg/v2";
/// Region used when the caller does not provide one.
pub const DEFAULT_REGION: &str = "eu";
/// `User-Agent` sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("tracksync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_region: String,
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_region: DEFAULT_REGION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TrackerConfig")
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("base_url", &self.base_url)
            .field("default_region", &self.default_region)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = optional_trimmed(&lookup, "TRACKER_GG_API_KEY");

        let base_url = api_base_url(&value_or_default(
            &lookup,
            "TRACKER_GG_BASE_URL",
            DEFAULT_BASE_URL,
        ))?;

        let default_region = value_or_default(&lookup, "TRACKER_GG_REGION", DEFAULT_REGION);
        if !default_region
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(ConfigError::Invalid(format!(
                "TRACKER_GG_REGION contains unsupported characters: {default_region}"
            )));
        }

        let user_agent = value_or_default(&lookup, "TRACKER_GG_USER_AGENT", DEFAULT_USER_AGENT);

        Ok(Self {
            api_key,
            base_url,
            default_region: default_region.to_ascii_lowercase(),
            user_agent,
        })
    }

    /// Returns the API key or a configuration error when none is set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingVar("TRACKER_GG_API_KEY"))
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Accepts an http(s) base URL and drops trailing slashes so paths can be appended.
fn api_base_url(raw: &str) -> Result<String, ConfigError> {
    let scheme_ok = ["http://", "https://"].iter().any(|scheme| {
        raw.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if !scheme_ok {
        return Err(ConfigError::Invalid(
            "TRACKER_GG_BASE_URL must start with http:// or https://".to_string(),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
