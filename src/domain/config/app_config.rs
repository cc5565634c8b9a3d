//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::duration::Duration;

/// Default note service address
pub const DEFAULT_API_URL: &str = "http://localhost:8200";

/// Default playback skip step in seconds
pub const DEFAULT_SKIP_SECONDS: u64 = 10;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
    pub token: Option<String>,
    pub default_project: Option<String>,
    pub notify: Option<bool>,
    pub watch_timeout: Option<String>,
    pub skip_seconds: Option<u64>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            ws_url: None,
            token: None,
            default_project: None,
            notify: Some(false),
            watch_timeout: None,
            skip_seconds: Some(DEFAULT_SKIP_SECONDS),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            api_url: other.api_url.or(self.api_url),
            ws_url: other.ws_url.or(self.ws_url),
            token: other.token.or(self.token),
            default_project: other.default_project.or(self.default_project),
            notify: other.notify.or(self.notify),
            watch_timeout: other.watch_timeout.or(self.watch_timeout),
            skip_seconds: other.skip_seconds.or(self.skip_seconds),
        }
    }

    /// REST base URL without a trailing slash
    pub fn api_url_or_default(&self) -> String {
        self.api_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Socket base URL; derived from the REST URL when unset
    pub fn ws_url_or_default(&self) -> String {
        if let Some(url) = self.ws_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        derive_ws_url(&self.api_url_or_default())
    }

    /// Get notify setting, or false if not set
    pub fn notify_or_default(&self) -> bool {
        self.notify.unwrap_or(false)
    }

    /// Watch timeout, or None for an indefinite wait. Invalid values are
    /// treated as unset.
    pub fn watch_timeout_or_default(&self) -> Option<Duration> {
        self.watch_timeout.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get skip step, or 10 seconds if not set
    pub fn skip_seconds_or_default(&self) -> u64 {
        self.skip_seconds
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_SKIP_SECONDS)
    }

    /// Stored token, ignoring blanks
    pub fn token(&self) -> Option<String> {
        self.token.clone().filter(|t| !t.trim().is_empty())
    }
}

/// Swap an http(s) scheme for the matching ws(s) scheme
pub fn derive_ws_url(api_url: &str) -> String {
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert_eq!(config.api_url.as_deref(), Some(DEFAULT_API_URL));
        assert!(config.ws_url.is_none());
        assert!(config.token.is_none());
        assert_eq!(config.notify, Some(false));
        assert!(config.watch_timeout.is_none());
        assert_eq!(config.skip_seconds, Some(10));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.api_url.is_none());
        assert!(config.default_project.is_none());
        assert!(config.notify.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            api_url: Some("http://base".to_string()),
            token: Some("base_token".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            api_url: Some("http://other".to_string()),
            token: None,
            ..Default::default()
        };

        let merged = base.merge(other);

        assert_eq!(merged.api_url.as_deref(), Some("http://other"));
        assert_eq!(merged.token.as_deref(), Some("base_token"));
    }

    #[test]
    fn ws_url_is_derived_from_api_url() {
        let config = AppConfig {
            api_url: Some("https://notes.example.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_url_or_default(), "https://notes.example.com");
        assert_eq!(config.ws_url_or_default(), "wss://notes.example.com");

        let local = AppConfig::defaults();
        assert_eq!(local.ws_url_or_default(), "ws://localhost:8200");
    }

    #[test]
    fn explicit_ws_url_wins() {
        let config = AppConfig {
            api_url: Some("http://api:8200".to_string()),
            ws_url: Some("ws://push:9000".to_string()),
            ..Default::default()
        };
        assert_eq!(config.ws_url_or_default(), "ws://push:9000");
    }

    #[test]
    fn watch_timeout_parses_or_stays_unset() {
        let config = AppConfig {
            watch_timeout: Some("5m".to_string()),
            ..Default::default()
        };
        assert_eq!(config.watch_timeout_or_default().map(|d| d.as_secs()), Some(300));

        let invalid = AppConfig {
            watch_timeout: Some("soon".to_string()),
            ..Default::default()
        };
        assert!(invalid.watch_timeout_or_default().is_none());
        assert!(AppConfig::empty().watch_timeout_or_default().is_none());
    }

    #[test]
    fn skip_seconds_falls_back_on_zero() {
        let config = AppConfig {
            skip_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(config.skip_seconds_or_default(), 10);
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = AppConfig {
            token: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(config.token().is_none());
    }
}
