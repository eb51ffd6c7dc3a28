//! Gateway settings, resolved once at startup and handed to the client.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.lumalabs.ai/dream-machine/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const API_KEY_ENV: &str = "LUMA_API_KEY";
pub const BASE_URL_ENV: &str = "LUMA_BASE_URL";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Bearer token used when a call does not carry its own.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Defaults overlaid with `LUMA_API_KEY` and `LUMA_BASE_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::default()
            .with_api_key(lookup(API_KEY_ENV))
            .with_base_url(lookup(BASE_URL_ENV))
    }

    /// Replace the credential; empty strings count as absent.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = non_empty(api_key) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = non_empty(base_url) {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_dream_machine() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "https://api.lumalabs.ai/dream-machine/v1");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let settings = Settings::default()
            .with_api_key(Some("  ".into()))
            .with_base_url(Some(String::new()));
        assert!(settings.api_key.is_none());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        let settings = Settings::default().with_base_url(Some("http://localhost:9000/v1/".into()));
        assert_eq!(settings.base_url, "http://localhost:9000/v1");
    }

    #[test]
    fn env_values_overlay_defaults() {
        let settings = Settings::from_lookup(|name| match name {
            "LUMA_API_KEY" => Some("env-key".into()),
            "LUMA_BASE_URL" => Some("https://staging.example/v1/".into()),
            _ => None,
        });
        assert_eq!(settings.api_key.as_deref(), Some("env-key"));
        assert_eq!(settings.base_url, "https://staging.example/v1");
    }

    #[test]
    fn empty_env_values_are_absent() {
        let settings = Settings::from_lookup(|_| Some(String::new()));
        assert!(settings.api_key.is_none());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn later_key_wins() {
        let settings = Settings::default()
            .with_api_key(Some("first".into()))
            .with_api_key(Some("second".into()));
        assert_eq!(settings.api_key.as_deref(), Some("second"));
    }
}
