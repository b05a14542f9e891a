// src/config.rs

use std::env;

use anyhow::{Context, Result};

use crate::datai::endpoints::{API_BASE_URL, API_KEY_ENV_VAR, BASE_URL_ENV_VAR, TIMEOUT_ENV_VAR, TIMEOUT_MS};
use crate::runtime::AgentRuntime;

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    /// Datai (Merlin) API key, sent verbatim in the `Authorization` header.
    /// Actions refuse to run without it.
    pub api_key: Option<String>,
    /// Base URL of the upstream API, overridable for staging or mocks.
    pub api_base_url: String,
    /// Static per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            api_key: None,
            api_base_url: API_BASE_URL.to_string(),
            request_timeout_ms: TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let api_key = env::var(API_KEY_ENV_VAR)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        let api_base_url = env::var(BASE_URL_ENV_VAR)
            .unwrap_or_else(|_| API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            api_key,
            api_base_url,
            request_timeout_ms: env::var(TIMEOUT_ENV_VAR)
                .unwrap_or_else(|_| TIMEOUT_MS.to_string())
                .parse()
                .context("DATAI_TIMEOUT_MS must be a valid number of milliseconds")?,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl AgentRuntime for Config {
    fn get_setting(&self, key: &str) -> Option<String> {
        match key {
            API_KEY_ENV_VAR => self.api_key.clone(),
            BASE_URL_ENV_VAR => Some(self.api_base_url.clone()),
            TIMEOUT_ENV_VAR => Some(self.request_timeout_ms.to_string()),
            other => env::var(other).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_public_api() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "https://api-v1.mymerlin.io");
        assert_eq!(config.request_timeout_ms, 140_000);
        assert!(!config.has_api_key());
    }

    #[test]
    fn settings_are_served_from_config() {
        let config = Config {
            api_key: Some("key-123".into()),
            api_base_url: "http://localhost:1234".into(),
            ..Config::default()
        };
        assert_eq!(config.get_setting("DATAI_API_KEY").as_deref(), Some("key-123"));
        assert_eq!(
            config.get_setting("DATAI_API_BASE_URL").as_deref(),
            Some("http://localhost:1234")
        );
        assert_eq!(config.get_setting("DATAI_TIMEOUT_MS").as_deref(), Some("140000"));
    }
}
