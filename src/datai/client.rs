// src/datai/client.rs

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use crate::datai::endpoints::{API_BASE_URL, API_KEY_ENV_VAR, API_KEY_HEADER, BASE_URL_ENV_VAR, TIMEOUT_ENV_VAR,
    TIMEOUT_MS};
use crate::datai::error::DataiError;
use crate::datai::models::ApiResponse;
use crate::runtime::AgentRuntime;

/// Thin GET-only wrapper around the Datai REST API. One request per call,
/// no retries, every failure folded into the returned envelope.
#[derive(Clone)]
pub struct DataiApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for DataiApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataiApiClient")
            .field("api_key", &key_preview(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn key_preview(key: &str) -> String {
    format!("{}...", key.chars().take(5).collect::<String>())
}

impl DataiApiClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<&str>, timeout_ms: Option<u64>) -> Self {
        let timeout = Duration::from_millis(timeout_ms.unwrap_or(TIMEOUT_MS));
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            error!("Failed to build HTTP client with {:?} timeout, using defaults: {}", timeout, e);
            Client::new()
        });
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url
                .unwrap_or(API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Builds a client from the runtime settings. Fails only when no API key
    /// is configured.
    pub fn from_runtime(runtime: &dyn AgentRuntime) -> Result<Self, DataiError> {
        let api_key = runtime
            .get_setting(API_KEY_ENV_VAR)
            .ok_or(DataiError::MissingApiKey)?;
        let base_url = runtime.get_setting(BASE_URL_ENV_VAR);
        let timeout = runtime
            .get_setting(TIMEOUT_ENV_VAR)
            .and_then(|t| t.trim().parse().ok());
        Ok(Self::new(api_key, base_url.as_deref(), timeout))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GETs `endpoint` and returns the JSON body untouched.
    pub async fn get_json(&self, endpoint: &str) -> ApiResponse<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Making API request to {}", url);
        debug!("Setting Authorization header: {}={}", API_KEY_HEADER, key_preview(&self.api_key));

        let res = match self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                error!("{}: API request failed for endpoint {}: {}", DataiError::Network, endpoint, e);
                return ApiResponse::fail(format!("API request failed: {}", e), None);
            }
        };

        let status = res.status();
        let is_json = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);
        let body = match res.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Failed reading response body from {}: {}", endpoint, e);
                return ApiResponse::fail(format!("API request failed: {}", e), Some(status.as_u16()));
            }
        };
        debug!("API Response status: {}", status.as_u16());

        if !is_json {
            error!("API returned non-JSON response: {}", body);
            let preview: String = body.chars().take(100).collect();
            let ellipsis = if body.chars().count() > 100 { "..." } else { "" };
            return ApiResponse::fail(
                format!("API returned non-JSON response: {}{}", preview, ellipsis),
                Some(status.as_u16()),
            );
        }

        let data: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                error!("Invalid JSON from {}: {}", endpoint, e);
                return ApiResponse::fail(DataiError::from(e).to_string(), Some(status.as_u16()));
            }
        };

        if !status.is_success() {
            let message = ["error", "message"]
                .iter()
                .find_map(|k| data.get(*k).and_then(upstream_message))
                .unwrap_or_else(|| format!("API error: {}", status.as_u16()));
            error!(status = status.as_u16(), endpoint, "Datai API Error: {}", message);
            return ApiResponse::fail(message, Some(status.as_u16()));
        }

        debug!(
            "API Response data items: {}",
            data.as_array()
                .map(|a| a.len().to_string())
                .unwrap_or_else(|| "not an array".to_string())
        );
        ApiResponse::ok(data, status.as_u16())
    }

    /// GETs `endpoint` and decodes the body into `T`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResponse<T> {
        let raw = self.get_json(endpoint).await;
        match (raw.success, raw.data) {
            (true, Some(data)) => match serde_json::from_value::<T>(data) {
                Ok(decoded) => ApiResponse {
                    success: true,
                    data: Some(decoded),
                    error: None,
                    status_code: raw.status_code,
                },
                Err(e) => ApiResponse::fail(DataiError::from(e).to_string(), raw.status_code),
            },
            (_, _) => ApiResponse {
                success: false,
                data: None,
                error: raw.error,
                status_code: raw.status_code,
            },
        }
    }
}

fn upstream_message(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Null | Value::String(_) => None,
        other => Some(other.to_string()),
    }
}
