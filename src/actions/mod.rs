// src/actions/mod.rs
//
// Chat actions over the Datai API. Every action follows the same flow:
// extract parameters, check the API key, GET one endpoint, format, reply.

pub mod balances;
pub mod defi_positions;
pub mod nft;
pub mod solana;
pub mod transactions;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::datai::endpoints::API_KEY_ENV_VAR;
use crate::datai::{ApiResponse, DataiApiClient};
use crate::runtime::AgentRuntime;

// --- Messages and replies ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// An incoming chat message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Memory {
    pub content: MessageContent,
}

impl Memory {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { content: MessageContent { text: Some(text.into()) } }
    }

    pub fn text(&self) -> &str {
        self.content.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionContent {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What a handler hands to its callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub text: String,
    pub content: ActionContent,
}

impl ActionResponse {
    pub fn success(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            content: ActionContent { success: true, data: Some(data), error: None },
        }
    }

    pub fn failure(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            content: ActionContent { success: false, data: None, error: Some(error.into()) },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionExample {
    pub name: &'static str,
    pub text: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
}

/// A user prompt and the agent's reply that triggers `action`.
pub fn exchange(prompt: &'static str, reply: &'static str, action: &'static str) -> Vec<ActionExample> {
    vec![
        ActionExample { name: "{{user1}}", text: prompt, action: None },
        ActionExample { name: "{{agentName}}", text: reply, action: Some(action) },
    ]
}

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn similes(&self) -> &[&'static str];

    fn description(&self) -> &'static str;

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        Vec::new()
    }

    /// Whether this action should handle `message`.
    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool;

    /// Runs the action, reporting through `callback`. Returns whether it
    /// succeeded.
    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        state: Option<&Value>,
        options: Option<&Value>,
        callback: Option<&mut (dyn FnMut(ActionResponse) + Send)>,
    ) -> bool;
}

pub fn all_actions() -> Vec<Box<dyn Action>> {
    vec![
        Box::new(defi_positions::AllUserDeFiPositionsAction),
        Box::new(defi_positions::UserDeFiPositionsByChainAction),
        Box::new(defi_positions::UserDeFiPositionsByMultipleChainsAction),
        Box::new(defi_positions::UserDeFiPositionsByProtocolAction),
        Box::new(balances::UserDeFiProtocolBalancesByChainAction),
        Box::new(balances::UserOverallBalanceAllChainsAction),
        Box::new(balances::WalletBalancesByChainAction),
        Box::new(balances::TokenBalancesByChainAction),
        Box::new(balances::UserOverallBalanceByChainAction),
        Box::new(balances::NativeTokenBalanceByChainAction),
        Box::new(balances::GroupedTokenBalancesByMultipleChainsAction),
        Box::new(nft::UserNftsListAction),
        Box::new(nft::UserNftsByChainAction),
        Box::new(transactions::UserTxHistoryAllExtendedAction),
        Box::new(transactions::UserTransactionsByChainAction),
        Box::new(transactions::UserTxHistoryAllChainsShortAction),
        Box::new(transactions::UserTxHistoryByChainRawLabelAction),
        Box::new(solana::SolanaUserTxHistoryExtendedAction),
        Box::new(solana::SolanaUserTxHistoryShortAction),
        Box::new(transactions::UserTxByPeriodAndChainExtendedAction),
        Box::new(transactions::UserTxByPeriodAndChainRawLabel20Action),
        Box::new(transactions::TransactionByHashAction),
        Box::new(transactions::TransactionTransfersByHashAction),
        Box::new(transactions::TransactionsForDeFiPositionAction),
        Box::new(transactions::UserTransactionOverviewAction),
    ]
}

// --- Shared handler plumbing ---

pub fn api_key(runtime: &dyn AgentRuntime) -> Option<String> {
    runtime.get_setting(API_KEY_ENV_VAR)
}

pub fn option_u32(options: Option<&Value>, key: &str) -> Option<u32> {
    let v = options?.get(key)?;
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

pub fn option_i64(options: Option<&Value>, key: &str) -> Option<i64> {
    let v = options?.get(key)?;
    v.as_i64()
        .or_else(|| v.as_f64().map(|f| f as i64))
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

pub fn option_str<'a>(options: Option<&'a Value>, key: &str) -> Option<&'a str> {
    options?.get(key)?.as_str().filter(|s| !s.is_empty())
}

/// Wraps the optional callback and implements the reply tiers every
/// handler shares.
pub struct Reply<'a> {
    callback: Option<&'a mut (dyn FnMut(ActionResponse) + Send)>,
}

impl<'a> Reply<'a> {
    pub fn new(callback: Option<&'a mut (dyn FnMut(ActionResponse) + Send)>) -> Self {
        Self { callback }
    }

    pub fn send(&mut self, response: ActionResponse) {
        match self.callback.as_mut() {
            Some(cb) => cb(response),
            None => debug!("No callback provided for response: {}", response.text),
        }
    }

    /// Clarifying prompt for missing or invalid user input.
    pub fn prompt(&mut self, text: impl Into<String>, error: impl Into<String>) -> bool {
        self.send(ActionResponse::failure(text, error));
        false
    }

    pub fn success(&mut self, text: impl Into<String>, data: Value) -> bool {
        self.send(ActionResponse::success(text, data));
        true
    }

    /// Client from runtime settings, or the missing-key reply.
    pub fn client(&mut self, runtime: &dyn AgentRuntime) -> Option<DataiApiClient> {
        match DataiApiClient::from_runtime(runtime) {
            Ok(client) => Some(client),
            Err(e) => {
                error!("Missing API key: {} ({})", API_KEY_ENV_VAR, e);
                self.send(ActionResponse::failure(
                    format!(
                        "Error: API key not found. Please configure the {} environment variable.",
                        API_KEY_ENV_VAR
                    ),
                    format!("Missing API key: {}", API_KEY_ENV_VAR),
                ));
                None
            }
        }
    }

    /// Unwraps an upstream response or replies `Error fetching <subject>`.
    pub fn fetched(&mut self, response: ApiResponse<Value>, subject: &str) -> Option<Value> {
        if response.success {
            return Some(response.data.unwrap_or(Value::Null));
        }
        let message = response
            .error
            .unwrap_or_else(|| "Unknown API error".to_string());
        error!("Error fetching {}: {}", subject, message);
        self.send(ActionResponse::failure(
            format!("Error fetching {}: {}", subject, message),
            message,
        ));
        None
    }

    /// Decodes upstream JSON for formatting. `null` decodes to the default.
    /// Failures reply `Failed to retrieve <subject>`.
    pub fn decode<T: DeserializeOwned + Default>(&mut self, data: &Value, subject: &str) -> Option<T> {
        if data.is_null() {
            return Some(T::default());
        }
        match serde_json::from_value::<T>(data.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                let err = crate::datai::DataiError::from(e);
                self.failed(subject, &err.to_string());
                None
            }
        }
    }

    pub fn failed(&mut self, subject: &str, message: &str) -> bool {
        error!("Failed to retrieve {}: {}", subject, message);
        self.send(ActionResponse::failure(
            format!("Failed to retrieve {}: {}", subject, message),
            message,
        ));
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;
    use serde_json::json;

    #[test]
    fn registry_names_are_unique() {
        let actions = all_actions();
        assert_eq!(actions.len(), 25);
        let mut names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 25);
        for action in &actions {
            assert!(!action.description().is_empty(), "{}", action.name());
            assert!(!action.similes().is_empty(), "{}", action.name());
            assert!(!action.examples().is_empty(), "{}", action.name());
        }
    }

    #[test]
    fn reads_options() {
        let opts = json!({"limit": 7, "hash": "0xabc", "startTime": "1700000000", "empty": ""});
        assert_eq!(option_u32(Some(&opts), "limit"), Some(7));
        assert_eq!(option_i64(Some(&opts), "startTime"), Some(1_700_000_000));
        assert_eq!(option_str(Some(&opts), "hash"), Some("0xabc"));
        assert_eq!(option_str(Some(&opts), "empty"), None);
        assert_eq!(option_u32(None, "limit"), None);
    }

    #[test]
    fn missing_key_reply() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        {
            let mut reply = Reply::new(Some(&mut cb));
            assert!(reply.client(&StaticRuntime::new()).is_none());
        }
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].text,
            "Error: API key not found. Please configure the DATAI_API_KEY environment variable."
        );
        assert_eq!(seen[0].content.error.as_deref(), Some("Missing API key: DATAI_API_KEY"));
    }

    #[test]
    fn upstream_failure_reply() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        {
            let mut reply = Reply::new(Some(&mut cb));
            let got = reply.fetched(ApiResponse::fail("API error: 503", Some(503)), "NFTs");
            assert!(got.is_none());
        }
        assert_eq!(seen[0].text, "Error fetching NFTs: API error: 503");
        assert!(!seen[0].content.success);
    }

    #[test]
    fn decode_failure_is_a_retrieve_error() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        {
            let mut reply = Reply::new(Some(&mut cb));
            let got: Option<Vec<String>> = reply.decode(&json!({"not": "a list"}), "NFTs");
            assert!(got.is_none());
            let empty: Option<Vec<String>> = reply.decode(&Value::Null, "NFTs");
            assert_eq!(empty, Some(vec![]));
        }
        assert!(seen[0].text.starts_with("Failed to retrieve NFTs: Failed to decode response:"));
    }
}
