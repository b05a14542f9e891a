// src/extract/params.rs
//
// Parameter validators run by the handlers after extraction. Messages are
// shown to the user verbatim.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::address::{extract_transaction_hash, extract_wallet_address, is_valid_transaction_hash,
    is_valid_wallet_address, ChainFamily};
use super::chain::{extract_chain_id, is_valid_chain_id, is_valid_chain_list};
use super::time::{is_valid_time_period, is_valid_timestamp};

pub const MAX_CHAINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(error.into()) }
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Invalid parameters")
    }
}

fn missing(name: &str) -> ValidationResult {
    ValidationResult::fail(format!("Missing required parameter: {}", name))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Presence-only check, in the order given.
pub fn validate_required(params: &[(&str, Option<&str>)]) -> ValidationResult {
    for (name, value) in params {
        if present(*value).is_none() {
            return missing(name);
        }
    }
    ValidationResult::ok()
}

fn check_address(address: &str) -> Option<ValidationResult> {
    (!is_valid_wallet_address(address, None))
        .then(|| ValidationResult::fail(format!("Invalid wallet address: {}", address)))
}

fn check_chain(chain: &str) -> Option<ValidationResult> {
    (!is_valid_chain_id(chain)).then(|| ValidationResult::fail(format!("Invalid chain ID: {}", chain)))
}

fn check_limit(limit: Option<i64>) -> Option<ValidationResult> {
    limit.filter(|n| *n <= 0).map(|n| {
        ValidationResult::fail(format!("Invalid limit: {}. Must be a positive number.", n))
    })
}

pub fn validate_all_user_defi_positions_params(user_address: Option<&str>) -> ValidationResult {
    let Some(address) = present(user_address) else {
        return missing("userAddress");
    };
    check_address(address).unwrap_or_else(ValidationResult::ok)
}

pub fn validate_defi_positions_by_chain_params(user_address: Option<&str>, chain: Option<&str>) -> ValidationResult {
    let Some(address) = present(user_address) else {
        return missing("userAddress");
    };
    let Some(chain) = present(chain) else {
        return missing("chain");
    };
    check_address(address)
        .or_else(|| check_chain(chain))
        .unwrap_or_else(ValidationResult::ok)
}

pub fn validate_defi_positions_by_multiple_chains_params(user_address: Option<&str>, chains: &[String]) -> ValidationResult {
    let Some(address) = present(user_address) else {
        return missing("userAddress");
    };
    if chains.is_empty() {
        return missing("chains");
    }
    if let Some(fail) = check_address(address) {
        return fail;
    }
    let list = chains.join(",");
    if !is_valid_chain_list(&list, MAX_CHAINS) {
        return ValidationResult::fail(format!(
            "Invalid chain list: {}. Must be comma-separated list of valid chain IDs, maximum {}.",
            list, MAX_CHAINS
        ));
    }
    ValidationResult::ok()
}

pub fn validate_defi_positions_by_protocol_params(user_address: Option<&str>, protocol: Option<&str>) -> ValidationResult {
    if present(user_address).is_none() {
        return missing("userAddress");
    }
    match protocol {
        None => missing("protocol"),
        Some(p) if p.trim().is_empty() => ValidationResult::fail("Protocol cannot be empty"),
        Some(_) => ValidationResult::ok(),
    }
}

pub fn validate_tx_history_by_chain_extended_params(
    user_address: Option<&str>,
    chain: Option<&str>,
    start_time: Option<i64>,
    limit: Option<i64>,
) -> ValidationResult {
    let Some(address) = present(user_address) else {
        return missing("userAddress");
    };
    let Some(chain) = present(chain) else {
        return missing("chain");
    };
    if let Some(fail) = check_address(address).or_else(|| check_chain(chain)) {
        return fail;
    }
    if let Some(start) = start_time.filter(|t| !is_valid_timestamp(*t)) {
        return ValidationResult::fail(format!("Invalid startTime: {}", start));
    }
    check_limit(limit).unwrap_or_else(ValidationResult::ok)
}

pub fn validate_tx_by_period_params(
    user_address: Option<&str>,
    start_time: Option<i64>,
    end_time: Option<i64>,
    limit: Option<i64>,
) -> ValidationResult {
    let Some(address) = present(user_address) else {
        return missing("userAddress");
    };
    let Some(start) = start_time else {
        return missing("startTime");
    };
    let Some(end) = end_time else {
        return missing("endTime");
    };
    if let Some(fail) = check_address(address) {
        return fail;
    }
    if !is_valid_time_period(start, end) {
        return ValidationResult::fail(format!(
            "Invalid time period: startTime ({}) should be the more recent date and endTime ({}) should be the earlier date.",
            start, end
        ));
    }
    check_limit(limit).unwrap_or_else(ValidationResult::ok)
}

pub fn validate_transaction_by_hash_params(
    user_address: Option<&str>,
    chain: Option<&str>,
    hash: Option<&str>,
) -> ValidationResult {
    let Some(address) = present(user_address) else {
        return missing("userAddress");
    };
    let Some(chain) = present(chain) else {
        return missing("chain");
    };
    let Some(hash) = present(hash) else {
        return missing("hash");
    };
    if let Some(fail) = check_address(address).or_else(|| check_chain(chain)) {
        return fail;
    }
    if !is_valid_transaction_hash(hash, chain) {
        return ValidationResult::fail(format!("Invalid transaction hash for chain {}: {}", chain, hash));
    }
    ValidationResult::ok()
}

/// Pulls `userAddress`, `chain` and `hash` out of free text. Returns `None`
/// as soon as a required one cannot be found.
pub fn parse_params_from_text(text: &str, required: &[&str]) -> Option<HashMap<String, String>> {
    let mut params = HashMap::new();

    if required.contains(&"userAddress") {
        let Some(address) = extract_wallet_address(text) else {
            debug!("Required userAddress not found in text");
            return None;
        };
        params.insert("userAddress".to_string(), address);
    }

    if required.contains(&"chain") {
        let Some(chain) = extract_chain_id(text) else {
            debug!("Required chain not found in text");
            return None;
        };
        params.insert("chain".to_string(), chain);
    }

    if required.contains(&"hash") {
        let family = params
            .get("chain")
            .map(|c| ChainFamily::of(c))
            .unwrap_or(ChainFamily::Evm);
        let Some(hash) = extract_transaction_hash(text, family) else {
            debug!("Required hash not found in text");
            return None;
        };
        params.insert("hash".to_string(), hash);
    }

    Some(params)
}
