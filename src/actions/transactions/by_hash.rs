// src/actions/transactions/by_hash.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::info;

use super::{fee_display, non_empty, tx_date};
use crate::actions::{api_key, exchange, option_str, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{render, TRANSACTION_BY_HASH};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{extract_chain_id, extract_wallet_address, is_valid_wallet_address};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct TransactionByHashAction;

const NAME: &str = "GET_TRANSACTION_BY_HASH_DATAI";

lazy_static! {
    static ref EVM_HASH_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)transaction hash:?\s*(0x[a-fA-F0-9]{64})").unwrap(),
        Regex::new(r"(?i)tx hash:?\s*(0x[a-fA-F0-9]{64})").unwrap(),
        Regex::new(r"(?i)hash:?\s*(0x[a-fA-F0-9]{64})").unwrap(),
        Regex::new(r"(?i)(0x[a-fA-F0-9]{64})").unwrap(),
    ];
}

/// First 32-byte hex hash in the text, labelled forms first.
pub fn extract_evm_hash(text: &str) -> Option<String> {
    EVM_HASH_PATTERNS
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl Action for TransactionByHashAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_TX_BY_HASH_DATAI",
            "FETCH_TRANSACTION_DETAILS_DATAI",
            "LOOKUP_TRANSACTION_DATAI",
            "FIND_TX_BY_HASH_DATAI",
            "SHOW_TX_DETAILS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves detailed information for a specific transaction by its hash"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me the details for transaction hash 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf on Ethereum for wallet 0x218e312fF5181290A46e3f87A73A8aD40C05A944 on DATAI",
                "I'll look up the details for that transaction hash on Ethereum. One moment...",
                NAME,
            ),
            exchange(
                "What can you tell me about this transaction 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf on eth chain for my address 0x218e312fF5181290A46e3f87A73A8aD40C05A944 on DATAI?",
                "Let me fetch the details of that transaction on Ethereum for you...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        extract_wallet_address(text).is_some_and(|a| is_valid_wallet_address(&a, None))
            && extract_chain_id(text).is_some()
            && extract_evm_hash(text).is_some()
    }

    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        _state: Option<&Value>,
        options: Option<&Value>,
        callback: Option<&mut (dyn FnMut(ActionResponse) + Send)>,
    ) -> bool {
        let mut reply = Reply::new(callback);
        let text = message.text();
        let Some(address) = extract_wallet_address(text) else {
            return reply.prompt(
                "Please provide a valid wallet address to check transaction details. For example: \"Show me transaction 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf on ETH for wallet 0x218e312fF5181290A46e3f87A73A8aD40C05A944\"",
                "No wallet address provided",
            );
        };
        let Some(chain) = extract_chain_id(text) else {
            return reply.prompt(
                "Please specify which blockchain (e.g., \"eth\", \"bsc\", \"polygon\") the transaction is on.",
                "No chain ID provided",
            );
        };
        let Some(hash) = option_str(options, "hash").map(str::to_string).or_else(|| extract_evm_hash(text)) else {
            return reply.prompt(
                "Please provide a valid transaction hash to look up. For example: \"Show me details for transaction 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf\"",
                "No transaction hash provided",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching transaction {} on {} for {}", hash, chain, address);
        let endpoint = render(
            TRANSACTION_BY_HASH,
            &[("chain", &chain), ("hash", &hash), ("userAddress", &address)],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transaction details") else {
            return false;
        };
        if data.is_null() {
            return reply.success(
                format!("No transaction found with hash {} on {} for address {}.", hash, chain, address),
                json!({ "transaction": null }),
            );
        }
        let Some(tx) = reply.decode::<TransactionHistoryItem>(&data, "transaction details") else {
            return false;
        };

        reply.success(
            format_transaction_details(&tx, &hash, &address, &chain),
            json!({ "transaction": data }),
        )
    }
}

fn own(address: &str, user_address: &str) -> String {
    if address == user_address {
        "Your address".to_string()
    } else {
        address.to_string()
    }
}

pub fn format_transaction_details(
    tx: &TransactionHistoryItem,
    hash: &str,
    user_address: &str,
    chain: &str,
) -> String {
    let mut out = format!("Transaction details for hash {}:\n\n", hash);
    out += &format!("Type: {}\n", non_empty(&tx.tx_type).unwrap_or("Unknown"));
    out += &format!("Date: {}\n", tx_date(tx.time_stamp));
    out += &format!("Chain: {}\n", non_empty(&tx.chain).unwrap_or(chain));
    let block = tx
        .block
        .filter(|b| *b != 0.0)
        .map(|b| b.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    out += &format!("Block: {}\n", block);
    out += &format!("Fee: {}\n", fee_display(tx));

    if let Some(from) = non_empty(&tx.from) {
        out += &format!("From: {}\n", own(from, user_address));
    }
    if let Some(to) = non_empty(&tx.to) {
        out += &format!("To: {}\n", own(to, user_address));
    }
    let optional = [
        ("Action", &tx.tx_action),
        ("Contract", &tx.contract_name),
        ("Function", &tx.function_name),
        ("Encoding", &tx.encoding_function),
        ("Standard", &tx.standard),
    ];
    for (label, value) in optional {
        if let Some(v) = non_empty(value) {
            out += &format!("{}: {}\n", label, v);
        }
    }
    out += &format!("Status: {}\n", if tx.successful == Some(true) { "Successful" } else { "Failed" });

    if !tx.balances.is_empty() {
        out += "\nToken Balances:\n";
        for balance in &tx.balances {
            let amount = balance
                .balance
                .filter(|b| *b != 0.0)
                .map(|b| b.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let usd = balance
                .balance_usd
                .filter(|u| *u != 0.0)
                .map(|u| format!("${}", to_fixed(u, 2)))
                .unwrap_or_else(|| "N/A".to_string());
            out += &format!(
                "- {}: {} ({})\n",
                non_empty(&balance.token_symbol).unwrap_or("Unknown token"),
                amount,
                usd
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf";
    const ADDR: &str = "0x218e312fF5181290A46e3f87A73A8aD40C05A944";

    #[test]
    fn finds_hash_but_not_address() {
        let text = format!("details for tx hash: {} on eth for {}", HASH, ADDR);
        assert_eq!(extract_evm_hash(&text).as_deref(), Some(HASH));
        assert_eq!(extract_evm_hash(&format!("wallet {}", ADDR)), None);
    }

    #[test]
    fn details_report() {
        let tx: TransactionHistoryItem = serde_json::from_value(json!({
            "txType": "Send", "chain": "eth", "block": 19000000, "txFeeUsd": 3.456, "successful": true,
            "from": ADDR, "to": "0xdead", "functionName": "transfer", "standard": "ERC20",
            "balances": [{"tokenSymbol": "USDT", "balance": -25, "balanceUSD": -25}, {"balance": 0}]
        }))
        .unwrap();
        let text = format_transaction_details(&tx, HASH, ADDR, "eth");
        assert_eq!(
            text,
            format!(
                "Transaction details for hash {}:\n\nType: Send\nDate: Unknown date\nChain: eth\nBlock: 19000000\nFee: $3.46 USD\n\
                 From: Your address\nTo: 0xdead\nFunction: transfer\nStandard: ERC20\nStatus: Successful\n\n\
                 Token Balances:\n- USDT: -25 ($-25.00)\n- Unknown token: N/A (N/A)\n",
                HASH
            )
        );
    }
}
