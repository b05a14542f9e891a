// src/actions/transactions/raw_label.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{non_empty, resolve_limit, showing_note, tx_date, you_or};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_TX_HISTORY_BY_CHAIN_RAW_LABEL};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::params::validate_required;
use crate::extract::{contains_any, extract_chain_id, extract_wallet_address};
use crate::runtime::AgentRuntime;

pub struct UserTxHistoryByChainRawLabelAction;

const NAME: &str = "GET_USER_TX_HISTORY_BY_CHAIN_RAW_LABEL_DATAI";
const DEFAULT_LIMIT: u32 = 20;
const RAW_LABEL_KEYWORDS: &[&str] = &["raw label", "raw labeled", "raw tx"];

#[async_trait]
impl Action for UserTxHistoryByChainRawLabelAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_TX_HISTORY_CHAIN_RAW_LABEL_DATAI",
            "FETCH_RAW_LABEL_CHAIN_TRANSACTIONS_DATAI",
            "LIST_CHAIN_TX_RAW_LABELS_DATAI",
            "SHOW_CHAIN_TRANSACTIONS_RAW_LABEL_DATAI",
            "GET_MY_CHAIN_TX_WITH_RAW_LABELS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves transaction history with raw labels for a user on a specific blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me my raw labeled transaction history on Ethereum for 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e on DATAI LIMIT 10",
                "I'll fetch your raw labeled transaction history on Ethereum (eth) for 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e. One moment...",
                NAME,
            ),
            exchange(
                "What are my transactions with raw labels for wallet 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e on eth chain on DATAI LIMIT 10?",
                "Let me get your raw labeled transaction history for 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e from the Ethereum (eth) chain...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        if !contains_any(text, RAW_LABEL_KEYWORDS) {
            debug!("{}: no raw label wording", NAME);
            return false;
        }
        let (address, chain) = (extract_wallet_address(text), extract_chain_id(text));
        validate_required(&[("userAddress", address.as_deref()), ("chain", chain.as_deref())]).is_valid
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
                "Please provide a valid wallet address to check transaction history.",
                "No wallet address provided",
            );
        };
        let Some(chain) = extract_chain_id(text) else {
            return reply.prompt(
                "Please specify which blockchain (e.g., \"eth\", \"bsc\", \"polygon\") you want to check transactions for.",
                "No chain ID provided",
            );
        };
        let limit = resolve_limit(text, options, DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching raw labeled transactions for {} on {} (limit {})", address, chain, limit);
        let endpoint = with_query(
            for_user(USER_TX_HISTORY_BY_CHAIN_RAW_LABEL, &address),
            &[("chain", chain.clone()), ("limit", limit.to_string())],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transactions") else {
            return false;
        };
        let Some(txs) = reply.decode::<Vec<TransactionHistoryItem>>(&data, "raw labeled transaction history") else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!("No transactions found for address {} on {}.", address, chain),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_raw_label_history(&txs, &address, &chain, limit as usize),
            json!({ "transactions": data }),
        )
    }
}

pub fn format_raw_label_history(
    txs: &[TransactionHistoryItem],
    user_address: &str,
    chain: &str,
    limit: usize,
) -> String {
    let mut out = format!(
        "Found {} transactions with raw labels for {} on {}",
        txs.len(),
        user_address,
        chain.to_uppercase()
    );
    out += &showing_note(txs.len(), limit);
    out += ":\n\n";

    for tx in txs.iter().take(limit) {
        out += &format!("- {} ({})", non_empty(&tx.tx_type).unwrap_or("Transaction"), tx_date(tx.time_stamp));
        out += &format!("\n  Hash: {}", tx.hash.as_deref().unwrap_or("undefined"));
        if let Some(class) = non_empty(&tx.tx_classification) {
            out += &format!("\n  Classification: {}", class);
        }
        if let Some(from) = non_empty(&tx.from) {
            out += &format!("\n  From: {}", you_or(from, user_address));
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("\n  To: {}", you_or(to, user_address));
        }
        if let Some(action) = non_empty(&tx.tx_action) {
            out += &format!("\n  Action: {}", action);
        }
        if let Some(contract) = non_empty(&tx.contract_name) {
            out += &format!("\n  Contract: {}", contract);
        }
        if let Some(function) = non_empty(&tx.function_name) {
            out += &format!("\n  Function: {}", function);
        }
        out += "\n\n";
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e";

    #[tokio::test]
    async fn needs_raw_label_wording() {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let action = UserTxHistoryByChainRawLabelAction;
        assert!(action.validate(&rt, &Memory::from_text(format!("raw labeled history on eth for {}", ADDR))).await);
        assert!(!action.validate(&rt, &Memory::from_text(format!("history on eth for {}", ADDR))).await);
    }

    #[test]
    fn labels_and_exact_self_match() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([{
            "txType": "Approve", "hash": "0xa", "txClassification": "approval",
            "from": ADDR, "to": "0x8E9741F27B21D6B3D5791B5566A880ECF5A1F21E",
            "txAction": "approve", "contractName": "USDC", "functionName": "approve(address,uint256)"
        }]))
        .unwrap();
        let text = format_raw_label_history(&txs, ADDR, "eth", 20);
        assert_eq!(
            text,
            format!(
                "Found 1 transactions with raw labels for {} on ETH (showing all 1):\n\n\
                 - Approve (Unknown date)\n  Hash: 0xa\n  Classification: approval\n  From: You\n  \
                 To: 0x8E9741F27B21D6B3D5791B5566A880ECF5A1F21E\n  Action: approve\n  Contract: USDC\n  \
                 Function: approve(address,uint256)\n\n",
                ADDR
            )
        );
    }

    #[test]
    fn empty_history() {
        let text = format_raw_label_history(&[], ADDR, "bsc", 20);
        assert!(text.starts_with(&format!("Found 0 transactions with raw labels for {} on BSC:\n\n", ADDR)));
    }
}
