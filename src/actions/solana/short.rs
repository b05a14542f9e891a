// src/actions/solana/short.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::is_solana_query;
use crate::actions::transactions::{non_empty, resolve_limit, showing_note, tx_date};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, SOLANA_USER_TX_HISTORY_SHORT};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{extract_wallet_address, is_valid_wallet_address};
use crate::format::{short_address, to_fixed};
use crate::runtime::AgentRuntime;

pub struct SolanaUserTxHistoryShortAction;

const NAME: &str = "GET_SOLANA_USER_TX_HISTORY_SHORT";
const DEFAULT_LIMIT: u32 = 10;
const SHORT_KEYWORDS: &[&str] = &["recent", "latest", "short", "summary"];

#[async_trait]
impl Action for SolanaUserTxHistoryShortAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_SOLANA_TX_HISTORY_SHORT",
            "FETCH_RECENT_SOLANA_TRANSACTIONS",
            "LIST_MY_RECENT_SOLANA_TRANSACTIONS",
            "SHOW_SOLANA_TX_SUMMARY",
            "GET_LATEST_SOLANA_TRANSACTIONS",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves a short transaction history for a user on the Solana blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me a short history of my recent Solana transactions for wallet HM7A27keP6GtwQ2nRCgstb2UhveG5SDTvM7aHJadRb2g, on DATAI LIMIT 5",
                "Let me retrieve your recent Solana transactions. One moment please...",
                NAME,
            ),
            exchange(
                "What are the latest transactions on my Solana account HM7A27keP6GtwQ2nRCgstb2UhveG5SDTvM7aHJadRb2g on DATAI LIMIT 5",
                "I'll get a summary of your recent Solana transactions...",
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
            && is_solana_query(text, SHORT_KEYWORDS)
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
                "Please provide a valid Solana wallet address to check recent transactions.",
                "No wallet address provided",
            );
        };
        let limit = resolve_limit(text, options, DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching recent Solana transactions for {} (limit: {})", address, limit);
        let endpoint = with_query(
            for_user(SOLANA_USER_TX_HISTORY_SHORT, &address),
            &[("chain", "solana".to_string()), ("limit", limit.to_string())],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "recent Solana transactions") else {
            return false;
        };
        let Some(txs) = reply.decode::<Vec<TransactionHistoryItem>>(&data, "recent Solana transactions") else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!("No recent Solana transactions found for address {}.", address),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_solana_short(&txs, &address, limit as usize),
            json!({ "transactions": data }),
        )
    }
}

fn party(address: &str, user_address: &str) -> String {
    if address.eq_ignore_ascii_case(user_address) {
        "You".to_string()
    } else {
        short_address(address)
    }
}

pub fn format_solana_short(txs: &[TransactionHistoryItem], user_address: &str, limit: usize) -> String {
    let mut out = format!("Found {} Solana transactions for {}", txs.len(), user_address);
    out += &showing_note(txs.len(), limit);
    out += ":\n\n";

    for tx in txs.iter().take(limit) {
        let signature: String = tx.hash.as_deref().unwrap_or_default().chars().take(12).collect();
        out += &format!("▪️ {} ({})", non_empty(&tx.tx_type).unwrap_or("Transaction"), tx_date(tx.time_stamp));
        out += &format!("\n  Signature: {}...", signature);
        if let Some(from) = non_empty(&tx.from) {
            out += &format!("\n  From: {}", party(from, user_address));
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("\n  To: {}", party(to, user_address));
        }
        if let Some(fee) = tx.tx_fee_usd {
            out += &format!("\n  Fee: ${} USD", to_fixed(fee, 4));
        }
        if let Some(action) = non_empty(&tx.tx_action) {
            out += &format!("\n  Action: {}", action);
        }
        if let Some(first) = tx.balances.first() {
            let token = non_empty(&first.token_symbol)
                .or_else(|| non_empty(&first.token_name))
                .unwrap_or("Unknown");
            out += &format!("\n  Token: {}", token);
            if tx.balances.len() > 1 {
                out += &format!(" (+{} more)", tx.balances.len() - 1);
            }
        }
        out += "\n\n";
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "HM7A27keP6GtwQ2nRCgstb2UhveG5SDTvM7aHJadRb2g";

    #[tokio::test]
    async fn needs_recent_wording() {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let action = SolanaUserTxHistoryShortAction;
        let latest = format!("What are the latest transactions on my Solana account {}", ADDR);
        assert!(action.validate(&rt, &Memory::from_text(latest)).await);
        let plain = format!("transactions on my Solana account {}", ADDR);
        assert!(!action.validate(&rt, &Memory::from_text(plain)).await);
    }

    #[tokio::test]
    async fn missing_address_prompts() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        let ok = SolanaUserTxHistoryShortAction
            .handler(&StaticRuntime::new(), &Memory::from_text("recent solana txs"), None, None, Some(&mut cb))
            .await;
        assert!(!ok);
        assert_eq!(seen[0].content.error.as_deref(), Some("No wallet address provided"));
    }

    #[test]
    fn compact_lines() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([{
            "txType": "Transfer", "hash": "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi",
            "from": ADDR.to_lowercase(), "to": "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
            "txFeeUsd": 0.00042,
            "balances": [{"tokenName": "Bonk"}, {"tokenSymbol": "SOL"}]
        }]))
        .unwrap();
        let text = format_solana_short(&txs, ADDR, 10);
        assert_eq!(
            text,
            format!(
                "Found 1 Solana transactions for {} (showing all 1):\n\n\
                 ▪️ Transfer (Unknown date)\n  Signature: 4vJ9JU1bJJE9...\n  From: You\n  To: 9WzDXw...AWWM\n  \
                 Fee: $0.0004 USD\n  Token: Bonk (+1 more)\n\n",
                ADDR
            )
        );
    }

    #[test]
    fn empty_history() {
        let text = format_solana_short(&[], ADDR, 10);
        assert!(text.starts_with(&format!("Found 0 Solana transactions for {}:\n\n", ADDR)));
    }
}
