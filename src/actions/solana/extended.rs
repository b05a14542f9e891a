// src/actions/solana/extended.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::is_solana_query;
use crate::actions::transactions::{non_empty, resolve_limit, showing_note, tx_date, you_or};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, SOLANA_USER_TX_HISTORY_EXTENDED};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{extract_wallet_address, is_valid_wallet_address};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct SolanaUserTxHistoryExtendedAction;

const NAME: &str = "GET_SOLANA_USER_TX_HISTORY_EXTENDED_DATAI";
const DEFAULT_LIMIT: u32 = 10;
const EXTENDED_KEYWORDS: &[&str] = &["extended", "detailed", "full", "long version", "details"];

#[async_trait]
impl Action for SolanaUserTxHistoryExtendedAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_SOLANA_TX_HISTORY_EXTENDED_DATAI",
            "FETCH_DETAILED_SOLANA_TRANSACTIONS_DATAI",
            "LIST_MY_SOLANA_TRANSACTIONS_EXTENDED_DATAI",
            "SHOW_SOLANA_TX_HISTORY_DETAILED_DATAI",
            "GET_MY_SOLANA_TRANSACTION_DETAILS_DATAI",
            "SHOW_SOLANA_EXTENDED_TX_HISTORY_DATAI",
            "GET_DETAILED_SOLANA_TRANSACTION_LOG_DATAI",
            "FETCH_FULL_SOLANA_TX_DETAILS_DATAI",
            "LIST_SOLANA_LONG_VERSION_TRANSACTIONS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves detailed transaction history for a user on the Solana blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me my detailed Solana transaction history for wallet rTXw3t2M9CowfNy23AVtvnnGvve2VbHtH9AcRRzrXyJ on DATAI LIMIT 10",
                "Let me retrieve your Solana transaction history. One moment please...",
                NAME,
            ),
            exchange(
                "What transactions has rTXw3t2M9CowfNy23AVtvnnGvve2VbHtH9AcRRzrXyJ made on Solana? on DATAI LIMIT 5",
                "I'll fetch the detailed Solana transaction history for this wallet address...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        if !extract_wallet_address(text).is_some_and(|a| is_valid_wallet_address(&a, None)) {
            return false;
        }
        if !is_solana_query(text, EXTENDED_KEYWORDS) {
            debug!("{}: not an extended Solana history request", NAME);
            return false;
        }
        true
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
                "Please provide a valid Solana wallet address to check transaction history.",
                "No wallet address provided",
            );
        };
        let limit = resolve_limit(text, options, DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching Solana transaction history for {} (limit: {})", address, limit);
        let endpoint = with_query(
            for_user(SOLANA_USER_TX_HISTORY_EXTENDED, &address),
            &[("chain", "solana".to_string()), ("limit", limit.to_string())],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "Solana transaction history") else {
            return false;
        };
        let Some(txs) = reply.decode::<Vec<TransactionHistoryItem>>(&data, "Solana transaction history") else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!("No Solana transactions found for address {}.", address),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_solana_extended(&txs, &address, limit as usize),
            json!({ "transactions": data }),
        )
    }
}

pub fn format_solana_extended(txs: &[TransactionHistoryItem], user_address: &str, limit: usize) -> String {
    let mut out = format!("Found {} Solana transactions for {}", txs.len(), user_address);
    out += &showing_note(txs.len(), limit);
    out += ":\n\n";

    for tx in txs.iter().take(limit) {
        let fee = tx
            .tx_fee_usd
            .filter(|f| *f != 0.0)
            .map(|f| format!("{} USD", to_fixed(f, 2)))
            .unwrap_or_else(|| "N/A".to_string());
        out += &format!("- {} ({})", non_empty(&tx.tx_type).unwrap_or("Transaction"), tx_date(tx.time_stamp));
        out += &format!("\n  Signature: {}", tx.hash.as_deref().unwrap_or("undefined"));
        out += &format!("\n  Fee: {}", fee);
        if let Some(from) = non_empty(&tx.from) {
            out += &format!("\n  From: {}", you_or(from, user_address));
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("\n  To: {}", you_or(to, user_address));
        }
        if let Some(action) = non_empty(&tx.tx_action) {
            out += &format!("\n  Action: {}", action);
        }
        if !tx.balances.is_empty() {
            out += "\n  Tokens Involved:";
            for balance in &tx.balances {
                let amount = balance
                    .balance
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "undefined".to_string());
                let usd = balance
                    .balance_usd
                    .filter(|u| *u != 0.0)
                    .map(|u| format!("(${})", to_fixed(u, 2)))
                    .unwrap_or_default();
                out += &format!(
                    "\n    {}: {} {}",
                    non_empty(&balance.token_symbol).unwrap_or("Unknown Token"),
                    amount,
                    usd
                );
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

    const ADDR: &str = "rTXw3t2M9CowfNy23AVtvnnGvve2VbHtH9AcRRzrXyJ";

    #[tokio::test]
    async fn needs_solana_and_detail_wording() {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let action = SolanaUserTxHistoryExtendedAction;
        let detailed = format!("Show me my detailed Solana transaction history for wallet {}", ADDR);
        assert!(action.validate(&rt, &Memory::from_text(detailed)).await);
        let recent = format!("Show me my recent Solana transactions for wallet {}", ADDR);
        assert!(!action.validate(&rt, &Memory::from_text(recent)).await);
    }

    #[test]
    fn lists_tokens_involved() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([
            {
                "txType": "Swap", "hash": "5sig", "txFeeUsd": 0.0021, "from": ADDR, "txAction": "swap",
                "balances": [{"tokenSymbol": "SOL", "balance": -0.5, "balanceUSD": -70.25}, {"balance": 12}]
            },
            {"hash": "6sig"}
        ]))
        .unwrap();
        let text = format_solana_extended(&txs, ADDR, 1);
        assert_eq!(
            text,
            format!(
                "Found 2 Solana transactions for {} (showing the 1 most recent):\n\n\
                 - Swap (Unknown date)\n  Signature: 5sig\n  Fee: 0.00 USD\n  From: You\n  Action: swap\n  \
                 Tokens Involved:\n    SOL: -0.5 ($-70.25)\n    Unknown Token: 12 \n\n",
                ADDR
            )
        );
    }

    #[test]
    fn empty_history() {
        let text = format_solana_extended(&[], ADDR, 10);
        assert!(text.starts_with(&format!("Found 0 Solana transactions for {}:\n\n", ADDR)));
    }
}
