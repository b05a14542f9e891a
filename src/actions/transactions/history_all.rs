// src/actions/transactions/history_all.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{non_empty, resolve_limit, tx_date};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_TX_HISTORY_ALL_EXTENDED};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{extract_wallet_address, is_valid_wallet_address};
use crate::format::{locale, to_fixed};
use crate::runtime::AgentRuntime;

pub struct UserTxHistoryAllExtendedAction;

const NAME: &str = "GET_USER_TX_HISTORY_ALL_EXTENDED_DATAI";
const DEFAULT_LIMIT: u32 = 5;

#[async_trait]
impl Action for UserTxHistoryAllExtendedAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_TX_HISTORY_ALL_EXTENDED_DATAI",
            "FETCH_TRANSACTION_HISTORY_DATAI",
            "LIST_MY_TRANSACTIONS_DATAI",
            "SHOW_TX_HISTORY_DATAI",
            "GET_MY_TRANSACTION_HISTORY_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves transaction history for a user across blockchains"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me transaction history for wallet 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 on DATAI LIMIT 5",
                "Let me retrieve the transaction history for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 on DATAI. I'll limit the results to 5 transactions...",
                NAME,
            ),
            exchange(
                "What are the last 5 transactions that 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 made across all chains on DATAI LIMIT 5",
                "I'll fetch the 5 most recent transactions for this wallet address across all supported chains on DATAI LIMIT 5...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        extract_wallet_address(message.text()).is_some_and(|a| is_valid_wallet_address(&a, None))
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
        let limit = resolve_limit(text, options, DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching transaction history for {} (limit {})", address, limit);
        let endpoint = with_query(
            for_user(USER_TX_HISTORY_ALL_EXTENDED, &address),
            &[("limit", limit.to_string())],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transaction history") else {
            return false;
        };
        let Some(txs) = reply.decode::<Vec<TransactionHistoryItem>>(&data, "transaction history") else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!("No transactions found for address {}.", address),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_transaction_history(&txs, &address, limit as usize),
            json!({ "transactions": data }),
        )
    }
}

pub fn format_transaction_history(txs: &[TransactionHistoryItem], user_address: &str, limit: usize) -> String {
    let mut out = format!("📊 Transaction History for {} 📊\n\n", user_address);
    out += &format!("Found {} transactions", txs.len());
    if txs.len() > limit {
        out += &format!(" (showing {})", limit);
    }
    out += "\n\n";

    for tx in txs.iter().take(limit) {
        let chain = non_empty(&tx.chain).map(str::to_uppercase).unwrap_or_else(|| "Unknown chain".to_string());
        out += &format!("🔷 Transaction on {}\n", chain);
        out += &format!("   Date: {}\n", tx_date(tx.time_stamp));
        out += &format!("   Type: {}\n", non_empty(&tx.tx_type).unwrap_or("Unknown"));
        if let Some(function) = non_empty(&tx.function_name) {
            out += &format!("   Function: {}\n", function);
        }

        if let Some(token) = tx.balances.first() {
            let name = non_empty(&token.token_symbol)
                .or(non_empty(&token.token_name))
                .unwrap_or("Unknown");
            out += &format!("   Token: {}\n", name);
            if let Some(addr) = non_empty(&token.token_address) {
                out += &format!("   Token Address: {}\n", addr);
            }
            if let (Some(balance), Some(decimals)) = (token.balance, token.token_decimals) {
                out += &format!("   Amount: {}\n", locale(balance / 10f64.powf(decimals)));
            }
        }

        if let Some(from) = non_empty(&tx.from) {
            out += &format!("   From: {}\n", from);
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("   To: {}\n", to);
        }
        out += &format!("   Hash: {}\n", tx.hash.as_deref().unwrap_or("undefined"));
        if let Some(fee) = tx.tx_fee_usd {
            out += &format!("   Fee: {} USD\n", to_fixed(fee, 2));
        }
        out += "\n";
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    #[tokio::test]
    async fn missing_address_prompts() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        let ok = UserTxHistoryAllExtendedAction
            .handler(&StaticRuntime::new(), &Memory::from_text("show my history"), None, None, Some(&mut cb))
            .await;
        assert!(!ok);
        assert_eq!(seen[0].text, "Please provide a valid wallet address to check transaction history.");
    }

    #[test]
    fn lists_limited_transactions() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([
            {
                "chain": "eth", "timeStamp": 1710450300, "txType": "Swap", "functionName": "swapExactTokensForTokens",
                "balances": [{"tokenSymbol": "USDC", "tokenAddress": "0xa0b8", "balance": 1234500000, "tokenDecimals": 6}],
                "from": ADDR, "to": "0xrouter", "hash": "0xh1", "txFeeUsd": 1.234
            },
            {"hash": "0xh2"},
            {"hash": "0xh3"}
        ]))
        .unwrap();
        let text = format_transaction_history(&txs, ADDR, 2);
        assert!(text.starts_with(&format!("📊 Transaction History for {} 📊\n\nFound 3 transactions (showing 2)\n\n", ADDR)));
        assert!(text.contains(
            "🔷 Transaction on ETH\n   Date: 3/14/2024, 9:05:00 PM\n   Type: Swap\n   Function: swapExactTokensForTokens\n   Token: USDC\n   Token Address: 0xa0b8\n   Amount: 1,234.5\n"
        ));
        assert!(text.contains("   Hash: 0xh1\n   Fee: 1.23 USD\n\n"));
        assert!(text.ends_with("🔷 Transaction on Unknown chain\n   Date: Unknown date\n   Type: Unknown\n   Hash: 0xh2\n\n"));
        assert!(!text.contains("0xh3"));
    }

    #[test]
    fn empty_history() {
        let text = format_transaction_history(&[], ADDR, 5);
        assert!(text.starts_with(&format!("📊 Transaction History for {} 📊\n\nFound 0 transactions", ADDR)));
    }
}
