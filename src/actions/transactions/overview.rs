// src/actions/transactions/overview.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{non_empty, resolve_limit};
use crate::actions::{api_key, exchange, option_str, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, USER_TRANSACTION_OVERVIEW};
use crate::datai::models::UserTransactionOverview;
use crate::extract::{contains_any, extract_wallet_address, is_valid_wallet_address};
use crate::format::{date_string, short_address};
use crate::runtime::AgentRuntime;

pub struct UserTransactionOverviewAction;

const NAME: &str = "GET_USER_TRANSACTION_OVERVIEW_DATAI";
const DEFAULT_LIMIT: u32 = 10;
const OVERVIEW_KEYWORDS: &[&str] = &["overview", "summary", "stats", "statistic"];

#[async_trait]
impl Action for UserTransactionOverviewAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_TX_OVERVIEW_SUMMARY_DATAI",
            "FETCH_TRANSACTION_OVERVIEW_DATAI",
            "SHOW_TX_STATS_DATAI",
            "DISPLAY_WALLET_TX_SUMMARY_DATAI",
            "TRANSACTION_OVERVIEW_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves a comprehensive overview of a user's transaction history, including summary statistics"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me a transaction overview for wallet 0x4f2083f5fbede34c2714affb3105539775f7fe64",
                "I'll get you a summary of all transaction activity for that wallet. One moment...",
                NAME,
            ),
            exchange(
                "What's the transaction overview for this address: 0x4f2083f5fbede34c2714affb3105539775f7fe64?",
                "Let me fetch the transaction overview for 0x4f2083f5fbede34c2714affb3105539775f7fe64...",
                NAME,
            ),
            exchange(
                "Can you give me an overview of transactions for 0x4f2083f5fbede34c2714affb3105539775f7fe64?",
                "Analyzing transaction history for 0x4f2083f5fbede34c2714affb3105539775f7fe64. This will show you activity across chains, transaction types, and more...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        if !contains_any(text, OVERVIEW_KEYWORDS) {
            debug!("{}: no overview wording", NAME);
            return false;
        }
        extract_wallet_address(text).is_some_and(|a| is_valid_wallet_address(&a, None))
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
        let address = option_str(options, "walletAddress")
            .map(str::to_string)
            .or_else(|| extract_wallet_address(text))
            .filter(|a| is_valid_wallet_address(a, None));
        let Some(address) = address else {
            return reply.prompt(
                "Please provide a valid wallet address to check transaction overview.",
                "Invalid or missing wallet address",
            );
        };
        let limit = resolve_limit(text, options, DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching transaction overview for wallet {}", address);
        let endpoint = for_user(USER_TRANSACTION_OVERVIEW, &address);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transaction overview") else {
            return false;
        };
        if data.is_null() {
            return reply.success(
                format!("No transaction data found for wallet {}.", address),
                json!({ "overview": null }),
            );
        }
        let Some(overview) = reply.decode::<UserTransactionOverview>(&data, "transaction overview") else {
            return false;
        };

        reply.success(format_overview(&overview, &address, limit as usize), json!({ "overview": data }))
    }
}

fn count(value: Option<f64>) -> String {
    value.unwrap_or(0.0).to_string()
}

pub fn format_overview(overview: &UserTransactionOverview, wallet_address: &str, limit: usize) -> String {
    let mut out = format!("Transaction Overview for {}\n\n", short_address(wallet_address));
    out += "📊 Wallet Summary:\n";
    out += &format!("• Total Chains Active On: {}\n", count(overview.nb_of_chains));
    out += &format!("• Total Initiated Transactions: {}\n", count(overview.nb_of_transactions));
    if let Some(created) = overview.creation_timestamp.filter(|t| *t != 0.0) {
        out += &format!("• Wallet First Seen: {}\n", date_string(created));
    }

    if overview.overview.is_empty() {
        out += "\n🔗 No specific chain activity details available.\n";
    } else {
        out += "\n🔗 Chain Activity Details:\n";
        for chain in overview.overview.iter().take(limit) {
            out += &format!("• Chain: {}\n", non_empty(&chain.chain_id).unwrap_or("unknown").to_uppercase());
            let txs = chain
                .nb_of_transactions
                .map(|n| n.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            out += &format!("  - Transactions on this chain: {}\n", txs);
            if let Some(first) = chain.creation_timestamp.filter(|t| *t != 0.0) {
                out += &format!("  - First activity on chain: {}\n", date_string(first));
            }
        }
        if overview.overview.len() > limit {
            out += &format!("\n  ...and {} more chains.", overview.overview.len() - limit);
        }
    }

    out += "\n\nUse other actions like 'Get User Transactions by Chain' for more detailed transaction history.";
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0x4f2083f5fbede34c2714affb3105539775f7fe64";

    #[tokio::test]
    async fn needs_overview_wording() {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let action = UserTransactionOverviewAction;
        assert!(action.validate(&rt, &Memory::from_text(format!("transaction Overview for {}", ADDR))).await);
        assert!(!action.validate(&rt, &Memory::from_text(format!("transactions for {}", ADDR))).await);
    }

    #[test]
    fn chain_list_respects_limit() {
        let overview: UserTransactionOverview = serde_json::from_value(json!({
            "nbOfChains": 3, "nbOfTransactions": 120, "creationTimestamp": 1710450300,
            "overview": [
                {"chainId": "eth", "nbOfTransactions": 100, "creationTimestamp": 1710450300},
                {"chainId": "base"},
                {"chainId": "arb", "nbOfTransactions": 5}
            ]
        }))
        .unwrap();
        let text = format_overview(&overview, ADDR, 2);
        assert_eq!(
            text,
            "Transaction Overview for 0x4f20...fe64\n\n📊 Wallet Summary:\n• Total Chains Active On: 3\n\
             • Total Initiated Transactions: 120\n• Wallet First Seen: 3/14/2024\n\n🔗 Chain Activity Details:\n\
             • Chain: ETH\n  - Transactions on this chain: 100\n  - First activity on chain: 3/14/2024\n\
             • Chain: BASE\n  - Transactions on this chain: N/A\n\n  ...and 1 more chains.\n\n\
             Use other actions like 'Get User Transactions by Chain' for more detailed transaction history."
        );
    }

    #[test]
    fn empty_overview() {
        let text = format_overview(&UserTransactionOverview::default(), ADDR, 10);
        assert!(text.contains("• Total Chains Active On: 0\n• Total Initiated Transactions: 0\n\n🔗 No specific chain activity details available.\n\n\n"));
    }
}
