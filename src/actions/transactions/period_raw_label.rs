// src/actions/transactions/period_raw_label.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{group_in_order, non_empty, period_query, period_text, resolve_period, tx_date};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_TX_BY_PERIOD_AND_CHAIN_RAW_LABEL_20};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{
    contains_raw_tx_keywords, contains_time_period_keywords, extract_chain_id, extract_time_period_from_text,
    extract_wallet_address, is_valid_wallet_address, TimePeriod,
};
use crate::format::chain_display_name;
use crate::runtime::AgentRuntime;

pub struct UserTxByPeriodAndChainRawLabel20Action;

const NAME: &str = "GET_USER_TX_BY_PERIOD_AND_CHAIN_RAW_LABEL_20_DATAI";

#[async_trait]
impl Action for UserTxByPeriodAndChainRawLabel20Action {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_TX_BY_PERIOD_CHAIN_RAW_LABEL",
            "FETCH_RAW_LABEL_TX_BY_TIMEFRAME_CHAIN",
            "LIST_RAW_CHAIN_TX_BY_PERIOD",
            "SHOW_RAW_LABEL_TX_HISTORY_TIME_RANGE_CHAIN",
            "GET_RAW_LABELED_CHAIN_TX_BY_DATE_RANGE",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves raw labeled transaction history (limited to 20) for a user within a specific time period on a particular blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me raw transaction history for Ethereum wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime=1716346533 and endTime=1705895733 on DATAI",
                "I'll get your raw transaction history for Ethereum wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime 1716346533 and endTime 1705895733 on DATAI...",
                NAME,
            ),
            exchange(
                "What are my raw tx on eth for wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 between startTime 1716346533 and endTime 1705895733 on DATAI?",
                "Let me fetch your raw transactions on Ethereum for 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime 1716346533 and endTime 1705895733 on DATAI...",
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
        if extract_chain_id(text).is_none() {
            return false;
        }
        if !contains_raw_tx_keywords(text) || !contains_time_period_keywords(text) {
            debug!("{}: missing raw or time period wording", NAME);
            return false;
        }
        extract_time_period_from_text(text).is_some()
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
        let Some(period) = resolve_period(text, options) else {
            return reply.prompt(
                "Please specify a time period for the transaction history (e.g., \"last 7 days\", \"this month\", or use startTime and endTime parameters).",
                "No time period specified",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching raw labeled transactions for {} on {}", address, chain);
        let mut query = vec![("chain", chain.clone())];
        query.extend(period_query(&period));
        let endpoint = with_query(for_user(USER_TX_BY_PERIOD_AND_CHAIN_RAW_LABEL_20, &address), &query);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transactions") else {
            return false;
        };
        let Some(txs) =
            reply.decode::<Vec<TransactionHistoryItem>>(&data, "raw labeled transactions by time period")
        else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!(
                    "No transactions found for address {} on {} in the specified time period.",
                    address, chain
                ),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_period_raw_label(&txs, &address, &chain, Some(&period)),
            json!({ "transactions": data }),
        )
    }
}

fn count_line(label: &str, n: usize) -> String {
    format!("• {}: {} transaction{}\n", label, n, if n > 1 { "s" } else { "" })
}

/// `0xbdfa...5c50` style: six leading characters, then from index 38 on.
fn clip(address: &str, user_address: &str) -> String {
    if address == user_address {
        return "You".to_string();
    }
    let head: String = address.chars().take(6).collect();
    let tail: String = address.chars().skip(38).collect();
    format!("{}...{}", head, tail)
}

pub fn format_period_raw_label(
    txs: &[TransactionHistoryItem],
    user_address: &str,
    chain: &str,
    period: Option<&TimePeriod>,
) -> String {
    let mut out = format!("📊 Raw Transaction History for {}\n", user_address);
    out += &format!("🔗 Chain: {}\n", chain_display_name(chain));
    if let Some(range) = period_text(period) {
        out += &format!("📅 Period: {}\n", range);
    }
    out += &format!("📈 Found {} raw labeled transactions (limit: 20)\n\n", txs.len());
    if txs.is_empty() {
        out += "No transactions found in the specified period.";
        return out;
    }

    let types = group_in_order(txs, |tx| non_empty(&tx.tx_type).unwrap_or("Unknown").to_string());
    let mut classes: Vec<(&str, usize)> = Vec::new();
    for class in txs.iter().filter_map(|tx| non_empty(&tx.tx_classification)) {
        match classes.iter_mut().find(|(c, _)| *c == class) {
            Some((_, n)) => *n += 1,
            None => classes.push((class, 1)),
        }
    }

    out += "📋 Transaction Types:\n";
    for (tx_type, members) in &types {
        out += &count_line(tx_type, members.len());
    }
    if !classes.is_empty() {
        out += "\n🏷️ Classifications:\n";
        for (class, n) in &classes {
            out += &count_line(class, *n);
        }
    }
    out += "\n🔍 Raw Transaction Details:\n\n";

    for (i, tx) in txs.iter().enumerate() {
        let classification = non_empty(&tx.tx_classification)
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();
        out += &format!("{}. {}{}\n", i + 1, non_empty(&tx.tx_type).unwrap_or("Transaction"), classification);
        out += &format!("   📅 {}\n", tx_date(tx.time_stamp));
        out += &format!("   🔗 Hash: {}\n", tx.hash.as_deref().unwrap_or("undefined"));
        if let Some(from) = non_empty(&tx.from) {
            out += &format!("   📤 From: {}\n", clip(from, user_address));
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("   📥 To: {}\n", clip(to, user_address));
        }
        if let Some(action) = non_empty(&tx.tx_action) {
            out += &format!("   ⚡ Action: {}\n", action);
        }
        if let Some(contract) = non_empty(&tx.contract_name) {
            out += &format!("   📄 Contract: {}\n", contract);
        }
        if let Some(function) = non_empty(&tx.function_name) {
            out += &format!("   🔧 Function: {}\n", function);
        }
        out += "\n";
    }

    out += "💡 Note: This shows raw transaction data with classifications but without USD valuations (limit: 20 transactions).";
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50";

    #[tokio::test]
    async fn raw_wording_required() {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let action = UserTxByPeriodAndChainRawLabel20Action;
        let raw = format!("What are my raw tx on eth for wallet {} between startTime 1716346533 and endTime 1705895733", ADDR);
        assert!(action.validate(&rt, &Memory::from_text(raw)).await);
        let plain = format!("my tx on eth for wallet {} between startTime 1716346533 and endTime 1705895733", ADDR);
        assert!(!action.validate(&rt, &Memory::from_text(plain)).await);
    }

    #[test]
    fn types_classifications_and_clipped_parties() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([
            {
                "txType": "Receive", "txClassification": "transfer", "hash": "0x1",
                "from": "0x1111111111111111111111111111111111112222", "to": ADDR, "contractName": "WETH"
            },
            {"txType": "Receive", "hash": "0x2", "functionName": "deposit()"}
        ]))
        .unwrap();
        let period = TimePeriod { start_time: 1_716_346_533, end_time: 0 };
        let text = format_period_raw_label(&txs, ADDR, "eth", Some(&period));
        assert!(text.starts_with(&format!(
            "📊 Raw Transaction History for {}\n🔗 Chain: Ethereum\n📅 Period: up to 5/22/2024\n📈 Found 2 raw labeled transactions (limit: 20)\n\n",
            ADDR
        )));
        assert!(text.contains(
            "📋 Transaction Types:\n• Receive: 2 transactions\n\n🏷️ Classifications:\n• transfer: 1 transaction\n\n🔍 Raw Transaction Details:\n\n"
        ));
        assert!(text.contains(
            "1. Receive (transfer)\n   📅 Unknown date\n   🔗 Hash: 0x1\n   📤 From: 0x1111...2222\n   📥 To: You\n   📄 Contract: WETH\n\n"
        ));
        assert!(text.ends_with(
            "2. Receive\n   📅 Unknown date\n   🔗 Hash: 0x2\n   🔧 Function: deposit()\n\n💡 Note: This shows raw transaction data with classifications but without USD valuations (limit: 20 transactions)."
        ));
    }

    #[test]
    fn empty_period() {
        let text = format_period_raw_label(&[], ADDR, "eth", None);
        assert!(text.starts_with(&format!("📊 Raw Transaction History for {}\n", ADDR)));
        assert!(text.ends_with("No transactions found in the specified period."));
    }
}
