// src/actions/transactions/period_extended.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{first_value, group_in_order, non_empty, period_query, period_text, resolve_period, tx_date, you_or};
use crate::actions::{api_key, exchange, option_u32, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_TX_BY_PERIOD_AND_CHAIN_EXTENDED};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{
    contains_extended_tx_history_keywords, contains_time_period_keywords, extract_chain_id,
    extract_time_period_from_text, extract_wallet_address, is_valid_wallet_address, TimePeriod,
};
use crate::format::{chain_display_name, to_fixed};
use crate::runtime::AgentRuntime;

pub struct UserTxByPeriodAndChainExtendedAction;

const NAME: &str = "GET_USER_TX_BY_PERIOD_AND_CHAIN_EXTENDED_DATAI";
const DEFAULT_LIMIT: u32 = 50;
const SHOWN: usize = 10;

#[async_trait]
impl Action for UserTxByPeriodAndChainExtendedAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_TX_BY_PERIOD_CHAIN_EXTENDED_DATAI",
            "FETCH_TRANSACTIONS_BY_TIMEFRAME_CHAIN_EXTENDED_DATAI",
            "LIST_MY_TRANSACTIONS_BY_PERIOD_ON_CHAIN_EXTENDED_DATAI",
            "SHOW_CHAIN_TRANSACTION_HISTORY_TIME_RANGE_EXTENDED_DATAI",
            "GET_MY_CHAIN_TRANSACTIONS_FROM_DATE_RANGE_EXTENDED_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves detailed transaction history for a user within a specific time period on a particular blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me extended transaction history on xDai chain for wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime=1716346533 and endTime=1705895733 on DATAI",
                "I'll get your extended xDai transaction history for 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime 1716346533 and endTime 1705895733...",
                NAME,
            ),
            exchange(
                "What are my complete transactions on xDai for address 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime 1716346533 and endTime 1705895733 on DATAI?",
                "Fetching your complete xDai chain transaction history for 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 with startTime=1716346533 and endTime=1705895733...",
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
        if !contains_extended_tx_history_keywords(text) || !contains_time_period_keywords(text) {
            debug!("{}: missing extended or time period wording", NAME);
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
                "Please specify a time period for the transaction history (e.g., \"last 7 days\", \"this month\", or explicit Unix timestamps).",
                "No time period specified",
            );
        };
        let limit = option_u32(options, "limit").filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!(
            "Fetching transactions for {} on {} between {} and {}",
            address, chain, period.end_time, period.start_time
        );
        let mut query = vec![("chain", chain.clone()), ("limit", limit.to_string())];
        query.extend(period_query(&period));
        let endpoint = with_query(for_user(USER_TX_BY_PERIOD_AND_CHAIN_EXTENDED, &address), &query);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transactions") else {
            return false;
        };
        let Some(txs) = reply.decode::<Vec<TransactionHistoryItem>>(&data, "transactions by time period") else {
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
            format_period_extended(&txs, &address, &chain, Some(&period)),
            json!({ "transactions": data }),
        )
    }
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Per-type summary with fee and value totals, then the first ten entries.
pub fn format_period_extended(
    txs: &[TransactionHistoryItem],
    user_address: &str,
    chain: &str,
    period: Option<&TimePeriod>,
) -> String {
    let mut out = format!("📊 Extended Transaction History for {}\n", user_address);
    out += &format!("🔗 Chain: {}\n", chain_display_name(chain));
    if let Some(range) = period_text(period) {
        out += &format!("📅 Period: {}\n", range);
    }
    out += &format!("📈 Found {} transactions\n\n", txs.len());
    if txs.is_empty() {
        out += "No transactions found in the specified period.";
        return out;
    }

    let groups = group_in_order(txs, |tx| non_empty(&tx.tx_type).unwrap_or("Unknown").to_string());
    let total_fees: f64 = txs.iter().filter_map(|tx| tx.tx_fee_usd).sum();
    let total_value: f64 = txs
        .iter()
        .filter_map(|tx| tx.balances.first().and_then(|b| b.balance_usd))
        .filter(|usd| *usd > 0.0)
        .sum();

    out += "📋 Summary:\n";
    for (tx_type, members) in &groups {
        out += &format!("• {}: {} transaction{}\n", tx_type, members.len(), plural(members.len()));
    }
    out += &format!("💰 Total Fees: ${}\n", to_fixed(total_fees, 4));
    if total_value > 0.0 {
        out += &format!("💵 Total Value: ${}\n", to_fixed(total_value, 2));
    }
    out += "\n";

    let shown = txs.len().min(SHOWN);
    out += &format!("🔍 Transaction Details (showing {} of {}):\n\n", shown, txs.len());
    for (i, tx) in txs.iter().take(shown).enumerate() {
        let classification = non_empty(&tx.tx_classification)
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();
        out += &format!("{}. {}{}\n", i + 1, non_empty(&tx.tx_type).unwrap_or("Transaction"), classification);
        out += &format!("   📅 {}\n", tx_date(tx.time_stamp));
        out += &format!("   🔗 Hash: {}\n", tx.hash.as_deref().unwrap_or("undefined"));

        let (value, symbol) = first_value(tx);
        let priced = value.starts_with('$');
        let token_info = symbol.filter(|_| priced).map(|s| format!(" ({})", s)).unwrap_or_default();
        out += &format!("   💰 Value: {}{}\n", value, token_info);

        if let Some(fee) = tx.tx_fee_usd.filter(|f| *f != 0.0) {
            out += &format!("   ⛽ Fee: ${}\n", to_fixed(fee, 4));
        }
        if let Some(from) = non_empty(&tx.from) {
            out += &format!("   📤 From: {}\n", you_or(from, user_address));
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("   📥 To: {}\n", you_or(to, user_address));
        }
        if let Some(first) = tx.balances.first() {
            if let Some(nft) = &first.nft_details {
                out += &format!(
                    "   🎨 NFT: {} - {}\n",
                    non_empty(&nft.action).unwrap_or("NFT"),
                    non_empty(&first.token_name).unwrap_or("Unknown")
                );
            }
        }
        if let Some(action) = non_empty(&tx.tx_action) {
            out += &format!("   ⚡ Action: {}\n", action);
        }
        out += "\n";
    }

    if txs.len() > shown {
        out += &format!("... and {} more transactions.\n", txs.len() - shown);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50";

    #[tokio::test]
    async fn validate_needs_all_signals() {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let action = UserTxByPeriodAndChainExtendedAction;
        let full = format!(
            "Show me extended transaction history on xDai chain for wallet {} with startTime=1716346533 and endTime=1705895733",
            ADDR
        );
        assert!(action.validate(&rt, &Memory::from_text(full)).await);
        let no_period = format!("Show me extended transaction history on xDai chain for wallet {}", ADDR);
        assert!(!action.validate(&rt, &Memory::from_text(no_period)).await);
    }

    #[tokio::test]
    async fn missing_period_prompts() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        let msg = Memory::from_text(format!("extended transaction history on eth for {}", ADDR));
        let ok = UserTxByPeriodAndChainExtendedAction
            .handler(&StaticRuntime::new(), &msg, None, None, Some(&mut cb))
            .await;
        assert!(!ok);
        assert_eq!(seen[0].content.error.as_deref(), Some("No time period specified"));
    }

    #[test]
    fn summary_and_details() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([
            {
                "txType": "Swap", "txClassification": "dex", "hash": "0x1", "txFeeUsd": 0.01234,
                "from": ADDR, "to": "0xpool", "txAction": "swap",
                "balances": [{"balanceUSD": 10, "tokenSymbol": "WXDAI"}]
            },
            {"txType": "Swap", "hash": "0x2", "txFeeUsd": 0.5, "balances": [{"balance": "2000000", "tokenSymbol": "USDC", "tokenDecimals": 6}]},
            {"hash": "0x3"}
        ]))
        .unwrap();
        let period = TimePeriod { start_time: 1_716_346_533, end_time: 1_705_895_733 };
        let text = format_period_extended(&txs, ADDR, "xdai", Some(&period));
        assert!(text.starts_with(&format!(
            "📊 Extended Transaction History for {}\n🔗 Chain: xDai\n📅 Period: from 1/22/2024 to 5/22/2024\n📈 Found 3 transactions\n\n",
            ADDR
        )));
        assert!(text.contains(
            "📋 Summary:\n• Swap: 2 transactions\n• Unknown: 1 transaction\n💰 Total Fees: $0.5123\n💵 Total Value: $10.00\n\n🔍 Transaction Details (showing 3 of 3):\n\n"
        ));
        assert!(text.contains(
            "1. Swap (dex)\n   📅 Unknown date\n   🔗 Hash: 0x1\n   💰 Value: $10.00 (WXDAI)\n   ⛽ Fee: $0.0123\n   📤 From: You\n   📥 To: 0xpool\n   ⚡ Action: swap\n\n"
        ));
        assert!(text.contains("2. Swap\n   📅 Unknown date\n   🔗 Hash: 0x2\n   💰 Value: 2.0000 USDC\n   ⛽ Fee: $0.5000\n\n"));
        assert!(text.ends_with("3. Transaction\n   📅 Unknown date\n   🔗 Hash: 0x3\n   💰 Value: N/A\n\n"));
    }

    #[test]
    fn empty_period() {
        let text = format_period_extended(&[], ADDR, "eth", None);
        assert!(text.contains("📈 Found 0 transactions\n\n"));
        assert!(text.ends_with("No transactions found in the specified period."));
    }
}
