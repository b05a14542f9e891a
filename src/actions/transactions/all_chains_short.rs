// src/actions/transactions/all_chains_short.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{first_value, group_in_order, non_empty};
use crate::actions::{api_key, exchange, option_u32, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_TX_HISTORY_ALL_CHAINS_SHORT};
use crate::datai::models::TransactionHistoryItem;
use crate::extract::{ci_all, count_distinct_matches, extract_wallet_address, is_valid_wallet_address, matches_any};
use crate::format::{chain_display_name, date_string, short_address, time_string};
use crate::runtime::AgentRuntime;

pub struct UserTxHistoryAllChainsShortAction;

const NAME: &str = "GET_USER_TX_HISTORY_ALL_CHAINS_SHORT_DATAI";
const DEFAULT_LIMIT: u32 = 20;
const SHOWN: usize = 10;
const TOP_CHAINS: usize = 5;

lazy_static! {
    static ref ALL_CHAINS_KEYWORDS: Vec<Regex> = ci_all(&[
        r"all chains",
        r"across.*chains",
        r"all.*blockchains",
        r"every.*chain",
        r"multi.*chain",
        r"cross.*chain",
        r"all.*networks",
    ]);
    static ref SHORT_TX_KEYWORDS: Vec<Regex> = ci_all(&[
        r"brief.*tx.*history",
        r"short.*tx.*history",
        r"tx.*history.*short",
        r"brief.*transaction.*history",
        r"short.*transaction.*history",
        r"transaction.*history.*short",
        r"recent.*transactions",
        r"latest.*transactions",
        r"quick.*overview",
        r"summary.*transactions",
        r"brief.*summary",
        r"short.*list",
        r"recent.*activity",
        r"latest.*activity",
    ]);
    static ref CHAIN_MENTIONS: Vec<Regex> = ci_all(&[
        r"ethereum",
        r"\beth\b",
        r"arbitrum",
        r"\barb\b",
        r"avalanche",
        r"\bavax\b",
        r"polygon",
        r"\bmatic\b",
        r"optimism",
        r"\bop\b",
        r"base",
        r"binance",
        r"\bbsc\b",
        r"\bbnb\b",
        r"blast",
        r"linea",
        r"scroll",
        r"zksync",
        r"\bera\b",
        r"berachain",
        r"mantle",
        r"\bmnt\b",
        r"fantom",
        r"\bftm\b",
        r"celo",
        r"kaia",
        r"\bklay\b",
    ]);
}

#[async_trait]
impl Action for UserTxHistoryAllChainsShortAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_TX_HISTORY_ALL_CHAINS_SHORT_DATAI",
            "FETCH_SHORT_TX_HISTORY_ALL_CHAINS_DATAI",
            "LIST_RECENT_TRANSACTIONS_SHORT_ALL_CHAINS_DATAI",
            "SHOW_BRIEF_TX_HISTORY_ALL_CHAINS_DATAI",
            "GET_MY_RECENT_TRANSACTIONS_SHORT_LIST_ALL_CHAINS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves a shorter transaction history (up to 20 entries) for a user across blockchains"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Give me a brief transaction history across all chains for wallet 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 on DATAI",
                "Here's a brief summary of your recent transactions across all chains for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045...",
                NAME,
            ),
            exchange(
                "Show me a short tx history on all chains for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 on DATAI",
                "Fetching a short transaction history across all chains for wallet 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045...",
                NAME,
            ),
            exchange(
                "What are my recent transactions across all chains? Quick overview for address 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 on DATAI",
                "Let me retrieve a quick overview of your recent blockchain activities across all chains for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045...",
                NAME,
            ),
            exchange(
                "Latest activity across all chains - short list for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 on DATAI",
                "Here's your latest activity across all chains in a short list format for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045...",
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
        let all_chains = matches_any(&ALL_CHAINS_KEYWORDS, text);
        let short = matches_any(&SHORT_TX_KEYWORDS, text);
        let chain_count = count_distinct_matches(&CHAIN_MENTIONS, text);
        debug!("{}: all_chains={} short={} chains={}", NAME, all_chains, short, chain_count);

        if chain_count == 1 {
            return false;
        }
        if chain_count > 1 && !all_chains {
            return false;
        }
        if all_chains && !short {
            return false;
        }
        (all_chains && short) || (short && chain_count == 0)
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
        let Some(address) = extract_wallet_address(message.text()) else {
            return reply.prompt(
                "Please provide a valid wallet address to check transaction history.",
                "No wallet address provided",
            );
        };
        let limit = option_u32(options, "limit").filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching short transaction history for {} (limit: {})", address, limit);
        let endpoint = with_query(
            for_user(USER_TX_HISTORY_ALL_CHAINS_SHORT, &address),
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

        reply.success(format_short_history(&txs, &address), json!({ "transactions": data }))
    }
}

fn type_emoji(tx_type: &str) -> &'static str {
    match tx_type {
        "Send" => "📤",
        "Receive" => "📥",
        "execute" => "⚡",
        "mintBatch" => "🎨",
        "Swap" => "🔄",
        "Transfer" => "↔️",
        _ => "📋",
    }
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Ten most recent entries, then activity per chain.
pub fn format_short_history(txs: &[TransactionHistoryItem], user_address: &str) -> String {
    let mut out = format!("📊 Recent Transaction History ({} transactions)\n", txs.len());
    out += &format!("👤 Wallet: {}\n\n", short_address(user_address));

    let groups = group_in_order(txs, |tx| non_empty(&tx.chain).unwrap_or("unknown").to_string());
    if groups.len() > 1 {
        let chains: Vec<String> = groups.iter().map(|(c, _)| c.to_uppercase()).collect();
        out += &format!("🔗 Active Chains: {}\n\n", chains.join(", "));
    }

    for (i, tx) in txs.iter().take(SHOWN).enumerate() {
        let tx_type = non_empty(&tx.tx_type);
        let chain_name = non_empty(&tx.chain).map(chain_display_name).unwrap_or_else(|| "Unknown".to_string());
        out += &format!(
            "{}. {} {} on {}\n",
            i + 1,
            type_emoji(tx_type.unwrap_or("")),
            tx_type.unwrap_or("Transaction"),
            chain_name
        );

        let (value, symbol) = first_value(tx);
        out += &format!("   💰 Value: {}", value);
        if let Some(symbol) = symbol.filter(|_| value != "N/A") {
            out += &format!(" ({})", symbol);
        }
        let (date, time) = match tx.time_stamp.filter(|t| *t != 0.0) {
            Some(ts) => (date_string(ts), time_string(ts)),
            None => ("Unknown date".to_string(), String::new()),
        };
        out += &format!("\n   📅 {} {}\n", date, time);

        if let Some(hash) = non_empty(&tx.hash) {
            let chars: Vec<char> = hash.chars().collect();
            let head: String = chars.iter().take(8).collect();
            let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
            out += &format!("   🔗 Hash: {}...{}\n", head, tail);
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
        out += "\n";
    }

    if txs.len() > SHOWN {
        out += &format!("... and {} more transactions\n\n", txs.len() - SHOWN);
    }

    let mut ranked: Vec<&(String, Vec<&TransactionHistoryItem>)> = groups.iter().collect();
    ranked.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    out += "📈 Chain Activity Summary:\n";
    for (chain, members) in ranked.into_iter().take(TOP_CHAINS) {
        out += &format!(
            "• {}: {} transaction{}\n",
            chain_display_name(chain),
            members.len(),
            plural(members.len())
        );
    }

    out += &format!("\n🔍 Full Address: {}", user_address);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    async fn fires(text: String) -> bool {
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        UserTxHistoryAllChainsShortAction.validate(&rt, &Memory::from_text(text)).await
    }

    #[tokio::test]
    async fn keyword_rules() {
        assert!(fires(format!("Give me a brief transaction history across all chains for wallet {}", ADDR)).await);
        assert!(fires(format!("recent transactions for {}", ADDR)).await);
        // one named chain belongs to the single-chain actions
        assert!(!fires(format!("recent transactions on ethereum for {}", ADDR)).await);
        // all chains without short wording is the full history
        assert!(!fires(format!("transaction history across all chains for {}", ADDR)).await);
        assert!(!fires(format!("recent transactions on ethereum and arbitrum for {}", ADDR)).await);
        assert!(!fires(format!("what does {} hold", ADDR)).await);
    }

    #[test]
    fn short_report() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([
            {
                "chain": "eth", "txType": "Swap", "timeStamp": 1710450300,
                "hash": "0x1234567890abcdef1234567890abcdef",
                "balances": [{"balanceUSD": 99.5, "tokenSymbol": "USDC"}]
            },
            {
                "chain": "base", "txType": "mintBatch",
                "balances": [{"tokenName": "Zorb", "nftDetails": {"action": "mint"}}]
            },
            {"chain": "eth", "txType": "Send", "balances": [{"balance": "3000000000000000000", "tokenSymbol": "ETH"}]}
        ]))
        .unwrap();
        let text = format_short_history(&txs, ADDR);
        assert!(text.starts_with(
            "📊 Recent Transaction History (3 transactions)\n👤 Wallet: 0xd8dA...6045\n\n🔗 Active Chains: ETH, BASE\n\n"
        ));
        assert!(text.contains(
            "1. 🔄 Swap on Ethereum\n   💰 Value: $99.50 (USDC)\n   📅 3/14/2024 9:05:00 PM\n   🔗 Hash: 0x123456...abcdef\n\n"
        ));
        assert!(text.contains("2. 🎨 mintBatch on Base\n   💰 Value: N/A\n   📅 Unknown date \n   🎨 NFT: mint - Zorb\n\n"));
        assert!(text.contains("3. 📤 Send on Ethereum\n   💰 Value: 3.0000 ETH (ETH)\n"));
        assert!(text.contains("📈 Chain Activity Summary:\n• Ethereum: 2 transactions\n• Base: 1 transaction\n"));
        assert!(text.ends_with(&format!("\n🔍 Full Address: {}", ADDR)));
    }

    #[test]
    fn empty_history() {
        let text = format_short_history(&[], ADDR);
        assert!(text.starts_with("📊 Recent Transaction History (0 transactions)\n"));
    }
}
