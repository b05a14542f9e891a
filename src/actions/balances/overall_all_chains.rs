// src/actions/balances/overall_all_chains.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::percent_of;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, USER_OVERALL_BALANCE_ALL_CHAINS};
use crate::datai::models::{ChainBalanceInfo, UserOverallBalanceAllChains};
use crate::extract::params::validate_required;
use crate::extract::{ci_all, count_distinct_matches, extract_wallet_address, matches_any};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct UserOverallBalanceAllChainsAction;

const NAME: &str = "GET_USER_OVERALL_BALANCE_ALL_CHAINS_DATAI";
const SMALL_BALANCE_USD: f64 = 0.01;
const ALWAYS_LISTED: usize = 10;

lazy_static! {
    static ref ALL_CHAINS_KEYWORDS: Vec<Regex> = ci_all(&[
        r"balance on all chains",
        r"balance across all chains",
        r"overall balance on all chains",
        r"all chains balance",
        r"all chains balances",
        r"total balance.*all chains",
        r"portfolio.*all chains",
        r"across all.*chain",
        r"all.*chain.*balance",
        r"overall.*balance",
        r"total.*portfolio",
        r"complete.*balance",
        r"full.*portfolio",
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
        r"mantle",
        r"\bmnt\b",
    ]);
}

#[async_trait]
impl Action for UserOverallBalanceAllChainsAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_OVERALL_BALANCE_ALL_CHAINS_DATAI",
            "FETCH_ALL_CHAIN_USER_TOTAL_BALANCE_DATAI",
            "RETRIEVE_USER_OVERALL_BALANCES_ALL_CHAINS_DATAI",
            "SHOW_TOTAL_BALANCE_ALL_CHAINS_DATAI",
            "LIST_ALL_BALANCES_FOR_ALL_CHAINS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves a user's overall balance across all chains, including tokens, NFTs, and DeFi exposures"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What is my total balance across all chains? My wallet address is 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106 on DATAI",
                "Let me check your overall balance across all blockchains...",
                NAME,
            ),
            exchange(
                "Show me the all chains portfolio value for 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106 on DATAI",
                "I'll fetch your total portfolio value across all chains. One moment please...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        let Some(address) = extract_wallet_address(text) else {
            return false;
        };
        let chain_count = count_distinct_matches(&CHAIN_MENTIONS, text);
        if chain_count >= 1 && !matches_any(&ALL_CHAINS_KEYWORDS, text) {
            debug!("{}: {} specific chains mentioned, declining", NAME, chain_count);
            return false;
        }
        validate_required(&[("userAddress", Some(address.as_str()))]).is_valid
    }

    async fn handler(
        &self,
        runtime: &dyn AgentRuntime,
        message: &Memory,
        _state: Option<&Value>,
        _options: Option<&Value>,
        callback: Option<&mut (dyn FnMut(ActionResponse) + Send)>,
    ) -> bool {
        let mut reply = Reply::new(callback);
        let Some(address) = extract_wallet_address(message.text()) else {
            return reply.prompt(
                "Please provide a valid wallet address to check balances.",
                "No wallet address provided",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching overall balance across all chains for {}", address);
        let endpoint = for_user(USER_OVERALL_BALANCE_ALL_CHAINS, &address);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "overall balance") else {
            return false;
        };
        if data.is_null() {
            return reply.success(
                format!("No balance information found for address {}.", address),
                json!({ "balance": null }),
            );
        }
        let Some(balance) = reply.decode::<UserOverallBalanceAllChains>(&data, "overall balance") else {
            return false;
        };

        reply.success(format_overall_balance(&balance, &address), json!({ "balance": data }))
    }
}

fn value(chain: &ChainBalanceInfo) -> f64 {
    chain.value_usd.unwrap_or(0.0)
}

fn name(chain: &ChainBalanceInfo) -> &str {
    chain.name.as_deref().unwrap_or("undefined")
}

pub fn format_overall_balance(balance: &UserOverallBalanceAllChains, user_address: &str) -> String {
    let total = balance.total_value_usd.unwrap_or(0.0);
    let mut out = format!("Overall Portfolio Balance for {}:\n\n", user_address);
    out += &format!("💰 Total Value: ${}\n\n", to_fixed(total, 2));

    let mut active: Vec<&ChainBalanceInfo> = balance.by_chain.iter().filter(|c| value(c) > 0.0).collect();
    active.sort_by(|a, b| value(b).total_cmp(&value(a)));

    if active.is_empty() {
        out += "No active balances found across any chains.\n";
    } else {
        out += &format!("📊 Active Chains ({} of {}):\n\n", active.len(), balance.by_chain.len());
        let mut small = Vec::new();
        for (index, chain) in active.iter().enumerate() {
            let v = value(chain);
            if v > SMALL_BALANCE_USD || index < ALWAYS_LISTED {
                let pct = percent_of(v, total);
                out += &format!(
                    "{}. {} ({})\n",
                    index + 1,
                    name(chain),
                    chain.id.as_deref().unwrap_or("").to_uppercase()
                );
                out += &format!("   Value: ${}", to_fixed(v, 2));
                if pct >= 0.1 {
                    out += &format!(" ({}%)", to_fixed(pct, 1));
                }
                out += "\n\n";
            } else {
                small.push(v);
            }
        }
        if !small.is_empty() {
            out += &format!(
                "... and {} other chains with small balances totaling ${}\n\n",
                small.len(),
                to_fixed(small.iter().sum(), 4)
            );
        }

        if active.len() > 1 {
            out += "🏆 Top 3 Chains by Value:\n";
            for (index, chain) in active.iter().take(3).enumerate() {
                let v = value(chain);
                out += &format!(
                    "{}. {}: ${} ({}%)\n",
                    index + 1,
                    name(chain),
                    to_fixed(v, 2),
                    to_fixed(percent_of(v, total), 1)
                );
            }
        }
    }

    if total > 0.0 {
        out += "\n📈 Portfolio Insights:\n";
        out += &format!("• Active Chains: {}\n", active.len());
        out += &format!(
            "• Largest Position: {}\n",
            active.first().and_then(|c| c.name.as_deref()).filter(|n| !n.is_empty()).unwrap_or("N/A")
        );
        if active.len() > 1 {
            let top = active.first().map(|c| value(c)).unwrap_or(0.0);
            out += &format!("• Concentration: {}% in top chain\n", to_fixed(percent_of(top, total), 1));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0x09CF915e195aF33FA7B932C253352Ae9FBdB0106";

    #[tokio::test]
    async fn specific_chains_need_all_chains_wording() {
        let action = UserOverallBalanceAllChainsAction;
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let plain = Memory::from_text(format!("What is my total balance across all chains? {}", ADDR));
        assert!(action.validate(&rt, &plain).await);
        let one_chain = Memory::from_text(format!("What is my balance on Ethereum for {}", ADDR));
        assert!(!action.validate(&rt, &one_chain).await);
        let one_chain_overall = Memory::from_text(format!("overall balance including ethereum for {}", ADDR));
        assert!(action.validate(&rt, &one_chain_overall).await);
    }

    #[test]
    fn lists_active_chains_by_value() {
        let balance: UserOverallBalanceAllChains = serde_json::from_value(json!({
            "totalValueUsd": 1000,
            "byChain": [
                {"id": "arb", "name": "Arbitrum", "valueUsd": 250},
                {"id": "eth", "name": "Ethereum", "valueUsd": 750},
                {"id": "op", "name": "Optimism", "valueUsd": 0}
            ]
        }))
        .unwrap();
        let text = format_overall_balance(&balance, ADDR);
        assert!(text.starts_with(&format!("Overall Portfolio Balance for {}:\n\n💰 Total Value: $1000.00\n\n📊 Active Chains (2 of 3):\n\n1. Ethereum (ETH)\n   Value: $750.00 (75.0%)\n\n2. Arbitrum (ARB)\n", ADDR)));
        assert!(text.contains("🏆 Top 3 Chains by Value:\n1. Ethereum: $750.00 (75.0%)\n2. Arbitrum: $250.00 (25.0%)\n"));
        assert!(text.ends_with("\n📈 Portfolio Insights:\n• Active Chains: 2\n• Largest Position: Ethereum\n• Concentration: 75.0% in top chain\n"));
    }

    #[test]
    fn dust_beyond_the_first_ten_is_summarised() {
        let mut chains: Vec<Value> = (0..10)
            .map(|i| json!({"id": format!("c{}", i), "name": format!("Chain {}", i), "valueUsd": 100 - i}))
            .collect();
        chains.push(json!({"id": "dust1", "name": "Dust 1", "valueUsd": 0.005}));
        chains.push(json!({"id": "dust2", "name": "Dust 2", "valueUsd": 0.002}));
        let balance: UserOverallBalanceAllChains =
            serde_json::from_value(json!({"totalValueUsd": 955, "byChain": chains})).unwrap();
        let text = format_overall_balance(&balance, ADDR);
        assert!(!text.contains("Dust 1"));
        assert!(text.contains("... and 2 other chains with small balances totaling $0.0070\n\n"));
    }

    #[test]
    fn empty_portfolio() {
        let text = format_overall_balance(&UserOverallBalanceAllChains::default(), ADDR);
        assert!(text.ends_with("💰 Total Value: $0.00\n\nNo active balances found across any chains.\n"));
    }
}
