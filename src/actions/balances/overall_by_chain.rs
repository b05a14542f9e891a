// src/actions/balances/overall_by_chain.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_OVERALL_BALANCE_BY_SINGLE_CHAIN};
use crate::datai::models::UserOverallBalanceByChain;
use crate::extract::params::validate_required;
use crate::extract::{ci_all, count_distinct_matches, extract_chain_id, extract_wallet_address, matches_any};
use crate::format::{chain_display_name, short_address, to_fixed};
use crate::runtime::AgentRuntime;

pub struct UserOverallBalanceByChainAction;

const NAME: &str = "GET_USER_OVERALL_BALANCE_BY_SINGLE_CHAIN_DATAI";

lazy_static! {
    static ref SINGLE_CHAIN_KEYWORDS: Vec<Regex> = ci_all(&[
        r"total balance.*on",
        r"overall balance.*on",
        r"balance.*on.*chain",
        r"net worth.*on",
        r"portfolio.*on",
        r"worth.*on",
        r"balance.*for.*chain",
        r"total.*on.*chain",
        r"overall.*on.*chain",
        r"my.*balance.*on",
        r"wallet.*worth.*on",
        r"balance.*specific.*chain",
        r"single.*chain.*balance",
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
    static ref ALL_CHAINS_KEYWORDS: Vec<Regex> = ci_all(&[
        r"balance.*across.*all.*chains",
        r"balance.*on.*all.*chains",
        r"all.*chains.*balance",
        r"overall.*balance.*all.*chains",
        r"total.*balance.*all.*chains",
        r"portfolio.*all.*chains",
        r"across.*all.*blockchains",
        r"complete.*portfolio",
        r"full.*portfolio",
    ]);
}

#[async_trait]
impl Action for UserOverallBalanceByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_OVERALL_BALANCE_BY_SINGLE_CHAIN_DATAI",
            "FETCH_SINGLE_CHAIN_OVERALL_BALANCE_DATAI",
            "GET_TOTAL_BALANCE_FOR_SINGLE_CHAIN_DATAI",
            "SHOW_NET_WORTH_ON_SINGLE_CHAIN_DATAI",
            "CHECK_BALANCE_FOR_SPECIFIC_CHAIN_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves the user's overall balance for a specific chain, including tokens, NFTs, and DeFi exposures"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What's my total balance on Avalanche chain? My wallet is 0x21dd5c13925407e5bcec3f27ab11a355a9dafbe3 on DATAI",
                "Let me check your overall balance on Avalanche...",
                NAME,
            ),
            exchange(
                "Show the net worth for 0x21dd5c13925407e5bcec3f27ab11a355a9dafbe3 on avax on DATAI",
                "I'll fetch your overall balance on Avalanche. One moment please...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        let (Some(address), Some(chain)) = (extract_wallet_address(text), extract_chain_id(text)) else {
            return false;
        };
        if matches_any(&ALL_CHAINS_KEYWORDS, text) {
            debug!("{}: all-chains wording, declining", NAME);
            return false;
        }
        let chain_count = count_distinct_matches(&CHAIN_MENTIONS, text);
        if chain_count > 1 {
            debug!("{}: {} chains mentioned, declining", NAME, chain_count);
            return false;
        }
        if chain_count != 1 && !matches_any(&SINGLE_CHAIN_KEYWORDS, text) {
            return false;
        }
        validate_required(&[("userAddress", Some(address.as_str())), ("chain", Some(chain.as_str()))]).is_valid
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
        let text = message.text();
        let (address, chain) = (extract_wallet_address(text), extract_chain_id(text));
        let (Some(address), Some(chain)) = (address.clone(), chain) else {
            return reply.prompt(
                "Please provide a valid wallet address and chain ID to check overall balance.",
                if address.is_none() { "No wallet address provided" } else { "No chain ID provided" },
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching overall balance for {} on {}", address, chain);
        let endpoint = with_query(
            for_user(USER_OVERALL_BALANCE_BY_SINGLE_CHAIN, &address),
            &[("chain", chain.clone())],
        );
        let subject = format!("overall balance on chain {}", chain);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, &subject) else {
            return false;
        };
        if data.is_null() {
            return reply.success(
                format!("No balance data found for address {} on chain {}.", address, chain),
                json!({ "balance": null }),
            );
        }
        let Some(balance) = reply.decode::<UserOverallBalanceByChain>(&data, "overall balance") else {
            return false;
        };

        reply.success(format_chain_balance(&balance, &address, &chain), json!({ "balance": data }))
    }
}

fn tier(usd: f64) -> &'static str {
    if usd >= 10_000.0 {
        "🚀 Significant portfolio value detected!\n"
    } else if usd >= 1_000.0 {
        "📈 Good portfolio value on this chain.\n"
    } else if usd >= 100.0 {
        "💼 Moderate balance on this chain.\n"
    } else {
        "🔍 Small balance detected on this chain.\n"
    }
}

pub fn format_chain_balance(balance: &UserOverallBalanceByChain, user_address: &str, chain: &str) -> String {
    let usd = balance.value_usd.unwrap_or(0.0);
    let mut out = format!("💰 Overall Balance for {}\n", user_address);
    out += &format!("🔗 Chain: {}\n\n", chain_display_name(chain));
    out += &format!("💵 Primary Value: ${} USD\n\n", to_fixed(usd, 2));

    if usd > 0.0 {
        let fiat = |v: Option<f64>| to_fixed(v.unwrap_or(0.0), 2);
        out += "🌍 Multi-Currency Values:\n";
        out += &format!("• EUR: €{}\n", fiat(balance.value_eur));
        out += &format!("• GBP: £{}\n", fiat(balance.value_gbp));
        out += &format!("• AUD: A${}\n", fiat(balance.value_aud));
        out += &format!("• CAD: C${}\n", fiat(balance.value_cad));
        out += &format!("• AED: {} AED\n", fiat(balance.value_aed));
        out += &format!("• INR: ₹{}\n\n", fiat(balance.value_inr));
        out += tier(usd);
    } else {
        out += "❌ No balance found on this chain.\n";
    }

    out += &format!("\n📋 Wallet: {}\n", short_address(user_address));
    out += &format!("🔗 Full Address: {}", user_address);
    out
}
