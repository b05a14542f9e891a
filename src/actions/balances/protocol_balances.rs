// src/actions/balances/protocol_balances.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::percent_of;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN};
use crate::datai::models::{ProtocolBalanceDetail, UserDeFiProtocolBalance};
use crate::extract::params::validate_defi_positions_by_chain_params;
use crate::extract::{ci_all, count_distinct_matches, extract_chain_id, extract_wallet_address, matches_any};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct UserDeFiProtocolBalancesByChainAction;

const NAME: &str = "GET_USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN_DATAI";

lazy_static! {
    static ref PROTOCOL_BALANCE_KEYWORDS: Vec<Regex> = ci_all(&[
        r"protocol balance",
        r"protocol balances",
        r"balance of.*protocol",
        r"balances.*protocol",
        r"protocol.*balance",
        r"all protocol",
        r"protocol summary",
        r"protocol overview",
        r"across.*protocol",
        r"all.*defi.*protocol",
    ]);
    static ref NAMED_PROTOCOLS: Vec<Regex> = ci_all(&[
        r"\w+_\w+",
        r"compound",
        r"aave",
        r"uniswap",
        r"curve",
        r"yearn",
        r"badger",
        r"pendle",
        r"etherfi",
        r"stakestone",
        r"harvest",
        r"instadapp",
        r"rari",
        r"mesher",
        r"etherdelta",
    ]);
    static ref CHAIN_NAMES: Vec<Regex> = ci_all(&[
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
    ]);
}

#[async_trait]
impl Action for UserDeFiProtocolBalancesByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN_DATAI",
            "FETCH_USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN_DATAI",
            "GET_USER_DEFI_PROTOCOL_SUMMARY_BY_CHAIN_DATAI",
            "SHOW_USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN_DATAI",
            "LIST_USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves a summary of user's balances (supply, debt, NAV) across all DeFi protocols on a specific chain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What is my DeFi protocol balances on the chain Ethereum for wallet 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106 on DATAI?",
                "I'll check your protocol balances on Ethereum...",
                NAME,
            ),
            exchange(
                "Show me a summary of DeFi protocols for address 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106 on eth chain on DATAI?",
                "Retrieving a summary of DeFi protocol balances on Ethereum...",
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
        let chain_count = count_distinct_matches(&CHAIN_NAMES, text);
        if chain_count > 1 {
            debug!("{}: {} chains mentioned, declining", NAME, chain_count);
            return false;
        }
        // naming a protocol means a per-protocol request unless balances are asked for
        let protocol_count = count_distinct_matches(&NAMED_PROTOCOLS, text);
        if protocol_count >= 1 && !matches_any(&PROTOCOL_BALANCE_KEYWORDS, text) {
            return false;
        }
        validate_defi_positions_by_chain_params(Some(address.as_str()), Some(chain.as_str())).is_valid
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
        let (Some(address), Some(chain)) = (extract_wallet_address(text), extract_chain_id(text)) else {
            return reply.prompt(
                "Please provide both a valid wallet address and chain ID to check DeFi protocol balances.",
                "Missing required parameters",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching DeFi protocol balances for {} on {}", address, chain);
        let endpoint = with_query(
            for_user(USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN, &address),
            &[("chain", chain.clone())],
        );
        let subject = "DeFi protocol balances";
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, subject) else {
            return false;
        };
        let Some(balances) = reply.decode::<Vec<UserDeFiProtocolBalance>>(&data, subject) else {
            return false;
        };
        if balances.is_empty() {
            return reply.success(
                format!(
                    "No DeFi protocol balances found for address {} on chain {}.",
                    address,
                    chain.to_uppercase()
                ),
                json!({ "protocolBalances": [] }),
            );
        }

        let totals = ProtocolTotals::of(&balances);
        reply.success(
            format_protocol_balances(&balances, &address, &chain),
            json!({
                "protocolBalances": data,
                "summary": {
                    "totalSupplyUSD": totals.asset,
                    "totalDebtUSD": totals.debt,
                    "totalNavUSD": totals.nav,
                    "protocolCount": balances.len(),
                }
            }),
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ProtocolTotals {
    asset: f64,
    debt: f64,
    nav: f64,
}

impl ProtocolTotals {
    fn of(balances: &[UserDeFiProtocolBalance]) -> Self {
        balances.iter().fold(Self::default(), |acc, p| {
            let b = balance(p);
            Self {
                asset: acc.asset + b.asset_usd.unwrap_or(0.0),
                debt: acc.debt + b.debt_usd.unwrap_or(0.0),
                nav: acc.nav + b.nav_usd.unwrap_or(0.0),
            }
        })
    }
}

fn balance(protocol: &UserDeFiProtocolBalance) -> ProtocolBalanceDetail {
    protocol.balance.clone().unwrap_or_default()
}

fn nav(protocol: &UserDeFiProtocolBalance) -> f64 {
    protocol.balance.as_ref().and_then(|b| b.nav_usd).unwrap_or(0.0)
}

fn display_name(protocol: &UserDeFiProtocolBalance) -> &str {
    protocol
        .common_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .or(protocol.name.as_deref())
        .unwrap_or("undefined")
}

pub fn format_protocol_balances(balances: &[UserDeFiProtocolBalance], user_address: &str, chain: &str) -> String {
    let totals = ProtocolTotals::of(balances);
    let mut sorted: Vec<&UserDeFiProtocolBalance> = balances.iter().collect();
    sorted.sort_by(|a, b| nav(b).total_cmp(&nav(a)));

    let chain_upper = chain.to_uppercase();
    let mut out = format!("DeFi Protocol Balances for {} on {}:\n\n", user_address, chain_upper);
    for (index, protocol) in sorted.iter().enumerate() {
        out += &format!("{}. Protocol: {}\n", index + 1, display_name(protocol));
        if let Some(site) = protocol.site.as_deref().filter(|s| !s.is_empty()) {
            out += &format!("   Website: {}\n", site);
        }
        let b = balance(protocol);
        let nav_usd = b.nav_usd.unwrap_or(0.0);
        out += &format!("   Supply Value: ${}\n", to_fixed(b.asset_usd.unwrap_or(0.0), 2));
        out += &format!("   Debt Value: ${}\n", to_fixed(b.debt_usd.unwrap_or(0.0), 2));
        out += &format!("   Net Value: ${}\n", to_fixed(nav_usd, 2));
        if totals.nav > 0.0 {
            out += &format!("   Portfolio %: {}%\n", to_fixed(percent_of(nav_usd, totals.nav), 1));
        }
        out += "\n";
    }

    out += "-------------------\n";
    out += &format!("Overall Summary on {}:\n", chain_upper);
    out += &format!("Total Supply Value: ${}\n", to_fixed(totals.asset, 2));
    out += &format!("Total Debt Value: ${}\n", to_fixed(totals.debt, 2));
    out += &format!("Total Net Value: ${}\n", to_fixed(totals.nav, 2));
    out += &format!("Active Protocols: {}\n", balances.len());

    if !sorted.is_empty() {
        out += "\nTop Protocols by Value:\n";
        for (index, protocol) in sorted.iter().take(3).enumerate() {
            let nav_usd = nav(protocol);
            out += &format!(
                "{}. {}: ${} ({}%)\n",
                index + 1,
                display_name(protocol),
                to_fixed(nav_usd, 2),
                to_fixed(percent_of(nav_usd, totals.nav), 1)
            );
        }
    }
    out
}
