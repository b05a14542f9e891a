// src/actions/balances/grouped_tokens.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, GROUPED_TOKEN_BALANCES_BY_MULTIPLE_CHAINS};
use crate::datai::models::{TokenBalanceWithPrice, TokenBalancesByChain};
use crate::extract::{extract_multiple_chain_ids, extract_wallet_address};
use crate::format::{locale_number, to_exponential, to_fixed};
use crate::runtime::AgentRuntime;

pub struct GroupedTokenBalancesByMultipleChainsAction;

const NAME: &str = "GET_GROUPED_TOKEN_BALANCES_BY_MULTIPLE_CHAINS_DATAI";
const SIGNIFICANT_USD: f64 = 1.0;
const TOKENS_SHOWN: usize = 5;

#[async_trait]
impl Action for GroupedTokenBalancesByMultipleChainsAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_GROUPED_TOKEN_BALANCES_BY_CHAINS_DATAI",
            "FETCH_TOKENS_ACROSS_CHAINS_DATAI",
            "GET_MULTI_CHAIN_TOKEN_BALANCES_DATAI",
            "SHOW_TOKENS_ON_MULTIPLE_CHAINS_DATAI",
            "CHECK_ALL_CHAIN_TOKEN_BALANCES_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves the user's token balances (including native) for multiple specified chains, with results grouped by chain ID"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me my token balances on Ethereum and Base for wallet 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI",
                "I'll get your token balances across both Ethereum and Base networks for 0x3764D79db51726E900a1380055F469eB6e2a7fD3...",
                NAME,
            ),
            exchange(
                "What tokens do I have on ETH and Base chains for address 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI?",
                "Fetching your token balances across Ethereum and Base for 0x3764D79db51726E900a1380055F469eB6e2a7fD3...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        extract_wallet_address(text).is_some() && !extract_multiple_chain_ids(text).is_empty()
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
        let chains = extract_multiple_chain_ids(text);
        let address = match extract_wallet_address(text) {
            Some(address) if !chains.is_empty() => address,
            address => {
                return reply.prompt(
                    "Please provide a valid wallet address and at least one chain ID to check token balances.",
                    if address.is_none() { "No wallet address provided" } else { "No chain IDs provided" },
                );
            }
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        let chain_param = chains.join(",");
        info!("Fetching grouped token balances for {} on {}", address, chain_param);
        let endpoint = with_query(
            for_user(GROUPED_TOKEN_BALANCES_BY_MULTIPLE_CHAINS, &address),
            &[("chains", chain_param.clone())],
        );
        let subject = format!("token balances on chains {}", chain_param);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, &subject) else {
            return false;
        };
        let Some(grouped) = reply.decode::<TokenBalancesByChain>(&data, "token balances") else {
            return false;
        };
        if grouped.is_empty() {
            return reply.success(
                format!("No token balances found for address {} on the specified chains.", address),
                json!({ "tokenBalances": {} }),
            );
        }

        let (text, total) = format_grouped_balances(&grouped, &address);
        reply.success(text, json!({ "tokenBalances": data, "totalValueUsd": total }))
    }
}

fn chain_heading(chain: &str) -> String {
    match chain {
        "eth" => "ETHEREUM".to_string(),
        other => other.to_uppercase(),
    }
}

fn readable_balance(token: &TokenBalanceWithPrice) -> f64 {
    let raw = token.balance.unwrap_or(0.0);
    match token.decimals {
        Some(d) if d > 0.0 => raw / 10f64.powf(d),
        _ => raw,
    }
}

fn format_amount(amount: f64) -> String {
    if amount < 0.0001 {
        to_exponential(amount, 4)
    } else if amount < 1.0 {
        to_fixed(amount, 6)
    } else if amount < 1000.0 {
        to_fixed(amount, 4)
    } else {
        locale_number(amount, 0, 2)
    }
}

/// Report text plus the USD total across every chain.
pub fn format_grouped_balances(grouped: &TokenBalancesByChain, user_address: &str) -> (String, f64) {
    let mut out = format!("Token Balances for {} across multiple chains:\n\n", user_address);
    let mut total = 0.0;

    for (chain, tokens) in grouped.iter().filter(|(_, t)| !t.is_empty()) {
        let valued: Vec<(&TokenBalanceWithPrice, f64, f64)> = tokens
            .iter()
            .map(|t| {
                let amount = readable_balance(t);
                let usd = amount * t.prices.as_ref().and_then(|p| p.usd).unwrap_or(0.0);
                (t, amount, usd)
            })
            .collect();
        let chain_total: f64 = valued.iter().map(|(_, _, usd)| usd).sum();
        total += chain_total;
        out += &format!("{}: ${}\n", chain_heading(chain), to_fixed(chain_total, 2));

        let mut significant: Vec<&(&TokenBalanceWithPrice, f64, f64)> =
            valued.iter().filter(|(_, _, usd)| *usd > SIGNIFICANT_USD).collect();
        significant.sort_by(|a, b| b.2.total_cmp(&a.2));

        if significant.is_empty() {
            out += "No significant token holdings found.\n";
        } else {
            out += "Significant tokens:\n";
            for (token, amount, usd) in significant.iter().take(TOKENS_SHOWN) {
                out += &format!(
                    "- {}: {} (${})\n",
                    token.symbol.as_deref().unwrap_or("undefined"),
                    format_amount(*amount),
                    to_fixed(*usd, 2)
                );
            }
            if significant.len() > TOKENS_SHOWN {
                out += &format!("  ... and {} more tokens\n", significant.len() - TOKENS_SHOWN);
            }
        }

        let others = tokens.len() - significant.len();
        if others > 0 {
            out += &format!("Plus {} other tokens with smaller values.\n", others);
        }
        out += "\n";
    }

    out += &format!("Total value across all chains: ${}\n", to_fixed(total, 2));
    (out, total)
}
