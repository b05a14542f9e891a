// src/actions/balances/token_by_chain.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, TOKEN_BALANCES_BY_CHAIN};
use crate::datai::models::TokenBalanceWithPrice;
use crate::extract::params::validate_required;
use crate::extract::{contains_any, extract_chain_id, extract_wallet_address};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct TokenBalancesByChainAction;

const NAME: &str = "GET_TOKEN_BALANCES_BY_SINGLE_CHAIN_DATAI";

const TOKEN_KEYWORDS: &[&str] = &[
    "tokens",
    "all tokens",
    "token list",
    "list my tokens balance",
    "assets",
    "prices",
    "balances for all tokens in chain",
    "token values",
];

#[async_trait]
impl Action for TokenBalancesByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_TOKEN_BALANCES_BY_SINGLE_CHAIN_DATAI",
            "FETCH_SINGLE_CHAIN_TOKEN_BALANCES_DATAI",
            "LIST_ALL_TOKENS_ON_SINGLE_CHAIN_DATAI",
            "SHOW_ALL_MY_TOKENS_ON_SINGLE_CHAIN_DATAI",
            "WHAT_TOKENS_DO_I_HAVE_ON_SINGLE_CHAIN_DATAI",
            "LIST_MY_TOKEN_ASSETS_ON_SINGLE_CHAIN_WITH_PRICES_DATAI",
            "SHOW_TOKEN_PRICES_FOR_SINGLE_CHAIN_DATAI",
            "CHECK_TOKEN_VALUES_ON_SINGLE_CHAIN_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all individual token balances (including native token) for a user's wallet on a specific chain, with detailed price information for each token"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "List my tokens balance and their prices on Base chain for wallet 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI ?",
                "I'll check your token balances and their values on Base chain...",
                NAME,
            ),
            exchange(
                "Show me all tokens for 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on base on DATAI",
                "Let me fetch your token values on Base...",
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
        if !contains_any(text, TOKEN_KEYWORDS) {
            debug!("{}: no token listing keywords", NAME);
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
        let (Some(address), Some(chain)) = (extract_wallet_address(text), extract_chain_id(text)) else {
            return reply.prompt(
                "Please provide both a valid wallet address and chain ID to check token balances.",
                "Missing required parameters",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching token balances for {} on {}", address, chain);
        let endpoint = with_query(for_user(TOKEN_BALANCES_BY_CHAIN, &address), &[("chain", chain.clone())]);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "token balances") else {
            return false;
        };
        let Some(tokens) = reply.decode::<Vec<TokenBalanceWithPrice>>(&data, "token balances") else {
            return false;
        };
        if tokens.is_empty() {
            return reply.success(
                format!("No token balances found for address {} on chain {}.", address, chain),
                json!({ "tokens": [] }),
            );
        }

        reply.success(format_token_balances(&tokens, &address, &chain), json!({ "tokens": data }))
    }
}

/// Human amount; `None` when balance or decimals are missing.
fn amount(token: &TokenBalanceWithPrice) -> Option<f64> {
    Some(token.balance? / 10f64.powf(token.decimals?))
}

fn usd_value(token: &TokenBalanceWithPrice) -> Option<f64> {
    Some(amount(token)? * token.price?).filter(|v| v.is_finite())
}

pub fn format_token_balances(tokens: &[TokenBalanceWithPrice], user_address: &str, chain: &str) -> String {
    let mut out = format!("Token Balances for {} on {}:\n\n", user_address, chain.to_uppercase());
    let total: f64 = tokens.iter().filter_map(usd_value).sum();
    out += &format!("Total Value: ${}\n\n", to_fixed(total, 2));

    let mut sorted: Vec<&TokenBalanceWithPrice> = tokens.iter().collect();
    sorted.sort_by(|a, b| {
        let (va, vb) = (usd_value(a).unwrap_or(0.0), usd_value(b).unwrap_or(0.0));
        vb.total_cmp(&va)
    });

    for token in sorted {
        let Some(qty) = amount(token).filter(|a| *a > 0.0) else {
            continue;
        };
        let digits = token.decimals.unwrap_or(0.0).clamp(0.0, 6.0) as usize;
        out += &format!(
            "- {} ({}):\n",
            token.name.as_deref().unwrap_or("undefined"),
            token.symbol.as_deref().unwrap_or("undefined")
        );
        out += &format!("  Amount: {}\n", to_fixed(qty, digits));
        if let Some(value) = usd_value(token).filter(|v| *v > 0.0) {
            out += &format!("  Value: ${}\n", to_fixed(value, 2));
            if let Some(change) = token.price_change_24h.filter(|c| *c != 0.0) {
                let arrow = if change >= 0.0 { '↑' } else { '↓' };
                out += &format!("  24h: {} {}%\n", arrow, to_fixed(change.abs(), 2));
            }
        }
        out += "\n";
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0x3764D79db51726E900a1380055F469eB6e2a7fD3";

    #[tokio::test]
    async fn validate_needs_token_wording() {
        let action = TokenBalancesByChainAction;
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let ok = Memory::from_text(format!("Show me all Tokens for {} on base", ADDR));
        assert!(action.validate(&rt, &ok).await);
        let no_kw = Memory::from_text(format!("balance for {} on base", ADDR));
        assert!(!action.validate(&rt, &no_kw).await);
    }

    #[test]
    fn values_sorted_with_price_moves() {
        let tokens: Vec<TokenBalanceWithPrice> = serde_json::from_value(json!([
            {"name": "USD Coin", "symbol": "USDC", "decimals": 6, "balance": 5000000, "price": 1, "priceChange24h": -0.0123},
            {"name": "Ether", "symbol": "ETH", "decimals": 18, "balance": "2000000000000000000", "price": 3000, "priceChange24h": 2.5},
            {"name": "Spam", "symbol": "SPAM", "decimals": 0, "balance": 7},
            {"name": "Empty", "symbol": "NIL", "decimals": 18, "balance": 0, "price": 4}
        ]))
        .unwrap();
        let text = format_token_balances(&tokens, ADDR, "base");
        assert!(text.starts_with(&format!("Token Balances for {} on BASE:\n\nTotal Value: $6005.00\n\n", ADDR)));
        assert!(text.contains("- Ether (ETH):\n  Amount: 2.000000\n  Value: $6000.00\n  24h: ↑ 2.50%\n\n- USD Coin (USDC):\n  Amount: 5.000000\n  Value: $5.00\n  24h: ↓ 0.01%\n\n"));
        assert!(text.ends_with("- Spam (SPAM):\n  Amount: 7\n\n"));
        assert!(!text.contains("NIL"));
    }

    #[test]
    fn empty_tokens() {
        let text = format_token_balances(&[], ADDR, "matic");
        assert!(text.starts_with(&format!("Token Balances for {} on MATIC:\n\nTotal Value: $0.00\n\n", ADDR)));
    }
}
