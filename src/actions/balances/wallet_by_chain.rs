// src/actions/balances/wallet_by_chain.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, WALLET_BALANCES_BY_CHAIN};
use crate::datai::models::{TokenBalanceDetail, WalletBalancesByChain};
use crate::extract::params::validate_required;
use crate::extract::{extract_chain_id, extract_wallet_address};
use crate::format::{locale_number, native_token_symbol};
use crate::runtime::AgentRuntime;

pub struct WalletBalancesByChainAction;

const NAME: &str = "GET_WALLET_BALANCES_BY_CHAIN_DATAI";
const DEFAULT_DECIMALS: f64 = 18.0;

#[async_trait]
impl Action for WalletBalancesByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_WALLET_BALANCES_BY_CHAIN_DATAI",
            "FETCH_CHAIN_WALLET_BALANCES",
            "GET_WALLET_DETAILS",
            "SHOW_BLOCKCHAIN_HOLDINGS",
            "LIST_CHAIN_ASSETS",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves a user's direct wallet balances for a specific chain, including native currency, tokens, and NFTs"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What is in my wallet balance on Polygon for address 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI?",
                "I'll check your Polygon (matic) wallet contents for 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI...",
                NAME,
            ),
            exchange(
                "Show me balance in my 0x3764D79db51726E900a1380055F469eB6e2a7fD3 wallet on Polygon on DATAI",
                "Let me fetch your Polygon (matic) wallet details for 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI. One moment please...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        let (address, chain) = (extract_wallet_address(text), extract_chain_id(text));
        validate_required(&[("userAddress", address.as_deref()), ("chain", chain.as_deref())]).is_valid
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
                "Please provide both a valid wallet address and chain ID to check balances.",
                "Missing required parameters",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching wallet balances for {} on {}", address, chain);
        let endpoint = with_query(for_user(WALLET_BALANCES_BY_CHAIN, &address), &[("chain", chain.clone())]);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "wallet balances") else {
            return false;
        };
        if data.is_null() {
            return reply.success(
                format!("No wallet data found for address {} on chain {}.", address, chain),
                json!({ "wallet": null }),
            );
        }
        let Some(wallet) = reply.decode::<WalletBalancesByChain>(&data, "wallet balances") else {
            return false;
        };

        reply.success(format_wallet_balances(&wallet, &address, &chain), json!({ "wallet": data }))
    }
}

/// Human amount of a token; `None` when the raw balance is missing.
fn token_amount(token: &TokenBalanceDetail) -> Option<f64> {
    let decimals = token.token_decimals.filter(|d| *d != 0.0).unwrap_or(DEFAULT_DECIMALS);
    token.balance.map(|b| b / 10f64.powf(decimals))
}

pub fn format_wallet_balances(wallet: &WalletBalancesByChain, user_address: &str, chain: &str) -> String {
    let mut out = format!("📊 Wallet Holdings on {} 📊\n\n", chain.to_uppercase());
    out += &format!("🔷 Wallet: {}\n", user_address);
    out += &format!(
        "🔷 Native Balance: {} {}\n\n",
        locale_number(wallet.native_balance_decimal.unwrap_or(0.0), 2, 6),
        native_token_symbol(chain)
    );

    if wallet.token_balances.is_empty() {
        out += "💰 Token Balances 💰\nNo tokens found.\n";
        return out;
    }

    out += "💰 Token Balances 💰\n";
    let mut held: Vec<(&TokenBalanceDetail, f64)> = wallet
        .token_balances
        .iter()
        .filter_map(|t| token_amount(t).filter(|a| *a > 0.0).map(|a| (t, a)))
        .collect();
    held.sort_by(|a, b| b.1.total_cmp(&a.1));

    if held.is_empty() {
        out += "No token balances found.\n";
    }
    for (token, amount) in held {
        out += &format!(
            "• {} ({}): {}\n",
            token.token_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unknown Token"),
            token.token_symbol.as_deref().filter(|s| !s.is_empty()).unwrap_or("???"),
            locale_number(amount, 2, 6)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x3764D79db51726E900a1380055F469eB6e2a7fD3";

    #[test]
    fn tokens_sorted_and_scaled() {
        let wallet: WalletBalancesByChain = serde_json::from_value(json!({
            "nativeBalanceDecimal": 1234.5,
            "tokenBalances": [
                {"tokenName": "USD Coin", "tokenSymbol": "USDC", "tokenDecimals": 6, "balance": "2500000"},
                {"tokenName": "Wrapped Ether", "tokenSymbol": "WETH", "balance": "3000000000000000000"},
                {"tokenSymbol": "ZERO", "tokenDecimals": 18, "balance": 0},
                {"tokenDecimals": 0, "balance": "10000000000000000000"}
            ]
        }))
        .unwrap();
        let text = format_wallet_balances(&wallet, ADDR, "matic");
        assert!(text.starts_with(&format!(
            "📊 Wallet Holdings on MATIC 📊\n\n🔷 Wallet: {}\n🔷 Native Balance: 1,234.50 MATIC\n\n💰 Token Balances 💰\n",
            ADDR
        )));
        assert!(text.ends_with(
            "• Unknown Token (???): 10.00\n• Wrapped Ether (WETH): 3.00\n• USD Coin (USDC): 2.50\n"
        ));
        assert!(!text.contains("ZERO"));
    }

    #[test]
    fn no_tokens() {
        let text = format_wallet_balances(&WalletBalancesByChain::default(), ADDR, "eth");
        assert!(text.contains("🔷 Native Balance: 0.00 ETH\n\n💰 Token Balances 💰\nNo tokens found.\n"));

        let dust: WalletBalancesByChain =
            serde_json::from_value(json!({"tokenBalances": [{"tokenSymbol": "X", "balance": 0}]})).unwrap();
        assert!(format_wallet_balances(&dust, ADDR, "eth").ends_with("💰 Token Balances 💰\nNo token balances found.\n"));
    }
}
