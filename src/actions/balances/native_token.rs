// src/actions/balances/native_token.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, NATIVE_TOKEN_BALANCE_BY_CHAIN};
use crate::datai::models::NativeTokenBalance;
use crate::extract::params::validate_required;
use crate::extract::{extract_chain_id, extract_wallet_address};
use crate::format::{locale_number, native_token_symbol, to_exponential};
use crate::runtime::AgentRuntime;

pub struct NativeTokenBalanceByChainAction;

const NAME: &str = "GET_NATIVE_TOKEN_BALANCE_BY_CHAIN_DATAI";
/// Raw balances longer than this switch to scientific notation.
const MAX_RAW_DIGITS: usize = 15;

#[async_trait]
impl Action for NativeTokenBalanceByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_NATIVE_TOKEN_BALANCE_BY_CHAIN_DATAI",
            "FETCH_NATIVE_CURRENCY_BALANCE_DATAI",
            "GET_ETH_BALANCE_DATAI",
            "CHECK_NATIVE_TOKEN_BALANCE_DATAI",
            "SHOW_NATIVE_COIN_BALANCE_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves the user's native token balance (e.g., ETH for Ethereum, MATIC for Polygon) for a specific chain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What is my ETH native balance for wallet 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI ?",
                "Let me check your ETH native balance on Ethereum for 0x3764D79db51726E900a1380055F469eB6e2a7fD3...",
                NAME,
            ),
            exchange(
                "Show me the native token balance for 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on eth chain on DATAI",
                "I'll fetch the native ETH balance on Ethereum chain. One moment please...",
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
        let (address, chain) = (extract_wallet_address(text), extract_chain_id(text));
        let (Some(address), Some(chain)) = (address.clone(), chain) else {
            return reply.prompt(
                "Please provide a valid wallet address and chain ID to check native token balance.",
                if address.is_none() { "No wallet address provided" } else { "No chain ID provided" },
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching native token balance for {} on {}", address, chain);
        let endpoint = with_query(
            for_user(NATIVE_TOKEN_BALANCE_BY_CHAIN, &address),
            &[("chain", chain.clone())],
        );
        let subject = format!("native token balance on chain {}", chain);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, &subject) else {
            return false;
        };
        if data.is_null() {
            return reply.success(
                format!("No native token balance found for address {} on chain {}.", address, chain),
                json!({ "balance": null }),
            );
        }
        let Some(balance) = reply.decode::<NativeTokenBalance>(&data, "native token balance") else {
            return false;
        };

        let symbol = native_token_symbol(&chain);
        let raw = raw_balance(&data);
        reply.success(
            format_native_balance(&balance, raw.as_deref(), &address, &chain, &symbol),
            json!({
                "balance": data.get("balance").cloned().unwrap_or(Value::Null),
                "balanceDecimal": data.get("balanceDecimal").cloned().unwrap_or(Value::Null),
                "tokenSymbol": symbol,
            }),
        )
    }
}

/// Upstream's raw wei balance as sent, before any float conversion.
fn raw_balance(data: &Value) -> Option<String> {
    match data.get("balance")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn format_native_balance(
    balance: &NativeTokenBalance,
    raw: Option<&str>,
    user_address: &str,
    chain: &str,
    symbol: &str,
) -> String {
    let mut out = String::from("Native Token Balance Report\n\n");
    out += &format!("Network: {}\n", chain.to_uppercase());
    out += &format!("Wallet: {}\n", user_address);
    out += &format!(
        "Balance: {} {}\n",
        locale_number(balance.balance_decimal.unwrap_or(0.0), 2, 6),
        symbol
    );

    if balance.balance.is_some_and(|b| b != 0.0) {
        let wei = raw.map(str::to_string).unwrap_or_default();
        let shown = if wei.len() > MAX_RAW_DIGITS {
            to_exponential(balance.balance.unwrap_or(0.0), 4)
        } else {
            wei
        };
        out += &format!("\nRaw Balance: {} wei", shown);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x3764D79db51726E900a1380055F469eB6e2a7fD3";

    #[test]
    fn large_raw_balance_uses_exponent() {
        let data = json!({"balance": "1234567890000000000", "balanceDecimal": 1.23456789});
        let balance: NativeTokenBalance = serde_json::from_value(data.clone()).unwrap();
        let text = format_native_balance(&balance, raw_balance(&data).as_deref(), ADDR, "eth", "ETH");
        assert_eq!(
            text,
            format!(
                "Native Token Balance Report\n\nNetwork: ETH\nWallet: {}\nBalance: 1.234568 ETH\n\nRaw Balance: 1.2346e+18 wei",
                ADDR
            )
        );
    }

    #[test]
    fn small_and_zero_balances() {
        let data = json!({"balance": 5000, "balanceDecimal": "0.000000000000005"});
        let balance: NativeTokenBalance = serde_json::from_value(data.clone()).unwrap();
        let text = format_native_balance(&balance, raw_balance(&data).as_deref(), ADDR, "matic", "MATIC");
        assert!(text.ends_with("Balance: 0.00 MATIC\n\nRaw Balance: 5000 wei"));

        let empty = format_native_balance(&NativeTokenBalance::default(), None, ADDR, "bsc", "BNB");
        assert!(empty.ends_with("Balance: 0.00 BNB\n"));
    }
}
