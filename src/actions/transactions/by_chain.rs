// src/actions/transactions/by_chain.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::{fee_display, is_nft_standard, non_empty, resolve_limit, showing_note, tx_date, ZERO_ADDRESS};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_TRANSACTIONS_BY_CHAIN};
use crate::datai::models::{TransactionHistoryItem, TxBalanceItem};
use crate::extract::params::validate_required;
use crate::extract::{extract_chain_id, extract_wallet_address};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct UserTransactionsByChainAction;

const NAME: &str = "GET_USER_TRANSACTIONS_BY_CHAIN_DATAI";
const DEFAULT_LIMIT: u32 = 10;

#[async_trait]
impl Action for UserTransactionsByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_TRANSACTIONS_BY_CHAIN_DATAI",
            "FETCH_CHAIN_TX_HISTORY_FOR_USER_DATAI",
            "LIST_ALL_CHAIN_TRANSACTIONS_DATAI",
            "SHOW_ALL_CHAIN_TRANSACTIONS_DATAI",
            "GET_MY_FULL_CHAIN_TRANSACTIONS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves transaction history for a user on a specific blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me the transaction history by chain for wallet 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e on Ethereum on DATAI LIMIT 10",
                "Let me retrieve the Ethereum transaction history for 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e. One moment please...",
                NAME,
            ),
            exchange(
                "What are the last 10 transactions that 0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e made on eth?",
                "I'll fetch the 10 most recent Ethereum transactions for this wallet address...",
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
                "Please specify a blockchain to check transactions on (e.g., eth, matic, bsc).",
                "No chain ID provided",
            );
        };
        let limit = resolve_limit(text, options, DEFAULT_LIMIT);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching {} transactions for {} on {}", limit, address, chain);
        let endpoint = with_query(
            for_user(USER_TRANSACTIONS_BY_CHAIN, &address),
            &[("chain", chain.clone()), ("limit", limit.to_string())],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transaction history") else {
            return false;
        };
        let Some(txs) = reply.decode::<Vec<TransactionHistoryItem>>(&data, "transaction history") else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!("No transactions found for address {} on chain {}.", address, chain),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_chain_transactions(&txs, &address, &chain, limit as usize),
            json!({ "transactions": data }),
        )
    }
}

/// `You` for the user, nothing for the zero address.
fn party(address: Option<&str>, user_address: &str) -> Option<String> {
    let address = address.filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case(ZERO_ADDRESS))?;
    if address.eq_ignore_ascii_case(user_address) {
        Some("You".to_string())
    } else {
        Some(address.to_string())
    }
}

fn push_parties(out: &mut String, from: Option<&str>, to: Option<&str>, user_address: &str, indent: &str) {
    if let Some(from) = party(from, user_address) {
        out.push_str(&format!("\n{}From: {}", indent, from));
    }
    if let Some(to) = party(to, user_address) {
        out.push_str(&format!("\n{}To: {}", indent, to));
    }
}

fn push_movement(out: &mut String, balance: &TxBalanceItem, user_address: &str) {
    let symbol = non_empty(&balance.token_symbol).unwrap_or("Unknown Token");
    let name = non_empty(&balance.token_name).unwrap_or(symbol);
    let standard = non_empty(&balance.standard).unwrap_or("Unknown Standard");
    out.push_str(&format!("\n    - {} ({}) [{}]", name, symbol, standard));

    if is_nft_standard(Some(standard)) {
        let nft = balance.nft_details.as_ref();
        out.push_str(&format!(
            "\n      Token ID: {}",
            nft.and_then(|n| non_empty(&n.inner_id)).unwrap_or("N/A")
        ));
        out.push_str(&format!(
            "\n      Action: {}",
            nft.and_then(|n| non_empty(&n.action)).unwrap_or("N/A")
        ));
    } else {
        let decimals = balance.token_decimals.unwrap_or(0.0);
        let mut amount = balance
            .balance_string
            .as_deref()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        if decimals > 0.0 {
            amount /= 10f64.powf(decimals);
        }
        let digits = if decimals > 0.0 { decimals.min(6.0) as usize } else { 0 };
        out.push_str(&format!("\n      Amount: {} {}", to_fixed(amount, digits), symbol));
        let usd = match balance.balance_usd.filter(|u| *u != 0.0) {
            Some(u) => format!("${}", to_fixed(u, 2)),
            None => "N/A".to_string(),
        };
        out.push_str(&format!("\n      Value (USD): {}", usd));
    }
    push_parties(out, balance.from.as_deref(), balance.to.as_deref(), user_address, "      ");
}

pub fn format_chain_transactions(
    txs: &[TransactionHistoryItem],
    user_address: &str,
    chain: &str,
    limit: usize,
) -> String {
    let mut out = format!("Found {} transactions for {} on {}", txs.len(), user_address, chain.to_uppercase());
    out += &showing_note(txs.len(), limit);
    out += ":\n\n";

    for tx in txs.iter().take(limit) {
        let status = if tx.successful == Some(true) { "✅ Successful" } else { "❌ Failed" };
        let classification = non_empty(&tx.tx_classification)
            .map(|c| format!(" ({})", c))
            .unwrap_or_default();
        out += "----------------------------------------\n";
        out += &format!("{}{} - {}", non_empty(&tx.tx_type).unwrap_or("Transaction"), classification, status);
        out += &format!("\n  Date: {}", tx_date(tx.time_stamp));
        out += &format!("\n  Hash: {}", tx.hash.as_deref().unwrap_or("undefined"));

        out += &format!("\n  Fee: {}", fee_display(tx));
        push_parties(&mut out, tx.from.as_deref(), tx.to.as_deref(), user_address, "  ");
        if let Some(protocol) = non_empty(&tx.protocol) {
            out += &format!("\n  Protocol: {}", protocol);
        }
        if tx.blacklisted == Some(true) {
            out += "\n  Status: ⚠️ Blacklisted";
        }

        if !tx.balances.is_empty() {
            out += "\n  Transfers/Assets Involved:";
            for balance in &tx.balances {
                push_movement(&mut out, balance, user_address);
            }
        }
        out += "\n\n";
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0x8e9741f27b21d6b3d5791b5566a880ecf5a1f21e";

    #[tokio::test]
    async fn missing_chain_prompts() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        let ok = UserTransactionsByChainAction
            .handler(&StaticRuntime::new(), &Memory::from_text(format!("transactions for {}", ADDR)), None, None, Some(&mut cb))
            .await;
        assert!(!ok);
        assert_eq!(seen[0].content.error.as_deref(), Some("No chain ID provided"));
    }

    #[test]
    fn fungible_and_nft_movements() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([{
            "txType": "Swap", "txClassification": "dex", "successful": true, "timeStamp": 1710450300,
            "hash": "0xabc", "txFee": 2100000000000000u64, "txFeeUsd": 7.5,
            "from": "0x8E9741F27B21D6B3D5791B5566A880ECF5A1F21E", "to": ZERO_ADDRESS, "protocol": "uniswap",
            "balances": [
                {"tokenSymbol": "USDC", "tokenName": "USD Coin", "standard": "ERC20", "balanceString": "2500000",
                 "tokenDecimals": 6, "balanceUSD": 2.5, "to": ADDR},
                {"tokenName": "Punk", "standard": "ERC721", "nftDetails": {"innerId": 42, "action": "mint"}}
            ]
        }]))
        .unwrap();
        let text = format_chain_transactions(&txs, ADDR, "eth", 10);
        assert_eq!(
            text,
            format!(
                "Found 1 transactions for {} on ETH (showing all 1):\n\n\
                 ----------------------------------------\n\
                 Swap (dex) - ✅ Successful\n  Date: 3/14/2024, 9:05:00 PM\n  Hash: 0xabc\n  \
                 Fee: 0.002100 ETH ($7.50 USD)\n  From: You\n  Protocol: uniswap\n  Transfers/Assets Involved:\n    \
                 - USD Coin (USDC) [ERC20]\n      Amount: 2.500000 USDC\n      Value (USD): $2.50\n      To: You\n    \
                 - Punk (Unknown Token) [ERC721]\n      Token ID: 42\n      Action: mint\n\n",
                ADDR
            )
        );
    }

    #[test]
    fn missing_status_reads_failed() {
        let txs: Vec<TransactionHistoryItem> = serde_json::from_value(json!([{"hash": "0x1", "blacklisted": true}])).unwrap();
        let text = format_chain_transactions(&txs, ADDR, "bsc", 10);
        assert!(text.contains("Transaction - ❌ Failed\n  Date: Unknown date\n  Hash: 0x1\n  Fee: N/A\n  Status: ⚠️ Blacklisted\n\n"));
    }

    #[test]
    fn empty_history() {
        let text = format_chain_transactions(&[], ADDR, "eth", 10);
        assert_eq!(text, format!("Found 0 transactions for {} on ETH:\n\n", ADDR));
    }
}
