// src/actions/transactions/transfers_by_hash.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{extract_evm_hash, is_nft_standard, non_empty};
use crate::actions::{api_key, exchange, option_str, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{render, TRANSACTION_TRANSFERS_BY_HASH};
use crate::datai::models::TransactionTransferItem;
use crate::extract::{extract_chain_id, extract_wallet_address, is_valid_wallet_address};
use crate::format::{locale_number, to_fixed};
use crate::runtime::AgentRuntime;

pub struct TransactionTransfersByHashAction;

const NAME: &str = "GET_TRANSACTION_TRANSFERS_BY_HASH";

lazy_static! {
    static ref SIGNATURE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)transaction hash:?\s*([1-9A-HJ-NP-Za-km-z]{88,98})").unwrap(),
        Regex::new(r"(?i)tx hash:?\s*([1-9A-HJ-NP-Za-km-z]{88,98})").unwrap(),
        Regex::new(r"(?i)hash:?\s*([1-9A-HJ-NP-Za-km-z]{88,98})").unwrap(),
        Regex::new(r"([1-9A-HJ-NP-Za-km-z]{88,98})").unwrap(),
    ];
}

/// EVM hashes first, then base58 Solana signatures.
pub fn extract_any_hash(text: &str) -> Option<String> {
    extract_evm_hash(text).or_else(|| {
        SIGNATURE_PATTERNS
            .iter()
            .find_map(|p| p.captures(text))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    })
}

#[async_trait]
impl Action for TransactionTransfersByHashAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_TX_TRANSFERS",
            "FETCH_TRANSACTION_TRANSFERS",
            "SHOW_TOKENS_MOVED",
            "LIST_TRANSACTION_TRANSFERS",
            "VIEW_TOKEN_MOVEMENTS",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves token transfers and movements within a specific transaction by its hash"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me the token transfers for transaction hash 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf on Ethereum for the wallet 0x218e312fF5181290A46e3f87A73A8aD40C05A944 please on DATAI.",
                "I'll look up the token transfers for that transaction hash on Ethereum. One moment...",
                NAME,
            ),
            exchange(
                "What tokens moved in transaction 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf on eth chain for wallet 0x218e312fF5181290A46e3f87A73A8aD40C05A944 please on DATAI.",
                "Let me fetch the token movements in that Ethereum transaction for you...",
                NAME,
            ),
            exchange(
                "Check transaction 0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf on Ethereum network, what tokens were transferred for address 0x218e312fF5181290A46e3f87A73A8aD40C05A944?",
                "I'll analyze the token transfers in this Ethereum transaction. Just a moment...",
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
            debug!("{}: no valid wallet address", NAME);
            return false;
        }
        extract_chain_id(text).is_some() && extract_any_hash(text).is_some()
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
                "Please provide a valid wallet address to check transaction transfers.",
                "No wallet address provided",
            );
        };
        let Some(chain) = extract_chain_id(text) else {
            return reply.prompt(
                "Please specify which blockchain (e.g., \"eth\", \"bsc\", \"polygon\") the transaction is on.",
                "No chain ID provided",
            );
        };
        let Some(hash) = option_str(options, "hash").map(str::to_string).or_else(|| extract_any_hash(text)) else {
            return reply.prompt(
                "Please provide a valid transaction hash to look up transfers.",
                "No transaction hash provided",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching transaction transfers for hash {} on {} for address {}", hash, chain, address);
        let endpoint = render(
            TRANSACTION_TRANSFERS_BY_HASH,
            &[("chain", &chain), ("hash", &hash), ("userAddress", &address)],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transaction transfers") else {
            return false;
        };
        let Some(transfers) = reply.decode::<Vec<TransactionTransferItem>>(&data, "transaction transfers") else {
            return false;
        };
        if transfers.is_empty() {
            return reply.success(
                format!("No token transfers found for transaction {} on {}.", hash, chain),
                json!({ "transfers": [] }),
            );
        }

        reply.success(format_transfers(&transfers, &hash, &address), json!({ "transfers": data }))
    }
}

/// `Your wallet` for the user, otherwise ten leading and eight trailing characters.
fn wallet_label(address: Option<&str>, user_address: &str) -> String {
    let Some(address) = address else {
        return "Unknown".to_string();
    };
    if address == user_address {
        return "Your wallet".to_string();
    }
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(10).collect();
    let tail: String = chars[chars.len().saturating_sub(8)..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn format_transfers(transfers: &[TransactionTransferItem], hash: &str, user_address: &str) -> String {
    let mut out = format!("Token transfers for transaction {}:\n\n", hash);

    for (i, transfer) in transfers.iter().enumerate() {
        let symbol = non_empty(&transfer.token_symbol)
            .or_else(|| non_empty(&transfer.token_name))
            .unwrap_or("Unknown Token");
        let amount = transfer.balance.unwrap_or(0.0);
        let decimals = transfer.token_decimals.unwrap_or(0.0);
        let formatted = if is_nft_standard(transfer.standard.as_deref()) || decimals <= 0.0 {
            amount.to_string()
        } else {
            locale_number(amount / 10f64.powf(decimals), 0, 6)
        };
        let value_usd = transfer
            .balance_usd
            .filter(|u| *u > 0.0)
            .map(|u| format!("(~${})", to_fixed(u, 2)))
            .unwrap_or_default();
        let standard = non_empty(&transfer.standard)
            .map(|s| format!("[{}] ", s))
            .unwrap_or_default();
        let token_info = match non_empty(&transfer.token_name) {
            Some(name) if name != symbol => format!("{} ({})", symbol, name),
            _ => symbol.to_string(),
        };

        out += &format!("{}. {} {} {} {}\n", i + 1, formatted, token_info, value_usd, standard);
        out += &format!("   From: {}\n", wallet_label(transfer.from.as_deref(), user_address));
        out += &format!("   To: {}\n", wallet_label(transfer.to.as_deref(), user_address));
        if i + 1 < transfers.len() {
            out += "\n";
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x218e312fF5181290A46e3f87A73A8aD40C05A944";
    const SIG: &str = "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW";

    #[test]
    fn solana_signature_fallback() {
        assert_eq!(SIG.len(), 88);
        assert_eq!(extract_any_hash(&format!("tx hash {} on solana", SIG)).as_deref(), Some(SIG));
        assert_eq!(extract_any_hash("nothing to see"), None);
    }

    #[test]
    fn fungible_and_nft_transfers() {
        let transfers: Vec<TransactionTransferItem> = serde_json::from_value(json!([
            {
                "tokenSymbol": "USDC", "tokenName": "USD Coin", "balance": 1234500000u64, "tokenDecimals": 6,
                "balanceUSD": 1234.5, "standard": "ERC20", "from": ADDR,
                "to": "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"
            },
            {"tokenName": "Punk", "balance": 1, "standard": "ERC721", "from": "0xabc", "to": ADDR}
        ]))
        .unwrap();
        let text = format_transfers(&transfers, "0xhash", ADDR);
        assert_eq!(
            text,
            "Token transfers for transaction 0xhash:\n\n\
             1. 1,234.5 USDC (USD Coin) (~$1234.50) [ERC20] \n   From: Your wallet\n   To: 0x7a250d56...59F2488D\n\n\
             2. 1 Punk  [ERC721] \n   From: 0xabc...0xabc\n   To: Your wallet\n"
        );
    }

    #[test]
    fn no_transfers() {
        let text = format_transfers(&[], SIG, ADDR);
        assert!(text.starts_with(&format!("Token transfers for transaction {}:\n\n", SIG)));
    }
}
