// src/actions/transactions/defi_position.rs

use std::cmp::Ordering;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::info;

use super::non_empty;
use crate::actions::{api_key, exchange, option_str, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::TRANSACTIONS_FOR_DEFI_POSITION;
use crate::datai::models::TransactionHistoryItem;
use crate::format::{date_time_string, to_fixed};
use crate::runtime::AgentRuntime;

pub struct TransactionsForDeFiPositionAction;

const NAME: &str = "GET_TRANSACTIONS_FOR_DEFI_POSITION_DATAI";
const SHOWN_MOVEMENTS: usize = 3;

lazy_static! {
    // protocol__type:contract:wallet:index
    static ref FULL_POSITION_ID: Regex =
        Regex::new(r"(?i)([\w\d_]+:[\w\d-]+:0x[a-fA-F0-9]+:[0-9]+)").unwrap();
    static ref POSITION_ID_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)position id:?\s*([\w\d_:.-]+)").unwrap(),
        Regex::new(r"(?i)position:?\s*([\w\d_:.-]+)").unwrap(),
        Regex::new(r"(?i)for position\s*([\w\d_:.-]+)").unwrap(),
        Regex::new(r"(?i)defi position\s*([\w\d_:.-]+)").unwrap(),
        Regex::new(r"(?i)position with id\s*([\w\d_:.-]+)").unwrap(),
        Regex::new(r"#(\d+)\b").unwrap(),
        Regex::new(r"\b(\d+)\b").unwrap(),
    ];
}

pub fn extract_position_id(text: &str) -> Option<String> {
    if let Some(m) = FULL_POSITION_ID.captures(text).and_then(|c| c.get(1)) {
        return Some(m.as_str().to_string());
    }
    POSITION_ID_PATTERNS
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[async_trait]
impl Action for TransactionsForDeFiPositionAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_POSITION_TRANSACTIONS_DEFIPOSITION_DATAI",
            "FETCH_DEFI_POSITION_HISTORY_TRANSACTIONS_DATAI",
            "SHOW_POSITION_ACTIVITY_TRANSACTIONS_DATAI",
            "VIEW_POSITION_TX_HISTORY_DATAI",
            "LIST_POSITION_TRANSACTIONS_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves transaction history for a specific DeFi position by its identifier"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "Show me all transactions for DeFi position compound__lending:compound-0xc00e94cb662c3520282e6f5717214004a7f26888:0x3764d79db51726e900a1380055f469eb6e2a7fd3:0 please.",
                "I'll look up the transaction history for the Compound lending position. One moment...",
                NAME,
            ),
            exchange(
                "What's the transaction history for Compound position compound__lending:compound-0xc00e94cb662c3520282e6f5717214004a7f26888:0x3764d79db51726e900a1380055f469eb6e2a7fd3:0?",
                "Let me fetch the transaction history for that Compound lending position...",
                NAME,
            ),
            exchange(
                "I need to see all transactions related to my position compound__lending:compound-0xc00e94cb662c3520282e6f5717214004a7f26888:0x3764d79db51726e900a1380055f469eb6e2a7fd3:0",
                "I'll retrieve all transactions for your Compound position. This will show you the full history including fees and P&L...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        api_key(runtime).is_some() && extract_position_id(message.text()).is_some()
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
        let position_id = option_str(options, "positionId")
            .map(str::to_string)
            .or_else(|| extract_position_id(message.text()));
        let Some(position_id) = position_id else {
            return reply.prompt(
                "Please provide a valid position ID to check transaction history. Example: \"Show me transactions for Compound position compound__lending:compound-0xc00e94cb662c3520282e6f5717214004a7f26888:0x3764d79db51726e900a1380055f469eb6e2a7fd3:0\"",
                "No position ID provided",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching transactions for DeFi position ID {}", position_id);
        let encoded: String = url::form_urlencoded::byte_serialize(position_id.as_bytes()).collect();
        let endpoint = format!("{}?position={}", TRANSACTIONS_FOR_DEFI_POSITION, encoded);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "transactions for position") else {
            return false;
        };
        let Some(txs) =
            reply.decode::<Vec<TransactionHistoryItem>>(&data, "transactions for DeFi position")
        else {
            return false;
        };
        if txs.is_empty() {
            return reply.success(
                format!("No transactions found for DeFi position ID {}.", position_id),
                json!({ "transactions": [] }),
            );
        }

        reply.success(
            format_position_transactions(&txs, &position_id),
            json!({ "transactions": data }),
        )
    }
}

fn signed_usd(value: f64) -> String {
    format!("{}{}", if value > 0.0 { "+" } else { "" }, to_fixed(value, 2))
}

/// Newest first, with a fee and P&L summary at the end.
pub fn format_position_transactions(txs: &[TransactionHistoryItem], position_id: &str) -> String {
    let mut out = format!("Transactions for DeFi position ID {}:\n\n", position_id);

    let mut sorted: Vec<&TransactionHistoryItem> = txs.iter().collect();
    sorted.sort_by(|a, b| {
        let (a, b) = (a.time_stamp.unwrap_or(0.0), b.time_stamp.unwrap_or(0.0));
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });

    for (i, tx) in sorted.iter().enumerate() {
        let action = non_empty(&tx.tx_action).map(|a| format!(" ({})", a)).unwrap_or_default();
        let date = tx
            .time_stamp
            .map(date_time_string)
            .unwrap_or_else(|| "Invalid Date".to_string());
        let fee = tx
            .tx_fee_usd
            .filter(|f| *f != 0.0)
            .map(|f| format!("${}", to_fixed(f, 2)))
            .unwrap_or_else(|| "N/A".to_string());

        out += &format!("{}. {}{}\n", i + 1, non_empty(&tx.tx_type).unwrap_or("Transaction"), action);
        out += &format!("   Date: {}\n", date);
        out += &format!("   Chain: {}\n", non_empty(&tx.chain).unwrap_or("Unknown chain"));
        if let Some(from) = non_empty(&tx.from) {
            out += &format!("   From: {}\n", from);
        }
        if let Some(to) = non_empty(&tx.to) {
            out += &format!("   To: {}\n", to);
        }
        out += &format!("   Fee: {}\n", fee);
        if let Some(pnl) = tx.pnl_usd {
            out += &format!("   P&L: ${}\n", signed_usd(pnl));
        }
        out += &format!("   Hash: {}\n", tx.hash.as_deref().unwrap_or("undefined"));

        if !tx.balances.is_empty() {
            out += "   Token movements:\n";
            for balance in tx.balances.iter().take(SHOWN_MOVEMENTS) {
                let amount = balance
                    .balance
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "undefined".to_string());
                let name = non_empty(&balance.token_name)
                    .map(|n| format!(" ({})", n))
                    .unwrap_or_default();
                let usd = balance
                    .balance_usd
                    .filter(|u| *u != 0.0)
                    .map(|u| format!("(${})", to_fixed(u, 2)))
                    .unwrap_or_default();
                out += &format!(
                    "     • {} {}{} {}\n",
                    amount,
                    non_empty(&balance.token_symbol).unwrap_or("Unknown Symbol"),
                    name,
                    usd
                );
            }
            if tx.balances.len() > SHOWN_MOVEMENTS {
                out += &format!(
                    "     • ...and {} more token movements\n",
                    tx.balances.len() - SHOWN_MOVEMENTS
                );
            }
        }
        if i + 1 < sorted.len() {
            out += "\n";
        }
    }

    let total_fees: f64 = txs.iter().filter_map(|tx| tx.tx_fee_usd).sum();
    out += &format!("\n\nSummary: {} transactions", txs.len());
    out += &format!("\nTotal fees: ${}", to_fixed(total_fees, 2));
    if txs.iter().any(|tx| tx.pnl_usd.is_some()) {
        let total_pnl: f64 = txs.iter().filter_map(|tx| tx.pnl_usd).sum();
        let sign = if total_pnl > 0.0 { "+" } else { "" };
        out += &format!("\nTotal P&L: {}${}", sign, to_fixed(total_pnl, 2));
    }
    out
}
