// src/actions/transactions/mod.rs
//
// Transaction history, lookup and overview actions.

mod all_chains_short;
mod by_chain;
mod by_hash;
mod defi_position;
mod history_all;
mod overview;
mod period_extended;
mod period_raw_label;
mod raw_label;
mod transfers_by_hash;

pub use all_chains_short::{format_short_history, UserTxHistoryAllChainsShortAction};
pub use by_chain::{format_chain_transactions, UserTransactionsByChainAction};
pub use by_hash::{extract_evm_hash, format_transaction_details, TransactionByHashAction};
pub use defi_position::{extract_position_id, format_position_transactions, TransactionsForDeFiPositionAction};
pub use history_all::{format_transaction_history, UserTxHistoryAllExtendedAction};
pub use overview::{format_overview, UserTransactionOverviewAction};
pub use period_extended::{format_period_extended, UserTxByPeriodAndChainExtendedAction};
pub use period_raw_label::{format_period_raw_label, UserTxByPeriodAndChainRawLabel20Action};
pub use raw_label::{format_raw_label_history, UserTxHistoryByChainRawLabelAction};
pub use transfers_by_hash::{extract_any_hash, format_transfers, TransactionTransfersByHashAction};

use serde_json::Value;

use crate::actions::{option_i64, option_u32};
use crate::datai::models::{TransactionHistoryItem, TxBalanceItem};
use crate::extract::{extract_limit, extract_time_period_from_text, TimePeriod};
use crate::format::{date_string, date_time_string, to_fixed};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Timestamp as a locale date-time, `Unknown date` when absent.
pub fn tx_date(timestamp: Option<f64>) -> String {
    match timestamp.filter(|t| *t != 0.0) {
        Some(ts) => date_time_string(ts),
        None => "Unknown date".to_string(),
    }
}

/// `limit N` in the message, then `options.limit`, then `default`.
pub fn resolve_limit(text: &str, options: Option<&Value>, default: u32) -> u32 {
    extract_limit(text)
        .filter(|l| *l > 0)
        .or_else(|| option_u32(options, "limit").filter(|l| *l > 0))
        .unwrap_or(default)
}

/// Time window from the message, else `options.dateRange`. A bound of 0
/// is absent; `None` when neither bound is known.
pub fn resolve_period(text: &str, options: Option<&Value>) -> Option<TimePeriod> {
    extract_time_period_from_text(text).or_else(|| {
        let range = options?.get("dateRange")?;
        let period = TimePeriod {
            start_time: option_i64(Some(range), "startDate").unwrap_or(0),
            end_time: option_i64(Some(range), "endDate").unwrap_or(0),
        };
        (period.start_time != 0 || period.end_time != 0).then_some(period)
    })
}

/// `startTime`/`endTime` query pairs for the bounds that are set.
pub fn period_query(period: &TimePeriod) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if period.start_time != 0 {
        query.push(("startTime", period.start_time.to_string()));
    }
    if period.end_time != 0 {
        query.push(("endTime", period.end_time.to_string()));
    }
    query
}

/// ` (showing the L most recent)` or ` (showing all n)`.
pub fn showing_note(total: usize, limit: usize) -> String {
    if total > limit {
        format!(" (showing the {} most recent)", limit)
    } else if total > 0 {
        format!(" (showing all {})", total)
    } else {
        String::new()
    }
}

/// `You` for the user's own address (exact match), otherwise the address.
pub fn you_or(address: &str, user_address: &str) -> String {
    if address == user_address {
        "You".to_string()
    } else {
        address.to_string()
    }
}

/// `0.002100 ETH ($7.50 USD)`, or the USD part alone without a native fee.
pub fn fee_display(tx: &TransactionHistoryItem) -> String {
    let usd = match tx.tx_fee_usd.filter(|f| *f != 0.0) {
        Some(f) => format!("${} USD", to_fixed(f, 2)),
        None => "N/A".to_string(),
    };
    match tx.tx_fee.filter(|f| *f != 0.0) {
        Some(wei) => format!("{} ETH ({})", to_fixed(wei / 1e18, 6), usd),
        None => usd,
    }
}

pub fn is_nft_standard(standard: Option<&str>) -> bool {
    matches!(standard, Some("ERC721") | Some("ERC1155"))
}

pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Value of the first movement: its USD worth when known, otherwise a
/// token amount above dust. The symbol comes back whenever a value does.
pub fn first_value(tx: &TransactionHistoryItem) -> (String, Option<String>) {
    let Some(first) = tx.balances.first() else {
        return ("N/A".to_string(), None);
    };
    if let Some(usd) = first.balance_usd.filter(|u| *u > 0.0) {
        return (format!("${}", to_fixed(usd, 2)), non_empty(&first.token_symbol).map(str::to_string));
    }
    match (first.balance, non_empty(&first.token_symbol)) {
        (Some(balance), Some(symbol)) if balance != 0.0 => {
            let amount = token_amount(first, balance);
            if amount > 0.001 {
                (format!("{} {}", to_fixed(amount, 4), symbol), Some(symbol.to_string()))
            } else {
                ("N/A".to_string(), None)
            }
        }
        _ => ("N/A".to_string(), None),
    }
}

fn token_amount(item: &TxBalanceItem, balance: f64) -> f64 {
    let decimals = item.token_decimals.filter(|d| *d != 0.0).unwrap_or(18.0);
    balance / 10f64.powf(decimals)
}

/// Groups by a key, keeping first-seen order.
pub fn group_in_order<'a, F>(txs: &'a [TransactionHistoryItem], key: F) -> Vec<(String, Vec<&'a TransactionHistoryItem>)>
where
    F: Fn(&TransactionHistoryItem) -> String,
{
    let mut groups: Vec<(String, Vec<&TransactionHistoryItem>)> = Vec::new();
    for tx in txs {
        let k = key(tx);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, members)) => members.push(tx),
            None => groups.push((k, vec![tx])),
        }
    }
    groups
}

/// `from date(end) to date(start)`, or `up to date(start)` without an end.
pub fn period_text(period: Option<&TimePeriod>) -> Option<String> {
    let period = period?;
    let start = period.start_time;
    if start == 0 {
        return None;
    }
    if period.end_time != 0 {
        Some(format!(
            "from {} to {}",
            date_string(period.end_time as f64),
            date_string(start as f64)
        ))
    } else {
        Some(format!("up to {}", date_string(start as f64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(v: Value) -> TransactionHistoryItem {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn limit_precedence() {
        let opts = json!({"limit": 3});
        assert_eq!(resolve_limit("history LIMIT 7", Some(&opts), 5), 7);
        assert_eq!(resolve_limit("history", Some(&opts), 5), 3);
        assert_eq!(resolve_limit("history limit 0", None, 5), 5);
    }

    #[test]
    fn period_falls_back_to_options() {
        let opts = json!({"dateRange": {"startDate": 1716346533, "endDate": "1705895733"}});
        let period = resolve_period("no dates here", Some(&opts)).unwrap();
        assert_eq!(period.start_time, 1_716_346_533);
        assert_eq!(period.end_time, 1_705_895_733);
        assert!(resolve_period("no dates here", None).is_none());

        let open_ended = json!({"dateRange": {"startDate": 1716346533}});
        let period = resolve_period("no dates here", Some(&open_ended)).unwrap();
        assert_eq!(period_query(&period), vec![("startTime", "1716346533".to_string())]);
    }

    #[test]
    fn first_value_prefers_usd() {
        let priced = tx(json!({"balances": [{"balanceUSD": 12.345, "tokenSymbol": "USDC"}]}));
        assert_eq!(first_value(&priced), ("$12.35".to_string(), Some("USDC".to_string())));

        let unpriced = tx(json!({"balances": [{"balance": "2500000000000000000", "tokenSymbol": "WETH"}]}));
        assert_eq!(first_value(&unpriced), ("2.5000 WETH".to_string(), Some("WETH".to_string())));

        let dust = tx(json!({"balances": [{"balance": 1, "tokenSymbol": "X", "tokenDecimals": 6}]}));
        assert_eq!(first_value(&dust).0, "N/A");
        assert_eq!(first_value(&tx(json!({}))).0, "N/A");
    }

    #[test]
    fn showing_notes() {
        assert_eq!(showing_note(12, 10), " (showing the 10 most recent)");
        assert_eq!(showing_note(4, 10), " (showing all 4)");
        assert_eq!(showing_note(0, 10), "");
    }

    #[test]
    fn dates() {
        assert_eq!(tx_date(None), "Unknown date");
        assert_eq!(tx_date(Some(0.0)), "Unknown date");
        assert_eq!(tx_date(Some(1_710_450_300.0)), "3/14/2024, 9:05:00 PM");
    }
}
