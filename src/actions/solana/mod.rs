// src/actions/solana/mod.rs

mod extended;
mod short;

pub use extended::{format_solana_extended, SolanaUserTxHistoryExtendedAction};
pub use short::{format_solana_short, SolanaUserTxHistoryShortAction};

use crate::extract::contains_any;

/// The message has to name Solana and one of `keywords`.
fn is_solana_query(text: &str, keywords: &[&str]) -> bool {
    contains_any(text, &["solana"]) && contains_any(text, keywords)
}
