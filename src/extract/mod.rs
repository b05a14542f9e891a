// src/extract/mod.rs
//
// Free-text parameter extraction. Everything here is first-pattern-wins.

pub mod address;
pub mod chain;
pub mod keywords;
pub mod params;
pub mod time;

pub use address::{extract_transaction_hash, extract_wallet_address, is_solana, is_valid_transaction_hash,
    is_valid_wallet_address, truncate_address, ChainFamily};
pub use chain::{extract_chain_id, extract_multiple_chain_ids, is_valid_chain_id, is_valid_chain_list,
    map_common_name_to_chain_id, VALID_CHAIN_IDS};
pub use keywords::{ci_all, contains_any, count_distinct_matches, matches_any, contains_extended_tx_history_keywords, contains_raw_tx_keywords,
    contains_time_period_keywords, extract_limit};
pub use params::{parse_params_from_text, ValidationResult};
pub use time::{calculate_time_period_from_text, convert_date_to_unix_timestamp, extract_time_period_from_text,
    is_valid_time_period, is_valid_timestamp, TimePeriod};
