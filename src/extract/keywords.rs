// src/extract/keywords.rs
//
// Keyword predicates the transaction actions use to tell siblings apart.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Compiles fixed case-insensitive patterns.
pub fn ci_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){}", p)).unwrap())
        .collect()
}

lazy_static! {
    static ref EXTENDED_TX: Vec<Regex> = ci_all(&[
        r"extended\s+tx",
        r"extended\s+transaction",
        r"complete\s+tx",
        r"complete\s+transaction",
        r"full\s+tx\s+list",
        r"full\s+transaction\s+list",
        r"transaction\s+history",
        r"tx\s+history",
        r"detailed\s+transaction",
        r"detailed\s+tx",
        r"comprehensive\s+transaction",
        r"comprehensive\s+tx",
        r"all\s+transactions",
        r"all\s+tx",
    ]);
    static ref TIME_PERIOD: Vec<Regex> = ci_all(&[
        r"starttime",
        r"endtime",
        r"start\s+time",
        r"end\s+time",
        r"startdate",
        r"enddate",
        r"start\s+date",
        r"end\s+date",
        r"last\s+\d+\s+(day|days|week|weeks|month|months|year|years)",
        r"past\s+\d+\s+(day|days|week|weeks|month|months|year|years)",
        r"since\s+(yesterday|last\s+week|last\s+month)",
        r"this\s+(week|month|year)",
        r"from\s+.+\s+to\s+",
        r"between\s+.+\s+and\s+",
        r"\d{1,2}[/\-]\d{1,2}[/\-]\d{4}",
        r"\d{4}[/\-]\d{1,2}[/\-]\d{1,2}",
    ]);
    static ref RAW_TX: Vec<Regex> = ci_all(&[
        r"raw\s+transaction",
        r"raw\s+tx",
        r"raw\s+short\s+tx",
        r"raw\s+transaction\s+short",
        r"raw\s+label",
        r"raw\s+labeled",
        r"classification",
    ]);
    static ref LIMIT: Regex = Regex::new(r"(?i)limit\s+(\d+)").unwrap();
}

fn first_hit(patterns: &[Regex], text: &str, kind: &str) -> bool {
    match patterns.iter().find(|p| p.is_match(text)) {
        Some(p) => {
            debug!("Found {} keyword: {}", kind, p.as_str());
            true
        }
        None => false,
    }
}

pub fn contains_extended_tx_history_keywords(text: &str) -> bool {
    first_hit(&EXTENDED_TX, text, "extended tx history")
}

pub fn contains_time_period_keywords(text: &str) -> bool {
    first_hit(&TIME_PERIOD, text, "time period")
}

pub fn contains_raw_tx_keywords(text: &str) -> bool {
    first_hit(&RAW_TX, text, "raw tx")
}

/// `limit N` anywhere in the text.
pub fn extract_limit(text: &str) -> Option<u32> {
    LIMIT
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Distinct lowercased matches across every pattern.
pub fn count_distinct_matches(patterns: &[Regex], text: &str) -> usize {
    let mut found: Vec<String> = Vec::new();
    for m in patterns.iter().flat_map(|p| p.find_iter(text)) {
        let hit = m.as_str().to_lowercase();
        if !found.contains(&hit) {
            found.push(hit);
        }
    }
    found.len()
}

/// Case-insensitive `contains` over a list of literal phrases.
pub fn contains_any(text: &str, phrases: &[&str]) -> bool {
    let lower = text.to_lowercase();
    phrases.iter().any(|p| lower.contains(p))
}
