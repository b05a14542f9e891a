// src/extract/chain.rs
//
// Chain id recognition. Matching is first-chain-wins in the order of
// `VALID_CHAIN_IDS`, so "eth" beats "base" when both are mentioned.

use lazy_static::lazy_static;
use regex::Regex;

pub const VALID_CHAIN_IDS: &[&str] = &[
    "eth", "bsc", "matic", "arb", "avax", "ftm", "op", "sol", "solana", "base", "xdai",
];

/// Everyday names that map onto a chain id.
const COMMON_NAMES: &[(&str, &str)] = &[
    (r"\bethereum\b", "eth"),
    (r"\bxdai\b", "xdai"),
    (r"\barbitrum\b", "arb"),
    (r"\bpolygon\b", "matic"),
    (r"\bbinance\b", "bsc"),
    (r"\bbnb chain\b", "bsc"),
    (r"\bavalanche\b", "avax"),
    (r"\bfantom\b", "ftm"),
    (r"\boptimism\b", "op"),
    (r"\bbase\b", "base"),
];

fn ci(pattern: &str) -> Regex {
    // Only ever fed the fixed chain ids and alias literals above.
    Regex::new(&format!("(?i){}", pattern)).unwrap()
}

fn direct_patterns(chain: &str) -> Vec<Regex> {
    let c = regex::escape(chain);
    vec![
        ci(&format!(r"\b{}\b", c)),
        ci(&format!(r"chain[:=\s]\s*{}\b", c)),
        ci(&format!(r"\bon\s+{}\b", c)),
        ci(&format!(r"\bfor\s+{}\b", c)),
    ]
}

lazy_static! {
    static ref DIRECT: Vec<(&'static str, Vec<Regex>)> = VALID_CHAIN_IDS
        .iter()
        .map(|chain| (*chain, direct_patterns(chain)))
        .collect();

    // Direct patterns plus the alias names belonging to that chain.
    static ref WITH_ALIASES: Vec<(&'static str, Vec<Regex>)> = VALID_CHAIN_IDS
        .iter()
        .map(|chain| {
            let mut patterns = direct_patterns(chain);
            patterns.extend(
                COMMON_NAMES
                    .iter()
                    .filter(|(_, id)| id == chain)
                    .map(|(p, _)| ci(p)),
            );
            (*chain, patterns)
        })
        .collect();

    static ref COMMON: Vec<(Regex, &'static str)> =
        COMMON_NAMES.iter().map(|(p, id)| (ci(p), *id)).collect();

    static ref COMBINATIONS: Vec<Regex> = vec![
        ci(r"(?:on|across|between|for|in)\s+([a-z]+)\s+(?:and|,)\s+([a-z]+)"),
        ci(r"(?:on|across|between|for|in)\s+([a-z]+)\s*,\s*([a-z]+)(?:\s*,\s*and\s+|\s*and\s+|\s*,\s*)([a-z]+)"),
    ];
}

pub fn is_known_chain(chain: &str) -> bool {
    VALID_CHAIN_IDS.contains(&chain)
}

/// Case-insensitive membership in the supported chain list.
pub fn is_valid_chain_id(chain: &str) -> bool {
    !chain.is_empty() && is_known_chain(&chain.to_lowercase())
}

/// Comma-separated list of at most `max_chains` supported ids.
pub fn is_valid_chain_list(chains: &str, max_chains: usize) -> bool {
    if chains.trim().is_empty() {
        return false;
    }
    let list: Vec<&str> = chains.split(',').map(str::trim).collect();
    !list.is_empty() && list.len() <= max_chains && list.iter().all(|c| is_valid_chain_id(c))
}

pub fn map_common_name_to_chain_id(name: &str) -> String {
    let lower = name.to_lowercase();
    let mapped = match lower.as_str() {
        "ethereum" => "eth",
        "xdai" => "xdai",
        "arbitrum" => "arb",
        "polygon" => "matic",
        "binance" | "bnb" => "bsc",
        "avalanche" => "avax",
        "fantom" => "ftm",
        "optimism" => "op",
        "base" => "base",
        _ => return lower,
    };
    mapped.to_string()
}

/// First supported chain mentioned in the text, by id or common name.
pub fn extract_chain_id(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    WITH_ALIASES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| p.is_match(text)))
        .map(|(chain, _)| chain.to_string())
}

/// All supported chains mentioned in the text, in discovery order and
/// without duplicates. Phrases such as "on ethereum and polygon" take
/// precedence over scanning for individual mentions.
pub fn extract_multiple_chain_ids(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    if text.is_empty() {
        return found;
    }

    for pattern in COMBINATIONS.iter() {
        if let Some(caps) = pattern.captures(text) {
            for group in caps.iter().skip(1).flatten() {
                let chain = map_common_name_to_chain_id(group.as_str().trim());
                if is_valid_chain_id(&chain) && !found.contains(&chain) {
                    found.push(chain);
                }
            }
        }
    }

    if found.is_empty() {
        for (chain, patterns) in DIRECT.iter() {
            if patterns.iter().any(|p| p.is_match(text)) && !found.iter().any(|f| f == chain) {
                found.push(chain.to_string());
            }
        }
        for (pattern, chain) in COMMON.iter() {
            if pattern.is_match(text) && !found.iter().any(|f| f == chain) {
                found.push(chain.to_string());
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_maps_to_its_chain() {
        let cases = [
            ("on ethereum", "eth"),
            ("on arbitrum", "arb"),
            ("on polygon", "matic"),
            ("on binance", "bsc"),
            ("on bnb chain", "bsc"),
            ("on avalanche", "avax"),
            ("on fantom", "ftm"),
            ("on optimism", "op"),
            ("on base", "base"),
            ("on xdai", "xdai"),
        ];
        for (text, chain) in cases {
            assert_eq!(extract_chain_id(text).as_deref(), Some(chain), "{}", text);
        }
    }

    #[test]
    fn every_chain_id_is_found_verbatim() {
        for chain in VALID_CHAIN_IDS {
            let text = format!("balance chain={}", chain);
            assert_eq!(extract_chain_id(&text).as_deref(), Some(*chain));
        }
    }

    #[test]
    fn earlier_chain_in_list_wins() {
        assert_eq!(extract_chain_id("base and eth").as_deref(), Some("eth"));
        assert_eq!(extract_chain_id("ETH please").as_deref(), Some("eth"));
        assert_eq!(extract_chain_id("what about my tokens"), None);
    }

    #[test]
    fn solana_is_not_mistaken_for_sol() {
        assert_eq!(extract_chain_id("my solana wallet").as_deref(), Some("solana"));
        assert_eq!(extract_chain_id("on sol").as_deref(), Some("sol"));
    }

    #[test]
    fn common_names_map_or_pass_through() {
        assert_eq!(map_common_name_to_chain_id("Ethereum"), "eth");
        assert_eq!(map_common_name_to_chain_id("bnb"), "bsc");
        assert_eq!(map_common_name_to_chain_id("blast"), "blast");
    }

    #[test]
    fn validates_chain_ids_and_lists() {
        assert!(is_valid_chain_id("ETH"));
        assert!(!is_valid_chain_id("blast"));
        assert!(!is_valid_chain_id(""));
        assert!(is_valid_chain_list("eth, bsc,matic", 10));
        assert!(!is_valid_chain_list("eth,blast", 10));
        assert!(!is_valid_chain_list("", 10));
        let eleven = vec!["eth"; 11].join(",");
        assert!(!is_valid_chain_list(&eleven, 10));
    }

    #[test]
    fn combination_phrase_extracts_in_order() {
        assert_eq!(
            extract_multiple_chain_ids("positions on ethereum and polygon"),
            vec!["eth", "matic"]
        );
        assert_eq!(
            extract_multiple_chain_ids("positions across arbitrum, optimism and base"),
            vec!["arb", "op", "base"]
        );
    }

    #[test]
    fn falls_back_to_individual_mentions() {
        assert_eq!(
            extract_multiple_chain_ids("show eth, bsc, matic positions"),
            vec!["eth", "bsc", "matic"]
        );
        assert_eq!(
            extract_multiple_chain_ids("polygon plus avalanche"),
            vec!["matic", "avax"]
        );
        assert!(extract_multiple_chain_ids("nothing here").is_empty());
    }

    #[test]
    fn combination_with_unknown_chain_keeps_valid_part() {
        // "blast" is not supported, only eth survives the combination phrase
        assert_eq!(extract_multiple_chain_ids("on ethereum and blast"), vec!["eth"]);
    }
}
