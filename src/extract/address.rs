// src/extract/address.rs
//
// Wallet address and transaction hash recognition.

use lazy_static::lazy_static;
use regex::Regex;

use super::chain::is_known_chain;

lazy_static! {
    static ref EVM_ADDRESS_EXACT: Regex = Regex::new(r"(?i)^0x[a-f0-9]{40}$").unwrap();
    static ref EVM_ADDRESS_EXTRACT: Regex = Regex::new(r"(?i)\b(0x[a-f0-9]{40})\b").unwrap();
    static ref SOLANA_ADDRESS_EXACT: Regex = Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap();
    static ref SOLANA_ADDRESS_EXTRACT: Regex = Regex::new(r"\b([1-9A-HJ-NP-Za-km-z]{32,44})\b").unwrap();
    static ref EVM_TX_HASH: Regex = Regex::new(r"(?i)^0x[a-f0-9]{64}$").unwrap();
    static ref SOLANA_TX_SIGNATURE: Regex = Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{87,88}$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFamily {
    Evm,
    Solana,
}

impl ChainFamily {
    pub fn of(chain: &str) -> Self {
        if is_solana(chain) {
            ChainFamily::Solana
        } else {
            ChainFamily::Evm
        }
    }
}

pub fn is_solana(chain: &str) -> bool {
    chain == "sol" || chain == "solana"
}

/// Finds the first wallet address in free text. EVM addresses win over
/// base58 ones when both are present.
pub fn extract_wallet_address(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = EVM_ADDRESS_EXTRACT.captures(text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    SOLANA_ADDRESS_EXTRACT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Validates an address, optionally against the format of a given chain.
/// Unknown chains reject everything.
pub fn is_valid_wallet_address(address: &str, chain: Option<&str>) -> bool {
    if address.is_empty() {
        return false;
    }
    match chain.filter(|c| !c.is_empty()) {
        Some(c) if is_solana(c) => SOLANA_ADDRESS_EXACT.is_match(address),
        Some(c) if is_known_chain(c) => EVM_ADDRESS_EXACT.is_match(address),
        Some(_) => false,
        None => EVM_ADDRESS_EXACT.is_match(address) || SOLANA_ADDRESS_EXACT.is_match(address),
    }
}

pub fn is_valid_transaction_hash(hash: &str, chain: &str) -> bool {
    if hash.is_empty() || chain.is_empty() {
        return false;
    }
    if is_solana(chain) {
        SOLANA_TX_SIGNATURE.is_match(hash)
    } else if is_known_chain(chain) {
        EVM_TX_HASH.is_match(hash)
    } else {
        false
    }
}

/// Returns the text itself when the whole of it is a transaction hash of the
/// given family. Hashes embedded in a sentence are not found here; the
/// hash-lookup actions carry their own prefixed patterns for that.
pub fn extract_transaction_hash(text: &str, family: ChainFamily) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let pattern: &Regex = match family {
        ChainFamily::Evm => &EVM_TX_HASH,
        ChainFamily::Solana => &SOLANA_TX_SIGNATURE,
    };
    pattern.find(text).map(|m| m.as_str().to_string())
}

/// Shortens `0x1234...abcd` style, keeping `head` leading and `tail`
/// trailing characters. Short inputs come back unchanged.
pub fn truncate_address(address: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= head + tail {
        return address.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}...{}", start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVM: &str = "0x218e312fF5181290A46e3f87A73A8aD40C05A944";
    const SOL: &str = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1";

    #[test]
    fn extracts_evm_address_from_sentence() {
        let text = format!("show balances for {} on eth please", EVM);
        assert_eq!(extract_wallet_address(&text).as_deref(), Some(EVM));
    }

    #[test]
    fn evm_wins_over_solana() {
        let text = format!("{} and {}", SOL, EVM);
        assert_eq!(extract_wallet_address(&text).as_deref(), Some(EVM));
    }

    #[test]
    fn extracts_solana_address() {
        let text = format!("solana wallet {} recent txs", SOL);
        assert_eq!(extract_wallet_address(&text).as_deref(), Some(SOL));
    }

    #[test]
    fn no_address_in_plain_text() {
        assert_eq!(extract_wallet_address("what is my balance on eth"), None);
        assert_eq!(extract_wallet_address(""), None);
        // 39 hex digits is one short
        assert_eq!(extract_wallet_address("0x218e312fF5181290A46e3f87A73A8aD40C05A94"), None);
    }

    #[test]
    fn validates_address_against_chain() {
        assert!(is_valid_wallet_address(EVM, None));
        assert!(is_valid_wallet_address(SOL, None));
        assert!(is_valid_wallet_address(EVM, Some("eth")));
        assert!(is_valid_wallet_address(EVM, Some("base")));
        assert!(!is_valid_wallet_address(EVM, Some("sol")));
        assert!(is_valid_wallet_address(SOL, Some("solana")));
        assert!(!is_valid_wallet_address(SOL, Some("matic")));
        assert!(!is_valid_wallet_address(EVM, Some("dogechain")));
        assert!(!is_valid_wallet_address("", None));
        assert!(!is_valid_wallet_address("0xnothex", None));
    }

    #[test]
    fn validates_transaction_hashes() {
        let evm_hash = "0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf";
        assert!(is_valid_transaction_hash(evm_hash, "eth"));
        assert!(!is_valid_transaction_hash(evm_hash, "sol"));
        assert!(!is_valid_transaction_hash(evm_hash, "unknown"));
        assert!(!is_valid_transaction_hash("", "eth"));

        let sig = "5".repeat(88);
        assert!(is_valid_transaction_hash(&sig, "solana"));
        assert!(!is_valid_transaction_hash(&"5".repeat(86), "solana"));
    }

    #[test]
    fn transaction_hash_must_be_the_whole_text() {
        let evm_hash = "0xd4cd05342193d605764dcef1648b4f69fb90b2e4c7e315b7956fa0848cd727bf";
        assert_eq!(
            extract_transaction_hash(evm_hash, ChainFamily::Evm).as_deref(),
            Some(evm_hash)
        );
        let sentence = format!("look up {}", evm_hash);
        assert_eq!(extract_transaction_hash(&sentence, ChainFamily::Evm), None);
    }

    #[test]
    fn truncates_addresses() {
        assert_eq!(truncate_address(EVM, 6, 4), "0x218e...A944");
        assert_eq!(truncate_address("0x12", 6, 4), "0x12");
    }
}
