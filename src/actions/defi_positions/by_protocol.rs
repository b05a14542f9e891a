// src/actions/defi_positions/by_protocol.rs

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::{debug, info};

use super::Totals;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_DEFI_POSITIONS_BY_PROTOCOL};
use crate::datai::models::{DeFiTokenDetail, UserDeFiPosition};
use crate::extract::params::validate_defi_positions_by_protocol_params;
use crate::extract::{extract_chain_id, extract_wallet_address};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct UserDeFiPositionsByProtocolAction;

const NAME: &str = "GET_USER_DEFI_POSITIONS_BY_PROTOCOL_DATAI";

lazy_static! {
    // Phrases naming a protocol outright, e.g. "in avax_gmx protocol".
    static ref EXPLICIT_PROTOCOL: Vec<Regex> = [
        r"(?i)on (\w+) protocol",
        r"(?i)in (\w+) protocol",
        r"(?i)for (\w+) protocol",
        r"(?i)at (\w+) protocol",
        r"(?i)protocol (\w+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();

    static ref LOOSE_PROTOCOL: Vec<Regex> = [r"(?i)for (\w+)", r"(?i)in (\w+)"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();

    // Protocol ids such as avax_gmx.
    static ref PROTOCOL_ID: Regex = Regex::new(r"(\w+_\w+)").unwrap();

    static ref SINGLE_PROTOCOL: Regex =
        Regex::new(r"(?i)(single|one|specific|individual|particular) protocol").unwrap();
}

/// First protocol name in the text, lowercased.
pub fn extract_protocol_name(text: &str) -> Option<String> {
    EXPLICIT_PROTOCOL
        .iter()
        .chain(LOOSE_PROTOCOL.iter())
        .chain(std::iter::once(&*PROTOCOL_ID))
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_lowercase())
}

/// Number of distinct protocols the text names explicitly.
pub fn count_protocols(text: &str) -> usize {
    let mut found = HashSet::new();
    for re in EXPLICIT_PROTOCOL.iter().chain(std::iter::once(&*PROTOCOL_ID)) {
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                found.insert(m.as_str().to_lowercase());
            }
        }
    }
    found.len()
}

pub fn contains_single_protocol_keywords(text: &str) -> bool {
    SINGLE_PROTOCOL.is_match(text)
}

#[async_trait]
impl Action for UserDeFiPositionsByProtocolAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_DEFI_POSITIONS_BY_PROTOCOL_DATAI",
            "FETCH_PROTOCOL_POSITIONS",
            "GET_DEFI_ACTIVITIES_IN_PROTOCOL",
            "SHOW_PROTOCOL_POSITIONS",
            "LIST_PROTOCOL_POSITIONS",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all DeFi information (active open positions) for a specific user in a specific protocol"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What single protocol DeFi positions does wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 have in avax_gmx protocol on Avalanche on DATAI ?",
                "I'll check the positions in the avax_gmx protocol on Avalanche...",
                NAME,
            ),
            exchange(
                "Show me GMX investments for wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 on avax chain on DATAI",
                "Checking the avax_gmx protocol positions for this wallet...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        let Some(address) = extract_wallet_address(text) else {
            return false;
        };
        let Some(protocol) = extract_protocol_name(text) else {
            return false;
        };
        let count = count_protocols(text);
        if count != 1 && !contains_single_protocol_keywords(text) {
            debug!("{}: {} protocols mentioned, declining", NAME, count);
            return false;
        }
        validate_defi_positions_by_protocol_params(Some(address.as_str()), Some(protocol.as_str())).is_valid
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
        let (Some(address), Some(protocol)) = (extract_wallet_address(text), extract_protocol_name(text)) else {
            return reply.prompt(
                "Please provide both a valid wallet address and protocol name to check DeFi positions.",
                "Missing required parameters",
            );
        };
        let chain = extract_chain_id(text);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching DeFi positions for {} in protocol {} (chain {:?})", address, protocol, chain);
        let mut query = Vec::new();
        if let Some(chain) = &chain {
            query.push(("chain", chain.clone()));
        }
        query.push(("protocol", protocol.clone()));
        let endpoint = with_query(for_user(USER_DEFI_POSITIONS_BY_PROTOCOL, &address), &query);

        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "DeFi positions") else {
            return false;
        };
        let Some(positions) = reply.decode::<Vec<UserDeFiPosition>>(&data, "DeFi positions") else {
            return false;
        };
        if positions.is_empty() {
            return reply.success(
                format!("No DeFi positions found for address {} in protocol {}.", address, protocol),
                json!({ "positions": [] }),
            );
        }

        let (text, totals) = format_protocol_positions(&positions, &address, &protocol);
        reply.success(
            text,
            json!({
                "positions": data,
                "summary": {
                    "totalSupplyUSD": totals.supply,
                    "totalDebtUSD": totals.debt,
                    "totalNavUSD": totals.nav,
                }
            }),
        )
    }
}

fn token_lines(out: &mut String, header: &str, tokens: &[DeFiTokenDetail]) {
    if tokens.is_empty() {
        return;
    }
    out.push_str(header);
    for token in tokens {
        let amount = token.balance_decimal.or(token.balance).unwrap_or(0.0);
        let name = token
            .token_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(|n| format!(" ({})", n))
            .unwrap_or_default();
        out.push_str(&format!(
            "     • {} {}{} (${})\n",
            to_fixed(amount, 4),
            token.token_symbol.as_deref().unwrap_or("undefined"),
            name,
            to_fixed(token.balance_usd.unwrap_or(0.0), 2)
        ));
        out.push_str(&format!(
            "       Address: {}\n",
            token.token_address.as_deref().unwrap_or("undefined")
        ));
    }
}

pub fn format_protocol_positions(
    positions: &[UserDeFiPosition],
    user_address: &str,
    protocol: &str,
) -> (String, Totals) {
    let protocol_upper = protocol.to_uppercase();
    let mut out = format!("DeFi Positions for {} in {}:\n\n", user_address, protocol_upper);
    let mut totals = Totals::default();

    for (index, position) in positions.iter().enumerate() {
        let title = position
            .common_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(position.name.as_deref())
            .unwrap_or("undefined");
        out += &format!("{}. Protocol: {}\n", index + 1, title);
        out += &format!(
            "   Chain: {}\n",
            position.chain.as_deref().unwrap_or("unknown").to_uppercase()
        );
        if let Some(site) = position.site.as_deref().filter(|s| !s.is_empty()) {
            out += &format!("   Website: {}\n", site);
        }

        for item in &position.portfolio {
            out += &format!(
                "   Type: {}\n",
                item.module.as_deref().filter(|m| !m.is_empty()).unwrap_or("Unknown")
            );
            if let Some(total) = &item.total {
                out += &format!("   Supply Value: ${}\n", to_fixed(total.supply_usd.unwrap_or(0.0), 2));
                out += &format!("   Debt Value: ${}\n", to_fixed(total.debt_usd.unwrap_or(0.0), 2));
                out += &format!("   Net Value: ${}\n", to_fixed(total.nav_usd.unwrap_or(0.0), 2));
                totals.add(total);
            }
            if let Some(detailed) = &item.detailed {
                token_lines(&mut out, "   Supply Tokens:\n", &detailed.supply);
                token_lines(&mut out, "   Borrow Tokens:\n", &detailed.borrow);
                token_lines(&mut out, "   Rewards:\n", &detailed.rewards);
            }
            out += "\n";
        }
        out += "-------------------\n\n";
    }

    out += &format!("Overall Summary in {}:\n", protocol_upper);
    out += &format!("Total Supply Value: ${}\n", to_fixed(totals.supply, 2));
    out += &format!("Total Debt Value: ${}\n", to_fixed(totals.debt, 2));
    out += &format!("Total Net Value: ${}\n", to_fixed(totals.nav, 2));
    (out, totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50";

    #[test]
    fn protocol_extraction_order() {
        assert_eq!(extract_protocol_name("positions in avax_gmx protocol").as_deref(), Some("avax_gmx"));
        assert_eq!(extract_protocol_name("show protocol Aave please").as_deref(), Some("aave"));
        assert_eq!(extract_protocol_name("positions for Uniswap").as_deref(), Some("uniswap"));
        assert_eq!(extract_protocol_name("eth_aave3 positions").as_deref(), Some("eth_aave3"));
        assert_eq!(extract_protocol_name("what do I hold"), None);
    }

    #[test]
    fn counts_distinct_protocols() {
        assert_eq!(count_protocols("positions in avax_gmx protocol"), 1);
        assert_eq!(count_protocols("compare eth_aave3 and arb_gmx"), 2);
        assert_eq!(count_protocols("my wallet positions"), 0);
    }

    #[tokio::test]
    async fn validate_requires_one_protocol_or_single_keyword() {
        let action = UserDeFiPositionsByProtocolAction;
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let one = Memory::from_text(format!("positions for {} in avax_gmx protocol", ADDR));
        assert!(action.validate(&rt, &one).await);

        let two = Memory::from_text(format!("positions for {} in eth_aave3 and arb_gmx", ADDR));
        assert!(!action.validate(&rt, &two).await);

        let keyword = Memory::from_text(format!(
            "What single protocol DeFi positions does wallet {} have in avax_gmx protocol on Avalanche?",
            ADDR
        ));
        assert!(action.validate(&rt, &keyword).await);
    }

    #[test]
    fn formats_modules_and_tokens() {
        let positions: Vec<UserDeFiPosition> = serde_json::from_value(json!([{
            "chain": "avax",
            "name": "avax_gmx",
            "commonName": "GMX",
            "site": "https://gmx.io",
            "portfolio": [{
                "module": "Staked",
                "total": {"supplyUSD": 20, "debtUSD": 0, "navUSD": 20},
                "detailed": {
                    "supply": [{"tokenSymbol": "GMX", "tokenName": "GMX Token", "balanceDecimal": 1.23457, "balanceUSD": 20, "tokenAddress": "0xg"}],
                    "rewards": [{"tokenSymbol": "WAVAX", "balance": 3, "tokenAddress": "0xw"}]
                }
            }, {}]
        }]))
        .unwrap();
        let (text, totals) = format_protocol_positions(&positions, ADDR, "avax_gmx");
        assert!(text.starts_with(&format!("DeFi Positions for {} in AVAX_GMX:\n\n1. Protocol: GMX\n   Chain: AVAX\n   Website: https://gmx.io\n   Type: Staked\n", ADDR)));
        assert!(text.contains("   Supply Tokens:\n     • 1.2346 GMX (GMX Token) ($20.00)\n       Address: 0xg\n"));
        assert!(text.contains("   Rewards:\n     • 3.0000 WAVAX ($0.00)\n       Address: 0xw\n\n   Type: Unknown\n\n"));
        assert!(text.ends_with("Overall Summary in AVAX_GMX:\nTotal Supply Value: $20.00\nTotal Debt Value: $0.00\nTotal Net Value: $20.00\n"));
        assert_eq!(totals.nav, 20.0);
    }

    #[test]
    fn empty_positions() {
        let (text, totals) = format_protocol_positions(&[], ADDR, "aave");
        assert!(text.starts_with(&format!("DeFi Positions for {} in AAVE:\n\n", ADDR)));
        assert_eq!(totals.nav, 0.0);
    }
}
