// src/actions/defi_positions/all.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::group_by_chain;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, ALL_USER_DEFI_POSITIONS};
use crate::datai::models::{DeFiTokenDetail, UserDeFiPosition};
use crate::extract::params::validate_all_user_defi_positions_params;
use crate::extract::extract_wallet_address;
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct AllUserDeFiPositionsAction;

const NAME: &str = "GET_ALL_USER_DEFI_POSITIONS_ON_DATAI";

#[async_trait]
impl Action for AllUserDeFiPositionsAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_ALL_USER_DEFI_POSITIONS_ON_DATAI",
            "FETCH_ALL_DEFI_POSITIONS_ON_DATAI",
            "RETRIEVE_ALL_DEFI_INVESTMENTS_ON_DATAI",
            "SHOW_ALL_DEFI_POSITIONS_ON_DATAI",
            "LIST_ALL_DEFI_HOLDINGS_ON_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all DeFi positions for a user across all active chains on DATAI"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What are all my DATAI DeFi positions for wallet 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 ?",
                "Let me check the DeFi positions for 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 across all chains...",
                NAME,
            ),
            exchange(
                "Show me all DeFi investments for address 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
                "I'll fetch the DeFi positions for this wallet. One moment please...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let Some(address) = extract_wallet_address(message.text()) else {
            debug!("{}: no wallet address in message", NAME);
            return false;
        };
        validate_all_user_defi_positions_params(Some(address.as_str())).is_valid
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
        let Some(address) = extract_wallet_address(message.text()) else {
            return reply.prompt(
                "Please provide a valid wallet address to check DeFi positions.",
                "No wallet address provided",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching all DeFi positions for {}", address);
        let endpoint = for_user(ALL_USER_DEFI_POSITIONS, &address);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "DeFi positions") else {
            return false;
        };
        let Some(positions) = reply.decode::<Vec<UserDeFiPosition>>(&data, "DeFi positions") else {
            return false;
        };
        if positions.is_empty() {
            return reply.success(
                format!("No DeFi positions found for address {}.", address),
                json!({ "positions": [] }),
            );
        }

        reply.success(format_all_positions(&positions, &address), json!({ "positions": data }))
    }
}

fn token_amount(token: &DeFiTokenDetail) -> f64 {
    token.balance_decimal.or(token.balance).unwrap_or(0.0)
}

fn token_entries(tokens: &[DeFiTokenDetail], render: impl Fn(f64, &str, f64) -> String) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|t| {
            let amount = token_amount(t);
            let usd = t.balance_usd.unwrap_or(0.0);
            (amount > 0.0 || usd > 0.0).then(|| render(amount, t.token_symbol.as_deref().unwrap_or("Unknown"), usd))
        })
        .collect()
}

pub fn format_all_positions(positions: &[UserDeFiPosition], user_address: &str) -> String {
    let total_value: f64 = positions
        .iter()
        .flat_map(|p| p.portfolio.iter())
        .map(|item| item.nav_usd())
        .sum();

    let mut out = format!(
        "Found {} DeFi protocols with active positions for {}\n",
        positions.len(),
        user_address
    );
    out += &format!("Total position value: ${}\n", to_fixed(total_value, 2));
    if total_value <= 0.0 {
        out += "\nNote: This wallet shows no positions with USD value. This could mean:\n";
        out += "- The wallet has inactive or empty positions\n";
        out += "- Position values may be too small to register\n";
        out += "- Tokens might not have reliable price data\n";
    }
    out += "\n";

    for (chain, chain_positions) in group_by_chain(positions) {
        let mut chain_total = 0.0;
        let mut symbols = BTreeSet::new();
        for item in chain_positions.iter().flat_map(|p| p.portfolio.iter()) {
            chain_total += item.nav_usd();
            if let Some(tokens) = item.tokens() {
                let all = tokens.supply.iter().chain(&tokens.borrow).chain(&tokens.rewards);
                symbols.extend(all.filter_map(|t| t.token_symbol.as_deref()).filter(|s| !s.is_empty()));
            }
        }
        out += &format!(
            "{}: ${} ({} tokens)\n",
            chain.to_uppercase(),
            to_fixed(chain_total, 2),
            symbols.len()
        );

        for position in chain_positions {
            let mut position_value = 0.0;
            let mut entries: Vec<String> = Vec::new();
            for item in &position.portfolio {
                position_value += item.nav_usd();
                let Some(tokens) = item.tokens() else { continue };
                entries.extend(token_entries(&tokens.supply, |amt, sym, usd| {
                    format!("{} {} (${})", to_fixed(amt, 2), sym, to_fixed(usd, 2))
                }));
                entries.extend(token_entries(&tokens.borrow, |amt, sym, usd| {
                    format!("-{} {} (${})", to_fixed(amt, 2), sym, to_fixed(usd, 2))
                }));
                entries.extend(token_entries(&tokens.rewards, |amt, sym, usd| {
                    format!("{} {} (reward: ${})", to_fixed(amt, 2), sym, to_fixed(usd, 2))
                }));
            }
            out += &format!(
                "- {}: ${}\n",
                position.name.as_deref().unwrap_or("undefined"),
                to_fixed(position_value, 2)
            );
            if !entries.is_empty() {
                out += &format!("  Tokens: {}\n", entries.join(", "));
            }
        }
        out += "\n";
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    fn positions(v: Value) -> Vec<UserDeFiPosition> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn formats_chains_and_tokens() {
        let text = format_all_positions(
            &positions(json!([
                {
                    "chain": "eth",
                    "name": "Aave V3",
                    "portfolio": [{
                        "statistic": {"navUSD": 1500.5},
                        "detail": {
                            "supply": [{"tokenSymbol": "WETH", "balanceDecimal": 1.25, "balanceUSD": 2500}],
                            "borrow": [{"tokenSymbol": "USDC", "balance": 1000, "balanceUSD": 999.5}],
                            "rewards": [{"tokenSymbol": "AAVE", "balance": 0, "balanceUSD": 0}]
                        }
                    }]
                },
                {
                    "chain": "arb",
                    "name": "GMX",
                    "portfolio": [{"total": {"navUSD": 10}, "detailed": {"rewards": [{"tokenSymbol": "ESGMX", "balance": 2, "balanceUSD": 1}]}}]
                }
            ])),
            ADDR,
        );

        assert!(text.starts_with(&format!("Found 2 DeFi protocols with active positions for {}\nTotal position value: $1510.50\n\n", ADDR)));
        assert!(text.contains("ETH: $1500.50 (3 tokens)\n- Aave V3: $1500.50\n  Tokens: 1.25 WETH ($2500.00), -1000.00 USDC ($999.50)\n\n"));
        assert!(text.contains("ARB: $10.00 (1 tokens)\n- GMX: $10.00\n  Tokens: 2.00 ESGMX (reward: $1.00)\n"));
        assert!(!text.contains("Note:"));
    }

    #[test]
    fn zero_value_wallet_gets_a_note() {
        let text = format_all_positions(&positions(json!([{"chain": "eth", "name": "Idle", "portfolio": []}])), ADDR);
        assert!(text.contains("Total position value: $0.00\n\nNote: This wallet shows no positions with USD value."));
        assert!(text.contains("ETH: $0.00 (0 tokens)\n- Idle: $0.00\n"));
    }

    #[test]
    fn empty_positions() {
        let text = format_all_positions(&[], ADDR);
        assert!(text.starts_with(&format!("Found 0 DeFi protocols with active positions for {}\n", ADDR)));
        assert!(text.contains("Total position value: $0.00\n"));
    }
}
