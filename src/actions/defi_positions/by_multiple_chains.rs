// src/actions/defi_positions/by_multiple_chains.rs

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{group_by_chain, Totals};
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_DEFI_POSITIONS_BY_MULTIPLE_CHAINS};
use crate::datai::models::UserDeFiPosition;
use crate::extract::params::validate_defi_positions_by_multiple_chains_params;
use crate::extract::{extract_multiple_chain_ids, extract_wallet_address};
use crate::format::to_fixed;
use crate::runtime::AgentRuntime;

pub struct UserDeFiPositionsByMultipleChainsAction;

const NAME: &str = "GET_USER_DEFI_POSITIONS_BY_MULTIPLE_CHAINS_DATAI";

#[async_trait]
impl Action for UserDeFiPositionsByMultipleChainsAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_DEFI_POSITIONS_BY_MULTIPLE_CHAINS_DATAI",
            "FETCH_MULTI_CHAIN_DEFI_POSITIONS",
            "GET_DEFI_ACTIVITIES_ACROSS_CHAINS",
            "SHOW_MULTI_CHAIN_DEFI_POSITIONS",
            "LIST_DEFI_PROTOCOLS_ACROSS_CHAINS",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all DeFi information (active open positions) for a specific user across multiple specified chains"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What multi chain DeFi positions does wallet 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 have on Avalanche and Arbitrum on DATAI?",
                "I'll check the DeFi positions across both Avalanche and Arbitrum chains...",
                NAME,
            ),
            exchange(
                "Show me multi chain DeFi investments for 0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50 on avax and arb chains on DATAI",
                "Let me fetch DeFi positions across Avalanche and Arbitrum chains...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let Some(address) = extract_wallet_address(message.text()) else {
            return false;
        };
        let chains = extract_multiple_chain_ids(message.text());
        validate_defi_positions_by_multiple_chains_params(Some(address.as_str()), &chains).is_valid
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
        let address = extract_wallet_address(message.text());
        let chains = extract_multiple_chain_ids(message.text());
        let Some(address) = address.filter(|_| !chains.is_empty()) else {
            return reply.prompt(
                "Please provide both a valid wallet address and at least one chain ID to check DeFi positions.",
                "Missing required parameters",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching DeFi positions for {} across {:?}", address, chains);
        let endpoint = with_query(
            for_user(USER_DEFI_POSITIONS_BY_MULTIPLE_CHAINS, &address),
            &[("chains", chains.join(","))],
        );
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "DeFi positions") else {
            return false;
        };
        let Some(positions) = reply.decode::<Vec<UserDeFiPosition>>(&data, "DeFi positions") else {
            return false;
        };
        if positions.is_empty() {
            return reply.success(
                format!(
                    "No DeFi positions found for address {} across the specified chains.",
                    address
                ),
                json!({ "positions": [] }),
            );
        }

        let report = format_multiple_chain_positions(&positions, &address, &chains);
        let chain_totals: Map<String, Value> = report
            .chain_totals
            .iter()
            .map(|(chain, t)| (chain.clone(), json!({ "supply": t.supply, "debt": t.debt, "nav": t.nav })))
            .collect();
        reply.success(
            report.text,
            json!({
                "positions": data,
                "summary": {
                    "totalSupplyUSD": report.totals.supply,
                    "totalDebtUSD": report.totals.debt,
                    "totalNavUSD": report.totals.nav,
                    "chainTotals": chain_totals,
                }
            }),
        )
    }
}

pub struct MultiChainReport {
    pub text: String,
    pub totals: Totals,
    pub chain_totals: Vec<(String, Totals)>,
}

pub fn format_multiple_chain_positions(
    positions: &[UserDeFiPosition],
    user_address: &str,
    chains: &[String],
) -> MultiChainReport {
    let requested: Vec<String> = chains.iter().map(|c| c.to_uppercase()).collect();
    let mut text = format!("DeFi Positions for {} across {}:\n\n", user_address, requested.join(", "));
    let mut totals = Totals::default();
    let mut chain_totals = Vec::new();

    for (chain, chain_positions) in group_by_chain(positions) {
        let mut chain_total = Totals::default();
        for item in chain_positions.iter().flat_map(|p| p.portfolio.iter()) {
            if let Some(total) = &item.total {
                chain_total.add(total);
                totals.add(total);
            }
        }

        text += &format!("Chain: {}\n", chain.to_uppercase());
        text += &format!("Total Supply: ${}\n", to_fixed(chain_total.supply, 2));
        text += &format!("Total Debt: ${}\n", to_fixed(chain_total.debt, 2));
        text += &format!("Total NAV: ${}\n\n", to_fixed(chain_total.nav, 2));

        for position in &chain_positions {
            text += &format!("  Protocol: {}\n", position.name.as_deref().unwrap_or("undefined"));
            let detailed = position.portfolio.iter().filter_map(|p| p.detailed.as_ref());
            let (supply, borrow) = detailed.fold((0, 0), |(s, b), d| (s + d.supply.len(), b + d.borrow.len()));
            if supply > 0 {
                text += &format!("    Supply: {} token(s)\n", supply);
            }
            if borrow > 0 {
                text += &format!("    Borrow: {} token(s)\n", borrow);
            }
            text += "\n";
        }
        text += "-------------------\n\n";
        chain_totals.push((chain, chain_total));
    }

    text += "Overall Summary:\n";
    text += &format!("Total Supply Value: ${}\n", to_fixed(totals.supply, 2));
    text += &format!("Total Debt Value: ${}\n", to_fixed(totals.debt, 2));
    text += &format!("Total Net Value: ${}\n", to_fixed(totals.nav, 2));

    MultiChainReport { text, totals, chain_totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0xbdfa4f4492dd7b7cf211209c4791af8d52bf5c50";

    #[tokio::test]
    async fn validate_wants_at_least_one_chain() {
        let action = UserDeFiPositionsByMultipleChainsAction;
        let rt = StaticRuntime::new().with_setting("DATAI_API_KEY", "k");
        let good = Memory::from_text(format!("DeFi positions for {} on avalanche and arbitrum", ADDR));
        assert!(action.validate(&rt, &good).await);
        let no_chain = Memory::from_text(format!("DeFi positions for {}", ADDR));
        assert!(!action.validate(&rt, &no_chain).await);
    }

    #[test]
    fn totals_per_chain_and_overall() {
        let positions: Vec<UserDeFiPosition> = serde_json::from_value(json!([
            {"chain": "avax", "name": "Benqi", "portfolio": [{
                "total": {"supplyUSD": 10, "debtUSD": 4, "navUSD": 6},
                "detailed": {"supply": [{}, {}], "borrow": [{}]}
            }]},
            {"chain": "arb", "name": "GMX", "portfolio": [{"total": {"supplyUSD": 5, "navUSD": 5}}]},
            {"chain": "avax", "name": "Trader Joe", "portfolio": []}
        ]))
        .unwrap();
        let chains = vec!["avax".to_string(), "arb".to_string()];
        let report = format_multiple_chain_positions(&positions, ADDR, &chains);

        assert!(report.text.starts_with(&format!("DeFi Positions for {} across AVAX, ARB:\n\nChain: AVAX\nTotal Supply: $10.00\nTotal Debt: $4.00\nTotal NAV: $6.00\n\n", ADDR)));
        assert!(report.text.contains("  Protocol: Benqi\n    Supply: 2 token(s)\n    Borrow: 1 token(s)\n\n  Protocol: Trader Joe\n\n-------------------\n\n"));
        assert!(report.text.contains("Chain: ARB\nTotal Supply: $5.00\n"));
        assert!(report.text.ends_with("Overall Summary:\nTotal Supply Value: $15.00\nTotal Debt Value: $4.00\nTotal Net Value: $11.00\n"));
        assert_eq!(report.chain_totals[0].0, "avax");
        assert_eq!(report.chain_totals[1].1.supply, 5.0);
    }

    #[test]
    fn empty_positions() {
        let report = format_multiple_chain_positions(&[], ADDR, &["eth".to_string(), "base".to_string()]);
        assert!(report.text.starts_with(&format!("DeFi Positions for {} across ETH, BASE:\n\n", ADDR)));
        assert!(report.chain_totals.is_empty());
    }
}
