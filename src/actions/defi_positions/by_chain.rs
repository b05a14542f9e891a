// src/actions/defi_positions/by_chain.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::Totals;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_DEFI_POSITIONS_BY_CHAIN};
use crate::datai::models::{DeFiTokenDetail, UserDeFiPosition};
use crate::extract::params::validate_defi_positions_by_chain_params;
use crate::extract::{extract_chain_id, extract_wallet_address};
use crate::format::{scale_by_decimals, to_fixed};
use crate::runtime::AgentRuntime;

pub struct UserDeFiPositionsByChainAction;

const NAME: &str = "GET_USER_DEFI_POSITIONS_BY_CHAIN_DATAI";
const TOKENS_SHOWN: usize = 5;

#[async_trait]
impl Action for UserDeFiPositionsByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_DEFI_POSITIONS_BY_SINGLE_CHAIN_DATAI",
            "FETCH_SINGLE_CHAIN_POSITIONS_DATAI",
            "GET_DEFI_ACTIVITIES_BY_SINGLE_CHAIN_DATAI",
            "SHOW_SINGLE_CHAIN_DEFI_POSITIONS_DATAI",
            "LIST_DEFI_PROTOCOLS_BY_SINGLE_CHAIN_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all DeFi information (active open positions) for a specific user on a specific chain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What single chain DeFi positions do I have on Arbitrum with wallet 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106 on DATAI?",
                "I'll check your DeFi positions on Arbitrum for wallet 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106...",
                NAME,
            ),
            exchange(
                "Show me all my DeFi investments on arb chain for address 0x09CF915e195aF33FA7B932C253352Ae9FBdB0106 on DATAI",
                "Retrieving your DeFi positions on Arbitrum chain...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        let text = message.text();
        let (Some(address), Some(chain)) = (extract_wallet_address(text), extract_chain_id(text)) else {
            return false;
        };
        validate_defi_positions_by_chain_params(Some(address.as_str()), Some(chain.as_str())).is_valid
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
        let (Some(address), Some(chain)) = (extract_wallet_address(text), extract_chain_id(text)) else {
            return reply.prompt(
                "Please provide both a valid wallet address and chain ID to check DeFi positions.",
                "Missing required parameters",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching DeFi positions for {} on {}", address, chain);
        let endpoint = with_query(
            for_user(USER_DEFI_POSITIONS_BY_CHAIN, &address),
            &[("chain", chain.clone())],
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
                    "No DeFi positions found for address {} on chain {}.",
                    address,
                    chain.to_uppercase()
                ),
                json!({ "positions": [] }),
            );
        }

        let totals = Totals::of(&positions);
        reply.success(
            format_positions_by_chain(&positions, &address, &chain),
            json!({
                "positions": data,
                "summary": {
                    "totalSupplyUSD": totals.supply,
                    "totalDebtUSD": totals.debt,
                    "totalNavUSD": totals.nav,
                    "protocolCount": positions.len(),
                }
            }),
        )
    }
}

fn token_section(out: &mut String, header: &str, tokens: &[DeFiTokenDetail], more_label: &str) {
    if tokens.is_empty() {
        return;
    }
    out.push_str(header);
    for token in tokens.iter().take(TOKENS_SHOWN) {
        let (Some(symbol), Some(balance)) = (token.token_symbol.as_deref().filter(|s| !s.is_empty()), token.balance)
        else {
            continue;
        };
        let amount = scale_by_decimals(balance, token.token_decimals);
        let value = token
            .balance_usd
            .filter(|v| *v != 0.0)
            .map(|v| to_fixed(v, 2))
            .unwrap_or_else(|| "0.00".to_string());
        out.push_str(&format!("     • {} {} (${})\n", to_fixed(amount, 6), symbol, value));
        out.push_str(&format!(
            "       Token Address: {}\n",
            token.token_address.as_deref().unwrap_or("undefined")
        ));
    }
    if tokens.len() > TOKENS_SHOWN {
        out.push_str(&format!(
            "     • ...and {} more {}\n",
            tokens.len() - TOKENS_SHOWN,
            more_label
        ));
    }
}

pub fn format_positions_by_chain(positions: &[UserDeFiPosition], user_address: &str, chain: &str) -> String {
    let chain_upper = chain.to_uppercase();
    let mut out = format!("DeFi Positions for {} on {}:\n\n", user_address, chain_upper);
    let mut totals = Totals::default();

    for (index, position) in positions.iter().enumerate() {
        out += &format!(
            "{}. Protocol: {}\n",
            index + 1,
            position.name.as_deref().unwrap_or("undefined")
        );
        out += &format!("   Website: {}\n", position.site.as_deref().unwrap_or("undefined"));

        for item in &position.portfolio {
            if let Some(total) = &item.total {
                let supply = total.supply_usd.unwrap_or(0.0);
                let debt = total.debt_usd.unwrap_or(0.0);
                let nav = total.nav_usd.unwrap_or(0.0);
                out += &format!("   Supply Value: ${}\n", to_fixed(supply, 2));
                out += &format!("   Debt Value: ${}\n", to_fixed(debt, 2));
                out += &format!("   Net Value: ${}\n", to_fixed(nav, 2));
                totals.add(total);
            }
            if let Some(detailed) = &item.detailed {
                token_section(&mut out, "   Supply Tokens:\n", &detailed.supply, "tokens");
                token_section(&mut out, "   Reward Tokens:\n", &detailed.rewards, "reward tokens");
                token_section(&mut out, "   Borrow Tokens:\n", &detailed.borrow, "tokens");
            }
            out += "\n";
        }
        out += "-------------------\n\n";
    }

    out += &format!("Overall Summary on {}:\n", chain_upper);
    out += &format!("Total Supply Value: ${}\n", to_fixed(totals.supply, 2));
    out += &format!("Total Debt Value: ${}\n", to_fixed(totals.debt, 2));
    out += &format!("Total Net Value: ${}\n", to_fixed(totals.nav, 2));
    out += &format!("Protocol Count: {}\n", positions.len());
    out
}
