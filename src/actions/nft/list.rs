// src/actions/nft/list.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::push_nft_entry;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_NFTS_LIST};
use crate::datai::models::NftBalanceDetail;
use crate::extract::{extract_chain_id, extract_wallet_address, is_valid_wallet_address};
use crate::runtime::AgentRuntime;

pub struct UserNftsListAction;

const NAME: &str = "GET_USER_NFTS_LIST_DATAI";

#[async_trait]
impl Action for UserNftsListAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_NFTS_LIST_DATAI",
            "FETCH_ALL_USER_NFTS",
            "LIST_USER_NFT_COLLECTION",
            "SHOW_ALL_NFTS",
            "GET_MY_NFT_COLLECTION",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all NFTs owned by a user, optionally filtered by chain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What NFTs do I own? My wallet is 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI ?",
                "Let me check your NFT collection...",
                NAME,
            ),
            exchange(
                "Show me all my NFTs on Ethereum for wallet 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI",
                "I'll fetch your Ethereum NFTs. One moment please...",
                NAME,
            ),
        ]
    }

    async fn validate(&self, runtime: &dyn AgentRuntime, message: &Memory) -> bool {
        if api_key(runtime).is_none() {
            return false;
        }
        extract_wallet_address(message.text()).is_some_and(|a| is_valid_wallet_address(&a, None))
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
        let Some(address) = extract_wallet_address(text) else {
            return reply.prompt(
                "Please provide a valid wallet address to check NFTs.",
                "No wallet address provided",
            );
        };
        let chain = extract_chain_id(text);
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        let mut endpoint = for_user(USER_NFTS_LIST, &address);
        match &chain {
            Some(chain) => {
                info!("Fetching NFTs for {} on {}", address, chain);
                endpoint = with_query(endpoint, &[("chain", chain.clone())]);
            }
            None => info!("Fetching NFTs for {} across all chains", address),
        }
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "NFTs") else {
            return false;
        };
        let Some(nfts) = reply.decode::<Vec<NftBalanceDetail>>(&data, "NFTs") else {
            return false;
        };
        if nfts.is_empty() {
            let scope = chain.as_deref().map(|c| format!(" on chain {}", c)).unwrap_or_default();
            return reply.success(
                format!("No NFTs found for address {}{}.", address, scope),
                json!({ "nfts": [] }),
            );
        }

        reply.success(format_nfts_list(&nfts, &address, chain.as_deref()), json!({ "nfts": data }))
    }
}

/// Collection grouped by chain, chains in first-seen order.
pub fn format_nfts_list(nfts: &[NftBalanceDetail], user_address: &str, chain: Option<&str>) -> String {
    let mut groups: Vec<(&str, Vec<&NftBalanceDetail>)> = Vec::new();
    for nft in nfts {
        let key = nft.chain.as_deref().unwrap_or("undefined");
        match groups.iter_mut().find(|(c, _)| *c == key) {
            Some((_, members)) => members.push(nft),
            None => groups.push((key, vec![nft])),
        }
    }

    let mut out = format!("📊 NFT Collection for {} 📊\n", user_address);
    let scope = match chain {
        Some(c) => format!(" on chain {}", c.to_uppercase()),
        None => " across all chains".to_string(),
    };
    out += &format!("Found {} NFTs{}\n\n", nfts.len(), scope);

    for (chain, members) in groups {
        out += &format!("🔷 {} ({} NFTs)\n", chain.to_uppercase(), members.len());
        for nft in members {
            push_nft_entry(&mut out, nft);
        }
    }
    out
}
