// src/actions/nft/by_chain.rs

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::push_nft_entry;
use crate::actions::{api_key, exchange, Action, ActionExample, ActionResponse, Memory, Reply};
use crate::datai::endpoints::{for_user, with_query, USER_NFTS_BY_CHAIN};
use crate::datai::models::NftBalanceDetail;
use crate::extract::{extract_chain_id, extract_wallet_address, is_valid_wallet_address};
use crate::runtime::AgentRuntime;

pub struct UserNftsByChainAction;

const NAME: &str = "GET_USER_NFTS_BY_CHAIN_DATAI";

#[async_trait]
impl Action for UserNftsByChainAction {
    fn name(&self) -> &'static str {
        NAME
    }

    fn similes(&self) -> &[&'static str] {
        &[
            "GET_USER_NFTS_BY_CHAIN_DATAI",
            "FETCH_THIS_CHAIN_NFTS_DATAI",
            "LIST_NFT_COLLECTION_FOR_CHAIN_DATAI",
            "SHOW_CHAIN_SPECIFIC_NFTS_DATAI",
            "GET_MY_NFTS_ON_CHAIN_DATAI",
        ]
    }

    fn description(&self) -> &'static str {
        "Retrieves all NFTs owned by a user on a specific blockchain"
    }

    fn examples(&self) -> Vec<Vec<ActionExample>> {
        vec![
            exchange(
                "What NFTs do I own on Polygon for wallet 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on DATAI?",
                "Let me check your Polygon NFT collection...",
                NAME,
            ),
            exchange(
                "Show me the NFTs for address 0x3764D79db51726E900a1380055F469eB6e2a7fD3 on matic chain on DATAI",
                "I'll fetch the NFTs on Polygon (matic). One moment please...",
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
        is_valid_wallet_address(&address, None) && extract_chain_id(text).is_some()
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
        let Some(chain) = extract_chain_id(text) else {
            return reply.prompt(
                "Please specify a blockchain to check NFTs on (e.g., eth, matic, bsc).",
                "No chain ID provided",
            );
        };
        let Some(client) = reply.client(runtime) else {
            return false;
        };

        info!("Fetching NFTs for {} on {}", address, chain);
        let endpoint = with_query(for_user(USER_NFTS_BY_CHAIN, &address), &[("chain", chain.clone())]);
        let Some(data) = reply.fetched(client.get_json(&endpoint).await, "NFTs") else {
            return false;
        };
        let Some(nfts) = reply.decode::<Vec<NftBalanceDetail>>(&data, "NFTs") else {
            return false;
        };
        if nfts.is_empty() {
            return reply.success(
                format!("No NFTs found for address {} on chain {}.", address, chain),
                json!({ "nfts": [] }),
            );
        }

        reply.success(format_nfts_by_chain(&nfts, &address, &chain), json!({ "nfts": data }))
    }
}

pub fn format_nfts_by_chain(nfts: &[NftBalanceDetail], user_address: &str, chain: &str) -> String {
    let chain_upper = chain.to_uppercase();
    let mut out = format!("📊 NFT Collection for {} 📊\n", user_address);
    out += &format!("Found {} NFTs on {}\n\n", nfts.len(), chain_upper);
    out += &format!("🔷 {} ({} NFTs)\n", chain_upper, nfts.len());
    for nft in nfts {
        push_nft_entry(&mut out, nft);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    const ADDR: &str = "0x3764D79db51726E900a1380055F469eB6e2a7fD3";

    #[tokio::test]
    async fn chain_is_required() {
        let mut seen = Vec::new();
        let mut cb = |r: ActionResponse| seen.push(r);
        let handled = UserNftsByChainAction
            .handler(&StaticRuntime::new(), &Memory::from_text(format!("my NFTs {}", ADDR)), None, None, Some(&mut cb))
            .await;
        assert!(!handled);
        assert_eq!(seen[0].text, "Please specify a blockchain to check NFTs on (e.g., eth, matic, bsc).");
        assert_eq!(seen[0].content.error.as_deref(), Some("No chain ID provided"));
    }

    #[test]
    fn single_chain_header() {
        let nfts: Vec<NftBalanceDetail> =
            serde_json::from_value(json!([{"tokenName": "Lens", "tokenId": 7, "contractType": "ERC721"}])).unwrap();
        let text = format_nfts_by_chain(&nfts, ADDR, "matic");
        assert!(text.ends_with("Found 1 NFTs on MATIC\n\n🔷 MATIC (1 NFTs)\n• Lens (#7) [ERC721]\n\n"));
    }

    #[test]
    fn empty_collection() {
        let text = format_nfts_by_chain(&[], ADDR, "eth");
        assert!(text.starts_with(&format!("📊 NFT Collection for {} 📊\nFound 0 NFTs on ETH\n\n🔷 ETH (0 NFTs)\n", ADDR)));
    }
}
