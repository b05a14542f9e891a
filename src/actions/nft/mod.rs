// src/actions/nft/mod.rs

mod by_chain;
mod list;

pub use by_chain::{format_nfts_by_chain, UserNftsByChainAction};
pub use list::{format_nfts_list, UserNftsListAction};

use crate::datai::models::NftBalanceDetail;

/// One collection entry: name, id, standard, contract and detail link.
fn push_nft_entry(out: &mut String, nft: &NftBalanceDetail) {
    out.push_str(&format!(
        "• {} (#{})",
        nft.token_name.as_deref().filter(|n| !n.is_empty()).unwrap_or("Unnamed NFT"),
        nft.token_id.as_deref().unwrap_or("undefined")
    ));
    if let Some(kind) = nft.contract_type.as_deref().filter(|k| !k.is_empty()) {
        out.push_str(&format!(" [{}]", kind));
    }
    out.push('\n');
    if let Some(contract) = nft.token_address.as_deref().filter(|a| !a.is_empty()) {
        out.push_str(&format!("  Contract: {}\n", contract));
    }
    if let Some(url) = nft.detail_url.as_deref().filter(|u| !u.is_empty()) {
        out.push_str(&format!("  View: {}\n", url));
    }
    out.push('\n');
}
