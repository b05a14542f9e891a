// src/datai/endpoints.rs

pub const API_BASE_URL: &str = "https://api-v1.mymerlin.io";
/// Upstream requests are slow on large wallets.
pub const TIMEOUT_MS: u64 = 140_000;
pub const API_KEY_HEADER: &str = "Authorization";
pub const API_KEY_ENV_VAR: &str = "DATAI_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "DATAI_API_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "DATAI_TIMEOUT_MS";
pub const REQUIRED_ENV_VARS: &[&str] = &[API_KEY_ENV_VAR];

// DeFi positions
pub const ALL_USER_DEFI_POSITIONS: &str = "/api/merlin/public/userDeFiPositions/all/{userAddress}";
pub const USER_DEFI_POSITIONS_BY_CHAIN: &str = "/api/merlin/public/userDeFiPositions/{userAddress}";
pub const USER_DEFI_POSITIONS_BY_MULTIPLE_CHAINS: &str =
    "/api/merlin/public/userDeFiPositionsByChains/{userAddress}";
pub const USER_DEFI_POSITIONS_BY_PROTOCOL: &str =
    "/api/merlin/public/userDeFiPositions/protocol/{userAddress}";

// Balances
pub const USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN: &str = "/api/merlin/public/balances/protocol/{userAddress}";
pub const USER_OVERALL_BALANCE_ALL_CHAINS: &str = "/api/merlin/public/balances/all/{userAddress}";
pub const USER_OVERALL_BALANCE_BY_SINGLE_CHAIN: &str = "/api/merlin/public/balances/chain/{userAddress}";
pub const WALLET_BALANCES_BY_CHAIN: &str = "/api/merlin/public/balances/{userAddress}";
pub const NATIVE_TOKEN_BALANCE_BY_CHAIN: &str = "/api/merlin/public/balances/native/{userAddress}";
pub const TOKEN_BALANCES_BY_CHAIN: &str = "/api/merlin/public/balances/token/{userAddress}";
pub const GROUPED_TOKEN_BALANCES_BY_MULTIPLE_CHAINS: &str =
    "/api/merlin/public/balances/chains/token/{userAddress}";

// NFTs
pub const USER_NFTS_LIST: &str = "/api/merlin/public/balances/nft/all/{userAddress}";
pub const USER_NFTS_BY_CHAIN: &str = "/api/merlin/public/balances/nft/chain/{userAddress}";

// Transactions
pub const USER_TX_HISTORY_ALL_EXTENDED: &str =
    "/api/merlin/public/v2/userTx/history/all/extended/{userAddress}";
pub const TRANSACTION_BY_HASH: &str = "/api/merlin/public/v2/userTx/byHash/{chain}/{hash}/{userAddress}";
pub const TRANSACTION_TRANSFERS_BY_HASH: &str =
    "/api/merlin/public/v2/userTxTransfers/byHash/{chain}/{hash}/{userAddress}";
pub const USER_TRANSACTIONS_BY_CHAIN: &str =
    "/api/merlin/public/v2/userTx/history/chain/extended/{userAddress}";
pub const USER_TX_HISTORY_ALL_CHAINS_SHORT: &str = "/api/merlin/public/v2/userTx/history/all/{userAddress}";
pub const USER_TX_HISTORY_BY_CHAIN_RAW_LABEL: &str =
    "/api/merlin/public/v2/userTx/history/chain/rawlabel/{userAddress}";
pub const SOLANA_USER_TX_HISTORY_EXTENDED: &str =
    "/api/merlin/public/v2/userTx/history/all/extended/{userAddress}";
pub const SOLANA_USER_TX_HISTORY_SHORT: &str = "/api/merlin/public/v2/userTx/history/all/{userAddress}";
pub const USER_TX_BY_PERIOD_AND_CHAIN_EXTENDED: &str =
    "/api/merlin/public/v2/userTx/period/chain/extended/{userAddress}";
pub const USER_TX_BY_PERIOD_AND_CHAIN_RAW_LABEL_20: &str =
    "/api/merlin/public/v2/userTx/period/chain/rawlabel/20/{userAddress}";
pub const TRANSACTIONS_FOR_DEFI_POSITION: &str = "/api/merlin/public/userTx/position/";
pub const USER_TRANSACTION_OVERVIEW: &str = "/api/merlin/public/v2/userTx/overview/{userAddress}";

/// Substitutes each `{placeholder}` in `template` once.
pub fn render(template: &str, params: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in params {
        let placeholder = format!("{{{}}}", key);
        out = out.replacen(&placeholder, value, 1);
    }
    out
}

/// Renders a template that only takes `{userAddress}`.
pub fn for_user(template: &str, user_address: &str) -> String {
    render(template, &[("userAddress", user_address)])
}

/// Appends `key=value` pairs as a query string. Values are sent as given:
/// chain ids, limits and timestamps never need escaping.
pub fn with_query(endpoint: String, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return endpoint;
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}{}", endpoint, sep, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TEMPLATES: &[&str] = &[
        ALL_USER_DEFI_POSITIONS,
        USER_DEFI_POSITIONS_BY_CHAIN,
        USER_DEFI_POSITIONS_BY_MULTIPLE_CHAINS,
        USER_DEFI_POSITIONS_BY_PROTOCOL,
        USER_DEFI_PROTOCOL_BALANCES_BY_CHAIN,
        USER_OVERALL_BALANCE_ALL_CHAINS,
        USER_OVERALL_BALANCE_BY_SINGLE_CHAIN,
        WALLET_BALANCES_BY_CHAIN,
        NATIVE_TOKEN_BALANCE_BY_CHAIN,
        TOKEN_BALANCES_BY_CHAIN,
        GROUPED_TOKEN_BALANCES_BY_MULTIPLE_CHAINS,
        USER_NFTS_LIST,
        USER_NFTS_BY_CHAIN,
        USER_TX_HISTORY_ALL_EXTENDED,
        TRANSACTION_BY_HASH,
        TRANSACTION_TRANSFERS_BY_HASH,
        USER_TRANSACTIONS_BY_CHAIN,
        USER_TX_HISTORY_ALL_CHAINS_SHORT,
        USER_TX_HISTORY_BY_CHAIN_RAW_LABEL,
        SOLANA_USER_TX_HISTORY_EXTENDED,
        SOLANA_USER_TX_HISTORY_SHORT,
        USER_TX_BY_PERIOD_AND_CHAIN_EXTENDED,
        USER_TX_BY_PERIOD_AND_CHAIN_RAW_LABEL_20,
        TRANSACTIONS_FOR_DEFI_POSITION,
        USER_TRANSACTION_OVERVIEW,
    ];

    #[test]
    fn every_placeholder_is_substituted() {
        let params = [
            ("userAddress", "0xabc"),
            ("chain", "eth"),
            ("hash", "0xdead"),
        ];
        for template in ALL_TEMPLATES {
            let rendered = render(template, &params);
            assert!(!rendered.contains('{'), "left a placeholder in {}", rendered);
            assert!(rendered.starts_with("/api/merlin/public/"));
        }
    }

    #[test]
    fn placeholders_are_replaced_exactly_once() {
        let rendered = render(TRANSACTION_BY_HASH, &[("chain", "eth"), ("hash", "0x1"), ("userAddress", "0x2")]);
        assert_eq!(rendered, "/api/merlin/public/v2/userTx/byHash/eth/0x1/0x2");

        let rendered = render("/a/{userAddress}/{userAddress}", &[("userAddress", "0x2")]);
        assert_eq!(rendered, "/a/0x2/{userAddress}");
    }

    #[test]
    fn query_strings_are_appended() {
        let ep = for_user(WALLET_BALANCES_BY_CHAIN, "0xabc");
        assert_eq!(
            with_query(ep.clone(), &[("chain", "eth".into())]),
            "/api/merlin/public/balances/0xabc?chain=eth"
        );
        assert_eq!(
            with_query(format!("{}?chain=solana", ep), &[("limit", "5".into())]),
            "/api/merlin/public/balances/0xabc?chain=solana&limit=5"
        );
        assert_eq!(with_query(ep.clone(), &[]), ep);
    }
}
