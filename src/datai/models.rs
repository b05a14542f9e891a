// src/datai/models.rs
//
// Read-only DTOs for the Datai API. Upstream omits fields freely and sends
// numbers as strings on some endpoints, so every field is defaulted and
// numeric fields go through the lenient deserializers below.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// --- Lenient scalars ---

/// Accepts a JSON number, a numeric string, or null.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Accepts a string or a number and keeps it as text.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Treats null as an empty list.
pub fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Envelope every client call resolves to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, status_code: u16) -> Self {
        Self { success: true, data: Some(data), error: None, status_code: Some(status_code) }
    }

    pub fn fail(error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self { success: false, data: None, error: Some(error.into()), status_code }
    }

    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Unknown error occurred".to_string())
    }
}

// --- DeFi positions ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeFiTokenDetail {
    #[serde(deserialize_with = "lenient_f64")]
    pub balance: Option<f64>,
    #[serde(rename = "balanceUSD", deserialize_with = "lenient_f64")]
    pub balance_usd: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub balance_decimal: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    pub logo: Option<String>,
    pub token_address: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub token_decimals: Option<f64>,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub usd_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeFiPortfolioDetail {
    #[serde(deserialize_with = "nullable_vec")]
    pub supply: Vec<DeFiTokenDetail>,
    #[serde(deserialize_with = "nullable_vec")]
    pub borrow: Vec<DeFiTokenDetail>,
    #[serde(deserialize_with = "nullable_vec")]
    pub rewards: Vec<DeFiTokenDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeFiStatistic {
    #[serde(rename = "navUSD", deserialize_with = "lenient_f64")]
    pub nav_usd: Option<f64>,
    #[serde(rename = "totalSupplyUSD", deserialize_with = "lenient_f64")]
    pub total_supply_usd: Option<f64>,
    #[serde(rename = "totalDebtUSD", deserialize_with = "lenient_f64")]
    pub total_debt_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeFiTotal {
    #[serde(rename = "supplyUSD", deserialize_with = "lenient_f64")]
    pub supply_usd: Option<f64>,
    #[serde(rename = "debtUSD", deserialize_with = "lenient_f64")]
    pub debt_usd: Option<f64>,
    #[serde(rename = "navUSD", deserialize_with = "lenient_f64")]
    pub nav_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeFiYieldAndPnl {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    #[serde(rename = "pnlUSD", deserialize_with = "lenient_f64")]
    pub pnl_usd: Option<f64>,
    #[serde(rename = "yieldUSD", deserialize_with = "lenient_f64")]
    pub yield_usd: Option<f64>,
    #[serde(rename = "txFeeUSD", deserialize_with = "lenient_f64")]
    pub tx_fee_usd: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub tx_count: Option<f64>,
    #[serde(rename = "deFiEvents", deserialize_with = "nullable_vec")]
    pub defi_events: Vec<Value>,
}

/// One module of a position. The all-chains endpoints send `detail` and
/// `statistic`; the single-chain ones send `detailed` and `total`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeFiPortfolioItem {
    pub name: Option<String>,
    pub module: Option<String>,
    pub detail: Option<DeFiPortfolioDetail>,
    pub detailed: Option<DeFiPortfolioDetail>,
    pub statistic: Option<DeFiStatistic>,
    pub total: Option<DeFiTotal>,
    #[serde(deserialize_with = "nullable_vec")]
    pub yield_and_pnl: Vec<DeFiYieldAndPnl>,
    #[serde(deserialize_with = "nullable_vec")]
    pub pool_data: Vec<Value>,
}

impl DeFiPortfolioItem {
    pub fn tokens(&self) -> Option<&DeFiPortfolioDetail> {
        self.detail.as_ref().or(self.detailed.as_ref())
    }

    pub fn nav_usd(&self) -> f64 {
        self.statistic
            .as_ref()
            .and_then(|s| s.nav_usd)
            .or_else(|| self.total.as_ref().and_then(|t| t.nav_usd))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDeFiPosition {
    pub chain: Option<String>,
    pub logo: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "commonName")]
    pub common_name: Option<String>,
    pub site: Option<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub portfolio: Vec<DeFiPortfolioItem>,
}

// --- Balances ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolBalanceDetail {
    #[serde(rename = "navUSD", deserialize_with = "lenient_f64")]
    pub nav_usd: Option<f64>,
    #[serde(rename = "assetUSD", deserialize_with = "lenient_f64")]
    pub asset_usd: Option<f64>,
    #[serde(rename = "debtUSD", deserialize_with = "lenient_f64")]
    pub debt_usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserDeFiProtocolBalance {
    pub chain: Option<String>,
    pub name: Option<String>,
    pub common_name: Option<String>,
    pub logo: Option<String>,
    pub site: Option<String>,
    pub balance: Option<ProtocolBalanceDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FiatValues {
    #[serde(rename = "USD", deserialize_with = "lenient_f64")]
    pub usd: Option<f64>,
    #[serde(rename = "EUR", deserialize_with = "lenient_f64")]
    pub eur: Option<f64>,
    #[serde(rename = "GBP", deserialize_with = "lenient_f64")]
    pub gbp: Option<f64>,
    #[serde(rename = "AUD", deserialize_with = "lenient_f64")]
    pub aud: Option<f64>,
    #[serde(rename = "CAD", deserialize_with = "lenient_f64")]
    pub cad: Option<f64>,
    #[serde(rename = "AED", deserialize_with = "lenient_f64")]
    pub aed: Option<f64>,
    #[serde(rename = "INR", deserialize_with = "lenient_f64")]
    pub inr: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainBalanceInfo {
    pub id: Option<String>,
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub wrapped_token_id: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub value_usd: Option<f64>,
    pub fiat_values: Option<FiatValues>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserOverallBalanceAllChains {
    #[serde(deserialize_with = "lenient_f64")]
    pub total_value_usd: Option<f64>,
    #[serde(deserialize_with = "nullable_vec")]
    pub by_chain: Vec<ChainBalanceInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserOverallBalanceByChain {
    #[serde(rename = "valueUsd", deserialize_with = "lenient_f64")]
    pub value_usd: Option<f64>,
    #[serde(rename = "valueEUR", deserialize_with = "lenient_f64")]
    pub value_eur: Option<f64>,
    #[serde(rename = "valueGBP", deserialize_with = "lenient_f64")]
    pub value_gbp: Option<f64>,
    #[serde(rename = "valueAUD", deserialize_with = "lenient_f64")]
    pub value_aud: Option<f64>,
    #[serde(rename = "valueCAD", deserialize_with = "lenient_f64")]
    pub value_cad: Option<f64>,
    #[serde(rename = "valueAED", deserialize_with = "lenient_f64")]
    pub value_aed: Option<f64>,
    #[serde(rename = "valueINR", deserialize_with = "lenient_f64")]
    pub value_inr: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenBalanceDetail {
    pub token_address: Option<String>,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub token_decimals: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub balance: Option<f64>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WalletBalancesByChain {
    #[serde(deserialize_with = "lenient_f64")]
    pub native_balance: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub native_balance_decimal: Option<f64>,
    #[serde(deserialize_with = "nullable_vec")]
    pub nfts: Vec<NftBalanceDetail>,
    #[serde(deserialize_with = "nullable_vec")]
    pub token_balances: Vec<TokenBalanceDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NativeTokenBalance {
    #[serde(deserialize_with = "lenient_f64")]
    pub balance: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub balance_decimal: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenBalanceWithPrice {
    #[serde(rename = "token_address")]
    pub token_address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub logo: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub decimals: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub balance: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(rename = "priceChange24h", deserialize_with = "lenient_f64")]
    pub price_change_24h: Option<f64>,
    pub prices: Option<FiatValues>,
    pub is_wallet: Option<bool>,
}

/// Grouped token balances: chain id to that chain's tokens.
pub type TokenBalancesByChain = BTreeMap<String, Vec<TokenBalanceWithPrice>>;

// --- NFTs ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NftBalanceDetail {
    pub token_address: Option<String>,
    pub token_name: Option<String>,
    pub token_symbol: Option<String>,
    pub chain: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub token_id: Option<String>,
    pub contract_type: Option<String>,
    pub owner_of: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub block_number_minted: Option<f64>,
    pub detail_url: Option<String>,
}

// --- Transactions ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TxNftDetails {
    #[serde(deserialize_with = "lenient_f64")]
    pub floor_price: Option<f64>,
    pub action: Option<String>,
    pub content: Option<String>,
    pub detail_url: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub inner_id: Option<String>,
    pub pay_token: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub total_supply: Option<String>,
}

/// A token movement inside a transaction. The transfers endpoint returns
/// the same shape at top level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TxBalanceItem {
    #[serde(deserialize_with = "lenient_f64")]
    pub balance: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub balance_string: Option<String>,
    #[serde(rename = "balanceUSD", deserialize_with = "lenient_f64")]
    pub balance_usd: Option<f64>,
    pub token_address: Option<String>,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub token_decimals: Option<f64>,
    pub token_logo: Option<String>,
    pub standard: Option<String>,
    pub nft_details: Option<TxNftDetails>,
    pub from: Option<String>,
    pub to: Option<String>,
}

pub type TransactionTransferItem = TxBalanceItem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionHistoryItem {
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "nullable_vec")]
    pub balances: Vec<TxBalanceItem>,
    #[serde(deserialize_with = "lenient_f64")]
    pub block: Option<f64>,
    pub chain: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub hash: Option<String>,
    pub protocol: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub time_stamp: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub tx_fee: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub tx_fee_usd: Option<f64>,
    pub tx_type: Option<String>,
    pub tx_classification: Option<String>,
    pub tx_action: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub pnl_usd: Option<f64>,
    #[serde(rename = "yieldUSD", deserialize_with = "lenient_f64")]
    pub yield_usd: Option<f64>,
    pub contract_name: Option<String>,
    pub function_name: Option<String>,
    pub encoding_function: Option<String>,
    pub wallet_address: Option<String>,
    pub standard: Option<String>,
    pub wallet_to_wallet: Option<bool>,
    pub blacklisted: Option<bool>,
    pub successful: Option<bool>,
    pub user_paid_fees: Option<bool>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainOverview {
    pub chain_id: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub creation_timestamp: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub nb_of_transactions: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserTransactionOverview {
    pub wallet: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub nb_of_chains: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub nb_of_transactions: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub creation_timestamp: Option<f64>,
    #[serde(deserialize_with = "nullable_vec")]
    pub overview: Vec<ChainOverview>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_may_arrive_as_strings() {
        let token: DeFiTokenDetail = serde_json::from_value(json!({
            "balance": "12.5",
            "balanceUSD": 3,
            "tokenDecimals": "18",
            "tokenSymbol": "ETH"
        }))
        .unwrap();
        assert_eq!(token.balance, Some(12.5));
        assert_eq!(token.balance_usd, Some(3.0));
        assert_eq!(token.token_decimals, Some(18.0));
        assert_eq!(token.usd_rate, None);
    }

    #[test]
    fn portfolio_items_accept_both_shapes() {
        let all: DeFiPortfolioItem = serde_json::from_value(json!({
            "detail": {"supply": [{"tokenSymbol": "USDC"}], "borrow": null},
            "statistic": {"navUSD": 10}
        }))
        .unwrap();
        assert_eq!(all.nav_usd(), 10.0);
        assert_eq!(all.tokens().map(|d| d.supply.len()), Some(1));
        assert!(all.tokens().map(|d| d.borrow.is_empty()).unwrap_or(false));

        let by_chain: DeFiPortfolioItem = serde_json::from_value(json!({
            "detailed": {"rewards": [{}]},
            "total": {"navUSD": "4.5", "supplyUSD": 5, "debtUSD": 0.5}
        }))
        .unwrap();
        assert_eq!(by_chain.nav_usd(), 4.5);
        assert_eq!(by_chain.tokens().map(|d| d.rewards.len()), Some(1));
    }

    #[test]
    fn transaction_ids_and_flags() {
        let tx: TransactionHistoryItem = serde_json::from_value(json!({
            "id": 42,
            "timeStamp": 1700000000,
            "txFeeUsd": "0.12",
            "balances": null
        }))
        .unwrap();
        assert_eq!(tx.id.as_deref(), Some("42"));
        assert_eq!(tx.tx_fee_usd, Some(0.12));
        assert!(tx.balances.is_empty());
        assert_eq!(tx.successful, None);
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let resp: ApiResponse<Value> = ApiResponse::fail("API error: 500", Some(500));
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v, json!({"success": false, "error": "API error: 500", "statusCode": 500}));
    }
}
