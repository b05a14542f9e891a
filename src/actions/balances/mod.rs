// src/actions/balances/mod.rs
pub mod grouped_tokens;
pub mod native_token;
pub mod overall_all_chains;
pub mod overall_by_chain;
pub mod protocol_balances;
pub mod token_by_chain;
pub mod wallet_by_chain;

pub use grouped_tokens::GroupedTokenBalancesByMultipleChainsAction;
pub use native_token::NativeTokenBalanceByChainAction;
pub use overall_all_chains::UserOverallBalanceAllChainsAction;
pub use overall_by_chain::UserOverallBalanceByChainAction;
pub use protocol_balances::UserDeFiProtocolBalancesByChainAction;
pub use token_by_chain::TokenBalancesByChainAction;
pub use wallet_by_chain::WalletBalancesByChainAction;

/// Share of `total` in percent, zero when there is no total.
pub fn percent_of(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_guards_zero_total() {
        assert_eq!(percent_of(25.0, 200.0), 12.5);
        assert_eq!(percent_of(5.0, 0.0), 0.0);
    }
}
