// src/actions/defi_positions/mod.rs
pub mod all;
pub mod by_chain;
pub mod by_multiple_chains;
pub mod by_protocol;

pub use all::AllUserDeFiPositionsAction;
pub use by_chain::UserDeFiPositionsByChainAction;
pub use by_multiple_chains::UserDeFiPositionsByMultipleChainsAction;
pub use by_protocol::UserDeFiPositionsByProtocolAction;

use crate::datai::models::{DeFiTotal, UserDeFiPosition};

/// Supply, debt and net value summed over every module's `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub supply: f64,
    pub debt: f64,
    pub nav: f64,
}

impl Totals {
    pub fn add(&mut self, total: &DeFiTotal) {
        self.supply += total.supply_usd.unwrap_or(0.0);
        self.debt += total.debt_usd.unwrap_or(0.0);
        self.nav += total.nav_usd.unwrap_or(0.0);
    }

    pub fn of(positions: &[UserDeFiPosition]) -> Self {
        let mut totals = Totals::default();
        for item in positions.iter().flat_map(|p| p.portfolio.iter()) {
            if let Some(total) = &item.total {
                totals.add(total);
            }
        }
        totals
    }
}

/// Groups positions by chain, keeping first-seen chain order.
pub fn group_by_chain(positions: &[UserDeFiPosition]) -> Vec<(String, Vec<&UserDeFiPosition>)> {
    let mut groups: Vec<(String, Vec<&UserDeFiPosition>)> = Vec::new();
    for position in positions {
        let chain = position
            .chain
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        match groups.iter_mut().find(|(c, _)| *c == chain) {
            Some((_, list)) => list.push(position),
            None => groups.push((chain, vec![position])),
        }
    }
    groups
}
