// src/format.rs
//
// Presentation helpers shared by the report formatters. Dates are rendered
// in UTC with US month/day ordering.

use chrono::{DateTime, TimeZone, Utc};

/// Fixed-point rendering, `1.5` with 2 digits is `1.50`.
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let out = format!("{:.*}", digits, value);
    // never render "-0.00"
    if out.starts_with('-') && out[1..].chars().all(|c| c == '0' || c == '.') {
        out[1..].to_string()
    } else {
        out
    }
}

/// Scientific notation with a signed exponent: `1.2346e-7`.
pub fn to_exponential(value: f64, digits: usize) -> String {
    let raw = format!("{:.*e}", digits, value);
    match raw.split_once('e') {
        Some((mantissa, exp)) if exp.starts_with('-') => format!("{}e{}", mantissa, exp),
        Some((mantissa, exp)) => format!("{}e+{}", mantissa, exp),
        None => raw,
    }
}

fn group_thousands(int_part: &str) -> String {
    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

/// Thousands-separated number with between `min_frac` and `max_frac`
/// fraction digits, trailing zeros trimmed down to `min_frac`.
pub fn locale_number(value: f64, min_frac: usize, max_frac: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let max_frac = max_frac.max(min_frac);
    let fixed = to_fixed(value.abs(), max_frac);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed.clone(), String::new()),
    };
    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min_frac {
        frac.push('0');
    }
    let negative = value < 0.0 && (int_part.chars().any(|c| c != '0') || !frac.chars().all(|c| c == '0'));
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(&int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

/// Default locale rendering: up to three fraction digits.
pub fn locale(value: f64) -> String {
    locale_number(value, 0, 3)
}

/// `value / 10^decimals`; decimals of zero or less leave the value as is.
pub fn scale_by_decimals(value: f64, decimals: Option<f64>) -> f64 {
    match decimals {
        Some(d) if d > 0.0 => value / 10f64.powf(d),
        _ => value,
    }
}

pub fn datetime(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return None;
    }
    Utc.timestamp_opt(timestamp as i64, 0).single()
}

/// `3/14/2024, 9:05:00 PM`
pub fn date_time_string(timestamp: f64) -> String {
    datetime(timestamp)
        .map(|dt| dt.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// `3/14/2024`
pub fn date_string(timestamp: f64) -> String {
    datetime(timestamp)
        .map(|dt| dt.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// `9:05:00 PM`
pub fn time_string(timestamp: f64) -> String {
    datetime(timestamp)
        .map(|dt| dt.format("%-I:%M:%S %p").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// `2024-03-14T21:05:00.000Z`
pub fn iso_string(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// Display names for chain ids.
pub fn chain_display_name(chain: &str) -> String {
    let name = match chain.to_lowercase().as_str() {
        "eth" => "Ethereum",
        "arb" => "Arbitrum",
        "avax" => "Avalanche",
        "matic" => "Polygon",
        "op" => "Optimism",
        "base" => "Base",
        "bsc" => "BNB Chain",
        "blast" => "Blast",
        "linea" => "Linea",
        "scrl" => "Scroll",
        "era" => "zkSync Era",
        "bera" => "Berachain",
        "mnt" => "Mantle",
        "ftm" => "Fantom",
        "celo" => "Celo",
        "klay" => "Kaia",
        "xdai" => "xDai",
        "zora" => "Zora",
        "abs" => "Abstract",
        "sol" | "solana" => "Solana",
        _ => return chain.to_uppercase(),
    };
    name.to_string()
}

/// Native gas token symbol for a chain id.
pub fn native_token_symbol(chain: &str) -> String {
    let symbol = match chain.to_lowercase().as_str() {
        "eth" | "arb" | "op" | "base" => "ETH",
        "bsc" => "BNB",
        "matic" => "MATIC",
        "avax" => "AVAX",
        "ftm" => "FTM",
        "sol" | "solana" => "SOL",
        _ => return chain.to_uppercase(),
    };
    symbol.to_string()
}

/// Shortens `0x1234567890...` to `0x1234...7890`.
pub fn short_address(address: &str) -> String {
    crate::extract::truncate_address(address, 6, 4)
}

/// `"Your address"`-style labelling when `address` is the user's own.
pub fn label_address(address: &str, user_address: &str, own_label: &str) -> String {
    if address.eq_ignore_ascii_case(user_address) {
        own_label.to_string()
    } else {
        address.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point() {
        assert_eq!(to_fixed(1.5, 2), "1.50");
        assert_eq!(to_fixed(0.0, 4), "0.0000");
        assert_eq!(to_fixed(-0.0001, 2), "0.00");
        assert_eq!(to_fixed(-12.345, 1), "-12.3");
    }

    #[test]
    fn exponential() {
        assert_eq!(to_exponential(0.000000123456, 4), "1.2346e-7");
        assert_eq!(to_exponential(123456.0, 2), "1.23e+5");
    }

    #[test]
    fn locale_grouping() {
        assert_eq!(locale_number(1234567.891, 2, 2), "1,234,567.89");
        assert_eq!(locale_number(1000.0, 2, 6), "1,000.00");
        assert_eq!(locale_number(0.123456789, 0, 6), "0.123457");
        assert_eq!(locale_number(12.0, 0, 6), "12");
        assert_eq!(locale_number(-4321.5, 0, 2), "-4,321.5");
        assert_eq!(locale(999.9999), "1,000");
    }

    #[test]
    fn decimals_scaling() {
        assert_eq!(scale_by_decimals(1_500_000.0, Some(6.0)), 1.5);
        assert_eq!(scale_by_decimals(42.0, None), 42.0);
        assert_eq!(scale_by_decimals(42.0, Some(0.0)), 42.0);
    }

    #[test]
    fn dates_render_in_utc() {
        // 2024-03-14T21:05:00Z
        let ts = 1_710_450_300.0;
        assert_eq!(date_string(ts), "3/14/2024");
        assert_eq!(time_string(ts), "9:05:00 PM");
        assert_eq!(date_time_string(ts), "3/14/2024, 9:05:00 PM");
        assert_eq!(iso_string(1_710_450_300), "2024-03-14T21:05:00.000Z");
        assert_eq!(date_string(f64::NAN), "Invalid Date");
    }

    #[test]
    fn chain_tables() {
        assert_eq!(chain_display_name("bsc"), "BNB Chain");
        assert_eq!(chain_display_name("era"), "zkSync Era");
        assert_eq!(chain_display_name("mode"), "MODE");
        assert_eq!(native_token_symbol("matic"), "MATIC");
        assert_eq!(native_token_symbol("arb"), "ETH");
        assert_eq!(native_token_symbol("xdai"), "XDAI");
    }

    #[test]
    fn address_helpers() {
        let addr = "0x218e312fF5181290A46e3f87A73A8aD40C05A944";
        assert_eq!(short_address(addr), "0x218e...A944");
        assert_eq!(label_address(&addr.to_lowercase(), addr, "You"), "You");
        assert_eq!(label_address("0xother", addr, "You"), "0xother");
    }
}
