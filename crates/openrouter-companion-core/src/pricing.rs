//! Price parsing and display.
//!
//! OpenRouter quotes prices as decimal strings in dollars per token (or per
//! image). Anything that does not parse to a number is treated as "no
//! pricing", which is a common and valid state for a catalog entry.

/// Tokens per pricing unit used throughout the crate.
pub const TOKENS_PER_UNIT: f64 = 1_000_000.0;

/// Parse a raw decimal price. Returns `None` for empty, non-numeric or NaN input.
pub fn parse_price(raw: &str) -> Option<f64> {
    let v: f64 = raw.trim().parse().ok()?;
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

/// Dollars per million tokens for a raw per-token price, `f64::INFINITY` when unparsable.
pub fn per_million(raw: Option<&str>) -> f64 {
    raw.and_then(parse_price)
        .map(|p| p * TOKENS_PER_UNIT)
        .unwrap_or(f64::INFINITY)
}

/// Human-readable price line for a per-million price.
pub fn fmt_per_million(price: f64) -> String {
    if price.is_infinite() {
        "no pricing available".to_string()
    } else if price == 0.0 {
        "FREE".to_string()
    } else {
        format!("${:.2} per 1M prompt tokens", price)
    }
}
