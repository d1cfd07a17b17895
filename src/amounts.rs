//! # Amount String Parsing
//!
//! Amounts travel through the system as free-form strings ("2", "1.5 cups",
//! "to taste"). This module extracts a leading numeric magnitude when one
//! exists and classifies everything else as qualitative.
//!
//! The extractor takes the **first contiguous decimal token** only: "1/2"
//! yields 1, not 0.5. Callers rely on that literal behavior; fraction
//! interpretation is out of scope for this parser.

use lazy_static::lazy_static;
use regex::Regex;

/// Reserved amount string marking an incoming inventory item as a deletion
/// request. Never a real quantity.
pub const REMOVAL_SENTINEL: &str = "-1";

lazy_static! {
    /// First decimal-number token: digits with an optional single decimal part.
    static ref LEADING_NUMBER: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
    /// Signed leading integer, anchored at the start of the trimmed string.
    static ref LEADING_INT: Regex = Regex::new(r"^[+-]?\d+").unwrap();
}

/// Extract the first numeric magnitude from an amount string.
///
/// Returns `None` for empty or purely qualitative strings ("to taste",
/// "a pinch"); callers choose their own default in that case.
pub fn parse_leading_number(amount: &str) -> Option<f64> {
    let captures = LEADING_NUMBER.captures(amount)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Extract a signed leading integer, ignoring any trailing text.
///
/// Mirrors the lenient integer parse used to screen malformed deltas:
/// "-2 cups" yields -2, "to taste" yields `None`.
pub fn parse_leading_int(amount: &str) -> Option<i64> {
    let matched = LEADING_INT.find(amount.trim())?;
    matched.as_str().parse().ok()
}

/// Parse an optional amount, treating an absent string as the given default.
pub fn parse_or_default(amount: Option<&str>, default: f64) -> f64 {
    amount
        .and_then(parse_leading_number)
        .unwrap_or(default)
}

/// Render a numeric amount back to its string form.
///
/// Integral values render without a decimal point so that "6" minus "2"
/// persists as "4", not "4.0".
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
