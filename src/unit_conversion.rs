//! # Cooking Unit Conversion
//!
//! Table-driven conversion between common cooking volume and weight units.
//!
//! The table holds direct `from -> to` factors only and is never chained:
//! cup -> kilogram is unsupported even though cup -> milliliter exists,
//! because volume-to-weight needs a density that is not modeled here. That
//! limitation is part of the contract.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Failure reported when no direct conversion factor exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub from: String,
    pub to: String,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Conversion from {} to {} is not supported.",
            self.from, self.to
        )
    }
}

impl std::error::Error for ConversionError {}

/// Direct conversion factors, keyed by lowercased `(from, to)` unit names.
static CONVERSION_FACTORS: LazyLock<HashMap<(&'static str, &'static str), f64>> =
    LazyLock::new(|| {
        let entries: &[(&str, &str, f64)] = &[
            // Volume
            ("cup", "tablespoon", 16.0),
            ("cup", "teaspoon", 48.0),
            ("cup", "fluid ounce", 8.0),
            ("cup", "milliliter", 236.588),
            ("cup", "liter", 0.236588),
            ("tablespoon", "cup", 0.0625),
            ("tablespoon", "teaspoon", 3.0),
            ("tablespoon", "fluid ounce", 0.5),
            ("tablespoon", "milliliter", 14.7868),
            ("tablespoon", "liter", 0.0147868),
            ("teaspoon", "cup", 0.0208333),
            ("teaspoon", "tablespoon", 0.333333),
            ("teaspoon", "fluid ounce", 0.166667),
            ("teaspoon", "milliliter", 4.92892),
            ("teaspoon", "liter", 0.00492892),
            ("fluid ounce", "cup", 0.125),
            ("fluid ounce", "tablespoon", 2.0),
            ("fluid ounce", "teaspoon", 6.0),
            ("fluid ounce", "milliliter", 29.5735),
            ("fluid ounce", "liter", 0.0295735),
            ("milliliter", "cup", 0.00422675),
            ("milliliter", "tablespoon", 0.067628),
            ("milliliter", "teaspoon", 0.202884),
            ("milliliter", "fluid ounce", 0.033814),
            ("milliliter", "liter", 0.001),
            ("liter", "cup", 4.22675),
            ("liter", "tablespoon", 67.628),
            ("liter", "teaspoon", 202.884),
            ("liter", "fluid ounce", 33.814),
            ("liter", "milliliter", 1000.0),
            // Weight
            ("pound", "ounce", 16.0),
            ("pound", "gram", 453.592),
            ("pound", "kilogram", 0.453592),
            ("ounce", "pound", 0.0625),
            ("ounce", "gram", 28.3495),
            ("ounce", "kilogram", 0.0283495),
            ("gram", "pound", 0.00220462),
            ("gram", "ounce", 0.035274),
            ("gram", "kilogram", 0.001),
            ("kilogram", "pound", 2.20462),
            ("kilogram", "ounce", 35.274),
            ("kilogram", "gram", 1000.0),
        ];
        entries.iter().map(|&(from, to, f)| ((from, to), f)).collect()
    });

/// Convert a value between two cooking units.
///
/// Unit names are case-folded before lookup. Returns a structured failure,
/// not a panic, when the pair has no direct factor.
pub fn convert(value: f64, from_unit: &str, to_unit: &str) -> Result<f64, ConversionError> {
    let from = from_unit.trim().to_lowercase();
    let to = to_unit.trim().to_lowercase();

    match CONVERSION_FACTORS.get(&(from.as_str(), to.as_str())) {
        Some(factor) => Ok(value * factor),
        None => Err(ConversionError {
            from: from_unit.to_string(),
            to: to_unit.to_string(),
        }),
    }
}

/// Whether a direct factor exists for the pair.
pub fn is_supported(from_unit: &str, to_unit: &str) -> bool {
    let from = from_unit.trim().to_lowercase();
    let to = to_unit.trim().to_lowercase();
    CONVERSION_FACTORS.contains_key(&(from.as_str(), to.as_str()))
}
