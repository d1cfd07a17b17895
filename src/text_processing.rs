//! # Note Text Processing
//!
//! Turns free-form sticky-note text into inventory deltas, so a note like
//!
//! ```text
//! 2 eggs
//! 500 g flour
//! milk
//! ```
//!
//! can be imported straight into the kitchen inventory. Each recognized line
//! becomes one add/update delta for the reconciler; lines that read like
//! prose are skipped rather than guessed at.

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

use crate::categories::classify;
use crate::models::InventoryItem;

lazy_static! {
    /// "500 g flour", "2 cups sugar" — quantity, unit, then the name.
    static ref QTY_UNIT_NAME: Regex = Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)\s*(cups?|c|tablespoons?|tbsp|teaspoons?|tsp|fl\s?oz|fluid ounces?|pints?|pt|quarts?|qt|gallons?|gal|milliliters?|ml|liters?|litres?|l|grams?|g|kilograms?|kg|ounces?|oz|pounds?|lbs?|lb|dozen|doz|pinch(?:es)?|dash(?:es)?|cloves?|packages?|pkg|cans?|bottles?|loaf|loaves)\s+(.+)$"
    )
    .unwrap();
    /// "2 eggs", "3 tomatoes" — count with no unit.
    static ref QTY_NAME: Regex = Regex::new(r"^(\d+(?:\.\d+)?)\s+(.+)$").unwrap();
    /// A short bare name such as "milk" or "olive oil".
    static ref BARE_NAME: Regex = Regex::new(r"^[A-Za-zÀ-ÿ][A-Za-zÀ-ÿ' -]*$").unwrap();
}

/// Options for note scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether a line holding just a name ("milk") becomes a delta with a
    /// default amount of 1.
    pub include_bare_names: bool,
    /// Bare-name lines with more words than this are treated as prose.
    pub max_bare_name_words: usize,
    /// Lines longer than this are never treated as item lines.
    pub max_line_length: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_bare_names: true,
            max_bare_name_words: 3,
            max_line_length: 60,
        }
    }
}

/// Scan note text into inventory deltas with the default configuration.
pub fn scan_inventory_deltas(text: &str, user_id: &str) -> Vec<InventoryItem> {
    NoteScanner::default().scan(text, user_id)
}

/// Line-by-line scanner from note text to inventory deltas.
#[derive(Debug, Default)]
pub struct NoteScanner {
    config: ScanConfig,
}

impl NoteScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan every line of `text`; unrecognized lines are skipped.
    pub fn scan(&self, text: &str, user_id: &str) -> Vec<InventoryItem> {
        let mut deltas = Vec::new();

        for line in text.lines() {
            let line = line.trim().trim_start_matches(['-', '•', '*']).trim();
            if line.is_empty() || line.ends_with(':') || line.len() > self.config.max_line_length {
                continue;
            }

            match self.scan_line(line, user_id) {
                Some(delta) => {
                    trace!("note line {:?} -> delta {:?}", line, delta.ingredient_name);
                    deltas.push(delta);
                }
                None => trace!("note line {:?} skipped", line),
            }
        }

        debug!("scanned {} inventory deltas from note text", deltas.len());
        deltas
    }

    fn scan_line(&self, line: &str, user_id: &str) -> Option<InventoryItem> {
        if let Some(captures) = QTY_UNIT_NAME.captures(line) {
            let name = captures[3].trim();
            let mut delta = InventoryItem::new(user_id, name)
                .with_amount(captures[1].trim())
                .with_unit(&captures[2].trim().to_lowercase());
            delta.category = Some(classify(name).to_string());
            return Some(delta);
        }

        if let Some(captures) = QTY_NAME.captures(line) {
            let name = captures[2].trim();
            if BARE_NAME.is_match(name) {
                let mut delta = InventoryItem::new(user_id, name).with_amount(captures[1].trim());
                delta.category = Some(classify(name).to_string());
                return Some(delta);
            }
            return None;
        }

        if self.config.include_bare_names
            && BARE_NAME.is_match(line)
            && line.split_whitespace().count() <= self.config.max_bare_name_words
        {
            let mut delta = InventoryItem::new(user_id, line).with_amount("1");
            delta.category = Some(classify(line).to_string());
            return Some(delta);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_unit_name_lines() {
        let deltas = scan_inventory_deltas("500 g flour\n2 cups sugar", "u1");
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].ingredient_name, "flour");
        assert_eq!(deltas[0].amount.as_deref(), Some("500"));
        assert_eq!(deltas[0].unit.as_deref(), Some("g"));
        assert_eq!(deltas[1].unit.as_deref(), Some("cups"));
    }

    #[test]
    fn test_count_only_lines() {
        let deltas = scan_inventory_deltas("2 eggs\n6 tomatoes", "u1");
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].ingredient_name, "eggs");
        assert_eq!(deltas[0].amount.as_deref(), Some("2"));
        assert!(deltas[0].unit.is_none());
        assert_eq!(deltas[1].category.as_deref(), Some("Produce"));
    }

    #[test]
    fn test_bare_names_default_to_one() {
        let deltas = scan_inventory_deltas("milk\nolive oil", "u1");
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].amount.as_deref(), Some("1"));
        assert_eq!(deltas[0].category.as_deref(), Some("Dairy"));
    }

    #[test]
    fn test_bare_names_can_be_disabled() {
        let scanner = NoteScanner::new(ScanConfig {
            include_bare_names: false,
            ..ScanConfig::default()
        });
        assert!(scanner.scan("milk", "u1").is_empty());
    }

    #[test]
    fn test_prose_and_headers_are_skipped() {
        let text = "Groceries:\nremember to call mom about the weekend dinner plans\n2 eggs";
        let deltas = scan_inventory_deltas(text, "u1");
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].ingredient_name, "eggs");
    }

    #[test]
    fn test_bulleted_lines_are_unwrapped() {
        let deltas = scan_inventory_deltas("- 2 eggs\n• milk", "u1");
        assert_eq!(deltas.len(), 2);
    }

    #[test]
    fn test_deltas_are_tagged_with_user() {
        let deltas = scan_inventory_deltas("2 eggs", "u7");
        assert_eq!(deltas[0].ingredient_name, "eggs");
        assert_eq!(deltas[0].user_id, "u7");
    }
}
