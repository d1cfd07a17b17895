//! # Recipe-Inventory Bridge
//!
//! Answers "can I cook this?" against a user's inventory and performs the
//! quantity subtraction after a recipe is cooked. Both operations are pure
//! computations over item slices; the service layer applies their results to
//! the persisted store by direct identifier, never through the reconciler's
//! delta path.

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::amounts::{format_amount, parse_leading_number, parse_or_default};
use crate::models::{InventoryItem, Recipe};

lazy_static! {
    /// Placeholder names like "Ingredient 2" that AI providers emit when a
    /// recipe section was incomplete; they never name real food.
    static ref GENERIC_INGREDIENT: Regex = Regex::new(r"(?i)^ingredient\s+\d+$").unwrap();
}

/// One recipe requirement, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientNeed {
    pub name: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Result of an availability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientCheck {
    pub has_all: bool,
    pub missing: Vec<IngredientNeed>,
    pub available: Vec<IngredientNeed>,
}

/// Compare a recipe's requirements against inventory.
///
/// An ingredient is missing when no item matches its name, or when the
/// matched item's amount is below the required amount. Inventory amounts
/// with no legible number compare as 0: presence without a quantity counts
/// as insufficient. Required amounts with no legible number default to 1.
pub fn check_ingredients(recipe: &Recipe, inventory: &[InventoryItem]) -> IngredientCheck {
    let mut missing = Vec::new();
    let mut available = Vec::new();

    for ingredient in &recipe.ingredients {
        if GENERIC_INGREDIENT.is_match(&ingredient.name) {
            warn!("skipping generic ingredient name: {}", ingredient.name);
            continue;
        }

        let need = IngredientNeed {
            name: ingredient.name.clone(),
            amount: ingredient.amount.clone(),
            unit: ingredient.unit.clone(),
        };

        match inventory.iter().find(|item| item.matches_name(&ingredient.name)) {
            None => missing.push(need),
            Some(item) => {
                let on_hand = parse_or_default(item.amount.as_deref(), 0.0);
                let required = parse_leading_number(&ingredient.amount).unwrap_or(1.0);
                if on_hand < required {
                    missing.push(need);
                } else {
                    available.push(need);
                }
            }
        }
    }

    IngredientCheck {
        has_all: missing.is_empty(),
        missing,
        available,
    }
}

/// Outcome of subtracting a cooked recipe from inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtraction {
    /// The full inventory after subtraction.
    pub inventory: Vec<InventoryItem>,
    /// Items whose quantity reached zero or below and must be deleted.
    pub removed: Vec<InventoryItem>,
    /// Items whose decremented amount must be persisted.
    pub updated: Vec<InventoryItem>,
}

/// Subtract a recipe's required amounts from the matching inventory items.
///
/// Items driven to zero or below are removed outright, not left at "0".
/// Ingredients with no inventory match are skipped without error, and an
/// inventory amount that carries no legible number is left untouched —
/// there is no quantity to decrement.
pub fn subtract_ingredients(recipe: &Recipe, inventory: Vec<InventoryItem>) -> Subtraction {
    let mut inventory = inventory;
    let mut removed = Vec::new();
    let mut updated = Vec::new();

    for ingredient in &recipe.ingredients {
        let Some(pos) = inventory.iter().position(|item| item.matches_name(&ingredient.name))
        else {
            continue;
        };

        let on_hand = match inventory[pos].amount.as_deref() {
            None => 0.0,
            Some(text) => match parse_leading_number(text) {
                Some(value) => value,
                None => continue,
            },
        };
        let required = parse_leading_number(&ingredient.amount).unwrap_or(1.0);
        let remaining = on_hand - required;

        if remaining <= 0.0 {
            removed.push(inventory.remove(pos));
        } else {
            inventory[pos].amount = Some(format_amount(remaining));
            updated.push(inventory[pos].clone());
        }
    }

    Subtraction {
        inventory,
        removed,
        updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn recipe_with(ingredients: Vec<Ingredient>) -> Recipe {
        let mut recipe = Recipe::new("u1", "Test Dish");
        recipe.ingredients = ingredients;
        recipe
    }

    fn stocked(name: &str, amount: &str) -> InventoryItem {
        let mut item = InventoryItem::new("u1", name).with_amount(amount);
        item.id = Some(1);
        item
    }

    #[test]
    fn test_absent_ingredient_is_missing() {
        let recipe = recipe_with(vec![Ingredient::new("Eggs", "2")]);
        let check = check_ingredients(&recipe, &[]);
        assert!(!check.has_all);
        assert_eq!(check.missing.len(), 1);
        assert_eq!(check.missing[0].name, "Eggs");
    }

    #[test]
    fn test_sufficient_amount_is_available() {
        let recipe = recipe_with(vec![Ingredient::new("eggs", "2")]);
        let inventory = [stocked("Eggs", "12")];
        let check = check_ingredients(&recipe, &inventory);
        assert!(check.has_all);
        assert_eq!(check.available.len(), 1);
    }

    #[test]
    fn test_insufficient_amount_is_missing() {
        let recipe = recipe_with(vec![Ingredient::new("Eggs", "6")]);
        let inventory = [stocked("Eggs", "2")];
        let check = check_ingredients(&recipe, &inventory);
        assert!(!check.has_all);
    }

    #[test]
    fn test_qualitative_inventory_amount_is_conservatively_missing() {
        // "to taste" has no legible quantity, so it can never satisfy a
        // requirement, not even a required amount of 1.
        let recipe = recipe_with(vec![Ingredient::new("Salt", "1")]);
        let inventory = [stocked("Salt", "to taste")];
        let check = check_ingredients(&recipe, &inventory);
        assert_eq!(check.missing.len(), 1);
    }

    #[test]
    fn test_unparseable_required_amount_defaults_to_one() {
        let recipe = recipe_with(vec![Ingredient::new("Butter", "a knob")]);
        let inventory = [stocked("Butter", "1")];
        let check = check_ingredients(&recipe, &inventory);
        assert!(check.has_all);
    }

    #[test]
    fn test_generic_placeholder_names_are_skipped() {
        let recipe = recipe_with(vec![
            Ingredient::new("Ingredient 1", "1"),
            Ingredient::new("Eggs", "2"),
        ]);
        let check = check_ingredients(&recipe, &[]);
        assert_eq!(check.missing.len(), 1);
        assert_eq!(check.missing[0].name, "Eggs");
    }

    #[test]
    fn test_subtraction_floor_removes_item() {
        let recipe = recipe_with(vec![Ingredient::new("Eggs", "6")]);
        let result = subtract_ingredients(&recipe, vec![stocked("Eggs", "6")]);
        assert!(result.inventory.is_empty());
        assert_eq!(result.removed.len(), 1);
        assert!(result.updated.is_empty());
    }

    #[test]
    fn test_subtraction_persists_decremented_amount_as_string() {
        let recipe = recipe_with(vec![Ingredient::new("Flour", "1.5")]);
        let result = subtract_ingredients(&recipe, vec![stocked("Flour", "4")]);
        assert_eq!(result.inventory[0].amount.as_deref(), Some("2.5"));
        assert_eq!(result.updated.len(), 1);
    }

    #[test]
    fn test_subtraction_skips_unmatched_ingredients() {
        let recipe = recipe_with(vec![Ingredient::new("Saffron", "1")]);
        let inventory = vec![stocked("Eggs", "12")];
        let result = subtract_ingredients(&recipe, inventory.clone());
        assert_eq!(result.inventory, inventory);
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_subtraction_leaves_qualitative_amounts_untouched() {
        let recipe = recipe_with(vec![Ingredient::new("Salt", "1")]);
        let inventory = vec![stocked("Salt", "to taste")];
        let result = subtract_ingredients(&recipe, inventory.clone());
        assert_eq!(result.inventory, inventory);
    }

    #[test]
    fn test_subtraction_with_absent_amount_removes_item() {
        let recipe = recipe_with(vec![Ingredient::new("Eggs", "2")]);
        let mut item = InventoryItem::new("u1", "Eggs");
        item.id = Some(1);
        let result = subtract_ingredients(&recipe, vec![item]);
        assert!(result.inventory.is_empty());
        assert_eq!(result.removed.len(), 1);
    }
}
