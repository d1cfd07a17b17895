//! # Grocery List Assembly
//!
//! Builds shopping lists out of missing-ingredient reports and selected
//! recipes, and plans the inventory side effect of checking an item off.
//!
//! Aggregation groups by `(lowercased name, unit)`. When two contributions
//! share a key their amounts are summed numerically; when either amount has
//! no legible number the strings are comma-joined instead, so no information
//! is discarded.

use chrono::Utc;
use log::debug;

use crate::amounts::{format_amount, parse_leading_number, parse_or_default};
use crate::categories::classify;
use crate::messages::t_args;
use crate::models::{GroceryItem, GroceryList, InventoryItem, Recipe};
use crate::recipe_inventory::IngredientNeed;

/// Build a one-off shopping list covering a recipe's missing ingredients.
///
/// Items are auto-categorized and start unchecked. Identifiers are assigned
/// when the list is persisted.
pub fn build_from_missing(
    recipe_name: &str,
    missing: &[IngredientNeed],
    user_id: &str,
) -> GroceryList {
    let items = missing
        .iter()
        .map(|need| {
            let mut item = GroceryItem::new(&need.name);
            item.user_id = Some(user_id.to_string());
            item.amount = Some(need.amount.clone());
            item.unit = need.unit.clone();
            item.category = Some(classify(&need.name).to_string());
            item
        })
        .collect();

    GroceryList {
        id: 0,
        user_id: user_id.to_string(),
        name: t_args("grocery-list-for-recipe", &[("recipe", recipe_name)]),
        created_at: Utc::now(),
        items,
        is_completed: false,
    }
}

/// Display name for a list generated from a recipe selection.
pub fn list_name_for_recipes(recipes: &[Recipe]) -> String {
    match recipes {
        [single] => t_args("grocery-list-single-recipe", &[("recipe", &single.title)]),
        _ => t_args(
            "grocery-list-recipe-count",
            &[("count", &recipes.len().to_string())],
        ),
    }
}

/// Aggregate the ingredient lists of the selected recipes into deduplicated
/// grocery items, combining amounts for identical `(name, unit)` pairs and
/// accumulating a provenance note naming the contributing recipes.
pub fn aggregate_from_recipes(recipes: &[Recipe], user_id: &str) -> Vec<GroceryItem> {
    // Keyed vector rather than a map so output order follows first sight.
    let mut aggregated: Vec<(String, GroceryItem)> = Vec::new();

    for recipe in recipes {
        for ingredient in &recipe.ingredients {
            if ingredient.name.trim().is_empty() {
                continue;
            }

            let key = format!(
                "{}-{}",
                ingredient.name.to_lowercase(),
                ingredient.unit.as_deref().unwrap_or("")
            );

            if let Some((_, existing)) = aggregated.iter_mut().find(|(k, _)| *k == key) {
                combine_amounts(existing, &ingredient.amount);
                existing.notes = Some(match existing.notes.take() {
                    Some(notes) => format!("{}, {}", notes, recipe.title),
                    None => format!("For {}", recipe.title),
                });
            } else {
                let mut item = GroceryItem::new(&ingredient.name);
                item.user_id = Some(user_id.to_string());
                item.amount = Some(if ingredient.amount.is_empty() {
                    "1".to_string()
                } else {
                    ingredient.amount.clone()
                });
                item.unit = ingredient.unit.clone();
                item.category = Some(
                    ingredient
                        .category
                        .clone()
                        .unwrap_or_else(|| classify(&ingredient.name).to_string()),
                );
                item.notes = Some(format!("For {}", recipe.title));
                aggregated.push((key, item));
            }
        }
    }

    debug!(
        "aggregated {} grocery items from {} recipes",
        aggregated.len(),
        recipes.len()
    );
    aggregated.into_iter().map(|(_, item)| item).collect()
}

/// Merge an incoming amount string into an aggregated item.
fn combine_amounts(existing: &mut GroceryItem, incoming: &str) {
    let current_num = match existing.amount.as_deref() {
        None => Some(0.0),
        Some(text) => parse_leading_number(text),
    };
    let incoming_num = if incoming.is_empty() {
        Some(1.0)
    } else {
        parse_leading_number(incoming)
    };

    existing.amount = Some(match (current_num, incoming_num) {
        (Some(current), Some(new)) => format_amount(current + new),
        // One side is qualitative: keep both texts, comma-joined.
        _ => {
            let current_text = existing.amount.as_deref().unwrap_or("");
            let incoming_text = if incoming.is_empty() { "1" } else { incoming };
            let joined = format!("{}, {}", current_text, incoming_text);
            joined.trim_start_matches(',').trim().to_string()
        }
    });
}

/// Plan the inventory side effect of toggling a grocery item's checked state.
///
/// Returns the one-item delta to feed through the reconciler, or `None` when
/// nothing should change. `inventory_matches` are the user's inventory items
/// whose name matches the grocery item (there may be several unit variants).
///
/// Checking prefers an exact unit match and adds the amounts; without one the
/// item goes in as a fresh entry. Unchecking only reverses a unit-matched
/// entry: it subtracts the same amount, or issues a removal once the
/// remaining quantity would drop to zero or below.
pub fn plan_check_toggle(
    item: &GroceryItem,
    inventory_matches: &[InventoryItem],
) -> Option<InventoryItem> {
    let user_id = item.user_id.as_deref()?;
    let unit_match = inventory_matches
        .iter()
        .find(|candidate| candidate.unit == item.unit);
    let contribution = parse_or_default(item.amount.as_deref(), 1.0);

    if item.is_checked {
        match unit_match {
            Some(matched) => {
                let current = parse_or_default(matched.amount.as_deref(), 0.0);
                let mut delta = matched.clone();
                delta.amount = Some(format_amount(current + contribution));
                Some(delta)
            }
            None => {
                let mut delta = InventoryItem::new(user_id, &item.name);
                delta.amount = Some(item.amount.clone().unwrap_or_else(|| "1".to_string()));
                delta.unit = item.unit.clone();
                delta.category = item.category.clone();
                delta.notes = item.notes.clone();
                Some(delta)
            }
        }
    } else {
        // Best-effort reversal: with no unit-matched entry there is nothing
        // safe to subtract from.
        let matched = unit_match?;
        let current = parse_or_default(matched.amount.as_deref(), 0.0);
        if current <= contribution {
            Some(InventoryItem::removal(user_id, &matched.ingredient_name))
        } else {
            let mut delta = matched.clone();
            delta.amount = Some(format_amount(current - contribution));
            Some(delta)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn recipe(title: &str, ingredients: Vec<Ingredient>) -> Recipe {
        let mut recipe = Recipe::new("u1", title);
        recipe.ingredients = ingredients;
        recipe
    }

    #[test]
    fn test_build_from_missing_categorizes_and_starts_unchecked() {
        let missing = vec![
            IngredientNeed { name: "Tomato".into(), amount: "3".into(), unit: None },
            IngredientNeed { name: "Chicken".into(), amount: "1".into(), unit: Some("pound".into()) },
        ];
        let list = build_from_missing("Curry", &missing, "u1");
        assert!(list.name.contains("Curry"));
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].category.as_deref(), Some("Produce"));
        assert_eq!(list.items[1].category.as_deref(), Some("Meat"));
        assert!(list.items.iter().all(|item| !item.is_checked));
    }

    #[test]
    fn test_aggregation_sums_matching_name_and_unit() {
        let recipes = [
            recipe("Bread", vec![Ingredient::new("flour", "2").with_unit("cup")]),
            recipe("Cake", vec![Ingredient::new("Flour", "1").with_unit("cup")]),
        ];
        let items = aggregate_from_recipes(&recipes, "u1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount.as_deref(), Some("3"));
        assert_eq!(items[0].unit.as_deref(), Some("cup"));
        assert_eq!(items[0].notes.as_deref(), Some("For Bread, Cake"));
    }

    #[test]
    fn test_aggregation_keeps_unit_variants_separate() {
        let recipes = [
            recipe("A", vec![Ingredient::new("Milk", "1").with_unit("cup")]),
            recipe("B", vec![Ingredient::new("Milk", "1").with_unit("liter")]),
        ];
        let items = aggregate_from_recipes(&recipes, "u1");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_aggregation_falls_back_to_textual_join() {
        let recipes = [
            recipe("A", vec![Ingredient::new("Salt", "to taste")]),
            recipe("B", vec![Ingredient::new("Salt", "1")]),
        ];
        let items = aggregate_from_recipes(&recipes, "u1");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount.as_deref(), Some("to taste, 1"));
    }

    #[test]
    fn test_checking_with_unit_match_adds_amounts() {
        let mut grocery = GroceryItem::new("Flour");
        grocery.user_id = Some("u1".into());
        grocery.amount = Some("2".into());
        grocery.unit = Some("cup".into());
        grocery.is_checked = true;

        let mut stocked = InventoryItem::new("u1", "Flour").with_amount("3");
        stocked.unit = Some("cup".into());
        stocked.id = Some(4);

        let delta = plan_check_toggle(&grocery, &[stocked]).unwrap();
        assert_eq!(delta.amount.as_deref(), Some("5"));
        assert_eq!(delta.unit.as_deref(), Some("cup"));
    }

    #[test]
    fn test_checking_without_unit_match_creates_fresh_delta() {
        let mut grocery = GroceryItem::new("Flour");
        grocery.user_id = Some("u1".into());
        grocery.amount = Some("500".into());
        grocery.unit = Some("gram".into());
        grocery.is_checked = true;

        let mut stocked = InventoryItem::new("u1", "Flour").with_amount("3");
        stocked.unit = Some("cup".into());

        let delta = plan_check_toggle(&grocery, &[stocked]).unwrap();
        assert_eq!(delta.amount.as_deref(), Some("500"));
        assert_eq!(delta.unit.as_deref(), Some("gram"));
        assert!(delta.id.is_none());
    }

    #[test]
    fn test_unchecking_subtracts_or_removes() {
        let mut grocery = GroceryItem::new("Eggs");
        grocery.user_id = Some("u1".into());
        grocery.amount = Some("6".into());
        grocery.is_checked = false;

        let plenty = InventoryItem::new("u1", "Eggs").with_amount("12");
        let delta = plan_check_toggle(&grocery, &[plenty]).unwrap();
        assert_eq!(delta.amount.as_deref(), Some("6"));

        let scarce = InventoryItem::new("u1", "Eggs").with_amount("6");
        let delta = plan_check_toggle(&grocery, &[scarce]).unwrap();
        assert!(delta.is_removal());
    }

    #[test]
    fn test_unchecking_without_unit_match_is_a_no_op() {
        let mut grocery = GroceryItem::new("Eggs");
        grocery.user_id = Some("u1".into());
        grocery.amount = Some("6".into());
        grocery.unit = Some("dozen".into());
        grocery.is_checked = false;

        let stocked = InventoryItem::new("u1", "Eggs").with_amount("12");
        assert!(plan_check_toggle(&grocery, &[stocked]).is_none());
    }
}
