//! End-to-end inventory flows through the service layer and an in-memory
//! store: delta reconciliation, availability checks, and recipe consumption.

use std::sync::Arc;

use plates::models::{Ingredient, InventoryItem, Recipe};
use plates::services::InventoryService;
use plates::storage::{KeyValueStore, MemoryStore};

fn service() -> InventoryService {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    InventoryService::new(store)
}

fn delta(user: &str, name: &str, amount: &str) -> InventoryItem {
    InventoryItem::new(user, name).with_amount(amount)
}

#[tokio::test]
async fn test_insert_into_empty_inventory() {
    let inventory = service();

    let merged = inventory.apply_deltas(&[delta("u1", "Eggs", "12")], "u1").await;

    assert_eq!(merged.len(), 1);
    assert!(merged[0].id.is_some());
    assert_eq!(merged[0].amount.as_deref(), Some("12"));
    assert_eq!(merged[0].user_id, "u1");

    let stored = inventory.get_inventory("u1").await;
    assert_eq!(stored, merged);
}

#[tokio::test]
async fn test_removal_sentinel_clears_item() {
    let inventory = service();
    inventory
        .apply_deltas(&[delta("u1", "Milk", "1").with_unit("gallon")], "u1")
        .await;

    inventory
        .apply_deltas(&[delta("u1", "Milk", "-1")], "u1")
        .await;

    assert!(inventory.get_inventory("u1").await.is_empty());
}

#[tokio::test]
async fn test_removal_of_absent_item_leaves_inventory_unchanged() {
    let inventory = service();
    inventory.apply_deltas(&[delta("u1", "Eggs", "12")], "u1").await;

    let before = inventory.get_inventory("u1").await;
    inventory
        .apply_deltas(&[InventoryItem::removal("u1", "Caviar")], "u1")
        .await;

    assert_eq!(inventory.get_inventory("u1").await, before);
}

#[tokio::test]
async fn test_update_preserves_unspecified_fields() {
    let inventory = service();
    let mut first = delta("u1", "Milk", "1").with_unit("gallon").with_category("Dairy");
    first.location = Some("fridge".to_string());
    inventory.apply_deltas(&[first], "u1").await;

    // Amount-only delta: unit, category, and location must survive.
    inventory.apply_deltas(&[delta("u1", "milk", "2")], "u1").await;

    let stored = inventory.get_inventory("u1").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].amount.as_deref(), Some("2"));
    assert_eq!(stored[0].unit.as_deref(), Some("gallon"));
    assert_eq!(stored[0].category.as_deref(), Some("Dairy"));
    assert_eq!(stored[0].location.as_deref(), Some("fridge"));
}

#[tokio::test]
async fn test_case_insensitive_identity_across_batches() {
    let inventory = service();
    inventory.apply_deltas(&[delta("u1", "Eggs", "6")], "u1").await;
    inventory.apply_deltas(&[delta("u1", "eggs", "12")], "u1").await;

    let stored = inventory.get_inventory("u1").await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].ingredient_name, "Eggs");
    assert_eq!(stored[0].amount.as_deref(), Some("12"));
}

#[tokio::test]
async fn test_check_then_cook_consumes_inventory() {
    let inventory = service();
    inventory
        .apply_deltas(
            &[delta("u1", "Eggs", "6"), delta("u1", "Flour", "4").with_unit("cup")],
            "u1",
        )
        .await;

    let mut recipe = Recipe::new("u1", "Crepes");
    recipe.ingredients = vec![
        Ingredient::new("eggs", "6"),
        Ingredient::new("flour", "1.5").with_unit("cup"),
    ];

    let check = inventory.check_recipe(&recipe, "u1").await;
    assert!(check.has_all);

    let remaining = inventory.cook_recipe(&recipe, "u1").await;

    // Eggs hit zero and are removed, not left at "0"; flour is decremented.
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].ingredient_name, "Flour");
    assert_eq!(remaining[0].amount.as_deref(), Some("2.5"));

    let stored = inventory.get_inventory("u1").await;
    assert_eq!(stored, remaining);
}

#[tokio::test]
async fn test_qualitative_amount_never_satisfies_a_requirement() {
    let inventory = service();
    inventory
        .apply_deltas(&[delta("u1", "Salt", "to taste")], "u1")
        .await;

    let mut recipe = Recipe::new("u1", "Soup");
    recipe.ingredients = vec![Ingredient::new("Salt", "1")];

    let check = inventory.check_recipe(&recipe, "u1").await;
    assert!(!check.has_all);
    assert_eq!(check.missing.len(), 1);
    assert_eq!(check.missing[0].name, "Salt");
}

#[tokio::test]
async fn test_users_do_not_see_each_other() {
    let inventory = service();
    inventory.apply_deltas(&[delta("alice", "Milk", "1")], "alice").await;
    inventory.apply_deltas(&[delta("bob", "Milk", "2")], "bob").await;

    // Bob clearing his milk leaves Alice's untouched.
    inventory
        .apply_deltas(&[InventoryItem::removal("bob", "Milk")], "bob")
        .await;

    let alice = inventory.get_inventory("alice").await;
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].amount.as_deref(), Some("1"));
    assert!(inventory.get_inventory("bob").await.is_empty());
}

#[tokio::test]
async fn test_reapplying_a_batch_is_idempotent() {
    let inventory = service();
    let batch = [delta("u1", "Eggs", "12"), InventoryItem::removal("u1", "Milk")];

    inventory.apply_deltas(&batch, "u1").await;
    let once = inventory.get_inventory("u1").await;

    inventory.apply_deltas(&batch, "u1").await;
    let twice = inventory.get_inventory("u1").await;

    assert_eq!(once, twice);
}
