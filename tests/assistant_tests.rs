//! Full chat flows: mock-classified messages applying their side effects to
//! the store, with history recorded and failures degraded, never raised.

use std::sync::Arc;

use plates::assistant::Assistant;
use plates::models::{Intent, ModelConfig, ProviderKind};
use plates::storage::{KeyValueStore, MemoryStore};

async fn mock_assistant() -> Assistant {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let assistant = Assistant::new(store);
    let config = ModelConfig {
        provider: ProviderKind::Mock,
        ..ModelConfig::default()
    };
    assistant.config().set_model_config(&config).await;
    assistant
}

#[tokio::test]
async fn test_inventory_intent_updates_the_store() {
    let assistant = mock_assistant().await;

    let response = assistant
        .handle_message("u1", "add some groceries to my inventory")
        .await;
    assert_eq!(response.intent, Intent::SaveInventory);

    let inventory = assistant.inventory().get_inventory("u1").await;
    let names: Vec<&str> = inventory
        .iter()
        .map(|item| item.ingredient_name.as_str())
        .collect();
    assert!(names.contains(&"Milk"));
    assert!(names.contains(&"Eggs"));
    assert!(names.contains(&"Bread"));
    assert!(inventory.iter().all(|item| item.user_id == "u1"));
}

#[tokio::test]
async fn test_remove_intent_issues_sentinel_not_negative_quantity() {
    let assistant = mock_assistant().await;
    assistant.handle_message("u1", "add some groceries to my inventory").await;

    let response = assistant
        .handle_message("u1", "remove the milk from my inventory")
        .await;
    assert_eq!(response.intent, Intent::RemoveInventory);

    let inventory = assistant.inventory().get_inventory("u1").await;
    assert!(inventory.iter().all(|item| item.ingredient_name != "Milk"));
    // The sentinel deleted the record instead of storing "-1".
    assert!(inventory
        .iter()
        .all(|item| item.amount.as_deref() != Some("-1")));
}

#[tokio::test]
async fn test_recipe_search_does_not_persist_the_recipe() {
    let assistant = mock_assistant().await;

    let response = assistant.handle_message("u1", "give me a pasta recipe").await;
    assert_eq!(response.intent, Intent::SearchRecipe);
    assert!(response.recipe.is_some());

    // Displayed recipes stay unsaved until an explicit save.
    assert!(assistant.recipes().get_recipes("u1").await.is_empty());
}

#[tokio::test]
async fn test_every_exchange_lands_in_chat_history() {
    let assistant = mock_assistant().await;

    assistant.handle_message("u1", "give me a pasta recipe").await;
    assistant.handle_message("u1", "how do I poach an egg").await;

    let history = assistant.chat().get_history("u1").await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].message, "give me a pasta recipe");
    assert_eq!(history[0].intent, Some(Intent::SearchRecipe));
    assert!(!history[1].response.is_empty());
}

#[tokio::test]
async fn test_chat_histories_are_per_user() {
    let assistant = mock_assistant().await;

    assistant.handle_message("alice", "give me a pasta recipe").await;
    assistant.handle_message("bob", "how do I poach an egg").await;

    assert_eq!(assistant.chat().get_history("alice").await.len(), 1);
    assert_eq!(assistant.chat().get_history("bob").await.len(), 1);
}

#[tokio::test]
async fn test_missing_config_still_answers() {
    // No model config stored: the default (network) provider has no key and
    // degrades to an apologetic unknown reply instead of failing.
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let assistant = Assistant::new(store);

    let response = assistant.handle_message("u1", "hello").await;
    assert_eq!(response.intent, Intent::Unknown);
    assert!(!response.ai_response.is_empty());
}

#[tokio::test]
async fn test_inventory_snapshot_variant_still_classifies() {
    let assistant = mock_assistant().await;
    assistant.handle_message("u1", "add some groceries to my inventory").await;

    let response = assistant
        .handle_message_with_inventory("u1", "what can I make for dinner")
        .await;
    assert_eq!(response.intent, Intent::SearchRecipe);
    assert!(response.recipe.is_some());
}
