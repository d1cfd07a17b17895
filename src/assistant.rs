//! # Chat Orchestration
//!
//! Ties the classification provider to the collection services: a free-text
//! message goes out for classification, the structured payloads that come
//! back are applied to the store (inventory deltas through the reconciler,
//! grocery lists and recipes through their services), and the exchange is
//! appended to chat history.
//!
//! A failure anywhere in the flow degrades the reply; it never aborts it.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai;
use crate::messages::t;
use crate::models::{AiResponse, ChatRequest, Intent, ModelConfig};
use crate::services::{
    ChatHistoryService, ConfigService, GroceryService, InventoryService, RecipeService,
    UserService,
};
use crate::storage::KeyValueStore;

/// The assembled assistant: one store, one service per collection.
pub struct Assistant {
    users: UserService,
    recipes: RecipeService,
    inventory: InventoryService,
    grocery: GroceryService,
    chat: ChatHistoryService,
    config: ConfigService,
}

impl Assistant {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            users: UserService::new(store.clone()),
            recipes: RecipeService::new(store.clone()),
            inventory: InventoryService::new(store.clone()),
            grocery: GroceryService::new(store.clone()),
            chat: ChatHistoryService::new(store.clone()),
            config: ConfigService::new(store),
        }
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn recipes(&self) -> &RecipeService {
        &self.recipes
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    pub fn grocery(&self) -> &GroceryService {
        &self.grocery
    }

    pub fn chat(&self) -> &ChatHistoryService {
        &self.chat
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    async fn model_config(&self) -> ModelConfig {
        self.config.get_model_config().await.unwrap_or_default()
    }

    /// Handle one chat message end to end: classify, apply side effects,
    /// record the exchange, and return the reply.
    pub async fn handle_message(&self, user_id: &str, message: &str) -> AiResponse {
        let config = self.model_config().await;
        let mut request = ChatRequest::new(user_id, message);
        request.model_config = Some(config);

        let response = ai::generate_response(&request).await;
        self.apply_response(user_id, message, response).await
    }

    /// Handle a message with the user's inventory snapshot appended, for
    /// requests that should reason about what is on hand.
    pub async fn handle_message_with_inventory(&self, user_id: &str, message: &str) -> AiResponse {
        let config = self.model_config().await;
        let inventory = self.inventory.get_inventory(user_id).await;
        let mut request = ChatRequest::new(user_id, message);
        request.model_config = Some(config);

        let response = ai::generate_response_with_inventory(&request, &inventory).await;
        self.apply_response(user_id, message, response).await
    }

    /// Apply a classified response's payloads to the store and append the
    /// exchange to chat history.
    async fn apply_response(
        &self,
        user_id: &str,
        message: &str,
        mut response: AiResponse,
    ) -> AiResponse {
        info!(user_id, intent = %response.intent, "applying classified response");

        match response.intent {
            Intent::SaveInventory | Intent::RemoveInventory => {
                if let Some(items) = &response.inventory_items {
                    let merged = self.inventory.apply_deltas(items, user_id).await;
                    debug!(user_id, merged = merged.len(), "inventory updated from chat");
                } else {
                    warn!(user_id, intent = %response.intent, "inventory intent without items");
                }
            }
            Intent::SaveRecipe => {
                if let Some(recipe) = response.recipe.take() {
                    let mut recipe = recipe;
                    recipe.user_id = user_id.to_string();
                    let saved = self.recipes.save_recipe(recipe).await;
                    debug!(user_id, recipe_id = saved.id, "recipe saved from chat");
                    response.recipe = Some(saved);
                }
            }
            Intent::CreateGroceryList => {
                if let Some(list) = response.grocery_list.take() {
                    let mut list = list;
                    list.user_id = user_id.to_string();
                    for item in &mut list.items {
                        if item.user_id.is_none() {
                            item.user_id = Some(user_id.to_string());
                        }
                    }
                    let saved = self.grocery.save_list(list).await;
                    debug!(user_id, list_id = saved.id, "grocery list saved from chat");
                    response.grocery_list = Some(saved);
                }
            }
            Intent::OutOfTopic => {
                if response.ai_response.trim().is_empty() {
                    response.ai_response = t("out-of-topic-redirect");
                }
            }
            _ => {}
        }

        // Recipes attached to search results are stamped but left unsaved
        // until the user asks to keep them.
        if let Some(recipe) = &mut response.recipe {
            if recipe.user_id.is_empty() {
                recipe.user_id = user_id.to_string();
            }
        }

        let recipe_id = response
            .recipe
            .as_ref()
            .map(|recipe| recipe.id)
            .filter(|id| *id != 0);
        self.chat
            .save_message(
                user_id,
                message,
                &response.ai_response,
                Some(response.intent),
                recipe_id,
            )
            .await;

        response
    }
}
