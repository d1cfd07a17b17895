//! # Collection Services
//!
//! Explicit state containers over the key-value store, one per collection.
//! Each service exposes pure query/command methods; there are no embedded
//! subscriptions here — change notification belongs to whatever presentation
//! layer sits on top.
//!
//! Failure policy: no public operation propagates a storage failure. Reads
//! degrade to empty collections, writes report what they were given, and
//! every degradation is logged. The caller can always proceed, at the cost
//! of silently stale data in rare failure windows.
//!
//! User identifiers are explicit parameters on every entry point; nothing in
//! this module assumes a default user.

use chrono::{Duration, Utc};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::grocery::{self, plan_check_toggle};
use crate::models::{
    ChatMessage, GroceryItem, GroceryList, Intent, InventoryItem, ModelConfig, Note, Recipe,
    RecipeStep, Timer, User, UserPreferences,
};
use crate::recipe_inventory::{check_ingredients, subtract_ingredients, IngredientCheck, IngredientNeed};
use crate::reconciler::reconcile_from;
use crate::storage::{Collection, KeyValueStore};
use crate::text_processing::scan_inventory_deltas;

/// Fixed key of the single model-config record.
const MODEL_CONFIG_KEY: &str = "current";

/// Load and decode a whole collection, skipping records that fail to decode.
async fn load_all<T: DeserializeOwned>(store: &dyn KeyValueStore, collection: Collection) -> Vec<T> {
    let values = match store.get_all(collection).await {
        Ok(values) => values,
        Err(err) => {
            warn!(collection = %collection, error = %err, "failed to load collection, using empty");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(collection = %collection, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Load one record by id; any failure reads as absent.
async fn load_one<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    collection: Collection,
    id: &str,
) -> Option<T> {
    match store.get(collection, id).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(collection = %collection, id, error = %err, "malformed record");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(collection = %collection, id, error = %err, "failed to load record");
            None
        }
    }
}

/// Persist one record; failures are logged, not propagated.
async fn store_one<T: Serialize>(
    store: &dyn KeyValueStore,
    collection: Collection,
    id: &str,
    record: &T,
) -> bool {
    let value = match serde_json::to_value(record) {
        Ok(value) => value,
        Err(err) => {
            warn!(collection = %collection, id, error = %err, "failed to encode record");
            return false;
        }
    };
    match store.put(collection, id, value).await {
        Ok(()) => true,
        Err(err) => {
            warn!(collection = %collection, id, error = %err, "failed to store record");
            false
        }
    }
}

/// Smallest free numeric identifier in a collection: max stored `id` + 1.
async fn next_id(store: &dyn KeyValueStore, collection: Collection) -> i64 {
    let values: Vec<Value> = load_all(store, collection).await;
    values
        .iter()
        .filter_map(|value| value.get("id").and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        + 1
}

// ---------------------------------------------------------------------------
// Users

pub struct UserService {
    store: Arc<dyn KeyValueStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get_user(&self, user_id: &str) -> Option<User> {
        load_one(self.store.as_ref(), Collection::Users, user_id).await
    }

    pub async fn create_user(&self, user_id: &str, username: &str) -> User {
        let user = User {
            id: user_id.to_string(),
            username: username.to_string(),
            created_at: Utc::now(),
            preferences: Some(UserPreferences::default()),
        };
        store_one(self.store.as_ref(), Collection::Users, user_id, &user).await;
        user
    }

    /// Fetch a user, creating one with a generated chef name when absent.
    pub async fn get_or_create_user(&self, user_id: &str) -> User {
        if let Some(user) = self.get_user(user_id).await {
            return user;
        }
        let suffix: String = rand::thread_rng()
            .sample_iter(rand::distributions::Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        self.create_user(user_id, &format!("Chef_{}", suffix.to_lowercase()))
            .await
    }

    pub async fn update_preferences(
        &self,
        user_id: &str,
        preferences: UserPreferences,
    ) -> Option<User> {
        let mut user = self.get_user(user_id).await?;
        user.preferences = Some(preferences);
        store_one(self.store.as_ref(), Collection::Users, user_id, &user).await;
        Some(user)
    }
}

// ---------------------------------------------------------------------------
// Recipes

pub struct RecipeService {
    store: Arc<dyn KeyValueStore>,
}

impl RecipeService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get_recipes(&self, user_id: &str) -> Vec<Recipe> {
        let mut recipes: Vec<Recipe> = load_all(self.store.as_ref(), Collection::Recipes).await;
        recipes.retain(|recipe| recipe.user_id == user_id);
        recipes.sort_by_key(|recipe| recipe.id);
        recipes
    }

    pub async fn get_recipe(&self, recipe_id: i64) -> Option<Recipe> {
        load_one(self.store.as_ref(), Collection::Recipes, &recipe_id.to_string()).await
    }

    /// Save a recipe, assigning the next free identifier when it has none.
    pub async fn save_recipe(&self, mut recipe: Recipe) -> Recipe {
        if recipe.id == 0 {
            recipe.id = next_id(self.store.as_ref(), Collection::Recipes).await;
        }
        debug!(recipe_id = recipe.id, title = %recipe.title, "saving recipe");
        store_one(
            self.store.as_ref(),
            Collection::Recipes,
            &recipe.id.to_string(),
            &recipe,
        )
        .await;
        recipe
    }

    pub async fn delete_recipe(&self, recipe_id: i64) -> bool {
        match self
            .store
            .delete(Collection::Recipes, &recipe_id.to_string())
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                warn!(recipe_id, error = %err, "failed to delete recipe");
                false
            }
        }
    }

    /// Term search over title, description, keywords, ingredient names,
    /// methods, cuisine, and meal type. Every term must match somewhere.
    pub async fn search_recipes(&self, user_id: &str, query: &str) -> Vec<Recipe> {
        let recipes = self.get_recipes(user_id).await;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return recipes;
        }
        let terms: Vec<&str> = query.split_whitespace().collect();

        recipes
            .into_iter()
            .filter(|recipe| {
                let mut haystack = vec![
                    recipe.title.clone(),
                    recipe.description.clone(),
                    recipe.keywords.clone(),
                ];
                haystack.extend(recipe.ingredients.iter().map(|i| i.name.clone()));
                haystack.extend(recipe.methods.iter().cloned());
                haystack.extend(recipe.cuisine_type.iter().cloned());
                haystack.extend(recipe.meal_type.iter().cloned());
                let haystack = haystack.join(" ").to_lowercase();
                terms.iter().all(|term| haystack.contains(term))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Inventory

pub struct InventoryService {
    store: Arc<dyn KeyValueStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get_inventory(&self, user_id: &str) -> Vec<InventoryItem> {
        let mut items: Vec<InventoryItem> =
            load_all(self.store.as_ref(), Collection::Inventory).await;
        items.retain(|item| item.user_id == user_id);
        items.sort_by_key(|item| item.id);
        items
    }

    /// Run a delta batch through the reconciler and persist the outcome.
    ///
    /// Other users' records are never touched. Fresh identifiers are
    /// allocated above the store-wide maximum so they cannot collide across
    /// users. On storage failure the input deltas are handed back unchanged.
    pub async fn apply_deltas(
        &self,
        deltas: &[InventoryItem],
        user_id: &str,
    ) -> Vec<InventoryItem> {
        let all: Vec<InventoryItem> = load_all(self.store.as_ref(), Collection::Inventory).await;
        let watermark = all.iter().filter_map(|item| item.id).max().unwrap_or(0) + 1;
        let existing: Vec<InventoryItem> = all
            .into_iter()
            .filter(|item| item.user_id == user_id)
            .collect();
        let before_ids: Vec<i64> = existing.iter().filter_map(|item| item.id).collect();

        let merged = reconcile_from(existing, deltas, user_id, Some(watermark));
        debug!(user_id, deltas = deltas.len(), merged = merged.len(), "reconciled inventory");

        let after_ids: Vec<i64> = merged.iter().filter_map(|item| item.id).collect();
        for gone in before_ids.iter().filter(|id| !after_ids.contains(id)) {
            if let Err(err) = self
                .store
                .delete(Collection::Inventory, &gone.to_string())
                .await
            {
                warn!(item_id = gone, error = %err, "failed to delete reconciled-away item");
                return deltas.to_vec();
            }
        }
        for item in &merged {
            let Some(id) = item.id else { continue };
            if !store_one(self.store.as_ref(), Collection::Inventory, &id.to_string(), item).await {
                return deltas.to_vec();
            }
        }

        merged
    }

    pub async fn delete_item(&self, item_id: i64) -> bool {
        match self
            .store
            .delete(Collection::Inventory, &item_id.to_string())
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                warn!(item_id, error = %err, "failed to delete inventory item");
                false
            }
        }
    }

    /// Availability check for a recipe. When inventory cannot be loaded the
    /// result conservatively reports every ingredient as missing.
    pub async fn check_recipe(&self, recipe: &Recipe, user_id: &str) -> IngredientCheck {
        let inventory = self.get_inventory(user_id).await;
        check_ingredients(recipe, &inventory)
    }

    /// Subtract a cooked recipe's amounts from inventory and persist the
    /// result by direct identifier. This path never issues removal
    /// sentinels; items at or below zero are deleted outright.
    pub async fn cook_recipe(&self, recipe: &Recipe, user_id: &str) -> Vec<InventoryItem> {
        let inventory = self.get_inventory(user_id).await;
        let outcome = subtract_ingredients(recipe, inventory);

        for removed in &outcome.removed {
            if let Some(id) = removed.id {
                self.delete_item(id).await;
            }
        }
        for updated in &outcome.updated {
            if let Some(id) = updated.id {
                store_one(
                    self.store.as_ref(),
                    Collection::Inventory,
                    &id.to_string(),
                    updated,
                )
                .await;
            }
        }
        debug!(
            user_id,
            recipe = %recipe.title,
            removed = outcome.removed.len(),
            updated = outcome.updated.len(),
            "subtracted cooked recipe from inventory"
        );

        outcome.inventory
    }

    /// All inventory entries matching a name, across unit variants.
    pub async fn items_by_name(&self, user_id: &str, name: &str) -> Vec<InventoryItem> {
        self.get_inventory(user_id)
            .await
            .into_iter()
            .filter(|item| item.matches_name(name))
            .collect()
    }

    pub async fn items_by_category(
        &self,
        user_id: &str,
    ) -> BTreeMap<String, Vec<InventoryItem>> {
        let mut grouped: BTreeMap<String, Vec<InventoryItem>> = BTreeMap::new();
        for item in self.get_inventory(user_id).await {
            let category = item
                .category
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_string());
            grouped.entry(category).or_default().push(item);
        }
        grouped
    }

    /// Items expiring within the next `within_days` days.
    pub async fn expiring_items(&self, user_id: &str, within_days: i64) -> Vec<InventoryItem> {
        let now = Utc::now();
        let horizon = now + Duration::days(within_days);
        self.get_inventory(user_id)
            .await
            .into_iter()
            .filter(|item| {
                item.expires_at
                    .map(|expires| expires > now && expires <= horizon)
                    .unwrap_or(false)
            })
            .collect()
    }

    pub async fn expired_items(&self, user_id: &str) -> Vec<InventoryItem> {
        let now = Utc::now();
        self.get_inventory(user_id)
            .await
            .into_iter()
            .filter(|item| item.expires_at.map(|expires| expires <= now).unwrap_or(false))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Grocery lists

pub struct GroceryService {
    store: Arc<dyn KeyValueStore>,
    inventory: InventoryService,
}

impl GroceryService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            store,
        }
    }

    pub async fn get_lists(&self, user_id: &str) -> Vec<GroceryList> {
        let mut lists: Vec<GroceryList> =
            load_all(self.store.as_ref(), Collection::GroceryLists).await;
        lists.retain(|list| list.user_id == user_id);
        lists.sort_by_key(|list| list.id);
        lists
    }

    pub async fn get_list(&self, list_id: i64) -> Option<GroceryList> {
        load_one(self.store.as_ref(), Collection::GroceryLists, &list_id.to_string()).await
    }

    /// Save a list and each of its items.
    ///
    /// The list record and the item records are separate sequential writes;
    /// a crash between them leaves items without their final `list_id`.
    pub async fn save_list(&self, mut list: GroceryList) -> GroceryList {
        if list.id == 0 {
            list.id = next_id(self.store.as_ref(), Collection::GroceryLists).await;
        }

        let mut item_id = next_id(self.store.as_ref(), Collection::GroceryItems).await;
        for item in &mut list.items {
            item.list_id = Some(list.id);
            if item.id.is_none() {
                item.id = Some(item_id);
                item_id += 1;
            }
        }

        debug!(list_id = list.id, items = list.items.len(), "saving grocery list");
        store_one(
            self.store.as_ref(),
            Collection::GroceryLists,
            &list.id.to_string(),
            &list,
        )
        .await;
        for item in &list.items {
            if let Some(id) = item.id {
                store_one(
                    self.store.as_ref(),
                    Collection::GroceryItems,
                    &id.to_string(),
                    item,
                )
                .await;
            }
        }

        list
    }

    pub async fn delete_list(&self, list_id: i64) -> bool {
        let items: Vec<GroceryItem> =
            load_all(self.store.as_ref(), Collection::GroceryItems).await;
        for item in items {
            if item.list_id == Some(list_id) {
                if let Some(id) = item.id {
                    let _ = self
                        .store
                        .delete(Collection::GroceryItems, &id.to_string())
                        .await;
                }
            }
        }
        match self
            .store
            .delete(Collection::GroceryLists, &list_id.to_string())
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                warn!(list_id, error = %err, "failed to delete grocery list");
                false
            }
        }
    }

    /// Build and persist a shopping list for a recipe's missing ingredients.
    pub async fn create_from_missing(
        &self,
        recipe_name: &str,
        missing: &[IngredientNeed],
        user_id: &str,
    ) -> GroceryList {
        let list = grocery::build_from_missing(recipe_name, missing, user_id);
        self.save_list(list).await
    }

    /// Aggregate the selected recipes into one persisted list and return its
    /// items. Unknown recipe ids are skipped; an empty selection produces no
    /// list.
    pub async fn generate_from_recipes(
        &self,
        recipe_ids: &[i64],
        user_id: &str,
    ) -> Vec<GroceryItem> {
        let recipe_service = RecipeService::new(self.store.clone());
        let recipes: Vec<Recipe> = recipe_service
            .get_recipes(user_id)
            .await
            .into_iter()
            .filter(|recipe| recipe_ids.contains(&recipe.id))
            .collect();
        if recipes.is_empty() {
            warn!(user_id, "no recipes found for grocery generation");
            return Vec::new();
        }

        let items = grocery::aggregate_from_recipes(&recipes, user_id);
        let list = GroceryList {
            id: 0,
            user_id: user_id.to_string(),
            name: grocery::list_name_for_recipes(&recipes),
            created_at: Utc::now(),
            items,
            is_completed: false,
        };
        self.save_list(list).await.items
    }

    /// Flip an item's checked state and apply the inventory side effect.
    ///
    /// Checking merges the item into inventory through the reconciler;
    /// unchecking reverses the contribution, down to a removal when the
    /// remaining amount would not stay positive.
    pub async fn toggle_item(&self, item_id: i64, user_id: &str) -> Option<GroceryItem> {
        let mut item: GroceryItem =
            load_one(self.store.as_ref(), Collection::GroceryItems, &item_id.to_string()).await?;
        item.is_checked = !item.is_checked;
        if item.user_id.is_none() {
            item.user_id = Some(user_id.to_string());
        }

        store_one(
            self.store.as_ref(),
            Collection::GroceryItems,
            &item_id.to_string(),
            &item,
        )
        .await;

        // Mirror the new state into the owning list record, when one exists.
        if let Some(list_id) = item.list_id {
            if let Some(mut list) = self.get_list(list_id).await {
                for entry in &mut list.items {
                    if entry.id == Some(item_id) {
                        entry.is_checked = item.is_checked;
                    }
                }
                store_one(
                    self.store.as_ref(),
                    Collection::GroceryLists,
                    &list_id.to_string(),
                    &list,
                )
                .await;
            }
        }

        let matches = self.inventory.items_by_name(user_id, &item.name).await;
        if let Some(delta) = plan_check_toggle(&item, &matches) {
            self.inventory.apply_deltas(&[delta], user_id).await;
        }

        Some(item)
    }

    pub async fn items_by_category(
        &self,
        user_id: &str,
    ) -> BTreeMap<String, Vec<GroceryItem>> {
        let items: Vec<GroceryItem> =
            load_all(self.store.as_ref(), Collection::GroceryItems).await;
        let mut grouped: BTreeMap<String, Vec<GroceryItem>> = BTreeMap::new();
        for item in items {
            if item.user_id.as_deref() != Some(user_id) {
                continue;
            }
            let category = item
                .category
                .clone()
                .unwrap_or_else(|| "Uncategorized".to_string());
            grouped.entry(category).or_default().push(item);
        }
        grouped
    }
}

// ---------------------------------------------------------------------------
// Chat history

pub struct ChatHistoryService {
    store: Arc<dyn KeyValueStore>,
}

impl ChatHistoryService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get_history(&self, user_id: &str) -> Vec<ChatMessage> {
        let mut history: Vec<ChatMessage> =
            load_all(self.store.as_ref(), Collection::ChatHistory).await;
        history.retain(|message| message.user_id == user_id);
        history.sort_by_key(|message| message.id);
        history
    }

    pub async fn save_message(
        &self,
        user_id: &str,
        message: &str,
        response: &str,
        intent: Option<Intent>,
        recipe_id: Option<i64>,
    ) -> ChatMessage {
        let id = next_id(self.store.as_ref(), Collection::ChatHistory).await;
        let record = ChatMessage {
            id: Some(id),
            user_id: user_id.to_string(),
            message: message.to_string(),
            response: response.to_string(),
            timestamp: Utc::now(),
            intent,
            recipe_id,
        };
        store_one(
            self.store.as_ref(),
            Collection::ChatHistory,
            &id.to_string(),
            &record,
        )
        .await;
        record
    }

    pub async fn clear_history(&self, user_id: &str) -> bool {
        let history = self.get_history(user_id).await;
        for message in history {
            if let Some(id) = message.id {
                if let Err(err) = self
                    .store
                    .delete(Collection::ChatHistory, &id.to_string())
                    .await
                {
                    warn!(user_id, error = %err, "failed to clear chat history");
                    return false;
                }
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Notes

pub struct NotesService {
    store: Arc<dyn KeyValueStore>,
    inventory: InventoryService,
}

impl NotesService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inventory: InventoryService::new(store.clone()),
            store,
        }
    }

    pub async fn get_notes(&self, user_id: &str) -> Vec<Note> {
        let mut notes: Vec<Note> = load_all(self.store.as_ref(), Collection::Notes).await;
        notes.retain(|note| note.user_id == user_id);
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        notes
    }

    pub async fn save_note(&self, mut note: Note) -> Note {
        note.updated_at = Utc::now();
        let id = note.id.clone();
        store_one(self.store.as_ref(), Collection::Notes, &id, &note).await;
        note
    }

    pub async fn delete_note(&self, note_id: &str) -> bool {
        match self.store.delete(Collection::Notes, note_id).await {
            Ok(removed) => removed,
            Err(err) => {
                warn!(note_id, error = %err, "failed to delete note");
                false
            }
        }
    }

    /// Scan a note's text for item lines and merge them into inventory.
    pub async fn import_note_to_inventory(&self, note: &Note) -> Vec<InventoryItem> {
        let deltas = scan_inventory_deltas(&note.content, &note.user_id);
        if deltas.is_empty() {
            return Vec::new();
        }
        self.inventory.apply_deltas(&deltas, &note.user_id).await
    }
}

// ---------------------------------------------------------------------------
// Timers

pub struct TimerService {
    store: Arc<dyn KeyValueStore>,
}

impl TimerService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get_timers(&self, user_id: &str) -> Vec<Timer> {
        let mut timers: Vec<Timer> = load_all(self.store.as_ref(), Collection::Timers).await;
        timers.retain(|timer| timer.user_id == user_id);
        timers.sort_by_key(|timer| timer.id);
        timers
    }

    pub async fn save_timer(&self, mut timer: Timer) -> Timer {
        if timer.id == 0 {
            timer.id = next_id(self.store.as_ref(), Collection::Timers).await;
        }
        store_one(
            self.store.as_ref(),
            Collection::Timers,
            &timer.id.to_string(),
            &timer,
        )
        .await;
        timer
    }

    pub async fn delete_timer(&self, timer_id: i64) -> bool {
        match self
            .store
            .delete(Collection::Timers, &timer_id.to_string())
            .await
        {
            Ok(removed) => removed,
            Err(err) => {
                warn!(timer_id, error = %err, "failed to delete timer");
                false
            }
        }
    }

    /// Spawn and persist a timer from a timed recipe step.
    pub async fn create_from_step(
        &self,
        user_id: &str,
        recipe_title: &str,
        step: &RecipeStep,
    ) -> Option<Timer> {
        let timer = Timer::from_step(user_id, recipe_title, step)?;
        Some(self.save_timer(timer).await)
    }
}

// ---------------------------------------------------------------------------
// AI model configuration

pub struct ConfigService {
    store: Arc<dyn KeyValueStore>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get_model_config(&self) -> Option<ModelConfig> {
        load_one(self.store.as_ref(), Collection::AiConfig, MODEL_CONFIG_KEY).await
    }

    pub async fn set_model_config(&self, config: &ModelConfig) -> bool {
        store_one(self.store.as_ref(), Collection::AiConfig, MODEL_CONFIG_KEY, config).await
    }
}
