//! # Core Data Model
//!
//! This module defines the persisted data structures shared by the assistant:
//! kitchen inventory items, recipes, grocery lists, chat history, sticky notes,
//! timers, and the AI provider configuration.
//!
//! ## Core Concepts
//!
//! - **InventoryItem**: one ingredient a user has on hand. Identity is
//!   `(user_id, ingredient_name)` compared case-insensitively; amounts are
//!   free-form strings ("2", "1.5", "to taste") and the reserved amount
//!   [`crate::amounts::REMOVAL_SENTINEL`] marks an incoming item as a deletion
//!   request rather than a quantity.
//! - **Recipe**: an ordered ingredient and step list plus descriptive metadata.
//! - **GroceryList / GroceryItem**: a shopping list whose items carry a
//!   checked-state that feeds back into inventory.
//!
//! ## Usage
//!
//! ```rust
//! use plates::models::InventoryItem;
//!
//! let eggs = InventoryItem::new("u1", "Eggs").with_amount("12").with_unit("pieces");
//! assert!(!eggs.is_removal());
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amounts::REMOVAL_SENTINEL;

/// A single ingredient in a user's kitchen inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Storage identifier, assigned on first persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Untrusted producers may omit this; reconciliation tags inserts with
    /// the requesting user.
    #[serde(default)]
    pub user_id: String,
    pub ingredient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<DateTime<Utc>>,
    /// Where the item lives, e.g. "fridge", "pantry", "freezer".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl InventoryItem {
    /// Create a new inventory item with just an owner and a name.
    pub fn new(user_id: &str, ingredient_name: &str) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            ingredient_name: ingredient_name.to_string(),
            amount: None,
            unit: None,
            category: None,
            expires_at: None,
            purchase_date: None,
            location: None,
            notes: None,
        }
    }

    pub fn with_amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// Build a deletion request for the named ingredient.
    ///
    /// The sentinel amount is a control signal, not a quantity; reconciliation
    /// treats such an item as "remove the matching entry" (see
    /// [`crate::reconciler::reconcile`]).
    pub fn removal(user_id: &str, ingredient_name: &str) -> Self {
        Self::new(user_id, ingredient_name).with_amount(REMOVAL_SENTINEL)
    }

    /// Whether this incoming item is a deletion request rather than data.
    pub fn is_removal(&self) -> bool {
        self.amount.as_deref() == Some(REMOVAL_SENTINEL)
    }

    /// Case-folded name used for identity comparison at every matching site.
    pub fn normalized_name(&self) -> String {
        self.ingredient_name.to_lowercase()
    }

    /// Case-insensitive name match against another ingredient name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.normalized_name() == name.to_lowercase()
    }
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Free-form amount string; may be numeric ("2"), a range ("2-3"), or
    /// qualitative ("to taste").
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// e.g. "chopped", "diced".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Ingredient {
    pub fn new(name: &str, amount: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: amount.to_string(),
            unit: None,
            preparation: None,
            category: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_preparation(mut self, preparation: &str) -> Self {
        self.preparation = Some(preparation.to_string());
        self
    }
}

/// Timing attached to a recipe step, used to spawn kitchen timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDuration {
    pub minutes: u32,
    pub seconds: u32,
}

impl StepDuration {
    pub fn total_seconds(&self) -> u32 {
        self.minutes * 60 + self.seconds
    }
}

/// One instruction of a recipe, ordered by `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub order: u32,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<StepDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip: Option<String>,
}

/// Recipe difficulty rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A stored recipe, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub servings: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_per_serving: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub keywords: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Recipe {
    /// Create an empty recipe shell with the given title.
    pub fn new(user_id: &str, title: &str) -> Self {
        Self {
            id: 0,
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            servings: String::new(),
            prep_time: None,
            cook_time: None,
            total_time: None,
            difficulty: None,
            calories_per_serving: None,
            ingredients: Vec::new(),
            steps: Vec::new(),
            tools: Vec::new(),
            methods: Vec::new(),
            keywords: String::new(),
            cuisine_type: None,
            meal_type: None,
            created_at: Utc::now(),
            notes: None,
            rating: None,
            source: None,
        }
    }
}

/// A shopping list owning an ordered collection of grocery items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryList {
    #[serde(default)]
    pub id: i64,
    pub user_id: String,
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<GroceryItem>,
    #[serde(default)]
    pub is_completed: bool,
}

/// One entry of a grocery list.
///
/// Checking an item is the one user action with a side effect outside the
/// list: it adds the item to inventory, and unchecking reverses that (see
/// [`crate::grocery::plan_check_toggle`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, alias = "checked")]
    pub is_checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Date the item should be purchased, if scheduled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
}

impl GroceryItem {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            list_id: None,
            user_id: None,
            name: name.to_string(),
            amount: None,
            unit: None,
            category: None,
            is_checked: false,
            notes: None,
            scheduled_date: None,
        }
    }
}

/// One round of conversation: the user's message and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: String,
    pub message: String,
    pub response: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Reference to a recipe if the reply produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<i64>,
}

/// Screen position of a sticky note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePosition {
    pub x: f64,
    pub y: f64,
}

/// A free-text sticky note. Note text can be scanned for inventory deltas
/// (see [`crate::text_processing::scan_inventory_deltas`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub position: NotePosition,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// A kitchen timer, usually spawned from a timed recipe step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    #[serde(default)]
    pub id: i64,
    pub user_id: String,
    pub label: String,
    pub duration_secs: u32,
    pub remaining_secs: u32,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Timer {
    /// Build a timer from a timed recipe step, or `None` when the step
    /// carries no usable duration.
    pub fn from_step(user_id: &str, recipe_title: &str, step: &RecipeStep) -> Option<Self> {
        let duration = step.duration?;
        let total = duration.total_seconds();
        if total == 0 {
            return None;
        }

        let label = step.timer_label.clone().unwrap_or_else(|| {
            let mut instruction: String = step.instruction.chars().take(30).collect();
            if step.instruction.chars().count() > 30 {
                instruction.push_str("...");
            }
            format!("{}: {}", recipe_title, instruction)
        });

        Some(Self {
            id: 0,
            user_id: user_id.to_string(),
            label,
            duration_secs: total,
            remaining_secs: total,
            is_running: false,
            is_completed: false,
            created_at: Utc::now(),
        })
    }
}

/// A registered user of the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
}

/// Per-user display and dietary preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<ModelConfig>,
}

/// Which backend answers classification requests.
///
/// Only the network call varies between providers, so provider selection is a
/// plain tag dispatched through [`crate::ai::provider_for`] rather than an
/// inheritance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Gemini with the API key taken from the environment.
    Default,
    Gemini,
    OpenAi,
    Claude,
    Mock,
}

/// How recipe availability is checked: by asking the AI or by direct
/// comparison against the stored inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientCheckMethod {
    Ai,
    Direct,
}

/// Runtime configuration for the AI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "type")]
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model: String,
    #[serde(default = "default_check_method")]
    pub ingredient_check_method: IngredientCheckMethod,
}

fn default_check_method() -> IngredientCheckMethod {
    IngredientCheckMethod::Ai
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Default,
            api_key: String::new(),
            temperature: 0.7,
            max_tokens: 4096,
            model: "gemini-1.5-flash".to_string(),
            ingredient_check_method: IngredientCheckMethod::Ai,
        }
    }
}

/// Request intent tags produced by the classification provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SearchRecipe,
    SaveRecipe,
    SaveInventory,
    RemoveInventory,
    SearchWithInventory,
    CreateGroceryList,
    CookingQuestion,
    UnitConversion,
    OutOfTopic,
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::SearchRecipe => "search_recipe",
            Intent::SaveRecipe => "save_recipe",
            Intent::SaveInventory => "save_inventory",
            Intent::RemoveInventory => "remove_inventory",
            Intent::SearchWithInventory => "search_with_inventory",
            Intent::CreateGroceryList => "create_grocery_list",
            Intent::CookingQuestion => "cooking_question",
            Intent::UnitConversion => "unit_conversion",
            Intent::OutOfTopic => "out_of_topic",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result returned by a classification provider.
///
/// Everything beyond `intent` and `ai_response` is optional payload; the
/// provider is an untrusted producer and every invariant of the reconciler
/// applies to whatever it returns, including the removal sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    pub intent: Intent,
    pub ai_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grocery_list: Option<GroceryList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_items: Option<Vec<InventoryItem>>,
}

impl AiResponse {
    /// A bare conversational reply with no structured payload.
    pub fn text(intent: Intent, message: impl Into<String>) -> Self {
        Self {
            intent,
            ai_response: message.into(),
            recipe: None,
            grocery_list: None,
            inventory_items: None,
        }
    }

    /// The degraded reply used whenever a provider fails: `unknown` intent
    /// plus an apologetic message, never an error.
    pub fn fallback(message: impl Into<String>) -> Self {
        Self::text(Intent::Unknown, message)
    }
}

/// Extra context shipped with a chat request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<InventoryItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_recipes: Option<Vec<Recipe>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<UserPreferences>,
}

/// A free-text message headed for the classification provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<ModelConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ChatContext>,
}

impl ChatRequest {
    pub fn new(user_id: &str, message: &str) -> Self {
        Self {
            message: message.to_string(),
            user_id: user_id.to_string(),
            model_config: None,
            context: None,
        }
    }

    /// Append an inventory snapshot to the message so the provider can reason
    /// about what the user has on hand.
    pub fn with_inventory(mut self, inventory: &[InventoryItem]) -> Self {
        let snapshot: Vec<serde_json::Value> = inventory
            .iter()
            .map(|item| {
                serde_json::json!({
                    "name": item.ingredient_name,
                    "amount": item.amount,
                    "unit": item.unit,
                })
            })
            .collect();
        self.message = format!(
            "{}. My Inventory: {}",
            self.message,
            serde_json::Value::Array(snapshot)
        );
        self
    }
}

/// Result of the free-text recipe parser, with a confidence score in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeParseOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<Recipe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub confidence: f32,
}
