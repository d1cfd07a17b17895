//! # Ingredient Category Classifier
//!
//! Keyword-based mapping from an ingredient name to a store-aisle category,
//! used by the inventory and grocery components for display grouping.

/// Ordered category table. Order is significant for overlapping keywords:
/// "vegetable" appears under both Produce and Frozen, and Produce wins
/// because it is checked first.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Produce",
        &[
            "apple", "banana", "lettuce", "tomato", "onion", "garlic", "potato", "carrot",
            "pepper", "vegetable", "fruit", "herb", "lemon", "lime", "orange", "berry",
            "berries", "greens",
        ],
    ),
    (
        "Meat",
        &[
            "beef", "chicken", "pork", "lamb", "turkey", "sausage", "bacon", "ham", "steak",
            "ground", "meat",
        ],
    ),
    (
        "Seafood",
        &[
            "fish", "salmon", "tuna", "shrimp", "crab", "lobster", "clam", "mussel", "oyster",
            "seafood",
        ],
    ),
    (
        "Dairy",
        &[
            "milk", "cheese", "yogurt", "butter", "cream", "sour cream", "ice cream", "dairy",
        ],
    ),
    (
        "Bakery",
        &[
            "bread", "roll", "bun", "bagel", "pastry", "cake", "cookie", "pie", "bakery",
        ],
    ),
    (
        "Pantry",
        &[
            "flour", "sugar", "salt", "pepper", "spice", "oil", "vinegar", "sauce", "can",
            "pasta", "rice", "bean", "lentil", "grain", "cereal", "condiment",
        ],
    ),
    ("Frozen", &["frozen", "ice cream", "pizza", "vegetable"]),
    (
        "Beverages",
        &[
            "water", "juice", "soda", "coffee", "tea", "drink", "beverage", "wine", "beer",
            "alcohol",
        ],
    ),
];

/// Category used when no keyword matches.
pub const OTHER: &str = "Other";

/// Guess the store category for an ingredient name.
///
/// Matching is a case-folded substring test; the first category with a
/// matching keyword wins.
pub fn classify(ingredient_name: &str) -> &'static str {
    let name = ingredient_name.to_lowercase();
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| name.contains(keyword)) {
            return category;
        }
    }
    OTHER
}
