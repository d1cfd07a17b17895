//! # Free-Text Recipe Parser
//!
//! Best-effort extraction of a structured [`Recipe`] from unstructured text,
//! used as the fallback when no AI provider is available or the provider
//! returned prose instead of structure.
//!
//! The parser works line by line: locate a title, split the text into
//! ingredient and instruction sections, run each ingredient line through a
//! small cascade of patterns, and scan the steps for timings, tools, and
//! methods. The result carries a confidence score; parsing is declared
//! successful when confidence exceeds 0.5.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::models::{
    Difficulty, Ingredient, Recipe, RecipeParseOutcome, RecipeStep, StepDuration,
};

const DEFAULT_TITLE: &str = "Untitled Recipe";
const DEFAULT_DESCRIPTION: &str = "A delicious recipe";

/// Confidence contribution of each recipe section.
const WEIGHT_TITLE: f32 = 0.2;
const WEIGHT_DESCRIPTION: f32 = 0.1;
const WEIGHT_INGREDIENTS: f32 = 0.3;
const WEIGHT_STEPS: f32 = 0.3;
const WEIGHT_TOOLS: f32 = 0.05;
const WEIGHT_METHODS: f32 = 0.05;

lazy_static! {
    static ref TITLE_LINE: Regex = Regex::new(r"(?i)recipe(\s+for)?|title").unwrap();
    static ref TITLE_PREFIX: Regex = Regex::new(r"(?i)recipe(\s+for)?:?|title:").unwrap();
    static ref NUMBERED_STEP: Regex = Regex::new(r"^\s*\d+[.)]\s+").unwrap();
    static ref STEP_WORD: Regex = Regex::new(r"(?i)^\s*step\s+\d+").unwrap();
    static ref STEP_WORD_PREFIX: Regex = Regex::new(r"(?i)^\s*step\s+\d+[:.)]\s*").unwrap();
    static ref INGREDIENT_HEADER: Regex = Regex::new(r"(?i)ingredient|you need|you'll need").unwrap();
    static ref INSTRUCTION_HEADER: Regex =
        Regex::new(r"(?i)instruction|direction|method|preparation|steps").unwrap();
    static ref MEASUREMENT_LINE: Regex =
        Regex::new(r"(?i)\d+\s+(cup|tablespoon|teaspoon|pound|ounce|gram|ml|g|oz|lb|tbsp|tsp)")
            .unwrap();
    static ref SERVINGS_LINE: Regex = Regex::new(r"(?i)serv(ing|es)|yield|make|portion").unwrap();
    static ref SERVINGS_COUNT: Regex =
        Regex::new(r"(?i)(\d+[-\d]*)\s*(serv(ing|es)|portion)").unwrap();
    static ref PREP_TIME_LINE: Regex = Regex::new(r"(?i)prep(aration)?\s+time").unwrap();
    static ref COOK_TIME_LINE: Regex = Regex::new(r"(?i)cook(ing)?\s+time").unwrap();
    static ref TOTAL_TIME_LINE: Regex = Regex::new(r"(?i)total\s+time").unwrap();
    static ref TIME_VALUE: Regex = Regex::new(r"(?i)(\d+)\s*(minute|hour|min|hr)").unwrap();
    static ref STEP_DURATION: Regex =
        Regex::new(r"(?i)(\d+)(?:-(\d+))?\s*(minute|hour|min|hr)").unwrap();
    static ref BULLET: Regex = Regex::new(r"^\s*[-•*]\s*").unwrap();
    static ref BULLET_LINE: Regex = Regex::new(r"^\s*[-•*]").unwrap();
    static ref OF_PATTERN: Regex = Regex::new(r"(?i)^\s*\d+[\d/.\s]*\s+[a-zA-Z]+\s+of\s+").unwrap();
    static ref TO_TASTE_LINE: Regex = Regex::new(r"(?i)^\s*[a-zA-Z]+\s+to\s+taste").unwrap();
    // Amount + unit + name, with an optional comma-separated preparation.
    static ref AMOUNT_UNIT_NAME: Regex =
        Regex::new(r"(?i)^(\d+[\d/.\s]*)\s+([a-zA-Z]+)\s+(.+?)(?:\s*,\s*(.+))?$").unwrap();
    static ref AMOUNT_NAME: Regex =
        Regex::new(r"(?i)^(\d+[\d/.\s]*)\s+(.+?)(?:\s*,\s*(.+))?$").unwrap();
    static ref NAME_TO_TASTE: Regex = Regex::new(r"(?i)^(.+)\s+to\s+taste$").unwrap();
    static ref TOOL_PATTERNS: Vec<(&'static str, Regex)> = COMMON_TOOLS
        .iter()
        .map(|tool| (*tool, Regex::new(&format!(r"(?i)\b{}\b", tool)).unwrap()))
        .collect();
    static ref METHOD_PATTERNS: Vec<(&'static str, Regex)> = COMMON_METHODS
        .iter()
        .map(|method| (*method, Regex::new(&format!(r"(?i)\b{}\w*\b", method)).unwrap()))
        .collect();
}

const COMMON_TOOLS: &[&str] = &[
    "pan", "pot", "bowl", "knife", "cutting board", "spoon", "fork", "whisk", "blender",
    "food processor", "mixer", "oven", "stove", "grill", "microwave", "baking sheet",
    "baking dish", "skillet", "spatula", "tongs", "colander", "strainer", "measuring cup",
    "measuring spoon", "thermometer",
];

const COMMON_METHODS: &[&str] = &[
    "bake", "boil", "broil", "fry", "grill", "poach", "roast", "sauté", "simmer", "steam",
    "stir-fry", "toast", "whip", "blend", "chop", "dice", "mince", "slice", "mix", "stir",
    "whisk", "knead", "marinate", "braise", "caramelize",
];

/// Parse unstructured recipe text into a structured recipe with a confidence
/// score. Never fails hard: pathological input produces a low-confidence,
/// unsuccessful outcome instead of an error.
pub fn parse_recipe_text(text: &str, user_id: &str) -> RecipeParseOutcome {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return RecipeParseOutcome {
            success: false,
            recipe: None,
            error: Some("No recipe content found".to_string()),
            confidence: 0.0,
        };
    }

    let (title, title_index) = extract_title(&lines);
    let description = extract_description(&lines, title_index);
    let servings = extract_servings(&lines);
    let prep_time = extract_time(&lines, &PREP_TIME_LINE);
    let cook_time = extract_time(&lines, &COOK_TIME_LINE);
    let total_time = extract_time(&lines, &TOTAL_TIME_LINE);

    let ingredient_section = lines.iter().position(|line| {
        INGREDIENT_HEADER.is_match(line)
            && !line.to_lowercase().contains("instruction")
            && !line.to_lowercase().contains("direction")
    });
    let instruction_section = lines.iter().position(|line| {
        INSTRUCTION_HEADER.is_match(line) && !line.to_lowercase().contains("ingredient")
    });

    let ingredient_lines = collect_ingredient_lines(&lines, ingredient_section, instruction_section);
    let ingredients: Vec<Ingredient> = ingredient_lines.iter().map(|l| parse_ingredient_line(l)).collect();

    let step_lines = collect_step_lines(&lines, instruction_section, &ingredient_lines);
    let steps: Vec<RecipeStep> = step_lines
        .iter()
        .enumerate()
        .map(|(index, line)| parse_step_line(line, index as u32 + 1))
        .collect();

    let (tools, methods) = scan_tools_and_methods(&steps);
    let keywords = build_keywords(&ingredients, &methods);
    let difficulty = rate_difficulty(&steps, &ingredients);

    let mut recipe = Recipe::new(user_id, if title.is_empty() { DEFAULT_TITLE } else { &title });
    recipe.description = if description.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        description
    };
    recipe.servings = servings;
    recipe.prep_time = prep_time;
    recipe.cook_time = cook_time;
    recipe.total_time = total_time;
    recipe.difficulty = Some(difficulty);
    recipe.ingredients = ingredients;
    recipe.steps = steps;
    recipe.tools = tools;
    recipe.methods = methods;
    recipe.keywords = keywords;

    let confidence = score_confidence(&recipe);
    debug!(
        "parsed recipe {:?}: {} ingredients, {} steps, confidence {:.2}",
        recipe.title,
        recipe.ingredients.len(),
        recipe.steps.len(),
        confidence
    );

    RecipeParseOutcome {
        success: confidence > 0.5,
        recipe: Some(recipe),
        error: None,
        confidence,
    }
}

/// Title extraction strategies, in order: a line naming a recipe or title,
/// a short first line, then any short line near the top.
fn extract_title(lines: &[&str]) -> (String, usize) {
    if let Some(index) = lines.iter().position(|line| TITLE_LINE.is_match(line)) {
        let title = TITLE_PREFIX.replace(lines[index], "").trim().to_string();
        return (title, index);
    }
    if lines[0].len() < 60 {
        return (lines[0].to_string(), 0);
    }
    if let Some(index) = lines.iter().take(3).position(|line| line.len() < 60) {
        return (lines[index].to_string(), index);
    }
    (String::new(), 0)
}

/// A few lines after the title that read like prose rather than
/// ingredients or steps.
fn extract_description(lines: &[&str], title_index: usize) -> String {
    let start = (title_index + 1).min(lines.len());
    let end = (title_index + 5).min(lines.len());
    lines[start..end]
        .iter()
        .filter(|line| {
            !NUMBERED_STEP.is_match(line)
                && !INGREDIENT_HEADER.is_match(line)
                && !MEASUREMENT_LINE.is_match(line)
        })
        .copied()
        .collect::<Vec<&str>>()
        .join(" ")
        .trim()
        .to_string()
}

fn extract_servings(lines: &[&str]) -> String {
    let candidate = lines
        .iter()
        .find(|line| SERVINGS_LINE.is_match(line) && line.chars().any(|c| c.is_ascii_digit()));
    if let Some(line) = candidate {
        if let Some(captures) = SERVINGS_COUNT.captures(line) {
            return format!("{} servings", &captures[1]);
        }
    }
    "4 servings".to_string()
}

fn extract_time(lines: &[&str], header: &Regex) -> Option<String> {
    let line = lines.iter().find(|line| header.is_match(line))?;
    let captures = TIME_VALUE.captures(line)?;
    let value = &captures[1];
    let unit = &captures[2];
    let plural = if value != "1" { "s" } else { "" };
    Some(format!("{} {}{}", value, unit.to_lowercase(), plural))
}

fn collect_ingredient_lines<'a>(
    lines: &[&'a str],
    ingredient_section: Option<usize>,
    instruction_section: Option<usize>,
) -> Vec<&'a str> {
    match ingredient_section {
        Some(start) => {
            let end = instruction_section.unwrap_or(lines.len());
            if start + 1 >= end {
                Vec::new()
            } else {
                lines[start + 1..end].to_vec()
            }
        }
        // No header: fall back to recognizing ingredient-shaped lines.
        None => lines
            .iter()
            .filter(|line| {
                BULLET_LINE.is_match(line)
                    || MEASUREMENT_LINE.is_match(line)
                    || OF_PATTERN.is_match(line)
                    || TO_TASTE_LINE.is_match(line)
            })
            .copied()
            .collect(),
    }
}

/// Parse one ingredient line through the pattern cascade.
fn parse_ingredient_line(line: &str) -> Ingredient {
    let line = BULLET.replace(line, "").trim().to_string();

    if let Some(captures) = AMOUNT_UNIT_NAME.captures(&line) {
        let mut ingredient =
            Ingredient::new(captures[3].trim(), captures[1].trim()).with_unit(captures[2].trim());
        if let Some(preparation) = captures.get(4) {
            ingredient = ingredient.with_preparation(preparation.as_str().trim());
        }
        return ingredient;
    }

    if let Some(captures) = AMOUNT_NAME.captures(&line) {
        let mut ingredient = Ingredient::new(captures[2].trim(), captures[1].trim());
        if let Some(preparation) = captures.get(3) {
            ingredient = ingredient.with_preparation(preparation.as_str().trim());
        }
        return ingredient;
    }

    if let Some(captures) = NAME_TO_TASTE.captures(&line) {
        return Ingredient::new(captures[1].trim(), "to taste");
    }

    Ingredient::new(line.trim(), "as needed")
}

fn collect_step_lines<'a>(
    lines: &[&'a str],
    instruction_section: Option<usize>,
    ingredient_lines: &[&'a str],
) -> Vec<&'a str> {
    if let Some(start) = instruction_section {
        return lines[(start + 1).min(lines.len())..].to_vec();
    }

    let numbered: Vec<&str> = lines
        .iter()
        .filter(|line| NUMBERED_STEP.is_match(line) || STEP_WORD.is_match(line))
        .copied()
        .collect();
    if !numbered.is_empty() {
        return numbered;
    }

    // Last resort: long prose lines after the final ingredient line.
    if let Some(last_ingredient) = ingredient_lines.last() {
        if let Some(index) = lines.iter().position(|line| line == last_ingredient) {
            return lines[index + 1..]
                .iter()
                .filter(|line| line.trim().len() > 20)
                .copied()
                .collect();
        }
    }
    Vec::new()
}

fn parse_step_line(line: &str, order: u32) -> RecipeStep {
    let instruction = NUMBERED_STEP.replace(line, "");
    let instruction = STEP_WORD_PREFIX.replace(&instruction, "").trim().to_string();

    let duration = STEP_DURATION.captures(&instruction).and_then(|captures| {
        let low: u32 = captures[1].parse().ok()?;
        let minutes = match captures.get(2) {
            // Ranges like "10-12 minutes" use the midpoint.
            Some(high) => (low + high.as_str().parse::<u32>().ok()?) / 2,
            None => low,
        };
        let is_hours = captures[3].to_lowercase().starts_with('h');
        Some(StepDuration {
            minutes: if is_hours { minutes * 60 } else { minutes },
            seconds: 0,
        })
    });

    RecipeStep {
        order,
        instruction,
        duration,
        timer_label: None,
        tip: None,
    }
}

fn scan_tools_and_methods(steps: &[RecipeStep]) -> (Vec<String>, Vec<String>) {
    let mut tools: Vec<String> = Vec::new();
    let mut methods: Vec<String> = Vec::new();

    for step in steps {
        for (tool, pattern) in TOOL_PATTERNS.iter() {
            if pattern.is_match(&step.instruction) && !tools.iter().any(|t| t == tool) {
                tools.push(tool.to_string());
            }
        }
        for (method, pattern) in METHOD_PATTERNS.iter() {
            if pattern.is_match(&step.instruction) && !methods.iter().any(|m| m == method) {
                methods.push(method.to_string());
            }
        }
    }

    (tools, methods)
}

/// Main ingredients plus main methods, for searchability.
fn build_keywords(ingredients: &[Ingredient], methods: &[String]) -> String {
    let mut keywords: Vec<String> = ingredients
        .iter()
        .take(5)
        .filter_map(|ingredient| {
            let name = ingredient
                .name
                .split(',')
                .next()
                .unwrap_or("")
                .trim()
                .to_lowercase();
            (name.len() > 2).then_some(name)
        })
        .collect();
    keywords.extend(methods.iter().take(3).cloned());
    keywords.join(", ")
}

fn rate_difficulty(steps: &[RecipeStep], ingredients: &[Ingredient]) -> Difficulty {
    if steps.len() <= 5 && ingredients.len() <= 7 {
        Difficulty::Easy
    } else if steps.len() > 10 || ingredients.len() > 12 {
        Difficulty::Hard
    } else {
        Difficulty::Medium
    }
}

fn score_confidence(recipe: &Recipe) -> f32 {
    let has_title = !recipe.title.is_empty() && recipe.title != DEFAULT_TITLE;
    let has_description = !recipe.description.is_empty() && recipe.description != DEFAULT_DESCRIPTION;

    (if has_title { WEIGHT_TITLE } else { 0.0 })
        + (if has_description { WEIGHT_DESCRIPTION } else { 0.0 })
        + (if recipe.ingredients.is_empty() { 0.0 } else { WEIGHT_INGREDIENTS })
        + (if recipe.steps.is_empty() { 0.0 } else { WEIGHT_STEPS })
        + (if recipe.tools.is_empty() { 0.0 } else { WEIGHT_TOOLS })
        + (if recipe.methods.is_empty() { 0.0 } else { WEIGHT_METHODS })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Recipe for Garlic Butter Pasta
A quick weeknight pasta with plenty of garlic.
Serves 4 servings
Prep time: 10 minutes
Cook time: 15 minutes

Ingredients:
- 1 pound spaghetti
- 4 tablespoons butter
- 6 cloves garlic, minced
- Salt to taste

Instructions:
1. Boil the spaghetti in a large pot for 9 minutes.
2. Melt the butter in a skillet and sauté the garlic for 2 minutes.
3. Toss the pasta with the garlic butter and season.";

    #[test]
    fn test_full_recipe_parses_successfully() {
        let outcome = parse_recipe_text(SAMPLE, "u1");
        assert!(outcome.success);
        assert!(outcome.confidence > 0.9);

        let recipe = outcome.recipe.unwrap();
        assert_eq!(recipe.title, "Garlic Butter Pasta");
        assert_eq!(recipe.servings, "4 servings");
        assert_eq!(recipe.prep_time.as_deref(), Some("10 minutes"));
        assert_eq!(recipe.cook_time.as_deref(), Some("15 minutes"));
        assert_eq!(recipe.ingredients.len(), 4);
        assert_eq!(recipe.steps.len(), 3);
    }

    #[test]
    fn test_ingredient_patterns() {
        let full = parse_ingredient_line("6 cloves garlic, minced");
        assert_eq!(full.name, "garlic");
        assert_eq!(full.amount, "6");
        assert_eq!(full.unit.as_deref(), Some("cloves"));
        assert_eq!(full.preparation.as_deref(), Some("minced"));

        let to_taste = parse_ingredient_line("Salt to taste");
        assert_eq!(to_taste.name, "Salt");
        assert_eq!(to_taste.amount, "to taste");

        let bare = parse_ingredient_line("fresh basil leaves");
        assert_eq!(bare.amount, "as needed");
    }

    #[test]
    fn test_step_duration_extraction() {
        let step = parse_step_line("2. Simmer for 10-12 minutes until thick.", 1);
        assert_eq!(step.duration, Some(StepDuration { minutes: 11, seconds: 0 }));
        assert!(step.instruction.starts_with("Simmer"));

        let hours = parse_step_line("Step 3: Braise for 2 hours.", 3);
        assert_eq!(hours.duration, Some(StepDuration { minutes: 120, seconds: 0 }));
    }

    #[test]
    fn test_tools_and_methods_detected() {
        let outcome = parse_recipe_text(SAMPLE, "u1");
        let recipe = outcome.recipe.unwrap();
        assert!(recipe.tools.iter().any(|t| t == "pot"));
        assert!(recipe.tools.iter().any(|t| t == "skillet"));
        assert!(recipe.methods.iter().any(|m| m == "boil"));
    }

    #[test]
    fn test_confidence_below_threshold_fails() {
        let outcome = parse_recipe_text("hello there\ngeneral conversation text", "u1");
        assert!(!outcome.success);
        assert!(outcome.confidence <= 0.5);
    }

    #[test]
    fn test_empty_text_is_not_an_error() {
        let outcome = parse_recipe_text("  \n  ", "u1");
        assert!(!outcome.success);
        assert_eq!(outcome.confidence, 0.0);
        assert!(outcome.recipe.is_none());
    }

    #[test]
    fn test_difficulty_heuristic() {
        assert_eq!(rate_difficulty(&[], &[]), Difficulty::Easy);

        let many_steps: Vec<RecipeStep> = (0..11)
            .map(|i| parse_step_line("Stir well.", i))
            .collect();
        assert_eq!(rate_difficulty(&many_steps, &[]), Difficulty::Hard);
    }
}
