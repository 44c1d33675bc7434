//! Prompt contracts for the LLM-backed stages.
//!
//! Each prompt demands a single JSON object; the matching parser in the
//! stage rejects anything else. Prompts are built deterministically from
//! their inputs so identical requests produce identical payloads.

use menuforge_core::{AdjustInputs, ComposeInputs, Ingredient, Intent};

/// Intent extraction contract.
pub fn parse_intent_prompt(query: &str) -> String {
    format!(
        r#"Extract the user's intent from the request below, using **only information that is explicitly stated**.

- budget: total budget as a number (interpret shorthand like "200k" as 200000); null when no budget is mentioned
- num_people: number of people; 1 when not mentioned
- cuisine: the cuisine asked for (e.g. "Korean", "Vietnamese"); null when not mentioned
- preferences: things the user wants to eat or avoid, verbatim; [] when none
- meal_type: one of "breakfast", "lunch", "dinner", "snack", "any"

Reply with a single JSON object, no other text:
{{
    "budget": number_or_null,
    "num_people": number,
    "cuisine": string_or_null,
    "preferences": ["..."],
    "meal_type": "..."
}}

User request: {query}"#
    )
}

/// Ingredient filter-spec contract.
pub fn filter_spec_prompt(intent: &Intent) -> String {
    format!(
        r#"Build an ingredient filter for this meal request:

- budget: {budget}
- meal type: {meal_type}
- people: {people}
- preferences: {preferences:?}

Rules:
- set max_unit_price so single ingredients cannot eat the whole budget
- exclude the "spice" category (seasonings are assumed available)
- if preferences ask for an ingredient, add it to name_contains
- if preferences avoid an ingredient, add it to name_excludes
- if preferences say vegetarian, exclude meat and seafood names

Reply with a single JSON object, no other text:
{{
    "max_unit_price": number_or_null,
    "include_categories": ["..."],
    "exclude_categories": ["..."],
    "name_contains": ["..."],
    "name_excludes": ["..."]
}}"#,
        budget = intent.budget,
        meal_type = intent.meal_type,
        people = intent.people,
        preferences = intent.preferences,
    )
}

/// Menu generation contract.
pub fn generate_menu_prompt(inputs: &ComposeInputs<'_>) -> String {
    let intent = inputs.intent;
    format!(
        r#"Compose a menu from the available ingredients, suited to the request below.

Only use ingredients from the available list. Do not invent ingredients.

Principles:
- {budget_context}
- prefer fresh ingredients over near-expiry ones
- honor the user's preferences
- vary the dishes; avoid repeating the dish history

Meal:
- meal type: {meal_type}
- people: {people}
- preferences: {preferences:?}

Available ingredients:
{ingredients}

{previous_dishes}Pairing notes:
{knowledge}

Reply with a single JSON object, no other text:
{{
    "items": [
        {{
            "name": "Dish name",
            "category": "main|side|soup|dessert|other",
            "ingredients": [
                {{"name": "ingredient", "quantity": number, "unit": "g", "price": number}}
            ],
            "price": number
        }}
    ]
}}"#,
        budget_context = budget_context(intent),
        meal_type = intent.meal_type,
        people = intent.people,
        preferences = intent.preferences,
        ingredients = format_ingredients(inputs.ingredients),
        previous_dishes = format_previous_dishes(inputs.previous_dishes),
        knowledge = format_knowledge(inputs.knowledge),
    )
}

/// Menu adjustment contract.
pub fn adjust_menu_prompt(inputs: &AdjustInputs<'_>) -> String {
    let verdict = inputs.verdict;
    let direction = match verdict.breach {
        Some(menuforge_core::BudgetBreach::OverBudget) => format!(
            "The menu total ({total:.0}) exceeds the budget ({budget:.0}) by {deviation:.0}. \
             Remove or substitute expensive items to bring the total under the budget.",
            total = verdict.total_price,
            budget = verdict.budget,
            deviation = verdict.deviation,
        ),
        _ => format!(
            "The menu total ({total:.0}) is {deviation:.0} below the minimum spend \
             ({floor:.0}, 80% of the {budget:.0} budget) and likely incomplete. \
             Add or upgrade dishes to reach the minimum.",
            total = verdict.total_price,
            deviation = verdict.deviation,
            floor = verdict.budget * crate::validate::MIN_SPEND_RATIO,
            budget = verdict.budget,
        ),
    };

    format!(
        r#"Repair this menu so it fits the budget window.

{direction}

Current menu:
{menu}

Available ingredients:
{ingredients}

Keep dishes that already work. Only use ingredients from the available list.

Reply with a single JSON object in the same shape as the current menu, no other text."#,
        menu = serde_json::to_string_pretty(inputs.menu).unwrap_or_default(),
        ingredients = format_ingredients(inputs.ingredients),
    )
}

fn budget_context(intent: &Intent) -> String {
    if intent.budget_specified {
        format!(
            "the user asked for a budget of {budget:.0}; land the total between {floor:.0} and {budget:.0}",
            budget = intent.budget,
            floor = intent.budget * crate::validate::MIN_SPEND_RATIO,
        )
    } else {
        format!(
            "the user named no budget; assume a typical spend of about {budget:.0} for {people} people and do not exceed it",
            budget = intent.budget,
            people = intent.people,
        )
    }
}

fn format_ingredients(ingredients: &[Ingredient]) -> String {
    if ingredients.is_empty() {
        return "- (none in stock — compose the best menu you can and keep it simple)".into();
    }
    ingredients
        .iter()
        .map(|ing| {
            format!(
                "- {}: {} {} in stock ({}, price per {}: {})",
                ing.name,
                ing.quantity,
                ing.unit,
                ing.freshness.as_str(),
                ing.unit,
                ing.unit_price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_knowledge(knowledge: &[String]) -> String {
    if knowledge.is_empty() {
        return "(no pairing notes available — use your judgment)".into();
    }
    knowledge.join("\n\n")
}

fn format_previous_dishes(previous: &[String]) -> String {
    if previous.is_empty() {
        return String::new();
    }
    format!(
        "Dish history (do NOT repeat these): {}\n\n",
        previous.join(", ")
    )
}
