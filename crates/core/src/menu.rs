//! Menu domain types.
//!
//! A menu's total price is always derived from its items — it is recomputed
//! wherever it is needed and never cached, so it cannot go stale or disagree
//! with the item list.

use crate::ingredient::Ingredient;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The course a dish belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DishCategory {
    Main,
    Side,
    Soup,
    Dessert,
    Other,
}

impl DishCategory {
    /// Normalize a free-text category tag from generator output.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "main" | "main dish" | "entree" | "entrée" => DishCategory::Main,
            "side" | "side dish" | "banchan" => DishCategory::Side,
            "soup" | "stew" | "broth" => DishCategory::Soup,
            "dessert" | "sweet" => DishCategory::Dessert,
            _ => DishCategory::Other,
        }
    }
}

impl Default for DishCategory {
    fn default() -> Self {
        DishCategory::Other
    }
}

/// An ingredient line within a dish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// Cost of this line, in currency minor units.
    pub price: f64,
}

/// One dish on the menu.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub category: DishCategory,
    #[serde(default)]
    pub ingredients: Vec<MenuIngredient>,
    /// Dish price, in currency minor units.
    pub price: f64,
}

/// An ordered sequence of dishes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Total price — always the sum of item prices, recomputed on demand.
    pub fn total_price(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Dish names in menu order.
    pub fn dish_names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }

    /// Reprice every ingredient line from the catalog, then every item from
    /// its lines.
    ///
    /// Lines whose ingredient is known to the catalog get
    /// `unit_price × quantity` (names matched case-insensitively); unknown
    /// lines keep the price the generator supplied. Items without ingredient
    /// lines keep their supplied price.
    pub fn reprice(&mut self, catalog: &[Ingredient]) {
        let prices: HashMap<String, f64> = catalog
            .iter()
            .map(|ing| (ing.name.to_lowercase(), ing.unit_price))
            .collect();

        for item in &mut self.items {
            if item.ingredients.is_empty() {
                continue;
            }
            for line in &mut item.ingredients {
                if let Some(unit_price) = prices.get(&line.name.to_lowercase()) {
                    line.price = unit_price * line.quantity;
                }
            }
            item.price = item.ingredients.iter().map(|line| line.price).sum();
        }
    }
}
