//! Budget validation — a pure function, no side effects.
//!
//! A menu passes when its recomputed total lands in the closed interval
//! `[0.8 × budget, budget]`. The lower bound exists to reject trivially
//! cheap, presumably incomplete menus; equality at either bound passes.

use menuforge_core::{BudgetBreach, ValidationVerdict};

/// The minimum-spend floor as a fraction of the budget.
pub const MIN_SPEND_RATIO: f64 = 0.8;

/// Check a menu total against the budget window.
pub fn validate_budget(total_price: f64, budget: f64) -> ValidationVerdict {
    let floor = MIN_SPEND_RATIO * budget;

    if total_price > budget {
        ValidationVerdict {
            passed: false,
            total_price,
            budget,
            deviation: total_price - budget,
            breach: Some(BudgetBreach::OverBudget),
        }
    } else if total_price < floor {
        ValidationVerdict {
            passed: false,
            total_price,
            budget,
            deviation: floor - total_price,
            breach: Some(BudgetBreach::UnderMinimum),
        }
    } else {
        ValidationVerdict { passed: true, total_price, budget, deviation: 0.0, breach: None }
    }
}
