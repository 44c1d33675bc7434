//! Budget validation verdict types.

use serde::{Deserialize, Serialize};

/// Which side of the budget window a failing menu landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetBreach {
    /// Total price exceeds the budget.
    OverBudget,
    /// Total price is below the minimum-spend floor.
    UnderMinimum,
}

impl BudgetBreach {
    pub fn code(self) -> &'static str {
        match self {
            BudgetBreach::OverBudget => "over_budget",
            BudgetBreach::UnderMinimum => "under_minimum",
        }
    }
}

/// The outcome of checking a menu total against a budget window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub passed: bool,

    /// The recomputed menu total that was checked.
    pub total_price: f64,

    /// The budget the window was derived from.
    pub budget: f64,

    /// Distance from the nearest window bound; 0.0 when passing.
    pub deviation: f64,

    /// Set when failing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breach: Option<BudgetBreach>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breach_codes_are_stable() {
        assert_eq!(BudgetBreach::OverBudget.code(), "over_budget");
        assert_eq!(BudgetBreach::UnderMinimum.code(), "under_minimum");
    }

    #[test]
    fn passing_verdict_serializes_without_breach() {
        let verdict = ValidationVerdict {
            passed: true,
            total_price: 180_000.0,
            budget: 200_000.0,
            deviation: 0.0,
            breach: None,
        };
        let json = serde_json::to_string(&verdict).unwrap();
        assert!(!json.contains("breach"));
    }
}
