use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The persisted-shape plan for one company, handed to external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub schema: String,

    /// Deterministic id derived from the plan content.
    pub plan_id: String,

    pub company_id: String,

    /// Unique measure ids, in processing order.
    #[serde(default)]
    pub selected_measures: Vec<String>,

    /// Unique funding ids with a non-zero allocation, ascending.
    #[serde(default)]
    pub selected_funding: Vec<String>,

    pub total_reduction: Decimal,
    pub total_investment: Decimal,
    pub total_funding: Decimal,
    pub total_shortfall: Decimal,

    /// `total_funding / total_investment`, 0 when nothing is invested.
    pub coverage_ratio: Decimal,

    pub created_at: DateTime<Utc>,
}

impl ActionPlan {
    pub fn is_fully_funded(&self) -> bool {
        self.total_shortfall.is_zero()
    }
}
