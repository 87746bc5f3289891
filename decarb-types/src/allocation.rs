use crate::measure::MeasureCategory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Funding granted by one source to one measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub funding_id: String,
    pub amount: Decimal,
}

/// Allocation outcome for a single measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureAllocation {
    pub measure_id: String,
    pub category: MeasureCategory,
    pub investment: Decimal,
    pub emission_reduction: Decimal,

    /// In consumption order.
    #[serde(default)]
    pub allocations: Vec<Allocation>,

    pub covered: Decimal,
    pub shortfall: Decimal,

    /// Present when the measure declares a funding hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_funding_met: Option<bool>,
}

impl MeasureAllocation {
    pub fn is_fully_covered(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Optimizer output for one company pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub schema: String,
    pub company_id: String,

    /// Name of the strategy that produced the allocation.
    pub strategy: String,

    /// In processing order.
    #[serde(default)]
    pub measures: Vec<MeasureAllocation>,

    /// Remaining budget per touched source after this pass.
    #[serde(default)]
    pub remaining_budgets: BTreeMap<String, Decimal>,
}

impl AllocationResult {
    pub fn new(company_id: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::DECARB_ALLOCATION_V1.to_string(),
            company_id: company_id.into(),
            strategy: strategy.into(),
            measures: vec![],
            remaining_budgets: BTreeMap::new(),
        }
    }

    pub fn total_allocated(&self) -> Decimal {
        self.measures.iter().map(|m| m.covered).sum()
    }

    /// Total granted per funding source across all measures.
    pub fn allocated_by_source(&self) -> BTreeMap<String, Decimal> {
        let mut out: BTreeMap<String, Decimal> = BTreeMap::new();
        for m in &self.measures {
            for a in &m.allocations {
                *out.entry(a.funding_id.clone()).or_default() += a.amount;
            }
        }
        out
    }
}
