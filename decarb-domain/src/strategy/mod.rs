//! Allocation strategies.
//!
//! A strategy decides how much each candidate source grants each selected measure. It reads and
//! debits budgets only through the [`BudgetTransaction`] it is handed, so it can never commit
//! anything on its own.

mod greedy;

pub use greedy::{GreedyCoverage, compare_sources};

use crate::error::InvariantViolation;
use crate::ledger::BudgetTransaction;
use decarb_types::allocation::MeasureAllocation;
use decarb_types::eligibility::FundingCandidates;
use decarb_types::measure::Measure;

/// Everything a strategy needs for one company pass.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest<'a> {
    pub company_id: &'a str,
    pub measures: &'a [Measure],
    pub candidates: &'a FundingCandidates,
}

pub trait AllocationStrategy: Send + Sync {
    /// Stable name, recorded in the allocation result.
    fn name(&self) -> &'static str;

    /// Allocate funding to every measure of the request, in processing order.
    fn allocate(
        &self,
        request: &AllocationRequest<'_>,
        txn: &mut BudgetTransaction<'_>,
    ) -> Result<Vec<MeasureAllocation>, InvariantViolation>;
}

pub fn default_strategy() -> Box<dyn AllocationStrategy> {
    Box::new(GreedyCoverage)
}
