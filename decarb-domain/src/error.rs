//! Error types for decarb-domain.
//!
//! Recoverable outcomes (blocked measures, shortfalls, excluded catalog entries) are data, not
//! errors. What remains here is:
//! - caller misuse (exit code 2): invalid profiles, unknown or inapplicable measure selections
//! - defects (exit code 1): an allocation or plan that breaks the engine's own invariants

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A mandatory profile field is missing or malformed.
    #[error("invalid profile '{company_id}': {reason}")]
    InvalidProfile { company_id: String, reason: String },

    /// The selection names a measure the catalog does not contain.
    #[error("unknown measure '{measure_id}'")]
    UnknownMeasure { measure_id: String },

    /// The selection names a measure that is blocked or excluded for this company.
    #[error("measure '{measure_id}' is not applicable to '{company_id}': {reason}")]
    MeasureNotApplicable {
        company_id: String,
        measure_id: String,
        reason: String,
    },

    /// The engine broke one of its own guarantees.
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

impl DomainError {
    /// Defects are bugs in the engine, never a consequence of the input data.
    pub fn is_defect(&self) -> bool {
        matches!(self, DomainError::InvariantViolation(_))
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_defect() { 1 } else { 2 }
    }
}

/// Allocation and aggregation guarantees. None of these may ever surface with a correct
/// implementation; they are reported, never clamped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("allocation to '{measure_id}' from '{funding_id}' is not positive ({amount})")]
    NonPositiveAllocation {
        measure_id: String,
        funding_id: String,
        amount: Decimal,
    },

    #[error(
        "allocation of {amount} from '{funding_id}' exceeds its remaining budget {remaining}"
    )]
    ExceedsRemainingBudget {
        funding_id: String,
        amount: Decimal,
        remaining: Decimal,
    },

    #[error(
        "allocation of {amount} from '{funding_id}' to '{measure_id}' exceeds the source cap {cap}"
    )]
    ExceedsSourceCap {
        measure_id: String,
        funding_id: String,
        amount: Decimal,
        cap: Decimal,
    },

    #[error("allocation of {amount} to '{measure_id}' exceeds its uncovered investment {uncovered}")]
    ExceedsUncoveredInvestment {
        measure_id: String,
        amount: Decimal,
        uncovered: Decimal,
    },

    #[error("measure '{measure_id}' reports covered {covered} but its allocations sum to {allocated}")]
    CoverageMismatch {
        measure_id: String,
        covered: Decimal,
        allocated: Decimal,
    },

    #[error(
        "total funding {total_funding} exceeds total investment {total_investment} for '{company_id}'"
    )]
    FundingExceedsInvestment {
        company_id: String,
        total_funding: Decimal,
        total_investment: Decimal,
    },

    #[error("source '{funding_id}' granted {allocated} in total, above its max amount {max_amount}")]
    ExceedsMaxAmount {
        funding_id: String,
        allocated: Decimal,
        max_amount: Decimal,
    },

    #[error("funding source '{funding_id}' is not tracked by the budget ledger")]
    UnknownSource { funding_id: String },

    #[error("measure '{measure_id}' appears more than once in the allocation output")]
    DuplicateMeasure { measure_id: String },

    #[error("arithmetic overflow computing {what}")]
    ArithmeticOverflow { what: String },
}
