//! Domain logic: turn a company profile and reference catalogs into a funded action plan.
//!
//! This crate owns *which* measures apply, *which* funds may pay for them and *how much* each fund
//! grants. It performs no I/O; catalogs, profiles and the reference date are resolved by the caller.
//!
//! Shared funding budgets live in a single [`BudgetLedger`]. A planning pass stages its debits in a
//! [`BudgetTransaction`] and commits them all at once, so a batch over many companies never leaves a
//! company half-applied.

mod aggregator;
mod constraint;
mod eligibility;
mod error;
mod funding;
mod ledger;
mod planner;
mod profile;
mod registry;
mod strategy;

pub use aggregator::ActionPlanAggregator;
pub use constraint::{Constraint, Evaluation, measure_constraints};
pub use eligibility::{MeasureEligibilityFilter, measure_order};
pub use error::{DomainError, InvariantViolation};
pub use funding::{FundingEligibilityFilter, SourceRule};
pub use ledger::{BudgetLedger, BudgetTransaction};
pub use planner::{
    Assessment, BatchItem, BatchOutcome, CancellationToken, CompanyResult, MeasureSelection,
    PlanContext, PlanOutcome, Planner, PlannerConfig,
};
pub use profile::ValidatedProfile;
pub use registry::CatalogRegistry;
pub use strategy::{
    AllocationRequest, AllocationStrategy, GreedyCoverage, compare_sources, default_strategy,
};
