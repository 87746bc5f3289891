//! Shared DTOs (schemas-as-code) for the decarb workspace.
//!
//! # Design constraints
//! - These types are read from catalog files and written to disk as artifacts.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.
//! - Money, emissions and percentages are exact decimals.

pub mod allocation;
pub mod catalog;
pub mod eligibility;
pub mod funding;
pub mod measure;
pub mod plan;
pub mod profile;
pub mod report;

/// Schema identifiers.
pub mod schema {
    pub const DECARB_MEASURES_V1: &str = "decarb.measures.v1";
    pub const DECARB_FUNDING_V1: &str = "decarb.funding.v1";
    pub const DECARB_ELIGIBILITY_V1: &str = "decarb.eligibility.v1";
    pub const DECARB_FUNDING_CANDIDATES_V1: &str = "decarb.funding_candidates.v1";
    pub const DECARB_ALLOCATION_V1: &str = "decarb.allocation.v1";
    pub const DECARB_ACTION_PLAN_V1: &str = "decarb.action_plan.v1";
    pub const DECARB_BATCH_V1: &str = "decarb.batch.v1";
}
