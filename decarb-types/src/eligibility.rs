use crate::funding::FundingSource;
use crate::measure::{Measure, MeasureCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable tokens for why a measure was blocked.
pub mod blocked_tokens {
    pub const SECTOR_MISMATCH: &str = "sector_mismatch";
    pub const SIZE_MISMATCH: &str = "size_mismatch";
    pub const MIN_EMISSIONS_NOT_MET: &str = "min_emissions_not_met";
    pub const INFRASTRUCTURE_MISSING: &str = "infrastructure_missing";
    pub const INFRASTRUCTURE_BELOW_MINIMUM: &str = "infrastructure_below_minimum";
}

/// Stable tokens for catalog inconsistencies.
pub mod warning_tokens {
    pub const UNKNOWN_INFRASTRUCTURE_KEY: &str = "unknown_infrastructure_key";
    pub const UNKNOWN_FUNDING_CATEGORY: &str = "unknown_funding_category";
    pub const INVALID_MEASURE: &str = "invalid_measure";
    pub const INVALID_FUNDING_SOURCE: &str = "invalid_funding_source";
    pub const DUPLICATE_ID: &str = "duplicate_id";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedMeasure {
    pub measure: Measure,
    pub reason: String,
    pub reason_token: String,
}

/// A catalog entry excluded from planning because it is inconsistent with the
/// configured registry or with itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogWarning {
    pub subject_id: String,
    pub token: String,
    pub message: String,
}

/// Which measures apply to a company, and why the others do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub schema: String,
    pub company_id: String,

    /// Ordered by priority, then descending reduction, then id.
    #[serde(default)]
    pub applicable: Vec<Measure>,

    #[serde(default)]
    pub blocked: Vec<BlockedMeasure>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CatalogWarning>,
}

impl EligibilityReport {
    pub fn new(company_id: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::DECARB_ELIGIBILITY_V1.to_string(),
            company_id: company_id.into(),
            applicable: vec![],
            blocked: vec![],
            warnings: vec![],
        }
    }

    pub fn applicable_ids(&self) -> Vec<&str> {
        self.applicable.iter().map(|m| m.id.as_str()).collect()
    }
}

/// Advisory check of a measure's funding hint against the current candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingAdvisory {
    pub measure_id: String,
    pub category: String,
    pub minimum_amount: Decimal,

    /// What the matching candidates could grant this measure right now.
    pub candidate_capacity: Decimal,

    pub satisfiable: bool,
}

/// Candidate funding sources per measure category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingCandidates {
    pub schema: String,
    pub company_id: String,
    pub reference_date: NaiveDate,

    #[serde(default)]
    pub by_category: BTreeMap<MeasureCategory, Vec<FundingSource>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<FundingAdvisory>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CatalogWarning>,
}

impl FundingCandidates {
    pub fn new(company_id: impl Into<String>, reference_date: NaiveDate) -> Self {
        Self {
            schema: crate::schema::DECARB_FUNDING_CANDIDATES_V1.to_string(),
            company_id: company_id.into(),
            reference_date,
            by_category: BTreeMap::new(),
            advisories: vec![],
            warnings: vec![],
        }
    }

    pub fn for_category(&self, category: MeasureCategory) -> &[FundingSource] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
