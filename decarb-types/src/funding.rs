use crate::measure::MeasureCategory;
use crate::profile::CompanySize;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of funding instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingKind {
    Subsidy,
    Financing,
    Incentive,
}

impl FundingKind {
    pub const ALL: [FundingKind; 3] = [
        FundingKind::Subsidy,
        FundingKind::Financing,
        FundingKind::Incentive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FundingKind::Subsidy => "subsidy",
            FundingKind::Financing => "financing",
            FundingKind::Incentive => "incentive",
        }
    }
}

impl fmt::Display for FundingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eligibility rules of a funding source. Empty lists and absent values mean
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingApplicability {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measure_categories: Vec<MeasureCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_company_size: Option<CompanySize>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<String>,
}

/// An external financing instrument with eligibility rules and a budget cap.
///
/// Catalog data is immutable. The live remaining budget is owned by the
/// domain's budget ledger; `remaining_budget` here is only its starting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSource {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    pub kind: FundingKind,
    pub max_amount: Decimal,

    /// Share of a measure's investment the source covers, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,

    #[serde(default)]
    pub applicable_to: FundingApplicability,

    pub currently_open: bool,

    /// Starting budget; defaults to `max_amount` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_budget: Option<Decimal>,
}

impl FundingSource {
    pub fn initial_remaining_budget(&self) -> Decimal {
        self.remaining_budget.unwrap_or(self.max_amount)
    }

    /// The most this source can grant a single measure, ignoring its budget.
    ///
    /// `None` when `investment * percentage` does not fit in a [`Decimal`].
    pub fn per_measure_cap(&self, investment: Decimal) -> Option<Decimal> {
        match self.percentage {
            Some(pct) => investment
                .checked_mul(pct)?
                .checked_div(Decimal::ONE_HUNDRED),
            None => Some(self.max_amount),
        }
    }

    pub fn is_percentage_based(&self) -> bool {
        self.percentage.is_some()
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
