use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Company size class.
///
/// Ordered `micro < pequena < media < grande` through [`CompanySize::rank`];
/// the English names are accepted as aliases on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Micro,
    #[serde(alias = "small")]
    Pequena,
    #[serde(alias = "medium")]
    Media,
    #[serde(alias = "large")]
    Grande,
}

impl CompanySize {
    /// Ordering table, smallest first.
    pub const ORDER: [CompanySize; 4] = [
        CompanySize::Micro,
        CompanySize::Pequena,
        CompanySize::Media,
        CompanySize::Grande,
    ];

    pub fn rank(self) -> u8 {
        match self {
            CompanySize::Micro => 0,
            CompanySize::Pequena => 1,
            CompanySize::Media => 2,
            CompanySize::Grande => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompanySize::Micro => "micro",
            CompanySize::Pequena => "pequena",
            CompanySize::Media => "media",
            CompanySize::Grande => "grande",
        }
    }
}

impl PartialOrd for CompanySize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CompanySize {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A company profile as supplied by the data layer.
///
/// Mandatory fields are optional on the wire so a malformed profile still
/// loads; the domain validates it before planning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub company_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<CompanySize>,

    /// Annual emissions in tCO2e.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_emissions: Option<Decimal>,

    #[serde(default)]
    pub infrastructure_facts: BTreeMap<String, Decimal>,
}
