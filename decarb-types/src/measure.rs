use crate::profile::CompanySize;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Area of operations a measure acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureCategory {
    Energy,
    Mobility,
    Waste,
    Water,
}

impl MeasureCategory {
    pub const ALL: [MeasureCategory; 4] = [
        MeasureCategory::Energy,
        MeasureCategory::Mobility,
        MeasureCategory::Waste,
        MeasureCategory::Water,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeasureCategory::Energy => "energy",
            MeasureCategory::Mobility => "mobility",
            MeasureCategory::Waste => "waste",
            MeasureCategory::Water => "water",
        }
    }
}

impl fmt::Display for MeasureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Greenhouse-gas accounting scope. Serialized as the integers 1, 2 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Scope {
    One,
    Two,
    Three,
}

impl TryFrom<u8> for Scope {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Scope::One),
            2 => Ok(Scope::Two),
            3 => Ok(Scope::Three),
            other => Err(format!("scope must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::One => 1,
            Scope::Two => 2,
            Scope::Three => 3,
        }
    }
}

/// Recommendation priority of a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Position in processing order; lower ranks are planned first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// A site fact the company must have at or above a minimum value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureRequirement {
    pub key: String,
    pub minimum_value: Decimal,
}

/// Funding hint: the measure is only realistic with at least this much
/// funding from sources of the given category. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRequirement {
    pub category: String,
    pub minimum_amount: Decimal,
}

/// Profile constraints of a measure. Empty lists and absent values mean
/// "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureApplicability {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<CompanySize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_emissions: Option<Decimal>,
}

/// A candidate decarbonization intervention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub category: MeasureCategory,
    pub scope: Scope,
    pub investment: Decimal,

    /// Expected reduction in tCO2e per year.
    pub emission_reduction: Decimal,

    pub priority: Priority,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_infrastructure: Option<InfrastructureRequirement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_funding: Option<FundingRequirement>,

    #[serde(default)]
    pub applicable_to: MeasureApplicability,
}

impl Measure {
    /// Display label: the name when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
