use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// An input file a run consumed, with its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInput {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Planned,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub company_id: String,
    pub status: BatchStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_investment: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_funding: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_ratio: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub companies_total: u64,
    pub planned: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total_investment: Decimal,
    pub total_funding: Decimal,
}

/// Summary of a batch run over many companies sharing one funding catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub reference_date: NaiveDate,

    #[serde(default)]
    pub inputs: Vec<RunInput>,

    /// In processing order.
    #[serde(default)]
    pub companies: Vec<BatchEntry>,

    pub summary: BatchSummary,

    #[serde(default)]
    pub remaining_budgets: BTreeMap<String, Decimal>,
}

impl BatchReport {
    pub fn new(tool: ToolInfo, reference_date: NaiveDate) -> Self {
        Self {
            schema: crate::schema::DECARB_BATCH_V1.to_string(),
            tool,
            reference_date,
            inputs: vec![],
            companies: vec![],
            summary: BatchSummary::default(),
            remaining_budgets: BTreeMap::new(),
        }
    }
}
