//! Clap-free settings for the eligibility, plan and batch pipelines.

use camino::Utf8PathBuf;
use chrono::{DateTime, NaiveDate, Utc};

/// Settings shared by every pipeline.
#[derive(Debug, Clone)]
pub struct PlanSettings {
    pub data_dir: Utf8PathBuf,
    pub out_dir: Utf8PathBuf,

    /// Date funding deadlines are checked against. Today (UTC) when absent.
    pub reference_date: Option<NaiveDate>,
    /// Timestamp stamped on produced plans. Now when absent.
    pub created_at: Option<DateTime<Utc>>,

    // Registry
    pub infrastructure_keys: Vec<String>,
    pub funding_categories: Vec<String>,

    // Selection
    pub measures: Vec<String>,
    pub max_measures: Option<usize>,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from("."),
            out_dir: Utf8PathBuf::from("out"),
            reference_date: None,
            created_at: None,
            infrastructure_keys: Vec::new(),
            funding_categories: Vec::new(),
            measures: Vec::new(),
            max_measures: None,
        }
    }
}

/// Settings for the batch pipeline.
#[derive(Debug, Clone, Default)]
pub struct BatchSettings {
    pub plan: PlanSettings,

    /// Company ids in processing order. Every loaded profile, in path order, when empty.
    pub order: Vec<String>,
}
