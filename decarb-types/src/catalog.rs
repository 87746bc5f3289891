use crate::funding::FundingSource;
use crate::measure::Measure;
use serde::{Deserialize, Serialize};

/// Reference list of measures, as stored in `catalog/measures.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureCatalog {
    #[serde(default = "measures_schema")]
    pub schema: String,

    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl MeasureCatalog {
    pub fn new(measures: Vec<Measure>) -> Self {
        Self {
            schema: measures_schema(),
            measures,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.id == id)
    }
}

/// Reference list of funding sources, as stored in `catalog/funding.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingCatalog {
    #[serde(default = "funding_schema")]
    pub schema: String,

    #[serde(default)]
    pub sources: Vec<FundingSource>,
}

impl FundingCatalog {
    pub fn new(sources: Vec<FundingSource>) -> Self {
        Self {
            schema: funding_schema(),
            sources,
        }
    }

    pub fn get(&self, id: &str) -> Option<&FundingSource> {
        self.sources.iter().find(|s| s.id == id)
    }
}

fn measures_schema() -> String {
    crate::schema::DECARB_MEASURES_V1.to_string()
}

fn funding_schema() -> String {
    crate::schema::DECARB_FUNDING_V1.to_string()
}
