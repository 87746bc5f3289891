use crate::error::DomainError;
use decarb_types::profile::{CompanyProfile, CompanySize};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A company profile with every mandatory field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedProfile {
    pub company_id: String,
    pub sector: String,
    pub size: CompanySize,
    pub total_emissions: Decimal,
    pub infrastructure_facts: BTreeMap<String, Decimal>,
}

impl ValidatedProfile {
    pub fn from_profile(profile: &CompanyProfile) -> Result<Self, DomainError> {
        let invalid = |reason: &str| DomainError::InvalidProfile {
            company_id: profile.company_id.clone(),
            reason: reason.to_string(),
        };

        if profile.company_id.trim().is_empty() {
            return Err(invalid("missing company_id"));
        }

        let sector = profile
            .sector
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("missing sector"))?;

        let size = profile
            .company_size
            .ok_or_else(|| invalid("missing company_size"))?;

        let total_emissions = profile
            .total_emissions
            .ok_or_else(|| invalid("missing total_emissions"))?;
        if total_emissions < Decimal::ZERO {
            return Err(invalid("total_emissions must not be negative"));
        }

        Ok(Self {
            company_id: profile.company_id.clone(),
            sector: sector.to_string(),
            size,
            total_emissions,
            infrastructure_facts: profile.infrastructure_facts.clone(),
        })
    }
}
