use decarb_types::eligibility::{CatalogWarning, warning_tokens};
use decarb_types::funding::FundingSource;
use decarb_types::measure::Measure;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Configured vocabulary the catalogs may reference.
///
/// An empty set means the dimension is not configured and every key is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRegistry {
    pub infrastructure_keys: BTreeSet<String>,
    pub funding_categories: BTreeSet<String>,
}

impl CatalogRegistry {
    pub fn new<I, J>(infrastructure_keys: I, funding_categories: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            infrastructure_keys: infrastructure_keys.into_iter().collect(),
            funding_categories: funding_categories.into_iter().collect(),
        }
    }

    /// Everything wrong with a measure; empty when it may be evaluated.
    pub fn check_measure(&self, measure: &Measure) -> Vec<CatalogWarning> {
        let mut out = Vec::new();
        let invalid = |message: String| CatalogWarning {
            subject_id: measure.id.clone(),
            token: warning_tokens::INVALID_MEASURE.to_string(),
            message,
        };

        if measure.investment < Decimal::ZERO {
            out.push(invalid(format!(
                "negative investment {}",
                measure.investment
            )));
        }
        // Percentage caps multiply the investment by up to 100.
        if measure.investment.checked_mul(Decimal::ONE_HUNDRED).is_none() {
            out.push(invalid(format!(
                "investment {} too large to apportion",
                measure.investment
            )));
        }
        if measure.emission_reduction < Decimal::ZERO {
            out.push(invalid(format!(
                "negative emission_reduction {}",
                measure.emission_reduction
            )));
        }
        if let Some(min) = measure.applicable_to.min_emissions
            && min < Decimal::ZERO
        {
            out.push(invalid(format!("negative min_emissions {}", min)));
        }

        if let Some(req) = &measure.required_infrastructure
            && !self.infrastructure_keys.is_empty()
            && !self.infrastructure_keys.contains(&req.key)
        {
            out.push(CatalogWarning {
                subject_id: measure.id.clone(),
                token: warning_tokens::UNKNOWN_INFRASTRUCTURE_KEY.to_string(),
                message: format!("infrastructure key '{}' is not configured", req.key),
            });
        }

        if let Some(req) = &measure.required_funding
            && !self.funding_categories.is_empty()
            && !self.funding_categories.contains(&req.category)
        {
            out.push(CatalogWarning {
                subject_id: measure.id.clone(),
                token: warning_tokens::UNKNOWN_FUNDING_CATEGORY.to_string(),
                message: format!("funding category '{}' is not configured", req.category),
            });
        }

        out
    }

    /// Everything wrong with a funding source; empty when it may be used.
    pub fn check_source(&self, source: &FundingSource) -> Vec<CatalogWarning> {
        let mut out = Vec::new();
        let mut invalid = |message: String| {
            out.push(CatalogWarning {
                subject_id: source.id.clone(),
                token: warning_tokens::INVALID_FUNDING_SOURCE.to_string(),
                message,
            })
        };

        if source.max_amount < Decimal::ZERO {
            invalid(format!("negative max_amount {}", source.max_amount));
        }
        if let Some(pct) = source.percentage
            && (pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED)
        {
            invalid(format!("percentage {} outside [0, 100]", pct));
        }
        let remaining = source.initial_remaining_budget();
        if remaining < Decimal::ZERO {
            invalid(format!("negative remaining_budget {}", remaining));
        }
        if remaining > source.max_amount {
            invalid(format!(
                "remaining_budget {} exceeds max_amount {}",
                remaining, source.max_amount
            ));
        }

        out
    }
}

/// Ids that occur more than once, with a warning for each.
///
/// Every entry sharing a duplicated id is excluded, whichever order the catalog lists them in.
pub(crate) fn duplicate_ids<'a, I>(ids: I) -> (BTreeSet<String>, Vec<CatalogWarning>)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for id in ids {
        *counts.entry(id).or_default() += 1;
    }

    let mut dups = BTreeSet::new();
    let mut warnings = Vec::new();
    for (id, n) in counts {
        if n > 1 {
            dups.insert(id.to_string());
            warnings.push(CatalogWarning {
                subject_id: id.to_string(),
                token: warning_tokens::DUPLICATE_ID.to_string(),
                message: format!("id '{}' appears {} times in the catalog", id, n),
            });
        }
    }
    (dups, warnings)
}
