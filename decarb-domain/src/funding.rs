use crate::ledger::BudgetLedger;
use crate::profile::ValidatedProfile;
use chrono::NaiveDate;
use decarb_types::eligibility::{FundingAdvisory, FundingCandidates};
use decarb_types::funding::FundingSource;
use decarb_types::measure::{Measure, MeasureCategory};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::debug;

/// Eligibility rules a funding source must pass to be a candidate for a measure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceRule {
    Open,
    Deadline,
    Budget,
    Category,
    CompanySize,
    Sector,
}

impl SourceRule {
    pub const ALL: [SourceRule; 6] = [
        SourceRule::Open,
        SourceRule::Deadline,
        SourceRule::Budget,
        SourceRule::Category,
        SourceRule::CompanySize,
        SourceRule::Sector,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceRule::Open => "closed",
            SourceRule::Deadline => "deadline_passed",
            SourceRule::Budget => "budget_exhausted",
            SourceRule::Category => "category_mismatch",
            SourceRule::CompanySize => "company_too_large",
            SourceRule::Sector => "sector_mismatch",
        }
    }

    pub fn admits(
        self,
        source: &FundingSource,
        remaining: Decimal,
        category: MeasureCategory,
        profile: &ValidatedProfile,
        reference_date: NaiveDate,
    ) -> bool {
        let rules = &source.applicable_to;
        match self {
            SourceRule::Open => source.currently_open,
            SourceRule::Deadline => source.deadline.is_none_or(|d| d >= reference_date),
            SourceRule::Budget => remaining > Decimal::ZERO,
            SourceRule::Category => {
                rules.measure_categories.is_empty() || rules.measure_categories.contains(&category)
            }
            SourceRule::CompanySize => rules.max_company_size.is_none_or(|max| profile.size <= max),
            SourceRule::Sector => {
                rules.sectors.is_empty() || rules.sectors.iter().any(|s| s.trim() == profile.sector)
            }
        }
    }
}

/// Selects the funding sources a company may draw on, per measure category.
#[derive(Debug, Clone, Copy)]
pub struct FundingEligibilityFilter<'a> {
    ledger: &'a BudgetLedger,
    reference_date: NaiveDate,
}

impl<'a> FundingEligibilityFilter<'a> {
    pub fn new(ledger: &'a BudgetLedger, reference_date: NaiveDate) -> Self {
        Self {
            ledger,
            reference_date,
        }
    }

    /// The first rule a source fails, if any.
    pub fn first_failure(
        &self,
        source: &FundingSource,
        category: MeasureCategory,
        profile: &ValidatedProfile,
    ) -> Option<SourceRule> {
        let remaining = self.ledger.remaining(&source.id).unwrap_or_default();
        SourceRule::ALL
            .into_iter()
            .find(|rule| !rule.admits(source, remaining, category, profile, self.reference_date))
    }

    pub fn candidates(&self, profile: &ValidatedProfile, measures: &[Measure]) -> FundingCandidates {
        let mut out = FundingCandidates::new(&profile.company_id, self.reference_date);
        out.warnings = self.ledger.warnings().to_vec();

        let categories: BTreeSet<MeasureCategory> = measures.iter().map(|m| m.category).collect();
        for category in categories {
            let mut list = Vec::new();
            for source in self.ledger.sources() {
                match self.first_failure(source, category, profile) {
                    None => list.push(source.clone()),
                    Some(rule) => debug!(
                        company = %profile.company_id,
                        category = %category,
                        funding = %source.id,
                        rule = rule.as_str(),
                        "funding source skipped"
                    ),
                }
            }
            out.by_category.insert(category, list);
        }

        let mut seen = BTreeSet::new();
        for measure in measures {
            let Some(req) = &measure.required_funding else {
                continue;
            };
            if !seen.insert(measure.id.as_str()) {
                continue;
            }
            let capacity = out
                .for_category(measure.category)
                .iter()
                .filter(|s| s.kind.as_str() == req.category)
                .map(|s| {
                    let remaining = self.ledger.remaining(&s.id).unwrap_or_default();
                    s.per_measure_cap(measure.investment)
                        .map_or(remaining, |cap| remaining.min(cap))
                })
                .fold(Decimal::ZERO, Decimal::saturating_add)
                .min(measure.investment);
            out.advisories.push(FundingAdvisory {
                measure_id: measure.id.clone(),
                category: req.category.clone(),
                minimum_amount: req.minimum_amount,
                candidate_capacity: capacity,
                satisfiable: capacity >= req.minimum_amount,
            });
        }
        out.advisories.sort_by(|a, b| a.measure_id.cmp(&b.measure_id));

        out
    }
}
