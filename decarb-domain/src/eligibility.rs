use crate::constraint::{Evaluation, measure_constraints};
use crate::profile::ValidatedProfile;
use crate::registry::{CatalogRegistry, duplicate_ids};
use decarb_types::catalog::MeasureCatalog;
use decarb_types::eligibility::{BlockedMeasure, CatalogWarning, EligibilityReport};
use decarb_types::measure::Measure;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Processing order of measures: priority (high first), then descending emission reduction, then
/// ascending id.
pub fn measure_order(a: &Measure, b: &Measure) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| b.emission_reduction.cmp(&a.emission_reduction))
        .then_with(|| a.id.cmp(&b.id))
}

/// Splits a measure catalog into applicable and blocked measures for one company.
#[derive(Debug, Clone, Copy)]
pub struct MeasureEligibilityFilter<'a> {
    registry: &'a CatalogRegistry,
}

impl<'a> MeasureEligibilityFilter<'a> {
    pub fn new(registry: &'a CatalogRegistry) -> Self {
        Self { registry }
    }

    pub fn evaluate(&self, profile: &ValidatedProfile, catalog: &MeasureCatalog) -> EligibilityReport {
        let mut report = EligibilityReport::new(&profile.company_id);

        let (dups, mut warnings) = duplicate_ids(catalog.measures.iter().map(|m| m.id.as_str()));

        for measure in &catalog.measures {
            if dups.contains(&measure.id) {
                continue;
            }

            let issues = self.registry.check_measure(measure);
            if !issues.is_empty() {
                warnings.extend(issues);
                continue;
            }

            let violations: Vec<(&'static str, String)> = measure_constraints(measure)
                .iter()
                .filter_map(|c| match c.evaluate(profile) {
                    Evaluation::Satisfied => None,
                    Evaluation::Violated { token, reason } => Some((token, reason)),
                })
                .collect();

            match violations.first() {
                None => report.applicable.push(measure.clone()),
                Some((token, _)) => {
                    let reason = violations
                        .iter()
                        .map(|(_, r)| r.as_str())
                        .collect::<Vec<_>>()
                        .join("; ");
                    debug!(
                        company = %profile.company_id,
                        measure = %measure.id,
                        reason = %reason,
                        "measure blocked"
                    );
                    report.blocked.push(BlockedMeasure {
                        measure: measure.clone(),
                        reason,
                        reason_token: token.to_string(),
                    });
                }
            }
        }

        for w in &warnings {
            warn!(subject = %w.subject_id, token = %w.token, "{}", w.message);
        }

        report.applicable.sort_by(measure_order);
        report.blocked.sort_by(|a, b| a.measure.id.cmp(&b.measure.id));
        sort_warnings(&mut warnings);
        report.warnings = warnings;

        debug!(
            company = %profile.company_id,
            applicable = report.applicable.len(),
            blocked = report.blocked.len(),
            excluded = report.warnings.len(),
            "measure eligibility evaluated"
        );

        report
    }
}

pub(crate) fn sort_warnings(warnings: &mut [CatalogWarning]) {
    warnings.sort_by(|a, b| {
        a.subject_id
            .cmp(&b.subject_id)
            .then_with(|| a.token.cmp(&b.token))
            .then_with(|| a.message.cmp(&b.message))
    });
}
