//! Applicability constraints of a measure, as a closed set of kinds.
//!
//! Absent or empty fields on the measure produce no constraint at all, so "no constraint" and
//! "always satisfied" are the same thing.

use crate::profile::ValidatedProfile;
use decarb_types::eligibility::blocked_tokens;
use decarb_types::measure::{InfrastructureRequirement, Measure};
use decarb_types::profile::CompanySize;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint<'a> {
    Sector(&'a [String]),
    Size(&'a [CompanySize]),
    MinEmissions(Decimal),
    Infrastructure(&'a InfrastructureRequirement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Satisfied,
    Violated {
        token: &'static str,
        reason: String,
    },
}

impl Evaluation {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Evaluation::Satisfied)
    }
}

/// The non-empty constraints of a measure, in evaluation order.
pub fn measure_constraints(measure: &Measure) -> Vec<Constraint<'_>> {
    let applicable = &measure.applicable_to;
    let mut out = Vec::with_capacity(4);
    if !applicable.sectors.is_empty() {
        out.push(Constraint::Sector(&applicable.sectors));
    }
    if !applicable.sizes.is_empty() {
        out.push(Constraint::Size(&applicable.sizes));
    }
    if let Some(min) = applicable.min_emissions {
        out.push(Constraint::MinEmissions(min));
    }
    if let Some(req) = &measure.required_infrastructure {
        out.push(Constraint::Infrastructure(req));
    }
    out
}

impl Constraint<'_> {
    pub fn evaluate(&self, profile: &ValidatedProfile) -> Evaluation {
        match *self {
            Constraint::Sector(sectors) => {
                if sectors.iter().any(|s| s.trim() == profile.sector) {
                    Evaluation::Satisfied
                } else {
                    Evaluation::Violated {
                        token: blocked_tokens::SECTOR_MISMATCH,
                        reason: format!(
                            "sector not eligible ({} not in [{}])",
                            profile.sector,
                            sectors.join(", ")
                        ),
                    }
                }
            }
            Constraint::Size(sizes) => {
                if sizes.contains(&profile.size) {
                    Evaluation::Satisfied
                } else {
                    let allowed: Vec<&str> = sizes.iter().map(|s| s.as_str()).collect();
                    Evaluation::Violated {
                        token: blocked_tokens::SIZE_MISMATCH,
                        reason: format!(
                            "company size not eligible ({} not in [{}])",
                            profile.size,
                            allowed.join(", ")
                        ),
                    }
                }
            }
            Constraint::MinEmissions(min) => {
                if profile.total_emissions >= min {
                    Evaluation::Satisfied
                } else {
                    Evaluation::Violated {
                        token: blocked_tokens::MIN_EMISSIONS_NOT_MET,
                        reason: format!(
                            "minEmissions not met ({} < {})",
                            profile.total_emissions, min
                        ),
                    }
                }
            }
            Constraint::Infrastructure(req) => match profile.infrastructure_facts.get(&req.key) {
                None => Evaluation::Violated {
                    token: blocked_tokens::INFRASTRUCTURE_MISSING,
                    reason: format!("infrastructure missing ({})", req.key),
                },
                Some(value) if *value < req.minimum_value => Evaluation::Violated {
                    token: blocked_tokens::INFRASTRUCTURE_BELOW_MINIMUM,
                    reason: format!(
                        "infrastructure below minimum ({} {} < {})",
                        req.key, value, req.minimum_value
                    ),
                },
                Some(_) => Evaluation::Satisfied,
            },
        }
    }
}
