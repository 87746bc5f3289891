use super::{AllocationRequest, AllocationStrategy};
use crate::eligibility::measure_order;
use crate::error::InvariantViolation;
use crate::ledger::BudgetTransaction;
use decarb_types::allocation::{Allocation, MeasureAllocation};
use decarb_types::funding::FundingSource;
use decarb_types::measure::Measure;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::debug;

/// Covers each measure as far as possible before moving on to the next one.
///
/// Not globally optimal: a high-priority measure may drain a source a later measure could only
/// have been funded from.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyCoverage;

/// Consumption order of candidate sources for one measure.
///
/// Percentage-based sources come first (highest percentage first), then flat sources (largest max
/// amount first). Ties go to the soonest deadline, undated sources last, then to the lower id.
pub fn compare_sources(a: &FundingSource, b: &FundingSource) -> Ordering {
    let by_value = match (a.percentage, b.percentage) {
        (Some(pa), Some(pb)) => pb.cmp(&pa),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.max_amount.cmp(&a.max_amount),
    };
    let by_deadline = || match (a.deadline, b.deadline) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_value
        .then_with(by_deadline)
        .then_with(|| a.id.cmp(&b.id))
}

impl AllocationStrategy for GreedyCoverage {
    fn name(&self) -> &'static str {
        "greedy_coverage"
    }

    fn allocate(
        &self,
        request: &AllocationRequest<'_>,
        txn: &mut BudgetTransaction<'_>,
    ) -> Result<Vec<MeasureAllocation>, InvariantViolation> {
        let mut measures: Vec<&Measure> = request.measures.iter().collect();
        measures.sort_by(|a, b| measure_order(a, b));

        let mut out = Vec::with_capacity(measures.len());
        for measure in measures {
            out.push(allocate_measure(request, measure, txn)?);
        }
        Ok(out)
    }
}

fn allocate_measure(
    request: &AllocationRequest<'_>,
    measure: &Measure,
    txn: &mut BudgetTransaction<'_>,
) -> Result<MeasureAllocation, InvariantViolation> {
    let mut ranked: Vec<&FundingSource> = request
        .candidates
        .for_category(measure.category)
        .iter()
        .collect();
    ranked.sort_by(|a, b| compare_sources(a, b));

    let mut covered = Decimal::ZERO;
    let mut hinted = Decimal::ZERO;
    let mut allocations = Vec::new();

    for source in ranked {
        let uncovered = measure.investment - covered;
        if uncovered <= Decimal::ZERO {
            break;
        }

        let available = txn.available(&source.id)?;
        let cap = source.per_measure_cap(measure.investment).ok_or_else(|| {
            InvariantViolation::ArithmeticOverflow {
                what: format!("cap of '{}' for '{}'", source.id, measure.id),
            }
        })?;
        let amount = available.min(cap).min(uncovered);
        if amount <= Decimal::ZERO {
            debug!(measure = %measure.id, funding = %source.id, "nothing left to grant");
            continue;
        }

        check_allocation(measure, source, amount, available, cap, uncovered)?;
        txn.debit(&source.id, amount)?;

        covered += amount;
        if let Some(req) = &measure.required_funding
            && source.kind.as_str() == req.category
        {
            hinted += amount;
        }
        allocations.push(Allocation {
            funding_id: source.id.clone(),
            amount,
        });
    }

    let shortfall = measure.investment - covered;
    debug!(
        company = %request.company_id,
        measure = %measure.id,
        covered = %covered,
        shortfall = %shortfall,
        "measure allocated"
    );

    Ok(MeasureAllocation {
        measure_id: measure.id.clone(),
        category: measure.category,
        investment: measure.investment,
        emission_reduction: measure.emission_reduction,
        allocations,
        covered,
        shortfall,
        required_funding_met: measure
            .required_funding
            .as_ref()
            .map(|req| hinted >= req.minimum_amount),
    })
}

fn check_allocation(
    measure: &Measure,
    source: &FundingSource,
    amount: Decimal,
    available: Decimal,
    cap: Decimal,
    uncovered: Decimal,
) -> Result<(), InvariantViolation> {
    if amount <= Decimal::ZERO {
        return Err(InvariantViolation::NonPositiveAllocation {
            measure_id: measure.id.clone(),
            funding_id: source.id.clone(),
            amount,
        });
    }
    if amount > available {
        return Err(InvariantViolation::ExceedsRemainingBudget {
            funding_id: source.id.clone(),
            amount,
            remaining: available,
        });
    }
    if amount > cap {
        return Err(InvariantViolation::ExceedsSourceCap {
            measure_id: measure.id.clone(),
            funding_id: source.id.clone(),
            amount,
            cap,
        });
    }
    if amount > uncovered {
        return Err(InvariantViolation::ExceedsUncoveredInvestment {
            measure_id: measure.id.clone(),
            amount,
            uncovered,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::BudgetLedger;
    use crate::registry::CatalogRegistry;
    use chrono::NaiveDate;
    use decarb_types::catalog::FundingCatalog;
    use decarb_types::eligibility::FundingCandidates;
    use decarb_types::funding::FundingKind;
    use decarb_types::measure::{
        FundingRequirement, MeasureApplicability, MeasureCategory, Priority, Scope,
    };
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn flat(id: &str, max: i64) -> FundingSource {
        FundingSource {
            id: id.to_string(),
            name: None,
            provider: None,
            kind: FundingKind::Subsidy,
            max_amount: Decimal::from(max),
            percentage: None,
            deadline: None,
            applicable_to: Default::default(),
            currently_open: true,
            remaining_budget: None,
        }
    }

    fn pct(id: &str, percentage: i64, remaining: i64) -> FundingSource {
        let mut s = flat(id, remaining);
        s.percentage = Some(Decimal::from(percentage));
        s
    }

    fn measure(id: &str, priority: Priority, investment: i64) -> Measure {
        Measure {
            id: id.to_string(),
            name: None,
            description: None,
            category: MeasureCategory::Energy,
            scope: Scope::Two,
            investment: Decimal::from(investment),
            emission_reduction: Decimal::from(10),
            priority,
            required_infrastructure: None,
            required_funding: None,
            applicable_to: MeasureApplicability::default(),
        }
    }

    fn run(
        sources: Vec<FundingSource>,
        measures: &[Measure],
    ) -> (Vec<MeasureAllocation>, BudgetLedger) {
        let catalog = FundingCatalog::new(sources.clone());
        let mut ledger = BudgetLedger::from_catalog(&catalog, &CatalogRegistry::default());
        let mut candidates = FundingCandidates::new("acme", date(2025, 1, 1));
        candidates.by_category.insert(MeasureCategory::Energy, sources);

        let request = AllocationRequest {
            company_id: "acme",
            measures,
            candidates: &candidates,
        };
        let mut txn = ledger.begin();
        let out = GreedyCoverage.allocate(&request, &mut txn).unwrap();
        txn.commit();
        (out, ledger)
    }

    #[test]
    fn percentage_before_flat_and_shortfall_reported() {
        let (out, ledger) = run(
            vec![flat("f2", 3000), pct("f1", 50, 100000)],
            &[measure("a", Priority::High, 10000)],
        );
        let a = &out[0];
        assert_eq!(
            a.allocations,
            vec![
                Allocation {
                    funding_id: "f1".to_string(),
                    amount: Decimal::from(5000)
                },
                Allocation {
                    funding_id: "f2".to_string(),
                    amount: Decimal::from(3000)
                },
            ]
        );
        assert_eq!(a.covered, Decimal::from(8000));
        assert_eq!(a.shortfall, Decimal::from(2000));
        assert_eq!(ledger.remaining("f1"), Some(Decimal::from(95000)));
        assert_eq!(ledger.remaining("f2"), Some(Decimal::ZERO));
    }

    #[test]
    fn later_measures_see_reduced_budget() {
        let (out, _) = run(
            vec![flat("f", 1500)],
            &[
                measure("low", Priority::Low, 1000),
                measure("high", Priority::High, 1000),
            ],
        );
        assert_eq!(out[0].measure_id, "high");
        assert_eq!(out[0].covered, Decimal::from(1000));
        assert_eq!(out[1].measure_id, "low");
        assert_eq!(out[1].covered, Decimal::from(500));
        assert_eq!(out[1].shortfall, Decimal::from(500));
    }

    #[test]
    fn exhausted_sources_record_no_zero_allocation() {
        let (out, _) = run(
            vec![flat("f", 1000)],
            &[
                measure("a", Priority::High, 1000),
                measure("b", Priority::Medium, 1000),
            ],
        );
        assert!(out[1].allocations.is_empty());
        assert_eq!(out[1].shortfall, Decimal::from(1000));
    }

    #[test]
    fn required_funding_hint_counts_matching_kind_only() {
        let mut loan = flat("loan", 10000);
        loan.kind = FundingKind::Financing;
        let mut m = measure("m", Priority::High, 10000);
        m.required_funding = Some(FundingRequirement {
            category: "subsidy".to_string(),
            minimum_amount: Decimal::from(2000),
        });

        let (out, _) = run(vec![loan, flat("grant", 1000)], &[m]);
        assert_eq!(out[0].covered, Decimal::from(10000));
        assert_eq!(out[0].required_funding_met, Some(false));
    }

    #[test]
    fn source_ranking_ties() {
        let mut early = flat("z-early", 1000);
        early.deadline = Some(date(2025, 3, 1));
        let mut late = flat("a-late", 1000);
        late.deadline = Some(date(2025, 6, 1));
        let undated = flat("b-undated", 1000);
        let also_undated = flat("a-undated", 1000);
        let bigger = flat("y-bigger", 2000);
        let percent = pct("x-pct", 10, 10);

        let mut sources = vec![undated, late, also_undated, early, bigger, percent];
        sources.sort_by(compare_sources);
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["x-pct", "y-bigger", "z-early", "a-late", "a-undated", "b-undated"]
        );
    }
}
