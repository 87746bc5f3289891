use crate::error::InvariantViolation;
use chrono::{DateTime, Utc};
use decarb_types::allocation::MeasureAllocation;
use decarb_types::plan::ActionPlan;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Folds per-measure allocations into an [`ActionPlan`].
///
/// Pure: the same allocations and timestamp always produce the same plan, `plan_id` included.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionPlanAggregator;

impl ActionPlanAggregator {
    pub fn aggregate(
        &self,
        company_id: &str,
        measures: &[MeasureAllocation],
        created_at: DateTime<Utc>,
    ) -> Result<ActionPlan, InvariantViolation> {
        let mut seen = BTreeSet::new();
        let mut selected_measures = Vec::new();
        let mut selected_funding = BTreeSet::new();
        let mut total_reduction = Decimal::ZERO;
        let mut total_investment = Decimal::ZERO;
        let mut total_funding = Decimal::ZERO;
        let mut total_shortfall = Decimal::ZERO;

        for m in measures {
            if !seen.insert(m.measure_id.as_str()) {
                return Err(InvariantViolation::DuplicateMeasure {
                    measure_id: m.measure_id.clone(),
                });
            }

            let allocated = m
                .allocations
                .iter()
                .try_fold(Decimal::ZERO, |acc, a| add(acc, a.amount, "allocations"))?;
            let accounted = add(m.covered, m.shortfall, "covered + shortfall")?;
            if allocated != m.covered || accounted != m.investment {
                return Err(InvariantViolation::CoverageMismatch {
                    measure_id: m.measure_id.clone(),
                    covered: m.covered,
                    allocated,
                });
            }

            selected_measures.push(m.measure_id.clone());
            selected_funding.extend(
                m.allocations
                    .iter()
                    .filter(|a| a.amount > Decimal::ZERO)
                    .map(|a| a.funding_id.clone()),
            );
            total_reduction = add(total_reduction, m.emission_reduction, "total reduction")?;
            total_investment = add(total_investment, m.investment, "total investment")?;
            total_funding = add(total_funding, m.covered, "total funding")?;
            total_shortfall = add(total_shortfall, m.shortfall, "total shortfall")?;
        }

        if total_funding > total_investment {
            return Err(InvariantViolation::FundingExceedsInvestment {
                company_id: company_id.to_string(),
                total_funding,
                total_investment,
            });
        }

        let coverage_ratio = if total_investment.is_zero() {
            Decimal::ZERO
        } else {
            (total_funding / total_investment).round_dp(6).normalize()
        };

        let mut plan = ActionPlan {
            schema: decarb_types::schema::DECARB_ACTION_PLAN_V1.to_string(),
            plan_id: String::new(),
            company_id: company_id.to_string(),
            selected_measures,
            selected_funding: selected_funding.into_iter().collect(),
            total_reduction,
            total_investment,
            total_funding,
            total_shortfall,
            coverage_ratio,
            created_at,
        };
        plan.plan_id = deterministic_plan_id(&plan, measures).to_string();
        Ok(plan)
    }
}

fn add(acc: Decimal, value: Decimal, what: &str) -> Result<Decimal, InvariantViolation> {
    acc.checked_add(value)
        .ok_or_else(|| InvariantViolation::ArithmeticOverflow {
            what: what.to_string(),
        })
}

fn deterministic_plan_id(plan: &ActionPlan, measures: &[MeasureAllocation]) -> Uuid {
    // Deterministic ID: v5(namespace, stable_key_bytes)
    const NAMESPACE: Uuid = Uuid::from_bytes([
        0x9a, 0x1f, 0x5c, 0x2e, 0x4d, 0x07, 0x4b, 0x88, 0xa3, 0x61, 0x2c, 0xd4, 0x7e, 0x90, 0x15,
        0x3b,
    ]);

    let allocations: Vec<String> = measures
        .iter()
        .flat_map(|m| {
            m.allocations
                .iter()
                .map(move |a| format!("{}:{}:{}", m.measure_id, a.funding_id, a.amount.normalize()))
        })
        .collect();

    let stable_key = format!(
        "{}|{}|{}|{}|{}",
        plan.company_id,
        plan.selected_measures.join(","),
        allocations.join(","),
        plan.total_investment.normalize(),
        plan.created_at.to_rfc3339(),
    );
    Uuid::new_v5(&NAMESPACE, stable_key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use decarb_types::allocation::Allocation;
    use decarb_types::measure::MeasureCategory;
    use pretty_assertions::assert_eq;

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
    }

    fn allocation(measure: &str, investment: i64, grants: &[(&str, i64)]) -> MeasureAllocation {
        let allocations: Vec<Allocation> = grants
            .iter()
            .map(|(id, amount)| Allocation {
                funding_id: id.to_string(),
                amount: Decimal::from(*amount),
            })
            .collect();
        let covered: Decimal = allocations.iter().map(|a| a.amount).sum();
        MeasureAllocation {
            measure_id: measure.to_string(),
            category: MeasureCategory::Energy,
            investment: Decimal::from(investment),
            emission_reduction: Decimal::from(5),
            allocations,
            covered,
            shortfall: Decimal::from(investment) - covered,
            required_funding_met: None,
        }
    }

    #[test]
    fn totals_and_coverage_ratio() {
        let measures = vec![
            allocation("a", 10000, &[("f1", 5000), ("f2", 3000)]),
            allocation("b", 2000, &[("f1", 1000)]),
        ];
        let plan = ActionPlanAggregator
            .aggregate("acme", &measures, created_at())
            .unwrap();

        assert_eq!(plan.selected_measures, vec!["a", "b"]);
        assert_eq!(plan.selected_funding, vec!["f1", "f2"]);
        assert_eq!(plan.total_investment, Decimal::from(12000));
        assert_eq!(plan.total_funding, Decimal::from(9000));
        assert_eq!(plan.total_shortfall, Decimal::from(3000));
        assert_eq!(plan.total_reduction, Decimal::from(10));
        assert_eq!(plan.coverage_ratio, Decimal::new(75, 2));
        assert!(!plan.is_fully_funded());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let measures = vec![allocation("a", 900, &[("f1", 300)])];
        let first = ActionPlanAggregator
            .aggregate("acme", &measures, created_at())
            .unwrap();
        let second = ActionPlanAggregator
            .aggregate("acme", &measures, created_at())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.coverage_ratio, Decimal::new(333333, 6));
    }

    #[test]
    fn zero_investment_has_zero_coverage() {
        let plan = ActionPlanAggregator
            .aggregate("acme", &[], created_at())
            .unwrap();
        assert_eq!(plan.coverage_ratio, Decimal::ZERO);
        assert!(plan.selected_measures.is_empty());
    }

    #[test]
    fn duplicate_measures_are_a_violation() {
        let a = allocation("a", 1000, &[("f1", 1000)]);
        let err = ActionPlanAggregator
            .aggregate("acme", &[a.clone(), a], created_at())
            .unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::DuplicateMeasure {
                measure_id: "a".to_string()
            }
        );
    }

    #[test]
    fn total_overflow_is_a_violation() {
        let huge: Decimal = "50000000000000000000000000000".parse().unwrap();
        let big = |id: &str| MeasureAllocation {
            measure_id: id.to_string(),
            category: MeasureCategory::Energy,
            investment: huge,
            emission_reduction: Decimal::ONE,
            allocations: vec![],
            covered: Decimal::ZERO,
            shortfall: huge,
            required_funding_met: None,
        };
        let err = ActionPlanAggregator
            .aggregate("acme", &[big("a"), big("b")], created_at())
            .unwrap_err();
        assert!(matches!(err, InvariantViolation::ArithmeticOverflow { .. }));
    }

    #[test]
    fn inconsistent_coverage_is_a_violation() {
        let mut a = allocation("a", 1000, &[("f1", 400)]);
        a.covered = Decimal::from(500);
        let err = ActionPlanAggregator
            .aggregate("acme", &[a], created_at())
            .unwrap_err();
        assert!(matches!(err, InvariantViolation::CoverageMismatch { .. }));
    }

    #[test]
    fn overfunding_is_a_violation() {
        let a = MeasureAllocation {
            measure_id: "a".to_string(),
            category: MeasureCategory::Energy,
            investment: Decimal::from(100),
            emission_reduction: Decimal::ONE,
            allocations: vec![Allocation {
                funding_id: "f1".to_string(),
                amount: Decimal::from(150),
            }],
            covered: Decimal::from(150),
            shortfall: Decimal::from(-50),
            required_funding_met: None,
        };
        let err = ActionPlanAggregator
            .aggregate("acme", &[a], created_at())
            .unwrap_err();
        assert!(matches!(err, InvariantViolation::FundingExceedsInvestment { .. }));
    }

    #[test]
    fn plan_id_depends_on_content() {
        let one = ActionPlanAggregator
            .aggregate("acme", &[allocation("a", 1000, &[("f1", 10)])], created_at())
            .unwrap();
        let other = ActionPlanAggregator
            .aggregate("acme", &[allocation("a", 1000, &[("f1", 20)])], created_at())
            .unwrap();
        assert_ne!(one.plan_id, other.plan_id);
        assert!(Uuid::parse_str(&one.plan_id).is_ok());
    }
}
