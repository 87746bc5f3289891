//! Property-based tests for the shared schema types.

use decarb_types::funding::{FundingApplicability, FundingKind, FundingSource};
use decarb_types::profile::CompanySize;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn source(max_amount: Decimal, percentage: Option<Decimal>) -> FundingSource {
    FundingSource {
        id: "F".to_string(),
        name: None,
        provider: None,
        kind: FundingKind::Subsidy,
        max_amount,
        percentage,
        deadline: None,
        applicable_to: FundingApplicability::default(),
        currently_open: true,
        remaining_budget: None,
    }
}

/// Amounts with up to two decimal places, below a trillion.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_percentage() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|bp| Decimal::new(bp, 2))
}

fn arb_size() -> impl Strategy<Value = CompanySize> {
    prop::sample::select(CompanySize::ORDER.to_vec())
}

proptest! {
    #[test]
    fn percentage_cap_never_exceeds_investment(
        investment in arb_amount(),
        pct in arb_percentage(),
    ) {
        let cap = source(Decimal::ZERO, Some(pct))
            .per_measure_cap(investment)
            .expect("in-range cap");
        prop_assert!(cap >= Decimal::ZERO);
        prop_assert!(cap <= investment);
    }

    #[test]
    fn fixed_cap_is_max_amount(investment in arb_amount(), max_amount in arb_amount()) {
        let cap = source(max_amount, None).per_measure_cap(investment);
        prop_assert_eq!(cap, Some(max_amount));
    }

    #[test]
    fn company_size_order_follows_rank(a in arb_size(), b in arb_size()) {
        prop_assert_eq!(a.cmp(&b), a.rank().cmp(&b.rank()));
        prop_assert_eq!(a == b, a.as_str() == b.as_str());
    }

    #[test]
    fn funding_amounts_survive_json(
        max_amount in arb_amount(),
        pct in proptest::option::of(arb_percentage()),
        remaining in proptest::option::of(arb_amount()),
    ) {
        let mut original = source(max_amount, pct);
        original.remaining_budget = remaining;

        let json = serde_json::to_string(&original).expect("serialize");
        let back: FundingSource = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(back.initial_remaining_budget(), original.initial_remaining_budget());
        prop_assert_eq!(back, original);
    }
}
