use crate::aggregator::ActionPlanAggregator;
use crate::eligibility::MeasureEligibilityFilter;
use crate::error::DomainError;
use crate::funding::FundingEligibilityFilter;
use crate::ledger::BudgetLedger;
use crate::profile::ValidatedProfile;
use crate::registry::CatalogRegistry;
use crate::strategy::{AllocationRequest, AllocationStrategy, default_strategy};
use chrono::{DateTime, NaiveDate, Utc};
use decarb_types::allocation::AllocationResult;
use decarb_types::catalog::MeasureCatalog;
use decarb_types::eligibility::{EligibilityReport, FundingCandidates};
use decarb_types::measure::Measure;
use decarb_types::plan::ActionPlan;
use decarb_types::profile::CompanyProfile;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Which applicable measures a pass plans for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MeasureSelection {
    #[default]
    AllApplicable,
    /// Explicit measure ids. Every id must exist and be applicable.
    Only(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub registry: CatalogRegistry,
    pub selection: MeasureSelection,
    /// Keep only the first N selected measures in processing order.
    pub max_measures: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct PlanContext {
    pub reference_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub config: PlannerConfig,
}

/// Eligibility and funding candidates of one company, without allocating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub eligibility: EligibilityReport,
    pub funding: FundingCandidates,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub eligibility: EligibilityReport,
    pub funding: FundingCandidates,
    pub allocation: AllocationResult,
    pub plan: ActionPlan,
}

/// Cooperative cancellation for batch runs, checked between companies.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanyResult {
    Planned(Box<PlanOutcome>),
    Failed(DomainError),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub company_id: String,
    pub result: CompanyResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// In processing order.
    pub items: Vec<BatchItem>,
    pub remaining_budgets: BTreeMap<String, Decimal>,
    pub cancelled: bool,
}

pub struct Planner {
    strategy: Box<dyn AllocationStrategy>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    pub fn new() -> Self {
        Self {
            strategy: default_strategy(),
        }
    }

    pub fn with_strategy(strategy: Box<dyn AllocationStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn eligibility(
        &self,
        ctx: &PlanContext,
        profile: &CompanyProfile,
        catalog: &MeasureCatalog,
    ) -> Result<EligibilityReport, DomainError> {
        let profile = ValidatedProfile::from_profile(profile)?;
        Ok(MeasureEligibilityFilter::new(&ctx.config.registry).evaluate(&profile, catalog))
    }

    /// Measure eligibility plus the funding candidates of every applicable measure.
    pub fn assess(
        &self,
        ctx: &PlanContext,
        profile: &CompanyProfile,
        catalog: &MeasureCatalog,
        ledger: &BudgetLedger,
    ) -> Result<Assessment, DomainError> {
        let profile = ValidatedProfile::from_profile(profile)?;
        let eligibility = MeasureEligibilityFilter::new(&ctx.config.registry).evaluate(&profile, catalog);
        let funding = FundingEligibilityFilter::new(ledger, ctx.reference_date)
            .candidates(&profile, &eligibility.applicable);
        Ok(Assessment {
            eligibility,
            funding,
        })
    }

    /// One company pass. Budget debits reach the ledger only when the whole pass succeeds.
    pub fn plan(
        &self,
        ctx: &PlanContext,
        profile: &CompanyProfile,
        catalog: &MeasureCatalog,
        ledger: &mut BudgetLedger,
    ) -> Result<PlanOutcome, DomainError> {
        let profile = ValidatedProfile::from_profile(profile)?;
        let company_id = profile.company_id.as_str();

        let eligibility = MeasureEligibilityFilter::new(&ctx.config.registry).evaluate(&profile, catalog);
        let selected = select_measures(&ctx.config, company_id, catalog, &eligibility)?;
        debug!(company = %company_id, selected = selected.len(), "measures selected");

        let funding = FundingEligibilityFilter::new(ledger, ctx.reference_date)
            .candidates(&profile, &selected);

        let mut txn = ledger.begin();
        let request = AllocationRequest {
            company_id,
            measures: &selected,
            candidates: &funding,
        };
        let measures = self.strategy.allocate(&request, &mut txn)?;
        let plan = ActionPlanAggregator.aggregate(company_id, &measures, ctx.created_at)?;
        let remaining_budgets = txn.commit();

        let mut allocation = AllocationResult::new(company_id, self.strategy.name());
        allocation.measures = measures;
        allocation.remaining_budgets = remaining_budgets;

        info!(
            company = %company_id,
            measures = plan.selected_measures.len(),
            investment = %plan.total_investment,
            funding = %plan.total_funding,
            shortfall = %plan.total_shortfall,
            "plan computed"
        );

        Ok(PlanOutcome {
            eligibility,
            funding,
            allocation,
            plan,
        })
    }

    /// Plan every company in the given order against one shared ledger.
    ///
    /// A company with invalid input fails alone and commits nothing. An invariant violation aborts
    /// the whole batch. After cancellation the remaining companies are reported as skipped.
    pub fn plan_batch(
        &self,
        ctx: &PlanContext,
        profiles: &[CompanyProfile],
        catalog: &MeasureCatalog,
        ledger: &mut BudgetLedger,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, DomainError> {
        let mut items = Vec::with_capacity(profiles.len());
        let mut cancelled = false;

        for profile in profiles {
            let result = if cancel.is_cancelled() {
                cancelled = true;
                CompanyResult::Skipped
            } else {
                match self.plan(ctx, profile, catalog, ledger) {
                    Ok(outcome) => CompanyResult::Planned(Box::new(outcome)),
                    Err(err) if err.is_defect() => return Err(err),
                    Err(err) => {
                        debug!(company = %profile.company_id, error = %err, "company failed");
                        CompanyResult::Failed(err)
                    }
                }
            };
            items.push(BatchItem {
                company_id: profile.company_id.clone(),
                result,
            });
        }

        ledger.verify_conservation()?;

        let planned = items
            .iter()
            .filter(|i| matches!(i.result, CompanyResult::Planned(_)))
            .count();
        info!(
            companies = items.len(),
            planned,
            cancelled,
            "batch computed"
        );

        Ok(BatchOutcome {
            items,
            remaining_budgets: ledger.remaining_budgets(),
            cancelled,
        })
    }
}

fn select_measures(
    config: &PlannerConfig,
    company_id: &str,
    catalog: &MeasureCatalog,
    eligibility: &EligibilityReport,
) -> Result<Vec<Measure>, DomainError> {
    let mut selected: Vec<Measure> = match &config.selection {
        MeasureSelection::AllApplicable => eligibility.applicable.clone(),
        MeasureSelection::Only(ids) => {
            let wanted: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
            for id in &wanted {
                check_selectable(company_id, id, catalog, eligibility)?;
            }
            eligibility
                .applicable
                .iter()
                .filter(|m| wanted.contains(m.id.as_str()))
                .cloned()
                .collect()
        }
    };

    if let Some(max) = config.max_measures {
        selected.truncate(max);
    }
    Ok(selected)
}

fn check_selectable(
    company_id: &str,
    measure_id: &str,
    catalog: &MeasureCatalog,
    eligibility: &EligibilityReport,
) -> Result<(), DomainError> {
    let not_applicable = |reason: String| DomainError::MeasureNotApplicable {
        company_id: company_id.to_string(),
        measure_id: measure_id.to_string(),
        reason,
    };

    if catalog.get(measure_id).is_none() {
        return Err(DomainError::UnknownMeasure {
            measure_id: measure_id.to_string(),
        });
    }
    if let Some(blocked) = eligibility
        .blocked
        .iter()
        .find(|b| b.measure.id == measure_id)
    {
        return Err(not_applicable(blocked.reason.clone()));
    }
    if let Some(warning) = eligibility
        .warnings
        .iter()
        .find(|w| w.subject_id == measure_id)
    {
        return Err(not_applicable(format!(
            "excluded from catalog: {}",
            warning.message
        )));
    }
    Ok(())
}
