//! Core eligibility, plan and batch pipelines, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: catalogs and profiles come in through the port traits and
//! artifacts go out through a [`WritePort`].

use crate::ports::{CatalogSource, ProfileSource, WritePort};
use crate::settings::{BatchSettings, PlanSettings};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, NaiveDate, Utc};
use decarb_catalog::{LoadedCatalog, LoadedProfile, sha256_hex};
use decarb_domain::{
    Assessment, BudgetLedger, CancellationToken, CatalogRegistry, CompanyResult, DomainError,
    MeasureSelection, PlanContext, PlanOutcome, Planner, PlannerConfig,
};
use decarb_render::{render_batch_md, render_eligibility_md, render_plan_md};
use decarb_types::catalog::{FundingCatalog, MeasureCatalog};
use decarb_types::profile::CompanyProfile;
use decarb_types::report::{BatchEntry, BatchReport, BatchStatus, RunInput, ToolInfo};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Error type for pipeline results. Exit code 2 = invalid input, 1 = tool error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn is_defect(&self) -> bool {
        match self {
            ToolError::InvalidInput(_) => false,
            ToolError::Domain(err) => err.is_defect(),
            ToolError::Internal(_) => true,
        }
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_defect() { 1 } else { 2 }
    }
}

/// Outcome of `run_eligibility`.
#[derive(Debug, Clone)]
pub struct EligibilityRun {
    pub assessment: Assessment,
    pub inputs: Vec<RunInput>,
}

/// Outcome of `run_plan`.
#[derive(Debug, Clone)]
pub struct PlanRun {
    pub outcome: PlanOutcome,
    pub inputs: Vec<RunInput>,
    pub remaining_budgets: BTreeMap<String, Decimal>,
}

/// Outcome of `run_batch`.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub report: BatchReport,
    /// Planned companies, in processing order.
    pub outcomes: Vec<PlanOutcome>,
}

struct Session {
    measures: LoadedCatalog<MeasureCatalog>,
    funding: LoadedCatalog<FundingCatalog>,
    profiles: Vec<LoadedProfile>,
    ctx: PlanContext,
}

impl Session {
    fn open(
        settings: &PlanSettings,
        catalogs: &dyn CatalogSource,
        profiles: &dyn ProfileSource,
    ) -> anyhow::Result<Self> {
        let measures = catalogs.load_measures().context("load measure catalog")?;
        let funding = catalogs.load_funding().context("load funding catalog")?;
        let profiles = profiles.load_profiles()?;

        let selection = if settings.measures.is_empty() {
            MeasureSelection::AllApplicable
        } else {
            MeasureSelection::Only(settings.measures.clone())
        };
        let ctx = PlanContext {
            reference_date: resolve_reference_date(settings),
            created_at: resolve_created_at(settings),
            config: PlannerConfig {
                registry: CatalogRegistry::new(
                    settings.infrastructure_keys.iter().cloned(),
                    settings.funding_categories.iter().cloned(),
                ),
                selection,
                max_measures: settings.max_measures,
            },
        };

        debug!(
            measures = measures.catalog.measures.len(),
            sources = funding.catalog.sources.len(),
            profiles = profiles.len(),
            reference_date = %ctx.reference_date,
            "session opened"
        );

        Ok(Self {
            measures,
            funding,
            profiles,
            ctx,
        })
    }

    fn ledger(&self) -> BudgetLedger {
        BudgetLedger::from_catalog(&self.funding.catalog, &self.ctx.config.registry)
    }

    fn inputs(&self) -> Vec<RunInput> {
        vec![
            self.measures
                .as_input(decarb_types::schema::DECARB_MEASURES_V1),
            self.funding.as_input(decarb_types::schema::DECARB_FUNDING_V1),
        ]
    }

    /// Successfully loaded profiles by company id, rejecting ids that occur twice.
    fn profiles_by_id(&self) -> Result<BTreeMap<&str, &CompanyProfile>, ToolError> {
        let mut out: BTreeMap<&str, &CompanyProfile> = BTreeMap::new();
        let mut paths: BTreeMap<&str, &Utf8Path> = BTreeMap::new();
        for loaded in &self.profiles {
            let Ok(profile) = &loaded.profile else {
                continue;
            };
            let id = profile.company_id.as_str();
            if let Some(first) = paths.insert(id, &loaded.path) {
                return Err(ToolError::InvalidInput(format!(
                    "duplicate company id '{}' in {} and {}",
                    id, first, loaded.path
                )));
            }
            out.insert(id, profile);
        }
        Ok(out)
    }

    fn profile(&self, company_id: &str) -> Result<&CompanyProfile, ToolError> {
        self.profiles_by_id()?
            .get(company_id)
            .copied()
            .ok_or_else(|| ToolError::InvalidInput(format!("unknown company '{}'", company_id)))
    }
}

/// Resolve the reference date the same way every pipeline does.
pub fn resolve_reference_date(settings: &PlanSettings) -> NaiveDate {
    settings
        .reference_date
        .unwrap_or_else(|| Utc::now().date_naive())
}

/// Measure eligibility and funding candidates for one company. Nothing is allocated.
pub fn run_eligibility(
    settings: &PlanSettings,
    catalogs: &dyn CatalogSource,
    profiles: &dyn ProfileSource,
    company_id: &str,
) -> Result<EligibilityRun, ToolError> {
    let session = Session::open(settings, catalogs, profiles)?;
    let profile = session.profile(company_id)?;
    let ledger = session.ledger();

    let assessment =
        Planner::new().assess(&session.ctx, profile, &session.measures.catalog, &ledger)?;

    info!(
        company = %company_id,
        applicable = assessment.eligibility.applicable.len(),
        blocked = assessment.eligibility.blocked.len(),
        "eligibility assessed"
    );

    Ok(EligibilityRun {
        assessment,
        inputs: session.inputs(),
    })
}

/// One company pass against fresh catalog budgets.
pub fn run_plan(
    settings: &PlanSettings,
    catalogs: &dyn CatalogSource,
    profiles: &dyn ProfileSource,
    company_id: &str,
) -> Result<PlanRun, ToolError> {
    let session = Session::open(settings, catalogs, profiles)?;
    let profile = session.profile(company_id)?;
    let mut ledger = session.ledger();

    let outcome = Planner::new().plan(&session.ctx, profile, &session.measures.catalog, &mut ledger)?;

    Ok(PlanRun {
        outcome,
        inputs: session.inputs(),
        remaining_budgets: ledger.remaining_budgets(),
    })
}

/// Plan many companies sequentially against one shared set of budgets.
pub fn run_batch(
    settings: &BatchSettings,
    catalogs: &dyn CatalogSource,
    profiles: &dyn ProfileSource,
    tool: ToolInfo,
    cancel: &CancellationToken,
) -> Result<BatchRun, ToolError> {
    let session = Session::open(&settings.plan, catalogs, profiles)?;
    let by_id = session.profiles_by_id()?;

    let mut report = BatchReport::new(tool, session.ctx.reference_date);
    report.inputs = session.inputs();
    report.inputs.extend(session.profiles.iter().map(|p| RunInput {
        path: p.path.to_string(),
        schema: None,
        sha256: None,
    }));

    let ordered: Vec<CompanyProfile> = if settings.order.is_empty() {
        session
            .profiles
            .iter()
            .filter_map(|p| p.profile.as_ref().ok().cloned())
            .collect()
    } else {
        let mut seen = BTreeSet::new();
        let mut out = Vec::with_capacity(settings.order.len());
        for id in &settings.order {
            if !seen.insert(id.as_str()) {
                return Err(ToolError::InvalidInput(format!(
                    "company '{}' listed twice in batch order",
                    id
                )));
            }
            let profile = by_id
                .get(id.as_str())
                .ok_or_else(|| ToolError::InvalidInput(format!("unknown company '{}'", id)))?;
            out.push((*profile).clone());
        }
        out
    };

    check_dir_names(&ordered)?;

    let mut ledger = session.ledger();
    let batch = Planner::new().plan_batch(
        &session.ctx,
        &ordered,
        &session.measures.catalog,
        &mut ledger,
        cancel,
    )?;

    let mut outcomes = Vec::new();
    for item in batch.items {
        let entry = match item.result {
            CompanyResult::Planned(outcome) => {
                let plan = &outcome.plan;
                report.summary.total_investment =
                    add_total(report.summary.total_investment, plan.total_investment)?;
                report.summary.total_funding =
                    add_total(report.summary.total_funding, plan.total_funding)?;
                let entry = BatchEntry {
                    company_id: item.company_id,
                    status: BatchStatus::Planned,
                    plan_id: Some(plan.plan_id.clone()),
                    total_investment: Some(plan.total_investment),
                    total_funding: Some(plan.total_funding),
                    coverage_ratio: Some(plan.coverage_ratio),
                    error: None,
                };
                outcomes.push(*outcome);
                entry
            }
            CompanyResult::Failed(err) => {
                warn!(company = %item.company_id, error = %err, "company failed");
                BatchEntry {
                    company_id: item.company_id,
                    status: BatchStatus::Failed,
                    plan_id: None,
                    total_investment: None,
                    total_funding: None,
                    coverage_ratio: None,
                    error: Some(err.to_string()),
                }
            }
            CompanyResult::Skipped => BatchEntry {
                company_id: item.company_id,
                status: BatchStatus::Skipped,
                plan_id: None,
                total_investment: None,
                total_funding: None,
                coverage_ratio: None,
                error: Some("cancelled".to_string()),
            },
        };
        report.companies.push(entry);
    }

    // Unreadable profiles are reported after the planned ones, keyed by path.
    if settings.order.is_empty() {
        for loaded in &session.profiles {
            if let Err(err) = &loaded.profile {
                warn!(path = %loaded.path, error = %err, "profile skipped");
                report.companies.push(BatchEntry {
                    company_id: loaded.path.to_string(),
                    status: BatchStatus::Skipped,
                    plan_id: None,
                    total_investment: None,
                    total_funding: None,
                    coverage_ratio: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    for entry in &report.companies {
        match entry.status {
            BatchStatus::Planned => report.summary.planned += 1,
            BatchStatus::Failed => report.summary.failed += 1,
            BatchStatus::Skipped => report.summary.skipped += 1,
        }
    }
    report.summary.companies_total = report.companies.len() as u64;
    report.remaining_budgets = batch.remaining_budgets;

    info!(
        companies = report.summary.companies_total,
        planned = report.summary.planned,
        failed = report.summary.failed,
        skipped = report.summary.skipped,
        "batch finished"
    );

    Ok(BatchRun { report, outcomes })
}

/// Directory name for a company's artifacts.
///
/// Ids made only of `[A-Za-z0-9._-]` (and not only dots) are used as is. Any other id has its
/// unsafe characters replaced by `_` and a short sha256 of the raw id appended, so `a b` and
/// `a_b` land in different directories.
pub fn company_dir_name(company_id: &str) -> String {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if !company_id.is_empty()
        && company_id.chars().all(is_safe)
        && !company_id.chars().all(|c| c == '.')
    {
        return company_id.to_string();
    }

    let name: String = company_id
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();
    let digest = sha256_hex(company_id.as_bytes());
    format!("{}-{}", name.trim_matches('.'), &digest[..8])
}

fn check_dir_names(profiles: &[CompanyProfile]) -> Result<(), ToolError> {
    let mut claimed: BTreeMap<String, &str> = BTreeMap::new();
    for profile in profiles {
        let dir = company_dir_name(&profile.company_id);
        if let Some(other) = claimed.insert(dir.clone(), &profile.company_id) {
            return Err(ToolError::InvalidInput(format!(
                "companies '{}' and '{}' would share output directory '{}'",
                other, profile.company_id, dir
            )));
        }
    }
    Ok(())
}

fn add_total(total: Decimal, value: Decimal) -> Result<Decimal, ToolError> {
    total
        .checked_add(value)
        .ok_or_else(|| ToolError::Internal(anyhow::anyhow!("batch total overflowed")))
}

/// Write `eligibility.json`, `funding_candidates.json` and `eligibility.md` for one company.
pub fn write_eligibility_artifacts(
    run: &EligibilityRun,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    let assessment = &run.assessment;
    let dir = company_dir(out_dir, &assessment.eligibility.company_id);
    writer.create_dir_all(&dir)?;

    write_json(writer, &dir.join("eligibility.json"), &assessment.eligibility)?;
    write_json(
        writer,
        &dir.join("funding_candidates.json"),
        &assessment.funding,
    )?;
    let md = render_eligibility_md(&assessment.eligibility, &assessment.funding);
    writer.write_file(&dir.join("eligibility.md"), md.as_bytes())?;
    Ok(())
}

/// Write every per-company artifact of one plan outcome.
pub fn write_plan_artifacts(
    outcome: &PlanOutcome,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    let dir = company_dir(out_dir, &outcome.plan.company_id);
    writer.create_dir_all(&dir)?;

    write_json(writer, &dir.join("eligibility.json"), &outcome.eligibility)?;
    write_json(writer, &dir.join("funding_candidates.json"), &outcome.funding)?;
    write_json(writer, &dir.join("allocation.json"), &outcome.allocation)?;
    write_json(writer, &dir.join("action_plan.json"), &outcome.plan)?;

    let md = render_plan_md(&outcome.plan, &outcome.allocation);
    writer.write_file(&dir.join("action_plan.md"), md.as_bytes())?;
    Ok(())
}

/// Write the artifacts of a single-company plan run, including `budgets.json`.
pub fn write_plan_run_artifacts(
    run: &PlanRun,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;
    write_plan_artifacts(&run.outcome, out_dir, writer)?;
    write_json(writer, &out_dir.join("budgets.json"), &run.remaining_budgets)?;
    Ok(())
}

/// Write every planned company's artifacts plus `batch.json`, `batch.md` and `budgets.json`.
pub fn write_batch_artifacts(
    run: &BatchRun,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    for outcome in &run.outcomes {
        write_plan_artifacts(outcome, out_dir, writer)
            .with_context(|| format!("write artifacts for {}", outcome.plan.company_id))?;
    }

    write_json(writer, &out_dir.join("batch.json"), &run.report)?;
    let md = render_batch_md(&run.report);
    writer.write_file(&out_dir.join("batch.md"), md.as_bytes())?;
    write_json(
        writer,
        &out_dir.join("budgets.json"),
        &run.report.remaining_budgets,
    )?;
    Ok(())
}

fn company_dir(out_dir: &Utf8Path, company_id: &str) -> Utf8PathBuf {
    out_dir.join(company_dir_name(company_id))
}

fn write_json<T: Serialize>(
    writer: &dyn WritePort,
    path: &Utf8Path,
    value: &T,
) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path))?;
    json.push('\n');
    writer.write_file(path, json.as_bytes())
}

/// Stamp used by batch reports when the caller has no better version string.
pub fn default_tool_info() -> ToolInfo {
    ToolInfo {
        name: "decarb".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}

/// Timestamp a run will stamp on its plans.
pub fn resolve_created_at(settings: &PlanSettings) -> DateTime<Utc> {
    settings.created_at.unwrap_or_else(Utc::now)
}
