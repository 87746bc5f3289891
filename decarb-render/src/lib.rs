//! Rendering helpers (markdown) for human-readable artifacts.

use decarb_types::allocation::AllocationResult;
use decarb_types::eligibility::{EligibilityReport, FundingCandidates};
use decarb_types::plan::ActionPlan;
use decarb_types::report::{BatchReport, BatchStatus};
use rust_decimal::Decimal;

pub fn render_eligibility_md(report: &EligibilityReport, funding: &FundingCandidates) -> String {
    let mut out = String::new();
    out.push_str(&format!("# decarb eligibility: {}\n\n", report.company_id));
    out.push_str(&format!(
        "- Applicable: {}\n- Blocked: {}\n- Reference date: {}\n",
        report.applicable.len(),
        report.blocked.len(),
        funding.reference_date
    ));
    if !report.warnings.is_empty() {
        out.push_str(&format!("- Catalog warnings: {}\n", report.warnings.len()));
    }
    out.push('\n');

    out.push_str("## Applicable measures\n\n");
    if report.applicable.is_empty() {
        out.push_str("_No applicable measures._\n");
    }
    for (i, m) in report.applicable.iter().enumerate() {
        out.push_str(&format!(
            "{}. `{}` {} ({}, {} priority): investment {}, reduction {} tCO2e/yr\n",
            i + 1,
            m.id,
            m.label(),
            m.category,
            m.priority.as_str(),
            money(m.investment),
            m.emission_reduction.normalize()
        ));
    }
    out.push('\n');

    if !report.blocked.is_empty() {
        out.push_str("## Blocked measures\n\n");
        for b in &report.blocked {
            out.push_str(&format!(
                "- `{}` `{}`: {}\n",
                b.measure.id, b.reason_token, b.reason
            ));
        }
        out.push('\n');
    }

    out.push_str("## Funding candidates\n\n");
    if funding.by_category.is_empty() {
        out.push_str("_No categories to fund._\n");
    }
    for (category, sources) in &funding.by_category {
        out.push_str(&format!("### {}\n\n", category));
        if sources.is_empty() {
            out.push_str("_No open funding._\n\n");
            continue;
        }
        for s in sources {
            let share = match s.percentage {
                Some(pct) => format!("{}% up to {}", pct.normalize(), money(s.max_amount)),
                None => format!("up to {}", money(s.max_amount)),
            };
            let deadline = s
                .deadline
                .map(|d| format!(", deadline {}", d))
                .unwrap_or_default();
            out.push_str(&format!(
                "- `{}` {} ({}): {}{}\n",
                s.id,
                s.label(),
                s.kind,
                share,
                deadline
            ));
        }
        out.push('\n');
    }

    if !funding.advisories.is_empty() {
        out.push_str("## Funding requirements\n\n");
        for a in &funding.advisories {
            let verdict = if a.satisfiable { "reachable" } else { "not reachable" };
            out.push_str(&format!(
                "- `{}` needs {} from {}: {} (capacity {})\n",
                a.measure_id,
                money(a.minimum_amount),
                a.category,
                verdict,
                money(a.candidate_capacity)
            ));
        }
        out.push('\n');
    }

    if !report.warnings.is_empty() {
        out.push_str("## Catalog warnings\n\n");
        for w in &report.warnings {
            out.push_str(&format!("- `{}` `{}`: {}\n", w.subject_id, w.token, w.message));
        }
    }

    out
}

pub fn render_plan_md(plan: &ActionPlan, allocation: &AllocationResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("# decarb action plan: {}\n\n", plan.company_id));
    out.push_str(&format!(
        "- Plan id: `{}`\n- Measures: {}\n- Investment: {}\n- Funding: {}\n- Shortfall: {}\n- Coverage: {}\n- Reduction: {} tCO2e/yr\n- Strategy: `{}`\n\n",
        plan.plan_id,
        plan.selected_measures.len(),
        money(plan.total_investment),
        money(plan.total_funding),
        money(plan.total_shortfall),
        percent(plan.coverage_ratio),
        plan.total_reduction.normalize(),
        allocation.strategy
    ));

    out.push_str("## Measures\n\n");
    if allocation.measures.is_empty() {
        out.push_str("_No measures planned._\n");
        return out;
    }

    for (i, m) in allocation.measures.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, m.measure_id));
        out.push_str(&format!("- Category: `{}`\n", m.category));
        out.push_str(&format!("- Investment: {}\n", money(m.investment)));
        out.push_str(&format!("- Covered: {}\n", money(m.covered)));
        out.push_str(&format!("- Shortfall: {}\n", money(m.shortfall)));
        if let Some(met) = m.required_funding_met {
            out.push_str(&format!("- Funding requirement met: `{}`\n", met));
        }

        if !m.allocations.is_empty() {
            out.push_str("\n**Funding**\n\n");
            for a in &m.allocations {
                out.push_str(&format!("- `{}` {}\n", a.funding_id, money(a.amount)));
            }
        }
        out.push('\n');
    }

    out
}

pub fn render_batch_md(report: &BatchReport) -> String {
    let mut out = String::new();
    out.push_str("# decarb batch\n\n");
    out.push_str(&format!(
        "- Reference date: {}\n- Companies: {}\n- Planned: {}\n- Failed: {}\n- Skipped: {}\n- Investment: {}\n- Funding: {}\n\n",
        report.reference_date,
        report.summary.companies_total,
        report.summary.planned,
        report.summary.failed,
        report.summary.skipped,
        money(report.summary.total_investment),
        money(report.summary.total_funding)
    ));

    out.push_str("## Companies\n\n");
    if report.companies.is_empty() {
        out.push_str("_No companies._\n");
    }
    for c in &report.companies {
        let detail = match (c.status, &c.error) {
            (_, Some(err)) => err.clone(),
            (BatchStatus::Planned, None) => format!(
                "funding {} of {}",
                money(c.total_funding.unwrap_or_default()),
                money(c.total_investment.unwrap_or_default())
            ),
            _ => String::new(),
        };
        out.push_str(&format!(
            "- `{}` `{}` {}\n",
            c.company_id,
            status_label(c.status),
            detail
        ));
    }

    if !report.remaining_budgets.is_empty() {
        out.push_str("\n## Remaining budgets\n\n");
        for (id, remaining) in &report.remaining_budgets {
            out.push_str(&format!("- `{}` {}\n", id, money(*remaining)));
        }
    }

    out
}

fn money(v: Decimal) -> String {
    format!("{:.2}", v)
}

fn percent(ratio: Decimal) -> String {
    format!("{:.1}%", ratio * Decimal::ONE_HUNDRED)
}

fn status_label(s: BatchStatus) -> &'static str {
    match s {
        BatchStatus::Planned => "planned",
        BatchStatus::Failed => "failed",
        BatchStatus::Skipped => "skipped",
    }
}
