//! Pipelines over a real data directory.

use camino::Utf8PathBuf;
use chrono::{NaiveDate, TimeZone, Utc};
use decarb_core::CancellationToken;
use decarb_core::adapters::{FsCatalogSource, FsProfileSource, FsWritePort};
use decarb_core::pipeline::{
    ToolError, default_tool_info, run_batch, run_eligibility, run_plan, write_batch_artifacts,
    write_eligibility_artifacts, write_plan_run_artifacts,
};
use decarb_core::settings::{BatchSettings, PlanSettings};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const MEASURES: &str = r#"{
    "schema": "decarb.measures.v1",
    "measures": [
        {
            "id": "solar-pv",
            "name": "Rooftop solar PV",
            "category": "energy",
            "scope": 2,
            "investment": 10000,
            "emission_reduction": 30,
            "priority": "high",
            "required_infrastructure": { "key": "roof_area_m2", "minimum_value": 200 },
            "applicable_to": { "min_emissions": 100 }
        },
        {
            "id": "fleet-ev",
            "category": "mobility",
            "scope": 1,
            "investment": 50000,
            "emission_reduction": 20,
            "priority": "medium",
            "applicable_to": { "min_emissions": 1000 }
        }
    ]
}"#;

const FUNDING: &str = r#"{
    "schema": "decarb.funding.v1",
    "sources": [
        {
            "id": "F1",
            "kind": "subsidy",
            "max_amount": 100000,
            "percentage": 50,
            "currently_open": true,
            "applicable_to": { "measure_categories": ["energy"] }
        },
        {
            "id": "F2",
            "kind": "financing",
            "max_amount": 3000,
            "currently_open": true
        },
        {
            "id": "old",
            "kind": "incentive",
            "max_amount": 9000,
            "deadline": "2024-12-31",
            "currently_open": true
        }
    ]
}"#;

fn profile(id: &str, emissions: u32) -> String {
    format!(
        r#"{{
            "company_id": "{id}",
            "sector": "manufacturing",
            "company_size": "media",
            "total_emissions": {emissions},
            "infrastructure_facts": {{ "roof_area_m2": 400 }}
        }}"#
    )
}

fn data_dir() -> (TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    fs::create_dir_all(root.join("catalog")).unwrap();
    fs::create_dir_all(root.join("profiles")).unwrap();
    fs::write(root.join("catalog/measures.json"), MEASURES).unwrap();
    fs::write(root.join("catalog/funding.json"), FUNDING).unwrap();
    fs::write(root.join("profiles/acme.json"), profile("acme", 500)).unwrap();
    fs::write(root.join("profiles/beta.json"), profile("beta", 2000)).unwrap();
    (temp, root)
}

fn settings(root: &Utf8PathBuf) -> PlanSettings {
    PlanSettings {
        data_dir: root.clone(),
        out_dir: root.join("out"),
        reference_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()),
        ..Default::default()
    }
}

#[test]
fn eligibility_writes_report_and_candidates() {
    let (_temp, root) = data_dir();
    let settings = settings(&root);
    let run = run_eligibility(
        &settings,
        &FsCatalogSource::new(root.clone()),
        &FsProfileSource::in_data_dir(&root),
        "acme",
    )
    .unwrap();

    let eligibility = &run.assessment.eligibility;
    assert_eq!(eligibility.applicable_ids(), vec!["solar-pv"]);
    assert_eq!(eligibility.blocked[0].measure.id, "fleet-ev");

    write_eligibility_artifacts(&run, &settings.out_dir, &FsWritePort).unwrap();
    let json = fs::read_to_string(root.join("out/acme/eligibility.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["schema"], "decarb.eligibility.v1");
    assert!(root.join("out/acme/funding_candidates.json").exists());
    assert!(root.join("out/acme/eligibility.md").exists());
}

#[test]
fn plan_allocates_percentage_then_flat() {
    let (_temp, root) = data_dir();
    let settings = settings(&root);
    let run = run_plan(
        &settings,
        &FsCatalogSource::new(root.clone()),
        &FsProfileSource::in_data_dir(&root),
        "acme",
    )
    .unwrap();

    let plan = &run.outcome.plan;
    assert_eq!(plan.selected_funding, vec!["F1", "F2"]);
    assert_eq!(plan.total_funding.to_string(), "8000");
    assert_eq!(plan.total_shortfall.to_string(), "2000");

    write_plan_run_artifacts(&run, &settings.out_dir, &FsWritePort).unwrap();
    for name in [
        "acme/eligibility.json",
        "acme/allocation.json",
        "acme/action_plan.json",
        "acme/action_plan.md",
        "budgets.json",
    ] {
        assert!(settings.out_dir.join(name).exists(), "missing {name}");
    }

    let budgets: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(settings.out_dir.join("budgets.json")).unwrap())
            .unwrap();
    assert_eq!(budgets["F2"], "0");
    assert_eq!(budgets["old"], "9000");
}

#[test]
fn plan_for_unknown_company_is_invalid_input() {
    let (_temp, root) = data_dir();
    let err = run_plan(
        &settings(&root),
        &FsCatalogSource::new(root.clone()),
        &FsProfileSource::in_data_dir(&root),
        "ghost",
    )
    .unwrap_err();
    assert!(matches!(err, ToolError::InvalidInput(_)));
}

#[test]
fn missing_catalog_is_a_tool_error() {
    let (_temp, root) = data_dir();
    fs::remove_file(root.join("catalog/funding.json")).unwrap();
    let err = run_plan(
        &settings(&root),
        &FsCatalogSource::new(root.clone()),
        &FsProfileSource::in_data_dir(&root),
        "acme",
    )
    .unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn batch_shares_budgets_and_writes_summary() {
    let (_temp, root) = data_dir();
    fs::write(root.join("profiles/zz-broken.json"), "{ nope").unwrap();
    let settings = BatchSettings {
        plan: settings(&root),
        order: vec![],
    };

    let run = run_batch(
        &settings,
        &FsCatalogSource::new(root.clone()),
        &FsProfileSource::in_data_dir(&root),
        default_tool_info(),
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(run.report.summary.planned, 2);
    assert_eq!(run.report.summary.skipped, 1);
    // acme drains F2 on its solar measure; beta's fleet measure only finds nothing left.
    let beta = run
        .outcomes
        .iter()
        .find(|o| o.plan.company_id == "beta")
        .unwrap();
    let fleet = beta
        .allocation
        .measures
        .iter()
        .find(|m| m.measure_id == "fleet-ev")
        .unwrap();
    assert!(fleet.allocations.iter().all(|a| a.funding_id != "F2"));

    write_batch_artifacts(&run, &settings.plan.out_dir, &FsWritePort).unwrap();
    assert!(root.join("out/batch.json").exists());
    assert!(root.join("out/budgets.json").exists());
    assert!(root.join("out/beta/action_plan.md").exists());
}
