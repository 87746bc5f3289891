mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use config::{ConfigMerger, PlanOverrides};
use decarb_core::CancellationToken;
use decarb_core::adapters::{FsCatalogSource, FsProfileSource, FsWritePort};
use decarb_core::pipeline::{
    ToolError, default_tool_info, run_batch, run_eligibility, run_plan, write_batch_artifacts,
    write_eligibility_artifacts, write_plan_run_artifacts,
};
use decarb_core::settings::{BatchSettings, PlanSettings};
use decarb_render::{render_batch_md, render_eligibility_md, render_plan_md};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "decarb",
    version,
    about = "Decarbonization action plans with deterministic funding allocation."
)]
struct Cli {
    /// Data directory holding catalog/, profiles/ and decarb.toml.
    #[arg(long, global = true, default_value = ".")]
    data_dir: Utf8PathBuf,

    /// Output directory for artifacts (default: <data_dir>/out).
    #[arg(long, global = true)]
    out_dir: Option<Utf8PathBuf>,

    /// Date funding deadlines are checked against, YYYY-MM-DD (default: today, UTC).
    #[arg(long, global = true)]
    reference_date: Option<NaiveDate>,

    /// Timestamp stamped on plans, RFC 3339 (default: now).
    #[arg(long, global = true)]
    created_at: Option<DateTime<Utc>>,

    /// Stdout format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report applicable and blocked measures and candidate funding for one company.
    Eligibility(EligibilityArgs),
    /// Allocate funding and build an action plan for one company.
    Plan(PlanArgs),
    /// Plan every company in turn against one shared set of budgets.
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
struct EligibilityArgs {
    /// Company id as found in profiles/*.json.
    #[arg(long)]
    company: String,
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// Company id as found in profiles/*.json.
    #[arg(long)]
    company: String,

    #[command(flatten)]
    selection: SelectionArgs,
}

#[derive(Debug, Args)]
struct BatchArgs {
    /// Company ids in processing order (default: every profile, in file name order).
    #[arg(long, value_delimiter = ',')]
    order: Vec<String>,

    #[command(flatten)]
    selection: SelectionArgs,
}

#[derive(Debug, Args)]
struct SelectionArgs {
    /// Plan only these measures (repeatable).
    #[arg(long = "measure")]
    measures: Vec<String>,

    /// Maximum number of measures planned per company.
    #[arg(long)]
    max_measures: Option<usize>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match real_main() {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn real_main() -> Result<(), ToolError> {
    let cli = Cli::parse();

    let file_config = config::load_or_default(&cli.data_dir)
        .map_err(|e| ToolError::InvalidInput(format!("{e:#}")))?;
    let merger = ConfigMerger::new(file_config);

    let mut overrides = PlanOverrides {
        out_dir: cli.out_dir.clone(),
        reference_date: cli.reference_date,
        created_at: cli.created_at,
        ..Default::default()
    };

    match cli.cmd {
        Command::Eligibility(args) => {
            let settings = merger.merge_plan_args(&cli.data_dir, &overrides);
            cmd_eligibility(&settings, &args.company, cli.format)
        }
        Command::Plan(args) => {
            overrides.measures = args.selection.measures;
            overrides.max_measures = args.selection.max_measures;
            let settings = merger.merge_plan_args(&cli.data_dir, &overrides);
            cmd_plan(&settings, &args.company, cli.format)
        }
        Command::Batch(args) => {
            overrides.measures = args.selection.measures;
            overrides.max_measures = args.selection.max_measures;
            let settings = merger.merge_batch_args(&cli.data_dir, &overrides, &args.order);
            cmd_batch(&settings, cli.format)
        }
    }
}

fn sources(settings: &PlanSettings) -> (FsCatalogSource, FsProfileSource) {
    (
        FsCatalogSource::new(settings.data_dir.clone()),
        FsProfileSource::in_data_dir(&settings.data_dir),
    )
}

fn cmd_eligibility(
    settings: &PlanSettings,
    company: &str,
    format: OutputFormat,
) -> Result<(), ToolError> {
    debug!(?settings, "eligibility settings");
    let (catalogs, profiles) = sources(settings);
    let run = run_eligibility(settings, &catalogs, &profiles, company)?;
    write_eligibility_artifacts(&run, &settings.out_dir, &FsWritePort)?;

    let assessment = &run.assessment;
    match format {
        OutputFormat::Text => print!(
            "{}",
            render_eligibility_md(&assessment.eligibility, &assessment.funding)
        ),
        OutputFormat::Json => print_json(&serde_json::json!({
            "eligibility": assessment.eligibility,
            "funding_candidates": assessment.funding,
        }))?,
    }

    info!("wrote eligibility artifacts to {}", settings.out_dir);
    Ok(())
}

fn cmd_plan(
    settings: &PlanSettings,
    company: &str,
    format: OutputFormat,
) -> Result<(), ToolError> {
    debug!(?settings, "plan settings");
    let (catalogs, profiles) = sources(settings);
    let run = run_plan(settings, &catalogs, &profiles, company)?;
    write_plan_run_artifacts(&run, &settings.out_dir, &FsWritePort)?;

    let outcome = &run.outcome;
    match format {
        OutputFormat::Text => print!("{}", render_plan_md(&outcome.plan, &outcome.allocation)),
        OutputFormat::Json => print_json(&outcome.plan)?,
    }

    info!("wrote plan to {}", settings.out_dir);
    Ok(())
}

fn cmd_batch(
    settings: &BatchSettings,
    format: OutputFormat,
) -> Result<(), ToolError> {
    debug!(?settings, "batch settings");
    let (catalogs, profiles) = sources(&settings.plan);
    let run = run_batch(
        settings,
        &catalogs,
        &profiles,
        default_tool_info(),
        &CancellationToken::new(),
    )?;
    write_batch_artifacts(&run, &settings.plan.out_dir, &FsWritePort)?;

    match format {
        OutputFormat::Text => print!("{}", render_batch_md(&run.report)),
        OutputFormat::Json => print_json(&run.report)?,
    }

    info!("wrote batch artifacts to {}", settings.plan.out_dir);
    Ok(())
}

fn print_json<T: serde::Serialize>(v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    println!("{}", s);
    Ok(())
}
