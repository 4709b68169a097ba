//! Handlers for the list, export, load and run commands

use std::path::PathBuf;

use serde::Serialize;

use crate::commands::make_source;
use crate::error::CliError;
use drover_core::{
    AnalyticalStore, BatchPlan, Pipeline, RunConfig, RunReport, SourceJob, SourceStore,
    load_artifact,
};

/// Arguments for the `list` command
pub struct ListArgs {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub prefix: String,
    pub from_dir: Option<PathBuf>,
}

/// Arguments for the `export` command
pub struct ExportArgs {
    pub collection: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub output_dir: PathBuf,
    pub from_dir: Option<PathBuf>,
}

/// Arguments for the `load` command
pub struct LoadArgs {
    pub artifact: PathBuf,
    pub store_file: PathBuf,
    pub table: Option<String>,
    /// Tag the store with this source database, refusing mixed sources
    pub database: Option<String>,
}

/// Arguments for the `run` command
pub struct RunArgs {
    pub host: String,
    pub port: u16,
    pub databases: Vec<String>,
    pub prefix: String,
    pub output_dir: PathBuf,
    pub store_file: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    pub from_dir: Option<PathBuf>,
    pub keep_artifacts: bool,
    pub json: bool,
}

/// Handle the `list` command
pub fn handle_list(args: &ListArgs) -> Result<(), CliError> {
    let source = make_source(&args.host, args.port, &args.database, args.from_dir.as_ref());
    let names = source.list_collections(&args.prefix)?;

    if names.is_empty() {
        println!("No collections match prefix '{}'.", args.prefix);
        return Ok(());
    }

    for name in &names {
        println!("{name}");
    }
    println!();
    println!("{} collection(s)", names.len());
    Ok(())
}

/// Handle the `export` command
pub fn handle_export(args: &ExportArgs) -> Result<(), CliError> {
    let source = make_source(&args.host, args.port, &args.database, args.from_dir.as_ref());
    let dest = args.output_dir.join(format!("{}.jsonl", args.collection));

    let stats = source.export_collection(&args.collection, &dest)?;
    println!(
        "Exported '{}' to {} ({} bytes)",
        stats.collection,
        stats.path.display(),
        stats.bytes
    );
    Ok(())
}

/// Handle the `load` command
pub fn handle_load(args: &LoadArgs) -> Result<(), CliError> {
    let store = AnalyticalStore::open(&args.store_file)?;
    if let Some(ref database) = args.database {
        store.claim_for_source(database)?;
    }

    let stats = load_artifact(&store, &args.artifact, args.table.as_deref())?;
    println!(
        "Loaded {} into '{}': {} rows, {} columns",
        args.artifact.display(),
        stats.table,
        stats.rows,
        stats.columns
    );
    Ok(())
}

/// Outcome of one batch invocation across every planned job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub reports: Vec<RunReport>,
    pub failed_databases: Vec<JobFailure>,
}

/// A job whose run could not produce a report at all.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailure {
    pub database: String,
    pub error: String,
}

impl BatchOutcome {
    fn is_clean(&self) -> bool {
        self.failed_databases.is_empty() && self.reports.iter().all(RunReport::is_clean)
    }
}

/// Run every job of a plan. A job that fails outright (unreachable
/// source, store it cannot claim) is recorded and the remaining
/// databases still run.
fn run_plan<F>(plan: &BatchPlan, args: &RunArgs, make: F) -> BatchOutcome
where
    F: Fn(&SourceJob) -> Box<dyn SourceStore>,
{
    let mut outcome = BatchOutcome {
        reports: Vec::new(),
        failed_databases: Vec::new(),
    };

    for job in &plan.jobs {
        let source = make(job);
        let config = RunConfig::builder(&job.database)
            .prefix(&args.prefix)
            .output_dir(&args.output_dir)
            .store_path(&job.store_path)
            .remove_artifacts(!args.keep_artifacts)
            .build();

        match Pipeline::new(source.as_ref(), config).run() {
            Ok(report) => outcome.reports.push(report),
            Err(e) => {
                tracing::warn!(database = %job.database, error = %e, "batch job failed");
                outcome.failed_databases.push(JobFailure {
                    database: job.database.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

/// Handle the `run` command
pub fn handle_run(args: &RunArgs) -> Result<(), CliError> {
    let plan = build_plan(args)?;
    plan.validate()?;

    if args.from_dir.is_some() && plan.jobs.len() > 1 {
        return Err(CliError::InvalidArgument(
            "--from-dir supports a single --database per run".to_string(),
        ));
    }

    let outcome = run_plan(&plan, args, |job| {
        make_source(&args.host, args.port, &job.database, args.from_dir.as_ref())
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        for report in &outcome.reports {
            print_report(report);
        }
        if !outcome.failed_databases.is_empty() {
            println!();
            println!("Failed {} database(s):", outcome.failed_databases.len());
            for failure in &outcome.failed_databases {
                println!("  {}: {}", failure.database, failure.error);
            }
        }
    }

    if !outcome.is_clean() {
        std::process::exit(2);
    }
    Ok(())
}

fn build_plan(args: &RunArgs) -> Result<BatchPlan, CliError> {
    if args.databases.is_empty() {
        return Err(CliError::InvalidArgument(
            "at least one --database is required".to_string(),
        ));
    }
    if args.store_file.is_some() && args.databases.len() > 1 {
        return Err(CliError::InvalidArgument(
            "--store-file only works with a single --database; use --store-dir to give each source database its own store file".to_string(),
        ));
    }

    let jobs = args
        .databases
        .iter()
        .map(|database| {
            let store_path = match (&args.store_file, &args.store_dir) {
                (Some(file), _) => file.clone(),
                (None, Some(dir)) => dir.join(format!("{database}.duckdb")),
                (None, None) => PathBuf::from(format!("./{database}.duckdb")),
            };
            SourceJob {
                database: database.clone(),
                store_path,
            }
        })
        .collect();

    Ok(BatchPlan::new(jobs))
}

fn print_report(report: &RunReport) {
    println!();
    println!("=== Batch run: {} ===", report.database);
    println!("Store: {}", report.store_path.display());
    println!("Discovered {} collection(s)", report.discovered.len());

    for stats in &report.loaded {
        println!("  {}: {} rows, {} columns", stats.table, stats.rows, stats.columns);
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failed {} collection(s):", report.failures.len());
        for failure in &report.failures {
            println!("  {} ({} stage): {}", failure.collection, failure.stage, failure.error);
            println!("    retry with: {}", failure.retry);
        }
    }

    println!();
    println!("Tables in store:");
    if report.summaries.is_empty() {
        println!("  (none)");
    }
    for summary in &report.summaries {
        println!("  {}: {} rows, {} columns", summary.name, summary.rows, summary.columns);
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::InvalidArgument(format!("failed to encode report: {e}"))
    }
}
