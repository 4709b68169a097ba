//! Handler for the summary command

use std::path::PathBuf;

use crate::error::CliError;
use drover_core::summarize;

/// Arguments for the `summary` command
pub struct SummaryArgs {
    pub store_file: PathBuf,
    pub json: bool,
}

/// Handle the `summary` command
pub fn handle_summary(args: &SummaryArgs) -> Result<(), CliError> {
    let summaries = summarize(&args.store_file)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("=== Store summary: {} ===", args.store_file.display());
    if summaries.is_empty() {
        println!("No tables.");
        return Ok(());
    }

    for summary in &summaries {
        println!(
            "  {}: {} rows, {} columns",
            summary.name, summary.rows, summary.columns
        );
    }
    println!();
    println!("{} table(s)", summaries.len());
    Ok(())
}
