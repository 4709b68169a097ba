//! Handler for the fetch command

use std::path::PathBuf;

use crate::error::CliError;
use drover_core::fetch_resources;

/// Arguments for the `fetch` command
pub struct FetchArgs {
    pub base_url: String,
    pub names: Vec<String>,
    pub output_dir: PathBuf,
}

/// Handle the `fetch` command
pub fn handle_fetch(args: &FetchArgs) -> Result<(), CliError> {
    if args.names.is_empty() {
        return Err(CliError::InvalidArgument(
            "at least one resource name is required".to_string(),
        ));
    }

    let report = fetch_resources(&args.base_url, &args.names, &args.output_dir)?;

    for resource in &report.fetched {
        println!(
            "Fetched {} ({} bytes) -> {}",
            resource.name,
            resource.bytes,
            resource.path.display()
        );
    }
    for failure in &report.failures {
        eprintln!("Failed: {failure}");
    }

    println!(
        "{} fetched, {} failed",
        report.fetched.len(),
        report.failures.len()
    );

    if !report.failures.is_empty() {
        std::process::exit(2);
    }
    Ok(())
}
