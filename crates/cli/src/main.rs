//! CLI binary entry point for drover

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::batch::{
    ExportArgs, ListArgs, LoadArgs, RunArgs, handle_export, handle_list, handle_load, handle_run,
};
use commands::clean::{CleanArgs, handle_clean};
use commands::fetch::{FetchArgs, handle_fetch};
use commands::summary::{SummaryArgs, handle_summary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "drover")]
#[command(about = "Batch MongoDB-to-DuckDB collection pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List source collections matching the name prefix
    List {
        /// Source database name
        #[arg(short, long)]
        database: String,
        /// Collection name prefix to match
        #[arg(short, long, default_value = "flattened_")]
        prefix: String,
        /// MongoDB host
        #[arg(long, default_value = "localhost")]
        host: String,
        /// MongoDB port
        #[arg(long, default_value_t = 27017)]
        port: u16,
        /// Read from a directory of .jsonl dumps instead of MongoDB
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },
    /// Export one collection to a newline-delimited JSON artifact
    Export {
        /// Collection to export
        collection: String,
        /// Source database name
        #[arg(short, long)]
        database: String,
        /// Directory to write the artifact into
        #[arg(short, long, default_value = "./export")]
        output_dir: PathBuf,
        /// MongoDB host
        #[arg(long, default_value = "localhost")]
        host: String,
        /// MongoDB port
        #[arg(long, default_value_t = 27017)]
        port: u16,
        /// Read from a directory of .jsonl dumps instead of MongoDB
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },
    /// Load one exported artifact into an analytical store table
    Load {
        /// Path to the .jsonl artifact
        artifact: PathBuf,
        /// Analytical store file to load into
        #[arg(short, long)]
        store_file: PathBuf,
        /// Override the derived table name
        #[arg(short, long)]
        table: Option<String>,
        /// Tag the store with this source database, refusing mixed sources
        #[arg(long)]
        database: Option<String>,
    },
    /// Run the full pipeline: discover, export, load, summarize
    Run {
        /// Source database name (repeat for multiple databases)
        #[arg(short, long = "database", required = true)]
        databases: Vec<String>,
        /// Collection name prefix to match
        #[arg(short, long, default_value = "flattened_")]
        prefix: String,
        /// Directory for intermediate .jsonl artifacts
        #[arg(short, long, default_value = "./export")]
        output_dir: PathBuf,
        /// Store file to use (single --database only)
        #[arg(long, conflicts_with = "store_dir")]
        store_file: Option<PathBuf>,
        /// Directory in which each database gets its own <db>.duckdb file
        #[arg(long)]
        store_dir: Option<PathBuf>,
        /// MongoDB host
        #[arg(long, default_value = "localhost")]
        host: String,
        /// MongoDB port
        #[arg(long, default_value_t = 27017)]
        port: u16,
        /// Read from a directory of .jsonl dumps instead of MongoDB
        #[arg(long)]
        from_dir: Option<PathBuf>,
        /// Keep intermediate artifacts after a successful load
        #[arg(long)]
        keep_artifacts: bool,
        /// Emit the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report per-table row and column counts for a store file
    Summary {
        /// Analytical store file to summarize
        store_file: PathBuf,
        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download named resources from a base URL into the output directory
    Fetch {
        /// Resource names to append to the base URL
        #[arg(required = true)]
        names: Vec<String>,
        /// Base URL the resource names are resolved against
        #[arg(short, long)]
        base_url: String,
        /// Directory to write downloads into
        #[arg(short, long, default_value = "./export")]
        output_dir: PathBuf,
    },
    /// Remove exported artifacts and optionally the store file
    Clean {
        /// Directory holding .jsonl artifacts
        #[arg(short, long, default_value = "./export")]
        output_dir: PathBuf,
        /// Also remove this store file
        #[arg(long)]
        store_file: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            database,
            prefix,
            host,
            port,
            from_dir,
        } => {
            let args = ListArgs {
                host,
                port,
                database,
                prefix,
                from_dir,
            };
            handle_list(&args)
        }
        Commands::Export {
            collection,
            database,
            output_dir,
            host,
            port,
            from_dir,
        } => {
            let args = ExportArgs {
                collection,
                host,
                port,
                database,
                output_dir,
                from_dir,
            };
            handle_export(&args)
        }
        Commands::Load {
            artifact,
            store_file,
            table,
            database,
        } => {
            let args = LoadArgs {
                artifact,
                store_file,
                table,
                database,
            };
            handle_load(&args)
        }
        Commands::Run {
            databases,
            prefix,
            output_dir,
            store_file,
            store_dir,
            host,
            port,
            from_dir,
            keep_artifacts,
            json,
        } => {
            let args = RunArgs {
                host,
                port,
                databases,
                prefix,
                output_dir,
                store_file,
                store_dir,
                from_dir,
                keep_artifacts,
                json,
            };
            handle_run(&args)
        }
        Commands::Summary { store_file, json } => {
            let args = SummaryArgs { store_file, json };
            handle_summary(&args)
        }
        Commands::Fetch {
            names,
            base_url,
            output_dir,
        } => {
            let args = FetchArgs {
                base_url,
                names,
                output_dir,
            };
            handle_fetch(&args)
        }
        Commands::Clean {
            output_dir,
            store_file,
        } => {
            let args = CleanArgs {
                output_dir,
                store_file,
            };
            handle_clean(&args)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
