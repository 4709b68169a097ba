//! Error types for the pipeline layers

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a source document store
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(
        "{tool} not found. The MongoDB Database Tools are required for this source.\n\nInstallation:\n  macOS:    brew install mongosh mongodb-database-tools\n  Linux:    https://www.mongodb.com/docs/database-tools/installation/\n\nAlternatively, point drover at a directory of .jsonl dumps with --from-dir."
    )]
    ToolNotFound { tool: String },

    #[error("Failed to connect to source '{database}': {message}")]
    Connection { database: String, message: String },

    #[error("Collection '{collection}' could not be exported: {message}")]
    CollectionUnreachable { collection: String, message: String },

    #[error("Source returned malformed output: {0}")]
    MalformedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the auxiliary resource fetcher
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch '{name}': {source}")]
    Http {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch '{name}': server returned {status}")]
    Status { name: String, status: u16 },

    #[error("Failed to write '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level pipeline error taxonomy
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {message}\nHint: {hint}")]
    Configuration { message: String, hint: String },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(
        "Artifact for collection '{collection}' not found at {path}.\nRun 'drover export {collection}' first."
    )]
    ArtifactMissing { collection: String, path: PathBuf },

    #[error("Malformed JSON at {path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error(
        "Store file {store} already holds tables from source database '{previous}'; refusing to mix in '{attempted}'. Use a separate store file per source database."
    )]
    SchemaConflict {
        store: PathBuf,
        previous: String,
        attempted: String,
    },

    #[error("Store file not found: {0}")]
    StoreMissing(PathBuf),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<duckdb::Error> for PipelineError {
    fn from(e: duckdb::Error) -> Self {
        PipelineError::Store(e.to_string())
    }
}
