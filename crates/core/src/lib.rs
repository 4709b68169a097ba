//! Core library for drover, a batch pipeline that moves document-store
//! collections into a DuckDB store file.
//!
//! Stages, in data-flow order:
//! - `source`: discover collections by name prefix and export each to a
//!   newline-delimited JSON artifact
//! - `schema`: infer a unified columnar schema by full scan
//! - `loader`: materialize one table per artifact (create-or-replace)
//! - `report`: per-table row and column summaries
//! - `pipeline`: sequences the above with per-collection failure
//!   isolation
//! - `fetch`: independent auxiliary resource downloads
//!
//! Everything is blocking, single-threaded and sequential within one
//! run.

pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use config::{DEFAULT_OUTPUT_DIR, DEFAULT_PREFIX, RunConfig, SourceConfig};
pub use error::{FetchError, PipelineError, SourceError};
pub use fetch::{FetchReport, fetch_resources};
pub use loader::{LoadStats, load_artifact};
pub use pipeline::{BatchPlan, CollectionFailure, Pipeline, RunReport, SourceJob, Stage};
pub use report::summarize;
pub use schema::{FieldType, TableSchema, sanitize_table_name};
pub use source::{ExportStats, LocalSource, MongoSource, SourceStore};
pub use store::{AnalyticalStore, TableSummary};
