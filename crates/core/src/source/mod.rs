//! Source document stores
//!
//! A source exposes two operations: list collection names by prefix and
//! stream every document of one collection into a newline-delimited JSON
//! artifact. [`MongoSource`] drives the MongoDB CLI tooling;
//! [`LocalSource`] reads a directory of `.jsonl` dumps, which also makes
//! the whole pipeline testable offline.

mod local;
mod mongo;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::SourceError;

pub use local::LocalSource;
pub use mongo::MongoSource;

/// Result of exporting one collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    /// Collection the artifact was exported from
    pub collection: String,
    /// Path of the written artifact
    pub path: PathBuf,
    /// Size of the artifact in bytes
    pub bytes: u64,
}

/// A source document store.
pub trait SourceStore {
    /// All collection names starting with `prefix`, sorted, each exactly
    /// once. The full set is collected before returning, regardless of
    /// how the source batches its listing. Zero matches is `Ok(vec![])`.
    fn list_collections(&self, prefix: &str) -> Result<Vec<String>, SourceError>;

    /// Export every document of `collection` to `dest`, one JSON object
    /// per line, nested structure preserved, no schema coercion. Any
    /// pre-existing file at `dest` is overwritten, never appended to.
    fn export_collection(&self, collection: &str, dest: &Path) -> Result<ExportStats, SourceError>;

    /// Human-readable description of the source, used in reports.
    fn describe(&self) -> String;
}
