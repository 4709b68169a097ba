//! Batch pipeline orchestration
//!
//! One run per source database:
//! `DISCOVER -> (EXPORT[i] -> LOAD[i])* -> SUMMARIZE`.
//!
//! Discovery failure is fatal for the run; an empty discovery is a valid
//! empty batch. Each export/load pair is isolated: a failure is recorded
//! with a remedial retry command and the loop continues with the next
//! collection. The summary always runs over whatever succeeded.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::loader::{LoadStats, load_artifact};
use crate::source::SourceStore;
use crate::store::{AnalyticalStore, TableSummary};

/// Stage at which a collection failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Export,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Export => write!(f, "export"),
            Stage::Load => write!(f, "load"),
        }
    }
}

/// A recorded per-collection failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFailure {
    pub collection: String,
    pub stage: Stage,
    pub error: String,
    /// Command that retries just this item
    pub retry: String,
}

/// Outcome of one batch run against one source database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub database: String,
    pub store_path: PathBuf,
    pub discovered: Vec<String>,
    pub loaded: Vec<LoadStats>,
    pub failures: Vec<CollectionFailure>,
    pub summaries: Vec<TableSummary>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One source database paired with its own store file.
#[derive(Debug, Clone)]
pub struct SourceJob {
    pub database: String,
    pub store_path: PathBuf,
}

/// A batch of jobs, validated so that no two source databases share a
/// store file (mixing them would invite silent column/name collisions).
#[derive(Debug, Clone, Default)]
pub struct BatchPlan {
    pub jobs: Vec<SourceJob>,
}

impl BatchPlan {
    pub fn new(jobs: Vec<SourceJob>) -> Self {
        Self { jobs }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        for (i, job) in self.jobs.iter().enumerate() {
            for other in &self.jobs[..i] {
                if other.database == job.database {
                    return Err(PipelineError::Configuration {
                        message: format!("source database '{}' listed twice", job.database),
                        hint: "pass each --database at most once".to_string(),
                    });
                }
                if other.store_path == job.store_path {
                    return Err(PipelineError::SchemaConflict {
                        store: job.store_path.clone(),
                        previous: other.database.clone(),
                        attempted: job.database.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Orchestrates one batch run.
pub struct Pipeline<'a> {
    source: &'a dyn SourceStore,
    config: RunConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn SourceStore, config: RunConfig) -> Self {
        Self { source, config }
    }

    /// Run the full batch.
    ///
    /// Re-running over unchanged source data converges to identical
    /// store contents. Fields whose values are non-deterministic at the
    /// source (current timestamps, regenerated ids) are outside that
    /// guarantee.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let config = &self.config;
        tracing::info!(
            database = %config.database,
            source = %self.source.describe(),
            prefix = %config.prefix,
            "starting batch run"
        );

        // DISCOVER: fatal on connection failure, empty batch is valid
        let discovered = self.source.list_collections(&config.prefix)?;
        if discovered.is_empty() {
            tracing::info!(prefix = %config.prefix, "no collections matched");
            return Ok(RunReport {
                database: config.database.clone(),
                store_path: config.store_path.clone(),
                discovered,
                loaded: Vec::new(),
                failures: Vec::new(),
                summaries: summaries_if_present(config),
            });
        }

        let store = AnalyticalStore::open(&config.store_path)?;
        store.claim_for_source(&config.database)?;

        let mut loaded = Vec::new();
        let mut failures = Vec::new();

        for collection in &discovered {
            let artifact = config.artifact_path(collection);

            // EXPORT
            if let Err(e) = self.source.export_collection(collection, &artifact) {
                tracing::warn!(collection = %collection, error = %e, "export failed");
                failures.push(CollectionFailure {
                    collection: collection.clone(),
                    stage: Stage::Export,
                    error: e.to_string(),
                    retry: format!(
                        "drover export {} --database {}",
                        collection, config.database
                    ),
                });
                continue;
            }

            // LOAD
            match load_artifact(&store, &artifact, None) {
                Ok(stats) => {
                    if config.remove_artifacts {
                        if let Err(e) = std::fs::remove_file(&artifact) {
                            tracing::warn!(path = %artifact.display(), error = %e, "failed to remove artifact");
                        }
                    }
                    loaded.push(stats);
                }
                Err(e) => {
                    tracing::warn!(collection = %collection, error = %e, "load failed");
                    failures.push(CollectionFailure {
                        collection: collection.clone(),
                        stage: Stage::Load,
                        error: e.to_string(),
                        retry: format!(
                            "drover load {} --store-file {}",
                            artifact.display(),
                            config.store_path.display()
                        ),
                    });
                }
            }
        }

        // SUMMARIZE always runs, even after per-collection failures
        let summaries = store.table_summaries()?;

        tracing::info!(
            database = %config.database,
            loaded = loaded.len(),
            failed = failures.len(),
            "batch run finished"
        );

        Ok(RunReport {
            database: config.database.clone(),
            store_path: config.store_path.clone(),
            discovered,
            loaded,
            failures,
            summaries,
        })
    }
}

fn summaries_if_present(config: &RunConfig) -> Vec<TableSummary> {
    if config.store_path.is_file() {
        crate::report::summarize(&config.store_path).unwrap_or_default()
    } else {
        Vec::new()
    }
}
