//! Run configuration
//!
//! All settings are resolved once per run into an immutable value that is
//! passed to every stage. There is no global state; every default can be
//! overridden per invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default collection name-prefix filter.
pub const DEFAULT_PREFIX: &str = "flattened_";

/// Default directory for exported JSON artifacts.
pub const DEFAULT_OUTPUT_DIR: &str = "./export";

/// Connection descriptor for a source document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source host (default: localhost)
    pub host: String,
    /// Source port (default: 27017)
    pub port: u16,
    /// Source database name
    pub database: String,
}

impl SourceConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            database: database.into(),
        }
    }
}

/// Immutable configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Source database name (used for store tagging and reporting)
    pub database: String,
    /// Name-prefix filter for collection discovery
    pub prefix: String,
    /// Directory that export artifacts are written to
    pub output_dir: PathBuf,
    /// Destination store file
    pub store_path: PathBuf,
    /// Remove each artifact after its successful load
    pub remove_artifacts: bool,
}

impl RunConfig {
    pub fn builder(database: impl Into<String>) -> RunConfigBuilder {
        RunConfigBuilder {
            database: database.into(),
            prefix: None,
            output_dir: None,
            store_path: None,
            remove_artifacts: true,
        }
    }

    /// Path of the export artifact for one collection.
    pub fn artifact_path(&self, collection: &str) -> PathBuf {
        self.output_dir.join(format!("{collection}.jsonl"))
    }
}

/// Builder for [`RunConfig`] with the documented defaults.
pub struct RunConfigBuilder {
    database: String,
    prefix: Option<String>,
    output_dir: Option<PathBuf>,
    store_path: Option<PathBuf>,
    remove_artifacts: bool,
}

impl RunConfigBuilder {
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn store_path(mut self, path: impl AsRef<Path>) -> Self {
        self.store_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn remove_artifacts(mut self, remove: bool) -> Self {
        self.remove_artifacts = remove;
        self
    }

    pub fn build(self) -> RunConfig {
        let store_path = self
            .store_path
            .unwrap_or_else(|| PathBuf::from(format!("./{}.duckdb", self.database)));
        RunConfig {
            prefix: self.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            output_dir: self
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            store_path,
            remove_artifacts: self.remove_artifacts,
            database: self.database,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::builder("meta").build();
        assert_eq!(config.prefix, "flattened_");
        assert_eq!(config.output_dir, PathBuf::from("./export"));
        assert_eq!(config.store_path, PathBuf::from("./meta.duckdb"));
        assert!(config.remove_artifacts);
    }

    #[test]
    fn test_overrides() {
        let config = RunConfig::builder("ref")
            .prefix("raw_")
            .output_dir("/tmp/out")
            .store_path("/tmp/ref.duckdb")
            .remove_artifacts(false)
            .build();
        assert_eq!(config.prefix, "raw_");
        assert_eq!(config.artifact_path("raw_a"), PathBuf::from("/tmp/out/raw_a.jsonl"));
        assert!(!config.remove_artifacts);
    }
}
