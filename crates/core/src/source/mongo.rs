//! MongoDB source driven through the MongoDB CLI tooling
//!
//! Listing goes through `mongosh` with JSON output that is parsed with
//! serde_json (never scraped from free-form text); document export goes
//! through `mongoexport`, which writes one JSON document per line and
//! truncates any existing output file.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::source::{ExportStats, SourceStore};

/// Source backed by a running MongoDB instance.
pub struct MongoSource {
    config: SourceConfig,
    mongosh_bin: String,
    mongoexport_bin: String,
}

impl MongoSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            mongosh_bin: "mongosh".to_string(),
            mongoexport_bin: "mongoexport".to_string(),
        }
    }

    /// Override the tool binaries, e.g. for a non-PATH install.
    pub fn with_binaries(
        mut self,
        mongosh: impl Into<String>,
        mongoexport: impl Into<String>,
    ) -> Self {
        self.mongosh_bin = mongosh.into();
        self.mongoexport_bin = mongoexport.into();
        self
    }

    fn connection_uri(&self) -> String {
        format!(
            "mongodb://{}:{}/{}",
            self.config.host, self.config.port, self.config.database
        )
    }

    // No connect/read timeout is applied here; a hung source blocks the
    // run. A timeout wrapper around this call is the place to close that
    // gap.
    fn run_tool(&self, tool: &str, command: &mut Command) -> Result<std::process::Output, SourceError> {
        command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SourceError::ToolNotFound {
                    tool: tool.to_string(),
                }
            } else {
                SourceError::Io(e)
            }
        })
    }
}

impl SourceStore for MongoSource {
    fn list_collections(&self, prefix: &str) -> Result<Vec<String>, SourceError> {
        // getCollectionNames returns the complete set in one reply, so
        // there is no listing batch to page through.
        let mut command = Command::new(&self.mongosh_bin);
        command
            .arg(self.connection_uri())
            .arg("--quiet")
            .arg("--eval")
            .arg("EJSON.stringify(db.getCollectionNames())");

        let output = self.run_tool(&self.mongosh_bin, &mut command)?;
        if !output.status.success() {
            return Err(SourceError::Connection {
                database: self.config.database.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let all: Vec<String> = serde_json::from_str(stdout.trim())
            .map_err(|e| SourceError::MalformedOutput(format!("collection listing: {e}")))?;

        let mut names: Vec<String> = all
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        Ok(names)
    }

    fn export_collection(&self, collection: &str, dest: &Path) -> Result<ExportStats, SourceError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut command = Command::new(&self.mongoexport_bin);
        command
            .arg("--host")
            .arg(&self.config.host)
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--db")
            .arg(&self.config.database)
            .arg("--collection")
            .arg(collection)
            .arg("--type")
            .arg("json")
            .arg("--out")
            .arg(dest);

        let output = self.run_tool(&self.mongoexport_bin, &mut command)?;
        if !output.status.success() {
            return Err(SourceError::CollectionUnreachable {
                collection: collection.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let bytes = fs::metadata(dest)?.len();
        tracing::info!(collection, bytes, "exported collection");

        Ok(ExportStats {
            collection: collection.to_string(),
            path: dest.to_path_buf(),
            bytes,
        })
    }

    fn describe(&self) -> String {
        format!("mongodb {}:{}/{}", self.config.host, self.config.port, self.config.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_tool_reports_install_hint() {
        let source = MongoSource::new(SourceConfig::new("meta"))
            .with_binaries("mongosh-definitely-not-installed", "mongoexport-missing");

        let err = source.list_collections("flattened_").unwrap_err();
        match err {
            SourceError::ToolNotFound { tool } => {
                assert_eq!(tool, "mongosh-definitely-not-installed");
                assert!(err_to_string_contains_hint(&tool));
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }

        let dir = TempDir::new().unwrap();
        let err = source
            .export_collection("flattened_a", &dir.path().join("a.jsonl"))
            .unwrap_err();
        assert!(matches!(err, SourceError::ToolNotFound { .. }));
    }

    fn err_to_string_contains_hint(tool: &str) -> bool {
        let err = SourceError::ToolNotFound {
            tool: tool.to_string(),
        };
        err.to_string().contains("Installation")
    }

    #[test]
    fn test_connection_uri() {
        let mut config = SourceConfig::new("meta");
        config.host = "db.internal".to_string();
        config.port = 27018;
        let source = MongoSource::new(config);
        assert_eq!(source.connection_uri(), "mongodb://db.internal:27018/meta");
    }
}
