//! Directory-backed source of JSONL dumps

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::source::{ExportStats, SourceStore};

/// A source whose collections are `.jsonl` files in one directory.
///
/// The collection name is the file stem. Useful for re-running loads
/// against a previous export without touching the live source.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(format!("{collection}.jsonl"))
    }
}

impl SourceStore for LocalSource {
    fn list_collections(&self, prefix: &str) -> Result<Vec<String>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::Connection {
                database: self.root.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let pattern = format!("{}/*.jsonl", self.root.display());
        let entries = glob::glob(&pattern)
            .map_err(|e| SourceError::MalformedOutput(format!("{pattern}: {e}")))?;

        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                        && stem.starts_with(prefix)
                    {
                        names.push(stem.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing path: {}", e);
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn export_collection(&self, collection: &str, dest: &Path) -> Result<ExportStats, SourceError> {
        let src = self.collection_path(collection);
        if !src.is_file() {
            return Err(SourceError::CollectionUnreachable {
                collection: collection.to_string(),
                message: format!("no such file: {}", src.display()),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        // fs::copy truncates an existing destination, which keeps reruns
        // deterministic. Same-path export is already in place.
        let bytes = if src == dest {
            fs::metadata(&src)?.len()
        } else {
            fs::copy(&src, dest)?
        };

        Ok(ExportStats {
            collection: collection.to_string(),
            path: dest.to_path_buf(),
            bytes,
        })
    }

    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_dump(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = File::create(dir.join(format!("{name}.jsonl"))).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
    }

    #[test]
    fn test_list_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_dump(dir.path(), "flattened_b", &[r#"{"x":1}"#]);
        write_dump(dir.path(), "flattened_a", &[r#"{"x":1}"#]);
        write_dump(dir.path(), "other", &[r#"{"x":1}"#]);

        let source = LocalSource::new(dir.path());
        let names = source.list_collections("flattened_").unwrap();
        assert_eq!(names, vec!["flattened_a", "flattened_b"]);
    }

    #[test]
    fn test_list_zero_matches_is_ok() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(dir.path());
        assert!(source.list_collections("flattened_").unwrap().is_empty());
    }

    #[test]
    fn test_export_overwrites() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write_dump(dir.path(), "flattened_a", &[r#"{"x":1}"#]);

        let source = LocalSource::new(dir.path());
        let dest = out.path().join("flattened_a.jsonl");
        fs::write(&dest, "stale content that must disappear\n").unwrap();

        let stats = source.export_collection("flattened_a", &dest).unwrap();
        assert_eq!(stats.collection, "flattened_a");
        let content = fs::read_to_string(&dest).unwrap();
        assert_eq!(content, "{\"x\":1}\n");
    }

    #[test]
    fn test_missing_collection_fails() {
        let dir = TempDir::new().unwrap();
        let source = LocalSource::new(dir.path());
        let err = source
            .export_collection("flattened_missing", &dir.path().join("out.jsonl"))
            .unwrap_err();
        assert!(matches!(err, SourceError::CollectionUnreachable { .. }));
    }
}
