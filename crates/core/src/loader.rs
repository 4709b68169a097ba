//! Artifact loading
//!
//! Reads a newline-delimited JSON artifact, infers the unified schema by
//! scanning every record, and materializes the table in the store.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::PipelineError;
use crate::schema::{TableSchema, sanitize_table_name};
use crate::store::AnalyticalStore;

/// Result of loading one artifact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStats {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
}

/// Table name derived from an artifact path: the file stem, sanitized.
pub fn table_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("artifact");
    sanitize_table_name(stem)
}

/// Read all records of a JSONL artifact.
///
/// Blank lines are skipped; a malformed line is a fatal parse error for
/// the whole artifact, carrying its 1-based line number. Silently
/// dropping the row would corrupt the row count without signal.
pub fn read_artifact(path: &Path) -> Result<Vec<Value>, PipelineError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: Value =
            serde_json::from_str(trimmed).map_err(|e| PipelineError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })?;

        if !value.is_object() {
            return Err(PipelineError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: "record is not a JSON object".to_string(),
            });
        }

        records.push(value);
    }

    Ok(records)
}

/// Load one artifact into the store, replacing any existing table of the
/// same name. `table` overrides the name derived from the file stem.
pub fn load_artifact(
    store: &AnalyticalStore,
    path: &Path,
    table: Option<&str>,
) -> Result<LoadStats, PipelineError> {
    if !path.is_file() {
        let collection = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        return Err(PipelineError::ArtifactMissing {
            collection,
            path: path.to_path_buf(),
        });
    }

    let table = match table {
        Some(name) => sanitize_table_name(name),
        None => table_name_for(path),
    };

    let records = read_artifact(path)?;
    let schema = TableSchema::infer(records.iter());
    let rows = store.create_or_replace_table(&table, &schema, &records)?;

    Ok(LoadStats {
        table,
        rows,
        columns: schema.column_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_artifact(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn test_round_trip_counts() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            dir.path(),
            "flattened_users.jsonl",
            &[
                r#"{"id": 1, "name": "ada"}"#,
                r#"{"id": 2, "name": "grace", "email": "g@x"}"#,
                r#"{"id": 3}"#,
            ],
        );

        let store = AnalyticalStore::open_in_memory().unwrap();
        let stats = load_artifact(&store, &path, None).unwrap();
        assert_eq!(stats.table, "flattened_users");
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.columns, 3);
        assert_eq!(store.count_rows("flattened_users").unwrap(), 3);
    }

    #[test]
    fn test_empty_artifact_materializes_no_table() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path(), "flattened_empty.jsonl", &[]);

        let store = AnalyticalStore::open_in_memory().unwrap();
        let stats = load_artifact(&store, &path, None).unwrap();
        assert_eq!(stats.rows, 0);
        assert_eq!(stats.columns, 0);
        assert!(store.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_line_aborts_with_line_number() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            dir.path(),
            "bad.jsonl",
            &[r#"{"a": 1}"#, r#"{"a": oops}"#, r#"{"a": 3}"#],
        );

        let store = AnalyticalStore::open_in_memory().unwrap();
        let err = load_artifact(&store, &path, None).unwrap_err();
        match err {
            PipelineError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Parse, got {other:?}"),
        }
        // Nothing was materialized for the aborted artifact
        assert!(store.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_non_object_record_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path(), "scalar.jsonl", &[r#"[1, 2, 3]"#]);

        let store = AnalyticalStore::open_in_memory().unwrap();
        let err = load_artifact(&store, &path, None).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_missing_artifact_names_prerequisite() {
        let dir = TempDir::new().unwrap();
        let store = AnalyticalStore::open_in_memory().unwrap();
        let err = load_artifact(&store, &dir.path().join("flattened_gone.jsonl"), None).unwrap_err();
        match err {
            PipelineError::ArtifactMissing { collection, .. } => {
                assert_eq!(collection, "flattened_gone");
            }
            other => panic!("expected ArtifactMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_lines_skipped_and_name_sanitized() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(dir.path(), "a.b.jsonl", &[r#"{"x": 1}"#, "", r#"{"x": 2}"#]);

        let store = AnalyticalStore::open_in_memory().unwrap();
        let stats = load_artifact(&store, &path, None).unwrap();
        assert_eq!(stats.table, "a_b");
        assert_eq!(stats.rows, 2);
    }

    #[test]
    fn test_idempotent_reload() {
        let dir = TempDir::new().unwrap();
        let path = write_artifact(
            dir.path(),
            "flattened_t.jsonl",
            &[r#"{"a": 1, "m": {"x": 1}}"#, r#"{"a": 2}"#],
        );

        let store = AnalyticalStore::open_in_memory().unwrap();
        let first = load_artifact(&store, &path, None).unwrap();
        let first_rows = store.query_rows("SELECT * FROM flattened_t ORDER BY a").unwrap();
        let second = load_artifact(&store, &path, None).unwrap();
        let second_rows = store.query_rows("SELECT * FROM flattened_t ORDER BY a").unwrap();

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.columns, second.columns);
        assert_eq!(first_rows, second_rows);
    }
}
