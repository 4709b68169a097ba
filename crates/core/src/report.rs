//! Store summaries

use std::path::Path;

use crate::error::PipelineError;
use crate::store::{AnalyticalStore, TableSummary};

/// Summarize every table of a store file, ordered by table name.
///
/// A missing file is an error; a present file with zero tables is a
/// valid, empty summary.
pub fn summarize(path: &Path) -> Result<Vec<TableSummary>, PipelineError> {
    if !path.is_file() {
        return Err(PipelineError::StoreMissing(path.to_path_buf()));
    }
    let store = AnalyticalStore::open(path)?;
    store.table_summaries()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::schema::TableSchema;

    #[test]
    fn test_missing_file_is_distinct_from_empty_store() {
        let dir = TempDir::new().unwrap();

        let missing = dir.path().join("absent.duckdb");
        let err = summarize(&missing).unwrap_err();
        assert!(matches!(err, PipelineError::StoreMissing(_)));

        let empty = dir.path().join("empty.duckdb");
        drop(AnalyticalStore::open(&empty).unwrap());
        assert!(summarize(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_summary_ordered_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.duckdb");
        {
            let store = AnalyticalStore::open(&path).unwrap();
            for name in ["zz", "aa"] {
                let records = vec![json!({"v": 1})];
                let schema = TableSchema::infer(records.iter());
                store.create_or_replace_table(name, &schema, &records).unwrap();
            }
        }

        let summaries = summarize(&path).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["aa", "zz"]);
    }
}
