//! End-to-end pipeline tests over a local JSONL source

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use drover_core::{
    AnalyticalStore, LocalSource, Pipeline, RunConfig, SourceStore, summarize,
};

fn write_dump(dir: &Path, name: &str, lines: &[&str]) {
    let mut file = File::create(dir.join(format!("{name}.jsonl"))).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

fn run_once(src: &Path, work: &Path) -> drover_core::RunReport {
    let source = LocalSource::new(src);
    let config = RunConfig::builder("meta")
        .output_dir(work.join("export"))
        .store_path(work.join("meta.duckdb"))
        .remove_artifacts(false)
        .build();
    Pipeline::new(&source, config).run().unwrap()
}

#[test]
fn test_round_trip_counts_match_source() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_dump(
        src.path(),
        "flattened_users",
        &[
            r#"{"id": 1, "name": "ada", "roles": ["admin", "dev"]}"#,
            r#"{"id": 2, "name": "grace", "email": "g@x"}"#,
            r#"{"id": 3, "profile": {"city": "york", "zip": "Y01"}}"#,
        ],
    );

    let report = run_once(src.path(), work.path());
    assert!(report.is_clean());
    assert_eq!(report.discovered, vec!["flattened_users"]);
    assert_eq!(report.loaded.len(), 1);

    let summary = &report.summaries[0];
    assert_eq!(summary.name, "flattened_users");
    assert_eq!(summary.rows, 3);
    // Distinct top-level field paths: id, name, roles, email, profile
    assert_eq!(summary.columns, 5);
}

#[test]
fn test_rerun_is_idempotent() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_dump(
        src.path(),
        "flattened_items",
        &[r#"{"sku": "a", "qty": 2}"#, r#"{"sku": "b", "qty": 5, "tags": ["x"]}"#],
    );

    let first = run_once(src.path(), work.path());
    let store = AnalyticalStore::open(work.path().join("meta.duckdb")).unwrap();
    let first_rows = store.query_rows("SELECT * FROM flattened_items ORDER BY sku").unwrap();
    drop(store);

    let second = run_once(src.path(), work.path());
    let store = AnalyticalStore::open(work.path().join("meta.duckdb")).unwrap();
    let second_rows = store.query_rows("SELECT * FROM flattened_items ORDER BY sku").unwrap();

    assert_eq!(first.summaries, second.summaries);
    assert_eq!(first_rows, second_rows);
}

#[test]
fn test_nested_fields_stay_structured() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_dump(src.path(), "flattened_geo", &[r#"{"m": {"x": 1, "y": 2}}"#]);

    run_once(src.path(), work.path());

    let store = AnalyticalStore::open(work.path().join("meta.duckdb")).unwrap();
    let rows = store
        .query_rows("SELECT struct_extract(m, 'x') AS mx FROM flattened_geo")
        .unwrap();
    assert_eq!(rows[0]["mx"], json!(1));
}

#[test]
fn test_artifacts_removed_after_successful_load_by_default() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_dump(src.path(), "flattened_a", &[r#"{"id": 1}"#]);

    let source = LocalSource::new(src.path());
    let config = RunConfig::builder("meta")
        .output_dir(work.path().join("export"))
        .store_path(work.path().join("meta.duckdb"))
        .build();
    let report = Pipeline::new(&source, config).run().unwrap();

    assert!(report.is_clean());
    assert!(!work.path().join("export/flattened_a.jsonl").exists());
}

#[test]
fn test_separate_sources_refuse_one_store_file() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_dump(src.path(), "flattened_a", &[r#"{"id": 1}"#]);

    let source = LocalSource::new(src.path());
    let store_path = work.path().join("shared.duckdb");

    let config = RunConfig::builder("meta")
        .output_dir(work.path().join("export"))
        .store_path(&store_path)
        .build();
    Pipeline::new(&source, config).run().unwrap();

    let config = RunConfig::builder("reference")
        .output_dir(work.path().join("export"))
        .store_path(&store_path)
        .build();
    let err = Pipeline::new(&source, config).run().unwrap_err();
    assert!(matches!(err, drover_core::PipelineError::SchemaConflict { .. }));
}

#[test]
fn test_export_then_load_manually_matches_batch() {
    let src = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_dump(
        src.path(),
        "flattened_single",
        &[r#"{"a": 1}"#, r#"{"a": 1, "b": "x"}"#],
    );

    // Mirrors what the export and load subcommands do one item at a time
    let source = LocalSource::new(src.path());
    let artifact = work.path().join("flattened_single.jsonl");
    source.export_collection("flattened_single", &artifact).unwrap();

    let store_path = work.path().join("single.duckdb");
    let store = AnalyticalStore::open(&store_path).unwrap();
    let stats = drover_core::load_artifact(&store, &artifact, None).unwrap();
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.columns, 2);
    drop(store);

    let summaries = summarize(&store_path).unwrap();
    assert_eq!(summaries[0].rows, 2);
    assert_eq!(summaries[0].columns, 2);
}
