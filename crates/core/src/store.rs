//! Destination analytical store
//!
//! A store file is a single DuckDB database holding one table per loaded
//! collection. Tables are always created-or-replaced, never appended to,
//! so reloading an unchanged artifact converges to an identical table.
//!
//! One store file must only ever receive tables from one source
//! database; the store records the source name in a `drover_meta` table
//! and refuses a mismatched load instead of silently merging. Concurrent
//! writers from other processes are not coordinated here: DuckDB's own
//! file lock turns that into an open error, which is reported as-is.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use duckdb::OptionalExt;
use serde::Serialize;
use serde_json::Value;

use crate::error::PipelineError;
use crate::schema::{FieldType, TableSchema, quote_ident};

/// Name of the metadata table holding the source tag.
const META_TABLE: &str = "drover_meta";

/// Rows per INSERT statement.
const INSERT_BATCH: usize = 500;

/// Per-table summary: {name, row count, column count}.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub name: String,
    pub rows: u64,
    pub columns: usize,
}

/// File-backed analytical store.
pub struct AnalyticalStore {
    /// Path to the store file (None for in-memory)
    path: Option<PathBuf>,
    connection: Mutex<duckdb::Connection>,
}

impl AnalyticalStore {
    /// Open (creating if necessary) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let connection = duckdb::Connection::open(&path)
            .map_err(|e| PipelineError::Store(format!("failed to open {}: {e}", path.display())))?;
        Ok(Self {
            path: Some(path),
            connection: Mutex::new(connection),
        })
    }

    /// Open an in-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self, PipelineError> {
        let connection = duckdb::Connection::open_in_memory()
            .map_err(|e| PipelineError::Store(format!("failed to open in-memory store: {e}")))?;
        Ok(Self {
            path: None,
            connection: Mutex::new(connection),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, duckdb::Connection>, PipelineError> {
        self.connection
            .lock()
            .map_err(|e| PipelineError::Store(format!("lock error: {e}")))
    }

    /// Record the source database this store belongs to, or fail if it
    /// already belongs to a different one.
    pub fn claim_for_source(&self, database: &str) -> Result<(), PipelineError> {
        let conn = self.lock()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {META_TABLE} (source_database VARCHAR NOT NULL)"
        ))?;

        let previous: Option<String> = conn
            .query_row(&format!("SELECT source_database FROM {META_TABLE} LIMIT 1"), [], |row| {
                row.get(0)
            })
            .optional()?;

        match previous {
            None => {
                conn.execute(
                    &format!("INSERT INTO {META_TABLE} VALUES (?)"),
                    duckdb::params![database],
                )?;
                Ok(())
            }
            Some(ref prev) if prev == database => Ok(()),
            Some(prev) => Err(PipelineError::SchemaConflict {
                store: self.path.clone().unwrap_or_else(|| PathBuf::from(":memory:")),
                previous: prev,
                attempted: database.to_string(),
            }),
        }
    }

    /// Create (or atomically replace) `name` with the inferred schema and
    /// insert every record. Records missing a column insert NULL there.
    pub fn create_or_replace_table(
        &self,
        name: &str,
        schema: &TableSchema,
        rows: &[Value],
    ) -> Result<usize, PipelineError> {
        if schema.is_empty() {
            // Zero records yields no schema to create a table from. A
            // table of this name left over from a previous run would
            // otherwise survive the rerun with stale rows.
            let conn = self.lock()?;
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))?;
            tracing::info!(table = name, "no records, no table materialized");
            return Ok(0);
        }

        let columns: Vec<String> = schema
            .columns
            .iter()
            .map(|(col, t)| format!("{} {}", quote_ident(col), t.duckdb_type()))
            .collect();
        let create = format!(
            "CREATE OR REPLACE TABLE {} ({})",
            quote_ident(name),
            columns.join(", ")
        );

        let conn = self.lock()?;
        conn.execute_batch(&create)?;

        for chunk in rows.chunks(INSERT_BATCH) {
            let tuples: Vec<String> = chunk
                .iter()
                .map(|record| {
                    let values: Vec<String> = schema
                        .columns
                        .iter()
                        .map(|(col, t)| render_value(record.get(col), t))
                        .collect();
                    format!("({})", values.join(", "))
                })
                .collect();
            let insert = format!(
                "INSERT INTO {} VALUES {}",
                quote_ident(name),
                tuples.join(", ")
            );
            conn.execute_batch(&insert)?;
        }

        tracing::info!(table = name, rows = rows.len(), columns = schema.column_count(), "table loaded");
        Ok(rows.len())
    }

    /// All table names, sorted, excluding the metadata table.
    pub fn list_tables(&self) -> Result<Vec<String>, PipelineError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' AND table_name <> ? ORDER BY table_name",
        )?;
        let names = stmt
            .query_map(duckdb::params![META_TABLE], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn count_rows(&self, table: &str) -> Result<u64, PipelineError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Column names of a table, in definition order.
    pub fn describe_columns(&self, table: &str) -> Result<Vec<String>, PipelineError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = 'main' AND table_name = ? ORDER BY ordinal_position",
        )?;
        let names = stmt
            .query_map(duckdb::params![table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// {name, rows, columns} for every table, ordered by table name.
    pub fn table_summaries(&self) -> Result<Vec<TableSummary>, PipelineError> {
        let mut summaries = Vec::new();
        for name in self.list_tables()? {
            let rows = self.count_rows(&name)?;
            let columns = self.describe_columns(&name)?.len();
            summaries.push(TableSummary { name, rows, columns });
        }
        Ok(summaries)
    }

    /// Run a SELECT and return each row as a JSON object keyed by column
    /// name. Composite values come back in DuckDB's display form.
    pub fn query_rows(&self, sql: &str) -> Result<Vec<Value>, PipelineError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut result = stmt.query([])?;

        let column_count = result.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                result
                    .as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{i}"))
            })
            .collect();

        let mut rows = Vec::new();
        while let Some(row) = result.next()? {
            let mut map = serde_json::Map::new();
            for (i, col) in columns.iter().enumerate() {
                let value = match row.get_ref(i) {
                    Ok(value_ref) => value_ref_to_json(value_ref),
                    Err(_) => Value::Null,
                };
                map.insert(col.clone(), value);
            }
            rows.push(Value::Object(map));
        }
        Ok(rows)
    }
}

fn value_ref_to_json(value: duckdb::types::ValueRef) -> Value {
    use duckdb::types::ValueRef;

    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::Number(i.into()),
        ValueRef::SmallInt(i) => Value::Number(i.into()),
        ValueRef::Int(i) => Value::Number(i.into()),
        ValueRef::BigInt(i) => Value::Number(i.into()),
        ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Double(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned().into(),
        other => Value::String(format!("{other:?}")),
    }
}

/// Render one cell as a SQL literal of the column's type.
///
/// Unification guarantees the shapes line up: a struct column only ever
/// sees objects or nulls, a list column only arrays or nulls, and any
/// field with conflicting shapes was widened to Text beforehand.
fn render_value(value: Option<&Value>, ftype: &FieldType) -> String {
    let value = match value {
        None | Some(Value::Null) => return "NULL".to_string(),
        Some(v) => v,
    };

    match ftype {
        FieldType::Null => "NULL".to_string(),
        FieldType::Boolean => match value {
            Value::Bool(true) => "TRUE".to_string(),
            _ => "FALSE".to_string(),
        },
        FieldType::Integer => value
            .as_i64()
            .map(|i| i.to_string())
            .unwrap_or_else(|| "NULL".to_string()),
        FieldType::Float => value
            .as_f64()
            .map(|f| format!("{f:?}"))
            .unwrap_or_else(|| "NULL".to_string()),
        FieldType::Text => match value {
            Value::String(s) => quote_str(s),
            other => quote_str(&other.to_string()),
        },
        FieldType::Struct(_) | FieldType::List(_) => {
            format!(
                "CAST({} AS {})",
                render_composite(value, ftype),
                ftype.duckdb_type()
            )
        }
    }
}

fn render_composite(value: &Value, ftype: &FieldType) -> String {
    match (ftype, value) {
        (FieldType::Struct(fields), Value::Object(map)) => {
            let members: Vec<String> = fields
                .iter()
                .map(|(name, t)| {
                    let member = match map.get(name) {
                        None | Some(Value::Null) => "NULL".to_string(),
                        Some(v) => render_member(v, t),
                    };
                    format!("{}: {}", quote_str(name), member)
                })
                .collect();
            format!("{{{}}}", members.join(", "))
        }
        (FieldType::List(elem), Value::Array(items)) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::Null => "NULL".to_string(),
                    v => render_member(v, elem),
                })
                .collect();
            format!("[{}]", rendered.join(", "))
        }
        // Shape mismatch inside a composite cannot survive unification
        _ => "NULL".to_string(),
    }
}

fn render_member(value: &Value, ftype: &FieldType) -> String {
    match ftype {
        FieldType::Struct(_) | FieldType::List(_) => render_composite(value, ftype),
        scalar => render_value(Some(value), scalar),
    }
}

fn quote_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
