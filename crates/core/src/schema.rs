//! Schema inference over heterogeneous JSON records
//!
//! A table schema is derived by a full scan of every record, never a
//! sample. Each observed value contributes a [`FieldType`]; values seen
//! under the same field are unified into the most general type that
//! accommodates all of them.

use std::collections::BTreeMap;

use serde_json::Value;

/// Inferred semantic type for a field.
///
/// Nested objects stay composite (`Struct`), arrays stay ordered
/// (`List`); nothing is flattened at inference time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Only nulls observed so far
    Null,
    Boolean,
    Integer,
    Float,
    Text,
    Struct(BTreeMap<String, FieldType>),
    List(Box<FieldType>),
}

impl FieldType {
    /// Type of a single JSON value.
    ///
    /// Numbers outside the i64 range widen to `Float`; above 2^53 this
    /// is lossy and accepted.
    pub fn of(value: &Value) -> FieldType {
        match value {
            Value::Null => FieldType::Null,
            Value::Bool(_) => FieldType::Boolean,
            Value::Number(n) => {
                if n.is_i64() {
                    FieldType::Integer
                } else {
                    FieldType::Float
                }
            }
            Value::String(_) => FieldType::Text,
            Value::Array(items) => {
                let elem = items
                    .iter()
                    .fold(FieldType::Null, |acc, v| acc.unify(&FieldType::of(v)));
                FieldType::List(Box::new(elem))
            }
            Value::Object(map) => FieldType::Struct(
                map.iter()
                    .map(|(k, v)| (k.clone(), FieldType::of(v)))
                    .collect(),
            ),
        }
    }

    /// Most general type accommodating both operands.
    ///
    /// Null is absorbed (null-as-optional), Integer widens to Float,
    /// structs union their keys, lists unify their element types. Any
    /// other mixed pair widens to `Text`, which holds the JSON
    /// serialisation of non-string values.
    pub fn unify(&self, other: &FieldType) -> FieldType {
        match (self, other) {
            (FieldType::Null, t) | (t, FieldType::Null) => t.clone(),
            (a, b) if a == b => a.clone(),
            (FieldType::Integer, FieldType::Float) | (FieldType::Float, FieldType::Integer) => {
                FieldType::Float
            }
            (FieldType::Struct(a), FieldType::Struct(b)) => {
                let mut merged = a.clone();
                for (key, t) in b {
                    merged
                        .entry(key.clone())
                        .and_modify(|existing| *existing = existing.unify(t))
                        .or_insert_with(|| t.clone());
                }
                FieldType::Struct(merged)
            }
            (FieldType::List(a), FieldType::List(b)) => FieldType::List(Box::new(a.unify(b))),
            _ => FieldType::Text,
        }
    }

    /// DuckDB column type for this field.
    pub fn duckdb_type(&self) -> String {
        match self {
            // All-null columns get a concrete type so the table is valid
            FieldType::Null => "VARCHAR".to_string(),
            FieldType::Boolean => "BOOLEAN".to_string(),
            FieldType::Integer => "BIGINT".to_string(),
            FieldType::Float => "DOUBLE".to_string(),
            FieldType::Text => "VARCHAR".to_string(),
            FieldType::Struct(fields) => {
                let members: Vec<String> = fields
                    .iter()
                    .map(|(name, t)| format!("{} {}", quote_ident(name), t.duckdb_type()))
                    .collect();
                format!("STRUCT({})", members.join(", "))
            }
            FieldType::List(elem) => format!("{}[]", elem.duckdb_type()),
        }
    }
}

/// Unified column schema for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Column name to inferred type, sorted by name so that reruns over
    /// unchanged data produce identical tables
    pub columns: BTreeMap<String, FieldType>,
}

impl TableSchema {
    /// Infer the unified schema across all records (full scan).
    ///
    /// Every record must be a JSON object; the caller rejects anything
    /// else before inference.
    pub fn infer<'a>(records: impl IntoIterator<Item = &'a Value>) -> TableSchema {
        let mut columns: BTreeMap<String, FieldType> = BTreeMap::new();
        for record in records {
            if let Value::Object(map) = record {
                for (field, value) in map {
                    let t = FieldType::of(value);
                    columns
                        .entry(field.clone())
                        .and_modify(|existing| *existing = existing.unify(&t))
                        .or_insert(t);
                }
            }
        }
        TableSchema { columns }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Quote an identifier for use in SQL, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Convert a collection or file name to a valid table identifier.
///
/// Spaces, hyphens and dots become underscores, other special characters
/// are dropped, digit-leading names get a `t_` prefix, and the result is
/// lowercased. Stable under reapplication.
pub fn sanitize_table_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| match c {
            ' ' | '-' | '.' => '_',
            other => other,
        })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized = format!("t_{sanitized}");
    }
    if sanitized.is_empty() {
        sanitized.push('_');
    }
    sanitized.to_lowercase()
}
