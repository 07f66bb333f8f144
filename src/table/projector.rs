//! Row Projector
//!
//! Maps a row item (JSON) onto a table's columns. Absent data projects as
//! null rather than raising an error.

use super::registry::{ColumnDef, ColumnSource, ColumnType, TableDef};
use super::Quals;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// One output row: column name -> value, in table column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(&'static str, Value)>,
}

impl Row {
    /// Value of a column (`None` if the table has no such column)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(name, v)| (*name, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Projects items of one table within one list/get invocation
pub struct Projector<'a> {
    table: &'static TableDef,
    quals: &'a Quals,
    project: Option<String>,
}

impl<'a> Projector<'a> {
    pub fn new(table: &'static TableDef, quals: &'a Quals, project: Option<String>) -> Self {
        Self {
            table,
            quals,
            project,
        }
    }

    pub fn table(&self) -> &'static TableDef {
        self.table
    }

    pub fn row(&self, item: &Value) -> Row {
        let values = self
            .table
            .columns
            .iter()
            .map(|column| (column.name.as_str(), self.value(column, item)))
            .collect();
        Row { values }
    }

    fn value(&self, column: &ColumnDef, item: &Value) -> Value {
        let raw = match column.source {
            ColumnSource::Qual => self
                .quals
                .get(&column.name)
                .map(|q| Value::String(q.to_string()))
                .unwrap_or(Value::Null),
            ColumnSource::Project => self
                .project
                .as_ref()
                .map(|p| Value::String(p.clone()))
                .unwrap_or(Value::Null),
            ColumnSource::Item => column
                .path
                .as_deref()
                .and_then(|path| lookup(item, path))
                .cloned()
                .unwrap_or(Value::Null),
        };
        coerce(column.column_type, raw)
    }
}

/// Follow a dot-notation path (array indices allowed) into a JSON value
pub fn lookup<'v>(item: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(item, |current, part| match part.parse::<usize>() {
        Ok(idx) if current.is_array() => current.get(idx),
        _ => current.get(part),
    })
}

/// Convert a raw JSON value to the column's type; zero-length values become null
fn coerce(column_type: ColumnType, raw: Value) -> Value {
    match (column_type, raw) {
        (_, Value::String(s)) if s.is_empty() => Value::Null,
        (ColumnType::Int, Value::String(s)) => s
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::Null),
        (ColumnType::Int, v @ Value::Number(_)) => v,
        (ColumnType::Double, Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        (ColumnType::Double, v @ Value::Number(_)) => v,
        (ColumnType::Bool, Value::String(s)) => match s.to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Null,
        },
        (ColumnType::Bool, v @ Value::Bool(_)) => v,
        (ColumnType::Timestamp, Value::String(s)) => {
            match chrono::DateTime::parse_from_rfc3339(&s) {
                Ok(ts) => Value::String(ts.to_rfc3339()),
                Err(_) => Value::String(s),
            }
        }
        (ColumnType::Int | ColumnType::Double | ColumnType::Bool, _) => Value::Null,
        (ColumnType::Json, Value::Array(a)) if a.is_empty() => Value::Null,
        (ColumnType::Json, Value::Object(o)) if o.is_empty() => Value::Null,
        (_, v) => v,
    }
}
