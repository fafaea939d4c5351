//! Projected result rows

use serde_json::{Map, Value};

use super::store::Row;

/// A source row with its projected output columns
#[derive(Debug, Clone)]
pub struct ProjectedRow<'a> {
    pub row: Row<'a>,
    pub fields: Map<String, Value>,
}

impl<'a> ProjectedRow<'a> {
    pub fn new(row: Row<'a>, fields: Map<String, Value>) -> Self {
        Self { row, fields }
    }

    /// Output column, falling back to the stored field of the same name
    pub fn key(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).or_else(|| self.row.record.get(field))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Shapes rows for the query cardinality: first row or null for ONE
pub fn collect(rows: Vec<Value>, many: bool) -> Value {
    if many {
        Value::Array(rows)
    } else {
        rows.into_iter().next().unwrap_or(Value::Null)
    }
}
