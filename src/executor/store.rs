//! In-memory record store
//!
//! Records are JSON objects keyed by a plain string `id`. A reference to
//! another record is stored as a `"Table:id"` pointer string; a string is a
//! pointer only if its table prefix names a table in the store.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::schema::ID_COLUMN;

/// Builds the pointer string for a record
pub fn pointer(table: &str, id: &str) -> String {
    format!("{}:{}", table, id)
}

/// A record together with the table it lives in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a> {
    pub table: &'a str,
    pub record: &'a Value,
}

impl<'a> Row<'a> {
    /// Plain record id
    pub fn id(&self) -> Option<&'a str> {
        self.record.get(ID_COLUMN).and_then(Value::as_str)
    }
}

/// Tables of JSON records, in insertion order per table
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table without records
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.entry(table.into()).or_default();
        self
    }

    pub fn with_record(mut self, table: impl Into<String>, record: Value) -> Self {
        self.insert(table, record);
        self
    }

    pub fn insert(&mut self, table: impl Into<String>, record: Value) {
        self.tables.entry(table.into()).or_default().push(record);
    }

    /// Every record of `table`, empty if the table is unknown
    pub fn scan(&self, table: &str) -> Vec<Row<'_>> {
        match self.tables.get_key_value(table) {
            Some((name, records)) => records
                .iter()
                .map(|record| Row {
                    table: name,
                    record,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn get(&self, table: &str, id: &str) -> Option<Row<'_>> {
        self.scan(table).into_iter().find(|row| row.id() == Some(id))
    }

    /// Splits a pointer into table and id if the table exists
    pub fn split_pointer<'p>(&self, value: &'p str) -> Option<(&'p str, &'p str)> {
        let (table, id) = value.split_once(':')?;
        self.tables.contains_key(table).then_some((table, id))
    }

    /// Record a pointer refers to
    pub fn resolve(&self, value: &str) -> Option<Row<'_>> {
        let (table, id) = self.split_pointer(value)?;
        self.get(table, id)
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
