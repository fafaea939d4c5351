//! Schema loader
//!
//! Reads the enriched schema document (JSON object keyed by thing name) and
//! validates it before use. A schema that fails validation is never returned.

use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;
use super::validator::SchemaValidator;
use crate::observability::{log_event, Event};

/// Loads schemas from JSON text or files.
pub struct SchemaLoader;

impl SchemaLoader {
    /// Parses and validates a schema document.
    pub fn from_json_str(source: &str) -> SchemaResult<Schema> {
        let schema: Schema = serde_json::from_str(source)
            .map_err(|e| SchemaError::malformed("<inline>", e.to_string()))?;
        Self::accept(schema, "<inline>")
    }

    /// Parses and validates an already decoded schema document.
    pub fn from_value(value: serde_json::Value) -> SchemaResult<Schema> {
        let schema: Schema = serde_json::from_value(value)
            .map_err(|e| SchemaError::malformed("<value>", e.to_string()))?;
        Self::accept(schema, "<value>")
    }

    /// Reads, parses and validates a schema file.
    pub fn load_file(path: &Path) -> SchemaResult<Schema> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::malformed(&display, format!("Failed to read file: {}", e)))?;
        let schema: Schema = serde_json::from_str(&content)
            .map_err(|e| SchemaError::malformed(&display, e.to_string()))?;
        Self::accept(schema, &display)
    }

    fn accept(schema: Schema, origin: &str) -> SchemaResult<Schema> {
        SchemaValidator::validate(&schema)?;
        let things = schema.len().to_string();
        log_event(
            Event::SchemaLoaded,
            &[("origin", origin), ("things", things.as_str())],
        );
        Ok(schema)
    }
}
