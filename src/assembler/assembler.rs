//! Result assembler
//!
//! Shapes raw rows into the response the caller asked for. Works from the
//! original declarative query, never the optimized plan, so field order
//! and aliases follow the caller.
//!
//! Per object, in order:
//! 1. `$thing`, `$id`, `$thingType` when metadata is on
//! 2. Every selected field (or every schema field) not excluded
//!
//! Absent and null values are dropped unless `return_nulls` is set.

use serde_json::{Map, Value};

use super::errors::{AssemblyError, AssemblyResult};
use crate::planner::{FieldSelector, IdSelector, Query, QueryBody};
use crate::schema::{FieldKind, Schema, ThingSchema};

/// Builds nested response values from raw rows
#[derive(Debug, Clone, Copy)]
pub struct ResultAssembler<'a> {
    schema: &'a Schema,
    metadata: bool,
    return_nulls: bool,
}

impl<'a> ResultAssembler<'a> {
    /// Metadata on, nulls dropped
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            metadata: true,
            return_nulls: false,
        }
    }

    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_return_nulls(mut self, return_nulls: bool) -> Self {
        self.return_nulls = return_nulls;
        self
    }

    /// Assembles the raw result of one query: an array of rows, one row or null
    pub fn assemble(&self, raw: &Value, query: &Query) -> AssemblyResult<Value> {
        let thing = self.thing(&query.thing)?;
        self.assemble_value(thing, &query.body, raw)
    }

    fn thing(&self, name: &str) -> AssemblyResult<&'a ThingSchema> {
        self.schema
            .thing(name)
            .ok_or_else(|| AssemblyError::UnknownThing(name.to_string()))
    }

    fn assemble_value(
        &self,
        thing: &ThingSchema,
        body: &QueryBody,
        raw: &Value,
    ) -> AssemblyResult<Value> {
        match raw {
            Value::Array(rows) if rows.is_empty() && self.return_nulls => Ok(Value::Null),
            Value::Array(rows) => rows
                .iter()
                .map(|row| self.assemble_value(thing, body, row))
                .collect::<AssemblyResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(row) => self.assemble_object(thing, body, row).map(Value::Object),
            other => Ok(other.clone()),
        }
    }

    fn assemble_object(
        &self,
        thing: &ThingSchema,
        body: &QueryBody,
        row: &Map<String, Value>,
    ) -> AssemblyResult<Map<String, Value>> {
        let mut out = Map::new();
        if self.metadata {
            self.push_metadata(&mut out, thing, body, row);
        }

        let defaults: Vec<FieldSelector>;
        let selectors: &[FieldSelector] = match &body.fields {
            Some(selectors) => selectors,
            None => {
                defaults = thing
                    .fields
                    .iter()
                    .map(|f| FieldSelector::path(f.name.clone()))
                    .collect();
                &defaults
            }
        };

        let mut row_value: Option<Value> = None;
        for selector in selectors {
            let path = selector.field_path();
            if body.excluded_fields.iter().any(|e| e == path) {
                continue;
            }
            let field = thing.field(path).ok_or_else(|| AssemblyError::UnknownField {
                thing: thing.name.clone(),
                field: path.to_string(),
            })?;
            let key = selector.output_key();
            let present = row.get(key).filter(|v| !v.is_null());

            let value = match (&field.kind, selector) {
                (FieldKind::Constant { value }, _) => Some(value.clone()),
                (FieldKind::Computed(f), _) => {
                    let row = row_value.get_or_insert_with(|| Value::Object(row.clone()));
                    Some(f.call(row))
                }
                (kind, FieldSelector::Nested(nested)) => {
                    let opposite = kind.opposite().ok_or_else(|| AssemblyError::UnknownField {
                        thing: thing.name.clone(),
                        field: path.to_string(),
                    })?;
                    let target = self.thing(&opposite.thing)?;
                    present
                        .map(|raw| self.assemble_value(target, &nested.body, raw))
                        .transpose()?
                }
                (FieldKind::Data { .. }, _) => present.cloned(),
                (FieldKind::Ref { .. } | FieldKind::Link { .. } | FieldKind::Role { .. }, _) => {
                    present.map(|v| match v {
                        Value::Array(items) if items.is_empty() => Value::Null,
                        other => other.clone(),
                    })
                }
            };

            match value {
                Some(Value::Null) | None if !self.return_nulls => {}
                Some(value) => {
                    out.insert(key.to_string(), value);
                }
                None => {
                    out.insert(key.to_string(), Value::Null);
                }
            }
        }
        Ok(out)
    }

    fn push_metadata(
        &self,
        out: &mut Map<String, Value>,
        thing: &ThingSchema,
        body: &QueryBody,
        row: &Map<String, Value>,
    ) {
        let name = row
            .get("$thing")
            .and_then(Value::as_str)
            .unwrap_or(&thing.name);
        let kind = self.schema.thing(name).map_or(thing.kind, |t| t.kind);
        let id = row
            .get("$id")
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| {
                body.id
                    .as_ref()
                    .and_then(IdSelector::single)
                    .map(|id| Value::String(id.to_string()))
            })
            .or_else(|| thing.id_fields.iter().find_map(|f| row.get(f)).cloned())
            .unwrap_or(Value::Null);

        out.insert("$thing".to_string(), Value::String(name.to_string()));
        out.insert("$id".to_string(), id);
        out.insert(
            "$thingType".to_string(),
            Value::String(kind.as_str().to_string()),
        );
    }
}
