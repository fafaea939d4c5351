//! Schema subsystem
//!
//! The schema is the compiler's only source of truth about things, fields,
//! relationships and indexes. It is produced externally (enrichment and
//! inheritance resolution) and consumed read-only.

mod errors;
mod loader;
mod types;
mod validator;

#[cfg(test)]
pub(crate) mod fixtures;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{
    Cardinality, ComputedFn, DataContent, FieldKind, FieldSchema, IndexDef, LinkTarget, Opposite,
    RefContent, Schema, ThingKind, ThingSchema, ID_COLUMN,
};
pub use validator::SchemaValidator;
