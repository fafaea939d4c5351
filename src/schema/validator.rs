//! Structural validation of a schema
//!
//! Checked before the schema is handed to the builder:
//! - every link/role opposite resolves to a field on the opposite thing
//! - every subtype is a thing in the schema
//! - every index field is declared on its thing

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Validates schema structure. Stateless.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validates the whole schema, failing on the first violation.
    ///
    /// Things are visited in name order so the reported error is stable.
    pub fn validate(schema: &Schema) -> SchemaResult<()> {
        for thing in schema.things() {
            for sub_type in &thing.sub_types {
                if schema.thing(sub_type).is_none() {
                    return Err(SchemaError::unknown_sub_type(&thing.name, sub_type));
                }
            }

            for index in &thing.indexes {
                for field in index.fields() {
                    if thing.field(field).is_none() {
                        return Err(SchemaError::unknown_index_field(&thing.name, field));
                    }
                }
            }

            for field in &thing.fields {
                if let Some(opposite) = field.kind.opposite() {
                    if schema.opposite_field(opposite).is_none() {
                        return Err(SchemaError::unknown_opposite(
                            &thing.name,
                            &field.name,
                            &opposite.thing,
                            &opposite.path,
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}
