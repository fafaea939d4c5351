//! Schema error types
//!
//! Error codes:
//! - BQL_SCHEMA_MALFORMED
//! - BQL_SCHEMA_UNKNOWN_OPPOSITE
//! - BQL_SCHEMA_UNKNOWN_SUBTYPE
//! - BQL_SCHEMA_UNKNOWN_INDEX_FIELD

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Schema document cannot be read or parsed
    Malformed,
    /// Link or role opposite does not resolve to a field
    UnknownOpposite,
    /// Listed subtype is not a thing in the schema
    UnknownSubType,
    /// Index references a field the thing does not declare
    UnknownIndexField,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::Malformed => "BQL_SCHEMA_MALFORMED",
            SchemaErrorCode::UnknownOpposite => "BQL_SCHEMA_UNKNOWN_OPPOSITE",
            SchemaErrorCode::UnknownSubType => "BQL_SCHEMA_UNKNOWN_SUBTYPE",
            SchemaErrorCode::UnknownIndexField => "BQL_SCHEMA_UNKNOWN_INDEX_FIELD",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
}

impl SchemaError {
    /// Create a malformed schema error
    pub fn malformed(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::Malformed,
            message: format!("Malformed schema '{}': {}", source.into(), reason.into()),
        }
    }

    /// Create an unknown opposite error
    pub fn unknown_opposite(thing: &str, field: &str, opposite_thing: &str, opposite_path: &str) -> Self {
        Self {
            code: SchemaErrorCode::UnknownOpposite,
            message: format!(
                "Field '{}.{}' has opposite '{}.{}' which does not exist",
                thing, field, opposite_thing, opposite_path
            ),
        }
    }

    /// Create an unknown subtype error
    pub fn unknown_sub_type(thing: &str, sub_type: &str) -> Self {
        Self {
            code: SchemaErrorCode::UnknownSubType,
            message: format!("Thing '{}' lists unknown subtype '{}'", thing, sub_type),
        }
    }

    /// Create an unknown index field error
    pub fn unknown_index_field(thing: &str, field: &str) -> Self {
        Self {
            code: SchemaErrorCode::UnknownIndexField,
            message: format!("Index on '{}' references unknown field '{}'", thing, field),
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
