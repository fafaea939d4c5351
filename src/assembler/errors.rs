//! # Assembly Errors

use thiserror::Error;

/// Result type for assembly operations
pub type AssemblyResult<T> = Result<T, AssemblyError>;

/// Schema disagreements found while shaping rows
///
/// Unreachable when the same query was accepted by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Unknown thing: {0}")]
    UnknownThing(String),

    #[error("Unknown field '{field}' on thing '{thing}'")]
    UnknownField { thing: String, field: String },
}

impl AssemblyError {
    pub fn code(&self) -> &'static str {
        match self {
            AssemblyError::UnknownThing(_) => "BQL_ASSEMBLY_UNKNOWN_THING",
            AssemblyError::UnknownField { .. } => "BQL_ASSEMBLY_UNKNOWN_FIELD",
        }
    }
}
