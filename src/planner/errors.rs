//! Planner error types
//!
//! Error codes:
//! - BQL_SCHEMA_MISMATCH (REJECT)
//! - BQL_UNSUPPORTED_FILTER (REJECT)
//! - BQL_INVALID_SORT (REJECT)
//! - BQL_INVALID_PAGINATION (REJECT)
//! - BQL_INVALID_FILTER_SHAPE (REJECT)
//! - BQL_DUPLICATE_ALIAS (REJECT)
//! - BQL_INVALID_QUERY (REJECT)

use std::fmt;

/// Severity levels for planner errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Planner-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerErrorCode {
    /// Unknown thing or field path
    SchemaMismatch,
    /// Operator invalid for the field's type or cardinality
    UnsupportedFilter,
    /// Sort key absent from the final projection
    InvalidSort,
    /// Negative or non-numeric limit/offset
    InvalidPagination,
    /// Filter value fails structural validation
    InvalidFilterShape,
    /// Two projection entries share one output key
    DuplicateAlias,
    /// Query document could not be decoded
    QueryInvalid,
}

impl PlannerErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerErrorCode::SchemaMismatch => "BQL_SCHEMA_MISMATCH",
            PlannerErrorCode::UnsupportedFilter => "BQL_UNSUPPORTED_FILTER",
            PlannerErrorCode::InvalidSort => "BQL_INVALID_SORT",
            PlannerErrorCode::InvalidPagination => "BQL_INVALID_PAGINATION",
            PlannerErrorCode::InvalidFilterShape => "BQL_INVALID_FILTER_SHAPE",
            PlannerErrorCode::DuplicateAlias => "BQL_DUPLICATE_ALIAS",
            PlannerErrorCode::QueryInvalid => "BQL_INVALID_QUERY",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for PlannerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Planner error type with full context
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerError {
    /// Error code
    code: PlannerErrorCode,
    /// Human-readable message
    message: String,
    /// Field path if applicable
    field: Option<String>,
}

impl PlannerError {
    /// Unknown thing
    pub fn unknown_thing(thing: impl Into<String>) -> Self {
        let t = thing.into();
        Self {
            code: PlannerErrorCode::SchemaMismatch,
            message: format!("Thing '{}' not found in schema", t),
            field: None,
        }
    }

    /// Unknown field on a known thing
    pub fn unknown_field(thing: &str, field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::SchemaMismatch,
            message: format!("Field '{}' not found on '{}'", f, thing),
            field: Some(f),
        }
    }

    /// Create a schema mismatch error
    pub fn schema_mismatch(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::SchemaMismatch,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unsupported filter error
    pub fn unsupported_filter(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::UnsupportedFilter,
            message: format!("Unsupported filter on '{}': {}", f, reason.into()),
            field: Some(f),
        }
    }

    /// Create an invalid sort error
    pub fn invalid_sort(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: PlannerErrorCode::InvalidSort,
            message: format!("Sort field '{}' is not part of the projection", f),
            field: Some(f),
        }
    }

    /// Create an invalid pagination error
    pub fn invalid_pagination(key: &str, reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::InvalidPagination,
            message: format!("{} {}", key, reason.into()),
            field: None,
        }
    }

    /// Create an invalid filter shape error
    pub fn invalid_filter_shape(field: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::InvalidFilterShape,
            message: reason.into(),
            field: field.map(str::to_string),
        }
    }

    /// Create a duplicate alias error
    pub fn duplicate_alias(alias: impl Into<String>) -> Self {
        let a = alias.into();
        Self {
            code: PlannerErrorCode::DuplicateAlias,
            message: format!("Output key '{}' is projected more than once", a),
            field: Some(a),
        }
    }

    /// Create a query invalid error
    pub fn query_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: PlannerErrorCode::QueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> PlannerErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field path if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(PlannerErrorCode::SchemaMismatch.code(), "BQL_SCHEMA_MISMATCH");
        assert_eq!(PlannerErrorCode::UnsupportedFilter.code(), "BQL_UNSUPPORTED_FILTER");
        assert_eq!(PlannerErrorCode::InvalidSort.code(), "BQL_INVALID_SORT");
        assert_eq!(PlannerErrorCode::InvalidPagination.code(), "BQL_INVALID_PAGINATION");
        assert_eq!(PlannerErrorCode::InvalidFilterShape.code(), "BQL_INVALID_FILTER_SHAPE");
        assert_eq!(PlannerErrorCode::DuplicateAlias.code(), "BQL_DUPLICATE_ALIAS");
    }

    #[test]
    fn test_error_display() {
        let err = PlannerError::unknown_field("User", "nickname");
        let display = format!("{}", err);
        assert!(display.starts_with("[REJECT] BQL_SCHEMA_MISMATCH"));
        assert!(display.contains("nickname"));
        assert_eq!(err.field(), Some("nickname"));
    }

    #[test]
    fn test_pagination_message() {
        let err = PlannerError::invalid_pagination("$limit", "must be a non-negative integer");
        assert_eq!(err.message(), "$limit must be a non-negative integer");
        assert_eq!(err.field(), None);
    }
}
