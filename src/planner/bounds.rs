//! Pagination and sort bounds
//!
//! - `$limit` and `$offset` must be non-negative integers when present
//! - every `$sort` target must name a column of the final projection,
//!   by output key or by source path

use serde_json::Value;

use super::ast::SortSpec;
use super::errors::{PlannerError, PlannerResult};
use super::logical::ProjectionField;

/// Validated pagination window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Pagination {
    /// Validates raw `$limit` / `$offset` values
    pub fn parse(limit: Option<&Value>, offset: Option<&Value>) -> PlannerResult<Self> {
        Ok(Self {
            limit: parse_bound("$limit", limit)?,
            offset: parse_bound("$offset", offset)?,
        })
    }
}

fn parse_bound(key: &str, value: Option<&Value>) -> PlannerResult<Option<u64>> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    let number = match value {
        Value::Number(n) => n,
        other => {
            return Err(PlannerError::invalid_pagination(
                key,
                format!("must be a number, got {}", other),
            ))
        }
    };

    if let Some(n) = number.as_u64() {
        return Ok(Some(n));
    }

    // Integral floats such as 10.0 are accepted
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        Some(f) if f < 0.0 => Err(PlannerError::invalid_pagination(
            key,
            format!("must be non-negative, got {}", number),
        )),
        _ => Err(PlannerError::invalid_pagination(
            key,
            format!("must be an integer, got {}", number),
        )),
    }
}

/// Checks every sort target against the projection
pub fn validate_sort(sort: &[SortSpec], projection: &[ProjectionField]) -> PlannerResult<()> {
    for spec in sort {
        let found = projection
            .iter()
            .any(|p| p.output_key() == spec.field || p.path() == Some(spec.field.as_str()));
        if !found {
            return Err(PlannerError::invalid_sort(&spec.field));
        }
    }
    Ok(())
}

/// Output key of the projection entry a sort target names, matched by
/// output key first, then by source path
pub fn sort_column<'p>(field: &'p str, projection: &'p [ProjectionField]) -> &'p str {
    if projection.iter().any(|p| p.output_key() == field) {
        return field;
    }
    projection
        .iter()
        .find(|p| p.path() == Some(field))
        .map_or(field, ProjectionField::output_key)
}
