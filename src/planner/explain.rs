//! Explain output for logical plans
//!
//! Produces deterministic, human-readable explain output.

use std::fmt;

use super::errors::PlannerError;
use super::logical::{DataSource, LogicalQuery};

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    /// Access path name (if accepted)
    pub access_path: Option<String>,
    /// Tables touched by the innermost scan
    pub things: Vec<String>,
    /// Correlation field of a subquery source
    pub via: Option<String>,
    /// Top-level predicates in evaluation order
    pub predicates: Vec<String>,
    /// ONE or MANY
    pub cardinality: Option<String>,
    /// Sort description
    pub sort: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a built or optimized query
    pub fn from_query(query: &LogicalQuery) -> Self {
        let predicates = query
            .filter
            .as_ref()
            .map(|f| f.conjuncts().iter().map(|c| c.to_string()).collect())
            .unwrap_or_default();

        let via = match &query.source {
            DataSource::SubQuery { opposite_path, .. } => Some(opposite_path.clone()),
            _ => None,
        };

        let sort = query
            .sort
            .iter()
            .map(|s| format!("{} {}", s.field, s.direction.as_str()))
            .collect();

        Self {
            accepted: true,
            access_path: Some(query.source.access_path().to_string()),
            things: query.source.things().to_vec(),
            via,
            predicates,
            cardinality: Some(query.cardinality.as_str().to_string()),
            sort,
            limit: query.limit,
            offset: query.offset,
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &PlannerError) -> Self {
        Self {
            accepted: false,
            access_path: None,
            things: Vec::new(),
            via: None,
            predicates: Vec::new(),
            cardinality: None,
            sort: Vec::new(),
            limit: None,
            offset: None,
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(path) = &self.access_path {
                writeln!(f, "Access Path: {}", path)?;
            }
            if !self.things.is_empty() {
                writeln!(f, "Things: {}", self.things.join(", "))?;
            }
            if let Some(via) = &self.via {
                writeln!(f, "Via: {}", via)?;
            }
            if !self.predicates.is_empty() {
                writeln!(f, "Predicates:")?;
                for pred in &self.predicates {
                    writeln!(f, "  - {}", pred)?;
                }
            }
            if let Some(cardinality) = &self.cardinality {
                writeln!(f, "Cardinality: {}", cardinality)?;
            }
            if !self.sort.is_empty() {
                writeln!(f, "Sort: {}", self.sort.join(", "))?;
            }
            if let Some(limit) = self.limit {
                writeln!(f, "Limit: {}", limit)?;
            }
            if let Some(offset) = self.offset {
                writeln!(f, "Offset: {}", offset)?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
