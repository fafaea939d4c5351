//! Query optimizer subsystem
//!
//! Rewrites a logical plan into an equivalent, cheaper plan.
//!
//! # Design Principles
//!
//! - Semantics-preserving: the optimized plan returns the same rows
//! - Idempotent: optimizing an optimized plan returns it unchanged
//! - Total: every valid plan optimizes, nothing here can fail
//!
//! # Pipeline
//!
//! Per query level:
//!
//! 1. Normalize the filter ([`normalize`])
//! 2. On a table scan, rewrite the cheapest conjunct into a better access
//!    path and tidy the residual filter
//! 3. Otherwise reorder top-level predicates for index use ([`reorder`]) and
//!    try the rewrite once more on the promoted conjunct
//!
//! Nested reference projections get steps 1 and 3 against their own thing,
//! without any access-path rewrite.

mod access;
mod cost;
mod index;
mod normalize;

pub use cost::cost;
pub use index::reorder;
pub use normalize::normalize;

use crate::planner::{DataSource, Filter, LogicalQuery, NestedReference, ProjectionField};
use crate::schema::Schema;

/// Schema-aware plan rewriter
#[derive(Debug, Clone, Copy)]
pub struct QueryOptimizer<'a> {
    schema: &'a Schema,
}

impl<'a> QueryOptimizer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Returns the optimized plan
    pub fn optimize(&self, query: &LogicalQuery) -> LogicalQuery {
        let (source, filter) =
            self.optimize_access(&query.thing, query.source.clone(), query.filter.clone());

        LogicalQuery {
            thing: query.thing.clone(),
            source,
            projection: self.optimize_projection(&query.projection),
            filter,
            limit: query.limit,
            offset: query.offset,
            sort: query.sort.clone(),
            cardinality: query.cardinality,
        }
    }

    /// Normalized and reordered filter, `None` when always true
    fn tidy(&self, thing: &str, filter: Filter) -> Option<Filter> {
        let normalized = normalize(filter);
        if normalized.is_truthy() {
            return None;
        }
        Some(self.reorder_for(thing, normalized))
    }

    fn optimize_access(
        &self,
        thing: &str,
        source: DataSource,
        filter: Option<Filter>,
    ) -> (DataSource, Option<Filter>) {
        let Some(filter) = filter.map(normalize).filter(|f| !f.is_truthy()) else {
            return (source, None);
        };
        let tables = match source {
            DataSource::TableScan { thing: tables } => tables,
            other => return (other, Some(self.reorder_for(thing, filter))),
        };

        // Cheapest conjunct first, then the index-preferred one
        if let Some(rewrite) = self.rewrite_access(thing, &tables, &filter) {
            return self.with_residual(thing, rewrite);
        }
        let filter = self.reorder_for(thing, filter);
        match self.rewrite_access(thing, &tables, &filter) {
            Some(rewrite) => self.with_residual(thing, rewrite),
            None => (DataSource::TableScan { thing: tables }, Some(filter)),
        }
    }

    fn with_residual(
        &self,
        thing: &str,
        (source, residual): (DataSource, Option<Filter>),
    ) -> (DataSource, Option<Filter>) {
        (source, residual.and_then(|r| self.tidy(thing, r)))
    }

    fn reorder_for(&self, thing: &str, filter: Filter) -> Filter {
        match self.schema.thing(thing) {
            Some(schema) => reorder(filter, schema),
            None => filter,
        }
    }

    fn optimize_projection(&self, projection: &[ProjectionField]) -> Vec<ProjectionField> {
        projection
            .iter()
            .map(|field| match field {
                ProjectionField::NestedReference(nested) => {
                    ProjectionField::NestedReference(Box::new(NestedReference {
                        filter: nested.filter.clone().and_then(|f| self.tidy(&nested.thing, f)),
                        projection: self.optimize_projection(&nested.projection),
                        ..(**nested).clone()
                    }))
                }
                other => other.clone(),
            })
            .collect()
    }
}
