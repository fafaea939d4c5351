//! Query planner subsystem
//!
//! Turns declarative BQL queries into logical plans.
//!
//! # Design Principles
//!
//! - Validating: unknown things, fields, operators and bounds are rejected here
//! - Pure: same query and schema produce the same plan
//! - Immutable: plans are values, later stages return new plans
//!
//! # Access Path Selection
//!
//! 1. `$id` present: record pointer over every variant table
//! 2. Otherwise: table scan over every variant table
//!
//! The optimizer may later narrow a table scan to a pointer or subquery.

mod ast;
mod bounds;
mod builder;
mod errors;
mod explain;
mod logical;

pub use ast::{
    FieldSelector, IdSelector, NestedField, Query, QueryBody, SortDirection, SortItem, SortSpec,
};
pub use bounds::{sort_column, validate_sort, Pagination};
pub use builder::LogicalQueryBuilder;
pub use errors::{PlannerError, PlannerErrorCode, PlannerResult, Severity};
pub use explain::ExplainPlan;
pub use logical::{
    DataSource, Filter, ListOp, LogicalQuery, MetaField, NestedReference, NullOp, ProjectionField,
    ScalarOp,
};
