//! Query compiler subsystem
//!
//! Renders a logical plan as parameterized SurrealQL.
//!
//! # Design Principles
//!
//! - Total: any plan the builder or optimizer produces renders
//! - Injection-safe: literals are bound as `$p<n>` parameters, never inlined
//! - Sequential: statements of one batch share one [`ParamBag`]
//!
//! # Statement Shape
//!
//! ```text
//! SELECT <projection> FROM <source> [WHERE ..] [ORDER BY ..] [LIMIT n] [START n]
//! ```
//!
//! A ONE-cardinality statement is wrapped in `array::first(..)`.

mod filter;
mod ident;
mod params;
mod projection;
mod source;

pub use filter::{render_condition, render_filter};
pub use ident::{escape_ident, escape_path};
pub use params::ParamBag;
pub use projection::render_projection;
pub use source::render_source;

use crate::planner::{sort_column, LogicalQuery, ProjectionField, SortSpec};

/// Renders logical plans to query text
pub struct QueryCompiler;

impl QueryCompiler {
    /// Renders one statement, binding its literals into `params`
    pub fn compile(query: &LogicalQuery, params: &mut ParamBag) -> String {
        let mut select = format!(
            "SELECT {} FROM {}",
            render_projection(&query.projection, params),
            render_source(&query.source, params)
        );

        if let Some(filter) = &query.filter {
            select.push_str(" WHERE ");
            select.push_str(&render_condition(filter, params));
        }

        select.push_str(&tail(&query.sort, &query.projection, query.limit, query.offset));

        if query.cardinality.is_many() {
            select
        } else {
            take_first(&select)
        }
    }
}

fn take_first(expr: &str) -> String {
    format!("array::first({})", expr)
}

/// ORDER BY / LIMIT / START suffix
fn tail(
    sort: &[SortSpec],
    projection: &[ProjectionField],
    limit: Option<u64>,
    offset: Option<u64>,
) -> String {
    let mut out = String::new();
    if !sort.is_empty() {
        let keys: Vec<String> = sort
            .iter()
            .map(|s| {
                let key = sort_column(&s.field, projection);
                format!("{} {}", escape_ident(key), s.direction.as_str())
            })
            .collect();
        out.push_str(" ORDER BY ");
        out.push_str(&keys.join(", "));
    }
    if let Some(limit) = limit {
        out.push_str(&format!(" LIMIT {}", limit));
    }
    if let Some(offset) = offset {
        out.push_str(&format!(" START {}", offset));
    }
    out
}
