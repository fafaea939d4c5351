//! FROM clause rendering

use super::filter::{pointers, render_condition};
use super::ident::escape_ident;
use super::params::ParamBag;
use crate::planner::DataSource;

/// Renders the FROM target of a data source
pub fn render_source(source: &DataSource, params: &mut ParamBag) -> String {
    match source {
        DataSource::TableScan { thing } => thing
            .iter()
            .map(|t| escape_ident(t))
            .collect::<Vec<_>>()
            .join(", "),
        DataSource::RecordPointer { thing, ids } => pointers(thing, ids, params).join(", "),
        DataSource::SubQuery {
            source,
            opposite_path,
            filter,
            cardinality,
        } => {
            let mut select = format!(
                "SELECT VALUE {} FROM {}",
                escape_ident(opposite_path),
                render_source(source, params)
            );
            if let Some(filter) = filter {
                select.push_str(" WHERE ");
                select.push_str(&render_condition(filter, params));
            }
            if cardinality.is_many() {
                format!("array::distinct(array::flatten({}))", select)
            } else {
                format!("array::distinct({})", select)
            }
        }
    }
}
