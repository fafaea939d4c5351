//! Access-path rewrite
//!
//! Only a table scan is rewritten, and only from its first conjunct:
//!
//! - `id = x` / `id IN [..]`: record pointer over the scanned tables
//! - `Nested` on a traversable link or role: subquery over the opposite
//!   thing filtered by the nested filter (itself optimized), correlated
//!   back through the opposite field
//! - reference `IN` (ONE) / `CONTAINSANY` (MANY) on a traversable field:
//!   subquery whose source is a record pointer over the referenced ids
//!
//! The matched conjunct is dropped; the rest becomes the residual filter.
//!
//! A traversal reads pointers back from the opposite field, so it is only
//! taken when those pointers cover exactly the scanned thing's variants.

use serde_json::Value;

use super::QueryOptimizer;
use crate::planner::{DataSource, Filter, ListOp, ScalarOp};
use crate::schema::{Cardinality, FieldSchema, Opposite, ThingSchema, ID_COLUMN};

impl QueryOptimizer<'_> {
    /// New source and residual filter, or `None` if the first conjunct
    /// offers no better access path
    pub(super) fn rewrite_access(
        &self,
        thing: &str,
        tables: &[String],
        filter: &Filter,
    ) -> Option<(DataSource, Option<Filter>)> {
        let conjuncts = filter.conjuncts();
        let (first, rest) = conjuncts.split_first()?;

        let source = point_lookup(tables, first).or_else(|| self.traversal(thing, first))?;

        let residual: Vec<Filter> = rest.iter().map(|f| (*f).clone()).collect();
        let residual = (!residual.is_empty()).then(|| Filter::all(residual));
        Some((source, residual))
    }

    fn traversal(&self, thing: &str, first: &Filter) -> Option<DataSource> {
        let owner = self.schema.thing(thing)?;
        match first {
            Filter::Nested {
                filter,
                path,
                tunnel: None,
                ..
            } => {
                let (_, opposite) = self.traversable(owner, path)?;
                let target = self.schema.thing(&opposite.thing)?;
                let (source, inner) = self.optimize_access(
                    &target.name,
                    DataSource::TableScan {
                        thing: target.variants(),
                    },
                    Some((**filter).clone()),
                );
                Some(DataSource::SubQuery {
                    source: Box::new(source),
                    opposite_path: opposite.path.clone(),
                    filter: inner.map(Box::new),
                    cardinality: opposite.cardinality,
                })
            }
            Filter::Ref {
                op,
                left,
                right,
                thing: referenced,
                tunnel: None,
            } => {
                let (field, opposite) = self.traversable(owner, left)?;
                let aligned = matches!(
                    (op, field.kind.cardinality()?),
                    (ListOp::In, Cardinality::One) | (ListOp::ContainsAny, Cardinality::Many)
                );
                if !aligned {
                    return None;
                }
                let tables = referenced
                    .clone()
                    .or_else(|| self.schema.thing(&opposite.thing).map(ThingSchema::variants))
                    .unwrap_or_else(|| vec![opposite.thing.clone()]);
                Some(DataSource::SubQuery {
                    source: Box::new(DataSource::RecordPointer {
                        thing: tables,
                        ids: right.clone(),
                    }),
                    opposite_path: opposite.path.clone(),
                    filter: None,
                    cardinality: opposite.cardinality,
                })
            }
            _ => None,
        }
    }

    fn traversable<'t>(
        &self,
        owner: &'t ThingSchema,
        path: &str,
    ) -> Option<(&'t FieldSchema, &'t Opposite)> {
        let field = owner.field(path)?;
        if !self.schema.is_traversable(field) {
            return None;
        }
        let opposite = field.kind.opposite()?;
        let back = self.schema.opposite_field(opposite)?.kind.opposite()?;
        let pointed = self.schema.thing(&back.thing)?;
        if !same_tables(&pointed.variants(), &owner.variants()) {
            return None;
        }
        Some((field, opposite))
    }
}

fn same_tables(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|t| b.contains(t))
}

fn point_lookup(tables: &[String], first: &Filter) -> Option<DataSource> {
    let ids = match first {
        Filter::Scalar {
            op: ScalarOp::Eq,
            left,
            right: Value::String(id),
        } if left == ID_COLUMN => vec![id.clone()],
        Filter::List {
            op: ListOp::In,
            left,
            right,
        } if left == ID_COLUMN => right
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?,
        _ => return None,
    };
    let ids = ids.into_iter().fold(Vec::new(), |mut seen: Vec<String>, id| {
        if !seen.contains(&id) {
            seen.push(id);
        }
        seen
    });
    Some(DataSource::RecordPointer {
        thing: tables.to_vec(),
        ids,
    })
}
