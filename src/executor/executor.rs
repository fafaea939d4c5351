//! Reference executor
//!
//! Evaluates a logical plan directly over a [`MemoryStore`], with the same
//! semantics as the rendered statement. Used to check that optimized and
//! unoptimized plans return the same rows.
//!
//! Execution flow (strict order):
//! 1. Fetch candidate rows from the data source
//! 2. Filter rows by the plan filter
//! 3. Project every row
//! 4. Apply sort, then offset, then limit
//! 5. Shape the result for the plan cardinality

use serde_json::{Map, Value};

use super::filters::PredicateFilter;
use super::result::{collect, ProjectedRow};
use super::sorter::ResultSorter;
use super::store::{MemoryStore, Row};
use crate::planner::{
    sort_column, DataSource, Filter, LogicalQuery, MetaField, ProjectionField, SortSpec,
};
use crate::schema::{Cardinality, ID_COLUMN};

/// Executes logical plans over an in-memory store
#[derive(Debug, Clone, Copy)]
pub struct MemoryExecutor<'a> {
    store: &'a MemoryStore,
    filter: PredicateFilter<'a>,
}

impl<'a> MemoryExecutor<'a> {
    pub fn new(store: &'a MemoryStore) -> Self {
        Self {
            store,
            filter: PredicateFilter::new(store),
        }
    }

    /// Executes a plan: an array for MANY, the first row or null for ONE
    pub fn execute(&self, query: &LogicalQuery) -> Value {
        // Step 1: Candidate rows from the access path
        let rows = self.source_rows(&query.source);

        // Step 2: Filter
        let rows = self.retain(rows, query.filter.as_ref());

        // Steps 3-4: Project, sort, paginate
        let out = self.shape(
            rows,
            &query.projection,
            &query.sort,
            query.limit,
            query.offset,
        );

        // Step 5: Cardinality
        collect(out, query.cardinality.is_many())
    }

    fn source_rows(&self, source: &DataSource) -> Vec<Row<'a>> {
        match source {
            DataSource::TableScan { thing } => {
                thing.iter().flat_map(|t| self.store.scan(t)).collect()
            }
            DataSource::RecordPointer { thing, ids } => thing
                .iter()
                .flat_map(|t| ids.iter().filter_map(move |id| self.store.get(t, id)))
                .collect(),
            DataSource::SubQuery {
                source,
                opposite_path,
                filter,
                ..
            } => {
                let inner = self.retain(self.source_rows(source), filter.as_deref());
                let mut pointers: Vec<String> = Vec::new();
                for row in inner {
                    for p in self.filter.pointers(row.record, opposite_path, None) {
                        if !pointers.contains(&p) {
                            pointers.push(p);
                        }
                    }
                }
                pointers
                    .iter()
                    .filter_map(|p| self.store.resolve(p))
                    .collect()
            }
        }
    }

    fn retain(&self, mut rows: Vec<Row<'a>>, filter: Option<&Filter>) -> Vec<Row<'a>> {
        if let Some(filter) = filter {
            rows.retain(|row| self.filter.matches(row.record, filter));
        }
        rows
    }

    fn shape(
        &self,
        rows: Vec<Row<'a>>,
        projection: &[ProjectionField],
        sort: &[SortSpec],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Vec<Value> {
        let mut projected: Vec<ProjectedRow<'a>> = rows
            .into_iter()
            .map(|row| ProjectedRow::new(row, self.project(row, projection)))
            .collect();

        let sort: Vec<SortSpec> = sort
            .iter()
            .map(|s| SortSpec {
                field: sort_column(&s.field, projection).to_string(),
                ..s.clone()
            })
            .collect();
        ResultSorter::sort(&mut projected, &sort);

        let offset = offset.map_or(0, |o| o as usize);
        let limit = limit.map_or(usize::MAX, |l| l as usize);
        projected
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(ProjectedRow::into_value)
            .collect()
    }

    fn project(&self, row: Row<'a>, projection: &[ProjectionField]) -> Map<String, Value> {
        if projection.is_empty() {
            return row.record.as_object().cloned().unwrap_or_default();
        }

        let mut out = Map::new();
        for field in projection {
            if let Some(value) = self.project_field(row, field) {
                out.insert(field.output_key().to_string(), value);
            }
        }
        out
    }

    /// Projected value, `None` when the column is absent
    fn project_field(&self, row: Row<'a>, field: &ProjectionField) -> Option<Value> {
        match field {
            ProjectionField::Metadata {
                field: MetaField::Thing,
                ..
            } => Some(Value::String(row.table.to_string())),
            ProjectionField::Metadata {
                field: MetaField::Id,
                ..
            } => row.record.get(ID_COLUMN).cloned(),
            ProjectionField::Data { path, .. } => row.record.get(path.as_str()).cloned(),
            ProjectionField::Reference {
                path,
                cardinality,
                tunnel,
                ..
            } => {
                let ids: Vec<Value> = self
                    .filter
                    .related(row.record, path, tunnel.as_deref())
                    .iter()
                    .filter_map(|r| r.id())
                    .map(|id| Value::String(id.to_string()))
                    .collect();
                by_cardinality(ids, *cardinality)
            }
            ProjectionField::Flex {
                path, cardinality, ..
            } => {
                let value = row.record.get(path.as_str())?;
                Some(match (value, cardinality) {
                    (Value::Array(items), Cardinality::Many) => {
                        Value::Array(items.iter().map(|v| self.flex(v)).collect())
                    }
                    (other, _) => self.flex(other),
                })
            }
            ProjectionField::NestedReference(nested) => {
                let mut related = self
                    .filter
                    .related(row.record, &nested.path, nested.tunnel.as_deref());
                if let Some(ids) = &nested.ids {
                    related.retain(|r| r.id().is_some_and(|id| ids.iter().any(|i| i == id)));
                }
                let related = self.retain(related, nested.filter.as_ref());
                let rows = self.shape(
                    related,
                    &nested.projection,
                    &nested.sort,
                    nested.limit,
                    nested.offset,
                );
                by_cardinality(rows, nested.cardinality)
            }
        }
    }

    /// Replaces a pointer by its id, passing other values through
    fn flex(&self, value: &Value) -> Value {
        match value.as_str().and_then(|s| self.store.split_pointer(s)) {
            Some((_, id)) => Value::String(id.to_string()),
            None => value.clone(),
        }
    }
}

fn by_cardinality(values: Vec<Value>, cardinality: Cardinality) -> Option<Value> {
    if cardinality.is_many() {
        Some(Value::Array(values))
    } else {
        values.into_iter().next()
    }
}
