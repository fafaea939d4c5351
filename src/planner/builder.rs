//! Logical query builder
//!
//! Turns a declarative query into a `LogicalQuery`, validating every thing,
//! field, operator and bound against the schema. This is the only stage
//! that rejects user input; everything downstream is total over its output.
//!
//! Cardinality is ONE iff `$id` is a single id or the top-level filter pins
//! a unique field with `=` (or a one-element `IN`).

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::ast::{FieldSelector, IdSelector, NestedField, Query, QueryBody, SortItem, SortSpec};
use super::bounds::{validate_sort, Pagination};
use super::errors::{PlannerError, PlannerResult};
use super::logical::{
    DataSource, Filter, ListOp, LogicalQuery, MetaField, NestedReference, NullOp, ProjectionField,
    ScalarOp,
};
use crate::schema::{
    Cardinality, FieldKind, FieldSchema, Opposite, RefContent, Schema, ThingSchema, ID_COLUMN,
};

/// Builds logical plans from declarative queries
pub struct LogicalQueryBuilder<'a> {
    schema: &'a Schema,
    metadata: bool,
}

/// Everything one query level contributes to a plan
struct Level {
    projection: Vec<ProjectionField>,
    ids: Option<Vec<String>>,
    filter: Option<Filter>,
    pagination: Pagination,
    sort: Vec<SortSpec>,
    cardinality: Cardinality,
}

impl<'a> LogicalQueryBuilder<'a> {
    /// Creates a builder that projects `$id`/`$thing` metadata
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            metadata: true,
        }
    }

    pub fn with_metadata(mut self, metadata: bool) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builds the plan for one root query.
    pub fn build(&self, query: &Query) -> PlannerResult<LogicalQuery> {
        // 1. Resolve the queried thing
        let thing = self.thing(&query.thing)?;

        // 2. Build projection, filter, bounds and cardinality
        let level = self.build_level(thing, &query.body)?;

        // 3. Pick the access path
        let source = match level.ids {
            Some(ids) => DataSource::RecordPointer {
                thing: thing.variants(),
                ids,
            },
            None => DataSource::TableScan {
                thing: thing.variants(),
            },
        };

        Ok(LogicalQuery {
            thing: thing.name.clone(),
            source,
            projection: level.projection,
            filter: level.filter,
            limit: level.pagination.limit,
            offset: level.pagination.offset,
            sort: level.sort,
            cardinality: level.cardinality,
        })
    }

    fn thing(&self, name: &str) -> PlannerResult<&'a ThingSchema> {
        self.schema
            .thing(name)
            .ok_or_else(|| PlannerError::unknown_thing(name))
    }

    fn build_level(&self, thing: &ThingSchema, body: &QueryBody) -> PlannerResult<Level> {
        let projection = self.build_projection(thing, body)?;

        let filter = match &body.filter {
            Some(value) => Some(self.build_filter(thing, value)?).filter(|f| !f.is_truthy()),
            None => None,
        };

        let pagination = Pagination::parse(body.limit.as_ref(), body.offset.as_ref())?;

        let sort: Vec<SortSpec> = body.sort.iter().map(SortItem::to_spec).collect();
        validate_sort(&sort, &projection)?;

        let single_id = body.id.as_ref().and_then(IdSelector::single).is_some();
        let unique = filter
            .as_ref()
            .is_some_and(|f| self.pins_unique_field(thing, f));
        let cardinality = if single_id || unique {
            Cardinality::One
        } else {
            Cardinality::Many
        };

        Ok(Level {
            projection,
            ids: body.id.as_ref().map(IdSelector::ids),
            filter,
            pagination,
            sort,
            cardinality,
        })
    }

    // ==================
    // Projection
    // ==================

    fn build_projection(
        &self,
        thing: &ThingSchema,
        body: &QueryBody,
    ) -> PlannerResult<Vec<ProjectionField>> {
        for excluded in &body.excluded_fields {
            if thing.field(excluded).is_none() {
                return Err(PlannerError::unknown_field(&thing.name, excluded));
            }
        }
        let is_excluded = |path: &str| body.excluded_fields.iter().any(|e| e == path);

        let mut projection = Vec::new();
        if self.metadata {
            projection.push(ProjectionField::Metadata {
                field: MetaField::Thing,
                alias: None,
            });
            projection.push(ProjectionField::Metadata {
                field: MetaField::Id,
                alias: None,
            });
        }

        match &body.fields {
            None => {
                for field in thing.fields.iter().filter(|f| !is_excluded(&f.name)) {
                    projection.extend(self.project_field(thing, field));
                }
            }
            Some(selectors) => {
                for selector in selectors.iter().filter(|s| !is_excluded(s.field_path())) {
                    match selector {
                        FieldSelector::Path(path) => {
                            let field = thing
                                .field(path)
                                .ok_or_else(|| PlannerError::unknown_field(&thing.name, path))?;
                            projection.extend(self.project_field(thing, field));
                        }
                        FieldSelector::Nested(nested) => {
                            projection.push(self.project_nested(thing, nested)?);
                        }
                    }
                }
            }
        }

        let mut keys = HashSet::new();
        if let Some(dup) = projection.iter().find(|p| !keys.insert(p.output_key())) {
            return Err(PlannerError::duplicate_alias(dup.output_key()));
        }

        Ok(projection)
    }

    /// Constant and computed fields are injected by the assembler, never selected
    fn project_field(&self, thing: &ThingSchema, field: &FieldSchema) -> Option<ProjectionField> {
        let path = field.name.clone();
        match &field.kind {
            FieldKind::Constant { .. } | FieldKind::Computed(_) => None,
            FieldKind::Data { .. } if thing.is_id_field(&field.name) => {
                let alias = (field.name != ID_COLUMN).then_some(path);
                Some(ProjectionField::Data {
                    path: ID_COLUMN.to_string(),
                    alias,
                })
            }
            FieldKind::Data { .. } => Some(ProjectionField::Data { path, alias: None }),
            FieldKind::Ref {
                content_type: RefContent::Flex,
                cardinality,
            } => Some(ProjectionField::Flex {
                path,
                alias: None,
                cardinality: *cardinality,
            }),
            FieldKind::Ref {
                content_type: RefContent::Ref,
                cardinality,
            } => Some(ProjectionField::Reference {
                path,
                alias: None,
                cardinality: *cardinality,
                tunnel: None,
            }),
            FieldKind::Link { cardinality, .. } | FieldKind::Role { cardinality, .. } => {
                Some(ProjectionField::Reference {
                    path,
                    alias: None,
                    cardinality: *cardinality,
                    tunnel: self.schema.tunnel_role(field),
                })
            }
        }
    }

    fn project_nested(
        &self,
        thing: &ThingSchema,
        nested: &NestedField,
    ) -> PlannerResult<ProjectionField> {
        let field = thing
            .field(&nested.path)
            .ok_or_else(|| PlannerError::unknown_field(&thing.name, &nested.path))?;

        let (field_cardinality, opposite) = match &field.kind {
            FieldKind::Link {
                cardinality,
                opposite,
                ..
            }
            | FieldKind::Role {
                cardinality,
                opposite,
            } => (*cardinality, opposite),
            other => {
                return Err(PlannerError::schema_mismatch(format!(
                    "Field '{}' on '{}' is a {} field and cannot be nested",
                    nested.path,
                    thing.name,
                    other.kind_name()
                )))
            }
        };

        let target = self.thing(&opposite.thing)?;
        let level = self.build_level(target, &nested.body)?;
        let cardinality = match field_cardinality {
            Cardinality::One => Cardinality::One,
            Cardinality::Many => level.cardinality,
        };

        Ok(ProjectionField::NestedReference(Box::new(NestedReference {
            path: nested.path.clone(),
            thing: target.name.clone(),
            projection: level.projection,
            ids: level.ids,
            filter: level.filter,
            alias: nested.alias.clone(),
            cardinality,
            limit: level.pagination.limit,
            offset: level.pagination.offset,
            sort: level.sort,
            tunnel: self.schema.tunnel_role(field),
        })))
    }

    // ==================
    // Filters
    // ==================

    /// Object: AND of its entries. Array: OR of its elements.
    fn build_filter(&self, thing: &ThingSchema, value: &Value) -> PlannerResult<Filter> {
        match value {
            Value::Object(entries) => {
                let parts = entries
                    .iter()
                    .map(|(key, v)| self.build_entry(thing, key, v))
                    .collect::<PlannerResult<Vec<_>>>()?;
                Ok(Filter::all(parts))
            }
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(|item| self.build_filter(thing, item))
                    .collect::<PlannerResult<Vec<_>>>()?;
                Ok(Filter::any(parts))
            }
            other => Err(PlannerError::invalid_filter_shape(
                None,
                format!("Filter must be an object or an array, got {}", other),
            )),
        }
    }

    fn build_entry(&self, thing: &ThingSchema, key: &str, value: &Value) -> PlannerResult<Filter> {
        match key {
            "$or" => match value {
                Value::Object(entries) => {
                    let parts = entries
                        .iter()
                        .map(|(k, v)| self.build_entry(thing, k, v))
                        .collect::<PlannerResult<Vec<_>>>()?;
                    Ok(Filter::any(parts))
                }
                Value::Array(_) => self.build_filter(thing, value),
                _ => Err(PlannerError::invalid_filter_shape(
                    Some(key),
                    "$or expects an object or an array",
                )),
            },
            "$and" => match value {
                Value::Object(_) => self.build_filter(thing, value),
                Value::Array(items) => {
                    let parts = items
                        .iter()
                        .map(|item| self.build_filter(thing, item))
                        .collect::<PlannerResult<Vec<_>>>()?;
                    Ok(Filter::all(parts))
                }
                _ => Err(PlannerError::invalid_filter_shape(
                    Some(key),
                    "$and expects an object or an array",
                )),
            },
            "$not" => Ok(Filter::Not(Box::new(self.build_filter(thing, value)?))),
            connective if connective.starts_with('$') => Err(PlannerError::invalid_filter_shape(
                Some(connective),
                format!("Unknown connective '{}'", connective),
            )),
            _ => self.build_field_filter(thing, key, value),
        }
    }

    fn build_field_filter(
        &self,
        thing: &ThingSchema,
        key: &str,
        value: &Value,
    ) -> PlannerResult<Filter> {
        let field = thing
            .field(key)
            .ok_or_else(|| PlannerError::unknown_field(&thing.name, key))?;

        match &field.kind {
            FieldKind::Constant { .. } | FieldKind::Computed(_) => Err(
                PlannerError::unsupported_filter(key, "constant and computed fields are not stored"),
            ),
            FieldKind::Data { cardinality, .. } => {
                let left = if thing.is_id_field(key) { ID_COLUMN } else { key };
                data_filter(left, *cardinality, value)
            }
            FieldKind::Ref {
                content_type: RefContent::Flex,
                ..
            } => Err(PlannerError::unsupported_filter(
                key,
                "FLEX references cannot be filtered",
            )),
            FieldKind::Ref {
                content_type: RefContent::Ref,
                cardinality,
            } => match value {
                Value::Null => Ok(Filter::Null {
                    op: NullOp::Is,
                    left: key.to_string(),
                    tunnel: None,
                }),
                _ => Ok(Filter::Ref {
                    op: positive_op(*cardinality),
                    left: key.to_string(),
                    right: ids_of(key, value)?,
                    thing: None,
                    tunnel: None,
                }),
            },
            FieldKind::Link {
                cardinality,
                opposite,
                ..
            }
            | FieldKind::Role {
                cardinality,
                opposite,
            } => self.relation_filter(field, *cardinality, opposite, value),
        }
    }

    fn relation_filter(
        &self,
        field: &FieldSchema,
        cardinality: Cardinality,
        opposite: &Opposite,
        value: &Value,
    ) -> PlannerResult<Filter> {
        let key = field.name.as_str();
        let tunnel = self.schema.tunnel_role(field);
        let things = self
            .schema
            .thing(&opposite.thing)
            .map(ThingSchema::variants)
            .unwrap_or_else(|| vec![opposite.thing.clone()]);

        let reference = |op: ListOp, ids: Vec<String>| Filter::Ref {
            op,
            left: key.to_string(),
            right: ids,
            thing: Some(things.clone()),
            tunnel: tunnel.clone(),
        };
        let null = |op: NullOp| Filter::Null {
            op,
            left: key.to_string(),
            tunnel: tunnel.clone(),
        };

        let entries = match value {
            Value::Null => return Ok(null(NullOp::Is)),
            Value::String(_) | Value::Array(_) => {
                return Ok(reference(positive_op(cardinality), ids_of(key, value)?))
            }
            Value::Object(entries) if !entries.is_empty() => entries,
            other => {
                return Err(PlannerError::invalid_filter_shape(
                    Some(key),
                    format!("Invalid relationship filter {}", other),
                ))
            }
        };

        let mut parts = Vec::new();
        let mut remaining = Map::new();
        for (op, operand) in entries {
            match op.as_str() {
                "$exists" => match operand {
                    Value::Bool(true) => parts.push(null(NullOp::IsNot)),
                    Value::Bool(false) => parts.push(null(NullOp::Is)),
                    _ => {
                        return Err(PlannerError::invalid_filter_shape(
                            Some(key),
                            "$exists expects a boolean",
                        ))
                    }
                },
                "$eq" if operand.is_null() => parts.push(null(NullOp::Is)),
                "$ne" if operand.is_null() => parts.push(null(NullOp::IsNot)),
                "$eq" | "$contains" => {
                    parts.push(reference(positive_op(cardinality), ids_of(key, operand)?))
                }
                "$ne" | "$containsNot" => {
                    parts.push(reference(negative_op(cardinality), ids_of(key, operand)?))
                }
                "$gt" | "$lt" | "$gte" | "$lte" => {
                    return Err(PlannerError::unsupported_filter(
                        key,
                        format!("{} is not supported on relationship fields", op),
                    ))
                }
                _ => match list_op(op) {
                    Some(list) => parts.push(reference(list, ids_of(key, operand)?)),
                    None => {
                        remaining.insert(op.clone(), operand.clone());
                    }
                },
            }
        }

        // Leftover keys filter the thing on the other side
        if !remaining.is_empty() {
            let target = self.thing(&opposite.thing)?;
            let inner = self.build_filter(target, &Value::Object(remaining))?;
            parts.push(Filter::Nested {
                filter: Box::new(inner),
                path: key.to_string(),
                cardinality,
                tunnel,
            });
        }

        Ok(Filter::all(parts))
    }

    /// True if a top-level conjunct pins a unique data field
    fn pins_unique_field(&self, thing: &ThingSchema, filter: &Filter) -> bool {
        let is_unique = |left: &str| {
            left == ID_COLUMN
                || thing.field(left).is_some_and(|f| {
                    matches!(f.kind, FieldKind::Data { unique: true, .. })
                })
        };
        filter.conjuncts().into_iter().any(|conjunct| match conjunct {
            Filter::Scalar {
                op: ScalarOp::Eq,
                left,
                ..
            } => is_unique(left),
            Filter::List {
                op: ListOp::In,
                left,
                right,
            } => right.len() == 1 && is_unique(left),
            _ => false,
        })
    }
}

fn positive_op(cardinality: Cardinality) -> ListOp {
    match cardinality {
        Cardinality::One => ListOp::In,
        Cardinality::Many => ListOp::ContainsAny,
    }
}

fn negative_op(cardinality: Cardinality) -> ListOp {
    match cardinality {
        Cardinality::One => ListOp::NotIn,
        Cardinality::Many => ListOp::ContainsNone,
    }
}

fn scalar_op(op: &str) -> Option<ScalarOp> {
    match op {
        "$eq" => Some(ScalarOp::Eq),
        "$ne" => Some(ScalarOp::Ne),
        "$gt" => Some(ScalarOp::Gt),
        "$lt" => Some(ScalarOp::Lt),
        "$gte" => Some(ScalarOp::Gte),
        "$lte" => Some(ScalarOp::Lte),
        "$contains" => Some(ScalarOp::Contains),
        "$containsNot" => Some(ScalarOp::ContainsNot),
        _ => None,
    }
}

fn list_op(op: &str) -> Option<ListOp> {
    match op {
        "$in" => Some(ListOp::In),
        "$nin" => Some(ListOp::NotIn),
        "$containsAll" => Some(ListOp::ContainsAll),
        "$containsAny" => Some(ListOp::ContainsAny),
        "$containsNone" => Some(ListOp::ContainsNone),
        _ => None,
    }
}

/// Ids given as one string or an array of strings
fn ids_of(key: &str, value: &Value) -> PlannerResult<Vec<String>> {
    let invalid = || {
        PlannerError::invalid_filter_shape(
            Some(key),
            format!("Expected an id or an array of ids, got {}", value),
        )
    };
    match value {
        Value::String(id) => Ok(vec![id.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

fn data_filter(left: &str, cardinality: Cardinality, value: &Value) -> PlannerResult<Filter> {
    match value {
        Value::Null => Ok(Filter::Null {
            op: NullOp::Is,
            left: left.to_string(),
            tunnel: None,
        }),
        Value::Array(items) => Ok(Filter::List {
            op: positive_op(cardinality),
            left: left.to_string(),
            right: items.clone(),
        }),
        Value::Object(ops) if ops.is_empty() => Err(PlannerError::invalid_filter_shape(
            Some(left),
            "Empty operator object",
        )),
        Value::Object(ops) => {
            let parts = ops
                .iter()
                .map(|(op, operand)| data_operator(left, op, operand))
                .collect::<PlannerResult<Vec<_>>>()?;
            Ok(Filter::all(parts))
        }
        scalar => {
            let op = match cardinality {
                Cardinality::One => ScalarOp::Eq,
                Cardinality::Many => ScalarOp::Contains,
            };
            Ok(Filter::Scalar {
                op,
                left: left.to_string(),
                right: scalar.clone(),
            })
        }
    }
}

fn data_operator(left: &str, op: &str, operand: &Value) -> PlannerResult<Filter> {
    let null = |op: NullOp| Filter::Null {
        op,
        left: left.to_string(),
        tunnel: None,
    };

    match op {
        "$eq" if operand.is_null() => return Ok(null(NullOp::Is)),
        "$ne" if operand.is_null() => return Ok(null(NullOp::IsNot)),
        "$exists" => {
            return match operand {
                Value::Bool(true) => Ok(null(NullOp::IsNot)),
                Value::Bool(false) => Ok(null(NullOp::Is)),
                _ => Err(PlannerError::invalid_filter_shape(
                    Some(left),
                    "$exists expects a boolean",
                )),
            }
        }
        _ => {}
    }

    if let Some(scalar) = scalar_op(op) {
        if operand.is_null() {
            return Err(PlannerError::invalid_filter_shape(
                Some(left),
                format!("{} does not accept null", op),
            ));
        }
        return Ok(Filter::Scalar {
            op: scalar,
            left: left.to_string(),
            right: operand.clone(),
        });
    }

    if let Some(list) = list_op(op) {
        return match operand {
            Value::Array(items) => Ok(Filter::List {
                op: list,
                left: left.to_string(),
                right: items.clone(),
            }),
            _ => Err(PlannerError::invalid_filter_shape(
                Some(left),
                format!("{} expects an array", op),
            )),
        };
    }

    if op.starts_with('$') {
        Err(PlannerError::unsupported_filter(
            left,
            format!("Unknown operator '{}'", op),
        ))
    } else {
        Err(PlannerError::invalid_filter_shape(
            Some(left),
            format!("Data field filters take operators, found key '{}'", op),
        ))
    }
}
