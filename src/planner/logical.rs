//! Logical query plan
//!
//! The engine-agnostic intermediate form between the declarative query and
//! rendered query text. Plans are immutable values; the optimizer rewrites
//! them by returning new plans.

use std::fmt;

use serde_json::Value;

use super::ast::SortSpec;
use crate::schema::Cardinality;

/// Where rows come from
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Scan over every variant table of a thing
    TableScan { thing: Vec<String> },
    /// Point lookup, one pointer per (variant, id)
    RecordPointer { thing: Vec<String>, ids: Vec<String> },
    /// Scan the related thing and project the opposite field back
    SubQuery {
        source: Box<DataSource>,
        opposite_path: String,
        filter: Option<Box<Filter>>,
        /// Cardinality of `opposite_path`
        cardinality: Cardinality,
    },
}

impl DataSource {
    /// Stable access path name
    pub fn access_path(&self) -> &'static str {
        match self {
            DataSource::TableScan { .. } => "TABLE_SCAN",
            DataSource::RecordPointer { .. } => "RECORD_POINTER",
            DataSource::SubQuery { .. } => "SUBQUERY",
        }
    }

    /// Variant tables touched by the innermost scan
    pub fn things(&self) -> &[String] {
        match self {
            DataSource::TableScan { thing } | DataSource::RecordPointer { thing, .. } => thing,
            DataSource::SubQuery { source, .. } => source.things(),
        }
    }
}

/// Metadata column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Id,
    Thing,
}

impl MetaField {
    pub fn key(&self) -> &'static str {
        match self {
            MetaField::Id => "$id",
            MetaField::Thing => "$thing",
        }
    }
}

/// One projected output column
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionField {
    Metadata {
        field: MetaField,
        alias: Option<String>,
    },
    Data {
        path: String,
        alias: Option<String>,
    },
    /// Relationship or REF field projected as ids
    Reference {
        path: String,
        alias: Option<String>,
        cardinality: Cardinality,
        tunnel: Option<String>,
    },
    NestedReference(Box<NestedReference>),
    /// Pointer-or-value field
    Flex {
        path: String,
        alias: Option<String>,
        cardinality: Cardinality,
    },
}

impl ProjectionField {
    /// Key of this column in the returned row
    pub fn output_key(&self) -> &str {
        match self {
            ProjectionField::Metadata { field, alias } => alias.as_deref().unwrap_or(field.key()),
            ProjectionField::Data { path, alias }
            | ProjectionField::Reference { path, alias, .. }
            | ProjectionField::Flex { path, alias, .. } => alias.as_deref().unwrap_or(path),
            ProjectionField::NestedReference(nested) => nested.output_key(),
        }
    }

    /// Source path, `None` for metadata
    pub fn path(&self) -> Option<&str> {
        match self {
            ProjectionField::Metadata { .. } => None,
            ProjectionField::Data { path, .. }
            | ProjectionField::Reference { path, .. }
            | ProjectionField::Flex { path, .. } => Some(path),
            ProjectionField::NestedReference(nested) => Some(&nested.path),
        }
    }
}

/// Correlated sub-select over a relationship field
#[derive(Debug, Clone, PartialEq)]
pub struct NestedReference {
    pub path: String,
    /// Thing on the other side of `path`
    pub thing: String,
    pub projection: Vec<ProjectionField>,
    pub ids: Option<Vec<String>>,
    pub filter: Option<Filter>,
    pub alias: Option<String>,
    pub cardinality: Cardinality,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sort: Vec<SortSpec>,
    pub tunnel: Option<String>,
}

impl NestedReference {
    pub fn output_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.path)
    }
}

/// Scalar comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    ContainsNot,
}

impl ScalarOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarOp::Eq => "=",
            ScalarOp::Ne => "!=",
            ScalarOp::Gt => ">",
            ScalarOp::Lt => "<",
            ScalarOp::Gte => ">=",
            ScalarOp::Lte => "<=",
            ScalarOp::Contains => "CONTAINS",
            ScalarOp::ContainsNot => "CONTAINSNOT",
        }
    }
}

/// Operators taking a list on the right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    In,
    NotIn,
    ContainsAll,
    ContainsAny,
    ContainsNone,
}

impl ListOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOp::In => "IN",
            ListOp::NotIn => "NOT IN",
            ListOp::ContainsAll => "CONTAINSALL",
            ListOp::ContainsAny => "CONTAINSANY",
            ListOp::ContainsNone => "CONTAINSNONE",
        }
    }

    /// Single-value scalar equivalent
    pub fn scalar(&self) -> ScalarOp {
        match self {
            ListOp::In => ScalarOp::Eq,
            ListOp::NotIn => ScalarOp::Ne,
            ListOp::ContainsAll | ListOp::ContainsAny => ScalarOp::Contains,
            ListOp::ContainsNone => ScalarOp::ContainsNot,
        }
    }

    /// True for operators that can never match an empty right-hand side
    pub fn is_positive(&self) -> bool {
        matches!(self, ListOp::In | ListOp::ContainsAny)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOp {
    Is,
    IsNot,
}

impl NullOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            NullOp::Is => "IS NONE",
            NullOp::IsNot => "IS NOT NONE",
        }
    }
}

/// Recursive filter tree
///
/// `And(vec![])` is always true and `Falsy` is never true.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Scalar {
        op: ScalarOp,
        left: String,
        right: Value,
    },
    List {
        op: ListOp,
        left: String,
        right: Vec<Value>,
    },
    /// Pointer comparison against ids, optionally restricted to `thing` tables
    Ref {
        op: ListOp,
        left: String,
        right: Vec<String>,
        thing: Option<Vec<String>>,
        /// Role dereferenced through the intermediate relation
        tunnel: Option<String>,
    },
    Null {
        op: NullOp,
        left: String,
        tunnel: Option<String>,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// Some related record through `path` matches `filter`
    Nested {
        filter: Box<Filter>,
        path: String,
        cardinality: Cardinality,
        tunnel: Option<String>,
    },
    Falsy,
}

impl Filter {
    pub fn eq(left: impl Into<String>, right: Value) -> Self {
        Filter::Scalar {
            op: ScalarOp::Eq,
            left: left.into(),
            right,
        }
    }

    /// Always-true filter
    pub fn truthy() -> Self {
        Filter::And(Vec::new())
    }

    pub fn is_truthy(&self) -> bool {
        matches!(self, Filter::And(children) if children.is_empty())
    }

    /// Field the predicate tests, `None` for connectives
    pub fn left(&self) -> Option<&str> {
        match self {
            Filter::Scalar { left, .. }
            | Filter::List { left, .. }
            | Filter::Ref { left, .. }
            | Filter::Null { left, .. } => Some(left),
            Filter::Nested { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Top-level conjuncts
    pub fn conjuncts(&self) -> Vec<&Filter> {
        match self {
            Filter::And(children) => children.iter().collect(),
            other => vec![other],
        }
    }

    /// Joins filters with AND, unwrapping a single child
    pub fn all(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::And(filters)
        }
    }

    /// Joins filters with OR, unwrapping a single child
    pub fn any(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::Or(filters)
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Filter], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

fn write_path(f: &mut fmt::Formatter<'_>, path: &str, tunnel: &Option<String>) -> fmt::Result {
    match tunnel {
        Some(role) => write!(f, "{}.{}", path, role),
        None => write!(f, "{}", path),
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Scalar { op, left, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            Filter::List { op, left, right } => {
                write!(f, "{} {} {}", left, op.as_str(), Value::Array(right.clone()))
            }
            Filter::Ref {
                op,
                left,
                right,
                thing,
                tunnel,
            } => {
                write_path(f, left, tunnel)?;
                write!(f, " {} ", op.as_str())?;
                if let Some(things) = thing {
                    write!(f, "{}", things.join("|"))?;
                }
                write!(f, "[{}]", right.join(", "))
            }
            Filter::Null { op, left, tunnel } => {
                write_path(f, left, tunnel)?;
                write!(f, " {}", op.as_str())
            }
            Filter::And(children) if children.is_empty() => write!(f, "TRUE"),
            Filter::And(children) => write_joined(f, children, "AND"),
            Filter::Or(children) => write_joined(f, children, "OR"),
            Filter::Not(inner) => write!(f, "NOT {}", inner),
            Filter::Nested {
                filter,
                path,
                tunnel,
                ..
            } => {
                write!(f, "ANY ")?;
                write_path(f, path, tunnel)?;
                write!(f, " WHERE {}", filter)
            }
            Filter::Falsy => write!(f, "FALSE"),
        }
    }
}

/// Complete plan for one query level
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalQuery {
    /// Queried thing
    pub thing: String,
    pub source: DataSource,
    pub projection: Vec<ProjectionField>,
    pub filter: Option<Filter>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sort: Vec<SortSpec>,
    pub cardinality: Cardinality,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_display() {
        let filter = Filter::And(vec![
            Filter::eq("name", json!("Ann")),
            Filter::Or(vec![
                Filter::List {
                    op: ListOp::In,
                    left: "age".into(),
                    right: vec![json!(1), json!(2)],
                },
                Filter::Null {
                    op: NullOp::Is,
                    left: "email".into(),
                    tunnel: None,
                },
            ]),
            Filter::Not(Box::new(Filter::Ref {
                op: ListOp::ContainsAny,
                left: "accounts".into(),
                right: vec!["a1".into()],
                thing: Some(vec!["Account".into()]),
                tunnel: Some("account".into()),
            })),
        ]);
        assert_eq!(
            filter.to_string(),
            "(name = \"Ann\" AND (age IN [1,2] OR email IS NONE) AND NOT accounts.account CONTAINSANY Account[a1])"
        );
        assert_eq!(Filter::truthy().to_string(), "TRUE");
        assert_eq!(Filter::Falsy.to_string(), "FALSE");
    }

    #[test]
    fn test_list_op_scalar_equivalents() {
        assert_eq!(ListOp::In.scalar(), ScalarOp::Eq);
        assert_eq!(ListOp::NotIn.scalar(), ScalarOp::Ne);
        assert_eq!(ListOp::ContainsAny.scalar(), ScalarOp::Contains);
        assert_eq!(ListOp::ContainsNone.scalar(), ScalarOp::ContainsNot);
        assert!(ListOp::In.is_positive());
        assert!(!ListOp::ContainsAll.is_positive());
    }

    #[test]
    fn test_projection_output_keys() {
        let meta = ProjectionField::Metadata {
            field: MetaField::Id,
            alias: None,
        };
        let data = ProjectionField::Data {
            path: "id".into(),
            alias: Some("userId".into()),
        };
        assert_eq!(meta.output_key(), "$id");
        assert_eq!(meta.path(), None);
        assert_eq!(data.output_key(), "userId");
        assert_eq!(data.path(), Some("id"));
    }

    #[test]
    fn test_subquery_things_follow_inner_source() {
        let source = DataSource::SubQuery {
            source: Box::new(DataSource::TableScan {
                thing: vec!["UserTag".into()],
            }),
            opposite_path: "users".into(),
            filter: None,
            cardinality: Cardinality::Many,
        };
        assert_eq!(source.access_path(), "SUBQUERY");
        assert_eq!(source.things(), ["UserTag".to_string()]);
    }
}
