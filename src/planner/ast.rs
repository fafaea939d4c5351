//! Declarative BQL query structures
//!
//! The shape arrives already validated by an external parser; these types
//! mirror the JSON form (`$thing`, `$id`, `$filter`, `$fields`, ...).

use serde::Deserialize;
use serde_json::Value;

use super::errors::{PlannerError, PlannerResult};

/// `$id`: a single id or a list of ids
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum IdSelector {
    One(String),
    Many(Vec<String>),
}

impl IdSelector {
    pub fn ids(&self) -> Vec<String> {
        match self {
            IdSelector::One(id) => vec![id.clone()],
            IdSelector::Many(ids) => ids.clone(),
        }
    }

    /// Returns the id if exactly one was given as a single value
    pub fn single(&self) -> Option<&str> {
        match self {
            IdSelector::One(id) => Some(id),
            IdSelector::Many(_) => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field path or alias to sort by
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// `$sort` entry: a bare field or `{ "field": .., "desc": .. }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SortItem {
    Field(String),
    Spec {
        field: String,
        #[serde(default)]
        desc: bool,
    },
}

impl SortItem {
    pub fn to_spec(&self) -> SortSpec {
        match self {
            SortItem::Field(field) => SortSpec::asc(field.clone()),
            SortItem::Spec { field, desc: true } => SortSpec::desc(field.clone()),
            SortItem::Spec { field, desc: false } => SortSpec::asc(field.clone()),
        }
    }
}

/// Options shared by root queries and nested field selections
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryBody {
    #[serde(rename = "$id", default)]
    pub id: Option<IdSelector>,
    #[serde(rename = "$filter", default)]
    pub filter: Option<Value>,
    #[serde(rename = "$fields", default)]
    pub fields: Option<Vec<FieldSelector>>,
    #[serde(rename = "$excludedFields", default)]
    pub excluded_fields: Vec<String>,
    /// Kept untyped so negative or non-numeric values can be reported
    #[serde(rename = "$limit", default)]
    pub limit: Option<Value>,
    #[serde(rename = "$offset", default)]
    pub offset: Option<Value>,
    #[serde(rename = "$sort", default)]
    pub sort: Vec<SortItem>,
}

/// One `$fields` entry
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldSelector {
    Path(String),
    Nested(Box<NestedField>),
}

impl FieldSelector {
    pub fn path(path: impl Into<String>) -> Self {
        FieldSelector::Path(path.into())
    }

    pub fn nested(field: NestedField) -> Self {
        FieldSelector::Nested(Box::new(field))
    }

    /// Schema field this entry selects
    pub fn field_path(&self) -> &str {
        match self {
            FieldSelector::Path(path) => path,
            FieldSelector::Nested(nested) => &nested.path,
        }
    }

    /// Key of this entry in the response object
    pub fn output_key(&self) -> &str {
        match self {
            FieldSelector::Path(path) => path,
            FieldSelector::Nested(nested) => nested.alias.as_deref().unwrap_or(&nested.path),
        }
    }
}

/// Nested selection on a relationship field
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NestedField {
    #[serde(rename = "$path")]
    pub path: String,
    #[serde(rename = "$as", default)]
    pub alias: Option<String>,
    #[serde(flatten)]
    pub body: QueryBody,
}

impl NestedField {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
            body: QueryBody::default(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldSelector>) -> Self {
        self.body.fields = Some(fields);
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.body.filter = Some(filter);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.body.id = Some(IdSelector::One(id.into()));
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.body.limit = Some(Value::from(limit));
        self
    }

    pub fn with_sort(mut self, sort: SortItem) -> Self {
        self.body.sort.push(sort);
        self
    }
}

/// Root declarative query
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Query {
    #[serde(rename = "$thing")]
    pub thing: String,
    #[serde(flatten)]
    pub body: QueryBody,
}

impl Query {
    pub fn new(thing: impl Into<String>) -> Self {
        Self {
            thing: thing.into(),
            body: QueryBody::default(),
        }
    }

    /// Decodes a query from its JSON form
    pub fn from_value(value: Value) -> PlannerResult<Self> {
        serde_json::from_value(value).map_err(|e| PlannerError::query_invalid(e.to_string()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.body.id = Some(IdSelector::One(id.into()));
        self
    }

    pub fn with_ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.body.id = Some(IdSelector::Many(ids.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.body.filter = Some(filter);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldSelector>) -> Self {
        self.body.fields = Some(fields);
        self
    }

    pub fn with_excluded_fields(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.body.excluded_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.body.limit = Some(Value::from(limit));
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.body.offset = Some(Value::from(offset));
        self
    }

    pub fn with_sort(mut self, sort: SortItem) -> Self {
        self.body.sort.push(sort);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_from_json() {
        let query = Query::from_value(json!({
            "$thing": "User",
            "$id": "u1",
            "$fields": ["name", { "$path": "user-tags", "$as": "tags", "$fields": ["id"] }],
            "$sort": ["name", { "field": "email", "desc": true }],
            "$limit": 10
        }))
        .unwrap();

        assert_eq!(query.thing, "User");
        assert_eq!(query.body.id, Some(IdSelector::One("u1".into())));
        let fields = query.body.fields.unwrap();
        assert_eq!(fields[0], FieldSelector::path("name"));
        assert_eq!(fields[1].field_path(), "user-tags");
        assert_eq!(fields[1].output_key(), "tags");
        assert_eq!(query.body.sort[1].to_spec(), SortSpec::desc("email"));
        assert_eq!(query.body.limit, Some(json!(10)));
    }

    #[test]
    fn test_id_selector_forms() {
        let one: IdSelector = serde_json::from_value(json!("u1")).unwrap();
        let many: IdSelector = serde_json::from_value(json!(["u1", "u2"])).unwrap();
        assert_eq!(one.single(), Some("u1"));
        assert_eq!(many.single(), None);
        assert_eq!(many.ids().len(), 2);
    }

    #[test]
    fn test_missing_thing_rejected() {
        let err = Query::from_value(json!({ "$id": "u1" })).unwrap_err();
        assert_eq!(err.code().code(), "BQL_INVALID_QUERY");
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new("User")
            .with_ids(["u1", "u2"])
            .with_limit(5)
            .with_sort(SortItem::Field("name".into()));
        assert_eq!(query.body.limit, Some(json!(5)));
        assert_eq!(query.body.sort.len(), 1);
    }
}
