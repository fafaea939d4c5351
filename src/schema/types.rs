//! Schema type definitions
//!
//! The schema is produced by an external enrichment step (inheritance and
//! subtype resolution already applied) and is read-only for the compiler.
//!
//! Field kinds:
//! - constant: static value injected at assembly time
//! - computed: closure over the raw row, injected at assembly time
//! - data: stored scalar or list value
//! - ref: untyped pointer (REF) or pointer-or-value (FLEX)
//! - link: relationship field pointing at a relation, or through it at a role player
//! - role: relationship field on a relation pointing at its players

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Column holding the record key in the target database.
pub const ID_COLUMN: &str = "id";

/// Whether a field (or query) yields one value or many
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::One => "ONE",
            Cardinality::Many => "MANY",
        }
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Cardinality::Many)
    }
}

/// Entity or relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThingKind {
    Entity,
    Relation,
}

impl ThingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThingKind::Entity => "entity",
            ThingKind::Relation => "relation",
        }
    }
}

/// Index declared on a thing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IndexDef {
    /// Index over one field
    Single { field: String },
    /// Index over an ordered list of fields
    Composite { fields: Vec<String> },
}

impl IndexDef {
    /// Fields covered by this index, in index order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            IndexDef::Single { field } => vec![field.as_str()],
            IndexDef::Composite { fields } => fields.iter().map(String::as_str).collect(),
        }
    }
}

/// Content type of a data field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataContent {
    Id,
    Text,
    Email,
    Number,
    Boolean,
    Date,
    Json,
}

/// Content type of a ref field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefContent {
    /// Always a pointer
    Ref,
    /// A pointer or a plain value
    Flex,
}

/// The field on the other side of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Opposite {
    /// Thing holding the opposite field
    pub thing: String,
    /// Opposite field name
    pub path: String,
    /// Cardinality of the opposite field
    pub cardinality: Cardinality,
}

impl Opposite {
    pub fn new(thing: impl Into<String>, path: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            thing: thing.into(),
            path: path.into(),
            cardinality,
        }
    }
}

/// What a link field points at
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkTarget {
    /// The intermediate relation record itself
    Relation,
    /// The players of the named role on the intermediate relation
    Role(String),
}

/// Closure computing a field value from the raw row
#[derive(Clone)]
pub struct ComputedFn(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl ComputedFn {
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, row: &Value) -> Value {
        (self.0)(row)
    }
}

impl fmt::Debug for ComputedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ComputedFn(..)")
    }
}

/// Field kind with its kind-specific attributes
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FieldKind {
    Constant {
        value: Value,
    },
    #[serde(skip)]
    Computed(ComputedFn),
    Data {
        content_type: DataContent,
        cardinality: Cardinality,
        #[serde(default)]
        unique: bool,
    },
    Ref {
        content_type: RefContent,
        cardinality: Cardinality,
    },
    Link {
        cardinality: Cardinality,
        /// Intermediate relation
        relation: String,
        /// Role this thing plays in `relation`
        plays: String,
        target: LinkTarget,
        opposite: Opposite,
    },
    Role {
        cardinality: Cardinality,
        opposite: Opposite,
    },
}

impl FieldKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldKind::Constant { .. } => "constant",
            FieldKind::Computed(_) => "computed",
            FieldKind::Data { .. } => "data",
            FieldKind::Ref { .. } => "ref",
            FieldKind::Link { .. } => "link",
            FieldKind::Role { .. } => "role",
        }
    }

    /// Cardinality of stored fields; virtual fields have none
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self {
            FieldKind::Constant { .. } | FieldKind::Computed(_) => None,
            FieldKind::Data { cardinality, .. }
            | FieldKind::Ref { cardinality, .. }
            | FieldKind::Link { cardinality, .. }
            | FieldKind::Role { cardinality, .. } => Some(*cardinality),
        }
    }

    /// Opposite side of a link or role field
    pub fn opposite(&self) -> Option<&Opposite> {
        match self {
            FieldKind::Link { opposite, .. } | FieldKind::Role { opposite, .. } => Some(opposite),
            _ => None,
        }
    }

    /// Fields never stored nor queried
    pub fn is_virtual(&self) -> bool {
        matches!(self, FieldKind::Constant { .. } | FieldKind::Computed(_))
    }

    pub fn is_relational(&self) -> bool {
        matches!(self, FieldKind::Link { .. } | FieldKind::Role { .. })
    }
}

/// Named field
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Text data field
    pub fn data(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self::new(
            name,
            FieldKind::Data {
                content_type: DataContent::Text,
                cardinality,
                unique: false,
            },
        )
    }

    /// Unique text data field
    pub fn unique(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Data {
                content_type: DataContent::Text,
                cardinality: Cardinality::One,
                unique: true,
            },
        )
    }

    /// Id data field
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Data {
                content_type: DataContent::Id,
                cardinality: Cardinality::One,
                unique: true,
            },
        )
    }

    pub fn reference(name: impl Into<String>, content_type: RefContent, cardinality: Cardinality) -> Self {
        Self::new(
            name,
            FieldKind::Ref {
                content_type,
                cardinality,
            },
        )
    }

    pub fn constant(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, FieldKind::Constant { value })
    }

    pub fn computed(
        name: impl Into<String>,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, FieldKind::Computed(ComputedFn::new(f)))
    }

    /// Link pointing at the relation record itself
    pub fn link(
        name: impl Into<String>,
        cardinality: Cardinality,
        relation: impl Into<String>,
        plays: impl Into<String>,
        opposite: Opposite,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Link {
                cardinality,
                relation: relation.into(),
                plays: plays.into(),
                target: LinkTarget::Relation,
                opposite,
            },
        )
    }

    /// Link tunneling through a relation to the players of `target_role`
    pub fn tunnel(
        name: impl Into<String>,
        cardinality: Cardinality,
        relation: impl Into<String>,
        plays: impl Into<String>,
        target_role: impl Into<String>,
        opposite: Opposite,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Link {
                cardinality,
                relation: relation.into(),
                plays: plays.into(),
                target: LinkTarget::Role(target_role.into()),
                opposite,
            },
        )
    }

    pub fn role(name: impl Into<String>, cardinality: Cardinality, opposite: Opposite) -> Self {
        Self::new(
            name,
            FieldKind::Role {
                cardinality,
                opposite,
            },
        )
    }
}

/// Schema of one entity or relation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingSchema {
    /// Thing name, filled from the schema map key
    #[serde(default)]
    pub name: String,
    pub kind: ThingKind,
    #[serde(default)]
    pub id_fields: Vec<String>,
    /// Resolved (transitive) subtypes
    #[serde(default)]
    pub sub_types: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl ThingSchema {
    pub fn new(name: impl Into<String>, kind: ThingKind) -> Self {
        Self {
            name: name.into(),
            kind,
            id_fields: Vec::new(),
            sub_types: Vec::new(),
            indexes: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name, ThingKind::Entity)
    }

    pub fn relation(name: impl Into<String>) -> Self {
        Self::new(name, ThingKind::Relation)
    }

    /// Adds a field; id data fields are registered as id fields
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        if let FieldKind::Data {
            content_type: DataContent::Id,
            ..
        } = field.kind
        {
            self.id_fields.push(field.name.clone());
        }
        self.fields.push(field);
        self
    }

    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_types.push(sub_type.into());
        self
    }

    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_id_field(&self, name: &str) -> bool {
        self.id_fields.iter().any(|f| f == name)
    }

    /// This thing followed by its subtypes
    pub fn variants(&self) -> Vec<String> {
        std::iter::once(self.name.clone())
            .chain(self.sub_types.iter().cloned())
            .collect()
    }

    /// Returns true if the field (or the id column) can serve a lookup.
    ///
    /// Every link and role field counts as indexed.
    pub fn is_indexed(&self, path: &str) -> bool {
        if path == ID_COLUMN || self.is_id_field(path) {
            return true;
        }
        if self.field(path).is_some_and(|f| f.kind.is_relational()) {
            return true;
        }
        self.indexes.iter().any(|idx| match idx {
            IndexDef::Single { field } => field == path,
            IndexDef::Composite { fields } => fields.first().is_some_and(|f| f == path),
        })
    }

    /// Composite indexes, longest first, declaration order among equals
    pub fn composite_indexes(&self) -> Vec<&[String]> {
        let mut composites: Vec<&[String]> = self
            .indexes
            .iter()
            .filter_map(|idx| match idx {
                IndexDef::Composite { fields } => Some(fields.as_slice()),
                IndexDef::Single { .. } => None,
            })
            .collect();
        composites.sort_by(|a, b| b.len().cmp(&a.len()));
        composites
    }
}

/// Complete schema: thing name to thing schema
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "BTreeMap<String, ThingSchema>")]
pub struct Schema {
    things: BTreeMap<String, ThingSchema>,
}

impl From<BTreeMap<String, ThingSchema>> for Schema {
    fn from(things: BTreeMap<String, ThingSchema>) -> Self {
        let things = things
            .into_iter()
            .map(|(name, mut thing)| {
                thing.name = name.clone();
                if thing.id_fields.is_empty() {
                    thing.id_fields = thing
                        .fields
                        .iter()
                        .filter(|f| {
                            matches!(
                                f.kind,
                                FieldKind::Data {
                                    content_type: DataContent::Id,
                                    ..
                                }
                            )
                        })
                        .map(|f| f.name.clone())
                        .collect();
                }
                (name, thing)
            })
            .collect();
        Self { things }
    }
}

impl Schema {
    pub fn new(things: impl IntoIterator<Item = ThingSchema>) -> Self {
        Self {
            things: things.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn thing(&self, name: &str) -> Option<&ThingSchema> {
        self.things.get(name)
    }

    pub fn things(&self) -> impl Iterator<Item = &ThingSchema> {
        self.things.values()
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    /// Role on the intermediate relation that a tunnel link dereferences
    pub fn tunnel_role(&self, field: &FieldSchema) -> Option<String> {
        match &field.kind {
            FieldKind::Link {
                target: LinkTarget::Role(role),
                ..
            } => Some(role.clone()),
            _ => None,
        }
    }

    /// Returns true if a filter on `field` may be answered by scanning the
    /// opposite thing and projecting its opposite field back.
    ///
    /// Holds for links targeting the relation itself and for roles whose
    /// opposite is such a link; tunnel links are excluded.
    pub fn is_traversable(&self, field: &FieldSchema) -> bool {
        match &field.kind {
            FieldKind::Link {
                target: LinkTarget::Relation,
                opposite,
                ..
            } => self
                .opposite_field(opposite)
                .is_some_and(|f| matches!(f.kind, FieldKind::Role { .. })),
            FieldKind::Role { opposite, .. } => self.opposite_field(opposite).is_some_and(|f| {
                matches!(
                    f.kind,
                    FieldKind::Link {
                        target: LinkTarget::Relation,
                        ..
                    }
                )
            }),
            _ => false,
        }
    }

    pub fn opposite_field(&self, opposite: &Opposite) -> Option<&FieldSchema> {
        self.thing(&opposite.thing)?.field(&opposite.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variants_include_subtypes() {
        let thing = ThingSchema::entity("User").with_sub_type("God").with_sub_type("SuperUser");
        assert_eq!(thing.variants(), vec!["User", "God", "SuperUser"]);
    }

    #[test]
    fn test_id_field_registration() {
        let thing = ThingSchema::entity("User")
            .with_field(FieldSchema::id("id"))
            .with_field(FieldSchema::data("name", Cardinality::One));
        assert!(thing.is_id_field("id"));
        assert!(!thing.is_id_field("name"));
        assert!(thing.is_indexed("id"));
        assert!(!thing.is_indexed("name"));
    }

    #[test]
    fn test_composite_indexes_longest_first() {
        let thing = ThingSchema::entity("User")
            .with_index(IndexDef::Composite {
                fields: vec!["a".into(), "b".into()],
            })
            .with_index(IndexDef::Single { field: "c".into() })
            .with_index(IndexDef::Composite {
                fields: vec!["a".into(), "b".into(), "d".into()],
            });
        let composites = thing.composite_indexes();
        assert_eq!(composites.len(), 2);
        assert_eq!(composites[0].len(), 3);
    }

    #[test]
    fn test_field_kind_deserialize() {
        let field: FieldSchema = serde_json::from_value(json!({
            "name": "accounts",
            "kind": "link",
            "cardinality": "MANY",
            "relation": "UserAccount",
            "plays": "user",
            "target": { "role": "account" },
            "opposite": { "thing": "Account", "path": "users", "cardinality": "MANY" }
        }))
        .unwrap();
        match field.kind {
            FieldKind::Link { target, .. } => assert_eq!(target, LinkTarget::Role("account".into())),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_schema_fills_thing_names() {
        let schema: Schema = serde_json::from_value(json!({
            "User": { "kind": "entity", "fields": [
                { "name": "id", "kind": "data", "contentType": "ID", "cardinality": "ONE", "unique": true }
            ]}
        }))
        .unwrap();
        assert_eq!(schema.thing("User").unwrap().name, "User");
    }

    #[test]
    fn test_computed_field_call() {
        let field = FieldSchema::computed("greeting", |row| json!(format!("hi {}", row["name"].as_str().unwrap_or(""))));
        match field.kind {
            FieldKind::Computed(f) => assert_eq!(f.call(&json!({"name": "Ann"})), json!("hi Ann")),
            _ => panic!("expected computed"),
        }
    }
}
