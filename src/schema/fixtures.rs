//! Shared schema for unit tests

use serde_json::{json, Value};

use super::types::{
    Cardinality, DataContent, FieldKind, FieldSchema, IndexDef, Opposite, RefContent, Schema,
    ThingSchema,
};

fn number(name: &str) -> FieldSchema {
    FieldSchema::new(
        name,
        FieldKind::Data {
            content_type: DataContent::Number,
            cardinality: Cardinality::One,
            unique: false,
        },
    )
}

fn user_like(name: &str) -> ThingSchema {
    ThingSchema::entity(name)
        .with_field(FieldSchema::id("id"))
        .with_field(FieldSchema::data("name", Cardinality::One))
        .with_field(FieldSchema::unique("email"))
        .with_field(number("age"))
        .with_field(FieldSchema::data("tags", Cardinality::Many))
        .with_field(FieldSchema::reference("favorite", RefContent::Ref, Cardinality::One))
        .with_field(FieldSchema::reference("payload", RefContent::Flex, Cardinality::Many))
        .with_field(FieldSchema::link(
            "user-tags",
            Cardinality::Many,
            "UserTag",
            "users",
            Opposite::new("UserTag", "users", Cardinality::Many),
        ))
        .with_field(FieldSchema::tunnel(
            "accounts",
            Cardinality::Many,
            "UserAccount",
            "user",
            "account",
            Opposite::new("Account", "users", Cardinality::Many),
        ))
        .with_field(FieldSchema::constant("isHuman", json!(true)))
        .with_field(FieldSchema::computed("greeting", |row: &Value| {
            json!(format!("Hello {}", row["name"].as_str().unwrap_or_default()))
        }))
        .with_index(IndexDef::Single {
            field: "email".into(),
        })
        .with_index(IndexDef::Composite {
            fields: vec!["name".into(), "age".into()],
        })
}

pub(crate) fn schema() -> Schema {
    Schema::new([
        user_like("User").with_sub_type("God"),
        user_like("God").with_field(FieldSchema::data("power", Cardinality::One)),
        ThingSchema::entity("Account")
            .with_field(FieldSchema::id("id"))
            .with_field(FieldSchema::data("provider", Cardinality::One))
            .with_field(FieldSchema::tunnel(
                "users",
                Cardinality::Many,
                "UserAccount",
                "account",
                "user",
                Opposite::new("User", "accounts", Cardinality::Many),
            )),
        ThingSchema::relation("UserAccount")
            .with_field(FieldSchema::id("id"))
            .with_field(FieldSchema::role(
                "user",
                Cardinality::One,
                Opposite::new("User", "accounts", Cardinality::Many),
            ))
            .with_field(FieldSchema::role(
                "account",
                Cardinality::One,
                Opposite::new("Account", "users", Cardinality::Many),
            )),
        ThingSchema::relation("UserTag")
            .with_field(FieldSchema::id("id"))
            .with_field(FieldSchema::data("name", Cardinality::One))
            .with_field(FieldSchema::role(
                "users",
                Cardinality::Many,
                Opposite::new("User", "user-tags", Cardinality::Many),
            ))
            .with_field(FieldSchema::link(
                "group",
                Cardinality::One,
                "UserTagGroup",
                "tags",
                Opposite::new("UserTagGroup", "tags", Cardinality::Many),
            )),
        ThingSchema::relation("UserTagGroup")
            .with_field(FieldSchema::id("id"))
            .with_field(FieldSchema::data("color", Cardinality::One))
            .with_field(FieldSchema::role(
                "tags",
                Cardinality::Many,
                Opposite::new("UserTag", "group", Cardinality::One),
            )),
    ])
}
