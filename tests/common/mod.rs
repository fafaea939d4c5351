//! Shared fixtures for integration tests

#![allow(dead_code)]

use bqlc::executor::MemoryStore;
use bqlc::schema::{Schema, SchemaLoader};
use serde_json::json;

/// User (with subtype God) linked to UserTag through the `tag` link
pub const SCHEMA: &str = r#"{
    "User": {
        "kind": "entity",
        "subTypes": ["God"],
        "indexes": [
            { "type": "single", "field": "email" },
            { "type": "composite", "fields": ["name", "age"] }
        ],
        "fields": [
            { "name": "id", "kind": "data", "contentType": "ID", "cardinality": "ONE", "unique": true },
            { "name": "name", "kind": "data", "contentType": "TEXT", "cardinality": "ONE" },
            { "name": "nickname", "kind": "data", "contentType": "TEXT", "cardinality": "ONE" },
            { "name": "email", "kind": "data", "contentType": "EMAIL", "cardinality": "ONE", "unique": true },
            { "name": "age", "kind": "data", "contentType": "NUMBER", "cardinality": "ONE" },
            { "name": "tag", "kind": "link", "cardinality": "MANY", "relation": "UserTag",
              "plays": "users", "target": "relation",
              "opposite": { "thing": "UserTag", "path": "users", "cardinality": "MANY" } }
        ]
    },
    "God": {
        "kind": "entity",
        "fields": [
            { "name": "id", "kind": "data", "contentType": "ID", "cardinality": "ONE", "unique": true },
            { "name": "name", "kind": "data", "contentType": "TEXT", "cardinality": "ONE" },
            { "name": "nickname", "kind": "data", "contentType": "TEXT", "cardinality": "ONE" },
            { "name": "email", "kind": "data", "contentType": "EMAIL", "cardinality": "ONE", "unique": true },
            { "name": "age", "kind": "data", "contentType": "NUMBER", "cardinality": "ONE" },
            { "name": "tag", "kind": "link", "cardinality": "MANY", "relation": "UserTag",
              "plays": "users", "target": "relation",
              "opposite": { "thing": "UserTag", "path": "users", "cardinality": "MANY" } },
            { "name": "power", "kind": "data", "contentType": "TEXT", "cardinality": "ONE" }
        ]
    },
    "UserTag": {
        "kind": "relation",
        "fields": [
            { "name": "id", "kind": "data", "contentType": "ID", "cardinality": "ONE", "unique": true },
            { "name": "name", "kind": "data", "contentType": "TEXT", "cardinality": "ONE" },
            { "name": "users", "kind": "role", "cardinality": "MANY",
              "opposite": { "thing": "User", "path": "tag", "cardinality": "MANY" } }
        ]
    }
}"#;

pub fn schema() -> Schema {
    match SchemaLoader::from_json_str(SCHEMA) {
        Ok(schema) => schema,
        Err(e) => panic!("fixture schema rejected: {}", e),
    }
}

pub const USER_IDS: [&str; 4] = ["u1", "u2", "u3", "u4"];
pub const GOD_IDS: [&str; 1] = ["g1"];
pub const EMAILS: [&str; 3] = ["ann@x.io", "bob@x.io", "ann2@x.io"];
pub const TAG_IDS: [&str; 3] = ["t1", "t2", "t3"];
pub const NAMES: [&str; 3] = ["Ann", "Bob", "Cid"];

/// Users, one god and tags with consistent links in both directions
pub fn store() -> MemoryStore {
    MemoryStore::new()
        .with_record(
            "User",
            json!({ "id": "u1", "name": "Ann", "nickname": "a", "email": "ann@x.io", "age": 30,
                    "tag": ["UserTag:t1"] }),
        )
        .with_record(
            "User",
            json!({ "id": "u2", "name": "Bob", "nickname": "b", "email": "bob@x.io", "age": 20,
                    "tag": ["UserTag:t1", "UserTag:t2"] }),
        )
        .with_record(
            "User",
            json!({ "id": "u3", "name": "Cid", "age": 40, "tag": [] }),
        )
        .with_record(
            "User",
            json!({ "id": "u4", "name": "Ann", "nickname": "b", "email": "ann2@x.io", "age": 20,
                    "tag": ["UserTag:t3"] }),
        )
        .with_record(
            "God",
            json!({ "id": "g1", "name": "Zeus", "age": 999, "power": "thunder",
                    "tag": ["UserTag:t2"] }),
        )
        .with_record(
            "UserTag",
            json!({ "id": "t1", "name": "admin", "users": ["User:u1", "User:u2"] }),
        )
        .with_record(
            "UserTag",
            json!({ "id": "t2", "name": "dev", "users": ["User:u2", "God:g1"] }),
        )
        .with_record(
            "UserTag",
            json!({ "id": "t3", "name": "ops", "users": ["User:u4"] }),
        )
}
