//! Projection rendering

use serde_json::Value;

use super::filter::render_condition;
use super::ident::{escape_ident, escape_path};
use super::params::ParamBag;
use super::{tail, take_first};
use crate::planner::{MetaField, NestedReference, ProjectionField};
use crate::schema::{Cardinality, ID_COLUMN};

/// Renders a projection list, `*` when empty
pub fn render_projection(fields: &[ProjectionField], params: &mut ParamBag) -> String {
    if fields.is_empty() {
        return "*".to_string();
    }
    fields
        .iter()
        .map(|f| render_field(f, params))
        .collect::<Vec<_>>()
        .join(", ")
}

fn collapse(expr: String, cardinality: Cardinality) -> String {
    if cardinality.is_many() {
        expr
    } else {
        take_first(&expr)
    }
}

fn render_field(field: &ProjectionField, params: &mut ParamBag) -> String {
    let key = escape_ident(field.output_key());
    match field {
        ProjectionField::Metadata {
            field: MetaField::Thing,
            ..
        } => format!("meta::tb(id) AS {}", key),
        ProjectionField::Metadata {
            field: MetaField::Id,
            ..
        } => format!("meta::id(id) AS {}", key),
        ProjectionField::Data { path, .. } if path == ID_COLUMN => {
            format!("meta::id(id) AS {}", key)
        }
        ProjectionField::Data { path, alias: None } => escape_ident(path),
        ProjectionField::Data { path, .. } => format!("{} AS {}", escape_ident(path), key),
        ProjectionField::Reference {
            path,
            cardinality,
            tunnel,
            ..
        } => {
            let select = format!(
                "(SELECT VALUE meta::id(id) FROM $parent.{})",
                escape_path(path, tunnel.as_deref())
            );
            format!("{} AS {}", collapse(select, *cardinality), key)
        }
        ProjectionField::NestedReference(nested) => {
            let select = render_nested(nested, params);
            format!("{} AS {}", collapse(select, nested.cardinality), key)
        }
        ProjectionField::Flex {
            path, cardinality, ..
        } => {
            let path = escape_ident(path);
            if cardinality.is_many() {
                format!(
                    "array::map({}, |$v| IF type::is::record($v) THEN meta::id($v) ELSE $v END) AS {}",
                    path, key
                )
            } else {
                format!(
                    "(IF type::is::record({p}) THEN meta::id({p}) ELSE {p} END) AS {k}",
                    p = path,
                    k = key
                )
            }
        }
    }
}

/// Correlated sub-select over the related records of the current row
fn render_nested(nested: &NestedReference, params: &mut ParamBag) -> String {
    let mut select = format!(
        "(SELECT {} FROM $parent.{}",
        render_projection(&nested.projection, params),
        escape_path(&nested.path, nested.tunnel.as_deref())
    );

    let mut conditions = Vec::new();
    if let Some(ids) = &nested.ids {
        let bound = params.bind(Value::Array(ids.iter().cloned().map(Value::String).collect()));
        conditions.push(format!("meta::id(id) IN {}", bound));
    }
    if let Some(filter) = &nested.filter {
        conditions.push(render_condition(filter, params));
    }
    if !conditions.is_empty() {
        select.push_str(" WHERE ");
        select.push_str(&conditions.join(" AND "));
    }

    select.push_str(&tail(&nested.sort, &nested.projection, nested.limit, nested.offset));
    select.push(')');
    select
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{Filter, SortSpec};
    use serde_json::json;

    #[test]
    fn test_metadata_and_data_columns() {
        let mut bag = ParamBag::new();
        let fields = vec![
            ProjectionField::Metadata {
                field: MetaField::Thing,
                alias: None,
            },
            ProjectionField::Metadata {
                field: MetaField::Id,
                alias: None,
            },
            ProjectionField::Data {
                path: ID_COLUMN.into(),
                alias: Some("key".into()),
            },
            ProjectionField::Data {
                path: "name".into(),
                alias: None,
            },
            ProjectionField::Data {
                path: "e-mail".into(),
                alias: Some("email".into()),
            },
        ];
        assert_eq!(
            render_projection(&fields, &mut bag),
            "meta::tb(id) AS ⟨$thing⟩, meta::id(id) AS ⟨$id⟩, meta::id(id) AS key, name, ⟨e-mail⟩ AS email"
        );
    }

    #[test]
    fn test_reference_collapses_for_one() {
        let mut bag = ParamBag::new();
        let fields = vec![
            ProjectionField::Reference {
                path: "group".into(),
                alias: None,
                cardinality: Cardinality::One,
                tunnel: None,
            },
            ProjectionField::Reference {
                path: "accounts".into(),
                alias: None,
                cardinality: Cardinality::Many,
                tunnel: Some("account".into()),
            },
        ];
        assert_eq!(
            render_projection(&fields, &mut bag),
            "array::first((SELECT VALUE meta::id(id) FROM $parent.group)) AS group, \
             (SELECT VALUE meta::id(id) FROM $parent.accounts.account) AS accounts"
        );
    }

    #[test]
    fn test_flex_dereferences_pointers_only() {
        let mut bag = ParamBag::new();
        let one = ProjectionField::Flex {
            path: "payload".into(),
            alias: None,
            cardinality: Cardinality::One,
        };
        assert_eq!(
            render_projection(&[one], &mut bag),
            "(IF type::is::record(payload) THEN meta::id(payload) ELSE payload END) AS payload"
        );
        let many = ProjectionField::Flex {
            path: "payload".into(),
            alias: None,
            cardinality: Cardinality::Many,
        };
        assert!(render_projection(&[many], &mut bag).starts_with("array::map(payload, |$v|"));
    }

    #[test]
    fn test_nested_reference_subselect() {
        let mut bag = ParamBag::new();
        let nested = NestedReference {
            path: "user-tags".into(),
            thing: "UserTag".into(),
            projection: vec![ProjectionField::Data {
                path: "name".into(),
                alias: None,
            }],
            ids: Some(vec!["t1".into()]),
            filter: Some(Filter::eq("name", json!("admin"))),
            alias: Some("tags".into()),
            cardinality: Cardinality::Many,
            limit: Some(2),
            offset: None,
            sort: vec![SortSpec::desc("name")],
            tunnel: None,
        };
        assert_eq!(
            render_projection(&[ProjectionField::NestedReference(Box::new(nested))], &mut bag),
            "(SELECT name FROM $parent.⟨user-tags⟩ WHERE meta::id(id) IN $p0 AND name = $p1 \
             ORDER BY name DESC LIMIT 2) AS tags"
        );
        assert_eq!(bag.get("p0"), Some(&json!(["t1"])));
    }
}
