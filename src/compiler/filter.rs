//! Filter rendering
//!
//! Every literal on the right-hand side is bound into the parameter bag.
//! Only identifiers, operators and placeholders reach the query text.

use serde_json::Value;

use super::ident::{escape_ident, escape_path};
use super::params::ParamBag;
use crate::planner::{Filter, ListOp};
use crate::schema::ID_COLUMN;

/// Left-hand column expression
fn column(left: &str) -> String {
    if left == ID_COLUMN {
        "meta::id(id)".to_string()
    } else {
        escape_ident(left)
    }
}

/// One bound `type::thing(table, id)` pointer per (table, id)
pub(super) fn pointers(things: &[String], ids: &[String], params: &mut ParamBag) -> Vec<String> {
    let mut out = Vec::with_capacity(things.len() * ids.len());
    for thing in things {
        for id in ids {
            let table = params.bind(Value::String(thing.clone()));
            let key = params.bind(Value::String(id.clone()));
            out.push(format!("type::thing({}, {})", table, key));
        }
    }
    out
}

fn render_ref(
    op: ListOp,
    left: &str,
    right: &[String],
    thing: Option<&[String]>,
    tunnel: Option<&str>,
    params: &mut ParamBag,
) -> String {
    let target = escape_path(left, tunnel);
    match thing {
        Some(things) => format!(
            "{} {} [{}]",
            target,
            op.as_str(),
            pointers(things, right, params).join(", ")
        ),
        None => {
            let ids = params.bind(Value::Array(
                right.iter().cloned().map(Value::String).collect(),
            ));
            match op {
                ListOp::In | ListOp::NotIn => format!("meta::id({}) {} {}", target, op.as_str(), ids),
                _ => format!(
                    "array::map({}, |$v| meta::id($v)) {} {}",
                    target,
                    op.as_str(),
                    ids
                ),
            }
        }
    }
}

fn join(children: &[Filter], sep: &str, params: &mut ParamBag) -> String {
    let rendered: Vec<String> = children.iter().map(|c| render_filter(c, params)).collect();
    format!("({})", rendered.join(sep))
}

/// Renders a filter expression
pub fn render_filter(filter: &Filter, params: &mut ParamBag) -> String {
    match filter {
        Filter::Scalar { op, left, right } => {
            format!("{} {} {}", column(left), op.as_str(), params.bind(right.clone()))
        }
        Filter::List { op, left, right } => format!(
            "{} {} {}",
            column(left),
            op.as_str(),
            params.bind(Value::Array(right.clone()))
        ),
        Filter::Ref {
            op,
            left,
            right,
            thing,
            tunnel,
        } => render_ref(*op, left, right, thing.as_deref(), tunnel.as_deref(), params),
        Filter::Null { op, left, tunnel } => {
            format!("{} {}", escape_path(left, tunnel.as_deref()), op.as_str())
        }
        Filter::And(children) if children.is_empty() => "true".to_string(),
        Filter::And(children) => join(children, " AND ", params),
        Filter::Or(children) => join(children, " OR ", params),
        Filter::Not(inner) => format!("!({})", render_filter(inner, params)),
        Filter::Nested {
            filter,
            path,
            cardinality,
            tunnel,
        } => {
            let target = escape_path(path, tunnel.as_deref());
            let inner = render_filter(filter, params);
            if cardinality.is_many() {
                format!("array::len({}[WHERE {}]) > 0", target, inner)
            } else {
                format!("array::len([{}][WHERE {}]) > 0", target, inner)
            }
        }
        Filter::Falsy => "false".to_string(),
    }
}

/// Renders a WHERE condition, top-level conjuncts unparenthesized
pub fn render_condition(filter: &Filter, params: &mut ParamBag) -> String {
    match filter {
        Filter::And(children) if !children.is_empty() => children
            .iter()
            .map(|c| render_filter(c, params))
            .collect::<Vec<_>>()
            .join(" AND "),
        other => render_filter(other, params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{NullOp, ScalarOp};
    use crate::schema::Cardinality;
    use serde_json::json;

    #[test]
    fn test_scalar_binds_right_side() {
        let mut bag = ParamBag::new();
        let text = render_filter(&Filter::eq("name", json!("Ann")), &mut bag);
        assert_eq!(text, "name = $p0");
        assert_eq!(bag.get("p0"), Some(&json!("Ann")));
    }

    #[test]
    fn test_id_column_uses_record_id() {
        let mut bag = ParamBag::new();
        let filter = Filter::List {
            op: ListOp::In,
            left: ID_COLUMN.into(),
            right: vec![json!("u1"), json!("u2")],
        };
        assert_eq!(render_filter(&filter, &mut bag), "meta::id(id) IN $p0");
        assert_eq!(bag.get("p0"), Some(&json!(["u1", "u2"])));
    }

    #[test]
    fn test_ref_with_things_renders_pointers() {
        let mut bag = ParamBag::new();
        let filter = Filter::Ref {
            op: ListOp::ContainsAny,
            left: "accounts".into(),
            right: vec!["a1".into()],
            thing: Some(vec!["Account".into()]),
            tunnel: Some("account".into()),
        };
        assert_eq!(
            render_filter(&filter, &mut bag),
            "accounts.account CONTAINSANY [type::thing($p0, $p1)]"
        );
        assert_eq!(bag.get("p0"), Some(&json!("Account")));
        assert_eq!(bag.get("p1"), Some(&json!("a1")));
    }

    #[test]
    fn test_ref_without_things_compares_ids() {
        let mut bag = ParamBag::new();
        let one = Filter::Ref {
            op: ListOp::In,
            left: "favorite".into(),
            right: vec!["u2".into()],
            thing: None,
            tunnel: None,
        };
        assert_eq!(render_filter(&one, &mut bag), "meta::id(favorite) IN $p0");

        let many = Filter::Ref {
            op: ListOp::ContainsAny,
            left: "friends".into(),
            right: vec!["u2".into()],
            thing: None,
            tunnel: None,
        };
        assert_eq!(
            render_filter(&many, &mut bag),
            "array::map(friends, |$v| meta::id($v)) CONTAINSANY $p1"
        );
    }

    #[test]
    fn test_connectives() {
        let mut bag = ParamBag::new();
        let filter = Filter::Or(vec![
            Filter::Not(Box::new(Filter::Scalar {
                op: ScalarOp::Gt,
                left: "age".into(),
                right: json!(3),
            })),
            Filter::Null {
                op: NullOp::Is,
                left: "email".into(),
                tunnel: None,
            },
        ]);
        assert_eq!(render_filter(&filter, &mut bag), "(!(age > $p0) OR email IS NONE)");
        assert_eq!(render_filter(&Filter::Falsy, &mut bag), "false");
        assert_eq!(render_filter(&Filter::truthy(), &mut bag), "true");
    }

    #[test]
    fn test_nested_filter_uses_array_where() {
        let mut bag = ParamBag::new();
        let many = Filter::Nested {
            filter: Box::new(Filter::eq("name", json!("admin"))),
            path: "user-tags".into(),
            cardinality: Cardinality::Many,
            tunnel: None,
        };
        assert_eq!(
            render_filter(&many, &mut bag),
            "array::len(⟨user-tags⟩[WHERE name = $p0]) > 0"
        );
        let one = Filter::Nested {
            filter: Box::new(Filter::eq("name", json!("g"))),
            path: "group".into(),
            cardinality: Cardinality::One,
            tunnel: None,
        };
        assert_eq!(
            render_filter(&one, &mut bag),
            "array::len([group][WHERE name = $p1]) > 0"
        );
    }

    #[test]
    fn test_condition_drops_outer_parentheses() {
        let mut bag = ParamBag::new();
        let filter = Filter::And(vec![Filter::eq("a", json!(1)), Filter::eq("b", json!(2))]);
        assert_eq!(render_condition(&filter, &mut bag), "a = $p0 AND b = $p1");
    }
}
