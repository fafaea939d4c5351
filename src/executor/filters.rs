//! Filter evaluation for the reference executor
//!
//! No type coercion. Missing fields compare unequal to everything.

use std::cmp::Ordering;

use serde_json::Value;

use super::store::{MemoryStore, Row};
use crate::planner::{Filter, ListOp, NullOp, ScalarOp};

/// Evaluates filter trees against records
#[derive(Debug, Clone, Copy)]
pub struct PredicateFilter<'a> {
    store: &'a MemoryStore,
}

impl<'a> PredicateFilter<'a> {
    pub fn new(store: &'a MemoryStore) -> Self {
        Self { store }
    }

    /// Checks if a record satisfies a filter
    pub fn matches(&self, record: &Value, filter: &Filter) -> bool {
        match filter {
            Filter::Scalar { op, left, right } => scalar_match(*op, record.get(left), right),
            Filter::List { op, left, right } => list_match(*op, record.get(left), right),
            Filter::Ref {
                op,
                left,
                right,
                thing,
                tunnel,
            } => {
                let pointers = self.pointers(record, left, tunnel.as_deref());
                let hit = |id: &String| {
                    pointers
                        .iter()
                        .any(|p| self.points_to(p, id, thing.as_deref()))
                };
                match op {
                    ListOp::In | ListOp::ContainsAny => right.iter().any(|id| hit(id)),
                    ListOp::NotIn | ListOp::ContainsNone => !right.iter().any(|id| hit(id)),
                    ListOp::ContainsAll => right.iter().all(|id| hit(id)),
                }
            }
            Filter::Null { op, left, tunnel } => {
                let empty = match tunnel {
                    Some(role) => self.pointers(record, left, Some(role)).is_empty(),
                    None => is_empty(record.get(left)),
                };
                match op {
                    NullOp::Is => empty,
                    NullOp::IsNot => !empty,
                }
            }
            Filter::And(children) => children.iter().all(|c| self.matches(record, c)),
            Filter::Or(children) => children.iter().any(|c| self.matches(record, c)),
            Filter::Not(inner) => !self.matches(record, inner),
            Filter::Nested {
                filter,
                path,
                tunnel,
                ..
            } => self
                .related(record, path, tunnel.as_deref())
                .iter()
                .any(|row| self.matches(row.record, filter)),
            Filter::Falsy => false,
        }
    }

    /// Pointer strings stored under `path`, dereferenced through `tunnel`
    pub fn pointers(&self, record: &Value, path: &str, tunnel: Option<&str>) -> Vec<String> {
        let direct = pointer_strings(record.get(path));
        match tunnel {
            None => direct,
            Some(role) => direct
                .iter()
                .filter_map(|p| self.store.resolve(p))
                .flat_map(|row| pointer_strings(row.record.get(role)))
                .collect(),
        }
    }

    /// Existing records reachable through `path`
    pub fn related(&self, record: &Value, path: &str, tunnel: Option<&str>) -> Vec<Row<'a>> {
        self.pointers(record, path, tunnel)
            .iter()
            .filter_map(|p| self.store.resolve(p))
            .collect()
    }

    fn points_to(&self, pointer: &str, id: &str, things: Option<&[String]>) -> bool {
        match self.store.split_pointer(pointer) {
            Some((table, key)) => {
                key == id && things.map_or(true, |ts| ts.iter().any(|t| t == table))
            }
            None => false,
        }
    }
}

fn pointer_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Null, missing and empty arrays all count as "no value"
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// Ordering between comparable values (numbers or strings only)
fn compare(actual: Option<&Value>, bound: &Value) -> Option<Ordering> {
    match (actual?, bound) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Array membership or substring
fn contains(actual: Option<&Value>, item: &Value) -> bool {
    match (actual, item) {
        (Some(Value::Array(items)), _) => items.contains(item),
        (Some(Value::String(s)), Value::String(sub)) => s.contains(sub.as_str()),
        _ => false,
    }
}

fn scalar_match(op: ScalarOp, actual: Option<&Value>, expected: &Value) -> bool {
    match op {
        ScalarOp::Eq => actual == Some(expected),
        ScalarOp::Ne => actual != Some(expected),
        ScalarOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
        ScalarOp::Lt => compare(actual, expected) == Some(Ordering::Less),
        ScalarOp::Gte => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        ScalarOp::Lte => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        ScalarOp::Contains => contains(actual, expected),
        ScalarOp::ContainsNot => !contains(actual, expected),
    }
}

fn list_match(op: ListOp, actual: Option<&Value>, right: &[Value]) -> bool {
    match op {
        ListOp::In => right.iter().any(|v| actual == Some(v)),
        ListOp::NotIn => !right.iter().any(|v| actual == Some(v)),
        ListOp::ContainsAll => right.iter().all(|v| contains(actual, v)),
        ListOp::ContainsAny => right.iter().any(|v| contains(actual, v)),
        ListOp::ContainsNone => !right.iter().any(|v| contains(actual, v)),
    }
}
