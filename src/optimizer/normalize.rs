//! Filter normalization
//!
//! - one-element list filters collapse to their scalar form; a one-element
//!   reference `CONTAINSALL` becomes `CONTAINSANY`, other reference filters
//!   keep their list form since pointers have no scalar comparison
//! - empty positive lists (`IN`, `CONTAINSANY`) become `Falsy`
//! - empty negative lists (`NOT IN`, `CONTAINSALL`, `CONTAINSNONE`) are always true
//! - `Falsy` short-circuits `And` and is dropped from `Or`
//! - nested `And`/`And` and `Or`/`Or` are flattened
//! - `Not` is pushed through `=`/`!=` and double negation
//! - siblings are sorted by cost, stable on ties
//!
//! Always-true is represented as `And([])`. The output is a fixpoint:
//! normalizing a normalized filter returns it unchanged.

use super::cost::cost;
use crate::planner::{Filter, ListOp, ScalarOp};

/// Normalizes a filter tree
pub fn normalize(filter: Filter) -> Filter {
    match filter {
        Filter::List { op, left, mut right } => match right.len() {
            0 if op.is_positive() => Filter::Falsy,
            0 => Filter::truthy(),
            1 => Filter::Scalar {
                op: op.scalar(),
                left,
                right: right.remove(0),
            },
            _ => Filter::List { op, left, right },
        },
        Filter::Ref { op, right, .. } if right.is_empty() => {
            if op.is_positive() {
                Filter::Falsy
            } else {
                Filter::truthy()
            }
        }
        Filter::Ref {
            op: ListOp::ContainsAll,
            left,
            right,
            thing,
            tunnel,
        } if right.len() == 1 => Filter::Ref {
            op: ListOp::ContainsAny,
            left,
            right,
            thing,
            tunnel,
        },
        Filter::Not(inner) => negate(normalize(*inner)),
        Filter::And(children) => normalize_and(children),
        Filter::Or(children) => normalize_or(children),
        Filter::Nested {
            filter,
            path,
            cardinality,
            tunnel,
        } => match normalize(*filter) {
            Filter::Falsy => Filter::Falsy,
            inner => Filter::Nested {
                filter: Box::new(inner),
                path,
                cardinality,
                tunnel,
            },
        },
        other => other,
    }
}

fn normalize_and(children: Vec<Filter>) -> Filter {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match normalize(child) {
            Filter::Falsy => return Filter::Falsy,
            Filter::And(grand) => out.extend(grand),
            other => out.push(other),
        }
    }
    sort_by_cost(&mut out);
    Filter::all(out)
}

fn normalize_or(children: Vec<Filter>) -> Filter {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match normalize(child) {
            Filter::Falsy => {}
            always if always.is_truthy() => return always,
            Filter::Or(grand) => out.extend(grand),
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return Filter::Falsy;
    }
    sort_by_cost(&mut out);
    Filter::any(out)
}

/// Negates an already normalized filter
fn negate(filter: Filter) -> Filter {
    match filter {
        Filter::Falsy => Filter::truthy(),
        always if always.is_truthy() => Filter::Falsy,
        Filter::Not(inner) => *inner,
        Filter::Scalar {
            op: ScalarOp::Eq,
            left,
            right,
        } => Filter::Scalar {
            op: ScalarOp::Ne,
            left,
            right,
        },
        Filter::Scalar {
            op: ScalarOp::Ne,
            left,
            right,
        } => Filter::eq(left, right),
        other => Filter::Not(Box::new(other)),
    }
}

fn sort_by_cost(filters: &mut [Filter]) {
    filters.sort_by(|a, b| cost(a).total_cmp(&cost(b)));
}
