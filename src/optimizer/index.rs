//! Index-aware predicate reordering
//!
//! Applied to the top level of a normalized filter:
//!
//! 1. `And`: an `=`/`IN` on the id column leads. Failing that, if every
//!    field of a composite index (longest first) has an `=` conjunct, those
//!    conjuncts move to the front as a group in index order.
//! 2. Otherwise, for `And` and `Or`, the single highest-scoring indexed
//!    predicate moves to the front. Ties break on field name, then on an
//!    existing `Or` of equalities, then on position.
//!
//! Scores: `=`/`IN` on the id column 2.0, `=` on an indexed field 1.0,
//! `IN` with n values (or an `Or` of n equalities on one field) 0.5^(n-1),
//! reference `IN`/`CONTAINSANY` on a link or role 0.5^(n-1). A promoted
//! non-id `IN` is rewritten into per-value equalities so each value can
//! use the index.

use serde_json::Value;

use crate::planner::{Filter, ListOp, ScalarOp};
use crate::schema::{ThingSchema, ID_COLUMN};

const ID_SCORE: f64 = 2.0;
const EQ_SCORE: f64 = 1.0;

/// Scored index candidate
#[derive(Debug, Clone, Copy)]
struct Candidate<'f> {
    position: usize,
    score: f64,
    field: &'f str,
    or_form: bool,
}

impl Candidate<'_> {
    fn beats(&self, other: &Candidate<'_>) -> bool {
        if self.score != other.score {
            return self.score > other.score;
        }
        if self.field != other.field {
            return self.field < other.field;
        }
        self.or_form && !other.or_form
    }
}

fn list_score(n: usize) -> f64 {
    0.5_f64.powi(n.saturating_sub(1) as i32)
}

/// Equality fan-out of a non-id `IN`
fn as_equalities(left: &str, right: &[Value]) -> Vec<Filter> {
    right.iter().map(|v| Filter::eq(left, v.clone())).collect()
}

/// Field and score if `filter` can use an index on `thing`
fn score<'f>(filter: &'f Filter, thing: &ThingSchema) -> Option<(&'f str, f64, bool)> {
    match filter {
        Filter::Scalar {
            op: ScalarOp::Eq,
            left,
            ..
        } if left == ID_COLUMN => Some((left.as_str(), ID_SCORE, false)),
        Filter::List {
            op: ListOp::In,
            left,
            ..
        } if left == ID_COLUMN => Some((left.as_str(), ID_SCORE, false)),
        Filter::Scalar {
            op: ScalarOp::Eq,
            left,
            ..
        } if thing.is_indexed(left) => Some((left.as_str(), EQ_SCORE, false)),
        Filter::List {
            op: ListOp::In,
            left,
            right,
        } if thing.is_indexed(left) => Some((left.as_str(), list_score(right.len()), false)),
        Filter::Ref {
            op: ListOp::In | ListOp::ContainsAny,
            left,
            right,
            ..
        } if thing.field(left).is_some_and(|f| f.kind.is_relational()) => {
            Some((left.as_str(), list_score(right.len()), false))
        }
        Filter::Or(children) if children.len() > 1 => {
            let field = or_of_equalities(children)?;
            (field != ID_COLUMN && thing.is_indexed(field))
                .then(|| (field, list_score(children.len()), true))
        }
        _ => None,
    }
}

/// Shared field if every child is `=` on the same field
fn or_of_equalities(children: &[Filter]) -> Option<&str> {
    let mut field = None;
    for child in children {
        match child {
            Filter::Scalar {
                op: ScalarOp::Eq,
                left,
                ..
            } if field.map_or(true, |f| f == left.as_str()) => field = Some(left.as_str()),
            _ => return None,
        }
    }
    field
}

fn best_candidate<'f>(children: &'f [Filter], thing: &ThingSchema) -> Option<Candidate<'f>> {
    let mut best: Option<Candidate<'f>> = None;
    for (position, child) in children.iter().enumerate() {
        if let Some((field, score, or_form)) = score(child, thing) {
            let candidate = Candidate {
                position,
                score,
                field,
                or_form,
            };
            if best.map_or(true, |b| candidate.beats(&b)) {
                best = Some(candidate);
            }
        }
    }
    best
}

/// Positions of the `=` conjuncts covering the longest usable composite index
fn composite_group(children: &[Filter], thing: &ThingSchema) -> Option<Vec<usize>> {
    'indexes: for fields in thing.composite_indexes() {
        let mut group = Vec::with_capacity(fields.len());
        for field in fields {
            let position = children.iter().enumerate().position(|(i, child)| {
                !group.contains(&i)
                    && matches!(child, Filter::Scalar { op: ScalarOp::Eq, left, .. } if left == field)
            });
            match position {
                Some(i) => group.push(i),
                None => continue 'indexes,
            }
        }
        return Some(group);
    }
    None
}

/// Reorders the top level of a normalized filter
pub fn reorder(filter: Filter, thing: &ThingSchema) -> Filter {
    match filter {
        Filter::And(children) => Filter::And(reorder_and(children, thing)),
        Filter::Or(children) => Filter::Or(reorder_or(children, thing)),
        other => other,
    }
}

fn reorder_and(children: Vec<Filter>, thing: &ThingSchema) -> Vec<Filter> {
    let best = best_candidate(&children, thing).map(|b| (b.position, b.score));
    let id_lookup = best.is_some_and(|(_, score)| score >= ID_SCORE);
    if !id_lookup {
        if let Some(group) = composite_group(&children, thing) {
            let mut slots: Vec<Option<Filter>> = children.into_iter().map(Some).collect();
            let mut out: Vec<Filter> = group.iter().filter_map(|&i| slots[i].take()).collect();
            out.extend(slots.into_iter().flatten());
            return out;
        }
    }

    let Some((position, _)) = best else {
        return children;
    };
    let mut children = children;
    let promoted = match children.remove(position) {
        Filter::List {
            op: ListOp::In,
            left,
            right,
        } if left != ID_COLUMN => Filter::Or(as_equalities(&left, &right)),
        other => other,
    };
    children.insert(0, promoted);
    children
}

fn reorder_or(children: Vec<Filter>, thing: &ThingSchema) -> Vec<Filter> {
    let Some(best) = best_candidate(&children, thing) else {
        return children;
    };
    let position = best.position;
    let mut children = children;
    let mut promoted = match children.remove(position) {
        Filter::List {
            op: ListOp::In,
            left,
            right,
        } if left != ID_COLUMN => as_equalities(&left, &right),
        other => vec![other],
    };
    promoted.extend(children);
    promoted
}
