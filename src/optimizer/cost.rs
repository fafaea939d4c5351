//! Fixed per-operator cost table
//!
//! Lower cost evaluates first. List and reference operators are scored
//! `base^n` where `n` is the length of the right-hand side, so large lists
//! sink behind cheap equality checks. The constants only encode a relative
//! order; they are not measured costs.

use crate::planner::{Filter, ListOp, ScalarOp};

const NULL_COST: f64 = 2.5;
const NOT_PENALTY: f64 = 1.0;
const NESTED_PENALTY: f64 = 10.0;
const REF_SURCHARGE: f64 = 0.1;

fn scalar_cost(op: ScalarOp) -> f64 {
    match op {
        ScalarOp::Eq => 1.0,
        ScalarOp::Ne => 2.0,
        ScalarOp::Gt | ScalarOp::Lt | ScalarOp::Gte | ScalarOp::Lte => 3.0,
        ScalarOp::Contains => 4.0,
        ScalarOp::ContainsNot => 5.0,
    }
}

fn list_base(op: ListOp) -> f64 {
    match op {
        ListOp::In => 1.2,
        ListOp::NotIn => 1.4,
        ListOp::ContainsAny => 1.6,
        ListOp::ContainsAll => 1.8,
        ListOp::ContainsNone => 2.0,
    }
}

/// Estimated evaluation cost of a filter
pub fn cost(filter: &Filter) -> f64 {
    match filter {
        Filter::Falsy => 0.0,
        Filter::Scalar { op, .. } => scalar_cost(*op),
        Filter::List { op, right, .. } => list_base(*op).powi(right.len() as i32),
        Filter::Ref { op, right, .. } => (list_base(*op) + REF_SURCHARGE).powi(right.len() as i32),
        Filter::Null { .. } => NULL_COST,
        Filter::Not(inner) => cost(inner) + NOT_PENALTY,
        Filter::Nested { filter, .. } => NESTED_PENALTY + cost(filter),
        Filter::And(children) | Filter::Or(children) => children.iter().map(cost).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::NullOp;
    use crate::schema::Cardinality;
    use serde_json::json;

    fn list(op: ListOp, n: usize) -> Filter {
        Filter::List {
            op,
            left: "f".into(),
            right: (0..n).map(|i| json!(i)).collect(),
        }
    }

    #[test]
    fn test_equality_is_cheapest_predicate() {
        let eq = Filter::eq("a", json!(1));
        let ne = Filter::Scalar {
            op: ScalarOp::Ne,
            left: "a".into(),
            right: json!(1),
        };
        let null = Filter::Null {
            op: NullOp::Is,
            left: "a".into(),
            tunnel: None,
        };
        assert!(cost(&Filter::Falsy) < cost(&eq));
        assert!(cost(&eq) < cost(&ne));
        assert!(cost(&ne) < cost(&null));
        assert!(cost(&eq) < cost(&list(ListOp::In, 2)));
    }

    #[test]
    fn test_list_cost_grows_with_right_side() {
        assert!(cost(&list(ListOp::In, 2)) < cost(&list(ListOp::In, 5)));
        assert!((cost(&list(ListOp::In, 2)) - 1.44).abs() < 1e-9);
        assert!(cost(&list(ListOp::In, 3)) < cost(&list(ListOp::ContainsNone, 3)));
    }

    #[test]
    fn test_ref_costs_more_than_list() {
        let reference = Filter::Ref {
            op: ListOp::In,
            left: "f".into(),
            right: vec!["a".into(), "b".into()],
            thing: None,
            tunnel: None,
        };
        assert!(cost(&reference) > cost(&list(ListOp::In, 2)));
    }

    #[test]
    fn test_composite_costs() {
        let eq = Filter::eq("a", json!(1));
        let nested = Filter::Nested {
            filter: Box::new(eq.clone()),
            path: "p".into(),
            cardinality: Cardinality::Many,
            tunnel: None,
        };
        assert_eq!(cost(&nested), 11.0);
        assert_eq!(cost(&Filter::Not(Box::new(eq.clone()))), 2.0);
        assert_eq!(cost(&Filter::Or(vec![eq.clone(), eq])), 2.0);
    }
}
