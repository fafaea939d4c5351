//! Property tests for the optimizer.
//!
//! - optimizing twice equals optimizing once
//! - optimized and unoptimized plans return the same rows from the
//!   reference executor, for a thing and for its subtype
//! - a covered composite index leads the top-level `And`
//! - otherwise the first top-level predicate carries the best index score

mod common;

use bqlc::executor::MemoryExecutor;
use bqlc::optimizer::QueryOptimizer;
use bqlc::planner::{
    FieldSelector, Filter, ListOp, LogicalQuery, LogicalQueryBuilder, NestedField, Query, ScalarOp,
};
use common::{EMAILS, GOD_IDS, NAMES, TAG_IDS, USER_IDS};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Filter Generators
// ============================================================================

fn arb_names() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(NAMES.to_vec(), 0..=NAMES.len())
}

fn arb_user_ids() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(USER_IDS.to_vec(), 0..=USER_IDS.len())
}

fn record_ids() -> Vec<&'static str> {
    USER_IDS.iter().chain(GOD_IDS.iter()).copied().collect()
}

fn arb_record_ids() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(record_ids(), 0..=record_ids().len())
}

fn arb_emails() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(EMAILS.to_vec(), 0..=EMAILS.len())
}

fn arb_thing() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["User", "God"])
}

fn arb_tag_ids() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(TAG_IDS.to_vec(), 0..=TAG_IDS.len())
}

/// One field condition on User
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::sample::select(NAMES.to_vec()).prop_map(|n| json!({ "name": n })),
        arb_names().prop_map(|ns| json!({ "name": { "$in": ns } })),
        arb_names().prop_map(|ns| json!({ "name": { "$nin": ns } })),
        prop::sample::select(vec!["a", "b"]).prop_map(|n| json!({ "nickname": n })),
        Just(json!({ "nickname": null })),
        (0i64..50).prop_map(|a| json!({ "age": { "$gt": a } })),
        (0i64..50).prop_map(|a| json!({ "age": { "$lte": a } })),
        prop::sample::select(vec![20, 30, 40, 999]).prop_map(|a| json!({ "age": a })),
        prop::sample::select(EMAILS.to_vec()).prop_map(|e| json!({ "email": e })),
        arb_emails().prop_map(|es| json!({ "email": { "$in": es } })),
        prop::sample::select(record_ids()).prop_map(|id| json!({ "id": id })),
        arb_record_ids().prop_map(|ids| json!({ "id": ids })),
        arb_tag_ids().prop_map(|ids| json!({ "tag": ids })),
        arb_tag_ids().prop_map(|ids| json!({ "tag": { "$containsNone": ids } })),
        prop::sample::select(vec!["admin", "dev", "ops"])
            .prop_map(|n| json!({ "tag": { "name": n } })),
        Just(json!({ "tag": null })),
    ]
}

/// AND objects, OR arrays, `$and`, `$not`
fn arb_filter() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..=3).prop_map(|parts| {
                let mut merged = serde_json::Map::new();
                for part in parts {
                    if let Value::Object(entries) = part {
                        merged.extend(entries);
                    }
                }
                Value::Object(merged)
            }),
            prop::collection::vec(inner.clone(), 1..=3).prop_map(Value::Array),
            prop::collection::vec(inner.clone(), 1..=3).prop_map(|parts| json!({ "$and": parts })),
            inner.prop_map(|f| json!({ "$not": f })),
        ]
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn fields() -> Vec<FieldSelector> {
    vec![FieldSelector::path("id"), FieldSelector::path("name")]
}

fn build(query: &Query) -> LogicalQuery {
    let schema = common::schema();
    match LogicalQueryBuilder::new(&schema).with_metadata(false).build(query) {
        Ok(plan) => plan,
        Err(e) => panic!("generated query rejected: {}", e),
    }
}

fn optimized_user_filter(filter: Value) -> Option<Filter> {
    let schema = common::schema();
    let plan = build(&Query::new("User").with_fields(fields()).with_filter(filter));
    QueryOptimizer::new(&schema).optimize(&plan).filter
}

fn list_score(n: usize) -> f64 {
    0.5_f64.powi(n as i32 - 1)
}

/// Index score of a predicate on User: id 2, indexed `=` 1, lists 0.5^(n-1)
fn index_score(filter: &Filter) -> Option<f64> {
    let indexed = |field: &str| field == "email" || field == "name";
    match filter {
        Filter::Scalar {
            op: ScalarOp::Eq,
            left,
            ..
        } if left == "id" => Some(2.0),
        Filter::List {
            op: ListOp::In,
            left,
            ..
        } if left == "id" => Some(2.0),
        Filter::Scalar {
            op: ScalarOp::Eq,
            left,
            ..
        } if indexed(left.as_str()) => Some(1.0),
        Filter::List {
            op: ListOp::In,
            left,
            right,
        } if indexed(left.as_str()) => Some(list_score(right.len())),
        Filter::Ref {
            op: ListOp::In | ListOp::ContainsAny,
            left,
            right,
            ..
        } if left == "tag" => Some(list_score(right.len())),
        Filter::Or(children) if children.len() > 1 => {
            let field = shared_eq_field(children)?;
            (field != "id" && indexed(field)).then(|| list_score(children.len()))
        }
        _ => None,
    }
}

/// Field shared by an `Or` made only of equalities on that field
fn shared_eq_field(children: &[Filter]) -> Option<&str> {
    let mut shared: Option<&str> = None;
    for child in children {
        match child {
            Filter::Scalar {
                op: ScalarOp::Eq,
                left,
                ..
            } if shared.map_or(true, |f| f == left.as_str()) => shared = Some(left.as_str()),
            _ => return None,
        }
    }
    shared
}

fn is_eq_on(filter: &Filter, field: &str) -> bool {
    matches!(filter, Filter::Scalar { op: ScalarOp::Eq, left, .. } if left == field)
}

/// True if the `[name, age]` index governs the order of `children`
fn composite_applies(children: &[Filter]) -> bool {
    let id_lookup = children.iter().any(|c| index_score(c) == Some(2.0));
    !id_lookup
        && children.iter().any(|c| is_eq_on(c, "name"))
        && children.iter().any(|c| is_eq_on(c, "age"))
}

/// Result rows as a list ordered by id (a ONE result is zero or one rows)
fn rows_by_id(result: Value) -> Vec<Value> {
    let mut rows = match result {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        row => vec![row],
    };
    rows.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
    rows
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// optimize(optimize(q)) == optimize(q)
    #[test]
    fn test_optimize_is_idempotent(filter in arb_filter(), nested in arb_filter()) {
        let schema = common::schema();
        let optimizer = QueryOptimizer::new(&schema);
        let tag_fields = vec![FieldSelector::path("name")];
        let query = Query::new("User")
            .with_fields(vec![
                FieldSelector::path("name"),
                FieldSelector::nested(
                    NestedField::new("tag")
                        .with_fields(tag_fields)
                        .with_filter(json!({ "users": { "$not": nested } })),
                ),
            ])
            .with_filter(filter);
        let plan = build(&query);
        let once = optimizer.optimize(&plan);
        prop_assert_eq!(optimizer.optimize(&once), once);
    }

    /// Same rows with and without the optimizer
    #[test]
    fn test_optimized_plan_returns_same_rows(thing in arb_thing(), filter in arb_filter()) {
        let schema = common::schema();
        let store = common::store();
        let executor = MemoryExecutor::new(&store);

        let plan = build(&Query::new(thing).with_fields(fields()).with_filter(filter));
        let optimized = QueryOptimizer::new(&schema).optimize(&plan);

        prop_assert_eq!(
            rows_by_id(executor.execute(&optimized)),
            rows_by_id(executor.execute(&plan))
        );
    }

    /// `name = ? AND age = ?` leads whenever both are top-level conjuncts
    #[test]
    fn test_composite_index_leads(filter in arb_filter()) {
        if let Some(Filter::And(children)) = optimized_user_filter(filter) {
            if composite_applies(&children) {
                prop_assert!(is_eq_on(&children[0], "name"), "{:?}", children);
                prop_assert!(is_eq_on(&children[1], "age"), "{:?}", children);
            }
        }
    }

    /// Without a covered composite index, the best indexed predicate leads
    #[test]
    fn test_best_indexed_predicate_leads(filter in arb_filter()) {
        let children = match optimized_user_filter(filter) {
            Some(Filter::And(children)) if !composite_applies(&children) => children,
            Some(Filter::Or(children)) => children,
            _ => return Ok(()),
        };
        let best = children.iter().filter_map(index_score).fold(None, |best: Option<f64>, s| {
            Some(best.map_or(s, |b| b.max(s)))
        });
        if let Some(best) = best {
            let first = index_score(&children[0]);
            prop_assert!(first.is_some_and(|s| s >= best), "{:?}", children);
        }
    }

    /// Point lookups by id agree with the equivalent scan filter
    #[test]
    fn test_id_lookup_matches_scan(ids in arb_user_ids()) {
        let store = common::store();
        let executor = MemoryExecutor::new(&store);

        let lookup = build(&Query::new("User").with_ids(ids.clone()).with_fields(fields()));
        let scan = build(
            &Query::new("User")
                .with_fields(fields())
                .with_filter(json!({ "id": { "$in": ids } })),
        );
        prop_assert_eq!(
            rows_by_id(executor.execute(&lookup)),
            rows_by_id(executor.execute(&scan))
        );
    }
}
