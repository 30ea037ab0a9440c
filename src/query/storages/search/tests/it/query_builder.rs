// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde_json::json;
use tessera_common_expression::ArithmeticOp;
use tessera_common_expression::ComparisonOp;
use tessera_common_expression::Expr;
use tessera_common_expression::ResolvedType;
use tessera_common_expression::TableSourceReference;
use tessera_common_expression::ValueType;
use tessera_common_sql::PredicateAnalyzer;
use tessera_common_storages_search::SearchQueryBuilder;

fn source(id: i32) -> TableSourceReference {
    let _ = env_logger::builder().is_test(true).try_init();
    TableSourceReference::new(id, format!("table{}", id), format!("t{}", id))
}

fn column(name: &str, ts: &TableSourceReference) -> Expr {
    Expr::column_of(name, ts.clone(), ResolvedType::of(ValueType::Int))
}

fn build(predicate: &Expr, ts: &TableSourceReference) -> tessera_common_storages_search::SearchQuery {
    let analysis = PredicateAnalyzer::analyze(predicate);
    SearchQueryBuilder::new(ts.clone()).build(&analysis)
}

#[test]
fn test_term_and_range_clauses() {
    let t0 = source(0);
    let predicate = Expr::and(
        Expr::equals(column("status", &t0), Expr::literal("active")),
        Expr::comparison(ComparisonOp::Gte, column("age", &t0), Expr::literal(21)),
    );
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [
                {"term": {"status": "active"}},
                {"range": {"age": {"gte": 21}}},
            ],
            "must_not": [],
        }}})
    );
    assert!(query.post_filter.is_none());
}

#[test]
fn test_mirrored_comparison() {
    let t0 = source(0);
    // 21 <= age means age >= 21
    let predicate = Expr::comparison(ComparisonOp::Lte, Expr::literal(21), column("age", &t0));
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [{"range": {"age": {"gte": 21}}}],
            "must_not": [],
        }}})
    );
}

#[test]
fn test_neq_goes_to_must_not() {
    let t0 = source(0);
    let predicate = Expr::comparison(ComparisonOp::Neq, column("age", &t0), Expr::literal(3));
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [],
            "must_not": [{"term": {"age": 3}}],
        }}})
    );
}

#[test]
fn test_in_like_and_null_clauses() {
    let t0 = source(0);
    let predicate = Expr::and(
        Expr::and(
            Expr::in_list(
                column("kind", &t0),
                vec![Expr::literal(1), Expr::literal(2)],
                false,
            ),
            Expr::like(column("name", &t0), Expr::literal("pre%_x"), false),
        ),
        Expr::is_null(column("deleted_at", &t0), false),
    );
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [
                {"terms": {"kind": [1, 2]}},
                {"wildcard": {"name": "pre*?x"}},
            ],
            "must_not": [
                {"exists": {"field": "deleted_at"}},
            ],
        }}})
    );
    assert!(query.post_filter.is_none());
}

#[test]
fn test_is_not_null_is_a_must_exists() {
    let t0 = source(0);
    let predicate = Expr::is_null(column("name", &t0), true);
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [{"exists": {"field": "name"}}],
            "must_not": [],
        }}})
    );
}

#[test]
fn test_constant_value_sides_fold_before_translation() {
    let t0 = source(0);
    let predicate = Expr::comparison(
        ComparisonOp::Gt,
        column("age", &t0),
        Expr::arithmetic(ArithmeticOp::Add, Expr::literal(20), Expr::literal(1)),
    );
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [{"range": {"age": {"gt": 21}}}],
            "must_not": [],
        }}})
    );
}

#[test]
fn test_untranslatable_pairs_stay_in_post_filter() {
    let t0 = source(0);
    let t1 = source(1);
    let pushable = Expr::equals(column("status", &t0), Expr::literal("active"));
    let join = Expr::equals(column("id", &t0), column("ref_id", &t1));
    let disjunction = Expr::or(
        Expr::equals(column("a", &t0), Expr::literal(1)),
        Expr::equals(column("b", &t0), Expr::literal(2)),
    );
    let predicate = Expr::and(Expr::and(pushable, join.clone()), disjunction.clone());
    let query = build(&predicate, &t0);
    assert_eq!(
        query.dsl,
        json!({"query": {"bool": {
            "must": [{"term": {"status": "active"}}],
            "must_not": [],
        }}})
    );
    let post_filter = query.post_filter.unwrap();
    assert!(post_filter.semantic_eq(&Expr::and(join, disjunction)));
}
