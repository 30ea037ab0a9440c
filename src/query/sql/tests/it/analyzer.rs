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

use tessera_common_expression::ComparisonOp;
use tessera_common_expression::Expr;
use tessera_common_expression::ResolvedType;
use tessera_common_expression::TableSourceReference;
use tessera_common_expression::ValueType;
use tessera_common_sql::PairKind;
use tessera_common_sql::PredicateAnalyzer;

fn source(id: i32) -> TableSourceReference {
    let _ = env_logger::builder().is_test(true).try_init();
    TableSourceReference::new(id, format!("table{}", id), format!("t{}", id))
}

fn column(name: &str, ts: &TableSourceReference) -> Expr {
    Expr::column_of(name, ts.clone(), ResolvedType::of(ValueType::Int))
}

#[test]
fn test_and_conjunctions_are_fully_flattened() {
    let t0 = source(0);
    let a = Expr::equals(column("a", &t0), Expr::literal(1));
    let b = Expr::equals(column("b", &t0), Expr::literal(2));
    let c = Expr::equals(column("c", &t0), Expr::literal(3));
    // ((a AND b) AND c) splits into three pairs
    let predicate = Expr::and(Expr::and(a.clone(), b.clone()), c.clone());
    let result = PredicateAnalyzer::analyze(&predicate);
    assert_eq!(result.pairs().len(), 3);
    assert_eq!(result.pairs()[0].expression(), &a);
    assert_eq!(result.pairs()[1].expression(), &b);
    assert_eq!(result.pairs()[2].expression(), &c);
}

#[test]
fn test_or_stays_whole() {
    let t0 = source(0);
    let a = Expr::equals(column("a", &t0), Expr::literal(1));
    let b = Expr::equals(column("b", &t0), Expr::literal(2));
    let predicate = Expr::or(a, b);
    let result = PredicateAnalyzer::analyze(&predicate);
    assert_eq!(result.pairs().len(), 1);
    assert_eq!(result.pairs()[0].kind(), PairKind::Undefined);
    // undefined pairs are never pushdown eligible
    assert!(!result.pairs()[0].is_pushdown(&t0));
}

#[test]
fn test_predicate_reassembly_is_semantically_equivalent() {
    let t0 = source(0);
    let predicate = Expr::and(
        Expr::and(
            Expr::equals(column("a", &t0), Expr::literal(1)),
            Expr::or(
                Expr::equals(column("b", &t0), Expr::literal(2)),
                Expr::equals(column("c", &t0), Expr::literal(3)),
            ),
        ),
        Expr::is_null(column("d", &t0), true),
    );
    let result = PredicateAnalyzer::analyze(&predicate);
    let reassembled = result.predicate().unwrap();
    assert!(reassembled.semantic_eq(&predicate));
}

#[test]
fn test_pushdown_partition() {
    let t0 = source(0);
    let t1 = source(1);
    let own = Expr::equals(column("a", &t0), Expr::literal(1));
    let join = Expr::equals(column("b", &t0), column("x", &t1));
    let other = Expr::equals(column("y", &t1), Expr::literal(2));
    let predicate = Expr::and(Expr::and(own.clone(), join.clone()), other.clone());
    let result = PredicateAnalyzer::analyze(&predicate);

    let (pushdown, leftover) = result.extract_pushdown_pairs(&t0, true);
    assert_eq!(pushdown.len(), 1);
    assert_eq!(pushdown[0].expression(), &own);
    assert_eq!(leftover.pairs().len(), 2);

    // pushdown safety: an eligible pair references no source other than t0
    for pair in &pushdown {
        assert!(pair.left().table_sources().iter().all(|id| *id == t0.id));
        if let Some(right) = pair.right() {
            assert!(right.table_sources().is_empty());
        }
    }
}

#[test]
fn test_self_source_comparison_is_not_pushdown() {
    let t0 = source(0);
    let predicate = Expr::equals(column("a", &t0), column("b", &t0));
    let result = PredicateAnalyzer::analyze(&predicate);
    assert_eq!(result.pairs().len(), 1);
    assert!(!result.pairs()[0].is_pushdown(&t0));
    assert!(!result.pairs()[0].is_equi(&t0));
}

#[test]
fn test_equi_pairs() {
    let t0 = source(0);
    let t1 = source(1);
    let join = Expr::equals(column("b", &t0), column("x", &t1));
    let not_eq = Expr::comparison(ComparisonOp::Gt, column("b", &t0), column("x", &t1));
    let constant = Expr::equals(column("a", &t0), Expr::literal(1));
    let predicate = Expr::and(Expr::and(join.clone(), not_eq), constant);
    let result = PredicateAnalyzer::analyze(&predicate);

    // the join equality is an equi pair for both sides
    let equi_t0 = result.equi_pairs(&t0);
    let equi_t1 = result.equi_pairs(&t1);
    assert_eq!(equi_t0.len(), 2);
    assert_eq!(equi_t0[0].expression(), &join);
    assert_eq!(equi_t1.len(), 1);
    assert_eq!(equi_t1[0].expression(), &join);

    // exclusivity: comparison type is EQUAL and t appears on exactly one side
    for pair in equi_t1 {
        assert_eq!(pair.comparison_op(), Some(ComparisonOp::Eq));
        let left = pair.left().table_sources();
        let right = pair.right().unwrap().table_sources();
        assert!(left.contains(&t1.id) != right.contains(&t1.id));
    }
}

#[test]
fn test_is_not_null_respects_null_allowed() {
    let t0 = source(0);
    let not_null = Expr::is_null(column("a", &t0), true);
    let is_null = Expr::is_null(column("b", &t0), false);
    let predicate = Expr::and(not_null.clone(), is_null.clone());
    let result = PredicateAnalyzer::analyze(&predicate);

    let (pushdown, leftover) = result.extract_pushdown_pairs(&t0, true);
    assert_eq!(pushdown.len(), 2);
    assert!(leftover.is_empty());

    // back-ends that cannot delegate null checks keep IS NOT NULL in-engine
    let (pushdown, leftover) = result.extract_pushdown_pairs(&t0, false);
    assert_eq!(pushdown.len(), 1);
    assert_eq!(pushdown[0].expression(), &is_null);
    assert_eq!(leftover.pairs().len(), 1);
    assert_eq!(leftover.pairs()[0].expression(), &not_null);
}

#[test]
fn test_bare_boolean_column_normalizes() {
    let t0 = source(0);
    let flag = Expr::column_of("active_flag", t0.clone(), ResolvedType::of(ValueType::Boolean));
    let result = PredicateAnalyzer::analyze(&flag);
    assert_eq!(result.pairs().len(), 1);
    let pair = &result.pairs()[0];
    assert_eq!(pair.kind(), PairKind::Comparison);
    assert_eq!(pair.comparison_op(), Some(ComparisonOp::Eq));
    assert_eq!(pair.expression(), &Expr::equals(flag.clone(), Expr::literal(true)));
    assert!(pair.is_pushdown(&t0));

    let result = PredicateAnalyzer::analyze(&Expr::not(flag.clone()));
    assert_eq!(
        result.pairs()[0].expression(),
        &Expr::equals(flag, Expr::literal(false))
    );
}

#[test]
fn test_in_requires_sourced_lhs() {
    let t0 = source(0);
    // col IN (1, 2) classifies as an In pair
    let sourced = Expr::in_list(
        column("a", &t0),
        vec![Expr::literal(1), Expr::literal(2)],
        false,
    );
    let result = PredicateAnalyzer::analyze(&sourced);
    assert_eq!(result.pairs()[0].kind(), PairKind::In);
    assert!(result.pairs()[0].is_pushdown(&t0));

    // <literal> IN (<col>, <col>) stays undefined at the generic analyzer
    let unsourced = Expr::in_list(
        Expr::literal(1),
        vec![column("a", &t0), column("b", &t0)],
        false,
    );
    let result = PredicateAnalyzer::analyze(&unsourced);
    assert_eq!(result.pairs()[0].kind(), PairKind::Undefined);
}

#[test]
fn test_like_and_function_pairs() {
    let t0 = source(0);
    let like = Expr::like(column("name", &t0), Expr::literal("a%"), false);
    let call = Expr::FunctionCall {
        name: "contains".to_string(),
        args: vec![column("name", &t0), Expr::literal("x")],
    };
    let predicate = Expr::and(like, call);
    let result = PredicateAnalyzer::analyze(&predicate);
    assert_eq!(result.pairs()[0].kind(), PairKind::Like);
    assert!(result.pairs()[0].is_pushdown(&t0));
    assert_eq!(result.pairs()[1].kind(), PairKind::FunctionCall);
    assert!(result.pairs()[1].is_pushdown(&t0));
}

#[test]
fn test_analysis_is_total() {
    // arbitrary non-boolean junk still classifies, as Undefined
    let weird = Expr::arithmetic(
        tessera_common_expression::ArithmeticOp::Add,
        Expr::column("a"),
        Expr::literal(1),
    );
    let result = PredicateAnalyzer::analyze(&weird);
    assert_eq!(result.pairs().len(), 1);
    assert_eq!(result.pairs()[0].kind(), PairKind::Undefined);
}

#[test]
fn test_mirrored_pushdown_value_side() {
    let t0 = source(0);
    // 5 > col — the qualified side is on the right
    let predicate = Expr::comparison(ComparisonOp::Gt, Expr::literal(5), column("a", &t0));
    let result = PredicateAnalyzer::analyze(&predicate);
    let pair = &result.pairs()[0];
    assert!(pair.is_pushdown(&t0));
    assert_eq!(pair.column(&t0), Some("a"));
    assert_eq!(pair.value_expression(&t0), Some(&Expr::literal(5)));
}
