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

use tessera_common_expression::Expr;
use tessera_common_expression::Scalar;
use tessera_common_expression::ValueType;

use crate::batch_of;
use crate::eval_values;
use crate::vector_of;

fn truth(value: Option<bool>) -> Scalar {
    value.map(Scalar::Boolean).unwrap_or(Scalar::Null)
}

/// All nine combinations of {true, false, null} x {true, false, null}.
fn all_pairs() -> (Vec<Scalar>, Vec<Scalar>) {
    let values = [Some(true), Some(false), None];
    let mut left = Vec::new();
    let mut right = Vec::new();
    for l in values {
        for r in values {
            left.push(truth(l));
            right.push(truth(r));
        }
    }
    (left, right)
}

#[test]
fn test_and_kleene_table() {
    let (left, right) = all_pairs();
    let batch = batch_of(vec![
        ("l", vector_of(ValueType::Boolean, left.clone())),
        ("r", vector_of(ValueType::Boolean, right.clone())),
    ]);
    let expr = Expr::and(Expr::column("l"), Expr::column("r"));
    let results = eval_values(&expr, &batch);
    for ((l, r), result) in left.iter().zip(right.iter()).zip(results.iter()) {
        let expected = match (l, r) {
            (Scalar::Boolean(false), _) | (_, Scalar::Boolean(false)) => Scalar::Boolean(false),
            (Scalar::Boolean(true), Scalar::Boolean(true)) => Scalar::Boolean(true),
            _ => Scalar::Null,
        };
        assert_eq!(result, &expected, "{:?} AND {:?}", l, r);
    }
}

#[test]
fn test_or_kleene_table() {
    let (left, right) = all_pairs();
    let batch = batch_of(vec![
        ("l", vector_of(ValueType::Boolean, left.clone())),
        ("r", vector_of(ValueType::Boolean, right.clone())),
    ]);
    let expr = Expr::or(Expr::column("l"), Expr::column("r"));
    let results = eval_values(&expr, &batch);
    for ((l, r), result) in left.iter().zip(right.iter()).zip(results.iter()) {
        let expected = match (l, r) {
            (Scalar::Boolean(true), _) | (_, Scalar::Boolean(true)) => Scalar::Boolean(true),
            (Scalar::Boolean(false), Scalar::Boolean(false)) => Scalar::Boolean(false),
            _ => Scalar::Null,
        };
        assert_eq!(result, &expected, "{:?} OR {:?}", l, r);
    }
}

#[test]
fn test_not_keeps_null() {
    let batch = batch_of(vec![(
        "b",
        vector_of(
            ValueType::Boolean,
            vec![Scalar::Boolean(true), Scalar::Boolean(false), Scalar::Null],
        ),
    )]);
    let expr = Expr::not(Expr::column("b"));
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Boolean(false), Scalar::Boolean(true), Scalar::Null]
    );
}

#[test]
fn test_null_predicate_is_two_valued() {
    let batch = batch_of(vec![(
        "b",
        vector_of(ValueType::Boolean, vec![Scalar::Boolean(true), Scalar::Null]),
    )]);
    let is_null = Expr::is_null(Expr::column("b"), false);
    assert_eq!(
        eval_values(&is_null, &batch),
        vec![Scalar::Boolean(false), Scalar::Boolean(true)]
    );
    let is_not_null = Expr::is_null(Expr::column("b"), true);
    assert_eq!(
        eval_values(&is_not_null, &batch),
        vec![Scalar::Boolean(true), Scalar::Boolean(false)]
    );
}
