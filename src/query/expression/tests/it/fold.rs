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

use tessera_common_expression::ArithmeticOp;
use tessera_common_expression::ComparisonOp;
use tessera_common_expression::Expr;
use tessera_common_expression::TupleVector;

use crate::eval_values;

/// Folding must be observationally identical to evaluating the unfolded
/// tree, batch for batch.
#[test]
fn test_fold_idempotence() {
    let batch = TupleVector::empty(3);
    let exprs = vec![
        Expr::arithmetic(ArithmeticOp::Add, Expr::literal(1), Expr::literal(2)),
        Expr::arithmetic(ArithmeticOp::Add, Expr::literal("a"), Expr::literal("b")),
        Expr::arithmetic(
            ArithmeticOp::Multiply,
            Expr::literal(2i64),
            Expr::arithmetic(ArithmeticOp::Subtract, Expr::literal(7), Expr::literal(3)),
        ),
        Expr::comparison(ComparisonOp::Lt, Expr::literal(1), Expr::literal(2)),
        Expr::in_list(
            Expr::literal(1),
            vec![Expr::null_literal(), Expr::literal(1)],
            false,
        ),
        Expr::like(Expr::literal("abc"), Expr::literal("a%"), false),
        Expr::and(Expr::null_literal(), Expr::literal(false)),
    ];
    for expr in exprs {
        let folded = expr.fold();
        assert_eq!(
            eval_values(&expr, &batch),
            eval_values(&folded, &batch),
            "folding changed the meaning of {}",
            expr
        );
    }
}

#[test]
fn test_fold_reduces_constants_to_literals() {
    let expr = Expr::arithmetic(
        ArithmeticOp::Multiply,
        Expr::literal(6),
        Expr::literal(7),
    );
    assert_eq!(expr.fold(), Expr::literal(42));
    // AND(null, false) folds to false by the Kleene table
    let expr = Expr::and(Expr::null_literal(), Expr::literal(false));
    assert_eq!(expr.fold(), Expr::literal(false));
}

#[test]
fn test_fold_keeps_non_constants() {
    let expr = Expr::equals(Expr::column("a"), Expr::literal(1));
    assert_eq!(expr.fold(), expr);
    // non-deterministic calls never fold
    let now = Expr::FunctionCall {
        name: "current_timestamp".to_string(),
        args: vec![],
    };
    assert_eq!(now.fold(), now);
}
