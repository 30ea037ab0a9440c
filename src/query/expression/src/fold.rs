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

use crate::block::TupleVector;
use crate::expr::Expr;
use crate::expr::LogicalOp;
use crate::function::ExecutionContext;
use crate::values::Scalar;

impl Expr {
    /// Constant folding: a copy-producing pass that reduces every
    /// all-constant subtree to a literal by running the normal evaluation
    /// kernels over a one-row batch, so the folded literal is observably
    /// identical to evaluating the unfolded tree. Folding is best effort: a
    /// subtree whose evaluation fails (e.g. constant overflow) is left
    /// unfolded and the error surfaces at evaluation time.
    pub fn fold(&self) -> Expr {
        let folded = self
            .map_children(&mut |child| Ok(child.fold()))
            .unwrap_or_else(|_| unreachable!("folding children cannot fail"));
        if let Some(simplified) = simplify_logical(&folded) {
            return simplified;
        }
        if matches!(folded, Expr::Literal { .. }) || !folded.is_constant() {
            return folded;
        }
        match evaluate_constant(&folded) {
            Some(literal) => literal,
            None => folded,
        }
    }
}

fn as_bool_literal(expr: &Expr) -> Option<Option<bool>> {
    match expr {
        Expr::Literal {
            value: Scalar::Boolean(value),
            ..
        } => Some(Some(*value)),
        Expr::Literal {
            value: Scalar::Null,
            ..
        } => Some(None),
        _ => None,
    }
}

/// Kleene-safe partial simplification of AND/OR with one constant side:
/// `false AND x` is `false` whatever `x` holds, but `null AND x` cannot drop
/// `x` unless `x` itself folds.
fn simplify_logical(expr: &Expr) -> Option<Expr> {
    let Expr::Logical { op, left, right } = expr else {
        return None;
    };
    let sides = [
        (as_bool_literal(left), right.as_ref()),
        (as_bool_literal(right), left.as_ref()),
    ];
    for (literal, other) in sides {
        match (op, literal) {
            (LogicalOp::And, Some(Some(false))) => return Some(Expr::literal(false)),
            (LogicalOp::And, Some(Some(true))) => return Some(other.clone()),
            (LogicalOp::Or, Some(Some(true))) => return Some(Expr::literal(true)),
            (LogicalOp::Or, Some(Some(false))) => return Some(other.clone()),
            _ => {}
        }
    }
    None
}

fn evaluate_constant(expr: &Expr) -> Option<Expr> {
    let batch = TupleVector::empty(1);
    let mut ctx = ExecutionContext::default();
    let vector = expr.eval(&batch, &mut ctx).ok()?;
    let value = vector.value(0);
    let ty = vector.data_type().clone();
    Some(Expr::Literal { value, ty })
}
