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

use std::sync::Arc;

use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::expr::LogicalOp;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::vector::ComputedVector;
use crate::vector::ValueVector;

/// Kleene three-valued AND: a false side wins regardless of null.
pub fn kleene_and(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Kleene three-valued OR: a true side wins regardless of null.
pub fn kleene_or(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

fn truth(value: &Scalar) -> Result<Option<bool>> {
    match value {
        Scalar::Null => Ok(None),
        Scalar::Boolean(v) => Ok(Some(*v)),
        other => Err(ErrorCode::IllegalDataType(format!(
            "expected Boolean, got {}",
            other.value_type()
        ))),
    }
}

fn from_truth(value: Option<bool>) -> Scalar {
    value.map(Scalar::Boolean).unwrap_or(Scalar::Null)
}

fn is_boolean(vector: &ValueVector) -> bool {
    vector.data_type().value_type() == ValueType::Boolean
}

/// Batch AND/OR. Both children are already evaluated over the whole batch;
/// short-circuiting is per row via the Kleene tables. Boolean-typed inputs
/// combine lazily, `Any` inputs materialize eagerly so type errors surface.
pub fn eval_logical(
    op: LogicalOp,
    left: &Arc<ValueVector>,
    right: &Arc<ValueVector>,
    num_rows: usize,
) -> Result<Arc<ValueVector>> {
    let result_ty = ResolvedType::of(ValueType::Boolean);
    let combine = match op {
        LogicalOp::And => kleene_and,
        LogicalOp::Or => kleene_or,
    };
    if is_boolean(left) && is_boolean(right) {
        return Ok(Arc::new(ValueVector::Computed(ComputedVector::new(
            result_ty,
            num_rows,
            vec![left.clone(), right.clone()],
            Arc::new(move |sources, row| {
                let lhs = truth(&sources[0].value(row)).unwrap_or_default();
                let rhs = truth(&sources[1].value(row)).unwrap_or_default();
                from_truth(combine(lhs, rhs))
            }),
        ))));
    }
    let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
    for row in 0..num_rows {
        let lhs = truth(&left.value(row))?;
        let rhs = truth(&right.value(row))?;
        builder.push(from_truth(combine(lhs, rhs)).as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

/// Three-valued NOT: null stays null.
pub fn eval_not(input: &Arc<ValueVector>, num_rows: usize) -> Result<Arc<ValueVector>> {
    let result_ty = ResolvedType::of(ValueType::Boolean);
    if is_boolean(input) {
        return Ok(Arc::new(ValueVector::Computed(ComputedVector::new(
            result_ty,
            num_rows,
            vec![input.clone()],
            Arc::new(|sources, row| {
                let value = truth(&sources[0].value(row)).unwrap_or_default();
                from_truth(value.map(|v| !v))
            }),
        ))));
    }
    let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
    for row in 0..num_rows {
        let value = truth(&input.value(row))?;
        builder.push(from_truth(value.map(|v| !v)).as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}
