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

use ordered_float::OrderedFloat;
use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::decimal::DecimalScalar;
use crate::expr::ArithmeticOp;
use crate::kernels::comparison::coerce_scalar;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::values::ScalarRef;
use crate::vector::ComputedVector;
use crate::vector::ValueVector;

/// Result type of a binary arithmetic operation, by operand type precedence.
/// `Add` doubles as string concatenation when either side is a string; any
/// other non-numeric, non-`Any` operand is a hard type error.
pub fn arithmetic_result_type(
    op: ArithmeticOp,
    left: &ResolvedType,
    right: &ResolvedType,
) -> Result<ResolvedType> {
    let lt = left.value_type();
    let rt = right.value_type();
    if lt == ValueType::Any || rt == ValueType::Any {
        return Ok(ResolvedType::any());
    }
    if op == ArithmeticOp::Add && (lt == ValueType::String || rt == ValueType::String) {
        return Ok(ResolvedType::of(ValueType::String));
    }
    if lt.is_number() && rt.is_number() {
        return Ok(ResolvedType::of(lt.promote(rt)));
    }
    Err(ErrorCode::IllegalDataType(format!(
        "cannot apply '{}' to {} and {}",
        op.symbol(),
        left,
        right
    )))
}

/// Floor division: the quotient is rounded toward negative infinity, so
/// `-7 / 2 == -4`.
fn div_floor_i64(lhs: i64, rhs: i64) -> i64 {
    let quotient = lhs / rhs;
    if lhs % rhs != 0 && (lhs < 0) != (rhs < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Floor modulus: the result follows the sign of the divisor.
fn rem_floor_i64(lhs: i64, rhs: i64) -> i64 {
    let rem = lhs % rhs;
    if rem != 0 && (rem < 0) != (rhs < 0) {
        rem + rhs
    } else {
        rem
    }
}

fn div_floor_i32(lhs: i32, rhs: i32) -> i32 {
    div_floor_i64(lhs as i64, rhs as i64) as i32
}

fn rem_floor_i32(lhs: i32, rhs: i32) -> i32 {
    rem_floor_i64(lhs as i64, rhs as i64) as i32
}

fn overflow(op: ArithmeticOp, ty: ValueType) -> ErrorCode {
    ErrorCode::Overflow(format!("{} '{}' overflow", ty, op.symbol()))
}

fn divide_by_zero(op: ArithmeticOp) -> ErrorCode {
    ErrorCode::DivideByZero(format!("'{}' by zero", op.symbol()))
}

fn to_i32(value: &Scalar) -> i32 {
    match value {
        Scalar::Int(v) => *v,
        other => unreachable!("expected Int, got {:?}", other),
    }
}

fn to_i64(value: &Scalar) -> i64 {
    match value {
        Scalar::Int(v) => *v as i64,
        Scalar::Long(v) => *v,
        other => unreachable!("expected Long, got {:?}", other),
    }
}

fn to_f32(value: &Scalar) -> f32 {
    match value {
        Scalar::Int(v) => *v as f32,
        Scalar::Long(v) => *v as f32,
        Scalar::Float(v) => v.into_inner(),
        other => unreachable!("expected Float, got {:?}", other),
    }
}

fn to_f64(value: &Scalar) -> f64 {
    match value {
        Scalar::Int(v) => *v as f64,
        Scalar::Long(v) => *v as f64,
        Scalar::Float(v) => v.into_inner() as f64,
        Scalar::Double(v) => v.into_inner(),
        other => unreachable!("expected Double, got {:?}", other),
    }
}

fn to_decimal(value: &Scalar, op: ArithmeticOp) -> Result<DecimalScalar> {
    match value {
        Scalar::Int(v) => Ok(DecimalScalar::from_i128(*v as i128)),
        Scalar::Long(v) => Ok(DecimalScalar::from_i128(*v as i128)),
        Scalar::Decimal(v) => Ok(*v),
        Scalar::Float(v) => DecimalScalar::try_from_f64(v.into_inner() as f64)
            .ok_or_else(|| overflow(op, ValueType::Decimal)),
        Scalar::Double(v) => DecimalScalar::try_from_f64(v.into_inner())
            .ok_or_else(|| overflow(op, ValueType::Decimal)),
        other => unreachable!("expected Decimal, got {:?}", other),
    }
}

/// Scalar arithmetic kernel. Null propagates; integer overflow and division
/// by zero fail loudly; integer divide/modulus use floor semantics; floats
/// use IEEE semantics.
pub fn arith_scalars(op: ArithmeticOp, left: ScalarRef, right: ScalarRef) -> Result<Scalar> {
    if left.is_null() || right.is_null() {
        return Ok(Scalar::Null);
    }
    let lt = left.value_type();
    let rt = right.value_type();
    if op == ArithmeticOp::Add && (lt == ValueType::String || rt == ValueType::String) {
        let lhs = coerce_scalar(left, ValueType::String)?;
        let rhs = coerce_scalar(right, ValueType::String)?;
        return Ok(Scalar::String(format!("{}{}", lhs, rhs)));
    }
    if !lt.is_number() || !rt.is_number() {
        return Err(ErrorCode::IllegalDataType(format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            lt,
            rt
        )));
    }
    let target = lt.promote(rt);
    let lhs = coerce_scalar(left, target)?;
    let rhs = coerce_scalar(right, target)?;
    match target {
        ValueType::Int => {
            let (a, b) = (to_i32(&lhs), to_i32(&rhs));
            let value = match op {
                ArithmeticOp::Add => a.checked_add(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Subtract => a.checked_sub(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Multiply => a.checked_mul(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Divide => {
                    if b == 0 {
                        return Err(divide_by_zero(op));
                    }
                    div_floor_i32(a, b)
                }
                ArithmeticOp::Modulus => {
                    if b == 0 {
                        return Err(divide_by_zero(op));
                    }
                    rem_floor_i32(a, b)
                }
            };
            Ok(Scalar::Int(value))
        }
        ValueType::Long => {
            let (a, b) = (to_i64(&lhs), to_i64(&rhs));
            let value = match op {
                ArithmeticOp::Add => a.checked_add(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Subtract => a.checked_sub(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Multiply => a.checked_mul(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Divide => {
                    if b == 0 {
                        return Err(divide_by_zero(op));
                    }
                    div_floor_i64(a, b)
                }
                ArithmeticOp::Modulus => {
                    if b == 0 {
                        return Err(divide_by_zero(op));
                    }
                    rem_floor_i64(a, b)
                }
            };
            Ok(Scalar::Long(value))
        }
        ValueType::Float => {
            let (a, b) = (to_f32(&lhs), to_f32(&rhs));
            let value = match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Subtract => a - b,
                ArithmeticOp::Multiply => a * b,
                ArithmeticOp::Divide => a / b,
                ArithmeticOp::Modulus => a % b,
            };
            Ok(Scalar::Float(OrderedFloat(value)))
        }
        ValueType::Double => {
            let (a, b) = (to_f64(&lhs), to_f64(&rhs));
            let value = match op {
                ArithmeticOp::Add => a + b,
                ArithmeticOp::Subtract => a - b,
                ArithmeticOp::Multiply => a * b,
                ArithmeticOp::Divide => a / b,
                ArithmeticOp::Modulus => a % b,
            };
            Ok(Scalar::Double(OrderedFloat(value)))
        }
        ValueType::Decimal => {
            let (a, b) = (to_decimal(&lhs, op)?, to_decimal(&rhs, op)?);
            let value = match op {
                ArithmeticOp::Add => a.checked_add(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Subtract => a.checked_sub(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Multiply => a.checked_mul(b).ok_or_else(|| overflow(op, target))?,
                ArithmeticOp::Divide => {
                    if b.mantissa() == 0 {
                        return Err(divide_by_zero(op));
                    }
                    a.checked_div(b).ok_or_else(|| overflow(op, target))?
                }
                ArithmeticOp::Modulus => {
                    if b.mantissa() == 0 {
                        return Err(divide_by_zero(op));
                    }
                    a.checked_rem(b).ok_or_else(|| overflow(op, target))?
                }
            };
            Ok(Scalar::Decimal(value))
        }
        other => unreachable!("non numeric arithmetic target {}", other),
    }
}

/// Unary numeric negation, checked on integers.
pub fn negate_scalar(value: ScalarRef) -> Result<Scalar> {
    match value {
        ScalarRef::Null => Ok(Scalar::Null),
        ScalarRef::Int(v) => v
            .checked_neg()
            .map(Scalar::Int)
            .ok_or_else(|| ErrorCode::Overflow("Int negate overflow".to_string())),
        ScalarRef::Long(v) => v
            .checked_neg()
            .map(Scalar::Long)
            .ok_or_else(|| ErrorCode::Overflow("Long negate overflow".to_string())),
        ScalarRef::Float(v) => Ok(Scalar::Float(OrderedFloat(-v.into_inner()))),
        ScalarRef::Double(v) => Ok(Scalar::Double(OrderedFloat(-v.into_inner()))),
        ScalarRef::Decimal(v) => v
            .checked_neg()
            .map(Scalar::Decimal)
            .ok_or_else(|| ErrorCode::Overflow("Decimal negate overflow".to_string())),
        other => Err(ErrorCode::IllegalDataType(format!(
            "cannot negate {}",
            other.value_type()
        ))),
    }
}

/// Batch arithmetic. Children are already evaluated; the float paths combine
/// lazily (they cannot fail per row), everything else materializes eagerly so
/// overflow and division errors surface at evaluation time.
pub fn eval_arithmetic(
    op: ArithmeticOp,
    left: &Arc<ValueVector>,
    right: &Arc<ValueVector>,
    num_rows: usize,
) -> Result<Arc<ValueVector>> {
    let result_ty = arithmetic_result_type(op, left.data_type(), right.data_type())?;
    match result_ty.value_type() {
        ValueType::Float | ValueType::Double => {
            Ok(Arc::new(ValueVector::Computed(ComputedVector::new(
                result_ty,
                num_rows,
                vec![left.clone(), right.clone()],
                Arc::new(move |sources, row| {
                    let lhs = sources[0].value(row);
                    let rhs = sources[1].value(row);
                    // the float path cannot fail
                    arith_scalars(op, lhs.as_ref(), rhs.as_ref()).unwrap_or_default()
                }),
            ))))
        }
        _ => {
            let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
            for row in 0..num_rows {
                let lhs = left.value(row);
                let rhs = right.value(row);
                let value = arith_scalars(op, lhs.as_ref(), rhs.as_ref())?;
                builder.push(value.as_ref());
            }
            Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
        }
    }
}

/// Batch unary negation; eager, integer negation can overflow.
pub fn eval_negate(input: &Arc<ValueVector>, num_rows: usize) -> Result<Arc<ValueVector>> {
    let result_ty = input.data_type().clone();
    let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
    for row in 0..num_rows {
        let value = input.value(row);
        let negated = negate_scalar(value.as_ref())?;
        builder.push(negated.as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}
