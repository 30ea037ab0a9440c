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

use std::cmp::Ordering;
use std::sync::Arc;

use num_traits::cast::cast;
use ordered_float::OrderedFloat;
use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::date_helper;
use crate::decimal::DecimalScalar;
use crate::expr::ComparisonOp;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::ColumnBuilder;
use crate::values::DateTimeOffsetScalar;
use crate::values::Scalar;
use crate::values::ScalarRef;
use crate::vector::ComputedVector;
use crate::vector::ValueVector;

fn conversion_error(value: &ScalarRef, target: ValueType) -> ErrorCode {
    ErrorCode::BadDataValueType(format!(
        "cannot convert {} value '{}' to {}",
        value.value_type(),
        value,
        target
    ))
}

/// Convert a scalar to the target value type. This is the single coercion
/// point shared by comparisons, IN lists and CAST.
pub fn coerce_scalar(value: ScalarRef, target: ValueType) -> Result<Scalar> {
    if value.is_null() {
        return Ok(Scalar::Null);
    }
    if value.value_type() == target || target == ValueType::Any {
        return Ok(value.to_owned());
    }
    match target {
        ValueType::Int => match &value {
            ScalarRef::Boolean(v) => Ok(Scalar::Int(*v as i32)),
            ScalarRef::Long(v) => i32::try_from(*v)
                .map(Scalar::Int)
                .map_err(|_| ErrorCode::Overflow(format!("Long value {} overflows Int", v))),
            ScalarRef::Float(v) => cast::<f32, i32>(v.into_inner().trunc())
                .map(Scalar::Int)
                .ok_or_else(|| conversion_error(&value, target)),
            ScalarRef::Double(v) => cast::<f64, i32>(v.into_inner().trunc())
                .map(Scalar::Int)
                .ok_or_else(|| conversion_error(&value, target)),
            ScalarRef::Decimal(v) => {
                let truncated = match 10i128.checked_pow(v.scale() as u32) {
                    Some(pow) => v.mantissa() / pow,
                    None => 0,
                };
                i32::try_from(truncated)
                    .map(Scalar::Int)
                    .map_err(|_| conversion_error(&value, target))
            }
            ScalarRef::String(s) => s
                .trim()
                .parse::<i32>()
                .map(Scalar::Int)
                .map_err(|_| conversion_error(&value, target)),
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::Long => match &value {
            ScalarRef::Boolean(v) => Ok(Scalar::Long(*v as i64)),
            ScalarRef::Int(v) => Ok(Scalar::Long(*v as i64)),
            ScalarRef::Float(v) => cast::<f32, i64>(v.into_inner().trunc())
                .map(Scalar::Long)
                .ok_or_else(|| conversion_error(&value, target)),
            ScalarRef::Double(v) => cast::<f64, i64>(v.into_inner().trunc())
                .map(Scalar::Long)
                .ok_or_else(|| conversion_error(&value, target)),
            ScalarRef::Decimal(v) => {
                let truncated = match 10i128.checked_pow(v.scale() as u32) {
                    Some(pow) => v.mantissa() / pow,
                    None => 0,
                };
                i64::try_from(truncated)
                    .map(Scalar::Long)
                    .map_err(|_| conversion_error(&value, target))
            }
            ScalarRef::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Scalar::Long)
                .map_err(|_| conversion_error(&value, target)),
            ScalarRef::DateTime(v) => Ok(Scalar::Long(*v)),
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::Float => match &value {
            ScalarRef::Boolean(v) => Ok(Scalar::Float(OrderedFloat(*v as i32 as f32))),
            ScalarRef::Int(v) => Ok(Scalar::Float(OrderedFloat(*v as f32))),
            ScalarRef::Long(v) => Ok(Scalar::Float(OrderedFloat(*v as f32))),
            ScalarRef::Double(v) => Ok(Scalar::Float(OrderedFloat(v.into_inner() as f32))),
            ScalarRef::Decimal(v) => Ok(Scalar::Float(OrderedFloat(v.to_f64() as f32))),
            ScalarRef::String(s) => s
                .trim()
                .parse::<f32>()
                .map(|v| Scalar::Float(OrderedFloat(v)))
                .map_err(|_| conversion_error(&value, target)),
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::Double => match &value {
            ScalarRef::Boolean(v) => Ok(Scalar::Double(OrderedFloat(*v as i32 as f64))),
            ScalarRef::Int(v) => Ok(Scalar::Double(OrderedFloat(*v as f64))),
            ScalarRef::Long(v) => Ok(Scalar::Double(OrderedFloat(*v as f64))),
            ScalarRef::Float(v) => Ok(Scalar::Double(OrderedFloat(v.into_inner() as f64))),
            ScalarRef::Decimal(v) => Ok(Scalar::Double(OrderedFloat(v.to_f64()))),
            ScalarRef::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|v| Scalar::Double(OrderedFloat(v)))
                .map_err(|_| conversion_error(&value, target)),
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::Decimal => match &value {
            ScalarRef::Boolean(v) => Ok(Scalar::Decimal(DecimalScalar::from_i128(*v as i128))),
            ScalarRef::Int(v) => Ok(Scalar::Decimal(DecimalScalar::from_i128(*v as i128))),
            ScalarRef::Long(v) => Ok(Scalar::Decimal(DecimalScalar::from_i128(*v as i128))),
            ScalarRef::Float(v) => DecimalScalar::try_from_f64(v.into_inner() as f64)
                .map(Scalar::Decimal)
                .ok_or_else(|| conversion_error(&value, target)),
            ScalarRef::Double(v) => DecimalScalar::try_from_f64(v.into_inner())
                .map(Scalar::Decimal)
                .ok_or_else(|| conversion_error(&value, target)),
            ScalarRef::String(s) => DecimalScalar::parse(s)
                .map(Scalar::Decimal)
                .ok_or_else(|| conversion_error(&value, target)),
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::Boolean => match &value {
            ScalarRef::Int(v) => Ok(Scalar::Boolean(*v != 0)),
            ScalarRef::Long(v) => Ok(Scalar::Boolean(*v != 0)),
            ScalarRef::Float(v) => Ok(Scalar::Boolean(v.into_inner() != 0.0)),
            ScalarRef::Double(v) => Ok(Scalar::Boolean(v.into_inner() != 0.0)),
            ScalarRef::Decimal(v) => Ok(Scalar::Boolean(v.mantissa() != 0)),
            ScalarRef::String(s) => {
                let trimmed = s.trim();
                if trimmed.eq_ignore_ascii_case("true") || trimmed == "1" {
                    Ok(Scalar::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") || trimmed == "0" {
                    Ok(Scalar::Boolean(false))
                } else {
                    Err(conversion_error(&value, target))
                }
            }
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::String => Ok(Scalar::String(value.to_string())),
        ValueType::DateTime => match &value {
            ScalarRef::DateTimeOffset(v) => Ok(Scalar::DateTime(v.micros)),
            ScalarRef::Long(v) => Ok(Scalar::DateTime(*v)),
            ScalarRef::String(s) => date_helper::parse_datetime_micros(s).map(Scalar::DateTime),
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::DateTimeOffset => match &value {
            ScalarRef::DateTime(v) => Ok(Scalar::DateTimeOffset(DateTimeOffsetScalar {
                micros: *v,
                offset_seconds: 0,
            })),
            ScalarRef::String(s) => {
                date_helper::parse_datetime_offset(s).map(Scalar::DateTimeOffset)
            }
            _ => Err(conversion_error(&value, target)),
        },
        ValueType::Array | ValueType::Object | ValueType::Table => {
            Err(conversion_error(&value, target))
        }
        ValueType::Any => unreachable!("handled above"),
    }
}

/// Cross-type equality. `None` when either side is null. Both sides are
/// coerced to the higher-precedence type before comparing, so `'1' = 1` and
/// `true = 1` hold while `1.5 = 1` does not.
pub fn scalars_equal(left: ScalarRef, right: ScalarRef) -> Result<Option<bool>> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    let target = left.value_type().promote(right.value_type());
    let lhs = coerce_scalar(left, target)?;
    let rhs = coerce_scalar(right, target)?;
    Ok(Some(lhs == rhs))
}

/// Cross-type ordering. `None` when either side is null; ordering complex
/// types is a type error.
pub fn compare_scalars(left: ScalarRef, right: ScalarRef) -> Result<Option<Ordering>> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    let target = left.value_type().promote(right.value_type());
    if target.is_complex() {
        return Err(ErrorCode::IllegalDataType(format!(
            "cannot order values of type {}",
            target
        )));
    }
    let lhs = coerce_scalar(left, target)?;
    let rhs = coerce_scalar(right, target)?;
    let ordering = match (&lhs, &rhs) {
        (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
        (Scalar::Int(a), Scalar::Int(b)) => a.cmp(b),
        (Scalar::Long(a), Scalar::Long(b)) => a.cmp(b),
        (Scalar::Float(a), Scalar::Float(b)) => a.into_inner().total_cmp(&b.into_inner()),
        (Scalar::Double(a), Scalar::Double(b)) => a.into_inner().total_cmp(&b.into_inner()),
        (Scalar::Decimal(a), Scalar::Decimal(b)) => a.cmp(b),
        (Scalar::String(a), Scalar::String(b)) => a.cmp(b),
        (Scalar::DateTime(a), Scalar::DateTime(b)) => a.cmp(b),
        (Scalar::DateTimeOffset(a), Scalar::DateTimeOffset(b)) => a.cmp(b),
        (a, b) => unreachable!("coerced values diverged: {:?} vs {:?}", a, b),
    };
    Ok(Some(ordering))
}

fn apply_op(op: ComparisonOp, left: ScalarRef, right: ScalarRef) -> Result<Scalar> {
    let result = match op {
        ComparisonOp::Eq => scalars_equal(left, right)?,
        ComparisonOp::Neq => scalars_equal(left, right)?.map(|eq| !eq),
        ComparisonOp::Lt => compare_scalars(left, right)?.map(|ord| ord == Ordering::Less),
        ComparisonOp::Lte => compare_scalars(left, right)?.map(|ord| ord != Ordering::Greater),
        ComparisonOp::Gt => compare_scalars(left, right)?.map(|ord| ord == Ordering::Greater),
        ComparisonOp::Gte => compare_scalars(left, right)?.map(|ord| ord != Ordering::Less),
    };
    Ok(result.map(Scalar::Boolean).unwrap_or(Scalar::Null))
}

/// Batch comparison. Same-type and numeric pairs cannot fail per row, so they
/// combine lazily; anything involving `Any` or a fallible coercion (string
/// parses) materializes eagerly to surface errors.
pub fn eval_comparison(
    op: ComparisonOp,
    left: &Arc<ValueVector>,
    right: &Arc<ValueVector>,
    num_rows: usize,
) -> Result<Arc<ValueVector>> {
    let lt = left.data_type().value_type();
    let rt = right.data_type().value_type();
    let may_fail = lt == ValueType::Any
        || rt == ValueType::Any
        || lt.is_complex()
        || rt.is_complex()
        || (lt != rt && !(lt.is_number() && rt.is_number()));
    let result_ty = ResolvedType::of(ValueType::Boolean);
    if !may_fail {
        return Ok(Arc::new(ValueVector::Computed(ComputedVector::new(
            result_ty,
            num_rows,
            vec![left.clone(), right.clone()],
            Arc::new(move |sources, row| {
                let lhs = sources[0].value(row);
                let rhs = sources[1].value(row);
                apply_op(op, lhs.as_ref(), rhs.as_ref()).unwrap_or_default()
            }),
        ))));
    }
    let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
    for row in 0..num_rows {
        let lhs = left.value(row);
        let rhs = right.value(row);
        let value = apply_op(op, lhs.as_ref(), rhs.as_ref())?;
        builder.push(value.as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_type_equality() {
        assert_eq!(
            scalars_equal(ScalarRef::Int(1), ScalarRef::String("1")).unwrap(),
            Some(true)
        );
        assert_eq!(
            scalars_equal(ScalarRef::Boolean(true), ScalarRef::Int(1)).unwrap(),
            Some(true)
        );
        assert_eq!(
            scalars_equal(ScalarRef::Double(OrderedFloat(1.5)), ScalarRef::Int(1)).unwrap(),
            Some(false)
        );
        assert_eq!(
            scalars_equal(ScalarRef::Null, ScalarRef::Int(1)).unwrap(),
            None
        );
    }

    #[test]
    fn test_cross_type_ordering() {
        assert_eq!(
            compare_scalars(ScalarRef::String("10"), ScalarRef::Int(9)).unwrap(),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_scalars(ScalarRef::Int(1), ScalarRef::Long(2)).unwrap(),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_unparsable_string_is_an_error() {
        assert!(scalars_equal(ScalarRef::Int(1), ScalarRef::String("abc")).is_err());
    }

    #[test]
    fn test_decimal_equality_across_scales() {
        let a = ScalarRef::Decimal(DecimalScalar::parse("1.50").unwrap());
        let b = ScalarRef::Decimal(DecimalScalar::parse("1.5").unwrap());
        assert_eq!(scalars_equal(a, b).unwrap(), Some(true));
    }
}
