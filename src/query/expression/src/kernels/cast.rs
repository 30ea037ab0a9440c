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

use crate::kernels::comparison::coerce_scalar;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::Column;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::values::ScalarRef;
use crate::vector::ValueVector;

/// Explicit cast targets are restricted: no dynamic `Any`, no complex
/// `Object`/`Table`, and `Array` only with an `Any` element type (a cast can
/// wrap arbitrary values, it cannot re-type an existing typed array).
pub fn check_cast_target(target: &ResolvedType) -> Result<()> {
    match target.value_type() {
        ValueType::Any => Err(ErrorCode::IllegalDataType("cannot cast to Any")),
        ValueType::Object | ValueType::Table => Err(ErrorCode::IllegalDataType(format!(
            "cannot cast to {}",
            target.value_type()
        ))),
        ValueType::Array if target.sub_type().value_type() != ValueType::Any => {
            Err(ErrorCode::IllegalDataType(format!(
                "cannot cast to {}, only Array of Any is a valid cast target",
                target
            )))
        }
        _ => Ok(()),
    }
}

pub fn cast_scalar(value: ScalarRef, target: &ResolvedType) -> Result<Scalar> {
    check_cast_target(target)?;
    if value.is_null() {
        return Ok(Scalar::Null);
    }
    if value.value_type() == target.value_type() {
        return Ok(value.to_owned());
    }
    if target.value_type() == ValueType::Array {
        // wrap the single value
        return Ok(Scalar::Array(Column::Any(vec![value.to_owned()])));
    }
    coerce_scalar(value, target.value_type())
}

/// Batch cast; a same-type cast is an identity passthrough, everything else
/// materializes eagerly since per-row conversions can fail.
pub fn eval_cast(
    input: &Arc<ValueVector>,
    target: &ResolvedType,
    num_rows: usize,
) -> Result<Arc<ValueVector>> {
    check_cast_target(target)?;
    if input.data_type().value_type() == target.value_type() {
        return Ok(input.clone());
    }
    let mut builder = ColumnBuilder::with_capacity(target, num_rows);
    for row in 0..num_rows {
        let value = input.value(row);
        let casted = cast_scalar(value.as_ref(), target)?;
        builder.push(casted.as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(
        builder.build(),
        target.clone(),
    )))
}
