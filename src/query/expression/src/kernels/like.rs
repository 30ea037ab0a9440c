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

use regex::Regex;
use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::kernels::comparison::coerce_scalar;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::vector::ValueVector;

/// Translate a LIKE pattern into an anchored regex: `%` becomes `.*?`, `_`
/// becomes `.?`, every other regex metacharacter (including a literal `?`) is
/// escaped. The whole string must match.
pub fn like_pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*?"),
            '_' => out.push_str(".?"),
            '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

pub fn compile_like_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(&like_pattern_to_regex(pattern))
        .map_err(|e| ErrorCode::BadArguments(format!("invalid LIKE pattern '{}': {}", pattern, e)))
}

fn to_text(value: crate::values::ScalarRef) -> Result<String> {
    match coerce_scalar(value, ValueType::String)? {
        Scalar::String(text) => Ok(text),
        other => unreachable!("string coercion produced {:?}", other),
    }
}

/// Batch LIKE. A constant pattern compiles once per batch. `NOT LIKE` inverts
/// the boolean but null inputs stay null.
pub fn eval_like(
    input: &Arc<ValueVector>,
    pattern: &Arc<ValueVector>,
    negated: bool,
    num_rows: usize,
) -> Result<Arc<ValueVector>> {
    let precompiled = match &**pattern {
        ValueVector::Const { scalar, .. } if !scalar.is_null() => {
            Some(compile_like_pattern(&to_text(scalar.as_ref())?)?)
        }
        _ => None,
    };
    let result_ty = ResolvedType::of(ValueType::Boolean);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
    for row in 0..num_rows {
        let value = input.value(row);
        let pattern_value = pattern.value(row);
        if value.is_null() || pattern_value.is_null() {
            builder.push(Scalar::Null.as_ref());
            continue;
        }
        let text = to_text(value.as_ref())?;
        let matched = match &precompiled {
            Some(regex) => regex.is_match(&text),
            None => compile_like_pattern(&to_text(pattern_value.as_ref())?)?.is_match(&text),
        };
        builder.push(Scalar::Boolean(matched != negated).as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}
