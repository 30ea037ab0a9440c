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

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::block::TupleVector;
use crate::expr::Expr;
use crate::kernels::comparison::coerce_scalar;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::Column;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::vector::ValueVector;

/// Per-query evaluation state: the variable table written by assignment
/// expressions, lambda parameter slots, and the query-stable current time.
/// Expressions themselves stay immutable; all mutation lives here. A context
/// is single-writer: callers sharing one across threads must serialize.
pub struct ExecutionContext {
    variables: HashMap<String, Arc<ValueVector>>,
    lambda_slots: Vec<Option<Arc<ValueVector>>>,
    now: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::with_now(Utc::now())
    }

    /// Fix the current-time provider, e.g. in tests.
    pub fn with_now(now: DateTime<Utc>) -> Self {
        Self {
            variables: HashMap::new(),
            lambda_slots: Vec::new(),
            now,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn now_micros(&self) -> i64 {
        self.now.timestamp_micros()
    }

    pub fn set_variable(&mut self, name: &str, value: Arc<ValueVector>) {
        self.variables.insert(name.to_ascii_lowercase(), value);
    }

    pub fn variable(&self, name: &str) -> Option<Arc<ValueVector>> {
        self.variables.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn set_lambda_slot(&mut self, slot: usize, value: Option<Arc<ValueVector>>) {
        if self.lambda_slots.len() <= slot {
            self.lambda_slots.resize(slot + 1, None);
        }
        self.lambda_slots[slot] = value;
    }

    pub fn lambda_slot(&self, slot: usize) -> Option<Arc<ValueVector>> {
        self.lambda_slots.get(slot).cloned().flatten()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

type FunctionEval = fn(&[Expr], &TupleVector, &mut ExecutionContext) -> Result<Arc<ValueVector>>;

pub struct Function {
    pub name: &'static str,
    pub deterministic: bool,
    pub return_type: fn(&[ResolvedType]) -> ResolvedType,
    pub eval: FunctionEval,
}

pub struct FunctionRegistry {
    funcs: HashMap<&'static str, Function>,
}

static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::builtin);

impl FunctionRegistry {
    pub fn instance() -> &'static FunctionRegistry {
        &REGISTRY
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.funcs.get(name.to_ascii_lowercase().as_str())
    }

    fn register(&mut self, function: Function) {
        self.funcs.insert(function.name, function);
    }

    fn builtin() -> FunctionRegistry {
        let mut registry = FunctionRegistry {
            funcs: HashMap::new(),
        };
        registry.register(Function {
            name: "lower",
            deterministic: true,
            return_type: |_| ResolvedType::of(ValueType::String),
            eval: eval_lower,
        });
        registry.register(Function {
            name: "upper",
            deterministic: true,
            return_type: |_| ResolvedType::of(ValueType::String),
            eval: eval_upper,
        });
        registry.register(Function {
            name: "length",
            deterministic: true,
            return_type: |_| ResolvedType::of(ValueType::Int),
            eval: eval_length,
        });
        registry.register(Function {
            name: "concat",
            deterministic: true,
            return_type: |_| ResolvedType::of(ValueType::String),
            eval: eval_concat,
        });
        registry.register(Function {
            name: "contains",
            deterministic: true,
            return_type: |_| ResolvedType::of(ValueType::Boolean),
            eval: eval_contains,
        });
        registry.register(Function {
            name: "coalesce",
            deterministic: true,
            return_type: coalesce_return_type,
            eval: eval_coalesce,
        });
        registry.register(Function {
            name: "current_timestamp",
            deterministic: false,
            return_type: |_| ResolvedType::of(ValueType::DateTime),
            eval: eval_current_timestamp,
        });
        registry.register(Function {
            name: "current_date",
            deterministic: false,
            return_type: |_| ResolvedType::of(ValueType::DateTime),
            eval: eval_current_date,
        });
        registry.register(Function {
            name: "map",
            deterministic: true,
            return_type: |_| ResolvedType::array(ResolvedType::any()),
            eval: eval_map,
        });
        registry.register(Function {
            name: "filter",
            deterministic: true,
            return_type: |args| {
                args.first()
                    .cloned()
                    .unwrap_or_else(|| ResolvedType::array(ResolvedType::any()))
            },
            eval: eval_filter,
        });
        registry.register(Function {
            name: "any",
            deterministic: true,
            return_type: |_| ResolvedType::of(ValueType::Boolean),
            eval: eval_any,
        });
        registry
    }
}

fn check_arg_count(name: &str, args: &[Expr], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(ErrorCode::BadArguments(format!(
            "{} expects {} arguments, got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn text_of(value: &Scalar) -> Result<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    match coerce_scalar(value.as_ref(), ValueType::String)? {
        Scalar::String(text) => Ok(Some(text)),
        other => unreachable!("string coercion produced {:?}", other),
    }
}

fn eval_string_unary(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
    name: &str,
    apply: fn(String) -> Scalar,
) -> Result<Arc<ValueVector>> {
    check_arg_count(name, args, 1)?;
    let arg = args[0].eval(input, ctx)?;
    let result_ty = ResolvedType::of(ValueType::String);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for row in 0..input.row_count() {
        let value = arg.value(row);
        match text_of(&value)? {
            Some(text) => builder.push(apply(text).as_ref()),
            None => builder.push(Scalar::Null.as_ref()),
        }
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn eval_lower(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    eval_string_unary(args, input, ctx, "lower", |text| {
        Scalar::String(text.to_lowercase())
    })
}

fn eval_upper(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    eval_string_unary(args, input, ctx, "upper", |text| {
        Scalar::String(text.to_uppercase())
    })
}

fn eval_length(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    check_arg_count("length", args, 1)?;
    let arg = args[0].eval(input, ctx)?;
    let result_ty = ResolvedType::of(ValueType::Int);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for row in 0..input.row_count() {
        let value = arg.value(row);
        let length = match &value {
            Scalar::Null => Scalar::Null,
            Scalar::Array(col) => Scalar::Int(col.len() as i32),
            other => match text_of(other)? {
                Some(text) => Scalar::Int(text.chars().count() as i32),
                None => Scalar::Null,
            },
        };
        builder.push(length.as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn eval_concat(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    let vectors = args
        .iter()
        .map(|arg| arg.eval(input, ctx))
        .collect::<Result<Vec<_>>>()?;
    let result_ty = ResolvedType::of(ValueType::String);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for row in 0..input.row_count() {
        let mut out = String::new();
        for vector in &vectors {
            let value = vector.value(row);
            if let Some(text) = text_of(&value)? {
                out.push_str(&text);
            }
        }
        builder.push(Scalar::String(out).as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn eval_contains(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    check_arg_count("contains", args, 2)?;
    let haystack = args[0].eval(input, ctx)?;
    let needle = args[1].eval(input, ctx)?;
    let result_ty = ResolvedType::of(ValueType::Boolean);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for row in 0..input.row_count() {
        let hay = haystack.value(row);
        let pin = needle.value(row);
        let value = match (text_of(&hay)?, text_of(&pin)?) {
            (Some(hay), Some(pin)) => Scalar::Boolean(hay.contains(&pin)),
            _ => Scalar::Null,
        };
        builder.push(value.as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn coalesce_return_type(args: &[ResolvedType]) -> ResolvedType {
    let mut result: Option<ResolvedType> = None;
    for arg in args {
        result = Some(match result {
            None => arg.clone(),
            Some(current) if current == *arg => current,
            Some(current) => ResolvedType::of(current.value_type().promote(arg.value_type())),
        });
    }
    result.unwrap_or_else(ResolvedType::any)
}

fn eval_coalesce(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    let vectors = args
        .iter()
        .map(|arg| arg.eval(input, ctx))
        .collect::<Result<Vec<_>>>()?;
    let arg_types: Vec<ResolvedType> = args.iter().map(Expr::data_type).collect();
    let result_ty = coalesce_return_type(&arg_types);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for row in 0..input.row_count() {
        let mut chosen = Scalar::Null;
        for vector in &vectors {
            let value = vector.value(row);
            if !value.is_null() {
                chosen = value;
                break;
            }
        }
        let value = if chosen.is_null() || result_ty.value_type() == ValueType::Any {
            chosen
        } else {
            coerce_scalar(chosen.as_ref(), result_ty.value_type())?
        };
        builder.push(value.as_ref());
    }
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn eval_current_timestamp(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    check_arg_count("current_timestamp", args, 0)?;
    Ok(Arc::new(ValueVector::constant(
        Scalar::DateTime(ctx.now_micros()),
        ResolvedType::of(ValueType::DateTime),
        input.row_count(),
    )))
}

fn eval_current_date(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    check_arg_count("current_date", args, 0)?;
    const MICROS_PER_DAY: i64 = 86_400_000_000;
    let micros = ctx.now_micros();
    let midnight = micros - micros.rem_euclid(MICROS_PER_DAY);
    Ok(Arc::new(ValueVector::constant(
        Scalar::DateTime(midnight),
        ResolvedType::of(ValueType::DateTime),
        input.row_count(),
    )))
}

struct LambdaArg<'a> {
    slots: &'a [usize],
    body: &'a Expr,
}

fn lambda_arg<'a>(name: &str, args: &'a [Expr]) -> Result<LambdaArg<'a>> {
    match args.get(1) {
        Some(Expr::Lambda { slots, body, .. }) => Ok(LambdaArg { slots, body }),
        _ => Err(ErrorCode::BadArguments(format!(
            "{} expects a lambda as its second argument",
            name
        ))),
    }
}

/// Evaluate a lambda body for each element of each row's array, handing the
/// element to the lambda slot and the enclosing row to column references.
fn for_each_element<F>(
    name: &str,
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
    mut on_row: F,
) -> Result<()>
where
    F: FnMut(usize, Option<Vec<(Scalar, Scalar)>>) -> Result<()>,
{
    check_arg_count(name, args, 2)?;
    let lambda = lambda_arg(name, args)?;
    let slot = *lambda.slots.first().ok_or_else(|| {
        ErrorCode::BadArguments(format!("{} lambda carries no parameter slot", name))
    })?;
    let source = args[0].eval(input, ctx)?;
    for row in 0..input.row_count() {
        let value = source.value(row);
        match value {
            Scalar::Null => on_row(row, None)?,
            Scalar::Array(col) => {
                let single = input.select(&[row]);
                let mut pairs = Vec::with_capacity(col.len());
                for element in col.iter() {
                    let element = element.to_owned();
                    let ty = element.resolved_type();
                    ctx.set_lambda_slot(
                        slot,
                        Some(Arc::new(ValueVector::constant(element.clone(), ty, 1))),
                    );
                    let result = lambda.body.eval(&single, ctx)?;
                    pairs.push((element, result.value(0)));
                }
                on_row(row, Some(pairs))?;
            }
            other => {
                return Err(ErrorCode::IllegalDataType(format!(
                    "{} expects an Array input, got {}",
                    name,
                    other.value_type()
                )));
            }
        }
    }
    ctx.set_lambda_slot(slot, None);
    Ok(())
}

fn eval_map(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    let result_ty = ResolvedType::array(ResolvedType::any());
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for_each_element("map", args, input, ctx, |_, pairs| {
        match pairs {
            None => builder.push(Scalar::Null.as_ref()),
            Some(pairs) => {
                let mapped: Vec<Scalar> = pairs.into_iter().map(|(_, result)| result).collect();
                builder.push(Scalar::Array(Column::Any(mapped)).as_ref());
            }
        }
        Ok(())
    })?;
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn eval_filter(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    let result_ty = ResolvedType::array(ResolvedType::any());
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for_each_element("filter", args, input, ctx, |_, pairs| {
        match pairs {
            None => builder.push(Scalar::Null.as_ref()),
            Some(pairs) => {
                let kept: Vec<Scalar> = pairs
                    .into_iter()
                    .filter(|(_, result)| matches!(result, Scalar::Boolean(true)))
                    .map(|(element, _)| element)
                    .collect();
                builder.push(Scalar::Array(Column::Any(kept)).as_ref());
            }
        }
        Ok(())
    })?;
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}

fn eval_any(
    args: &[Expr],
    input: &TupleVector,
    ctx: &mut ExecutionContext,
) -> Result<Arc<ValueVector>> {
    let result_ty = ResolvedType::of(ValueType::Boolean);
    let mut builder = ColumnBuilder::with_capacity(&result_ty, input.row_count());
    for_each_element("any", args, input, ctx, |_, pairs| {
        match pairs {
            None => builder.push(Scalar::Null.as_ref()),
            Some(pairs) => {
                let matched = pairs
                    .iter()
                    .any(|(_, result)| matches!(result, Scalar::Boolean(true)));
                builder.push(Scalar::Boolean(matched).as_ref());
            }
        }
        Ok(())
    })?;
    Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
}
