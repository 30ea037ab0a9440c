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

use crate::block::TupleVector;
use crate::date_helper;
use crate::expr::Expr;
use crate::expr::TemplatePart;
use crate::expr::UnaryOp;
use crate::expr::WhenClause;
use crate::function::ExecutionContext;
use crate::function::FunctionRegistry;
use crate::kernels::arithmetic::eval_arithmetic;
use crate::kernels::arithmetic::eval_negate;
use crate::kernels::cast::eval_cast;
use crate::kernels::comparison::coerce_scalar;
use crate::kernels::comparison::eval_comparison;
use crate::kernels::comparison::scalars_equal;
use crate::kernels::like::eval_like;
use crate::kernels::logic::eval_logical;
use crate::kernels::logic::eval_not;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::Column;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::vector::ComputedVector;
use crate::vector::ValueVector;

/// Walks an expression tree against one input batch. Plain call/return, no
/// suspension points; concurrency is the caller's concern.
pub struct Evaluator<'a> {
    input: &'a TupleVector,
    ctx: &'a mut ExecutionContext,
}

impl Expr {
    pub fn eval(
        &self,
        input: &TupleVector,
        ctx: &mut ExecutionContext,
    ) -> Result<Arc<ValueVector>> {
        Evaluator::new(input, ctx).run(self)
    }
}

fn broadcast(vector: Arc<ValueVector>, num_rows: usize) -> Arc<ValueVector> {
    if vector.len() == num_rows {
        vector
    } else if vector.is_empty() {
        Arc::new(ValueVector::null(num_rows))
    } else {
        let ty = vector.data_type().clone();
        Arc::new(ValueVector::constant(vector.value(0), ty, num_rows))
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(input: &'a TupleVector, ctx: &'a mut ExecutionContext) -> Self {
        Self { input, ctx }
    }

    pub fn run(&mut self, expr: &Expr) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        match expr {
            Expr::Literal { value, ty } => Ok(Arc::new(ValueVector::constant(
                value.clone(),
                ty.clone(),
                num_rows,
            ))),
            Expr::ColumnRef {
                name,
                table_source,
                ordinal,
                ..
            } => {
                let ordinal = match ordinal {
                    Some(ordinal) => {
                        if *ordinal >= self.input.num_columns() {
                            return Err(ErrorCode::LogicalError(format!(
                                "column ordinal {} out of range for batch of {} columns",
                                ordinal,
                                self.input.num_columns()
                            )));
                        }
                        *ordinal
                    }
                    None => match table_source {
                        Some(ts) => self.input.schema().index_of_in_source(name, ts.id)?,
                        None => self.input.schema().index_of(name)?,
                    },
                };
                Ok(self.input.column(ordinal).clone())
            }
            Expr::Variable { name } => match self.ctx.variable(name) {
                Some(vector) => Ok(broadcast(vector, num_rows)),
                None => Ok(Arc::new(ValueVector::null(num_rows))),
            },
            Expr::Unary {
                op: UnaryOp::Negate,
                expr,
            } => {
                let input = self.run(expr)?;
                eval_negate(&input, num_rows)
            }
            Expr::Arithmetic { op, left, right } => {
                let lhs = self.run(left)?;
                let rhs = self.run(right)?;
                eval_arithmetic(*op, &lhs, &rhs, num_rows)
            }
            Expr::Comparison { op, left, right } => {
                let lhs = self.run(left)?;
                let rhs = self.run(right)?;
                eval_comparison(*op, &lhs, &rhs, num_rows)
            }
            Expr::Logical { op, left, right } => {
                let lhs = self.run(left)?;
                let rhs = self.run(right)?;
                eval_logical(*op, &lhs, &rhs, num_rows)
            }
            Expr::Not { expr } => {
                let input = self.run(expr)?;
                eval_not(&input, num_rows)
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let input = self.run(expr)?;
                let pattern = self.run(pattern)?;
                eval_like(&input, &pattern, *negated, num_rows)
            }
            Expr::In {
                expr,
                args,
                negated,
            } => self.run_in(expr, args, *negated),
            Expr::NullPredicate { expr, negated } => {
                let input = self.run(expr)?;
                let negated = *negated;
                Ok(Arc::new(ValueVector::Computed(ComputedVector::new(
                    ResolvedType::of(ValueType::Boolean),
                    num_rows,
                    vec![input],
                    Arc::new(move |sources, row| {
                        Scalar::Boolean(sources[0].is_null(row) != negated)
                    }),
                ))))
            }
            Expr::Case {
                when_clauses,
                else_expr,
            } => self.run_case(expr, when_clauses, else_expr.as_deref()),
            Expr::Cast { expr, target } => {
                let input = self.run(expr)?;
                eval_cast(&input, target, num_rows)
            }
            Expr::DateAdd { part, number, expr } => {
                let number = self.run(number)?;
                let input = self.run(expr)?;
                self.run_date_add(*part, &number, &input)
            }
            Expr::DatePart { part, expr } => {
                let input = self.run(expr)?;
                self.run_date_part(*part, &input)
            }
            Expr::FunctionCall { name, args } => {
                let function = FunctionRegistry::instance().get(name).ok_or_else(|| {
                    ErrorCode::UnknownFunction(format!("unresolved function: {}", name))
                })?;
                (function.eval)(args, self.input, self.ctx)
            }
            Expr::Lambda { .. } => Err(ErrorCode::LogicalError(
                "lambda expression cannot be evaluated directly",
            )),
            Expr::LambdaParam { name, slot } => match self.ctx.lambda_slot(*slot) {
                Some(vector) => Ok(broadcast(vector, num_rows)),
                None => Err(ErrorCode::LogicalError(format!(
                    "unbound lambda parameter: {}",
                    name
                ))),
            },
            Expr::Dereference {
                expr: source,
                name,
                ordinal,
            } => {
                let result_ty = expr.data_type();
                let input = self.run(source)?;
                self.run_dereference(&input, name, *ordinal, result_ty)
            }
            Expr::Subscript { expr, index } => {
                let container = self.run(expr)?;
                let index = self.run(index)?;
                self.run_subscript(&container, &index)
            }
            Expr::TemplateString { parts } => self.run_template(parts),
            Expr::Assignment { name, expr } => {
                let value = self.run(expr)?;
                self.ctx.set_variable(name, value.clone());
                Ok(value)
            }
        }
    }

    fn run_in(&mut self, expr: &Expr, args: &[Expr], negated: bool) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let value = self.run(expr)?;
        let arg_vectors = args
            .iter()
            .map(|arg| self.run(arg))
            .collect::<Result<Vec<_>>>()?;
        let result_ty = ResolvedType::of(ValueType::Boolean);
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        for row in 0..num_rows {
            let lhs = value.value(row);
            if lhs.is_null() {
                builder.push(Scalar::Null.as_ref());
                continue;
            }
            let mut matched = false;
            let mut saw_non_null = false;
            for arg in &arg_vectors {
                let rhs = arg.value(row);
                if rhs.is_null() {
                    continue;
                }
                saw_non_null = true;
                if scalars_equal(lhs.as_ref(), rhs.as_ref())? == Some(true) {
                    matched = true;
                    break;
                }
            }
            let result = if matched {
                Scalar::Boolean(!negated)
            } else if saw_non_null {
                Scalar::Boolean(negated)
            } else {
                // nothing but nulls to compare against
                Scalar::Null
            };
            builder.push(result.as_ref());
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }

    /// Rows are partitioned: each WHEN condition only sees rows no earlier
    /// clause matched, each THEN only sees the rows its condition matched,
    /// and ELSE only the rows nothing matched.
    fn run_case(
        &mut self,
        case: &Expr,
        when_clauses: &[WhenClause],
        else_expr: Option<&Expr>,
    ) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let result_ty = case.data_type();
        let mut results: Vec<Option<Scalar>> = vec![None; num_rows];
        let mut remaining: Vec<usize> = (0..num_rows).collect();
        for clause in when_clauses {
            if remaining.is_empty() {
                break;
            }
            let sub = self.input.select(&remaining);
            let condition = Evaluator::new(&sub, self.ctx).run(&clause.condition)?;
            let mut matched = Vec::new();
            let mut still_unmatched = Vec::new();
            for (k, &row) in remaining.iter().enumerate() {
                if matches!(condition.value(k), Scalar::Boolean(true)) {
                    matched.push(row);
                } else {
                    still_unmatched.push(row);
                }
            }
            if !matched.is_empty() {
                let sub = self.input.select(&matched);
                let values = Evaluator::new(&sub, self.ctx).run(&clause.result)?;
                for (k, &row) in matched.iter().enumerate() {
                    results[row] = Some(values.value(k));
                }
            }
            remaining = still_unmatched;
        }
        if let Some(else_expr) = else_expr {
            if !remaining.is_empty() {
                let sub = self.input.select(&remaining);
                let values = Evaluator::new(&sub, self.ctx).run(else_expr)?;
                for (k, &row) in remaining.iter().enumerate() {
                    results[row] = Some(values.value(k));
                }
            }
        }
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        let target = result_ty.value_type();
        for value in results {
            match value {
                None | Some(Scalar::Null) => builder.push(Scalar::Null.as_ref()),
                Some(value) => {
                    let value = if target == ValueType::Any || value.value_type() == target {
                        value
                    } else {
                        coerce_scalar(value.as_ref(), target)?
                    };
                    builder.push(value.as_ref());
                }
            }
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }

    fn run_date_add(
        &mut self,
        part: date_helper::DatePart,
        number: &Arc<ValueVector>,
        input: &Arc<ValueVector>,
    ) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let result_ty = match input.data_type().value_type() {
            ValueType::DateTimeOffset => ResolvedType::of(ValueType::DateTimeOffset),
            ValueType::DateTime => ResolvedType::of(ValueType::DateTime),
            _ => ResolvedType::any(),
        };
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        for row in 0..num_rows {
            let value = input.value(row);
            let amount = number.value(row);
            if value.is_null() || amount.is_null() {
                builder.push(Scalar::Null.as_ref());
                continue;
            }
            let amount = match coerce_scalar(amount.as_ref(), ValueType::Long)? {
                Scalar::Long(v) => v,
                other => unreachable!("long coercion produced {:?}", other),
            };
            let result = match value {
                Scalar::DateTime(micros) => {
                    Scalar::DateTime(date_helper::add_part(part, amount, micros)?)
                }
                Scalar::DateTimeOffset(dto) => {
                    Scalar::DateTimeOffset(crate::values::DateTimeOffsetScalar {
                        micros: date_helper::add_part(part, amount, dto.micros)?,
                        offset_seconds: dto.offset_seconds,
                    })
                }
                Scalar::String(text) => {
                    let micros = date_helper::parse_datetime_micros(&text)?;
                    Scalar::DateTime(date_helper::add_part(part, amount, micros)?)
                }
                other => {
                    return Err(ErrorCode::IllegalDataType(format!(
                        "DATEADD expects a datetime, got {}",
                        other.value_type()
                    )));
                }
            };
            builder.push(result.as_ref());
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }

    fn run_date_part(
        &mut self,
        part: date_helper::DatePart,
        input: &Arc<ValueVector>,
    ) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let result_ty = ResolvedType::of(ValueType::Int);
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        for row in 0..num_rows {
            let value = input.value(row);
            let micros = match value {
                Scalar::Null => {
                    builder.push(Scalar::Null.as_ref());
                    continue;
                }
                Scalar::DateTime(micros) => micros,
                // parts of an offset value are extracted on its local clock
                Scalar::DateTimeOffset(dto) => dto.micros + (dto.offset_seconds as i64) * 1_000_000,
                Scalar::String(text) => date_helper::parse_datetime_micros(&text)?,
                other => {
                    return Err(ErrorCode::IllegalDataType(format!(
                        "DATEPART expects a datetime, got {}",
                        other.value_type()
                    )));
                }
            };
            let extracted = date_helper::extract_part(part, micros)?;
            builder.push(Scalar::Int(extracted as i32).as_ref());
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }

    fn run_dereference(
        &mut self,
        input: &Arc<ValueVector>,
        name: &str,
        ordinal: Option<usize>,
        result_ty: ResolvedType,
    ) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        for row in 0..num_rows {
            let value = input.value(row);
            let member = match value {
                Scalar::Null => Scalar::Null,
                Scalar::Object(obj) => match ordinal {
                    Some(ordinal) if ordinal < obj.values().len() => obj.value(ordinal).clone(),
                    _ => obj.get(name).cloned().ok_or_else(|| {
                        ErrorCode::UnknownColumn(format!("Unknown column: {}", name))
                    })?,
                },
                other => {
                    return Err(ErrorCode::IllegalDataType(format!(
                        "cannot dereference '{}' from {}",
                        name,
                        other.value_type()
                    )));
                }
            };
            builder.push(member.as_ref());
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }

    fn run_subscript(
        &mut self,
        container: &Arc<ValueVector>,
        index: &Arc<ValueVector>,
    ) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let result_ty = match container.data_type().value_type() {
            ValueType::Array => container.data_type().sub_type(),
            ValueType::String => ResolvedType::of(ValueType::String),
            _ => ResolvedType::any(),
        };
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        for row in 0..num_rows {
            let value = container.value(row);
            let key = index.value(row);
            if value.is_null() || key.is_null() {
                builder.push(Scalar::Null.as_ref());
                continue;
            }
            let result = match value {
                Scalar::Array(col) => {
                    let idx = long_index(&key)?;
                    match resolve_index(idx, col.len()) {
                        Some(resolved) => col.index(resolved).to_owned(),
                        None => Scalar::Null,
                    }
                }
                Scalar::String(text) => {
                    let idx = long_index(&key)?;
                    let chars: Vec<char> = text.chars().collect();
                    match resolve_index(idx, chars.len()) {
                        Some(resolved) => Scalar::String(chars[resolved].to_string()),
                        None => Scalar::Null,
                    }
                }
                Scalar::Table(table) => match key {
                    Scalar::String(name) => {
                        let ordinal = table.schema().index_of(&name)?;
                        let column = table.column(ordinal);
                        let values = (0..table.row_count())
                            .map(|r| column.value(r))
                            .collect::<Vec<_>>();
                        Scalar::Array(Column::Any(values))
                    }
                    key => {
                        let idx = long_index(&key)?;
                        match resolve_index(idx, table.row_count()) {
                            Some(resolved) => Scalar::Object(table.row_object(resolved)),
                            None => Scalar::Null,
                        }
                    }
                },
                other => {
                    return Err(ErrorCode::IllegalDataType(format!(
                        "cannot subscript {}",
                        other.value_type()
                    )));
                }
            };
            builder.push(result.as_ref());
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }

    fn run_template(&mut self, parts: &[TemplatePart]) -> Result<Arc<ValueVector>> {
        let num_rows = self.input.row_count();
        let vectors = parts
            .iter()
            .map(|part| match part {
                TemplatePart::Text(_) => Ok(None),
                TemplatePart::Expr(expr) => self.run(expr).map(Some),
            })
            .collect::<Result<Vec<_>>>()?;
        let result_ty = ResolvedType::of(ValueType::String);
        let mut builder = ColumnBuilder::with_capacity(&result_ty, num_rows);
        for row in 0..num_rows {
            let mut out = String::new();
            for (part, vector) in parts.iter().zip(vectors.iter()) {
                match (part, vector) {
                    (TemplatePart::Text(text), _) => out.push_str(text),
                    (TemplatePart::Expr(_), Some(vector)) => {
                        let value = vector.value(row);
                        // null interpolations render empty
                        if !value.is_null() {
                            match coerce_scalar(value.as_ref(), ValueType::String)? {
                                Scalar::String(text) => out.push_str(&text),
                                other => unreachable!("string coercion produced {:?}", other),
                            }
                        }
                    }
                    (TemplatePart::Expr(_), None) => unreachable!("template part not evaluated"),
                }
            }
            builder.push(Scalar::String(out).as_ref());
        }
        Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
    }
}

fn long_index(key: &Scalar) -> Result<i64> {
    match coerce_scalar(key.as_ref(), ValueType::Long)? {
        Scalar::Long(v) => Ok(v),
        other => unreachable!("long coercion produced {:?}", other),
    }
}

/// Negative indexes count from the end; out of bounds resolves to nothing
/// (null, not an error).
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}
