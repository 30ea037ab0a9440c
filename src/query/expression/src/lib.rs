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

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::uninlined_format_args)]

pub mod aggregate;
mod block;
mod date_helper;
mod decimal;
mod evaluator;
mod expr;
mod fold;
mod function;
mod kernels;
mod schema;
mod types;
mod values;
mod vector;
mod visitor;

pub use crate::block::TupleVector;
pub use crate::date_helper::format_datetime_micros;
pub use crate::date_helper::format_datetime_offset;
pub use crate::date_helper::parse_datetime_micros;
pub use crate::date_helper::parse_datetime_offset;
pub use crate::date_helper::DatePart;
pub use crate::decimal::DecimalScalar;
pub use crate::evaluator::Evaluator;
pub use crate::expr::ArithmeticOp;
pub use crate::expr::ComparisonOp;
pub use crate::expr::Expr;
pub use crate::expr::LogicalOp;
pub use crate::expr::TemplatePart;
pub use crate::expr::UnaryOp;
pub use crate::expr::WhenClause;
pub use crate::function::ExecutionContext;
pub use crate::function::Function;
pub use crate::function::FunctionRegistry;
pub use crate::kernels::arithmetic::arith_scalars;
pub use crate::kernels::arithmetic::arithmetic_result_type;
pub use crate::kernels::cast::cast_scalar;
pub use crate::kernels::cast::check_cast_target;
pub use crate::kernels::comparison::coerce_scalar;
pub use crate::kernels::comparison::compare_scalars;
pub use crate::kernels::comparison::scalars_equal;
pub use crate::kernels::like::compile_like_pattern;
pub use crate::kernels::like::like_pattern_to_regex;
pub use crate::kernels::logic::kleene_and;
pub use crate::kernels::logic::kleene_or;
pub use crate::schema::Schema;
pub use crate::schema::SchemaColumn;
pub use crate::schema::SchemaRef;
pub use crate::schema::TableSourceReference;
pub use crate::types::ResolvedType;
pub use crate::types::ValueType;
pub use crate::values::Column;
pub use crate::values::ColumnBuilder;
pub use crate::values::ColumnIterator;
pub use crate::values::DateTimeOffsetScalar;
pub use crate::values::ObjectValue;
pub use crate::values::Scalar;
pub use crate::values::ScalarRef;
pub use crate::vector::ComputedVector;
pub use crate::vector::RowFn;
pub use crate::vector::ValueVector;
pub use crate::visitor::clone_with_replacement;
pub use crate::visitor::collect_column_refs;
pub use crate::visitor::ExprVisitor;
pub use crate::visitor::Recursion;
