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

use tessera_common_expression::ColumnBuilder;
use tessera_common_expression::ExecutionContext;
use tessera_common_expression::Expr;
use tessera_common_expression::ResolvedType;
use tessera_common_expression::Scalar;
use tessera_common_expression::Schema;
use tessera_common_expression::SchemaColumn;
use tessera_common_expression::TupleVector;
use tessera_common_expression::ValueType;
use tessera_common_expression::ValueVector;

mod evaluator;
mod fold;
mod logic;

pub fn vector_of(ty: ValueType, values: Vec<Scalar>) -> Arc<ValueVector> {
    let ty = ResolvedType::of(ty);
    let mut builder = ColumnBuilder::with_capacity(&ty, values.len());
    for value in &values {
        builder.push(value.as_ref());
    }
    Arc::new(ValueVector::with_type(builder.build(), ty))
}

pub fn batch_of(columns: Vec<(&str, Arc<ValueVector>)>) -> TupleVector {
    let num_rows = columns.first().map(|(_, col)| col.len()).unwrap_or(0);
    let schema = Schema::new(
        columns
            .iter()
            .map(|(name, col)| SchemaColumn::new(*name, col.data_type().clone()))
            .collect(),
    );
    let vectors = columns.into_iter().map(|(_, col)| col).collect();
    TupleVector::new(Arc::new(schema), vectors, num_rows)
}

pub fn eval(expr: &Expr, input: &TupleVector) -> Arc<ValueVector> {
    let mut ctx = ExecutionContext::default();
    expr.eval(input, &mut ctx).unwrap()
}

pub fn eval_values(expr: &Expr, input: &TupleVector) -> Vec<Scalar> {
    eval(expr, input).to_scalars()
}
