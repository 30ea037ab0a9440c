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

use crate::expr::Expr;
use crate::function::ExecutionContext;
use crate::types::ResolvedType;
use crate::values::Column;
use crate::values::ColumnBuilder;
use crate::values::Scalar;
use crate::vector::ValueVector;

/// Wraps an ordinary per-row expression so it can run once per group during
/// aggregation. The results buffer is indexed by group id and grows to the
/// largest id seen; groups that never matched a row stay as holes and combine
/// as null.
///
/// This is the one stateful expression object in the crate; a fresh wrapper
/// is built per aggregation operator instance.
pub struct AggregateWrapperExpression {
    expr: Expr,
    singleton: bool,
    results: Vec<Option<Arc<ValueVector>>>,
}

impl AggregateWrapperExpression {
    /// `singleton` collapses each group to its first result value; otherwise
    /// `combine` yields the whole per-group result set as an array per group.
    pub fn new(expr: Expr, singleton: bool) -> Self {
        Self {
            expr,
            singleton,
            results: Vec::new(),
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Consume one batch of groups: `group_ids` carries each group's id,
    /// `group_batches` the group's rows as a table value. The wrapped
    /// expression evaluates against each group's sub-batch.
    pub fn append_group(
        &mut self,
        group_ids: &ValueVector,
        group_batches: &ValueVector,
        ctx: &mut ExecutionContext,
    ) -> Result<()> {
        if group_ids.len() != group_batches.len() {
            return Err(ErrorCode::LogicalError(format!(
                "group id and group batch vectors differ in size: {} vs {}",
                group_ids.len(),
                group_batches.len()
            )));
        }
        for row in 0..group_ids.len() {
            if group_ids.is_null(row) {
                continue;
            }
            let group_id = group_ids.get_int(row) as usize;
            let batch = group_batches.get_table(row);
            if batch.row_count() == 0 {
                // empty groups leave a hole
                continue;
            }
            let result = self.expr.eval(&batch, ctx)?;
            if self.results.len() <= group_id {
                self.results.resize(group_id + 1, None);
            }
            self.results[group_id] = Some(result);
        }
        Ok(())
    }

    /// Produce one value per group id seen so far, then reset.
    pub fn combine(&mut self, _ctx: &mut ExecutionContext) -> Result<Arc<ValueVector>> {
        let results = std::mem::take(&mut self.results);
        if self.singleton {
            let result_ty = self.expr.data_type();
            let mut builder = ColumnBuilder::with_capacity(&result_ty, results.len());
            for group in &results {
                match group {
                    Some(vector) if !vector.is_empty() => {
                        builder.push(vector.value(0).as_ref());
                    }
                    _ => builder.push(Scalar::Null.as_ref()),
                }
            }
            Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
        } else {
            let result_ty = ResolvedType::array(self.expr.data_type());
            let mut builder =
                ColumnBuilder::with_capacity(&ResolvedType::array(ResolvedType::any()), results.len());
            for group in &results {
                match group {
                    Some(vector) => {
                        let values = vector.to_scalars();
                        builder.push(Scalar::Array(Column::Any(values)).as_ref());
                    }
                    None => builder.push(Scalar::Null.as_ref()),
                }
            }
            Ok(Arc::new(ValueVector::with_type(builder.build(), result_ty)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::TupleVector;
    use crate::schema::Schema;
    use crate::schema::SchemaColumn;
    use crate::types::ValueType;

    fn group_table(values: Vec<i32>) -> Scalar {
        let schema = Arc::new(Schema::new(vec![SchemaColumn::new(
            "v",
            ResolvedType::of(ValueType::Int),
        )]));
        let column = Arc::new(ValueVector::from_column(Column::Int(values.clone())));
        Scalar::Table(TupleVector::new(schema, vec![column], values.len()))
    }

    #[test]
    fn test_append_and_combine_singleton() {
        // groups 0 and 2 populated, group 1 is a hole
        let group_ids = ValueVector::from_column(Column::Int(vec![0, 2]));
        let batches = ValueVector::from_column(Column::Any(vec![
            group_table(vec![7, 7]),
            group_table(vec![9]),
        ]));
        let mut ctx = ExecutionContext::default();
        let mut wrapper = AggregateWrapperExpression::new(Expr::column("v"), true);
        wrapper.append_group(&group_ids, &batches, &mut ctx).unwrap();
        let combined = wrapper.combine(&mut ctx).unwrap();
        assert_eq!(combined.len(), 3);
        assert_eq!(combined.value(0), Scalar::Int(7));
        assert_eq!(combined.value(1), Scalar::Null);
        assert_eq!(combined.value(2), Scalar::Int(9));
    }

    #[test]
    fn test_combine_whole_group_as_array() {
        let group_ids = ValueVector::from_column(Column::Int(vec![0]));
        let batches =
            ValueVector::from_column(Column::Any(vec![group_table(vec![1, 2, 3])]));
        let mut ctx = ExecutionContext::default();
        let mut wrapper = AggregateWrapperExpression::new(Expr::column("v"), false);
        wrapper.append_group(&group_ids, &batches, &mut ctx).unwrap();
        let combined = wrapper.combine(&mut ctx).unwrap();
        assert_eq!(combined.len(), 1);
        match combined.value(0) {
            Scalar::Array(col) => {
                assert_eq!(col.len(), 3);
                assert_eq!(col.index(1), crate::values::ScalarRef::Int(2));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_group_is_skipped() {
        let group_ids = ValueVector::from_column(Column::Int(vec![0]));
        let batches = ValueVector::from_column(Column::Any(vec![group_table(vec![])]));
        let mut ctx = ExecutionContext::default();
        let mut wrapper = AggregateWrapperExpression::new(Expr::column("v"), true);
        wrapper.append_group(&group_ids, &batches, &mut ctx).unwrap();
        let combined = wrapper.combine(&mut ctx).unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined.value(0), Scalar::Null);
    }
}
