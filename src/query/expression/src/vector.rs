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

use std::fmt;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::sync::Arc;

use crate::decimal::DecimalScalar;
use crate::values::Column;
use crate::values::ColumnBuilder;
use crate::values::DateTimeOffsetScalar;
use crate::values::ObjectValue;
use crate::values::Scalar;
use crate::block::TupleVector;
use crate::types::ResolvedType;

/// Per-row compute function of a lazy vector. Pure; must not fail.
pub type RowFn = Arc<dyn Fn(&[Arc<ValueVector>], usize) -> Scalar + Send + Sync>;

/// A lazy vector: holds its source vectors plus a pure per-row compute
/// closure, recomputing on every access. Used for arithmetic/comparison
/// results and row-selection views to avoid materializing intermediates.
/// Sources are shared read-only; the `Arc`s keep them alive.
#[derive(Clone)]
pub struct ComputedVector {
    ty: ResolvedType,
    len: usize,
    sources: Vec<Arc<ValueVector>>,
    row_fn: RowFn,
}

impl ComputedVector {
    pub fn new(ty: ResolvedType, len: usize, sources: Vec<Arc<ValueVector>>, row_fn: RowFn) -> Self {
        Self {
            ty,
            len,
            sources,
            row_fn,
        }
    }

    fn value(&self, row: usize) -> Scalar {
        (self.row_fn)(&self.sources, row)
    }
}

impl Debug for ComputedVector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedVector")
            .field("ty", &self.ty)
            .field("len", &self.len)
            .field("sources", &self.sources.len())
            .finish()
    }
}

/// A batch column: `len` values of a single resolved type, each row
/// independently nullable. Literal broadcast, builder-backed or lazily
/// computed.
#[derive(Debug, Clone)]
pub enum ValueVector {
    Const {
        scalar: Scalar,
        ty: ResolvedType,
        len: usize,
    },
    Materialized {
        column: Column,
        ty: ResolvedType,
    },
    Computed(ComputedVector),
}

impl ValueVector {
    pub fn constant(scalar: Scalar, ty: ResolvedType, len: usize) -> Self {
        ValueVector::Const { scalar, ty, len }
    }

    pub fn null(len: usize) -> Self {
        ValueVector::Const {
            scalar: Scalar::Null,
            ty: ResolvedType::any(),
            len,
        }
    }

    pub fn from_column(column: Column) -> Self {
        let ty = column.data_type();
        ValueVector::Materialized { column, ty }
    }

    pub fn with_type(column: Column, ty: ResolvedType) -> Self {
        ValueVector::Materialized { column, ty }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueVector::Const { len, .. } => *len,
            ValueVector::Materialized { column, .. } => column.len(),
            ValueVector::Computed(computed) => computed.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> &ResolvedType {
        match self {
            ValueVector::Const { ty, .. } => ty,
            ValueVector::Materialized { ty, .. } => ty,
            ValueVector::Computed(computed) => &computed.ty,
        }
    }

    /// The universal accessor; the only one valid on `Any` typed vectors.
    pub fn value(&self, row: usize) -> Scalar {
        match self {
            ValueVector::Const { scalar, .. } => scalar.clone(),
            ValueVector::Materialized { column, .. } => column.index(row).to_owned(),
            ValueVector::Computed(computed) => computed.value(row),
        }
    }

    pub fn is_null(&self, row: usize) -> bool {
        match self {
            ValueVector::Const { scalar, .. } => scalar.is_null(),
            ValueVector::Materialized { column, .. } => column.index(row).is_null(),
            ValueVector::Computed(computed) => computed.value(row).is_null(),
        }
    }

    pub fn get_bool(&self, row: usize) -> bool {
        match self.value(row) {
            Scalar::Boolean(v) => v,
            other => unreachable!("called get_bool on {:?}", other),
        }
    }

    pub fn get_int(&self, row: usize) -> i32 {
        match self.value(row) {
            Scalar::Int(v) => v,
            other => unreachable!("called get_int on {:?}", other),
        }
    }

    pub fn get_long(&self, row: usize) -> i64 {
        match self.value(row) {
            Scalar::Long(v) => v,
            other => unreachable!("called get_long on {:?}", other),
        }
    }

    pub fn get_float(&self, row: usize) -> f32 {
        match self.value(row) {
            Scalar::Float(v) => v.into_inner(),
            other => unreachable!("called get_float on {:?}", other),
        }
    }

    pub fn get_double(&self, row: usize) -> f64 {
        match self.value(row) {
            Scalar::Double(v) => v.into_inner(),
            other => unreachable!("called get_double on {:?}", other),
        }
    }

    pub fn get_decimal(&self, row: usize) -> DecimalScalar {
        match self.value(row) {
            Scalar::Decimal(v) => v,
            other => unreachable!("called get_decimal on {:?}", other),
        }
    }

    pub fn get_string(&self, row: usize) -> String {
        match self.value(row) {
            Scalar::String(v) => v,
            other => unreachable!("called get_string on {:?}", other),
        }
    }

    pub fn get_datetime(&self, row: usize) -> i64 {
        match self.value(row) {
            Scalar::DateTime(v) => v,
            other => unreachable!("called get_datetime on {:?}", other),
        }
    }

    pub fn get_datetime_offset(&self, row: usize) -> DateTimeOffsetScalar {
        match self.value(row) {
            Scalar::DateTimeOffset(v) => v,
            other => unreachable!("called get_datetime_offset on {:?}", other),
        }
    }

    pub fn get_array(&self, row: usize) -> Column {
        match self.value(row) {
            Scalar::Array(v) => v,
            other => unreachable!("called get_array on {:?}", other),
        }
    }

    pub fn get_object(&self, row: usize) -> ObjectValue {
        match self.value(row) {
            Scalar::Object(v) => v,
            other => unreachable!("called get_object on {:?}", other),
        }
    }

    pub fn get_table(&self, row: usize) -> TupleVector {
        match self.value(row) {
            Scalar::Table(v) => v,
            other => unreachable!("called get_table on {:?}", other),
        }
    }

    /// Copy into a builder-backed vector, forcing any lazy computation once.
    pub fn materialize(&self) -> ValueVector {
        match self {
            ValueVector::Materialized { .. } => self.clone(),
            other => {
                let ty = other.data_type().clone();
                let mut builder = ColumnBuilder::with_capacity(&ty, other.len());
                for row in 0..other.len() {
                    let value = other.value(row);
                    builder.push(value.as_ref());
                }
                ValueVector::Materialized {
                    column: builder.build(),
                    ty,
                }
            }
        }
    }

    /// Test/debug helper: collect every row into owned scalars.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        (0..self.len()).map(|row| self.value(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    #[test]
    fn test_const_vector() {
        let vector = ValueVector::constant(Scalar::Int(7), ResolvedType::of(ValueType::Int), 3);
        assert_eq!(vector.len(), 3);
        assert_eq!(vector.get_int(2), 7);
        assert!(!vector.is_null(0));
    }

    #[test]
    fn test_computed_vector_recomputes_per_access() {
        let source = Arc::new(ValueVector::from_column(Column::Int(vec![1, 2, 3])));
        let computed = ValueVector::Computed(ComputedVector::new(
            ResolvedType::of(ValueType::Int),
            3,
            vec![source],
            Arc::new(|sources, row| match sources[0].value(row) {
                Scalar::Int(v) => Scalar::Int(v * 10),
                _ => Scalar::Null,
            }),
        ));
        assert_eq!(computed.get_int(0), 10);
        assert_eq!(computed.get_int(2), 30);
        let materialized = computed.materialize();
        assert_eq!(materialized.to_scalars(), computed.to_scalars());
    }
}
