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

use itertools::Itertools;

use crate::schema::Schema;
use crate::schema::SchemaRef;
use crate::values::ObjectValue;
use crate::vector::ComputedVector;
use crate::vector::ValueVector;

/// A lightweight columnar container: a schema plus one value vector per
/// column, all sized to `num_rows`. Produced by one operator, consumed by the
/// next; never shared mutably.
#[derive(Debug, Clone)]
pub struct TupleVector {
    schema: SchemaRef,
    columns: Vec<Arc<ValueVector>>,
    num_rows: usize,
}

impl TupleVector {
    pub fn new(schema: SchemaRef, columns: Vec<Arc<ValueVector>>, num_rows: usize) -> Self {
        debug_assert_eq!(schema.num_columns(), columns.len());
        debug_assert!(
            columns
                .iter()
                .map(|column| column.len())
                .chain(std::iter::once(num_rows))
                .all_equal()
        );
        Self {
            schema,
            columns,
            num_rows,
        }
    }

    /// A batch with no columns, only a row count. Used to drive evaluation of
    /// input-independent expressions (constant folding).
    pub fn empty(num_rows: usize) -> Self {
        Self {
            schema: Arc::new(Schema::empty()),
            columns: vec![],
            num_rows,
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, ordinal: usize) -> &Arc<ValueVector> {
        &self.columns[ordinal]
    }

    pub fn columns(&self) -> &[Arc<ValueVector>] {
        &self.columns
    }

    /// A lazy row-selection view: column `c`, row `i` of the result reads
    /// column `c`, row `rows[i]` of `self`. Nothing is copied.
    pub fn select(&self, rows: &[usize]) -> TupleVector {
        let rows = Arc::new(rows.to_vec());
        let columns = self
            .columns
            .iter()
            .map(|column| {
                let rows = rows.clone();
                Arc::new(ValueVector::Computed(ComputedVector::new(
                    column.data_type().clone(),
                    rows.len(),
                    vec![column.clone()],
                    Arc::new(move |sources, row| sources[0].value(rows[row])),
                )))
            })
            .collect();
        TupleVector {
            schema: self.schema.clone(),
            columns,
            num_rows: rows.len(),
        }
    }

    /// Single-row object view, used by `Table[int]` subscripts.
    pub fn row_object(&self, row: usize) -> ObjectValue {
        let values = self
            .columns
            .iter()
            .map(|column| column.value(row))
            .collect();
        ObjectValue::new(self.schema.clone(), values)
    }
}

impl PartialEq for TupleVector {
    fn eq(&self, other: &Self) -> bool {
        if self.num_rows != other.num_rows || self.schema != other.schema {
            return false;
        }
        self.columns
            .iter()
            .zip(other.columns.iter())
            .all(|(a, b)| (0..self.num_rows).all(|row| a.value(row) == b.value(row)))
    }
}

impl Eq for TupleVector {}
