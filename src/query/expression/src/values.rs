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
use std::fmt::Display;
use std::fmt::Formatter;
use std::hash::Hash;
use std::hash::Hasher;
use std::ops::Range;

use enum_as_inner::EnumAsInner;
use ordered_float::OrderedFloat;

use crate::block::TupleVector;
use crate::date_helper;
use crate::decimal::DecimalScalar;
use crate::schema::SchemaRef;
use crate::types::ResolvedType;
use crate::types::ValueType;

/// An instant plus the fixed offset it was written with. Comparison and
/// equality go by the instant alone; the offset is presentation.
#[derive(Debug, Clone, Copy)]
pub struct DateTimeOffsetScalar {
    pub micros: i64,
    pub offset_seconds: i32,
}

impl PartialEq for DateTimeOffsetScalar {
    fn eq(&self, other: &Self) -> bool {
        self.micros == other.micros
    }
}

impl Eq for DateTimeOffsetScalar {}

impl PartialOrd for DateTimeOffsetScalar {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateTimeOffsetScalar {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.micros.cmp(&other.micros)
    }
}

impl Hash for DateTimeOffsetScalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.micros.hash(state);
    }
}

/// A single-row view over named values, carrying the schema that names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectValue {
    schema: SchemaRef,
    values: Vec<Scalar>,
}

impl ObjectValue {
    pub fn new(schema: SchemaRef, values: Vec<Scalar>) -> Self {
        debug_assert_eq!(schema.num_columns(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn value(&self, ordinal: usize) -> &Scalar {
        &self.values[ordinal]
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.schema
            .columns()
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))
            .map(|ordinal| &self.values[ordinal])
    }
}

#[derive(Debug, Clone, Default, EnumAsInner)]
pub enum Scalar {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Decimal(DecimalScalar),
    String(String),
    DateTime(i64),
    DateTimeOffset(DateTimeOffsetScalar),
    Array(Column),
    Object(ObjectValue),
    Table(TupleVector),
}

#[derive(Debug, Clone, Default, EnumAsInner)]
pub enum ScalarRef<'a> {
    #[default]
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Decimal(DecimalScalar),
    String(&'a str),
    DateTime(i64),
    DateTimeOffset(DateTimeOffsetScalar),
    Array(Column),
    Object(ObjectValue),
    Table(TupleVector),
}

impl Scalar {
    pub fn as_ref(&self) -> ScalarRef<'_> {
        match self {
            Scalar::Null => ScalarRef::Null,
            Scalar::Boolean(v) => ScalarRef::Boolean(*v),
            Scalar::Int(v) => ScalarRef::Int(*v),
            Scalar::Long(v) => ScalarRef::Long(*v),
            Scalar::Float(v) => ScalarRef::Float(*v),
            Scalar::Double(v) => ScalarRef::Double(*v),
            Scalar::Decimal(v) => ScalarRef::Decimal(*v),
            Scalar::String(v) => ScalarRef::String(v.as_str()),
            Scalar::DateTime(v) => ScalarRef::DateTime(*v),
            Scalar::DateTimeOffset(v) => ScalarRef::DateTimeOffset(*v),
            Scalar::Array(col) => ScalarRef::Array(col.clone()),
            Scalar::Object(obj) => ScalarRef::Object(obj.clone()),
            Scalar::Table(table) => ScalarRef::Table(table.clone()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.as_ref().value_type()
    }

    pub fn resolved_type(&self) -> ResolvedType {
        match self {
            Scalar::Null => ResolvedType::any(),
            Scalar::Array(col) => ResolvedType::array(col.data_type()),
            Scalar::Object(obj) => ResolvedType::object(obj.schema().clone()),
            Scalar::Table(table) => ResolvedType::table(table.schema().clone()),
            other => ResolvedType::of(other.value_type()),
        }
    }
}

impl<'a> ScalarRef<'a> {
    pub fn to_owned(&self) -> Scalar {
        match self {
            ScalarRef::Null => Scalar::Null,
            ScalarRef::Boolean(v) => Scalar::Boolean(*v),
            ScalarRef::Int(v) => Scalar::Int(*v),
            ScalarRef::Long(v) => Scalar::Long(*v),
            ScalarRef::Float(v) => Scalar::Float(*v),
            ScalarRef::Double(v) => Scalar::Double(*v),
            ScalarRef::Decimal(v) => Scalar::Decimal(*v),
            ScalarRef::String(v) => Scalar::String((*v).to_string()),
            ScalarRef::DateTime(v) => Scalar::DateTime(*v),
            ScalarRef::DateTimeOffset(v) => Scalar::DateTimeOffset(*v),
            ScalarRef::Array(col) => Scalar::Array(col.clone()),
            ScalarRef::Object(obj) => Scalar::Object(obj.clone()),
            ScalarRef::Table(table) => Scalar::Table(table.clone()),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ScalarRef::Null => ValueType::Any,
            ScalarRef::Boolean(_) => ValueType::Boolean,
            ScalarRef::Int(_) => ValueType::Int,
            ScalarRef::Long(_) => ValueType::Long,
            ScalarRef::Float(_) => ValueType::Float,
            ScalarRef::Double(_) => ValueType::Double,
            ScalarRef::Decimal(_) => ValueType::Decimal,
            ScalarRef::String(_) => ValueType::String,
            ScalarRef::DateTime(_) => ValueType::DateTime,
            ScalarRef::DateTimeOffset(_) => ValueType::DateTimeOffset,
            ScalarRef::Array(_) => ValueType::Array,
            ScalarRef::Object(_) => ValueType::Object,
            ScalarRef::Table(_) => ValueType::Table,
        }
    }
}

impl PartialEq for ScalarRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarRef::Null, ScalarRef::Null) => true,
            (ScalarRef::Boolean(a), ScalarRef::Boolean(b)) => a == b,
            (ScalarRef::Int(a), ScalarRef::Int(b)) => a == b,
            (ScalarRef::Long(a), ScalarRef::Long(b)) => a == b,
            (ScalarRef::Float(a), ScalarRef::Float(b)) => a == b,
            (ScalarRef::Double(a), ScalarRef::Double(b)) => a == b,
            (ScalarRef::Decimal(a), ScalarRef::Decimal(b)) => a == b,
            (ScalarRef::String(a), ScalarRef::String(b)) => a == b,
            (ScalarRef::DateTime(a), ScalarRef::DateTime(b)) => a == b,
            (ScalarRef::DateTimeOffset(a), ScalarRef::DateTimeOffset(b)) => a == b,
            (ScalarRef::Array(a), ScalarRef::Array(b)) => a == b,
            (ScalarRef::Object(a), ScalarRef::Object(b)) => a == b,
            (ScalarRef::Table(a), ScalarRef::Table(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarRef<'_> {}

impl Hash for ScalarRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ScalarRef::Null => state.write_u8(0),
            ScalarRef::Boolean(v) => {
                state.write_u8(1);
                v.hash(state);
            }
            ScalarRef::Int(v) => {
                state.write_u8(2);
                v.hash(state);
            }
            ScalarRef::Long(v) => {
                state.write_u8(3);
                v.hash(state);
            }
            ScalarRef::Float(v) => {
                state.write_u8(4);
                v.hash(state);
            }
            ScalarRef::Double(v) => {
                state.write_u8(5);
                v.hash(state);
            }
            ScalarRef::Decimal(v) => {
                state.write_u8(6);
                v.hash(state);
            }
            ScalarRef::String(v) => {
                state.write_u8(7);
                v.hash(state);
            }
            ScalarRef::DateTime(v) => {
                state.write_u8(8);
                v.hash(state);
            }
            ScalarRef::DateTimeOffset(v) => {
                state.write_u8(9);
                v.hash(state);
            }
            ScalarRef::Array(col) => {
                state.write_u8(10);
                state.write_usize(col.len());
                for i in 0..col.len() {
                    col.index(i).hash(state);
                }
            }
            ScalarRef::Object(obj) => {
                state.write_u8(11);
                for column in obj.schema().columns() {
                    column.name().hash(state);
                }
                for value in obj.values() {
                    value.hash(state);
                }
            }
            ScalarRef::Table(table) => {
                state.write_u8(12);
                state.write_usize(table.row_count());
                for column in table.columns() {
                    state.write_usize(column.len());
                    for row in 0..column.len() {
                        column.value(row).hash(state);
                    }
                }
            }
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().hash(state);
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Boolean(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Long(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(OrderedFloat(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Double(OrderedFloat(v))
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::String(v)
    }
}

impl Display for ScalarRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScalarRef::Null => write!(f, "NULL"),
            ScalarRef::Boolean(v) => write!(f, "{}", v),
            ScalarRef::Int(v) => write!(f, "{}", v),
            ScalarRef::Long(v) => write!(f, "{}", v),
            ScalarRef::Float(v) => write!(f, "{}", v),
            ScalarRef::Double(v) => write!(f, "{}", v),
            ScalarRef::Decimal(v) => write!(f, "{}", v),
            ScalarRef::String(v) => write!(f, "{}", v),
            ScalarRef::DateTime(v) => write!(f, "{}", date_helper::format_datetime_micros(*v)),
            ScalarRef::DateTimeOffset(v) => {
                write!(f, "{}", date_helper::format_datetime_offset(*v))
            }
            ScalarRef::Array(col) => {
                write!(f, "[")?;
                for i in 0..col.len() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", col.index(i))?;
                }
                write!(f, "]")
            }
            ScalarRef::Object(obj) => {
                write!(f, "{{")?;
                for (i, column) in obj.schema().columns().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", column.name(), obj.value(i).as_ref())?;
                }
                write!(f, "}}")
            }
            ScalarRef::Table(table) => {
                write!(f, "[")?;
                for row in 0..table.row_count() {
                    if row > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ScalarRef::Object(table.row_object(row)))?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// A materialized typed column of values.
#[derive(Debug, Clone, EnumAsInner)]
pub enum Column {
    Boolean(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Decimal(Vec<DecimalScalar>),
    String { data: Vec<u8>, offsets: Vec<u64> },
    DateTime(Vec<i64>),
    DateTimeOffset(Vec<DateTimeOffsetScalar>),
    Array { array: Box<Column>, offsets: Vec<u64> },
    Nullable { column: Box<Column>, validity: Vec<bool> },
    Any(Vec<Scalar>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Boolean(col) => col.len(),
            Column::Int(col) => col.len(),
            Column::Long(col) => col.len(),
            Column::Float(col) => col.len(),
            Column::Double(col) => col.len(),
            Column::Decimal(col) => col.len(),
            Column::String { offsets, .. } => offsets.len() - 1,
            Column::DateTime(col) => col.len(),
            Column::DateTimeOffset(col) => col.len(),
            Column::Array { offsets, .. } => offsets.len() - 1,
            Column::Nullable { validity, .. } => validity.len(),
            Column::Any(col) => col.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> ResolvedType {
        match self {
            Column::Boolean(_) => ResolvedType::of(ValueType::Boolean),
            Column::Int(_) => ResolvedType::of(ValueType::Int),
            Column::Long(_) => ResolvedType::of(ValueType::Long),
            Column::Float(_) => ResolvedType::of(ValueType::Float),
            Column::Double(_) => ResolvedType::of(ValueType::Double),
            Column::Decimal(_) => ResolvedType::of(ValueType::Decimal),
            Column::String { .. } => ResolvedType::of(ValueType::String),
            Column::DateTime(_) => ResolvedType::of(ValueType::DateTime),
            Column::DateTimeOffset(_) => ResolvedType::of(ValueType::DateTimeOffset),
            Column::Array { array, .. } => ResolvedType::array(array.data_type()),
            Column::Nullable { column, .. } => column.data_type(),
            Column::Any(_) => ResolvedType::any(),
        }
    }

    pub fn index(&self, index: usize) -> ScalarRef<'_> {
        match self {
            Column::Boolean(col) => ScalarRef::Boolean(col[index]),
            Column::Int(col) => ScalarRef::Int(col[index]),
            Column::Long(col) => ScalarRef::Long(col[index]),
            Column::Float(col) => ScalarRef::Float(OrderedFloat(col[index])),
            Column::Double(col) => ScalarRef::Double(OrderedFloat(col[index])),
            Column::Decimal(col) => ScalarRef::Decimal(col[index]),
            Column::String { data, offsets } => {
                let bytes = &data[(offsets[index] as usize)..(offsets[index + 1] as usize)];
                // only valid UTF-8 is ever pushed
                ScalarRef::String(std::str::from_utf8(bytes).unwrap())
            }
            Column::DateTime(col) => ScalarRef::DateTime(col[index]),
            Column::DateTimeOffset(col) => ScalarRef::DateTimeOffset(col[index]),
            Column::Array { array, offsets } => ScalarRef::Array(
                array.slice((offsets[index] as usize)..(offsets[index + 1] as usize)),
            ),
            Column::Nullable { column, validity } => {
                if validity[index] {
                    column.index(index)
                } else {
                    ScalarRef::Null
                }
            }
            Column::Any(col) => col[index].as_ref(),
        }
    }

    pub fn slice(&self, range: Range<usize>) -> Self {
        match self {
            Column::Boolean(col) => Column::Boolean(col[range].to_vec()),
            Column::Int(col) => Column::Int(col[range].to_vec()),
            Column::Long(col) => Column::Long(col[range].to_vec()),
            Column::Float(col) => Column::Float(col[range].to_vec()),
            Column::Double(col) => Column::Double(col[range].to_vec()),
            Column::Decimal(col) => Column::Decimal(col[range].to_vec()),
            Column::String { data, offsets } => {
                let offsets = offsets[range.start..range.end + 1].to_vec();
                Column::String {
                    data: data.clone(),
                    offsets,
                }
            }
            Column::DateTime(col) => Column::DateTime(col[range].to_vec()),
            Column::DateTimeOffset(col) => Column::DateTimeOffset(col[range].to_vec()),
            Column::Array { array, offsets } => {
                let offsets = offsets[range.start..range.end + 1].to_vec();
                Column::Array {
                    array: array.clone(),
                    offsets,
                }
            }
            Column::Nullable { column, validity } => Column::Nullable {
                column: Box::new(column.slice(range.clone())),
                validity: validity[range].to_vec(),
            },
            Column::Any(col) => Column::Any(col[range].to_vec()),
        }
    }

    pub fn iter(&self) -> ColumnIterator<'_> {
        ColumnIterator {
            column: self,
            index: 0,
            len: self.len(),
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && (0..self.len()).all(|i| self.index(i) == other.index(i))
    }
}

impl Eq for Column {}

pub struct ColumnIterator<'a> {
    column: &'a Column,
    index: usize,
    len: usize,
}

impl<'a> Iterator for ColumnIterator<'a> {
    type Item = ScalarRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.len {
            let item = self.column.index(self.index);
            self.index += 1;
            Some(item)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remain = self.len - self.index;
        (remain, Some(remain))
    }
}

/// Mutable mirror of `Column`. This is the vector factory the execution
/// context hands to operators; every typed builder is wrapped nullable since
/// any row may independently be null.
#[derive(Debug, Clone, EnumAsInner)]
pub enum ColumnBuilder {
    Boolean(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Decimal(Vec<DecimalScalar>),
    String { data: Vec<u8>, offsets: Vec<u64> },
    DateTime(Vec<i64>),
    DateTimeOffset(Vec<DateTimeOffsetScalar>),
    Array { array: Box<ColumnBuilder>, offsets: Vec<u64> },
    Nullable { column: Box<ColumnBuilder>, validity: Vec<bool> },
    Any(Vec<Scalar>),
}

impl ColumnBuilder {
    pub fn with_capacity(ty: &ResolvedType, capacity: usize) -> ColumnBuilder {
        let base = match ty.value_type() {
            ValueType::Boolean => ColumnBuilder::Boolean(Vec::with_capacity(capacity)),
            ValueType::Int => ColumnBuilder::Int(Vec::with_capacity(capacity)),
            ValueType::Long => ColumnBuilder::Long(Vec::with_capacity(capacity)),
            ValueType::Float => ColumnBuilder::Float(Vec::with_capacity(capacity)),
            ValueType::Double => ColumnBuilder::Double(Vec::with_capacity(capacity)),
            ValueType::Decimal => ColumnBuilder::Decimal(Vec::with_capacity(capacity)),
            ValueType::String => {
                let mut offsets = Vec::with_capacity(capacity + 1);
                offsets.push(0);
                ColumnBuilder::String {
                    data: Vec::new(),
                    offsets,
                }
            }
            ValueType::DateTime => ColumnBuilder::DateTime(Vec::with_capacity(capacity)),
            ValueType::DateTimeOffset => {
                ColumnBuilder::DateTimeOffset(Vec::with_capacity(capacity))
            }
            ValueType::Array => {
                let mut offsets = Vec::with_capacity(capacity + 1);
                offsets.push(0);
                ColumnBuilder::Array {
                    array: Box::new(Self::with_capacity(&ty.sub_type(), 0)),
                    offsets,
                }
            }
            ValueType::Object | ValueType::Table | ValueType::Any => {
                return ColumnBuilder::Any(Vec::with_capacity(capacity));
            }
        };
        ColumnBuilder::Nullable {
            column: Box::new(base),
            validity: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnBuilder::Boolean(col) => col.len(),
            ColumnBuilder::Int(col) => col.len(),
            ColumnBuilder::Long(col) => col.len(),
            ColumnBuilder::Float(col) => col.len(),
            ColumnBuilder::Double(col) => col.len(),
            ColumnBuilder::Decimal(col) => col.len(),
            ColumnBuilder::String { offsets, .. } => offsets.len() - 1,
            ColumnBuilder::DateTime(col) => col.len(),
            ColumnBuilder::DateTimeOffset(col) => col.len(),
            ColumnBuilder::Array { offsets, .. } => offsets.len() - 1,
            ColumnBuilder::Nullable { validity, .. } => validity.len(),
            ColumnBuilder::Any(col) => col.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, item: ScalarRef) {
        match (self, item) {
            (ColumnBuilder::Nullable { column, validity }, ScalarRef::Null) => {
                column.push_default();
                validity.push(false);
            }
            (ColumnBuilder::Nullable { column, validity }, scalar) => {
                column.push(scalar);
                validity.push(true);
            }
            (ColumnBuilder::Boolean(col), ScalarRef::Boolean(value)) => col.push(value),
            (ColumnBuilder::Int(col), ScalarRef::Int(value)) => col.push(value),
            (ColumnBuilder::Long(col), ScalarRef::Long(value)) => col.push(value),
            (ColumnBuilder::Float(col), ScalarRef::Float(value)) => col.push(value.into_inner()),
            (ColumnBuilder::Double(col), ScalarRef::Double(value)) => col.push(value.into_inner()),
            (ColumnBuilder::Decimal(col), ScalarRef::Decimal(value)) => col.push(value),
            (ColumnBuilder::String { data, offsets }, ScalarRef::String(value)) => {
                data.extend_from_slice(value.as_bytes());
                offsets.push(data.len() as u64);
            }
            (ColumnBuilder::DateTime(col), ScalarRef::DateTime(value)) => col.push(value),
            (ColumnBuilder::DateTimeOffset(col), ScalarRef::DateTimeOffset(value)) => {
                col.push(value)
            }
            (ColumnBuilder::Array { array, offsets }, ScalarRef::Array(value)) => {
                for item in value.iter() {
                    array.push(item);
                }
                offsets.push(array.len() as u64);
            }
            (ColumnBuilder::Any(col), scalar) => col.push(scalar.to_owned()),
            (builder, scalar) => unreachable!("unable to push {:?} to {:?}", scalar, builder),
        }
    }

    pub fn push_default(&mut self) {
        match self {
            ColumnBuilder::Boolean(col) => col.push(false),
            ColumnBuilder::Int(col) => col.push(0),
            ColumnBuilder::Long(col) => col.push(0),
            ColumnBuilder::Float(col) => col.push(0.0),
            ColumnBuilder::Double(col) => col.push(0.0),
            ColumnBuilder::Decimal(col) => col.push(DecimalScalar::from_i128(0)),
            ColumnBuilder::String { data, offsets } => offsets.push(data.len() as u64),
            ColumnBuilder::DateTime(col) => col.push(0),
            ColumnBuilder::DateTimeOffset(col) => col.push(DateTimeOffsetScalar {
                micros: 0,
                offset_seconds: 0,
            }),
            ColumnBuilder::Array { array, offsets } => {
                offsets.push(array.len() as u64);
            }
            ColumnBuilder::Nullable { column, validity } => {
                column.push_default();
                validity.push(false);
            }
            ColumnBuilder::Any(col) => col.push(Scalar::Null),
        }
    }

    pub fn build(self) -> Column {
        match self {
            ColumnBuilder::Boolean(col) => Column::Boolean(col),
            ColumnBuilder::Int(col) => Column::Int(col),
            ColumnBuilder::Long(col) => Column::Long(col),
            ColumnBuilder::Float(col) => Column::Float(col),
            ColumnBuilder::Double(col) => Column::Double(col),
            ColumnBuilder::Decimal(col) => Column::Decimal(col),
            ColumnBuilder::String { data, offsets } => Column::String { data, offsets },
            ColumnBuilder::DateTime(col) => Column::DateTime(col),
            ColumnBuilder::DateTimeOffset(col) => Column::DateTimeOffset(col),
            ColumnBuilder::Array { array, offsets } => Column::Array {
                array: Box::new(array.build()),
                offsets,
            },
            ColumnBuilder::Nullable { column, validity } => Column::Nullable {
                column: Box::new(column.build()),
                validity,
            },
            ColumnBuilder::Any(col) => Column::Any(col),
        }
    }
}
