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

use crate::schema::SchemaRef;

/// The closed set of value kinds a vector can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    DateTime,
    DateTimeOffset,
    Array,
    Object,
    Table,
    Any,
}

impl ValueType {
    /// Implicit promotion order. When two differently typed operands meet in a
    /// binary operation the resolved type is the higher-precedence one and the
    /// lower side is coerced. String and Boolean sit below the numerics so
    /// `'1' = 1` and `true = 1` resolve to numeric comparisons.
    pub fn precedence(&self) -> u8 {
        match self {
            ValueType::String => 1,
            ValueType::Boolean => 2,
            ValueType::Int => 3,
            ValueType::Long => 4,
            ValueType::Float => 5,
            ValueType::Double => 6,
            ValueType::Decimal => 7,
            ValueType::DateTime => 8,
            ValueType::DateTimeOffset => 9,
            ValueType::Array => 10,
            ValueType::Object => 11,
            ValueType::Table => 12,
            ValueType::Any => 13,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            ValueType::Int
                | ValueType::Long
                | ValueType::Float
                | ValueType::Double
                | ValueType::Decimal
        )
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ValueType::Array | ValueType::Object | ValueType::Table)
    }

    /// The resolved type of a binary operation over `self` and `other`.
    pub fn promote(self, other: ValueType) -> ValueType {
        if self.precedence() >= other.precedence() {
            self
        } else {
            other
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "String",
            ValueType::Boolean => "Boolean",
            ValueType::Int => "Int",
            ValueType::Long => "Long",
            ValueType::Float => "Float",
            ValueType::Double => "Double",
            ValueType::Decimal => "Decimal",
            ValueType::DateTime => "DateTime",
            ValueType::DateTimeOffset => "DateTimeOffset",
            ValueType::Array => "Array",
            ValueType::Object => "Object",
            ValueType::Table => "Table",
            ValueType::Any => "Any",
        };
        write!(f, "{}", name)
    }
}

/// A value type plus, for complex kinds, its element type (`Array`) or column
/// schema (`Object`/`Table`). Compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    ty: ValueType,
    sub_type: Option<Box<ResolvedType>>,
    schema: Option<SchemaRef>,
}

impl ResolvedType {
    pub fn of(ty: ValueType) -> Self {
        Self {
            ty,
            sub_type: None,
            schema: None,
        }
    }

    pub fn any() -> Self {
        Self::of(ValueType::Any)
    }

    pub fn array(element: ResolvedType) -> Self {
        Self {
            ty: ValueType::Array,
            sub_type: Some(Box::new(element)),
            schema: None,
        }
    }

    pub fn object(schema: SchemaRef) -> Self {
        Self {
            ty: ValueType::Object,
            sub_type: None,
            schema: Some(schema),
        }
    }

    pub fn table(schema: SchemaRef) -> Self {
        Self {
            ty: ValueType::Table,
            sub_type: None,
            schema: Some(schema),
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Element type of an `Array`, defaulting to `Any` when unspecified.
    pub fn sub_type(&self) -> ResolvedType {
        match &self.sub_type {
            Some(sub) => (**sub).clone(),
            None => ResolvedType::any(),
        }
    }

    pub fn schema(&self) -> Option<&SchemaRef> {
        self.schema.as_ref()
    }
}

impl Display for ResolvedType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.ty {
            ValueType::Array => write!(f, "Array<{}>", self.sub_type()),
            _ => write!(f, "{}", self.ty),
        }
    }
}
