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

use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use tessera_common_exception::ErrorCode;
use tessera_common_exception::Result;

use crate::types::ResolvedType;

/// Identifies a logical table/subquery origin. Only used as a set membership
/// key during predicate analysis, never dereferenced for data. Identity is the
/// id alone.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TableSourceReference {
    pub id: i32,
    pub name: String,
    pub alias: String,
}

impl TableSourceReference {
    pub fn new(id: i32, name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            alias: alias.into(),
        }
    }
}

impl PartialEq for TableSourceReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TableSourceReference {}

impl Hash for TableSourceReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A named, typed column in a batch schema, attributed to the table source it
/// originated from. Internal columns are planner bookkeeping and lose against
/// visible columns during name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaColumn {
    name: String,
    ty: ResolvedType,
    table_source: Option<TableSourceReference>,
    internal: bool,
}

impl SchemaColumn {
    pub fn new(name: impl Into<String>, ty: ResolvedType) -> Self {
        Self {
            name: name.into(),
            ty,
            table_source: None,
            internal: false,
        }
    }

    pub fn with_table_source(mut self, table_source: TableSourceReference) -> Self {
        self.table_source = Some(table_source);
        self
    }

    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &ResolvedType {
        &self.ty
    }

    pub fn table_source(&self) -> Option<&TableSourceReference> {
        self.table_source.as_ref()
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Schema {
    columns: Vec<SchemaColumn>,
}

pub type SchemaRef = Arc<Schema>;

impl Schema {
    pub fn new(columns: Vec<SchemaColumn>) -> Self {
        Self { columns }
    }

    pub fn empty() -> Self {
        Self { columns: vec![] }
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, ordinal: usize) -> &SchemaColumn {
        &self.columns[ordinal]
    }

    /// Resolve a column name (case-insensitively) to its ordinal.
    ///
    /// A second visible match is an ambiguity error; internal duplicates are
    /// skipped in favor of the first visible match.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        let mut found: Option<usize> = None;
        for (ordinal, column) in self.columns.iter().enumerate() {
            if !column.name.eq_ignore_ascii_case(name) {
                continue;
            }
            match found {
                None => found = Some(ordinal),
                Some(first) => {
                    if column.internal {
                        continue;
                    }
                    if self.columns[first].internal {
                        found = Some(ordinal);
                        continue;
                    }
                    return Err(ErrorCode::AmbiguousColumnName(format!(
                        "Ambiguous column: {}",
                        name
                    )));
                }
            }
        }
        found.ok_or_else(|| ErrorCode::UnknownColumn(format!("Unknown column: {}", name)))
    }

    /// Resolve a column by name within a specific table source, falling back
    /// to plain name resolution when the source carries no match.
    pub fn index_of_in_source(&self, name: &str, source_id: i32) -> Result<usize> {
        for (ordinal, column) in self.columns.iter().enumerate() {
            if column.name.eq_ignore_ascii_case(name)
                && column.table_source.as_ref().map(|ts| ts.id) == Some(source_id)
            {
                return Ok(ordinal);
            }
        }
        self.index_of(name)
    }
}
