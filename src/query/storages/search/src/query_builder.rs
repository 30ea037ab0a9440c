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

use log::debug;
use serde_json::json;
use serde_json::Value;
use tessera_common_expression::format_datetime_micros;
use tessera_common_expression::format_datetime_offset;
use tessera_common_expression::ComparisonOp;
use tessera_common_expression::Expr;
use tessera_common_expression::Scalar;
use tessera_common_expression::TableSourceReference;
use tessera_common_sql::AnalyzePair;
use tessera_common_sql::AnalyzeResult;
use tessera_common_sql::PairKind;

/// Result of translating an analyzed filter for one table source: the native
/// JSON query to send to the search back-end, plus whatever could not be
/// delegated and must run as an in-engine post-filter.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub dsl: Value,
    pub post_filter: Option<Expr>,
}

/// Translates pushdown-eligible pairs into a JSON search DSL (`term`,
/// `terms`, `range`, `wildcard`, `exists` inside a bool query). Only a plain
/// column against a constant-foldable value is delegated; anything else stays
/// in the post-filter. Missing a delegation is safe, emitting a wrong one is
/// not.
pub struct SearchQueryBuilder {
    table_source: TableSourceReference,
}

struct Clause {
    json: Value,
    negated: bool,
}

impl SearchQueryBuilder {
    pub fn new(table_source: TableSourceReference) -> Self {
        Self { table_source }
    }

    pub fn build(&self, analysis: &AnalyzeResult) -> SearchQuery {
        let mut must = Vec::new();
        let mut must_not = Vec::new();
        let mut leftovers = Vec::new();
        for pair in analysis.pairs() {
            let clause = if pair.is_pushdown(&self.table_source) {
                self.translate(pair)
            } else {
                None
            };
            match clause {
                Some(clause) => {
                    if clause.negated {
                        must_not.push(clause.json);
                    } else {
                        must.push(clause.json);
                    }
                }
                None => {
                    debug!(
                        "keeping predicate in-engine for table source {}: {}",
                        self.table_source.id,
                        pair.expression()
                    );
                    leftovers.push(pair.expression().clone());
                }
            }
        }
        let post_filter = leftovers.into_iter().reduce(Expr::and);
        SearchQuery {
            dsl: json!({"query": {"bool": {"must": must, "must_not": must_not}}}),
            post_filter,
        }
    }

    fn translate(&self, pair: &AnalyzePair) -> Option<Clause> {
        let column = pair.column(&self.table_source)?.to_string();
        match pair.kind() {
            PairKind::Comparison => {
                let op = pair.comparison_op()?;
                // mirror the operator when the column sits on the right side
                let column_on_left = pair
                    .left()
                    .column()
                    .map(|name| name == column)
                    .unwrap_or(false);
                let op = if column_on_left { op } else { op.mirrored() };
                let value = literal_value(pair.value_expression(&self.table_source)?)?;
                let clause = match op {
                    ComparisonOp::Eq => Clause {
                        json: json!({"term": {(column): value}}),
                        negated: false,
                    },
                    ComparisonOp::Neq => Clause {
                        json: json!({"term": {(column): value}}),
                        negated: true,
                    },
                    ComparisonOp::Gt => range_clause(&column, "gt", value),
                    ComparisonOp::Gte => range_clause(&column, "gte", value),
                    ComparisonOp::Lt => range_clause(&column, "lt", value),
                    ComparisonOp::Lte => range_clause(&column, "lte", value),
                };
                Some(clause)
            }
            PairKind::In => {
                let values = pair
                    .in_args()?
                    .iter()
                    .map(literal_value)
                    .collect::<Option<Vec<_>>>()?;
                Some(Clause {
                    json: json!({"terms": {(column): values}}),
                    negated: pair.is_negated(),
                })
            }
            PairKind::Like => {
                let pattern = match literal_value(pair.right()?.expression())? {
                    Value::String(pattern) => pattern,
                    _ => return None,
                };
                let wildcard: String = pattern
                    .chars()
                    .map(|c| match c {
                        '%' => '*',
                        '_' => '?',
                        c => c,
                    })
                    .collect();
                Some(Clause {
                    json: json!({"wildcard": {(column): wildcard}}),
                    negated: pair.is_negated(),
                })
            }
            PairKind::Null => Some(Clause {
                json: json!({"exists": {"field": column}}),
                // IS NULL means the field must be absent
                negated: !pair.is_negated(),
            }),
            PairKind::FunctionCall | PairKind::Undefined => None,
        }
    }
}

/// Fold the value side and render it as JSON; non-constant or non-scalar
/// values are not delegable.
fn literal_value(expr: &Expr) -> Option<Value> {
    match expr.fold() {
        Expr::Literal { value, .. } => scalar_to_json(&value),
        _ => None,
    }
}

fn scalar_to_json(value: &Scalar) -> Option<Value> {
    match value {
        Scalar::Boolean(v) => Some(json!(v)),
        Scalar::Int(v) => Some(json!(v)),
        Scalar::Long(v) => Some(json!(v)),
        Scalar::Float(v) => serde_json::Number::from_f64(v.into_inner() as f64).map(Value::Number),
        Scalar::Double(v) => serde_json::Number::from_f64(v.into_inner()).map(Value::Number),
        Scalar::Decimal(v) => serde_json::Number::from_f64(v.to_f64()).map(Value::Number),
        Scalar::String(v) => Some(json!(v)),
        Scalar::DateTime(v) => Some(json!(format_datetime_micros(*v))),
        Scalar::DateTimeOffset(v) => Some(json!(format_datetime_offset(*v))),
        Scalar::Null | Scalar::Array(_) | Scalar::Object(_) | Scalar::Table(_) => None,
    }
}

fn range_clause(column: &str, key: &str, value: Value) -> Clause {
    Clause {
        json: json!({"range": {(column): {(key): value}}}),
        negated: false,
    }
}
