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

use std::collections::BTreeSet;

use log::debug;
use tessera_common_expression::collect_column_refs;
use tessera_common_expression::ComparisonOp;
use tessera_common_expression::Expr;
use tessera_common_expression::LogicalOp;
use tessera_common_expression::TableSourceReference;

/// Classification tag of a decomposed predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairKind {
    Comparison,
    Null,
    In,
    Like,
    FunctionCall,
    Undefined,
}

/// One side of an analyzed pair: the sub-expression plus the set of table
/// source ids it references, and the plain column name when the side is a
/// bare column reference.
#[derive(Debug, Clone)]
pub struct AnalyzeItem {
    expr: Expr,
    table_sources: BTreeSet<i32>,
    column: Option<String>,
}

impl AnalyzeItem {
    fn new(expr: Expr) -> Self {
        let table_sources = table_sources_of(&expr);
        let column = match &expr {
            Expr::ColumnRef { name, .. } => Some(name.clone()),
            _ => None,
        };
        Self {
            expr,
            table_sources,
            column,
        }
    }

    pub fn expression(&self) -> &Expr {
        &self.expr
    }

    pub fn table_sources(&self) -> &BTreeSet<i32> {
        &self.table_sources
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Exactly `{id}`.
    fn is_single_source(&self, id: i32) -> bool {
        self.table_sources.len() == 1 && self.table_sources.contains(&id)
    }

    fn references_nothing(&self) -> bool {
        self.table_sources.is_empty()
    }
}

/// One atomic unit of a decomposed filter: the original predicate expression
/// plus its classified sides. A conjunction is always split into one pair per
/// top-level AND operand; OR stays whole inside a single pair.
#[derive(Debug, Clone)]
pub struct AnalyzePair {
    kind: PairKind,
    comparison_op: Option<ComparisonOp>,
    negated: bool,
    expr: Expr,
    left: AnalyzeItem,
    right: Option<AnalyzeItem>,
}

impl AnalyzePair {
    pub fn kind(&self) -> PairKind {
        self.kind
    }

    pub fn comparison_op(&self) -> Option<ComparisonOp> {
        self.comparison_op
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The predicate this pair was split from; reassembling all pairs with
    /// AND reproduces the analyzed expression.
    pub fn expression(&self) -> &Expr {
        &self.expr
    }

    pub fn left(&self) -> &AnalyzeItem {
        &self.left
    }

    pub fn right(&self) -> Option<&AnalyzeItem> {
        self.right.as_ref()
    }

    /// The IN list of an `In` pair.
    pub fn in_args(&self) -> Option<&[Expr]> {
        match &self.expr {
            Expr::In { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Whether this pair may be delegated to `table_source`: the qualified
    /// side references exactly that source and the other side references no
    /// source at all. A comparison whose two sides reference the same single
    /// source stays in-engine.
    pub fn is_pushdown(&self, table_source: &TableSourceReference) -> bool {
        let id = table_source.id;
        match self.kind {
            PairKind::Undefined => false,
            PairKind::Comparison => {
                let right = match &self.right {
                    Some(right) => right,
                    None => return false,
                };
                (self.left.is_single_source(id) && right.references_nothing())
                    || (right.is_single_source(id) && self.left.references_nothing())
            }
            PairKind::Null | PairKind::FunctionCall => self.left.is_single_source(id),
            PairKind::In | PairKind::Like => {
                self.left.is_single_source(id)
                    && self
                        .right
                        .as_ref()
                        .map(AnalyzeItem::references_nothing)
                        .unwrap_or(true)
            }
        }
    }

    /// Whether this pair is usable as a join key for `table_source`: an
    /// equality whose one side references exactly that source while the other
    /// side does not touch it.
    pub fn is_equi(&self, table_source: &TableSourceReference) -> bool {
        if self.kind != PairKind::Comparison || self.comparison_op != Some(ComparisonOp::Eq) {
            return false;
        }
        let id = table_source.id;
        let right = match &self.right {
            Some(right) => right,
            None => return false,
        };
        (self.left.is_single_source(id) && !right.table_sources.contains(&id))
            || (right.is_single_source(id) && !self.left.table_sources.contains(&id))
    }

    /// Column name on the side qualified to `table_source`, if that side is a
    /// bare column.
    pub fn column(&self, table_source: &TableSourceReference) -> Option<&str> {
        let id = table_source.id;
        if self.left.is_single_source(id) {
            return self.left.column();
        }
        match &self.right {
            Some(right) if right.is_single_source(id) => right.column(),
            _ => None,
        }
    }

    /// The expression opposite the side qualified to `table_source`.
    pub fn value_expression(&self, table_source: &TableSourceReference) -> Option<&Expr> {
        let id = table_source.id;
        let right = self.right.as_ref()?;
        if self.left.is_single_source(id) {
            Some(&right.expr)
        } else if right.is_single_source(id) {
            Some(&self.left.expr)
        } else {
            None
        }
    }
}

/// Ordered decomposition of a filter expression into pairs.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeResult {
    pairs: Vec<AnalyzePair>,
}

impl AnalyzeResult {
    pub fn pairs(&self) -> &[AnalyzePair] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Reassemble the remaining predicate by AND-ing all pairs, semantically
    /// equivalent to the analyzed input.
    pub fn predicate(&self) -> Option<Expr> {
        let mut iter = self.pairs.iter().map(|pair| pair.expr.clone());
        let first = iter.next()?;
        Some(iter.fold(first, Expr::and))
    }

    /// Partition into (pairs delegable to `table_source`, the leftover
    /// result). With `is_null_allowed == false` IS NOT NULL pairs are kept as
    /// leftovers, for back-ends that cannot evaluate a null check remotely.
    pub fn extract_pushdown_pairs(
        &self,
        table_source: &TableSourceReference,
        is_null_allowed: bool,
    ) -> (Vec<AnalyzePair>, AnalyzeResult) {
        let mut pushdown = Vec::new();
        let mut leftover = Vec::new();
        for pair in &self.pairs {
            let not_null_blocked = !is_null_allowed && pair.kind == PairKind::Null && pair.negated;
            if pair.is_pushdown(table_source) && !not_null_blocked {
                pushdown.push(pair.clone());
            } else {
                leftover.push(pair.clone());
            }
        }
        debug!(
            "extracted {} pushdown pairs for table source {} ({} left over)",
            pushdown.len(),
            table_source.id,
            leftover.len()
        );
        (pushdown, AnalyzeResult { pairs: leftover })
    }

    /// Pairs usable as join keys for `table_source`.
    pub fn equi_pairs(&self, table_source: &TableSourceReference) -> Vec<&AnalyzePair> {
        self.pairs
            .iter()
            .filter(|pair| pair.is_equi(table_source))
            .collect()
    }
}

pub struct PredicateAnalyzer;

impl PredicateAnalyzer {
    /// Decompose a filter expression. Analysis is total: anything that does
    /// not classify becomes an `Undefined` pair, never an error. Missing a
    /// pushdown opportunity is safe; proposing a wrong one is not.
    pub fn analyze(predicate: &Expr) -> AnalyzeResult {
        let mut conjuncts = Vec::new();
        flatten_and(predicate, &mut conjuncts);
        let pairs = conjuncts.into_iter().map(classify).collect();
        AnalyzeResult { pairs }
    }
}

/// Recursively unwrap top-level AND conjunctions; OR and everything else stay
/// whole.
fn flatten_and<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            flatten_and(left, out);
            flatten_and(right, out);
        }
        other => out.push(other),
    }
}

fn classify(expr: &Expr) -> AnalyzePair {
    match expr {
        Expr::Comparison { op, left, right } => AnalyzePair {
            kind: PairKind::Comparison,
            comparison_op: Some(*op),
            negated: false,
            expr: expr.clone(),
            left: AnalyzeItem::new((**left).clone()),
            right: Some(AnalyzeItem::new((**right).clone())),
        },
        Expr::NullPredicate {
            expr: inner,
            negated,
        } => AnalyzePair {
            kind: PairKind::Null,
            comparison_op: None,
            negated: *negated,
            expr: expr.clone(),
            left: AnalyzeItem::new((**inner).clone()),
            right: None,
        },
        Expr::In {
            expr: lhs,
            args,
            negated,
        } => {
            let left = AnalyzeItem::new((**lhs).clone());
            // a literal-on-the-left IN is out of the generic analyzer's scope
            if left.references_nothing() {
                return undefined(expr);
            }
            let arg_sources: BTreeSet<i32> =
                args.iter().flat_map(|arg| table_sources_of(arg)).collect();
            AnalyzePair {
                kind: PairKind::In,
                comparison_op: None,
                negated: *negated,
                expr: expr.clone(),
                left,
                right: Some(AnalyzeItem {
                    expr: expr.clone(),
                    table_sources: arg_sources,
                    column: None,
                }),
            }
        }
        Expr::Like {
            expr: lhs,
            pattern,
            negated,
        } => AnalyzePair {
            kind: PairKind::Like,
            comparison_op: None,
            negated: *negated,
            expr: expr.clone(),
            left: AnalyzeItem::new((**lhs).clone()),
            right: Some(AnalyzeItem::new((**pattern).clone())),
        },
        Expr::FunctionCall { .. } => AnalyzePair {
            kind: PairKind::FunctionCall,
            comparison_op: None,
            negated: false,
            expr: expr.clone(),
            left: AnalyzeItem::new(expr.clone()),
            right: None,
        },
        // a bare boolean column is an implicit `col = true`
        Expr::ColumnRef { .. } => normalized_column(expr.clone(), true),
        Expr::Not { expr: inner } => match &**inner {
            Expr::ColumnRef { .. } => normalized_column((**inner).clone(), false),
            _ => undefined(expr),
        },
        _ => undefined(expr),
    }
}

fn normalized_column(column: Expr, value: bool) -> AnalyzePair {
    let literal = Expr::literal(value);
    let normalized = Expr::equals(column.clone(), literal.clone());
    AnalyzePair {
        kind: PairKind::Comparison,
        comparison_op: Some(ComparisonOp::Eq),
        negated: false,
        expr: normalized,
        left: AnalyzeItem::new(column),
        right: Some(AnalyzeItem::new(literal)),
    }
}

fn undefined(expr: &Expr) -> AnalyzePair {
    AnalyzePair {
        kind: PairKind::Undefined,
        comparison_op: None,
        negated: false,
        expr: expr.clone(),
        left: AnalyzeItem::new(expr.clone()),
        right: None,
    }
}

fn table_sources_of(expr: &Expr) -> BTreeSet<i32> {
    collect_column_refs(expr)
        .iter()
        .filter_map(|column| match column {
            Expr::ColumnRef {
                table_source: Some(ts),
                ..
            } => Some(ts.id),
            _ => None,
        })
        .collect()
}
