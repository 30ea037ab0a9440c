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

use tessera_common_exception::Result;

use crate::expr::Expr;
use crate::expr::TemplatePart;
use crate::expr::WhenClause;

/// Controls how recursion continues after `pre_visit`.
pub enum Recursion<V: ExprVisitor> {
    Continue(V),
    Stop(V),
}

/// Depth-first expression traversal. `pre_visit` runs before descending into
/// children, `post_visit` after.
pub trait ExprVisitor: Sized {
    fn pre_visit(self, expr: &Expr) -> Result<Recursion<Self>>;

    fn post_visit(self, _expr: &Expr) -> Result<Self> {
        Ok(self)
    }
}

impl Expr {
    pub fn accept<V: ExprVisitor>(&self, visitor: V) -> Result<V> {
        let mut visitor = match visitor.pre_visit(self)? {
            Recursion::Continue(visitor) => visitor,
            Recursion::Stop(visitor) => return Ok(visitor),
        };
        for child in self.children() {
            visitor = child.accept(visitor)?;
        }
        visitor.post_visit(self)
    }

    /// Rebuild this node with every direct child passed through `f`.
    /// Non-expression fields are cloned as-is.
    pub fn map_children<F>(&self, f: &mut F) -> Result<Expr>
    where
        F: FnMut(&Expr) -> Result<Expr>,
    {
        let mapped = match self {
            Expr::Literal { .. }
            | Expr::ColumnRef { .. }
            | Expr::Variable { .. }
            | Expr::LambdaParam { .. } => self.clone(),
            Expr::Unary { op, expr } => Expr::Unary {
                op: *op,
                expr: Box::new(f(expr)?),
            },
            Expr::Arithmetic { op, left, right } => Expr::Arithmetic {
                op: *op,
                left: Box::new(f(left)?),
                right: Box::new(f(right)?),
            },
            Expr::Comparison { op, left, right } => Expr::Comparison {
                op: *op,
                left: Box::new(f(left)?),
                right: Box::new(f(right)?),
            },
            Expr::Logical { op, left, right } => Expr::Logical {
                op: *op,
                left: Box::new(f(left)?),
                right: Box::new(f(right)?),
            },
            Expr::Not { expr } => Expr::Not {
                expr: Box::new(f(expr)?),
            },
            Expr::Like {
                expr,
                pattern,
                negated,
            } => Expr::Like {
                expr: Box::new(f(expr)?),
                pattern: Box::new(f(pattern)?),
                negated: *negated,
            },
            Expr::In {
                expr,
                args,
                negated,
            } => Expr::In {
                expr: Box::new(f(expr)?),
                args: args.iter().map(&mut *f).collect::<Result<Vec<_>>>()?,
                negated: *negated,
            },
            Expr::NullPredicate { expr, negated } => Expr::NullPredicate {
                expr: Box::new(f(expr)?),
                negated: *negated,
            },
            Expr::Case {
                when_clauses,
                else_expr,
            } => Expr::Case {
                when_clauses: when_clauses
                    .iter()
                    .map(|clause| {
                        Ok(WhenClause {
                            condition: f(&clause.condition)?,
                            result: f(&clause.result)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
                else_expr: match else_expr {
                    Some(else_expr) => Some(Box::new(f(else_expr)?)),
                    None => None,
                },
            },
            Expr::Cast { expr, target } => Expr::Cast {
                expr: Box::new(f(expr)?),
                target: target.clone(),
            },
            Expr::DateAdd { part, number, expr } => Expr::DateAdd {
                part: *part,
                number: Box::new(f(number)?),
                expr: Box::new(f(expr)?),
            },
            Expr::DatePart { part, expr } => Expr::DatePart {
                part: *part,
                expr: Box::new(f(expr)?),
            },
            Expr::FunctionCall { name, args } => Expr::FunctionCall {
                name: name.clone(),
                args: args.iter().map(&mut *f).collect::<Result<Vec<_>>>()?,
            },
            Expr::Lambda {
                params,
                slots,
                body,
            } => Expr::Lambda {
                params: params.clone(),
                slots: slots.clone(),
                body: Box::new(f(body)?),
            },
            Expr::Dereference {
                expr,
                name,
                ordinal,
            } => Expr::Dereference {
                expr: Box::new(f(expr)?),
                name: name.clone(),
                ordinal: *ordinal,
            },
            Expr::Subscript { expr, index } => Expr::Subscript {
                expr: Box::new(f(expr)?),
                index: Box::new(f(index)?),
            },
            Expr::TemplateString { parts } => Expr::TemplateString {
                parts: parts
                    .iter()
                    .map(|part| {
                        Ok(match part {
                            TemplatePart::Text(text) => TemplatePart::Text(text.clone()),
                            TemplatePart::Expr(expr) => TemplatePart::Expr(f(expr)?),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            },
            Expr::Assignment { name, expr } => Expr::Assignment {
                name: name.clone(),
                expr: Box::new(f(expr)?),
            },
        };
        Ok(mapped)
    }
}

/// Returns a rewritten clone of `expr`. The replacement function is offered
/// every node top-down; `Ok(Some(replacement))` swaps the node in (children
/// are not visited further), `Ok(None)` keeps the node and recurses into its
/// children.
pub fn clone_with_replacement<F>(expr: &Expr, replacement_fn: &F) -> Result<Expr>
where
    F: Fn(&Expr) -> Result<Option<Expr>>,
{
    match replacement_fn(expr)? {
        Some(replacement) => Ok(replacement),
        None => expr.map_children(&mut |child| clone_with_replacement(child, replacement_fn)),
    }
}

/// Collect every column reference, depth first, duplicates omitted.
pub fn collect_column_refs(expr: &Expr) -> Vec<Expr> {
    struct Collector {
        columns: Vec<Expr>,
    }
    impl ExprVisitor for Collector {
        fn pre_visit(mut self, expr: &Expr) -> Result<Recursion<Self>> {
            if matches!(expr, Expr::ColumnRef { .. }) && !self.columns.contains(expr) {
                self.columns.push(expr.clone());
            }
            Ok(Recursion::Continue(self))
        }
    }
    // pre_visit never fails
    let collector = expr
        .accept(Collector { columns: vec![] })
        .unwrap_or_else(|_| unreachable!("column collection cannot fail"));
    collector.columns
}
