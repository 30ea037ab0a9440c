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

use crate::date_helper::DatePart;
use crate::function::FunctionRegistry;
use crate::kernels::arithmetic::arithmetic_result_type;
use crate::schema::TableSourceReference;
use crate::types::ResolvedType;
use crate::types::ValueType;
use crate::values::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
}

impl ArithmeticOp {
    pub fn is_commutative(&self) -> bool {
        matches!(self, ArithmeticOp::Add | ArithmeticOp::Multiply)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulus => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    pub fn is_commutative(&self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Neq)
    }

    /// The operator with sides swapped: `a > b` is `b < a`.
    pub fn mirrored(&self) -> ComparisonOp {
        match self {
            ComparisonOp::Eq => ComparisonOp::Eq,
            ComparisonOp::Neq => ComparisonOp::Neq,
            ComparisonOp::Lt => ComparisonOp::Gt,
            ComparisonOp::Lte => ComparisonOp::Gte,
            ComparisonOp::Gt => ComparisonOp::Lt,
            ComparisonOp::Gte => ComparisonOp::Lte,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Neq => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplatePart {
    Text(String),
    Expr(Expr),
}

/// An immutable expression tree node. Rewriting is copy-producing; nothing is
/// ever mutated in place. The only mutation an expression performs at
/// evaluation time is `Assignment` writing the context variable table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal {
        value: Scalar,
        ty: ResolvedType,
    },
    /// A column reference, bound to an ordinal by the planner or resolved by
    /// name against the batch schema at evaluation time.
    ColumnRef {
        name: String,
        table_source: Option<TableSourceReference>,
        ordinal: Option<usize>,
        ty: ResolvedType,
    },
    /// `@name`: reads the context variable table; unknown variables are null.
    Variable {
        name: String,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not {
        expr: Box<Expr>,
    },
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    In {
        expr: Box<Expr>,
        args: Vec<Expr>,
        negated: bool,
    },
    NullPredicate {
        expr: Box<Expr>,
        negated: bool,
    },
    Case {
        when_clauses: Vec<WhenClause>,
        else_expr: Option<Box<Expr>>,
    },
    Cast {
        expr: Box<Expr>,
        target: ResolvedType,
    },
    DateAdd {
        part: DatePart,
        number: Box<Expr>,
        expr: Box<Expr>,
    },
    DatePart {
        part: DatePart,
        expr: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    /// Only valid as an argument of a higher-order function; evaluating a
    /// bare lambda is a planner invariant violation.
    Lambda {
        params: Vec<String>,
        slots: Vec<usize>,
        body: Box<Expr>,
    },
    LambdaParam {
        name: String,
        slot: usize,
    },
    Dereference {
        expr: Box<Expr>,
        name: String,
        ordinal: Option<usize>,
    },
    Subscript {
        expr: Box<Expr>,
        index: Box<Expr>,
    },
    TemplateString {
        parts: Vec<TemplatePart>,
    },
    /// `@name = expr`: writes the context variable table and yields the
    /// assigned vector. Non-constant; callers sharing a context across
    /// threads must serialize access.
    Assignment {
        name: String,
        expr: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<Scalar>) -> Expr {
        let value = value.into();
        let ty = value.resolved_type();
        Expr::Literal { value, ty }
    }

    pub fn null_literal() -> Expr {
        Expr::Literal {
            value: Scalar::Null,
            ty: ResolvedType::any(),
        }
    }

    pub fn column(name: impl Into<String>) -> Expr {
        Expr::ColumnRef {
            name: name.into(),
            table_source: None,
            ordinal: None,
            ty: ResolvedType::any(),
        }
    }

    pub fn column_of(
        name: impl Into<String>,
        table_source: TableSourceReference,
        ty: ResolvedType,
    ) -> Expr {
        Expr::ColumnRef {
            name: name.into(),
            table_source: Some(table_source),
            ordinal: None,
            ty,
        }
    }

    pub fn bound_column(name: impl Into<String>, ordinal: usize, ty: ResolvedType) -> Expr {
        Expr::ColumnRef {
            name: name.into(),
            table_source: None,
            ordinal: Some(ordinal),
            ty,
        }
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::Logical {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Expr {
        Expr::Logical {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(expr: Expr) -> Expr {
        Expr::Not {
            expr: Box::new(expr),
        }
    }

    pub fn comparison(op: ComparisonOp, left: Expr, right: Expr) -> Expr {
        Expr::Comparison {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn equals(left: Expr, right: Expr) -> Expr {
        Self::comparison(ComparisonOp::Eq, left, right)
    }

    pub fn arithmetic(op: ArithmeticOp, left: Expr, right: Expr) -> Expr {
        Expr::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn cast(expr: Expr, target: ResolvedType) -> Expr {
        Expr::Cast {
            expr: Box::new(expr),
            target,
        }
    }

    pub fn is_null(expr: Expr, negated: bool) -> Expr {
        Expr::NullPredicate {
            expr: Box::new(expr),
            negated,
        }
    }

    pub fn in_list(expr: Expr, args: Vec<Expr>, negated: bool) -> Expr {
        Expr::In {
            expr: Box::new(expr),
            args,
            negated,
        }
    }

    pub fn like(expr: Expr, pattern: Expr, negated: bool) -> Expr {
        Expr::Like {
            expr: Box::new(expr),
            pattern: Box::new(pattern),
            negated,
        }
    }

    /// Static result type; `Any` where it cannot be determined before
    /// evaluation.
    pub fn data_type(&self) -> ResolvedType {
        match self {
            Expr::Literal { ty, .. } => ty.clone(),
            Expr::ColumnRef { ty, .. } => ty.clone(),
            Expr::Variable { .. } | Expr::LambdaParam { .. } => ResolvedType::any(),
            Expr::Unary { expr, .. } => expr.data_type(),
            Expr::Arithmetic { op, left, right } => {
                arithmetic_result_type(*op, &left.data_type(), &right.data_type())
                    .unwrap_or_else(|_| ResolvedType::any())
            }
            Expr::Comparison { .. }
            | Expr::Logical { .. }
            | Expr::Not { .. }
            | Expr::Like { .. }
            | Expr::In { .. }
            | Expr::NullPredicate { .. } => ResolvedType::of(ValueType::Boolean),
            Expr::Case {
                when_clauses,
                else_expr,
            } => {
                let mut branches: Vec<ResolvedType> = when_clauses
                    .iter()
                    .map(|clause| clause.result.data_type())
                    .collect();
                if let Some(else_expr) = else_expr {
                    branches.push(else_expr.data_type());
                }
                case_result_type(&branches)
            }
            Expr::Cast { target, .. } => target.clone(),
            Expr::DateAdd { expr, .. } => {
                let ty = expr.data_type();
                match ty.value_type() {
                    ValueType::DateTime | ValueType::DateTimeOffset => ty,
                    _ => ResolvedType::any(),
                }
            }
            Expr::DatePart { .. } => ResolvedType::of(ValueType::Int),
            Expr::FunctionCall { name, args } => {
                match FunctionRegistry::instance().get(name) {
                    Some(function) => {
                        let arg_types: Vec<ResolvedType> =
                            args.iter().map(Expr::data_type).collect();
                        (function.return_type)(&arg_types)
                    }
                    None => ResolvedType::any(),
                }
            }
            Expr::Lambda { body, .. } => body.data_type(),
            Expr::Dereference { expr, name, .. } => {
                let ty = expr.data_type();
                match ty.schema() {
                    Some(schema) => schema
                        .columns()
                        .iter()
                        .find(|c| c.name().eq_ignore_ascii_case(name))
                        .map(|c| c.data_type().clone())
                        .unwrap_or_else(ResolvedType::any),
                    None => ResolvedType::any(),
                }
            }
            Expr::Subscript { expr, .. } => {
                let ty = expr.data_type();
                match ty.value_type() {
                    ValueType::Array => ty.sub_type(),
                    ValueType::String => ResolvedType::of(ValueType::String),
                    _ => ResolvedType::any(),
                }
            }
            Expr::TemplateString { .. } => ResolvedType::of(ValueType::String),
            Expr::Assignment { expr, .. } => expr.data_type(),
        }
    }

    /// Whether this expression is input-independent and deterministic, i.e. a
    /// candidate for constant folding.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Literal { .. } => true,
            Expr::ColumnRef { .. }
            | Expr::Variable { .. }
            | Expr::LambdaParam { .. }
            | Expr::Lambda { .. }
            | Expr::Assignment { .. } => false,
            Expr::FunctionCall { name, args } => {
                let deterministic = FunctionRegistry::instance()
                    .get(name)
                    .map(|f| f.deterministic)
                    .unwrap_or(false);
                deterministic && args.iter().all(Expr::is_constant)
            }
            _ => self.children().iter().all(|child| child.is_constant()),
        }
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal { .. }
            | Expr::ColumnRef { .. }
            | Expr::Variable { .. }
            | Expr::LambdaParam { .. } => vec![],
            Expr::Unary { expr, .. }
            | Expr::Not { expr }
            | Expr::NullPredicate { expr, .. }
            | Expr::Cast { expr, .. }
            | Expr::DatePart { expr, .. }
            | Expr::Dereference { expr, .. }
            | Expr::Assignment { expr, .. } => vec![&**expr],
            Expr::Arithmetic { left, right, .. }
            | Expr::Comparison { left, right, .. }
            | Expr::Logical { left, right, .. } => vec![&**left, &**right],
            Expr::Like { expr, pattern, .. } => vec![&**expr, &**pattern],
            Expr::In { expr, args, .. } => {
                let mut children: Vec<&Expr> = vec![&**expr];
                children.extend(args.iter());
                children
            }
            Expr::Case {
                when_clauses,
                else_expr,
            } => {
                let mut children = Vec::with_capacity(when_clauses.len() * 2 + 1);
                for clause in when_clauses {
                    children.push(&clause.condition);
                    children.push(&clause.result);
                }
                if let Some(else_expr) = else_expr {
                    children.push(&**else_expr);
                }
                children
            }
            Expr::DateAdd { number, expr, .. } => vec![&**number, &**expr],
            Expr::FunctionCall { args, .. } => args.iter().collect(),
            Expr::Lambda { body, .. } => vec![&**body],
            Expr::Subscript { expr, index } => vec![&**expr, &**index],
            Expr::TemplateString { parts } => parts
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Expr(expr) => Some(expr),
                    TemplatePart::Text(_) => None,
                })
                .collect(),
        }
    }

    /// Semantic equality: structural equality extended with commutative
    /// operand reordering (`a + b` ≡ `b + a`) and mirrored comparisons
    /// (`a > b` ≡ `b < a`). Kept separate from `PartialEq`, which stays
    /// strictly structural for hashing/deduplication.
    pub fn semantic_eq(&self, other: &Expr) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (
                Expr::Arithmetic {
                    op: lop,
                    left: ll,
                    right: lr,
                },
                Expr::Arithmetic {
                    op: rop,
                    left: rl,
                    right: rr,
                },
            ) if lop == rop => {
                (ll.semantic_eq(rl) && lr.semantic_eq(rr))
                    || (lop.is_commutative() && ll.semantic_eq(rr) && lr.semantic_eq(rl))
            }
            (
                Expr::Comparison {
                    op: lop,
                    left: ll,
                    right: lr,
                },
                Expr::Comparison {
                    op: rop,
                    left: rl,
                    right: rr,
                },
            ) => {
                if lop == rop && ll.semantic_eq(rl) && lr.semantic_eq(rr) {
                    return true;
                }
                if lop == rop && lop.is_commutative() && ll.semantic_eq(rr) && lr.semantic_eq(rl) {
                    return true;
                }
                *rop == lop.mirrored() && ll.semantic_eq(rr) && lr.semantic_eq(rl)
            }
            (
                Expr::Logical {
                    op: lop,
                    left: ll,
                    right: lr,
                },
                Expr::Logical {
                    op: rop,
                    left: rl,
                    right: rr,
                },
            ) if lop == rop => {
                (ll.semantic_eq(rl) && lr.semantic_eq(rr))
                    || (ll.semantic_eq(rr) && lr.semantic_eq(rl))
            }
            (Expr::Unary { op: lop, expr: le }, Expr::Unary { op: rop, expr: re }) => {
                lop == rop && le.semantic_eq(re)
            }
            (Expr::Not { expr: le }, Expr::Not { expr: re }) => le.semantic_eq(re),
            (
                Expr::Like {
                    expr: le,
                    pattern: lp,
                    negated: ln,
                },
                Expr::Like {
                    expr: re,
                    pattern: rp,
                    negated: rn,
                },
            ) => ln == rn && le.semantic_eq(re) && lp.semantic_eq(rp),
            (
                Expr::In {
                    expr: le,
                    args: la,
                    negated: ln,
                },
                Expr::In {
                    expr: re,
                    args: ra,
                    negated: rn,
                },
            ) => {
                ln == rn
                    && le.semantic_eq(re)
                    && la.len() == ra.len()
                    && la.iter().zip(ra.iter()).all(|(a, b)| a.semantic_eq(b))
            }
            (
                Expr::NullPredicate {
                    expr: le,
                    negated: ln,
                },
                Expr::NullPredicate {
                    expr: re,
                    negated: rn,
                },
            ) => ln == rn && le.semantic_eq(re),
            (
                Expr::Cast {
                    expr: le,
                    target: lt,
                },
                Expr::Cast {
                    expr: re,
                    target: rt,
                },
            ) => lt == rt && le.semantic_eq(re),
            (
                Expr::FunctionCall {
                    name: ln,
                    args: la,
                },
                Expr::FunctionCall {
                    name: rn,
                    args: ra,
                },
            ) => {
                ln.eq_ignore_ascii_case(rn)
                    && la.len() == ra.len()
                    && la.iter().zip(ra.iter()).all(|(a, b)| a.semantic_eq(b))
            }
            (
                Expr::Subscript {
                    expr: le,
                    index: li,
                },
                Expr::Subscript {
                    expr: re,
                    index: ri,
                },
            ) => le.semantic_eq(re) && li.semantic_eq(ri),
            (
                Expr::Dereference {
                    expr: le, name: ln, ..
                },
                Expr::Dereference {
                    expr: re, name: rn, ..
                },
            ) => ln.eq_ignore_ascii_case(rn) && le.semantic_eq(re),
            _ => false,
        }
    }
}

fn case_result_type(branches: &[ResolvedType]) -> ResolvedType {
    let mut result: Option<ResolvedType> = None;
    for branch in branches {
        result = Some(match result {
            None => branch.clone(),
            Some(current) => {
                if current == *branch {
                    current
                } else {
                    ResolvedType::of(current.value_type().promote(branch.value_type()))
                }
            }
        });
    }
    result.unwrap_or_else(ResolvedType::any)
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, .. } => match value {
                Scalar::String(s) => write!(f, "'{}'", s),
                other => write!(f, "{}", other),
            },
            Expr::ColumnRef {
                name, table_source, ..
            } => match table_source {
                Some(ts) if !ts.alias.is_empty() => write!(f, "{}.{}", ts.alias, name),
                _ => write!(f, "{}", name),
            },
            Expr::Variable { name } => write!(f, "@{}", name),
            Expr::Unary {
                op: UnaryOp::Negate,
                expr,
            } => write!(f, "-{}", expr),
            Expr::Arithmetic { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Comparison { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Logical { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Not { expr } => write!(f, "NOT {}", expr),
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                if *negated {
                    write!(f, "{} NOT LIKE {}", expr, pattern)
                } else {
                    write!(f, "{} LIKE {}", expr, pattern)
                }
            }
            Expr::In {
                expr,
                args,
                negated,
            } => {
                write!(f, "{}", expr)?;
                if *negated {
                    write!(f, " NOT")?;
                }
                write!(f, " IN (")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::NullPredicate { expr, negated } => {
                if *negated {
                    write!(f, "{} IS NOT NULL", expr)
                } else {
                    write!(f, "{} IS NULL", expr)
                }
            }
            Expr::Case {
                when_clauses,
                else_expr,
            } => {
                write!(f, "CASE")?;
                for clause in when_clauses {
                    write!(f, " WHEN {} THEN {}", clause.condition, clause.result)?;
                }
                if let Some(else_expr) = else_expr {
                    write!(f, " ELSE {}", else_expr)?;
                }
                write!(f, " END")
            }
            Expr::Cast { expr, target } => write!(f, "CAST({} AS {})", expr, target),
            Expr::DateAdd { part, number, expr } => {
                write!(f, "DATEADD({}, {}, {})", part, number, expr)
            }
            Expr::DatePart { part, expr } => write!(f, "DATEPART({}, {})", part, expr),
            Expr::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Lambda { params, body, .. } => {
                write!(f, "({})", params.join(", "))?;
                write!(f, " -> {}", body)
            }
            Expr::LambdaParam { name, .. } => write!(f, "{}", name),
            Expr::Dereference { expr, name, .. } => write!(f, "{}.{}", expr, name),
            Expr::Subscript { expr, index } => write!(f, "{}[{}]", expr, index),
            Expr::TemplateString { parts } => {
                write!(f, "`")?;
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => write!(f, "{}", text)?,
                        TemplatePart::Expr(expr) => write!(f, "${{{}}}", expr)?,
                    }
                }
                write!(f, "`")
            }
            Expr::Assignment { name, expr } => write!(f, "@{} = {}", name, expr),
        }
    }
}
