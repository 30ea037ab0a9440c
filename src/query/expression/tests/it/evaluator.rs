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

use tessera_common_expression::ArithmeticOp;
use tessera_common_expression::Column;
use tessera_common_expression::ComparisonOp;
use tessera_common_expression::DatePart;
use tessera_common_expression::ExecutionContext;
use tessera_common_expression::Expr;
use tessera_common_expression::ResolvedType;
use tessera_common_expression::Scalar;
use tessera_common_expression::Schema;
use tessera_common_expression::SchemaColumn;
use tessera_common_expression::TableSourceReference;
use tessera_common_expression::TemplatePart;
use tessera_common_expression::TupleVector;
use tessera_common_expression::UnaryOp;
use tessera_common_expression::ValueType;
use tessera_common_expression::ValueVector;
use tessera_common_expression::WhenClause;
use tessera_common_expression::parse_datetime_micros;

use crate::batch_of;
use crate::eval;
use crate::eval_values;
use crate::vector_of;

fn ints(values: Vec<Option<i32>>) -> Arc<ValueVector> {
    vector_of(
        ValueType::Int,
        values
            .into_iter()
            .map(|v| v.map(Scalar::Int).unwrap_or(Scalar::Null))
            .collect(),
    )
}

fn strings(values: Vec<Option<&str>>) -> Arc<ValueVector> {
    vector_of(
        ValueType::String,
        values
            .into_iter()
            .map(|v| v.map(Scalar::from).unwrap_or(Scalar::Null))
            .collect(),
    )
}

#[test]
fn test_arithmetic_null_propagation() {
    let batch = batch_of(vec![("a", ints(vec![Some(1), None, Some(3)]))]);
    let expr = Expr::arithmetic(ArithmeticOp::Add, Expr::column("a"), Expr::literal(1));
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Int(2), Scalar::Null, Scalar::Int(4)]
    );
}

#[test]
fn test_integer_overflow_fails() {
    let batch = TupleVector::empty(1);
    let expr = Expr::arithmetic(
        ArithmeticOp::Add,
        Expr::literal(i32::MAX),
        Expr::literal(1),
    );
    let mut ctx = ExecutionContext::default();
    let err = expr.eval(&batch, &mut ctx).unwrap_err();
    assert_eq!(err.code(), 18);
}

#[test]
fn test_floor_division_and_modulus() {
    let batch = TupleVector::empty(1);
    let div = Expr::arithmetic(
        ArithmeticOp::Divide,
        Expr::literal(-7),
        Expr::literal(2),
    );
    assert_eq!(eval_values(&div, &batch), vec![Scalar::Int(-4)]);
    let rem = Expr::arithmetic(
        ArithmeticOp::Modulus,
        Expr::literal(-7),
        Expr::literal(2),
    );
    assert_eq!(eval_values(&rem, &batch), vec![Scalar::Int(1)]);
}

#[test]
fn test_string_concat_add() {
    let batch = batch_of(vec![("s", strings(vec![Some("a"), None]))]);
    let expr = Expr::arithmetic(ArithmeticOp::Add, Expr::column("s"), Expr::literal(1));
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::from("a1"), Scalar::Null]
    );
}

#[test]
fn test_unary_negate() {
    let batch = batch_of(vec![("a", ints(vec![Some(5), None]))]);
    let expr = Expr::Unary {
        op: UnaryOp::Negate,
        expr: Box::new(Expr::column("a")),
    };
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Int(-5), Scalar::Null]
    );
}

#[test]
fn test_cross_type_comparison() {
    let batch = batch_of(vec![("s", strings(vec![Some("1"), Some("2")]))]);
    let expr = Expr::equals(Expr::column("s"), Expr::literal(1));
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Boolean(true), Scalar::Boolean(false)]
    );

    let batch = TupleVector::empty(1);
    let expr = Expr::equals(Expr::literal(true), Expr::literal(1));
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(true)]);
    let expr = Expr::equals(Expr::literal(1.5f64), Expr::literal(1));
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(false)]);
}

#[test]
fn test_comparison_null_propagation() {
    let batch = batch_of(vec![("a", ints(vec![Some(1), None]))]);
    let expr = Expr::comparison(ComparisonOp::Gt, Expr::column("a"), Expr::literal(0));
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Boolean(true), Scalar::Null]
    );
}

#[test]
fn test_like() {
    let batch = batch_of(vec![(
        "s",
        strings(vec![Some("payload"), Some("builder"), None]),
    )]);
    let expr = Expr::like(Expr::column("s"), Expr::literal("%load"), false);
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Boolean(true), Scalar::Boolean(false), Scalar::Null]
    );
    // NOT LIKE inverts booleans but keeps nulls
    let expr = Expr::like(Expr::column("s"), Expr::literal("%load"), true);
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::Boolean(false), Scalar::Boolean(true), Scalar::Null]
    );
}

#[test]
fn test_like_literal_roundtrip() {
    let batch = TupleVector::empty(1);
    let expr = Expr::like(Expr::literal("some text"), Expr::literal("some text"), false);
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(true)]);
    let expr = Expr::like(
        Expr::literal("some text"),
        Expr::literal("some textx"),
        false,
    );
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(false)]);
}

#[test]
fn test_in_null_semantics() {
    let batch = TupleVector::empty(1);
    // NULL IN (1, 2, 3) -> NULL
    let expr = Expr::in_list(
        Expr::null_literal(),
        vec![Expr::literal(1), Expr::literal(2), Expr::literal(3)],
        false,
    );
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Null]);
    // 1 IN (NULL, NULL) -> NULL
    let expr = Expr::in_list(
        Expr::literal(1),
        vec![Expr::null_literal(), Expr::null_literal()],
        false,
    );
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Null]);
    // 1 IN (NULL, 1) -> true
    let expr = Expr::in_list(
        Expr::literal(1),
        vec![Expr::null_literal(), Expr::literal(1)],
        false,
    );
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(true)]);
    // 2 NOT IN (1) -> true, cross-type 1 IN ('1') -> true
    let expr = Expr::in_list(Expr::literal(2), vec![Expr::literal(1)], true);
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(true)]);
    let expr = Expr::in_list(Expr::literal(1), vec![Expr::literal("1")], false);
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Boolean(true)]);
}

#[test]
fn test_case_partitions_rows() {
    let batch = batch_of(vec![(
        "col1",
        ints(vec![Some(10), Some(3), Some(-1), None]),
    )]);
    let case = Expr::Case {
        when_clauses: vec![
            WhenClause {
                condition: Expr::comparison(
                    ComparisonOp::Gt,
                    Expr::column("col1"),
                    Expr::literal(5),
                ),
                result: Expr::literal("big"),
            },
            WhenClause {
                condition: Expr::comparison(
                    ComparisonOp::Gt,
                    Expr::column("col1"),
                    Expr::literal(0),
                ),
                result: Expr::literal("small"),
            },
        ],
        else_expr: Some(Box::new(Expr::literal("neg"))),
    };
    // rows whose conditions never matched (including the null row) take ELSE
    assert_eq!(
        eval_values(&case, &batch),
        vec![
            Scalar::from("big"),
            Scalar::from("small"),
            Scalar::from("neg"),
            Scalar::from("neg"),
        ]
    );
}

#[test]
fn test_case_without_else_leaves_null() {
    let batch = batch_of(vec![("col1", ints(vec![Some(10), None]))]);
    let case = Expr::Case {
        when_clauses: vec![WhenClause {
            condition: Expr::comparison(ComparisonOp::Gt, Expr::column("col1"), Expr::literal(5)),
            result: Expr::literal("big"),
        }],
        else_expr: None,
    };
    assert_eq!(
        eval_values(&case, &batch),
        vec![Scalar::from("big"), Scalar::Null]
    );
}

#[test]
fn test_subscript_array() {
    let array = Scalar::Array(Column::Int(vec![10, 20, 30]));
    let batch = TupleVector::empty(1);
    for (index, expected) in [
        (0, Scalar::Int(10)),
        (-1, Scalar::Int(30)),
        (-5, Scalar::Null),
        (3, Scalar::Null),
    ] {
        let expr = Expr::Subscript {
            expr: Box::new(Expr::Literal {
                value: array.clone(),
                ty: ResolvedType::array(ResolvedType::of(ValueType::Int)),
            }),
            index: Box::new(Expr::literal(index)),
        };
        assert_eq!(eval_values(&expr, &batch), vec![expected]);
    }
}

#[test]
fn test_subscript_string() {
    let batch = TupleVector::empty(1);
    for (index, expected) in [
        (0, Scalar::from("a")),
        (-1, Scalar::from("c")),
        (5, Scalar::Null),
    ] {
        let expr = Expr::Subscript {
            expr: Box::new(Expr::literal("abc")),
            index: Box::new(Expr::literal(index)),
        };
        assert_eq!(eval_values(&expr, &batch), vec![expected]);
    }
}

fn table_value() -> (Scalar, ResolvedType) {
    let schema = Arc::new(Schema::new(vec![
        SchemaColumn::new("id", ResolvedType::of(ValueType::Int)),
        SchemaColumn::new("name", ResolvedType::of(ValueType::String)),
    ]));
    let id = ints(vec![Some(1), Some(2)]);
    let name = strings(vec![Some("x"), Some("y")]);
    let table = TupleVector::new(schema.clone(), vec![id, name], 2);
    (Scalar::Table(table), ResolvedType::table(schema))
}

#[test]
fn test_subscript_table() {
    let (table, ty) = table_value();
    let batch = TupleVector::empty(1);
    // Table[int] is a single-row object view
    let expr = Expr::Subscript {
        expr: Box::new(Expr::Literal {
            value: table.clone(),
            ty: ty.clone(),
        }),
        index: Box::new(Expr::literal(1)),
    };
    match &eval_values(&expr, &batch)[0] {
        Scalar::Object(object) => {
            assert_eq!(object.get("id").unwrap(), &Scalar::Int(2));
            assert_eq!(object.get("name").unwrap(), &Scalar::from("y"));
        }
        other => panic!("expected object, got {:?}", other),
    }
    // Table[string] is the column as an array
    let expr = Expr::Subscript {
        expr: Box::new(Expr::Literal { value: table, ty }),
        index: Box::new(Expr::literal("id")),
    };
    match &eval_values(&expr, &batch)[0] {
        Scalar::Array(col) => {
            assert_eq!(col.len(), 2);
        }
        other => panic!("expected array, got {:?}", other),
    }
    // out of bounds is null, not an error
    let (table, ty) = table_value();
    let expr = Expr::Subscript {
        expr: Box::new(Expr::Literal { value: table, ty }),
        index: Box::new(Expr::literal(9)),
    };
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Null]);
}

#[test]
fn test_subscript_type_error() {
    let batch = TupleVector::empty(1);
    let expr = Expr::Subscript {
        expr: Box::new(Expr::literal(1)),
        index: Box::new(Expr::literal(0)),
    };
    let mut ctx = ExecutionContext::default();
    let err = expr.eval(&batch, &mut ctx).unwrap_err();
    assert_eq!(err.code(), 7);
}

#[test]
fn test_dereference_object() {
    let (table, ty) = table_value();
    let batch = TupleVector::empty(1);
    let row = Expr::Subscript {
        expr: Box::new(Expr::Literal { value: table, ty }),
        index: Box::new(Expr::literal(0)),
    };
    let expr = Expr::Dereference {
        expr: Box::new(row),
        name: "name".to_string(),
        ordinal: None,
    };
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::from("x")]);
}

#[test]
fn test_template_string() {
    let batch = batch_of(vec![("a", ints(vec![Some(7), None]))]);
    let expr = Expr::TemplateString {
        parts: vec![
            TemplatePart::Text("value=".to_string()),
            TemplatePart::Expr(Expr::column("a")),
            TemplatePart::Text("!".to_string()),
        ],
    };
    assert_eq!(
        eval_values(&expr, &batch),
        vec![Scalar::from("value=7!"), Scalar::from("value=!")]
    );
}

#[test]
fn test_assignment_and_variable() {
    let batch = batch_of(vec![("a", ints(vec![Some(1), Some(2)]))]);
    let mut ctx = ExecutionContext::default();
    let assign = Expr::Assignment {
        name: "total".to_string(),
        expr: Box::new(Expr::column("a")),
    };
    assign.eval(&batch, &mut ctx).unwrap();
    let read = Expr::Variable {
        name: "Total".to_string(),
    };
    let values = read.eval(&batch, &mut ctx).unwrap().to_scalars();
    assert_eq!(values, vec![Scalar::Int(1), Scalar::Int(2)]);
    // unknown variables read as null
    let unknown = Expr::Variable {
        name: "missing".to_string(),
    };
    let values = unknown.eval(&batch, &mut ctx).unwrap().to_scalars();
    assert_eq!(values, vec![Scalar::Null, Scalar::Null]);
}

#[test]
fn test_cast() {
    let batch = TupleVector::empty(1);
    let expr = Expr::cast(Expr::literal("42"), ResolvedType::of(ValueType::Long));
    assert_eq!(eval_values(&expr, &batch), vec![Scalar::Long(42)]);

    let mut ctx = ExecutionContext::default();
    let bad = Expr::cast(Expr::literal(1), ResolvedType::any());
    assert_eq!(bad.eval(&batch, &mut ctx).unwrap_err().code(), 7);
}

#[test]
fn test_date_add_and_part() {
    let micros = parse_datetime_micros("2024-01-31").unwrap();
    let batch = TupleVector::empty(1);
    let date = Expr::Literal {
        value: Scalar::DateTime(micros),
        ty: ResolvedType::of(ValueType::DateTime),
    };
    let add = Expr::DateAdd {
        part: DatePart::Day,
        number: Box::new(Expr::literal(1)),
        expr: Box::new(date.clone()),
    };
    let expected = parse_datetime_micros("2024-02-01").unwrap();
    assert_eq!(eval_values(&add, &batch), vec![Scalar::DateTime(expected)]);

    let part = Expr::DatePart {
        part: DatePart::Year,
        expr: Box::new(date),
    };
    assert_eq!(eval_values(&part, &batch), vec![Scalar::Int(2024)]);
}

#[test]
fn test_scalar_functions() {
    let batch = batch_of(vec![("s", strings(vec![Some("AbC"), None]))]);
    let lower = Expr::FunctionCall {
        name: "lower".to_string(),
        args: vec![Expr::column("s")],
    };
    assert_eq!(
        eval_values(&lower, &batch),
        vec![Scalar::from("abc"), Scalar::Null]
    );
    let coalesce = Expr::FunctionCall {
        name: "coalesce".to_string(),
        args: vec![Expr::column("s"), Expr::literal("fallback")],
    };
    assert_eq!(
        eval_values(&coalesce, &batch),
        vec![Scalar::from("AbC"), Scalar::from("fallback")]
    );
}

#[test]
fn test_unknown_function_is_planner_invariant() {
    let batch = TupleVector::empty(1);
    let expr = Expr::FunctionCall {
        name: "no_such_function".to_string(),
        args: vec![],
    };
    let mut ctx = ExecutionContext::default();
    assert_eq!(expr.eval(&batch, &mut ctx).unwrap_err().code(), 8);
}

#[test]
fn test_lambda_functions() {
    let array = vector_of(
        ValueType::Array,
        vec![
            Scalar::Array(Column::Int(vec![1, 2, 3])),
            Scalar::Null,
        ],
    );
    let batch = batch_of(vec![("arr", array)]);
    let lambda = Expr::Lambda {
        params: vec!["x".to_string()],
        slots: vec![0],
        body: Box::new(Expr::arithmetic(
            ArithmeticOp::Multiply,
            Expr::LambdaParam {
                name: "x".to_string(),
                slot: 0,
            },
            Expr::literal(2),
        )),
    };
    let map = Expr::FunctionCall {
        name: "map".to_string(),
        args: vec![Expr::column("arr"), lambda],
    };
    let values = eval_values(&map, &batch);
    match &values[0] {
        Scalar::Array(col) => {
            assert_eq!(col.len(), 3);
            assert_eq!(col.index(0).to_owned(), Scalar::Int(2));
            assert_eq!(col.index(2).to_owned(), Scalar::Int(6));
        }
        other => panic!("expected array, got {:?}", other),
    }
    assert_eq!(values[1], Scalar::Null);

    let predicate = Expr::Lambda {
        params: vec!["x".to_string()],
        slots: vec![0],
        body: Box::new(Expr::comparison(
            ComparisonOp::Gt,
            Expr::LambdaParam {
                name: "x".to_string(),
                slot: 0,
            },
            Expr::literal(1),
        )),
    };
    let any = Expr::FunctionCall {
        name: "any".to_string(),
        args: vec![Expr::column("arr"), predicate],
    };
    let values = eval_values(&any, &batch);
    assert_eq!(values[0], Scalar::Boolean(true));
    assert_eq!(values[1], Scalar::Null);
}

#[test]
fn test_ambiguous_column_fails() {
    let t0 = TableSourceReference::new(0, "t0", "a");
    let t1 = TableSourceReference::new(1, "t1", "b");
    let schema = Arc::new(Schema::new(vec![
        SchemaColumn::new("id", ResolvedType::of(ValueType::Int)).with_table_source(t0),
        SchemaColumn::new("id", ResolvedType::of(ValueType::Int)).with_table_source(t1),
    ]));
    let column = ints(vec![Some(1)]);
    let batch = TupleVector::new(schema, vec![column.clone(), column], 1);
    let mut ctx = ExecutionContext::default();
    let err = Expr::column("id").eval(&batch, &mut ctx).unwrap_err();
    assert_eq!(err.code(), 17);
}

#[test]
fn test_lazy_vectors_are_views() {
    // arithmetic over plain numeric columns must not materialize
    let batch = batch_of(vec![("a", ints(vec![Some(1), Some(2)]))]);
    let expr = Expr::arithmetic(
        ArithmeticOp::Add,
        Expr::cast(Expr::column("a"), ResolvedType::of(ValueType::Double)),
        Expr::literal(0.5f64),
    );
    let vector = eval(&expr, &batch);
    assert!(matches!(&*vector, ValueVector::Computed(_)));
    assert_eq!(vector.get_double(1), 2.5);
}
