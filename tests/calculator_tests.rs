//! Integration tests for the expression calculator.
//!
//! These exercise the public API end to end: text in, value out.

use std::sync::Arc;

use expressions::{
    evaluate, parse_expression, EvaluationError, ExpressionCalculator, ExpressionTokenKind,
    ExpressionsError, FunctionCollection, SyntaxErrorKind, TypeSafeOperations,
    TypeUnsafeOperations, Variant, VariableCollection,
};

fn eval(text: &str) -> Result<Variant, ExpressionsError> {
    ExpressionCalculator::with_expression(text)?.evaluate()
}

fn eval_with(text: &str, variables: &[(&str, Variant)]) -> Result<Variant, ExpressionsError> {
    let variables: VariableCollection = variables.iter().cloned().collect();
    ExpressionCalculator::with_expression(text)?.evaluate_with_variables(&variables)
}

#[test]
fn test_simple_arithmetic() {
    assert_eq!(eval("2 + 2").unwrap(), Variant::Integer(4));
    assert_eq!(eval("10 - 4 * 2").unwrap(), Variant::Integer(2));
    assert_eq!(eval("(10 - 4) * 2").unwrap(), Variant::Integer(12));
    assert_eq!(eval("7 / 2").unwrap(), Variant::Integer(3));
    assert_eq!(eval("7.0 / 2").unwrap(), Variant::from(3.5));
    assert_eq!(eval("-3 + +5").unwrap(), Variant::Integer(2));
}

#[test]
fn test_comparisons() {
    assert_eq!(eval("1 > 2").unwrap(), Variant::Boolean(false));
    assert_eq!(eval("2 >= 2").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("'abc' < 'abd'").unwrap(), Variant::Boolean(true));
}

#[test]
fn test_string_indexing() {
    assert_eq!(eval("'abc'[1]").unwrap(), Variant::from("b"));
    assert_eq!(eval("ARRAY(10, 20, 30)[2]").unwrap(), Variant::Integer(30));
    assert!(matches!(
        eval("'abc'[3]"),
        Err(ExpressionsError::Evaluation(EvaluationError::IndexOutOfRange { index: 3, length: 3 }))
    ));
    assert!(matches!(
        eval("'abc'[1.5]"),
        Err(ExpressionsError::Evaluation(EvaluationError::NonIntegerIndex { .. }))
    ));
}

#[test]
fn test_membership() {
    assert_eq!(eval("2 IN ARRAY(1,2,3)").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("5 NOT IN ARRAY(1,2,3)").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("5 in array(1,2,3)").unwrap(), Variant::Boolean(false));
}

#[test]
fn test_like_and_null_checks() {
    assert_eq!(eval("'hello' LIKE 'h%o'").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("'hello' LIKE 'h_llo'").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("'hello' NOT LIKE 'H%'").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("NULL IS NULL").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("Null() IS NOT NULL").unwrap(), Variant::Boolean(false));
    assert_eq!(eval("1 IS NULL").unwrap(), Variant::Boolean(false));
}

#[test]
fn test_mixed_variables() {
    let mut calculator =
        ExpressionCalculator::with_expression("A + b / (3 - Max(-123, 1)*2)").unwrap();

    let names: Vec<_> = calculator
        .default_variables()
        .iter()
        .map(|v| v.name().to_string())
        .collect();
    assert_eq!(names, vec!["A", "b"]);

    calculator.default_variables_mut().set("a", "xyz");
    calculator.default_variables_mut().set("b", 123);
    assert_eq!(calculator.evaluate().unwrap(), Variant::from("xyz123"));
}

#[test]
fn test_unknown_function() {
    assert!(matches!(
        eval("XXX(1)"),
        Err(ExpressionsError::Evaluation(EvaluationError::UnknownFunction { ref name, .. }))
            if name == "XXX"
    ));
}

#[test]
fn test_unset_variable() {
    assert!(matches!(
        eval("x * 2"),
        Err(ExpressionsError::Evaluation(EvaluationError::UnresolvedVariable { .. }))
    ));
    assert_eq!(eval_with("x * 2", &[("X", Variant::from(21))]).unwrap(), Variant::Integer(42));
}

#[test]
fn test_idempotent_evaluation() {
    let mut calculator = ExpressionCalculator::with_expression("a * 2 + LEN").unwrap();
    calculator.default_variables_mut().set("a", 5);
    calculator.default_variables_mut().set("len", 1);
    let first = calculator.evaluate().unwrap();
    for _ in 0..5 {
        assert_eq!(calculator.evaluate().unwrap(), first);
    }
    assert_eq!(calculator.default_variables().len(), 2);
}

#[test]
fn test_functions() {
    assert_eq!(eval("Min(3, 1, 2)").unwrap(), Variant::Integer(1));
    assert_eq!(eval("Sum(1, 2, 3.5)").unwrap(), Variant::from(6.5));
    assert_eq!(eval("If(1 > 0, 'yes', 'no')").unwrap(), Variant::from("yes"));
    assert_eq!(eval("Choose(3, 'a', 'b', 'c')").unwrap(), Variant::from("c"));
    assert_eq!(eval("Contains('abcdef', 'cd')").unwrap(), Variant::Boolean(true));
    assert_eq!(eval("Round(Pi() * 100) / 100.0").unwrap(), Variant::from(3.14));
    assert!(matches!(
        eval("Max(1)"),
        Err(ExpressionsError::Evaluation(EvaluationError::WrongParamCount { .. }))
    ));
}

#[test]
fn test_dates() {
    assert_eq!(
        eval("DayOfWeek(Date(2024, 1, 1))").unwrap(),
        Variant::Integer(1)
    );
    assert_eq!(
        eval("Date(2024, 1, 2) - Date(2024, 1, 1) = TimeSpan(1, 0, 0)").unwrap(),
        Variant::Boolean(true)
    );
    assert_eq!(
        eval("Date(2024, 1, 1) + TimeSpan(1, 2, 0, 0) > Date(2024, 1, 2)").unwrap(),
        Variant::Boolean(true)
    );
}

#[test]
fn test_checked_integer_arithmetic() {
    assert!(matches!(
        eval("1 / 0"),
        Err(ExpressionsError::Evaluation(EvaluationError::DivisionByZero))
    ));
    assert!(matches!(
        eval("2147483647 + 1"),
        Err(ExpressionsError::Evaluation(EvaluationError::Overflow { .. }))
    ));
    assert_eq!(eval("2147483648 + 1").unwrap(), Variant::Long(2_147_483_649));
}

#[test]
fn test_duration_coercion_out_of_range() {
    // The string cannot become a Duration, so both sides compare as text.
    assert_eq!(
        eval("TimeSpan(1) = '-9223372036854775808'").unwrap(),
        Variant::Boolean(false)
    );
    // i64::MIN milliseconds is no Duration, so the span falls back to Long.
    assert_eq!(
        eval("TimeSpan(1) + (-9223372036854775807 - 1)").unwrap(),
        Variant::Long(i64::MIN + 1)
    );
    assert_eq!(eval("TimeSpan(1) + 1 = TimeSpan(2)").unwrap(), Variant::Boolean(true));
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let text = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
    let result = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || ExpressionCalculator::with_expression(&text).map(|_| ()))
        .unwrap()
        .join()
        .unwrap();
    assert!(matches!(
        result,
        Err(ExpressionsError::Syntax(ref err)) if err.kind == SyntaxErrorKind::NestingTooDeep
    ));
    let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
    assert_eq!(eval(&shallow).unwrap(), Variant::Integer(1));
}

#[test]
fn test_comments_are_ignored() {
    assert_eq!(eval("1 /* one */ + 2 // two").unwrap(), Variant::Integer(3));
}

#[test]
fn test_one_shot_helpers() {
    let postfix = parse_expression("(2+2)*ABS(-2)").unwrap();
    let kinds: Vec<_> = postfix.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ExpressionTokenKind::Constant,
            ExpressionTokenKind::Constant,
            ExpressionTokenKind::Plus,
            ExpressionTokenKind::Constant,
            ExpressionTokenKind::Unary,
            ExpressionTokenKind::Constant,
            ExpressionTokenKind::Function,
            ExpressionTokenKind::Star,
        ]
    );

    let variables: VariableCollection = [("x", 2)].into_iter().collect();
    let functions = FunctionCollection::with_defaults();
    assert_eq!(
        evaluate("x ^ 10", &variables, &functions, Arc::new(TypeUnsafeOperations::new())).unwrap(),
        Variant::from(1024.0)
    );
    let strict = Arc::new(TypeSafeOperations::new());
    assert!(evaluate("'1' + 1", &variables, &functions, strict).is_err());
}
