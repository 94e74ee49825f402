//! Operator kernels over already-coerced operands.
//!
//! Strategies bring both operands to a common kind first; these functions
//! only dispatch on matching pairs (plus the DateTime/Duration mixes).

use std::cmp::Ordering;

use chrono::Duration;
use ordered_float::OrderedFloat;
use regex::Regex;

use super::Operation;
use crate::error::EvaluationError;
use crate::variant::Variant;

pub(crate) fn mismatch(operation: Operation, left: &Variant, right: &Variant) -> EvaluationError {
    EvaluationError::TypeMismatch {
        operation,
        left: left.kind(),
        right: right.kind(),
    }
}

fn overflow(operation: Operation) -> EvaluationError {
    EvaluationError::Overflow { operation }
}

fn double(value: f64) -> Variant {
    Variant::Double(OrderedFloat(value))
}

fn float(value: f32) -> Variant {
    Variant::Float(OrderedFloat(value))
}

pub(crate) fn add(left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
    let op = Operation::Add;
    match (left, right) {
        (Variant::Integer(a), Variant::Integer(b)) => {
            a.checked_add(*b).map(Variant::Integer).ok_or_else(|| overflow(op))
        }
        (Variant::Long(a), Variant::Long(b)) => {
            a.checked_add(*b).map(Variant::Long).ok_or_else(|| overflow(op))
        }
        (Variant::Float(a), Variant::Float(b)) => Ok(float(a.0 + b.0)),
        (Variant::Double(a), Variant::Double(b)) => Ok(double(a.0 + b.0)),
        (Variant::String(a), Variant::String(b)) => Ok(Variant::String(format!("{}{}", a, b))),
        (Variant::Duration(a), Variant::Duration(b)) => {
            a.checked_add(b).map(Variant::Duration).ok_or_else(|| overflow(op))
        }
        (Variant::DateTime(a), Variant::Duration(b))
        | (Variant::Duration(b), Variant::DateTime(a)) => {
            a.checked_add_signed(*b).map(Variant::DateTime).ok_or_else(|| overflow(op))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

pub(crate) fn sub(left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
    let op = Operation::Sub;
    match (left, right) {
        (Variant::Integer(a), Variant::Integer(b)) => {
            a.checked_sub(*b).map(Variant::Integer).ok_or_else(|| overflow(op))
        }
        (Variant::Long(a), Variant::Long(b)) => {
            a.checked_sub(*b).map(Variant::Long).ok_or_else(|| overflow(op))
        }
        (Variant::Float(a), Variant::Float(b)) => Ok(float(a.0 - b.0)),
        (Variant::Double(a), Variant::Double(b)) => Ok(double(a.0 - b.0)),
        (Variant::Duration(a), Variant::Duration(b)) => {
            a.checked_sub(b).map(Variant::Duration).ok_or_else(|| overflow(op))
        }
        (Variant::DateTime(a), Variant::DateTime(b)) => {
            Ok(Variant::Duration(a.signed_duration_since(*b)))
        }
        (Variant::DateTime(a), Variant::Duration(b)) => {
            a.checked_sub_signed(*b).map(Variant::DateTime).ok_or_else(|| overflow(op))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

pub(crate) fn mul(left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
    let op = Operation::Mul;
    match (left, right) {
        (Variant::Integer(a), Variant::Integer(b)) => {
            a.checked_mul(*b).map(Variant::Integer).ok_or_else(|| overflow(op))
        }
        (Variant::Long(a), Variant::Long(b)) => {
            a.checked_mul(*b).map(Variant::Long).ok_or_else(|| overflow(op))
        }
        (Variant::Float(a), Variant::Float(b)) => Ok(float(a.0 * b.0)),
        (Variant::Double(a), Variant::Double(b)) => Ok(double(a.0 * b.0)),
        _ => Err(mismatch(op, left, right)),
    }
}

pub(crate) fn div(left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
    let op = Operation::Div;
    match (left, right) {
        (Variant::Integer(_), Variant::Integer(0)) | (Variant::Long(_), Variant::Long(0)) => {
            Err(EvaluationError::DivisionByZero)
        }
        (Variant::Integer(a), Variant::Integer(b)) => {
            a.checked_div(*b).map(Variant::Integer).ok_or_else(|| overflow(op))
        }
        (Variant::Long(a), Variant::Long(b)) => {
            a.checked_div(*b).map(Variant::Long).ok_or_else(|| overflow(op))
        }
        (Variant::Float(a), Variant::Float(b)) => Ok(float(a.0 / b.0)),
        (Variant::Double(a), Variant::Double(b)) => Ok(double(a.0 / b.0)),
        _ => Err(mismatch(op, left, right)),
    }
}

pub(crate) fn rem(left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
    let op = Operation::Mod;
    match (left, right) {
        (Variant::Integer(_), Variant::Integer(0)) | (Variant::Long(_), Variant::Long(0)) => {
            Err(EvaluationError::DivisionByZero)
        }
        (Variant::Integer(a), Variant::Integer(b)) => {
            a.checked_rem(*b).map(Variant::Integer).ok_or_else(|| overflow(op))
        }
        (Variant::Long(a), Variant::Long(b)) => {
            a.checked_rem(*b).map(Variant::Long).ok_or_else(|| overflow(op))
        }
        (Variant::Float(a), Variant::Float(b)) => Ok(float(a.0 % b.0)),
        (Variant::Double(a), Variant::Double(b)) => Ok(double(a.0 % b.0)),
        _ => Err(mismatch(op, left, right)),
    }
}

pub(crate) fn pow(left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(double(a.powf(b))),
        _ => Err(mismatch(Operation::Pow, left, right)),
    }
}

pub(crate) fn shift(
    operation: Operation,
    left: &Variant,
    right: &Variant,
) -> Result<Variant, EvaluationError> {
    let amount = right
        .as_i64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| mismatch(operation, left, right))?;
    let left_shift = operation == Operation::ShiftLeft;
    match left {
        Variant::Integer(a) => {
            let shifted = if left_shift { a.checked_shl(amount) } else { a.checked_shr(amount) };
            shifted.map(Variant::Integer).ok_or_else(|| overflow(operation))
        }
        Variant::Long(a) => {
            let shifted = if left_shift { a.checked_shl(amount) } else { a.checked_shr(amount) };
            shifted.map(Variant::Long).ok_or_else(|| overflow(operation))
        }
        _ => Err(mismatch(operation, left, right)),
    }
}

pub(crate) fn logic(
    operation: Operation,
    left: &Variant,
    right: &Variant,
) -> Result<Variant, EvaluationError> {
    match (left, right) {
        (Variant::Boolean(a), Variant::Boolean(b)) => Ok(Variant::Boolean(match operation {
            Operation::And => *a && *b,
            Operation::Or => *a || *b,
            _ => a ^ b,
        })),
        (Variant::Integer(a), Variant::Integer(b)) => Ok(Variant::Integer(match operation {
            Operation::And => a & b,
            Operation::Or => a | b,
            _ => a ^ b,
        })),
        (Variant::Long(a), Variant::Long(b)) => Ok(Variant::Long(match operation {
            Operation::And => a & b,
            Operation::Or => a | b,
            _ => a ^ b,
        })),
        _ => Err(mismatch(operation, left, right)),
    }
}

pub(crate) fn not(value: &Variant) -> Result<Variant, EvaluationError> {
    match value {
        Variant::Boolean(v) => Ok(Variant::Boolean(!v)),
        Variant::Integer(v) => Ok(Variant::Integer(!v)),
        Variant::Long(v) => Ok(Variant::Long(!v)),
        other => Err(EvaluationError::UnsupportedOperation {
            operation: Operation::Not,
            kind: other.kind(),
        }),
    }
}

pub(crate) fn negate(value: &Variant) -> Result<Variant, EvaluationError> {
    let op = Operation::Negate;
    match value {
        Variant::Integer(v) => v.checked_neg().map(Variant::Integer).ok_or_else(|| overflow(op)),
        Variant::Long(v) => v.checked_neg().map(Variant::Long).ok_or_else(|| overflow(op)),
        Variant::Float(v) => Ok(float(-v.0)),
        Variant::Double(v) => Ok(double(-v.0)),
        Variant::Duration(v) => Ok(Variant::Duration(Duration::zero() - *v)),
        other => Err(EvaluationError::UnsupportedOperation {
            operation: op,
            kind: other.kind(),
        }),
    }
}

pub(crate) fn compare(
    operation: Operation,
    left: &Variant,
    right: &Variant,
) -> Result<Ordering, EvaluationError> {
    match (left, right) {
        (Variant::Integer(a), Variant::Integer(b)) => Ok(a.cmp(b)),
        (Variant::Long(a), Variant::Long(b)) => Ok(a.cmp(b)),
        (Variant::Float(a), Variant::Float(b)) => Ok(a.cmp(b)),
        (Variant::Double(a), Variant::Double(b)) => Ok(a.cmp(b)),
        (Variant::String(a), Variant::String(b)) => Ok(a.cmp(b)),
        (Variant::Boolean(a), Variant::Boolean(b)) => Ok(a.cmp(b)),
        (Variant::DateTime(a), Variant::DateTime(b)) => Ok(a.cmp(b)),
        (Variant::Duration(a), Variant::Duration(b)) => Ok(a.cmp(b)),
        _ => Err(mismatch(operation, left, right)),
    }
}

/// SQL `LIKE`: `%` matches any run, `_` any single character, anchored at both ends.
pub(crate) fn like(text: &str, pattern: &str) -> Result<bool, EvaluationError> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push_str("^(?s:");
    for ch in pattern.chars() {
        match ch {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push_str(")$");

    let regex = Regex::new(&expr).map_err(|err| EvaluationError::InvalidArgument {
        function: Operation::Like.to_string(),
        detail: err.to_string(),
    })?;
    Ok(regex.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_integer_arithmetic() {
        assert_eq!(add(&Variant::from(2), &Variant::from(2)), Ok(Variant::from(4)));
        assert_eq!(
            add(&Variant::from(i32::MAX), &Variant::from(1)),
            Err(EvaluationError::Overflow { operation: Operation::Add })
        );
        assert_eq!(
            div(&Variant::from(1), &Variant::from(0)),
            Err(EvaluationError::DivisionByZero)
        );
        assert_eq!(rem(&Variant::from(7i64), &Variant::from(4i64)), Ok(Variant::from(3i64)));
    }

    #[test]
    fn power_is_real_exponentiation() {
        assert_eq!(pow(&Variant::from(2), &Variant::from(10)), Ok(Variant::from(1024.0)));
        assert_eq!(pow(&Variant::from(9.0), &Variant::from(0.5)), Ok(Variant::from(3.0)));
    }

    #[test]
    fn logic_is_bitwise_on_integers() {
        assert_eq!(
            logic(Operation::And, &Variant::from(6), &Variant::from(3)),
            Ok(Variant::from(2))
        );
        assert_eq!(
            logic(Operation::Xor, &Variant::from(true), &Variant::from(true)),
            Ok(Variant::from(false))
        );
        assert_eq!(not(&Variant::from(0)), Ok(Variant::from(-1)));
    }

    #[test]
    fn shifts() {
        assert_eq!(
            shift(Operation::ShiftLeft, &Variant::from(1), &Variant::from(4)),
            Ok(Variant::from(16))
        );
        assert_eq!(
            shift(Operation::ShiftRight, &Variant::from(-16i64), &Variant::from(2)),
            Ok(Variant::from(-4i64))
        );
        assert!(shift(Operation::ShiftLeft, &Variant::from(1), &Variant::from(-1)).is_err());
    }

    #[test]
    fn like_wildcards() {
        assert_eq!(like("hello", "h%o"), Ok(true));
        assert_eq!(like("hello", "h_llo"), Ok(true));
        assert_eq!(like("hello", "h_lo"), Ok(false));
        assert_eq!(like("a.b", "a.b"), Ok(true));
        assert_eq!(like("axb", "a.b"), Ok(false));
        assert_eq!(like("Hello", "hello"), Ok(false));
    }
}
