//! Pluggable arithmetic, comparison and logic over [`Variant`]s.
//!
//! [`VariantOperations`] is a strategy: implementations decide how two
//! operands are brought to a common kind ([`VariantOperations::coerce`]) and
//! how a value changes kind ([`VariantOperations::convert`]). The operators
//! themselves are provided methods shared by every strategy.
//!
//! - [`TypeSafeOperations`] only widens numbers; mismatched kinds fail.
//! - [`TypeUnsafeOperations`] coerces freely (numeric text becomes a number,
//!   `String + x` concatenates).

mod arith;
mod convert;
mod safe;
mod unsafe_ops;

use std::fmt;

use crate::error::EvaluationError;
use crate::variant::{Variant, VariantKind};

pub use convert::{convert_lenient, convert_strict, parse_boolean, parse_datetime, parse_number};
pub use safe::TypeSafeOperations;
pub use unsafe_ops::TypeUnsafeOperations;

/// Operations a strategy can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    ShiftLeft,
    ShiftRight,
    And,
    Or,
    Xor,
    Not,
    Negate,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    More,
    MoreEqual,
    In,
    Like,
    Element,
}

impl Operation {
    /// Whether this operation compares its operands rather than computing a value.
    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operation::Equal
                | Operation::NotEqual
                | Operation::Less
                | Operation::LessEqual
                | Operation::More
                | Operation::MoreEqual
                | Operation::In
        )
    }

    /// Whether this operation is `AND`, `OR`, `XOR` or `NOT`.
    #[inline]
    pub fn is_logical(self) -> bool {
        matches!(self, Operation::And | Operation::Or | Operation::Xor | Operation::Not)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Operation::*;
        let s = match self {
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Pow => "^",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            Not => "NOT",
            Negate => "unary -",
            Equal => "=",
            NotEqual => "<>",
            Less => "<",
            LessEqual => "<=",
            More => ">",
            MoreEqual => ">=",
            In => "IN",
            Like => "LIKE",
            Element => "[]",
        };
        write!(f, "{}", s)
    }
}

/// A strategy for applying operators to variants.
///
/// A Null operand makes every operator yield Null, except `=`/`<>` where
/// Null equals only Null.
pub trait VariantOperations: Send + Sync {
    /// Convert `value` to `kind`.
    fn convert(&self, value: &Variant, kind: VariantKind) -> Result<Variant, EvaluationError>;

    /// Bring two non-null operands to a common kind for `operation`.
    ///
    /// DateTime/Duration pairs that have a defined arithmetic are returned
    /// unchanged.
    fn coerce(
        &self,
        operation: Operation,
        left: &Variant,
        right: &Variant,
    ) -> Result<(Variant, Variant), EvaluationError>;

    fn add(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Add, left, right, arith::add)
    }

    fn sub(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Sub, left, right, arith::sub)
    }

    fn mul(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Mul, left, right, arith::mul)
    }

    fn div(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Div, left, right, arith::div)
    }

    fn rem(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Mod, left, right, arith::rem)
    }

    /// Exponentiation, always computed as Double.
    fn pow(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Pow, left, right, arith::pow)
    }

    fn shift_left(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::ShiftLeft, left, right, |a, b| {
            arith::shift(Operation::ShiftLeft, a, b)
        })
    }

    fn shift_right(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::ShiftRight, left, right, |a, b| {
            arith::shift(Operation::ShiftRight, a, b)
        })
    }

    fn and(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::And, left, right, |a, b| arith::logic(Operation::And, a, b))
    }

    fn or(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Or, left, right, |a, b| arith::logic(Operation::Or, a, b))
    }

    fn xor(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.binary(Operation::Xor, left, right, |a, b| arith::logic(Operation::Xor, a, b))
    }

    fn not(&self, value: &Variant) -> Result<Variant, EvaluationError> {
        match value {
            Variant::Null => Ok(Variant::Null),
            Variant::String(_) => arith::not(&self.convert(value, VariantKind::Boolean)?),
            other => arith::not(other),
        }
    }

    fn negative(&self, value: &Variant) -> Result<Variant, EvaluationError> {
        match value {
            Variant::Null => Ok(Variant::Null),
            Variant::String(text) => {
                let kind = parse_number(text).map_or(VariantKind::Double, |n| n.kind());
                arith::negate(&self.convert(value, kind)?)
            }
            other => arith::negate(other),
        }
    }

    fn equal(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        match (left, right) {
            (Variant::Null, Variant::Null) => Ok(Variant::Boolean(true)),
            (Variant::Null, _) | (_, Variant::Null) => Ok(Variant::Boolean(false)),
            _ => {
                let (a, b) = self.coerce(Operation::Equal, left, right)?;
                Ok(Variant::Boolean(a == b))
            }
        }
    }

    fn not_equal(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        match self.equal(left, right)? {
            Variant::Boolean(v) => Ok(Variant::Boolean(!v)),
            other => Ok(other),
        }
    }

    fn less(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.ordering(Operation::Less, left, right, |o| o.is_lt())
    }

    fn less_equal(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.ordering(Operation::LessEqual, left, right, |o| o.is_le())
    }

    fn more(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.ordering(Operation::More, left, right, |o| o.is_gt())
    }

    fn more_equal(&self, left: &Variant, right: &Variant) -> Result<Variant, EvaluationError> {
        self.ordering(Operation::MoreEqual, left, right, |o| o.is_ge())
    }

    /// Array membership: whether `collection` holds an element equal to `value`.
    ///
    /// A non-array collection is compared with `value` directly.
    fn contains(&self, collection: &Variant, value: &Variant) -> Result<Variant, EvaluationError> {
        match collection {
            Variant::Null => Ok(Variant::Null),
            Variant::Array(items) => {
                for item in items {
                    if self.equal(value, item)? == Variant::Boolean(true) {
                        return Ok(Variant::Boolean(true));
                    }
                }
                Ok(Variant::Boolean(false))
            }
            other => self.equal(value, other),
        }
    }

    /// SQL `LIKE` with `%` and `_` wildcards.
    fn like(&self, value: &Variant, pattern: &Variant) -> Result<Variant, EvaluationError> {
        if value.is_null() || pattern.is_null() {
            return Ok(Variant::Null);
        }
        let text = self.convert(value, VariantKind::String)?;
        let pattern_text = self.convert(pattern, VariantKind::String)?;
        match (text.as_str(), pattern_text.as_str()) {
            (Some(t), Some(p)) => arith::like(t, p).map(Variant::Boolean),
            _ => Err(arith::mismatch(Operation::Like, value, pattern)),
        }
    }

    /// 0-based indexing into an Array (element) or a String (one-character String).
    fn get_element(&self, value: &Variant, index: &Variant) -> Result<Variant, EvaluationError> {
        if value.is_null() || index.is_null() {
            return Ok(Variant::Null);
        }
        let index = match index {
            Variant::Integer(_) | Variant::Long(_) | Variant::String(_) => self
                .convert(index, VariantKind::Long)?
                .as_i64()
                .ok_or(EvaluationError::NonIntegerIndex { kind: index.kind() })?,
            other => return Err(EvaluationError::NonIntegerIndex { kind: other.kind() }),
        };

        match value {
            Variant::Array(items) => usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .cloned()
                .ok_or(EvaluationError::IndexOutOfRange {
                    index,
                    length: items.len(),
                }),
            Variant::String(text) => usize::try_from(index)
                .ok()
                .and_then(|i| text.chars().nth(i))
                .map(|ch| Variant::String(ch.to_string()))
                .ok_or_else(|| EvaluationError::IndexOutOfRange {
                    index,
                    length: text.chars().count(),
                }),
            other => Err(EvaluationError::UnsupportedOperation {
                operation: Operation::Element,
                kind: other.kind(),
            }),
        }
    }

    #[doc(hidden)]
    fn binary(
        &self,
        operation: Operation,
        left: &Variant,
        right: &Variant,
        apply: fn(&Variant, &Variant) -> Result<Variant, EvaluationError>,
    ) -> Result<Variant, EvaluationError> {
        if left.is_null() || right.is_null() {
            return Ok(Variant::Null);
        }
        let (a, b) = self.coerce(operation, left, right)?;
        apply(&a, &b)
    }

    #[doc(hidden)]
    fn ordering(
        &self,
        operation: Operation,
        left: &Variant,
        right: &Variant,
        test: fn(std::cmp::Ordering) -> bool,
    ) -> Result<Variant, EvaluationError> {
        if left.is_null() || right.is_null() {
            return Ok(Variant::Null);
        }
        let (a, b) = self.coerce(operation, left, right)?;
        arith::compare(operation, &a, &b).map(|o| Variant::Boolean(test(o)))
    }
}

/// Widen two numeric operands to the higher-ranked of their kinds.
pub(crate) fn promote<O: VariantOperations + ?Sized>(
    ops: &O,
    left: &Variant,
    right: &Variant,
) -> Option<Result<(Variant, Variant), EvaluationError>> {
    let (l, r) = (left.kind().numeric_rank()?, right.kind().numeric_rank()?);
    let target = if l >= r { left.kind() } else { right.kind() };
    Some(
        ops.convert(left, target)
            .and_then(|a| ops.convert(right, target).map(|b| (a, b))),
    )
}

/// Whether `left`/`right` form a DateTime/Duration pair with defined arithmetic.
pub(crate) fn is_temporal_pair(operation: Operation, left: &Variant, right: &Variant) -> bool {
    use VariantKind::*;
    match operation {
        Operation::Add => matches!(
            (left.kind(), right.kind()),
            (DateTime, Duration) | (Duration, DateTime) | (Duration, Duration)
        ),
        Operation::Sub => matches!(
            (left.kind(), right.kind()),
            (DateTime, Duration) | (DateTime, DateTime) | (Duration, Duration)
        ),
        _ => false,
    }
}
