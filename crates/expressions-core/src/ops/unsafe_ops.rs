use super::arith::mismatch;
use super::convert::{convert_lenient, parse_number};
use super::{is_temporal_pair, promote, Operation, VariantOperations};
use crate::error::EvaluationError;
use crate::variant::{Variant, VariantKind};

/// Operations that coerce operands to a common kind before applying an operator.
///
/// - numeric text against a number is parsed and widened with it;
/// - `String + x` concatenates the string form of `x`;
/// - two strings are compared numerically when both look like numbers,
///   lexically otherwise;
/// - a Boolean against anything else compares as Boolean;
/// - otherwise the right operand is converted to the left operand's kind
///   (or the left to the right's when that fails).
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeUnsafeOperations;

impl TypeUnsafeOperations {
    pub fn new() -> Self {
        Self
    }
}

impl VariantOperations for TypeUnsafeOperations {
    fn convert(&self, value: &Variant, kind: VariantKind) -> Result<Variant, EvaluationError> {
        convert_lenient(value, kind)
    }

    fn coerce(
        &self,
        operation: Operation,
        left: &Variant,
        right: &Variant,
    ) -> Result<(Variant, Variant), EvaluationError> {
        if is_temporal_pair(operation, left, right) {
            return Ok((left.clone(), right.clone()));
        }

        match (left, right) {
            (Variant::String(_), Variant::String(_)) if operation == Operation::Add => {
                return Ok((left.clone(), right.clone()));
            }
            (Variant::String(a), Variant::String(b)) => {
                if let (Some(a), Some(b)) = (parse_number(a), parse_number(b)) {
                    if let Some(result) = promote(self, &a, &b) {
                        return result;
                    }
                }
                if operation.is_logical() {
                    return Ok((
                        self.convert(left, VariantKind::Boolean)?,
                        self.convert(right, VariantKind::Boolean)?,
                    ));
                }
                if operation.is_comparison() {
                    return Ok((left.clone(), right.clone()));
                }
                return Err(mismatch(operation, left, right));
            }
            (Variant::String(_), _) if operation == Operation::Add => {
                return Ok((left.clone(), Variant::String(right.to_string())));
            }
            _ if left.kind() == right.kind() => return Ok((left.clone(), right.clone())),
            _ => {}
        }

        if let Some(result) = promote(self, left, right) {
            return result;
        }

        let numeric_text = match (left, right) {
            (Variant::String(text), other) if other.kind().is_numeric() => {
                Some(parse_number(text).map(|n| (n, other.clone())))
            }
            (other, Variant::String(text)) if other.kind().is_numeric() => {
                Some(parse_number(text).map(|n| (other.clone(), n)))
            }
            _ => None,
        };
        match numeric_text {
            Some(Some((a, b))) => {
                return promote(self, &a, &b)
                    .unwrap_or_else(|| Err(mismatch(operation, left, right)));
            }
            Some(None) if operation.is_comparison() => {
                return Ok((Variant::String(left.to_string()), Variant::String(right.to_string())));
            }
            Some(None) => {
                let (text, number) = if left.kind() == VariantKind::String {
                    (left, right)
                } else {
                    (right, left)
                };
                return self.convert(text, number.kind()).map(|_| (left.clone(), right.clone()));
            }
            None => {}
        }

        if left.kind() == VariantKind::Boolean || right.kind() == VariantKind::Boolean {
            if let (Ok(a), Ok(b)) = (
                self.convert(left, VariantKind::Boolean),
                self.convert(right, VariantKind::Boolean),
            ) {
                return Ok((a, b));
            }
        }

        if let Ok(b) = self.convert(right, left.kind()) {
            return Ok((left.clone(), b));
        }
        if let Ok(a) = self.convert(left, right.kind()) {
            return Ok((a, right.clone()));
        }
        if operation.is_comparison() {
            return Ok((Variant::String(left.to_string()), Variant::String(right.to_string())));
        }
        Err(mismatch(operation, left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn ops() -> TypeUnsafeOperations {
        TypeUnsafeOperations::new()
    }

    #[test]
    fn string_plus_anything_concatenates() {
        assert_eq!(
            ops().add(&Variant::from("xyz"), &Variant::from(123)),
            Ok(Variant::from("xyz123"))
        );
        assert_eq!(
            ops().add(&Variant::from("a"), &Variant::from(true)),
            Ok(Variant::from("atrue"))
        );
    }

    #[test]
    fn numeric_text_becomes_a_number() {
        assert_eq!(ops().add(&Variant::from(1), &Variant::from("2")), Ok(Variant::from(3)));
        assert_eq!(ops().mul(&Variant::from("1.5"), &Variant::from(2)), Ok(Variant::from(3.0)));
        assert_eq!(ops().sub(&Variant::from("10"), &Variant::from("4")), Ok(Variant::from(6)));
        assert_eq!(ops().less(&Variant::from("9"), &Variant::from("10")), Ok(Variant::from(true)));
    }

    #[test]
    fn unparsable_text_fails_arithmetic() {
        assert!(matches!(
            ops().add(&Variant::from(1), &Variant::from("abc")),
            Err(EvaluationError::ConversionFailed { .. })
        ));
        assert!(ops().sub(&Variant::from("a"), &Variant::from("b")).is_err());
    }

    #[test]
    fn comparisons_fall_back_to_text() {
        assert_eq!(ops().equal(&Variant::from(1), &Variant::from("abc")), Ok(Variant::from(false)));
        assert_eq!(
            ops().less(&Variant::from("abc"), &Variant::from("abd")),
            Ok(Variant::from(true))
        );
        assert_eq!(ops().equal(&Variant::from("1.0"), &Variant::from(1)), Ok(Variant::from(true)));
    }

    #[test]
    fn booleans_coerce() {
        assert_eq!(ops().and(&Variant::from(true), &Variant::from(1)), Ok(Variant::from(true)));
        assert_eq!(
            ops().equal(&Variant::from(false), &Variant::from("no")),
            Ok(Variant::from(true))
        );
        assert_eq!(ops().not(&Variant::from("true")), Ok(Variant::from(false)));
    }

    #[test]
    fn membership_and_indexing() {
        let array = Variant::from(vec![Variant::from(1), Variant::from(2), Variant::from(3)]);
        assert_eq!(ops().contains(&array, &Variant::from(2)), Ok(Variant::from(true)));
        assert_eq!(ops().contains(&array, &Variant::from("3")), Ok(Variant::from(true)));
        assert_eq!(ops().contains(&array, &Variant::from(5)), Ok(Variant::from(false)));

        assert_eq!(
            ops().get_element(&Variant::from("abc"), &Variant::from(1)),
            Ok(Variant::from("b"))
        );
        assert_eq!(ops().get_element(&array, &Variant::from("0")), Ok(Variant::from(1)));
        assert_eq!(
            ops().get_element(&array, &Variant::from(3)),
            Err(EvaluationError::IndexOutOfRange { index: 3, length: 3 })
        );
        assert_eq!(
            ops().get_element(&array, &Variant::from(1.5)),
            Err(EvaluationError::NonIntegerIndex { kind: VariantKind::Double })
        );
    }

    #[test]
    fn dates_and_durations() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(
            ops().sub(&Variant::from(end), &Variant::from(start)),
            Ok(Variant::from(Duration::days(1)))
        );
        assert_eq!(
            ops().add(&Variant::from(start), &Variant::from(Duration::days(1))),
            Ok(Variant::from(end))
        );
        assert_eq!(
            ops().less(&Variant::from(start), &Variant::from("2024-01-02")),
            Ok(Variant::from(true))
        );
    }

    #[test]
    fn like_uses_string_forms() {
        assert_eq!(
            ops().like(&Variant::from(12345), &Variant::from("12%")),
            Ok(Variant::from(true))
        );
        assert_eq!(ops().like(&Variant::Null, &Variant::from("%")), Ok(Variant::Null));
    }
}
