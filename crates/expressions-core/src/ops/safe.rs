use super::arith::mismatch;
use super::convert::convert_strict;
use super::{is_temporal_pair, promote, Operation, VariantOperations};
use crate::error::EvaluationError;
use crate::variant::{Variant, VariantKind};

/// Operations that never change an operand's kind beyond lossless numeric widening.
///
/// Mismatched kinds fail with [`EvaluationError::TypeMismatch`]; callers
/// convert explicitly first.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeSafeOperations;

impl TypeSafeOperations {
    pub fn new() -> Self {
        Self
    }
}

impl VariantOperations for TypeSafeOperations {
    fn convert(&self, value: &Variant, kind: VariantKind) -> Result<Variant, EvaluationError> {
        convert_strict(value, kind)
    }

    fn coerce(
        &self,
        operation: Operation,
        left: &Variant,
        right: &Variant,
    ) -> Result<(Variant, Variant), EvaluationError> {
        if left.kind() == right.kind() || is_temporal_pair(operation, left, right) {
            return Ok((left.clone(), right.clone()));
        }
        promote(self, left, right).unwrap_or_else(|| Err(mismatch(operation, left, right)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_widen() {
        let ops = TypeSafeOperations::new();
        assert_eq!(ops.add(&Variant::from(1), &Variant::from(2.5)), Ok(Variant::from(3.5)));
        assert_eq!(ops.mul(&Variant::from(3), &Variant::from(4i64)), Ok(Variant::from(12i64)));
    }

    #[test]
    fn strings_concatenate_only_with_strings() {
        let ops = TypeSafeOperations::new();
        assert_eq!(ops.add(&Variant::from("ab"), &Variant::from("c")), Ok(Variant::from("abc")));
        assert_eq!(
            ops.add(&Variant::from("xyz"), &Variant::from(123)),
            Err(EvaluationError::TypeMismatch {
                operation: Operation::Add,
                left: VariantKind::String,
                right: VariantKind::Integer,
            })
        );
    }

    #[test]
    fn numeric_text_is_not_a_number() {
        let ops = TypeSafeOperations::new();
        assert!(ops.add(&Variant::from(1), &Variant::from("2")).is_err());
        assert!(ops.less(&Variant::from(1), &Variant::from("2")).is_err());
        assert!(ops.get_element(&Variant::from("abc"), &Variant::from("1")).is_err());
    }

    #[test]
    fn nulls_propagate() {
        let ops = TypeSafeOperations::new();
        assert_eq!(ops.add(&Variant::Null, &Variant::from(1)), Ok(Variant::Null));
        assert_eq!(ops.equal(&Variant::Null, &Variant::Null), Ok(Variant::from(true)));
        assert_eq!(ops.equal(&Variant::Null, &Variant::from(1)), Ok(Variant::from(false)));
    }
}
