//! Core types shared by the tokenizer, the expression calculator and the
//! template engine.
//!
//! This crate provides:
//! - [`Position`] for line:column tracking
//! - The error taxonomy ([`TokenizerError`], [`SyntaxError`],
//!   [`EvaluationError`], [`InternalError`] and the [`ExpressionsError`] wrapper)
//! - [`Variant`], the dynamically typed runtime value
//! - [`VariantOperations`] with the [`TypeSafeOperations`] and
//!   [`TypeUnsafeOperations`] strategies
//!
//! # Example
//!
//! ```
//! use expressions_core::{TypeUnsafeOperations, Variant, VariantOperations};
//!
//! let ops = TypeUnsafeOperations::new();
//! let sum = ops.add(&Variant::from("xyz"), &Variant::from(123)).unwrap();
//! assert_eq!(sum, Variant::from("xyz123"));
//! ```

pub mod error;
pub mod ops;
mod position;
pub mod variant;

pub use error::{
    EvaluationError, ExpressionsError, InternalError, SyntaxError, SyntaxErrorKind, TokenizerError,
};
pub use ops::{Operation, TypeSafeOperations, TypeUnsafeOperations, VariantOperations};
pub use position::Position;
pub use variant::{Variant, VariantKind};
