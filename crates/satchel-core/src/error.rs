//! # Error Types
//!
//! Domain-specific error types for satchel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  satchel-core errors (this file)                                       │
//! │  ├── CoreError        - Rejected cart commands                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  satchel-db errors (separate crate)                                    │
//! │  └── DbError          - Key-value store failures                       │
//! │                                                                         │
//! │  satchel-persist errors (separate crate)                               │
//! │  └── PersistError     - Load/save failures (never reach the UI)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → facade logs it → no-op            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (line id, product id, ...)
//! 3. Errors are enum variants, never String
//! 4. A `CoreError` always means "the caller's snapshot stays as it was"

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Reasons a cart command is rejected.
///
/// The facade turns every one of these into a no-op: the current snapshot
/// is kept, nobody is notified and nothing is saved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No line with this id exists in the snapshot.
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    /// Adding a new line would exceed the maximum line count.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity would exceed the maximum allowed.
    ///
    /// ## When This Occurs
    /// - Merging an addition into an existing line
    /// - Setting or editing a quantity directly
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A line whose price arithmetic leaves the `i64` range.
    #[error("Line amount is out of range")]
    AmountOverflow,

    /// Two lines of a saved cart share one line id.
    #[error("Duplicate cart line id: {0}")]
    DuplicateLine(String),

    /// Selection command issued on a cart kind without selection support.
    #[error("Selection is not supported by the {0} cart")]
    SelectionUnsupported(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when command input doesn't meet requirements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::QuantityTooLarge {
            requested: 1200,
            max: 999,
        };
        assert_eq!(err.to_string(), "Quantity 1200 exceeds maximum allowed (999)");

        let err = CoreError::LineNotFound("abc".to_string());
        assert_eq!(err.to_string(), "Cart line not found: abc");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "product.id".to_string(),
        };
        assert_eq!(err.to_string(), "product.id is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "product.id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
