//! # Validation Errors
//!
//! Typed failures for malformed input, raised before any write happens.
//! Storage and service failures live in their own crates (`DbError` in
//! shopfront-db, `PosError` in shopfront-pos); this crate only knows about
//! input that never should reach storage.

use thiserror::Error;

/// Input validation failure.
///
/// Variants carry the offending field name so the presentation layer can
/// attach the message to the right form control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value exceeds its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Value must be strictly positive (prices, quantities).
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Value must not be negative (stock levels, reorder levels).
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: &'static str },

    /// Numeric value outside its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
}

/// Result alias for validators.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            ValidationError::Required { field: "sku" }.to_string(),
            "sku is required"
        );
        assert_eq!(
            ValidationError::MustBePositive { field: "selling price" }.to_string(),
            "selling price must be positive"
        );
        assert_eq!(
            ValidationError::OutOfRange { field: "quantity", min: 1, max: 999 }.to_string(),
            "quantity must be between 1 and 999"
        );
    }
}
