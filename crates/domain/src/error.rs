//! Unified error types for the domain layer
//!
//! Provides a common error type that can be used across all domain operations,
//! enabling consistent error handling without forcing adapters to use String or anyhow.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Parse error (for value objects and stored enum tags)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for business rule violations.
    ///
    /// # Example
    /// ```ignore
    /// if name.trim().len() < 2 {
    ///     return Err(DomainError::validation("Booker name must be at least 2 characters"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Check that a score sits inside an inclusive range.
pub(crate) fn ensure_range(
    field: &str,
    value: i32,
    min: i32,
    max: i32,
) -> Result<(), DomainError> {
    if value < min || value > max {
        return Err(DomainError::validation(format!(
            "{field} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_includes_entity_and_id() {
        let err = DomainError::not_found("Booker", "abc");
        assert_eq!(err.to_string(), "Entity not found: Booker with id abc");
    }

    #[test]
    fn ensure_range_rejects_out_of_bounds() {
        assert!(ensure_range("score", 50, 0, 100).is_ok());
        assert!(ensure_range("score", 101, 0, 100)
            .unwrap_err()
            .is_validation());
        assert!(ensure_range("score", -1, 0, 100).is_err());
    }
}
