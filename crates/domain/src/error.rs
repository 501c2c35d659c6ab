//! Domain error taxonomy.
//!
//! Business-rule violations are returned as [`DomainError`] values; nothing in
//! the core signals a rule violation by panicking or by a sentinel value.

use thiserror::Error;

/// Failures reported by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Waiting for a row lock exceeded the configured bound.
    #[error("Timed out waiting for a row lock")]
    LockTimeout,

    /// The backing store could not be reached (pool exhausted, connection lost).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A write referenced a row that does not exist.
    #[error("Referenced record missing: {0}")]
    MissingReference(String),

    /// A uniqueness constraint rejected the write.
    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    /// Any other persistence failure.
    #[error("Store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether the caller may retry the whole operation with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::LockTimeout | StoreError::Unavailable(_))
    }
}

/// Errors returned by domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient capacity ({free} free)")]
    InsufficientCapacity { free: i64 },

    #[error("An active booking already exists for this event")]
    DuplicateActiveBooking,

    #[error("No pending booking to cancel")]
    NothingToCancel,

    #[error("Booking is not pending")]
    NotPending,

    #[error("Not enough capacity to approve ({free} free)")]
    NoCapacity { free: i64 },

    #[error("Unknown booking status: {0}")]
    BadStatus(String),

    #[error("Capacity cannot drop below the {booked} units already booked")]
    CapacityBelowBooked { booked: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let detail = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    // Struct-level checks are keyed under "__all__".
                    if *field == "__all__" {
                        detail
                    } else {
                        format!("{}: {}", field, detail)
                    }
                })
            })
            .collect();

        if messages.is_empty() {
            messages.push(errors.to_string());
        }
        messages.sort();

        DomainError::InvalidInput(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct QtyInput {
        #[validate(range(min = 1, message = "must be positive"))]
        qty: i32,
    }

    #[test]
    fn test_retryable_store_errors() {
        assert!(StoreError::LockTimeout.is_retryable());
        assert!(StoreError::Unavailable("pool".into()).is_retryable());
        assert!(!StoreError::Backend("boom".into()).is_retryable());
        assert!(!StoreError::Conflict("dup".into()).is_retryable());
        assert!(!StoreError::MissingReference("event".into()).is_retryable());
    }

    #[test]
    fn test_display_includes_free_count() {
        assert_eq!(
            DomainError::InsufficientCapacity { free: 2 }.to_string(),
            "Insufficient capacity (2 free)"
        );
        assert_eq!(
            DomainError::NoCapacity { free: 0 }.to_string(),
            "Not enough capacity to approve (0 free)"
        );
    }

    #[test]
    fn test_not_found_names_entity() {
        assert_eq!(DomainError::NotFound("event").to_string(), "event not found");
    }

    #[test]
    fn test_store_error_converts_transparently() {
        let err: DomainError = StoreError::LockTimeout.into();
        assert_eq!(err.to_string(), "Timed out waiting for a row lock");
        assert!(matches!(err, DomainError::Store(StoreError::LockTimeout)));
    }

    #[test]
    fn test_validation_errors_become_invalid_input() {
        let err: DomainError = QtyInput { qty: 0 }.validate().unwrap_err().into();
        match err {
            DomainError::InvalidInput(msg) => assert_eq!(msg, "qty: must be positive"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }
}
