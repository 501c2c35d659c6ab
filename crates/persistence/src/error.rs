//! Mapping from driver errors to store errors.

use domain::StoreError;

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

/// Converts a `sqlx` error into a [`StoreError`].
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some(LOCK_NOT_AVAILABLE) => StoreError::LockTimeout,
            Some(FOREIGN_KEY_VIOLATION) => {
                StoreError::MissingReference(db_err.message().to_string())
            }
            Some(UNIQUE_VIOLATION) => StoreError::Conflict(db_err.message().to_string()),
            _ => StoreError::Backend(err.to_string()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_unavailable() {
        let err = store_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_row_not_found_is_backend() {
        let err = store_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
