use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Organizer accounts cannot book events")]
    OrganizerCannotBook,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown status: {0}")]
    BadStatus(String),

    #[error("Insufficient capacity ({free} free)")]
    InsufficientCapacity { free: i64 },

    #[error("Already booked")]
    AlreadyBooked,

    #[error("Nothing to cancel")]
    NothingToCancel,

    #[error("Booking is not pending")]
    NotPending,

    #[error("No capacity ({free} free)")]
    NoCapacity { free: i64 },

    #[error("Capacity below booked quantity ({booked} booked)")]
    CapacityBelowBooked { booked: i64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    free: Option<i64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut free = None;
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::OrganizerCannotBook => (
                StatusCode::FORBIDDEN,
                "organizer_cannot_book",
                self.to_string(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::BadStatus(_) => (StatusCode::BAD_REQUEST, "bad_status", self.to_string()),
            ApiError::InsufficientCapacity { free: f } => {
                free = Some(*f);
                (
                    StatusCode::CONFLICT,
                    "insufficient_capacity",
                    self.to_string(),
                )
            }
            ApiError::AlreadyBooked => (StatusCode::CONFLICT, "already_booked", self.to_string()),
            ApiError::NothingToCancel => (
                StatusCode::BAD_REQUEST,
                "booking_already_paid_or_not_found",
                self.to_string(),
            ),
            ApiError::NotPending => (StatusCode::CONFLICT, "not_pending", self.to_string()),
            ApiError::NoCapacity { free: f } => {
                free = Some(*f);
                (StatusCode::CONFLICT, "no_capacity", self.to_string())
            }
            ApiError::CapacityBelowBooked { .. } => (
                StatusCode::CONFLICT,
                "capacity_below_booked",
                self.to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "retry_later",
                    "Temporarily unavailable. Please retry.".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            free,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        if err.is_retryable() {
            ApiError::ServiceUnavailable(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(entity) => ApiError::NotFound(format!("{} not found", entity)),
            DomainError::InvalidInput(msg) => ApiError::Validation(msg),
            DomainError::InsufficientCapacity { free } => ApiError::InsufficientCapacity { free },
            DomainError::DuplicateActiveBooking => ApiError::AlreadyBooked,
            DomainError::NothingToCancel => ApiError::NothingToCancel,
            DomainError::NotPending => ApiError::NotPending,
            DomainError::NoCapacity { free } => ApiError::NoCapacity { free },
            DomainError::BadStatus(value) => ApiError::BadStatus(value),
            DomainError::CapacityBelowBooked { booked } => {
                ApiError::CapacityBelowBooked { booked }
            }
            DomainError::Store(err) => err.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::from(errors).into()
    }
}
