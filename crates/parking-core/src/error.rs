//! Unified application error types for the reservation service.
//!
//! Every crate maps its failures into [`AppError`] so that the `?` operator
//! works across crate boundaries and the HTTP layer can render a single
//! error shape.

use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error categories used across the whole application.
///
/// The first five variants are the reservation taxonomy; callers receive
/// them as ordinary, recoverable outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The directory reports the slot as booked or otherwise not offerable.
    SlotUnavailable,
    /// Another hold is active on the slot.
    AlreadyReserved,
    /// No active hold exists for the slot (or not for the given user).
    NotReserved,
    /// Booking finalization could not be persisted.
    DirectoryWriteFailed,
    /// Notification delivery failed. Logged, never returned to callers of
    /// reserve/release/book.
    BroadcastFailed,
    /// The requested resource was not found.
    NotFound,
    /// Input validation failed.
    Validation,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// The service is stopped or temporarily unavailable.
    ServiceUnavailable,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlotUnavailable => write!(f, "SLOT_UNAVAILABLE"),
            Self::AlreadyReserved => write!(f, "ALREADY_RESERVED"),
            Self::NotReserved => write!(f, "NOT_RESERVED"),
            Self::DirectoryWriteFailed => write!(f, "DIRECTORY_WRITE_FAILED"),
            Self::BroadcastFailed => write!(f, "BROADCAST_FAILED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION_ERROR"),
            Self::Configuration => write!(f, "CONFIGURATION_ERROR"),
            Self::Serialization => write!(f, "SERIALIZATION_ERROR"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Internal => write!(f, "INTERNAL_ERROR"),
        }
    }
}

impl ErrorKind {
    /// HTTP status used when this kind reaches the API boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::SlotUnavailable | Self::AlreadyReserved | Self::NotReserved => {
                StatusCode::CONFLICT
            }
            Self::DirectoryWriteFailed => StatusCode::BAD_GATEWAY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation | Self::Serialization => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::BroadcastFailed | Self::Configuration | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// The unified application error.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a slot-unavailable rejection.
    pub fn slot_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SlotUnavailable, message)
    }

    /// Create an already-reserved rejection.
    pub fn already_reserved(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyReserved, message)
    }

    /// Create a not-reserved rejection.
    pub fn not_reserved(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotReserved, message)
    }

    /// Create a directory-write failure.
    pub fn directory_write_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DirectoryWriteFailed, message)
    }

    /// Create a broadcast failure.
    pub fn broadcast_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BroadcastFailed, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error is one of the expected reservation rejections.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::SlotUnavailable | ErrorKind::AlreadyReserved | ErrorKind::NotReserved
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.message, kind = %self.kind, "Internal server error");
        }

        let body = ApiErrorResponse {
            error: self.kind.to_string(),
            message: self.message,
        };

        (status, Json(body)).into_response()
    }
}
