//! Error types and HTTP response conversion
//!
//! [`Error`] is the transport-level error of this crate. It is what the
//! surrounding framework sees: configuration problems, registration defects
//! and client errors that are answered with a regular HTTP status. Business
//! errors raised by API handlers travel as [`ApiError`](crate::api_error::ApiError)
//! instead and are converted into the protocol envelope by the dispatcher.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::headers::HeaderError;
use crate::route::RouteError;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// An API handler could not be registered
    #[error("Route registration error: {0}")]
    Route(#[from] RouteError),

    /// A well-known request header is missing or malformed
    #[error("{0}")]
    Header(#[from] HeaderError),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(Box<axum::http::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authorization error
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Validation error (422)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            status: status.as_u16(),
        }
    }

    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl Error {
    /// HTTP status this error is answered with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Header(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Config(_)
            | Error::Route(_)
            | Error::Http(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match self {
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                ErrorResponse::with_code(status, "CONFIG_ERROR", "Service misconfigured")
            }
            Error::Route(e) => {
                tracing::error!("Route registration error: {}", e);
                ErrorResponse::with_code(status, "ROUTE_ERROR", "Service misconfigured")
            }
            Error::Header(e) => ErrorResponse::with_code(status, "INVALID_HEADER", e.to_string()),
            Error::Http(e) => {
                tracing::error!("HTTP error: {}", e);
                ErrorResponse::with_code(status, "HTTP_ERROR", "Internal server error")
            }
            Error::Io(e) => {
                tracing::error!("I/O error: {}", e);
                ErrorResponse::with_code(status, "IO_ERROR", "Internal server error")
            }
            Error::Unauthorized(msg) => ErrorResponse::with_code(status, "UNAUTHORIZED", msg),
            Error::Forbidden(msg) => ErrorResponse::with_code(status, "FORBIDDEN", msg),
            Error::NotFound(msg) => ErrorResponse::with_code(status, "NOT_FOUND", msg),
            Error::BadRequest(msg) => ErrorResponse::with_code(status, "BAD_REQUEST", msg),
            Error::ValidationError(msg) => {
                ErrorResponse::with_code(status, "VALIDATION_ERROR", msg)
            }
            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorResponse::with_code(status, "INTERNAL_ERROR", "Internal server error")
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<axum::http::Error> for Error {
    fn from(err: axum::http::Error) -> Self {
        Error::Http(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new(StatusCode::NOT_FOUND, "User not found");
        assert_eq!(err.status, 404);
        assert_eq!(err.error, "User not found");
        assert!(err.code.is_none());
    }

    #[test]
    fn test_error_response_with_code() {
        let err = ErrorResponse::with_code(
            StatusCode::BAD_REQUEST,
            "INVALID_HEADER",
            "header not found",
        );
        assert_eq!(err.status, 400);
        assert_eq!(err.code, Some("INVALID_HEADER".to_string()));
    }

    #[test]
    fn test_header_error_is_client_error() {
        let err = Error::from(HeaderError::Missing {
            header: "Orz-Request-Id".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("Orz-Request-Id"));
    }

    #[test]
    fn test_into_response_status() {
        let response = Error::Unauthorized("token expired".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = Error::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
