//! Service-level error taxonomy.
//!
//! Caller-input errors (`InvalidRange`, `InvalidFilter`, `InvalidPagination`)
//! name the offending field and surface as 400s. Store read failures surface
//! as a generic 500 with the full chain logged - the engine never retries
//! them and never substitutes defaults for malformed input: a range that
//! fails to parse fails the whole call rather than degrading into an
//! empty-result query.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::store::StoreError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Date-range parameters that fail to parse or don't form a valid range
    #[error("invalid date range: {message}")]
    InvalidRange { field: &'static str, message: String },

    /// An enum-valued filter parameter outside its domain
    #[error("invalid value '{value}' for {field}")]
    InvalidFilter { field: &'static str, value: String },

    /// Non-positive page or page-size parameters
    #[error("invalid pagination: {message}")]
    InvalidPagination { field: &'static str, message: String },

    /// A fan-out deadline elapsed before every sub-query finished; no
    /// partially merged response is ever returned
    #[error("dashboard assembly exceeded its deadline")]
    PartialResult,

    /// Event store read failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRange { .. } | Error::InvalidFilter { .. } | Error::InvalidPagination { .. } => StatusCode::BAD_REQUEST,
            Error::PartialResult => StatusCode::GATEWAY_TIMEOUT,
            Error::Store(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The request field a caller-input error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Error::InvalidRange { field, .. } | Error::InvalidFilter { field, .. } | Error::InvalidPagination { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidRange { .. } | Error::InvalidFilter { .. } | Error::InvalidPagination { .. } => self.to_string(),
            Error::PartialResult => "Dashboard computation timed out".to_string(),
            Error::Store(_) | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Store(_) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::PartialResult => {
                tracing::warn!("Fan-out deadline exceeded: {}", self);
            }
            Error::InvalidRange { .. } | Error::InvalidFilter { .. } | Error::InvalidPagination { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = match self.field() {
            Some(field) => json!({ "message": self.user_message(), "field": field }),
            None => json!({ "message": self.user_message() }),
        };

        (status, axum::response::Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_bad_request_and_name_the_field() {
        let err = Error::InvalidFilter {
            field: "movStatus",
            value: "refunded".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.field(), Some("movStatus"));
    }

    #[test]
    fn store_errors_do_not_leak_details() {
        let err = Error::Store(StoreError::Other(anyhow::anyhow!("connection refused to 10.0.0.3")));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn deadline_errors_map_to_gateway_timeout() {
        assert_eq!(Error::PartialResult.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }
}
