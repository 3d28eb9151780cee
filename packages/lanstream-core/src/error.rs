//! Centralized error types for the Lanstream core library.
//!
//! This module provides the per-request error taxonomy that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::media::SourceError;
use crate::stream::RangeError;

/// Everything that can end a media request early.
///
/// Each variant maps to exactly one HTTP status. Handlers return these and
/// the conversion happens at the handler boundary, so a failing request never
/// affects the listener or other requests.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Missing identifier, or a malformed or empty `Range` header.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown id, missing art, or an unopenable song file.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested range lies outside the resource.
    #[error("Range not satisfiable (resource is {total} bytes)")]
    RangeNotSatisfiable { total: u64 },

    /// Unexpected I/O failure while opening or positioning a source.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::RangeNotSatisfiable { .. } => "range_not_satisfiable",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converts a range failure for a resource of `total` bytes.
    pub fn from_range(err: RangeError, total: u64) -> Self {
        match err {
            RangeError::Malformed | RangeError::Empty => Self::BadRequest(err.to_string()),
            RangeError::Unsatisfiable => Self::RangeNotSatisfiable { total },
        }
    }

    /// Converts an open failure for a song (missing file is a 404).
    pub fn from_song_source(err: SourceError) -> Self {
        Self::NotFound(err.to_string())
    }

    /// Converts an open failure for cover art (any failure is a 500).
    pub fn from_art_source(err: SourceError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Convenient Result alias for request pipelines.
pub type StreamResult<T> = Result<T, StreamError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
}

impl IntoResponse for StreamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
        };
        match self {
            // RFC 7233 §4.4: tell the client the current length.
            Self::RangeNotSatisfiable { total } => (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{}", total))],
                Json(body),
            )
                .into_response(),
            _ => (status, Json(body)).into_response(),
        }
    }
}
