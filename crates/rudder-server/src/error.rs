//! Server error types
//!
//! - [`ServerError`]: startup failures, reported through miette
//! - [`ApiError`]: request failures, rendered as JSON with a status code
//!   derived from the error kind

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use rudder_release::{ErrorKind, ReleaseError};
use rudder_repo::RepoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures while starting the server
#[derive(Error, Debug, Diagnostic)]
pub enum ServerError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(rudder::server::config))]
    Config { message: String },

    #[error("failed to open release storage at {path}: {message}")]
    #[diagnostic(
        code(rudder::server::storage),
        help("check that the directory is writable or pass --storage-dir")
    )]
    Storage { path: String, message: String },

    #[error("failed to bind {addr}: {source}")]
    #[diagnostic(code(rudder::server::bind))]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    #[diagnostic(code(rudder::server::serve))]
    Serve(#[source] std::io::Error),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// A failed API request
#[derive(Debug)]
pub struct ApiError(ReleaseError);

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        self.0.kind()
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Verification | ErrorKind::Dependency => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Backend => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReleaseError> for ApiError {
    fn from(e: ReleaseError) -> Self {
        Self(e)
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        Self(ReleaseError::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.0.to_string(),
            kind: self.kind().to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %body.error, "request failed");
        } else {
            tracing::warn!(status = %status, error = %body.error, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
