//! Error types.
//!
//! [`Error`] covers infrastructure failures that stop the process: binding
//! the listener, opening the database. [`ApiError`] is the per-request
//! taxonomy; it converts into a JSON `{"error": ...}` response and never
//! escapes the request that produced it.

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::body::BodyError;
use crate::model::ValidationError;
use crate::response::{IntoResponse, Json, Response};
use crate::status::Status;
use crate::store::StoreError;

/// Startup and serving failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Everything a single API request can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("admin token required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(&'static str),

    /// Logged with its cause; the client only sees a generic 500.
    #[error("{0}")]
    Fatal(String),
}

impl ApiError {
    pub fn unknown_endpoint() -> Self {
        Self::NotFound("Unknown API endpoint")
    }

    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest(_) => Status::BadRequest,
            Self::Unauthorized => Status::Unauthorized,
            Self::NotFound(_) => Status::NotFound,
            Self::Fatal(_) => Status::InternalServerError,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = match &self {
            Self::Fatal(cause) => {
                error!("request failed: {cause}");
                "internal server error".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: &reason })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => Self::NotFound("not found"),
            StoreError::Sqlite(e) => Self::Fatal(format!("sqlite: {e}")),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<BodyError> for ApiError {
    fn from(e: BodyError) -> Self {
        if e.is_client_error() {
            Self::BadRequest(e.to_string())
        } else {
            Self::Fatal(format!("body: {e}"))
        }
    }
}
