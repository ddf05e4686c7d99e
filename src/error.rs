//! Error types for the store and the request-handling boundary
//!
//! `StoreError` covers everything that can go wrong inside the embedded
//! database. `AppError` is what handlers and services return; it knows how to
//! render itself as an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures raised by the redb-backed document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),
    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),
    #[error("table error: {0}")]
    Table(#[from] redb::TableError),
    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),
    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),
    #[error("malformed record: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The `short_code` unique index already holds this code
    #[error("short code {code} already exists")]
    UniqueViolation { code: String },
}

/// Errors surfaced to the routing layer
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("failed to generate a unique short code after {attempts} attempts")]
    AllocationExhausted { attempts: usize },
    /// Lost a race on the unique index; re-running the allocation is safe.
    #[error("short code {0} was taken concurrently")]
    DuplicateCode(String),
    #[error("short link not found")]
    NotFound,
    #[error("you are not the owner of this short link")]
    Forbidden,
    #[error("missing or invalid credentials")]
    Unauthorized,
    #[error("too many requests")]
    RateLimited,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { code } => AppError::DuplicateCode(code),
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    /// Stable machine-readable kind, used as the `code` field of error bodies
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidUrl(_) => "invalid_url",
            AppError::AllocationExhausted { .. } => "allocation_exhausted",
            AppError::DuplicateCode(_) => "duplicate_code",
            AppError::NotFound => "not_found",
            AppError::Forbidden => "forbidden",
            AppError::Unauthorized => "unauthorized",
            AppError::RateLimited => "rate_limited",
            AppError::Store(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AppError::AllocationExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DuplicateCode(_) => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Store(err) => {
                // Infrastructure details stay in the logs
                tracing::error!(error = %err, "store failure while handling request");
                "Internal server error".to_string()
            }
            AppError::AllocationExhausted { .. } => {
                tracing::error!(error = %self, "short code allocation exhausted");
                self.to_string()
            }
            other => other.to_string(),
        };

        (
            self.status(),
            Json(json!({
                "error": message,
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
