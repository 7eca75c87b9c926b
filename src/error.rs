use std::fmt;

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised by a `PasteStore` implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A paste with the same identifier already exists.
    #[error("Paste id already exists")]
    DuplicateId,

    /// A PostgreSQL error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// The connection pool could not hand out a client.
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A stored record could not be decoded.
    #[error("Corrupt record for paste {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Why a paste could not be served.
///
/// Only ever logged. Every variant renders as the same `404` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    NotFound,
    Expired,
    ViewsExhausted,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Unavailable::NotFound => "no such paste",
            Unavailable::Expired => "time limit reached",
            Unavailable::ViewsExhausted => "view limit reached",
        };
        f.write_str(reason)
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The paste is missing, expired or out of views.
    #[error("Paste unavailable: {0}")]
    Unavailable(Unavailable),

    /// The store failed to complete an operation.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Unavailable> for AppError {
    fn from(cause: Unavailable) -> Self {
        AppError::Unavailable(cause)
    }
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Unavailable(cause) => {
                tracing::debug!("Paste unavailable: {}", cause);
                (StatusCode::NOT_FOUND, "Paste not found".to_string())
            }

            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_causes_share_one_status() {
        for cause in [
            Unavailable::NotFound,
            Unavailable::Expired,
            Unavailable::ViewsExhausted,
        ] {
            let response = AppError::from(cause).into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn unavailable_causes_share_one_body() {
        let mut bodies = Vec::new();
        for cause in [
            Unavailable::NotFound,
            Unavailable::Expired,
            Unavailable::ViewsExhausted,
        ] {
            let response = AppError::from(cause).into_response();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            bodies.push(bytes);
        }
        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[1], bodies[2]);
        assert_eq!(&bodies[0][..], br#"{"error":"Paste not found"}"#);
    }

    #[test]
    fn storage_failures_are_server_errors() {
        let response = AppError::Storage(StoreError::DuplicateId).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let response = AppError::Validation("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
