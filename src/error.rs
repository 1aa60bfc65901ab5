//! Error types for Libris server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Failed to decode document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Validation", msg.clone()),
            AppError::UnsupportedOperator(msg) => {
                (StatusCode::BAD_REQUEST, "UnsupportedOperator", msg.clone())
            }
            AppError::Decode(e) => {
                tracing::error!("Document decode error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Decode",
                    "Document decode error".to_string(),
                )
            }
            AppError::Encode(e) => {
                tracing::error!("Document encode error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Encode",
                    "Document encode error".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("Document I/O error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Io",
                    "Document I/O error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
