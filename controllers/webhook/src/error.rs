//! Webhook server error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use azure_crds::ApiError;
use thiserror::Error;

/// Errors that can occur while serving webhook requests.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The review body is malformed or incomplete
    #[error("Invalid review: {0}")]
    InvalidReview(String),

    /// No admission hooks are registered for the requested kind
    #[error("Unknown kind: {0}")]
    UnknownKind(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Defaulting, validation or conversion rejected the object
    #[error(transparent)]
    Api(#[from] ApiError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Listener or TLS setup failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::InvalidReview(_) | WebhookError::Serialization(_) => StatusCode::BAD_REQUEST,
            WebhookError::UnknownKind(_) => StatusCode::NOT_FOUND,
            WebhookError::Api(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WebhookError::InvalidConfig(_) | WebhookError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}
