//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use todo_store::StoreError;

/// Server error type.
///
/// Every variant renders as a JSON body with an `error` field.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Request needed a body but had none.
    #[error("Missing request body")]
    MissingBody,

    /// Request body was not valid JSON for the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Path id is not a number.
    #[error("Invalid todo id: {0}")]
    InvalidId(String),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingBody | Self::InvalidBody(_) | Self::InvalidId(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(err) => {
                tracing::error!(error = %err, "Store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, axum::Json(json!({"error": self.to_string()}))).into_response()
    }
}
