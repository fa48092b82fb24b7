use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use equindex_store::StoreError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Map failures to HTTP responses without leaking internals to the client.
impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::Store(error) => {
                tracing::error!(error = %error, "store error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal store error occurred".to_string(),
                )
            }
            WebError::Io(error) => {
                tracing::error!(error = %error, "io error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
