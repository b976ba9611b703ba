use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures that reach the HTTP layer.
///
/// Upstream trouble is absorbed into fallback data long before this point, so
/// anything here is unexpected and maps to a 500 with a `detail` message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("tool '{tool}' returned an unexpected result")]
    UnexpectedToolResult { tool: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {self}");

        let body = json!({ "detail": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
