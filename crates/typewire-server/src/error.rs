use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// The server's tiny HTTP surface (`/health`, `/ws`) barely needs an error
/// type, but we keep one so failures get a structured JSON body instead of
/// axum's default plaintext, matching the teacher's `error.rs` shape.
#[derive(Debug)]
pub enum AppError {
    ServiceUnavailable(String),
    TooManyRequests(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };
        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
