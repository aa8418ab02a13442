//! HTTP error response handling for the API
//!
//! Converts domain errors to HTTP responses with appropriate status codes and
//! JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            Error::InvalidRequest(message) => {
                tracing::debug!(%message, "rejected request");
            }
            _ if status_code.is_server_error() => {
                tracing::warn!(status = status_code.as_u16(), error = %self, "request failed");
            }
            _ => {}
        }

        let api_error: ApiError = self.into();
        (status_code, Json(api_error)).into_response()
    }
}
