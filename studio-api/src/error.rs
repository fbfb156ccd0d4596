//! HTTP error responses
//!
//! Every failure is rendered as `{"error": "..."}` with the status code the
//! library assigns to the error kind.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use libstudiocast::StudioError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub StudioError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(StudioError::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<StudioError> for ApiError {
    fn from(error: StudioError) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "Request failed: {}", self.0);
        } else {
            tracing::debug!(status = status.as_u16(), "Request rejected: {}", self.0);
        }

        (status, Json(json!({ "error": self.0.public_message() }))).into_response()
    }
}
