//! Error responses.
//!
//! Every failure is answered with `{"error": "<message>"}` and a status code
//! derived from the library error's classification helpers.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// An error that can be returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<userbase::Error> for ApiError {
    fn from(err: userbase::Error) -> Self {
        if err.is_validation_error() || err.is_conflict() {
            Self::new(StatusCode::BAD_REQUEST, err.to_string())
        } else if err.is_authentication_error() {
            Self::new(StatusCode::UNAUTHORIZED, err.to_string())
        } else if err.is_not_found() {
            Self::new(StatusCode::NOT_FOUND, err.to_string())
        } else if err.is_timeout() {
            tracing::warn!(error = %err, "Request failed on storage timeout");
            Self::new(StatusCode::SERVICE_UNAVAILABLE, "Storage timed out")
        } else {
            tracing::error!(error = %err, module = err.module(), "Request failed");
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

impl From<userbase::user::UserError> for ApiError {
    fn from(err: userbase::user::UserError) -> Self {
        userbase::Error::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
