use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::services::engine::EngineError;
use crate::services::export::ExportError;
use crate::services::session::SessionError;

/// Error type returned by every API handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// Upload body rejected while parsing, including the body size limit.
    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Sign in to use this feature")]
    Unauthorized,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(EngineError::InvalidInputKind { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::Engine(EngineError::EmptyFile) => StatusCode::BAD_REQUEST,
            ApiError::Engine(EngineError::FileTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Engine(EngineError::JobNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::Invalid(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Export(ExportError::NotReady(_)) => StatusCode::CONFLICT,
            ApiError::Multipart(e) => e.status(),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
