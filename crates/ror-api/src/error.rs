//! HTTP error mapping. Every failure leaves as `{"error": "<message>"}`.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ror_core::RorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ror(#[from] RorError),

    /// A multipart upload could not be read.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ror(err) => match err {
                RorError::Upload(_) | RorError::Session(_) => StatusCode::BAD_REQUEST,
                RorError::Detection(_) => StatusCode::BAD_GATEWAY,
                // report generation answers every failure with 500
                RorError::Validation(_)
                | RorError::ImageDecode(_)
                | RorError::Render(_)
                | RorError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metric label of the failure.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Ror(err) => err.kind(),
            ApiError::BadRequest(_) => "validation",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<prometheus::Error> for ApiError {
    fn from(err: prometheus::Error) -> Self {
        ApiError::Internal(format!("metrics: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
