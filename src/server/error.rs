//! API error type and its JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::VisionError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request data (400)
    #[error("{message}")]
    BadRequest { message: String },

    /// Upload over the configured body limit (413)
    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,

    /// Internal server error (500)
    #[error("{message}")]
    Internal { message: String },

    /// Upstream third-party service failed (500)
    #[error("{service} error: {status}")]
    Upstream { service: &'static str, status: u16 },

    /// Feature not available in this deployment (503)
    #[error("{message}")]
    ServiceUnavailable { message: String },

    #[error("{0}")]
    Vision(#[from] VisionError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal { .. } | Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Vision(VisionError::Image(_) | VisionError::Decode(_)) => StatusCode::BAD_REQUEST,
            Self::Vision(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Internal { .. } => "INTERNAL_ERROR",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::Vision(VisionError::Image(_)) => "INVALID_IMAGE",
            Self::Vision(VisionError::Decode(_)) => "INVALID_VIDEO",
            Self::Vision(_) => "VISION_ERROR",
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "API error");
        } else {
            tracing::warn!(error = %self, "API error");
        }

        let body = ErrorResponse {
            code: self.error_code(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::internal("x").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::unavailable("x").status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let upstream = ApiError::Upstream {
            service: "OpenRouter",
            status: 429,
        };
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "OpenRouter error: 429");
    }

    #[test]
    fn test_vision_errors_map_by_kind() {
        let inference = ApiError::from(VisionError::inference("boom"));
        assert_eq!(inference.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(inference.error_code(), "VISION_ERROR");

        let decode = ApiError::from(VisionError::Decode("truncated".to_string()));
        assert_eq!(decode.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(decode.error_code(), "INVALID_VIDEO");
    }
}
