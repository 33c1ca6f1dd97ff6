//! Request-level error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::worker::BridgeError;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Multipart body was missing the photo or could not be parsed.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("upload exceeds the configured size limit")]
    PayloadTooLarge,

    /// Uploaded bytes could not be written to the staging directory.
    #[error("failed to stage upload: {0}")]
    Staging(#[source] std::io::Error),

    #[error(transparent)]
    Worker(#[from] BridgeError),

    #[error("no processed photo named {0:?}")]
    RetrievalNotFound(String),
}

impl GatewayError {
    /// Stable label used in error bodies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidUpload(_) => "invalid_upload",
            GatewayError::PayloadTooLarge => "payload_too_large",
            GatewayError::Staging(_) => "staging_failed",
            GatewayError::RetrievalNotFound(_) => "not_found",
            GatewayError::Worker(e) => match e {
                BridgeError::Unavailable { .. } | BridgeError::ConnectTimeout { .. } => {
                    "backend_unavailable"
                }
                BridgeError::Timeout { .. } => "backend_timeout",
                BridgeError::Reset(_) => "backend_reset",
                BridgeError::EmptyResponse => "empty_response",
                BridgeError::ResponseTooLarge { .. } => "response_too_large",
                BridgeError::UnsafePath(_) => "unsafe_path",
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Staging(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::RetrievalNotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Worker(e) => match e {
                BridgeError::Unavailable { .. } | BridgeError::ConnectTimeout { .. } => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                BridgeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                BridgeError::Reset(_)
                | BridgeError::EmptyResponse
                | BridgeError::ResponseTooLarge { .. } => StatusCode::BAD_GATEWAY,
                BridgeError::UnsafePath(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let message = if status.is_server_error() {
            tracing::error!(kind, error = %self, "Job failed");
            match &self {
                // Internal paths stay in the log.
                GatewayError::Staging(_) | GatewayError::Worker(BridgeError::UnsafePath(_)) => {
                    "Internal Server Error".to_string()
                }
                _ => self.to_string(),
            }
        } else {
            tracing::warn!(kind, error = %self, "Request rejected");
            self.to_string()
        };

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}
