use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to callers for failures whose detail must stay server-side.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum AppError {
    /// Caller-supplied input is missing or malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A required process-wide setting is absent. Never carries secret values.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An external call (signing, data store) failed. `message` is what the
    /// caller sees; `source` is only logged.
    #[error("{message}: {source}")]
    Upstream {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn upstream(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Upstream {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) | AppError::Upstream { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message safe to hand back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotFound(msg)
            | AppError::Configuration(msg) => msg.clone(),
            AppError::Upstream { message, .. } => message.clone(),
            AppError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

/// JSON envelope shared by every failing endpoint:
/// `{ "success": false, "error": { "message": "..." } }`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                message: message.into(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Upstream { message, source } => {
                tracing::error!(error = ?source, "{}", message);
            }
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "Unhandled internal error");
            }
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
            }
            _ => {
                tracing::debug!(status = status.as_u16(), "Request rejected: {}", self);
            }
        }

        (status, Json(ErrorEnvelope::new(self.public_message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_is_a_client_error() {
        let err = AppError::InvalidArgument("roomName is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "roomName is required");
    }

    #[test]
    fn upstream_hides_source_from_caller() {
        let err = AppError::upstream(
            "Failed to generate voice token",
            anyhow::anyhow!("secret=abc123 rejected"),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to generate voice token");
    }

    #[test]
    fn internal_uses_generic_message() {
        let err = AppError::from(anyhow::anyhow!("connection refused to 10.0.0.4"));
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn envelope_shape() {
        let body = serde_json::to_value(ErrorEnvelope::new("nope")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": { "message": "nope" } })
        );
    }
}
