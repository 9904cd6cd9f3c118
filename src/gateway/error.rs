use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::evaluate::EvalError;
use crate::staging::StagingError;

/// Request-level failure, mapped onto an HTTP status and a `{"error": ...}`
/// body.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required form field is missing or invalid.
    #[error("{0}")]
    InvalidForm(String),

    /// The criteria or candidate files are missing after staging.
    #[error("{0}")]
    MissingFiles(String),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error("an internal server error occurred: {0}")]
    Internal(String),
}

/// Failure body relayed to the caller. Never carries a stack trace.
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidForm(_) | Self::MissingFiles(_) => StatusCode::BAD_REQUEST,
            Self::Staging(StagingError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Staging(_) => StatusCode::BAD_REQUEST,
            Self::Evaluation(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Evaluation(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
