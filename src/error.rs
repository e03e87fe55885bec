//! Relay error taxonomy and its HTTP rendering.
//!
//! Every failure ends the request with a `{error, message}` JSON body. The
//! CORS headers are added by the router layer, not here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors that terminate a relayed request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream credential is not configured.
    #[error("API key not configured. Please check server environment variables.")]
    ServerConfiguration,

    /// `model` or `messages` is missing or empty.
    #[error("Missing required fields: model and messages")]
    BadRequest,

    /// Upstream answered with a non-success status.
    #[error("{body}")]
    UpstreamFailure { status: StatusCode, body: String },

    /// Upstream could not be reached or its body could not be read.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// A JSON body could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl RelayError {
    /// HTTP status the error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BadRequest => StatusCode::BAD_REQUEST,
            RelayError::UpstreamFailure { status, .. } => *status,
            RelayError::ServerConfiguration
            | RelayError::Transport(_)
            | RelayError::Json(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, stable label placed in the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            RelayError::ServerConfiguration => "Server configuration error",
            RelayError::BadRequest => "Bad request",
            RelayError::UpstreamFailure { .. } => "API request failed",
            RelayError::Transport(_) | RelayError::Json(_) | RelayError::Internal(_) => {
                "Internal server error"
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.label(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::BadRequest | RelayError::UpstreamFailure { .. } => {
                tracing::warn!(status = self.status().as_u16(), error = %self, "{}", self.label());
            }
            _ => tracing::error!(status = self.status().as_u16(), error = %self, "{}", self.label()),
        }

        (self.status(), Json(self.body())).into_response()
    }
}
