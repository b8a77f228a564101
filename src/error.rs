//! Domain-specific error types for integral-lens

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

/// Every way a lens request can fail. Each variant maps to exactly one HTTP status.
#[derive(Error, Debug)]
pub enum LensError {
    #[error("Missing input")]
    InvalidInput,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Server missing upstream API key")]
    MissingCredential,

    #[error("Upstream unreachable: {message}")]
    UpstreamUnreachable { message: String },

    #[error("Upstream error (status {status}): {detail}")]
    UpstreamError { status: u16, detail: Value },

    #[error("Missing output_text in upstream response")]
    MissingPayload,

    #[error("Unexpected failure: {message}")]
    Unexpected { message: String },
}

impl LensError {
    pub fn status(&self) -> StatusCode {
        match self {
            LensError::InvalidInput => StatusCode::BAD_REQUEST,
            LensError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            LensError::MissingCredential | LensError::Unexpected { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LensError::UpstreamUnreachable { .. }
            | LensError::UpstreamError { .. }
            | LensError::MissingPayload => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            LensError::InvalidInput => "invalid_input",
            LensError::MethodNotAllowed => "method_not_allowed",
            LensError::MissingCredential => "missing_credential",
            LensError::UpstreamUnreachable { .. } => "upstream_unreachable",
            LensError::UpstreamError { .. } => "upstream_error",
            LensError::MissingPayload => "missing_payload",
            LensError::Unexpected { .. } => "unexpected",
        }
    }

    /// Value placed under the `error` key of the JSON body.
    pub fn detail(&self) -> Value {
        match self {
            LensError::UpstreamError { detail, .. } => detail.clone(),
            LensError::UpstreamUnreachable { message } | LensError::Unexpected { message } => {
                Value::String(message.clone())
            }
            other => Value::String(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for LensError {
    fn from(err: reqwest::Error) -> Self {
        LensError::UpstreamUnreachable {
            message: format!("HTTP request failed: {}", err),
        }
    }
}

impl IntoResponse for LensError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let LensError::MethodNotAllowed = self {
            return (
                status,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "Method Not Allowed",
            )
                .into_response();
        }
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            json!({ "error": self.detail() }).to_string(),
        )
            .into_response()
    }
}

/// Result type alias for lens operations
pub type Result<T> = std::result::Result<T, LensError>;
