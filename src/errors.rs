use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::mcp::rpc::json_rpc_parse_error;

/// Failures at the HTTP transport boundary, before a request reaches the dispatcher.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("request body is not valid JSON")]
    MalformedBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::MalformedBody => {
                tracing::warn!("rejecting malformed request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json_rpc_parse_error()),
                )
                    .into_response()
            }
        }
    }
}

/// Failure raised by a tool or resource handler.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not authenticated: a bearer token is required")]
    NotAuthenticated,
    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("handler aborted: {0}")]
    Aborted(String),
}

impl ToolError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Failure talking to a backing service a handler depends on.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("{0}")]
    Unavailable(String),
}

impl UpstreamError {
    /// Whether the backing call hit its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
