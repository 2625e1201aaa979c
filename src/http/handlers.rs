//! Axum HTTP handlers for the web server
//!
//! Provides the protocol endpoint, the health check and the discovery document.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use serde::Serialize;
use serde_json::Value;

use crate::auth::context_from_authorization;
use crate::domain::utils::utc_timestamp;
use crate::errors::AppError;
use crate::mcp::server::handle_json_rpc_value;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: String,
    pub version: String,
    pub mcp_endpoint: &'static str,
    pub variant: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let info = state.dispatcher.info();
    Json(HealthResponse {
        status: "ok",
        timestamp: utc_timestamp(),
        name: info.name.clone(),
        version: info.version.clone(),
    })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    let info = state.dispatcher.info();
    Json(DiscoveryResponse {
        name: info.name.clone(),
        version: info.version.clone(),
        mcp_endpoint: "/mcp",
        variant: state.variant.as_str(),
    })
}

/// Protocol errors travel in a 200 response; only an unparseable body is an HTTP error.
pub async fn mcp_endpoint(
    State(state): State<AppState>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|_| AppError::MalformedBody)?;
    let ctx = context_from_authorization(auth_header);

    let response = match handle_json_rpc_value(&state.dispatcher, payload, &ctx).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
