use std::{future::Future, io, sync::Arc};

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info};

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use config::{Config, ServerVariant};
use mcp::registry::RegistryError;
use mcp::server::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub variant: ServerVariant,
    pub allowed_origins: Arc<[HeaderValue]>,
}

impl AppState {
    pub fn new(
        dispatcher: Dispatcher,
        variant: ServerVariant,
        allowed_origins: Vec<HeaderValue>,
    ) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            variant,
            allowed_origins: Arc::from(allowed_origins),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let dispatcher = domain::build_dispatcher(config.variant, config.profiles.clone())?;
        Ok(Self::new(
            dispatcher,
            config.variant,
            config.allowed_origins.clone(),
        ))
    }
}

fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins.iter().cloned()))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .layer(cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

/// Resolves when `signal` fires. A signal that cannot be listened for is logged
/// and never resolves, so the server keeps serving instead of exiting at once.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
