use std::env;

use mcp_demo_server::{
    build_app,
    config::{Config, Transport},
    logging,
    mcp::stdio::{run_stdio, StreamExit},
    shutdown_on, AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?.with_args(env::args().skip(1))?;
    let state = AppState::from_config(&config)?;

    info!(
        variant = %config.variant,
        default_profile = %config.profiles.default_profile_id,
        "server configured"
    );

    match config.transport {
        Transport::Stdio => {
            // The blocking stdin reader cannot be cancelled, so leave without waiting on it.
            if run_stdio(&state.dispatcher).await? == StreamExit::Interrupted {
                info!("interrupted, shutting down");
                std::process::exit(0);
            }
            info!("input closed, shutting down");
        }
        Transport::Http => {
            let bind_socket = config.bind_socket()?;
            let app = build_app(state);
            let listener = tokio::net::TcpListener::bind(bind_socket).await?;

            info!(
                bind_addr = %config.bind_addr,
                bind_port = config.bind_port,
                "server starting"
            );

            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
                .await?;
        }
    }
    Ok(())
}
