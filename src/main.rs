use std::sync::Arc;

use mcp_stdio_bridge::{build_app, bridge::TokioProcessRunner, config::Config, logging, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let registry = config.load_registry()?;
    let bind_socket = config.bind_socket()?;

    for backend in registry.iter() {
        info!(
            backend = %backend.name,
            route = %format!("/{}", backend.route),
            command = %backend.command,
            available = backend.is_available(),
            "backend registered"
        );
    }

    let state = AppState::new(
        registry,
        Arc::new(TokioProcessRunner::new()),
        config.public_url.clone(),
    );
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        public_url = %config.public_url,
        "server starting"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            warn!(error = %err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    }
}
