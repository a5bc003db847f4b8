//! trialwatch-server: Axum REST API over experiment snapshots on disk.

pub mod api;
pub mod state;

use axum::Router;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::state::AppState;

pub use state::ServerConfig;

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", api::router())
        .with_state(state)
        .layer(cors)
}

/// Serve on an already bound listener. Useful when the caller picked port 0.
pub async fn serve_listener(listener: tokio::net::TcpListener, base_dir: std::path::PathBuf) -> anyhow::Result<()> {
    let app = build_router(AppState::new(base_dir));
    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the server on the configured address.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(base_dir = %config.base_dir.display(), "trialwatch API at http://{}", addr);
    serve_listener(listener, config.base_dir).await
}
