mod handlers;
mod types;
mod state;
pub use handlers::*;
pub use types::*;
pub use state::*;

use tokio::net::TcpListener;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use std::sync::Arc;
use std::net::SocketAddr;
use tracing::info;
use anyhow::Result;
use std::time::Duration;
use crate::config::Settings;
use crate::store::SeriesStore;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let body_limit = state.settings.max_upload_bytes();
    let timeout = state.settings.request_timeout();

    Router::new()
        // Core endpoints
        .route("/health", get(health_check))

        // Record ingestion
        .route("/upload", post(upload_records))
        .route("/upload/{flag}", post(upload_flag_records))
        .route("/reload/{flag}", post(reload_flag))

        // Series endpoints
        .route("/flags", get(list_flags))
        .route("/flags/{flag}", get(get_flag))
        .route("/download_csv", get(download_csv))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(settings: Settings, store: Arc<SeriesStore>) -> Result<()> {
    // Create socket address
    let addr = format!("{}:{}", settings.host, settings.port)
        .parse::<SocketAddr>()?;

    // Create application state
    let state = Arc::new(AppState::new(store, settings));
    let app = build_router(state);

    // Create TCP listener
    let listener = TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
