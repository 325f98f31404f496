//! API Routes
//!
//! - `/` - Research page
//! - `/api/agent/run` - Start a run, streamed back as server-sent events
//! - `/api/agent/status` - Whether a run is in progress
//! - `/api/tools` - Tools available to the agent
//! - `/api/health` - Health check

pub mod agent;
pub mod health;
pub mod ui;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(ui::router())
        .merge(agent::router(state.clone()))
        .merge(health::router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
