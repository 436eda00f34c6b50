use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct RootHealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ApiHealthResponse {
    status: &'static str,
    version: &'static str,
    connections: usize,
}

/// `GET /health` — liveness probe, never touches chat state.
async fn root_health() -> Json<RootHealthResponse> {
    Json(RootHealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/v1/health` — includes the live connection count.
async fn api_health(State(state): State<AppState>) -> Json<ApiHealthResponse> {
    Json(ApiHealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        connections: state.chat.stats().connections,
    })
}

pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(root_health))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(api_health))
}
