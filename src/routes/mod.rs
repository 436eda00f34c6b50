mod chat;
mod health;
mod stats;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` — lightweight liveness check
/// - `GET /ws` — chat `WebSocket`
/// - `GET /api/v1/health` — health check with live connection count
/// - `GET /api/v1/stats` — matchmaking counters
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .merge(health::api_router())
        .merge(stats::api_router());

    Router::new()
        .merge(health::root_router())
        .merge(chat::router())
        .nest("/api/v1", api_v1)
}
