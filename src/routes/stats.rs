use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::chat::ChatStats;
use crate::state::AppState;

/// `GET /api/v1/stats` — current matchmaking counters.
async fn stats(State(state): State<AppState>) -> Json<ChatStats> {
    Json(state.chat.stats())
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}
