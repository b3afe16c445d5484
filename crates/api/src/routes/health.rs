use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

/// Full health check: verifies the mirror store is reachable.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.store().ping().await?;

    Ok(Json(json!({
        "status": "ok",
        "mirror": "connected",
        "subscribers": state.event_bus().subscriber_count(),
    })))
}

/// Lightweight ping, no mirror store access.
async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
