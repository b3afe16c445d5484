use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use blog_sync_core::events::types::{LifecycleEvent, LifecycleKind};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Lifecycle hook routes. The CMS posts `items.create`, `items.update` and
/// `items.delete` notifications here; they are queued for the sync worker
/// and acknowledged before any mirror write happens.
pub fn routes() -> Router<AppState> {
    Router::new().route("/hooks/{collection}/{event}", post(receive))
}

async fn receive(
    State(state): State<AppState>,
    Path((collection, event)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if collection != state.config().source_collection {
        return Err(ApiError::NotFound(format!(
            "no lifecycle hook for collection {collection}"
        )));
    }

    let body: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
    let event = LifecycleEvent::new(LifecycleKind::parse(&event, body)?);
    let event_id = event.id;

    tracing::info!(
        event_id = %event_id,
        collection = %collection,
        event = event.kind.name(),
        items = event.kind.item_count(),
        "lifecycle event received"
    );

    state
        .event_bus()
        .publish(event)
        .map_err(|_| ApiError::Unavailable("sync worker is not running".to_string()))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "accepted": true, "eventId": event_id })),
    ))
}
