//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{domain::RoomId, infrastructure::dto::http::RoomPresenceDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint: live sessions and present users of one room
pub async fn debug_room_presence(
    State(state): State<Arc<AppState>>,
    Path(raw_room_id): Path<String>,
) -> Result<Json<RoomPresenceDto>, StatusCode> {
    let room_id = RoomId::parse(&raw_room_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    // Domain Model から DTO への変換
    let presence = RoomPresenceDto {
        room_id: room_id.to_string(),
        sessions: state.registry.session_count(&room_id),
        online_users: state
            .ledger
            .online_users(&room_id)
            .iter()
            .map(ToString::to_string)
            .collect(),
    };
    Ok(Json(presence))
}
