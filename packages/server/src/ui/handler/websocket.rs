//! WebSocket connection handlers.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        Path, Query, State,
        ws::WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    domain::HandshakeError,
    ui::{session::run_session, state::AppState},
};

/// `GET /ws/chat/{room_id}`
///
/// The handshake is fully validated before the upgrade. Rejections answer with
/// a bare status code and no body.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(raw_room_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Response {
    // Query parameter wins over the cookie
    let credential = params
        .get(&state.credentials.query)
        .map(String::as_str)
        .or_else(|| jar.get(&state.credentials.cookie).map(|cookie| cookie.value()));

    let identity = match state
        .authenticate_handshake_usecase
        .execute(credential, &raw_room_id)
        .await
    {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(room_id = %raw_room_id, "Handshake rejected: {}", e);
            return handshake_status(&e).into_response();
        }
    };

    tracing::debug!(
        user_id = %identity.user_id,
        room_id = %identity.room_id,
        "Handshake accepted, upgrading"
    );
    ws.on_upgrade(move |socket| {
        let session_tasks = state.session_tasks.clone();
        session_tasks.track_future(run_session(socket, state, identity))
    })
}

fn handshake_status(error: &HandshakeError) -> StatusCode {
    match error {
        HandshakeError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        HandshakeError::Forbidden(_) => StatusCode::FORBIDDEN,
        HandshakeError::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
}
