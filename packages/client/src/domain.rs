//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use devlink_hub::infrastructure::dto::websocket::ClientFrame;

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// A rejected handshake will be rejected again, so there is no point retrying.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::Rejected(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Build the room endpoint URL (`{base}/ws/chat/{room_id}?token={token}`)
pub fn room_url(base_url: &str, room_id: &str, token: &str) -> String {
    format!(
        "{}/ws/chat/{}?token={}",
        base_url.trim_end_matches('/'),
        room_id,
        token
    )
}

/// Turn a line typed by the user into the frame to send.
///
/// `/typing on` and `/typing off` toggle the typing indicator; any other line
/// is sent as a chat message. Blank lines produce nothing.
pub fn frame_for_input(line: &str) -> Option<ClientFrame> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.strip_prefix("/typing") {
        Some(rest) if rest.trim() == "on" || rest.trim().is_empty() => {
            Some(ClientFrame::Typing { is_typing: true })
        }
        Some(rest) if rest.trim() == "off" => Some(ClientFrame::Typing { is_typing: false }),
        _ => Some(ClientFrame::Message {
            content: line.to_string(),
        }),
    }
}
