//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Live view of one room (`GET /debug/rooms/{room_id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPresenceDto {
    pub room_id: String,
    /// Number of live sessions filed under the room
    pub sessions: usize,
    /// Users with at least one live session, sorted
    pub online_users: Vec<String>,
}
