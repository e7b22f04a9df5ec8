//! WebSocket message DTOs.
//!
//! Every frame is a JSON object with a `type` discriminator.
//!
//! Client → server:
//! - `{"type":"typing","is_typing":true}`
//! - `{"type":"message","content":"hi"}`
//!
//! Server → client:
//! - `{"type":"presence","status":"online","user_id":"…"}`
//! - `{"type":"presence","status":"offline","user_id":"…","last_seen":"…"}`
//! - `{"type":"typing","user_id":"…","is_typing":true}`
//! - `{"type":"message","id":"…","room_id":"…","sender_id":"…","content":"…","created_at":"…"}`

use serde::{Deserialize, Serialize};

/// Frame sent by a client over an admitted session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Typing { is_typing: bool },
    Message { content: String },
}

/// Online / offline marker carried by presence frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Frame broadcast by the hub to every session of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Presence {
        status: PresenceStatus,
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_seen: Option<String>,
    },
    Typing {
        user_id: String,
        is_typing: bool,
    },
    Message {
        id: String,
        room_id: String,
        sender_id: String,
        content: String,
        /// RFC 3339 (UTC)
        created_at: String,
    },
}
