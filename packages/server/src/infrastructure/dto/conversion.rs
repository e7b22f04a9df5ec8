//! Conversion logic between DTOs and domain types.

use devlink_shared::time::to_rfc3339_millis;

use crate::domain::{HubEvent, InboundFrame};
use crate::infrastructure::dto::websocket::{ClientFrame, PresenceStatus, ServerFrame};

// ========================================
// DTO → Domain
// ========================================

impl From<ClientFrame> for InboundFrame {
    fn from(dto: ClientFrame) -> Self {
        match dto {
            ClientFrame::Typing { is_typing } => Self::Typing { is_typing },
            ClientFrame::Message { content } => Self::Message { content },
        }
    }
}

/// Decode one text frame into a domain frame.
///
/// Anything that is not a well-formed `typing` / `message` object becomes
/// [`InboundFrame::Unrecognized`]; decoding never fails.
pub fn decode_inbound(text: &str) -> InboundFrame {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame.into(),
        Err(e) => {
            tracing::debug!("Ignoring malformed frame: {}", e);
            InboundFrame::Unrecognized
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&HubEvent> for ServerFrame {
    fn from(event: &HubEvent) -> Self {
        match event {
            HubEvent::PresenceOnline { user_id } => Self::Presence {
                status: PresenceStatus::Online,
                user_id: user_id.to_string(),
                last_seen: None,
            },
            HubEvent::PresenceOffline { user_id, last_seen } => Self::Presence {
                status: PresenceStatus::Offline,
                user_id: user_id.to_string(),
                last_seen: Some(to_rfc3339_millis(last_seen)),
            },
            HubEvent::Typing { user_id, is_typing } => Self::Typing {
                user_id: user_id.to_string(),
                is_typing: *is_typing,
            },
            HubEvent::ChatMessage(message) => Self::Message {
                id: message.id.to_string(),
                room_id: message.room_id.to_string(),
                sender_id: message.sender_id.to_string(),
                content: message.content.as_str().to_string(),
                created_at: to_rfc3339_millis(&message.created_at),
            },
        }
    }
}
