//! Message formatting utilities for client display.

use chrono::DateTime;
use devlink_hub::infrastructure::dto::websocket::{PresenceStatus, ServerFrame};

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format any frame broadcast by the hub
    pub fn format_frame(frame: &ServerFrame) -> String {
        match frame {
            ServerFrame::Presence {
                status,
                user_id,
                last_seen,
            } => Self::format_presence(*status, user_id, last_seen.as_deref()),
            ServerFrame::Typing { user_id, is_typing } => {
                Self::format_typing(user_id, *is_typing)
            }
            ServerFrame::Message {
                sender_id,
                content,
                created_at,
                ..
            } => Self::format_chat_message(sender_id, content, created_at),
        }
    }

    /// Format a presence change
    ///
    /// # Arguments
    ///
    /// * `status` - Online or offline
    /// * `user_id` - The user whose presence changed
    /// * `last_seen` - RFC 3339 instant of the last disconnect (offline only)
    pub fn format_presence(status: PresenceStatus, user_id: &str, last_seen: Option<&str>) -> String {
        match (status, last_seen) {
            (PresenceStatus::Online, _) => format!("\n+ {} is online\n", user_id),
            (PresenceStatus::Offline, Some(at)) => {
                format!("\n- {} went offline (last seen {})\n", user_id, format_timestamp(at))
            }
            (PresenceStatus::Offline, None) => format!("\n- {} went offline\n", user_id),
        }
    }

    /// Format a typing indicator
    pub fn format_typing(user_id: &str, is_typing: bool) -> String {
        if is_typing {
            format!("\n… {} is typing\n", user_id)
        } else {
            format!("\n… {} stopped typing\n", user_id)
        }
    }

    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `from` - The user ID of the sender
    /// * `content` - The message content
    /// * `created_at` - RFC 3339 instant at which the hub accepted the message
    pub fn format_chat_message(from: &str, content: &str, created_at: &str) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            from,
            content,
            format_timestamp(created_at)
        )
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}

/// Render an RFC 3339 instant as `YYYY-MM-DD HH:MM:SS UTC`, or verbatim when it does not parse
fn format_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.to_utc().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        Err(_) => raw.to_string(),
    }
}
