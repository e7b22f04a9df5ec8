//! ハブを流れるイベント
//!
//! - `InboundFrame`: クライアントから届くフレーム（境界で一度だけデコード）
//! - `HubEvent`: ルームにブロードキャストするイベント

use chrono::{DateTime, Utc};

use super::{entity::ChatMessage, value_object::UserId};

/// クライアントから届くフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// 入力中インジケータ（永続化せず即座に再配信）
    Typing { is_typing: bool },
    /// チャットメッセージ（本文は未検証のまま）
    Message { content: String },
    /// 解釈できないフレーム（無視してループを継続）
    Unrecognized,
}

/// ルームにブロードキャストするイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    PresenceOnline {
        user_id: UserId,
    },
    PresenceOffline {
        user_id: UserId,
        last_seen: DateTime<Utc>,
    },
    Typing {
        user_id: UserId,
        is_typing: bool,
    },
    ChatMessage(ChatMessage),
}

impl HubEvent {
    /// ログ出力用のイベント種別
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PresenceOnline { .. } => "presence-online",
            Self::PresenceOffline { .. } => "presence-offline",
            Self::Typing { .. } => "typing",
            Self::ChatMessage(_) => "chat-message",
        }
    }
}
