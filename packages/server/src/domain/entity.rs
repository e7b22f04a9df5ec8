//! エンティティ定義
//!
//! - `ChatMessage`: 永続化されたチャットメッセージ
//! - `Room`: 2 人の参加者を持つ会話（外部ストアが所有）
//! - `SessionHandle`: ルームに紐づいた 1 本の生存中の接続

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::{
    error::PushError,
    value_object::{MessageContent, MessageId, RoomId, SessionId, UserId},
};

/// チャットメッセージ
///
/// 作成後は不変。`seen_at` だけは既読処理（REST 層）が後から設定する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: MessageContent,
    pub created_at: DateTime<Utc>,
    pub seen_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// 新しいメッセージを作成（ID は新規発行）
    pub fn new(
        room_id: RoomId,
        sender_id: UserId,
        content: MessageContent,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            room_id,
            sender_id,
            content,
            created_at,
            seen_at: None,
        }
    }
}

/// チャットルーム
///
/// ハブはハンドシェイク時に参加者を確認するだけで、変更はしない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub participants: [UserId; 2],
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(participants: [UserId; 2], created_at: DateTime<Utc>) -> Self {
        Self {
            id: RoomId::generate(),
            participants,
            created_at,
        }
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.participants.contains(user_id)
    }
}

/// セッションの送信キューに積まれる要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    /// シリアライズ済みのイベント（JSON テキスト）
    Event(Arc<str>),
    /// 生存確認の Ping
    Ping,
}

/// セッションの送信キュー（有界）
pub type PusherChannel = mpsc::Sender<Outgoing>;

/// 生存中のセッションへのハンドル
///
/// Room Registry に登録され、ブロードキャスト時の配信先になる。
/// クローンは同じ接続を指す。
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub user_id: UserId,
    pub room_id: RoomId,
    pub connected_at: DateTime<Utc>,
    outbox: PusherChannel,
    shutdown: CancellationToken,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn new(
        user_id: UserId,
        room_id: RoomId,
        connected_at: DateTime<Utc>,
        outbox: PusherChannel,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            user_id,
            room_id,
            connected_at,
            outbox,
            shutdown: CancellationToken::new(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// イベントを送信キューに積む（待たない）
    ///
    /// キューが満杯、または受信側が既に閉じている場合は `TransportFailure`。
    pub fn deliver(&self, frame: Arc<str>) -> Result<(), PushError> {
        self.enqueue(Outgoing::Event(frame))
    }

    /// Ping を送信キューに積む
    pub fn probe(&self) -> Result<(), PushError> {
        self.enqueue(Outgoing::Ping)
    }

    fn enqueue(&self, item: Outgoing) -> Result<(), PushError> {
        if !self.is_live() {
            return Err(PushError::TransportFailure(self.id.to_string()));
        }
        self.outbox.try_send(item).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "outbox full",
                TrySendError::Closed(_) => "outbox closed",
            };
            tracing::debug!(session_id = %self.id, reason, "delivery failed");
            PushError::TransportFailure(self.id.to_string())
        })
    }

    /// 接続を強制的に閉じる（読み書きループとプローブが停止する）
    pub fn force_close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_live(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// 接続終了を待つためのトークン
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 終了処理の実行権を取得する
    ///
    /// 最初の呼び出しだけが `true` を返す。
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SessionHandle {}
