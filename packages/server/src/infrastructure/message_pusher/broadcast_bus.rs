//! Room Registry を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - イベントを一度だけ JSON にシリアライズし、ルームの全セッションの送信キューに積む
//! - 配信に失敗したセッションをルームから外し、接続を強制終了させる
//!
//! ## 設計ノート
//!
//! 配信はルームのロックを保持したまま `try_send` で行う（待たない）。
//! そのため同じルームへの publish は直列化され、全セッションが同じ順序でイベントを受け取る。
//! 失敗したセッションの除去はロックを解放してから行う。
//!
//! 除去されたセッションの終了処理（プレゼンスの減算、オフライン通知）は
//! セッション自身のタスクが `DisconnectParticipantUseCase` で行う。

use std::sync::Arc;

use crate::{
    domain::{HubEvent, MessagePusher, PublishReport, PushError, RoomId, SessionHandle},
    infrastructure::{dto::websocket::ServerFrame, registry::RoomRegistry},
};

/// Room Registry を使った MessagePusher 実装
pub struct BroadcastBus {
    registry: Arc<RoomRegistry>,
}

impl BroadcastBus {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }
}

/// ワイヤ形式の JSON テキストにエンコード
pub fn encode_event(event: &HubEvent) -> Result<Arc<str>, PushError> {
    serde_json::to_string(&ServerFrame::from(event))
        .map(Arc::from)
        .map_err(|e| PushError::Encode(e.to_string()))
}

impl MessagePusher for BroadcastBus {
    fn publish(&self, room_id: &RoomId, event: &HubEvent) -> PublishReport {
        let frame = match encode_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(room_id = %room_id, kind = event.kind(), "Failed to encode event: {}", e);
                return PublishReport::default();
            }
        };

        let mut delivered = 0;
        let mut failed: Vec<SessionHandle> = Vec::new();
        self.registry.for_each_member(room_id, |session| {
            match session.deliver(Arc::clone(&frame)) {
                Ok(()) => delivered += 1,
                Err(_) => failed.push(session.clone()),
            }
        });

        let mut evicted = Vec::with_capacity(failed.len());
        for session in failed {
            tracing::warn!(
                room_id = %room_id,
                session_id = %session.id,
                user_id = %session.user_id,
                kind = event.kind(),
                "Delivery failed, disconnecting session"
            );
            self.registry.remove(room_id, &session.id);
            session.force_close();
            evicted.push(session.id);
        }

        tracing::debug!(
            room_id = %room_id,
            kind = event.kind(),
            delivered,
            evicted = evicted.len(),
            "Event published"
        );

        PublishReport { delivered, evicted }
    }
}
