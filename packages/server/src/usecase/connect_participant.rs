//! UseCase: 参加者接続処理（Admitted → Active）
//!
//! ## 処理内容
//!
//! 1. セッションを Room Registry に登録
//! 2. Presence Ledger を加算し、0 → 1 の遷移だった場合のみオンライン通知をルームにブロードキャスト
//!
//! 加算と通知は Ledger の中で一体に行う。同じユーザーの切断処理と交差しても、
//! ルームに届くプレゼンス通知の順序はカウントの遷移順と一致する。
//!
//! 登録を先に行うため、オンライン通知は接続したセッション自身にも届く。

use std::sync::Arc;

use crate::{
    domain::{HubEvent, MessagePusher, SessionHandle},
    infrastructure::registry::{PresenceLedger, RoomRegistry},
};

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    registry: Arc<RoomRegistry>,
    ledger: Arc<PresenceLedger>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        ledger: Arc<PresenceLedger>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            ledger,
            message_pusher,
        }
    }

    /// 参加者接続を実行
    ///
    /// # Returns
    ///
    /// ユーザーがこの接続でオンラインになった（0 → 1）場合は `true`
    pub fn execute(&self, session: &SessionHandle) -> bool {
        self.registry.admit(&session.room_id, session.clone());
        let went_online = self
            .ledger
            .increment_with(&session.room_id, &session.user_id, || {
                self.message_pusher.publish(
                    &session.room_id,
                    &HubEvent::PresenceOnline {
                        user_id: session.user_id,
                    },
                );
            });

        tracing::info!(
            session_id = %session.id,
            user_id = %session.user_id,
            room_id = %session.room_id,
            went_online,
            "Session admitted"
        );

        went_online
    }
}
