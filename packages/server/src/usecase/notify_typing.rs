//! UseCase: 入力中インジケータの通知
//!
//! 永続化せず、そのままルームにブロードキャストする。

use std::sync::Arc;

use crate::domain::{HubEvent, MessagePusher, PublishReport, SessionHandle};

/// 入力中インジケータ通知のユースケース
pub struct NotifyTypingUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl NotifyTypingUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    pub fn execute(&self, session: &SessionHandle, is_typing: bool) -> PublishReport {
        self.message_pusher.publish(
            &session.room_id,
            &HubEvent::Typing {
                user_id: session.user_id,
                is_typing,
            },
        )
    }
}
