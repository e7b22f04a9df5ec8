//! UseCase: メッセージ送信処理
//!
//! ## 処理内容
//!
//! 1. 本文を検証（前後の空白を除去、空なら何もせず終了）
//! 2. ストアに保存
//! 3. 保存に成功した場合のみ、保存済みの ID と時刻を持つメッセージをブロードキャスト
//!
//! 保存されていないメッセージは決して配信しない。

use std::sync::Arc;

use devlink_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatStore, HubEvent, MessageContent, MessagePusher, SessionHandle,
    ValueObjectError,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    store: Arc<dyn ChatStore>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    pub fn new(
        store: Arc<dyn ChatStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            message_pusher,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Some(message))` - 保存してブロードキャストした
    /// * `Ok(None)` - 本文が空のため無視した
    /// * `Err(SendMessageError)` - 本文が長すぎる、または保存に失敗した
    pub async fn execute(
        &self,
        session: &SessionHandle,
        raw_content: &str,
    ) -> Result<Option<ChatMessage>, SendMessageError> {
        // 1. 本文の検証
        let content = match MessageContent::new(raw_content) {
            Ok(content) => content,
            Err(ValueObjectError::EmptyMessageContent) => {
                tracing::debug!(session_id = %session.id, "Ignoring empty message");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        // 2. 保存
        let mut message =
            ChatMessage::new(session.room_id, session.user_id, content, self.clock.now());
        message.id = self.store.insert_message(&message).await?;

        // 3. ブロードキャスト
        let report = self
            .message_pusher
            .publish(&message.room_id, &HubEvent::ChatMessage(message.clone()));
        tracing::debug!(
            message_id = %message.id,
            room_id = %message.room_id,
            delivered = report.delivered,
            "Message sent"
        );

        Ok(Some(message))
    }
}
