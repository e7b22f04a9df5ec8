//! InMemory ChatStore 実装
//!
//! ドメイン層が定義する ChatStore trait の具体的な実装。
//! HashMap / Vec をインメモリ DB として使用します（テスト・開発用）。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, ChatStore, MessageId, Room, RoomId, StoreError, UserId};

#[derive(Default)]
struct State {
    rooms: HashMap<RoomId, Room>,
    messages: Vec<ChatMessage>,
    last_seen: HashMap<UserId, DateTime<Utc>>,
}

/// インメモリ ChatStore 実装
#[derive(Default)]
pub struct InMemoryChatStore {
    state: Mutex<State>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 2 人の参加者でルームを作成
    pub async fn create_room(&self, participants: [UserId; 2], created_at: DateTime<Utc>) -> Room {
        let room = Room::new(participants, created_at);
        let mut state = self.state.lock().await;
        state.rooms.insert(room.id, room.clone());
        room
    }

    /// ルームのメッセージ（保存順）
    pub async fn messages_in(&self, room_id: &RoomId) -> Vec<ChatMessage> {
        let state = self.state.lock().await;
        state
            .messages
            .iter()
            .filter(|m| m.room_id == *room_id)
            .cloned()
            .collect()
    }

    pub async fn last_seen(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        let state = self.state.lock().await;
        state.last_seen.get(user_id).copied()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn room_contains_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .rooms
            .get(room_id)
            .is_some_and(|room| room.contains(user_id)))
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<MessageId, StoreError> {
        let mut state = self.state.lock().await;
        if !state.rooms.contains_key(&message.room_id) {
            return Err(StoreError::PersistenceFailure(format!(
                "room {} does not exist",
                message.room_id
            )));
        }
        state.messages.push(message.clone());
        Ok(message.id)
    }

    async fn set_last_seen(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.last_seen.insert(*user_id, at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageContent;
    use devlink_shared::time::{Clock, FixedClock};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 参加者確認、メッセージ保存、最終接続時刻の記録
    //
    // 【なぜこのテストが必要か】
    // - UseCase のテストと統合テストがこの実装に依存する
    // ========================================

    #[tokio::test]
    async fn test_room_contains_only_its_participants() {
        // テスト項目: ルームの参加者だけが参加者として判定される
        // given (前提条件):
        let store = InMemoryChatStore::new();
        let alice = UserId::generate();
        let bob = UserId::generate();
        let room = store
            .create_room([alice, bob], FixedClock::from_millis(0).now())
            .await;

        // when (操作):
        let alice_in = store.room_contains_participant(&room.id, &alice).await;
        let stranger_in = store
            .room_contains_participant(&room.id, &UserId::generate())
            .await;
        let unknown_room = store
            .room_contains_participant(&RoomId::generate(), &alice)
            .await;

        // then (期待する結果):
        assert_eq!(alice_in, Ok(true));
        assert_eq!(stranger_in, Ok(false));
        assert_eq!(unknown_room, Ok(false));
    }

    #[tokio::test]
    async fn test_insert_message_returns_id() {
        // テスト項目: 保存したメッセージの ID が返り、一覧に現れる
        // given (前提条件):
        let store = InMemoryChatStore::new();
        let alice = UserId::generate();
        let clock = FixedClock::from_millis(1_000);
        let room = store.create_room([alice, UserId::generate()], clock.now()).await;
        let message = ChatMessage::new(
            room.id,
            alice,
            MessageContent::new("hello").unwrap(),
            clock.now(),
        );

        // when (操作):
        let id = store.insert_message(&message).await.unwrap();

        // then (期待する結果):
        assert_eq!(id, message.id);
        assert_eq!(store.messages_in(&room.id).await, vec![message]);
    }

    #[tokio::test]
    async fn test_insert_message_into_unknown_room_fails() {
        // テスト項目: 存在しないルームへの保存は PersistenceFailure になる
        // given (前提条件):
        let store = InMemoryChatStore::new();
        let message = ChatMessage::new(
            RoomId::generate(),
            UserId::generate(),
            MessageContent::new("hello").unwrap(),
            FixedClock::from_millis(0).now(),
        );

        // when (操作):
        let result = store.insert_message(&message).await;

        // then (期待する結果):
        assert!(matches!(result, Err(StoreError::PersistenceFailure(_))));
    }

    #[tokio::test]
    async fn test_set_last_seen_overwrites() {
        // テスト項目: 最終接続時刻は上書きされる
        // given (前提条件):
        let store = InMemoryChatStore::new();
        let user_id = UserId::generate();
        let first = FixedClock::from_millis(1_000).now();
        let second = FixedClock::from_millis(2_000).now();

        // when (操作):
        store.set_last_seen(&user_id, first).await.unwrap();
        store.set_last_seen(&user_id, second).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.last_seen(&user_id).await, Some(second));
    }
}
