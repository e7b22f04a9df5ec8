//! SQLite ChatStore 実装
//!
//! ## テーブル
//!
//! - `room_participants`: ルームと参加者の対応（1 ルームにつき 2 行）
//! - `messages`: チャットメッセージ
//! - `user_presence`: ユーザーの最終接続時刻
//!
//! ID と時刻は TEXT（UUID のハイフン区切り / RFC 3339）で保存する。

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use devlink_shared::time::to_rfc3339_millis;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::domain::{ChatMessage, ChatStore, MessageId, Room, RoomId, StoreError, UserId};

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS room_participants (
        room_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (room_id, user_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        room_id TEXT NOT NULL,
        sender_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        seen_at TEXT
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_presence (
        user_id TEXT PRIMARY KEY,
        last_seen TEXT NOT NULL
    )"#,
];

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::PersistenceFailure(e.to_string())
    }
}

/// SQLite ChatStore 実装
#[derive(Clone)]
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    /// データベースに接続し、スキーマを作成する
    ///
    /// `sqlite::memory:` の場合は接続を 1 本に固定する（接続ごとに別の DB になるため）。
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!("Connected to {}", database_url);
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// 2 人の参加者でルームを作成
    pub async fn create_room(
        &self,
        participants: [UserId; 2],
        created_at: DateTime<Utc>,
    ) -> Result<Room, StoreError> {
        let room = Room::new(participants, created_at);
        let created_at = to_rfc3339_millis(&room.created_at);

        let mut tx = self.pool.begin().await?;
        for user_id in &room.participants {
            sqlx::query(
                "INSERT OR IGNORE INTO room_participants (room_id, user_id, created_at) VALUES (?, ?, ?)",
            )
            .bind(room.id.to_string())
            .bind(user_id.to_string())
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(room)
    }

    /// ルームのメッセージ本文（保存順）
    pub async fn message_contents(&self, room_id: &RoomId) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT content FROM messages WHERE room_id = ? ORDER BY rowid")
                .bind(room_id.to_string())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(content,)| content).collect())
    }

    pub async fn last_seen(&self, user_id: &UserId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT last_seen FROM user_presence WHERE user_id = ?")
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(raw,)| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|at| at.with_timezone(&Utc))
                .map_err(|e| StoreError::PersistenceFailure(e.to_string()))
        })
        .transpose()
    }
}

#[async_trait]
impl ChatStore for SqliteChatStore {
    async fn room_contains_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM room_participants WHERE room_id = ? AND user_id = ?")
                .bind(room_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.is_some())
    }

    async fn insert_message(&self, message: &ChatMessage) -> Result<MessageId, StoreError> {
        sqlx::query(
            "INSERT INTO messages (id, room_id, sender_id, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.room_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(message.content.as_str())
        .bind(to_rfc3339_millis(&message.created_at))
        .execute(&self.pool)
        .await?;
        Ok(message.id)
    }

    async fn set_last_seen(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_presence (user_id, last_seen) VALUES (?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET last_seen = excluded.last_seen",
        )
        .bind(user_id.to_string())
        .bind(to_rfc3339_millis(&at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageContent;
    use devlink_shared::time::{Clock, FixedClock};

    async fn create_test_store() -> SqliteChatStore {
        SqliteChatStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_created_room_has_both_participants() {
        // テスト項目: 作成したルームの 2 人だけが参加者として判定される
        // given (前提条件):
        let store = create_test_store().await;
        let alice = UserId::generate();
        let bob = UserId::generate();

        // when (操作):
        let room = store
            .create_room([alice, bob], FixedClock::from_millis(0).now())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(store.room_contains_participant(&room.id, &alice).await.unwrap());
        assert!(store.room_contains_participant(&room.id, &bob).await.unwrap());
        assert!(
            !store
                .room_contains_participant(&room.id, &UserId::generate())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_insert_message_persists_content() {
        // テスト項目: 保存したメッセージが保存順に読み出せる
        // given (前提条件):
        let store = create_test_store().await;
        let alice = UserId::generate();
        let clock = FixedClock::from_millis(1_000);
        let room = store
            .create_room([alice, UserId::generate()], clock.now())
            .await
            .unwrap();

        // when (操作):
        for content in ["first", "second"] {
            let message = ChatMessage::new(
                room.id,
                alice,
                MessageContent::new(content).unwrap(),
                clock.now(),
            );
            let id = store.insert_message(&message).await.unwrap();
            assert_eq!(id, message.id);
        }

        // then (期待する結果):
        assert_eq!(
            store.message_contents(&room.id).await.unwrap(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[tokio::test]
    async fn test_set_last_seen_upserts() {
        // テスト項目: 最終接続時刻は何度でも上書きできる
        // given (前提条件):
        let store = create_test_store().await;
        let user_id = UserId::generate();
        let second = FixedClock::from_millis(2_000).now();

        // when (操作):
        store
            .set_last_seen(&user_id, FixedClock::from_millis(1_000).now())
            .await
            .unwrap();
        store.set_last_seen(&user_id, second).await.unwrap();

        // then (期待する結果):
        assert_eq!(store.last_seen(&user_id).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_last_seen_of_unknown_user_is_none() {
        // テスト項目: 記録の無いユーザーの最終接続時刻は None
        // given (前提条件):
        let store = create_test_store().await;

        // when (操作):
        let result = store.last_seen(&UserId::generate()).await;

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }
}
