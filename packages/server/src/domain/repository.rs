//! 外部コラボレータの trait 定義
//!
//! ドメイン層が必要とするインターフェースをドメイン層自身が定義し、
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! - `ChatStore`: 永続化ストア（参加者確認・メッセージ保存・最終接続時刻）
//! - `CredentialVerifier`: 認証情報の検証
//! - `MessagePusher`: ルーム単位のブロードキャスト

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    CredentialError, HubEvent, SessionId, StoreError,
    entity::ChatMessage,
    value_object::{MessageId, RoomId, UserId},
};

/// 永続化ストア
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// ユーザーがルームの参加者かどうか
    async fn room_contains_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<bool, StoreError>;

    /// メッセージを保存し、保存された ID を返す
    async fn insert_message(&self, message: &ChatMessage) -> Result<MessageId, StoreError>;

    /// ユーザーの最終接続時刻を記録
    async fn set_last_seen(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// 検証済みの認証情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCredential {
    /// `user_id` クレーム（未パース）
    pub user_id: String,
    /// 用途を示すサブタイプ（`typ` クレーム）
    pub subtype: String,
    pub expires_at: DateTime<Utc>,
}

/// 認証情報の検証
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    /// 署名と有効期限を検証してクレームを返す
    fn verify(&self, token: &str) -> Result<VerifiedCredential, CredentialError>;
}

/// ブロードキャストの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// 送信キューに積めたセッション数
    pub delivered: usize,
    /// 配信に失敗し、ルームから外したセッション
    pub evicted: Vec<SessionId>,
}

/// ルーム単位のブロードキャスト
///
/// 呼び出し側は配信完了を待たない（fire-and-forget）。
pub trait MessagePusher: Send + Sync {
    fn publish(&self, room_id: &RoomId, event: &HubEvent) -> PublishReport;
}
