//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("invalid {kind} identifier: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("message content is empty")]
    EmptyMessageContent,

    #[error("message content is too long ({length} > {max} characters)")]
    MessageContentTooLong { length: usize, max: usize },
}

/// ハンドシェイクの拒否理由
///
/// いずれも接続の昇格（upgrade）前に確定し、セッションは登録されない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// 認証情報が無い・不正・期限切れ・用途違い
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// 認証済みだがルームの参加者ではない
    #[error("forbidden: user is not a participant of room {0}")]
    Forbidden(String),

    /// ルーム ID が不正
    #[error("bad request: {0}")]
    BadRequest(String),
}

/// 認証情報の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("credential is malformed or has an invalid signature: {0}")]
    Invalid(String),

    #[error("credential has expired")]
    Expired,
}

/// 永続化ストアのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

/// セッションへの配信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// 送信キューが溢れた、または相手側が既に閉じている
    #[error("transport failure for session {0}")]
    TransportFailure(String),

    #[error("failed to encode event: {0}")]
    Encode(String),
}
