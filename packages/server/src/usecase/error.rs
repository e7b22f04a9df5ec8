//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{StoreError, ValueObjectError};

/// メッセージ送信のエラー
///
/// いずれもセッションを閉じず、クライアントにも通知しない（ログのみ）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("invalid message content: {0}")]
    InvalidContent(#[from] ValueObjectError),

    /// 保存に失敗した（ブロードキャストは行われない）
    #[error(transparent)]
    Persistence(#[from] StoreError),
}
