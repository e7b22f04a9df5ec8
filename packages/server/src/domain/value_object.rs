//! 値オブジェクト
//!
//! ハブで扱う識別子とメッセージ本文を型で区別します。
//! 識別子は全て UUID で、ワイヤ上ではハイフン区切りの小文字文字列です。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// メッセージ本文の最大長（文字数）
pub const MAX_MESSAGE_LENGTH: usize = 4000;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// ランダムな識別子を生成
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// 文字列をパースして識別子を作成
            pub fn parse(raw: &str) -> Result<Self, ValueObjectError> {
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| ValueObjectError::InvalidIdentifier {
                        kind: $label,
                        value: raw.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.as_hyphenated().fmt(f)
            }
        }
    };
}

uuid_id!(
    /// ユーザー ID（認証情報の `user_id` クレーム）
    UserId,
    "user"
);
uuid_id!(
    /// チャットルーム ID（接続先 URL の `{room_id}`）
    RoomId,
    "room"
);
uuid_id!(
    /// 永続化されたチャットメッセージの ID
    MessageId,
    "message"
);
uuid_id!(
    /// 接続ハンドル（1 本の WebSocket 接続ごとに払い出す）
    SessionId,
    "session"
);

/// メッセージ本文
///
/// 前後の空白を取り除いた後に空でないことを保証します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent(String);

impl MessageContent {
    /// 本文を検証して作成（前後の空白は除去される）
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValueObjectError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyMessageContent);
        }
        let length = trimmed.chars().count();
        if length > MAX_MESSAGE_LENGTH {
            return Err(ValueObjectError::MessageContentTooLong {
                length,
                max: MAX_MESSAGE_LENGTH,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
