//! UseCase: ハンドシェイク認証
//!
//! 接続の昇格（upgrade）前に、認証情報とルームへの参加資格を検証する。
//!
//! 検証順序:
//! 1. 認証情報が存在し、署名・有効期限が正しい → 違反は `Unauthenticated`
//! 2. サブタイプがリアルタイム接続用である → 違反は `Unauthenticated`
//! 3. ルーム ID がパースできる → 違反は `BadRequest`
//! 4. ユーザーがルームの参加者である → 違反は `Forbidden`

use std::sync::Arc;

use crate::domain::{ChatStore, CredentialVerifier, HandshakeError, RoomId, UserId};

/// 認証済みの接続元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmittedIdentity {
    pub user_id: UserId,
    pub room_id: RoomId,
}

/// ハンドシェイク認証のユースケース
pub struct AuthenticateHandshakeUseCase {
    verifier: Arc<dyn CredentialVerifier>,
    store: Arc<dyn ChatStore>,
    /// リアルタイム接続用の認証情報サブタイプ（例: `ws`）
    realtime_subtype: String,
}

impl AuthenticateHandshakeUseCase {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        store: Arc<dyn ChatStore>,
        realtime_subtype: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            store,
            realtime_subtype: realtime_subtype.into(),
        }
    }

    /// ハンドシェイクを検証する
    ///
    /// # Arguments
    ///
    /// * `credential` - クエリパラメータまたは Cookie から取り出した認証情報
    /// * `raw_room_id` - 接続先 URL の `{room_id}`（未パース）
    pub async fn execute(
        &self,
        credential: Option<&str>,
        raw_room_id: &str,
    ) -> Result<AdmittedIdentity, HandshakeError> {
        // 1. 認証情報の検証
        let token = credential
            .filter(|token| !token.is_empty())
            .ok_or_else(|| HandshakeError::Unauthenticated("missing credential".to_string()))?;
        let verified = self
            .verifier
            .verify(token)
            .map_err(|e| HandshakeError::Unauthenticated(e.to_string()))?;

        // 2. サブタイプの検証
        if verified.subtype != self.realtime_subtype {
            return Err(HandshakeError::Unauthenticated(format!(
                "credential subtype '{}' is not valid for this channel",
                verified.subtype
            )));
        }
        let user_id = UserId::parse(&verified.user_id)
            .map_err(|e| HandshakeError::Unauthenticated(e.to_string()))?;

        // 3. ルーム ID の検証
        let room_id =
            RoomId::parse(raw_room_id).map_err(|e| HandshakeError::BadRequest(e.to_string()))?;

        // 4. 参加資格の検証（確認できなければ拒否）
        let is_participant = self
            .store
            .room_contains_participant(&room_id, &user_id)
            .await
            .map_err(|e| {
                tracing::error!(room_id = %room_id, user_id = %user_id, "Membership check failed: {}", e);
                HandshakeError::Forbidden(room_id.to_string())
            })?;
        if !is_participant {
            return Err(HandshakeError::Forbidden(room_id.to_string()));
        }

        Ok(AdmittedIdentity { user_id, room_id })
    }
}
