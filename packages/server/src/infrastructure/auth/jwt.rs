//! HS256 JWT による CredentialVerifier 実装
//!
//! クレーム:
//! - `user_id`: ユーザー ID（UUID 文字列）
//! - `typ`: 用途を示すサブタイプ（リアルタイム接続用は `ws`）
//! - `exp`: 有効期限（Unix 秒）

use chrono::{DateTime, TimeZone, Utc};
use devlink_shared::time::unix_now_secs;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::domain::{CredentialError, CredentialVerifier, VerifiedCredential};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    typ: String,
    exp: i64,
}

/// 共有シークレットで署名・検証する JWT
pub struct JwtCredentialVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCredentialVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// トークンを発行する（`ttl_secs` が負なら期限切れのトークンになる）
    pub fn issue(
        &self,
        user_id: &str,
        subtype: &str,
        ttl_secs: i64,
    ) -> Result<String, CredentialError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            typ: subtype.to_string(),
            exp: unix_now_secs() + ttl_secs,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Invalid(e.to_string()))
    }
}

impl CredentialVerifier for JwtCredentialVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedCredential, CredentialError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => {
                    tracing::debug!(?e, "credential validation failed");
                    CredentialError::Invalid(e.to_string())
                }
            })?;

        let claims = data.claims;
        Ok(VerifiedCredential {
            user_id: claims.user_id,
            subtype: claims.typ,
            expires_at: expires_at(claims.exp),
        })
    }
}

fn expires_at(exp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(exp, 0).single().unwrap_or_default()
}
