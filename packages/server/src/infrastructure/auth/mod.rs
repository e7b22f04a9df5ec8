//! 認証情報の検証

pub mod jwt;

pub use jwt::JwtCredentialVerifier;
