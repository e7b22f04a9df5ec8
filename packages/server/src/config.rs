//! Server configuration.
//!
//! Values come from command-line flags, falling back to environment variables
//! (a `.env` file is loaded by the binary before parsing).

use std::time::Duration;

use clap::Args;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://devlink.db?mode=rwc";
pub const DEFAULT_REALTIME_SUBTYPE: &str = "ws";
pub const DEFAULT_TOKEN_COOKIE: &str = "ws_token";
pub const DEFAULT_TOKEN_QUERY: &str = "token";
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("jwt secret must not be empty")]
    EmptySecret,

    #[error("ping interval must be greater than zero")]
    ZeroPingInterval,

    #[error("idle timeout ({idle_timeout_secs}s) must be longer than the ping interval ({ping_interval_secs}s)")]
    IdleTimeoutTooShort {
        ping_interval_secs: u64,
        idle_timeout_secs: u64,
    },

    #[error("outbox capacity must be greater than zero")]
    ZeroOutboxCapacity,
}

/// Chat hub configuration
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "DEVLINK_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "DEVLINK_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Shared secret used to verify realtime credentials (HS256)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Credential subtype accepted on the realtime channel
    #[arg(long, env = "DEVLINK_REALTIME_SUBTYPE", default_value = DEFAULT_REALTIME_SUBTYPE)]
    pub realtime_subtype: String,

    /// Cookie carrying the credential (compatibility transport)
    #[arg(long, env = "DEVLINK_TOKEN_COOKIE", default_value = DEFAULT_TOKEN_COOKIE)]
    pub token_cookie: String,

    /// Query parameter carrying the credential
    #[arg(long, env = "DEVLINK_TOKEN_QUERY", default_value = DEFAULT_TOKEN_QUERY)]
    pub token_query: String,

    /// Seconds between liveness pings
    #[arg(long, env = "DEVLINK_PING_INTERVAL_SECS", default_value_t = DEFAULT_PING_INTERVAL_SECS)]
    pub ping_interval_secs: u64,

    /// Seconds of inbound silence before a session is closed
    #[arg(long, env = "DEVLINK_IDLE_TIMEOUT_SECS", default_value_t = DEFAULT_IDLE_TIMEOUT_SECS)]
    pub idle_timeout_secs: u64,

    /// Per-session outbound queue size; a full queue disconnects the session
    #[arg(long, env = "DEVLINK_OUTBOX_CAPACITY", default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    pub outbox_capacity: usize,
}

impl ServerConfig {
    /// Defaults for everything except the secret
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            realtime_subtype: DEFAULT_REALTIME_SUBTYPE.to_string(),
            token_cookie: DEFAULT_TOKEN_COOKIE.to_string(),
            token_query: DEFAULT_TOKEN_QUERY.to_string(),
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.ping_interval_secs == 0 {
            return Err(ConfigError::ZeroPingInterval);
        }
        if self.idle_timeout_secs <= self.ping_interval_secs {
            return Err(ConfigError::IdleTimeoutTooShort {
                ping_interval_secs: self.ping_interval_secs,
                idle_timeout_secs: self.idle_timeout_secs,
            });
        }
        if self.outbox_capacity == 0 {
            return Err(ConfigError::ZeroOutboxCapacity);
        }
        Ok(())
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}
