//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The hub refused the handshake (bad credential, not a participant, bad room)
    #[error("Handshake rejected with HTTP {0}")]
    Rejected(u16),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
