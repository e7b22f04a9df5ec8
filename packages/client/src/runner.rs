//! Client execution logic with reconnection support.

use std::time::Duration;

use super::{
    domain::{room_url, should_attempt_reconnect},
    error::ClientError,
    session::run_client_session,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

/// Where and as whom to connect
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Hub base URL (`ws://host:port`)
    pub base_url: String,
    pub room_id: String,
    /// Realtime credential (sent as the `token` query parameter)
    pub token: String,
}

/// Run the chat client with reconnection logic
///
/// Returns once the user ends the session, or with the last error when the
/// hub rejects the handshake or every reconnection attempt fails.
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let url = room_url(&options.base_url, &options.room_id, &options.token);
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to join room {} at {} (attempt {}/{})",
            options.room_id,
            options.base_url,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("{}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!("Giving up after {} attempt(s)", reconnect_count);
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
