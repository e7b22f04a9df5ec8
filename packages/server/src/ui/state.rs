//! Server state shared by every handler and session.

use std::{sync::Arc, time::Duration};

use devlink_shared::time::Clock;
use tokio_util::task::TaskTracker;

use crate::{
    infrastructure::registry::{PresenceLedger, RoomRegistry},
    usecase::{
        AuthenticateHandshakeUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        NotifyTypingUseCase, SendMessageUseCase,
    },
};

/// Where the handshake looks for the credential
#[derive(Debug, Clone)]
pub struct CredentialSource {
    /// Query parameter name (canonical)
    pub query: String,
    /// Cookie name (compatibility)
    pub cookie: String,
}

/// Per-session runtime settings
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ping_interval: Duration,
    pub idle_timeout: Duration,
    pub outbox_capacity: usize,
}

/// Shared application state
pub struct AppState {
    pub authenticate_handshake_usecase: Arc<AuthenticateHandshakeUseCase>,
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    pub send_message_usecase: Arc<SendMessageUseCase>,
    pub notify_typing_usecase: Arc<NotifyTypingUseCase>,
    /// Read-only views for the debug endpoint and shutdown
    pub registry: Arc<RoomRegistry>,
    pub ledger: Arc<PresenceLedger>,
    pub credentials: CredentialSource,
    pub session_settings: SessionSettings,
    pub clock: Arc<dyn Clock>,
    /// Every running session task (drained on shutdown)
    pub session_tasks: TaskTracker,
}
