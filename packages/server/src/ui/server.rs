//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use devlink_shared::time::Clock;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    domain::{ChatStore, CredentialVerifier, MessagePusher},
    infrastructure::{
        message_pusher::BroadcastBus,
        registry::{PresenceLedger, RoomRegistry},
    },
    usecase::{
        AuthenticateHandshakeUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
        NotifyTypingUseCase, SendMessageUseCase,
    },
};

use super::{
    handler::{debug_room_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::{AppState, CredentialSource, SessionSettings},
};

/// Upper bound for session teardowns to finish after the shutdown signal
const SHUTDOWN_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// WebSocket chat hub
///
/// Owns the Room Registry and Presence Ledger and wires every use case around
/// them and the injected collaborators.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(&config, store, verifier, Arc::new(SystemClock));
/// server.run(&config.host, config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(
        config: &ServerConfig,
        store: Arc<dyn ChatStore>,
        verifier: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // 1. Shared registries
        let registry = Arc::new(RoomRegistry::new());
        let ledger = Arc::new(PresenceLedger::new());

        // 2. MessagePusher
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(BroadcastBus::new(registry.clone()));

        // 3. UseCases
        let authenticate_handshake_usecase = Arc::new(AuthenticateHandshakeUseCase::new(
            verifier,
            store.clone(),
            config.realtime_subtype.clone(),
        ));
        let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
            registry.clone(),
            ledger.clone(),
            message_pusher.clone(),
        ));
        let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
            registry.clone(),
            ledger.clone(),
            store.clone(),
            message_pusher.clone(),
            clock.clone(),
        ));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            store,
            message_pusher.clone(),
            clock.clone(),
        ));
        let notify_typing_usecase = Arc::new(NotifyTypingUseCase::new(message_pusher));

        // 4. AppState
        let state = Arc::new(AppState {
            authenticate_handshake_usecase,
            connect_participant_usecase,
            disconnect_participant_usecase,
            send_message_usecase,
            notify_typing_usecase,
            registry,
            ledger,
            credentials: CredentialSource {
                query: config.token_query.clone(),
                cookie: config.token_cookie.clone(),
            },
            session_settings: SessionSettings {
                ping_interval: config.ping_interval(),
                idle_timeout: config.idle_timeout(),
                outbox_capacity: config.outbox_capacity,
            },
            clock,
            session_tasks: TaskTracker::new(),
        });

        Self { state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws/chat/{room_id}", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/rooms/{room_id}", get(debug_room_presence))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub fn registry(&self) -> Arc<RoomRegistry> {
        self.state.registry.clone()
    }

    pub fn ledger(&self) -> Arc<PresenceLedger> {
        self.state.ledger.clone()
    }

    /// Tracker of the running session tasks
    pub fn session_tasks(&self) -> TaskTracker {
        self.state.session_tasks.clone()
    }

    /// Bind to `host:port` and serve until Ctrl+C / SIGTERM
    pub async fn run(self, host: &str, port: u16) -> std::io::Result<()> {
        let listener = TcpListener::bind((host, port)).await?;
        tracing::info!("Chat hub listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/chat/{{room_id}}?token=...", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// On shutdown every live session is force-closed, and `serve` returns only
    /// after their teardowns finished (bounded by `SHUTDOWN_DRAIN_TIMEOUT`).
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let registry = self.state.registry.clone();
        let registry_after = self.state.registry.clone();
        let session_tasks = self.state.session_tasks.clone();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                let sessions = registry.all_sessions();
                tracing::info!(
                    "Closing {} live session(s) across {} room(s)",
                    sessions.len(),
                    registry.room_count()
                );
                for session in sessions {
                    session.force_close();
                }
            })
            .await?;

        // Upgraded connections are not tracked by axum::serve.
        // Sessions admitted after the snapshot above are closed here.
        for session in registry_after.all_sessions() {
            session.force_close();
        }
        session_tasks.close();
        if tokio::time::timeout(SHUTDOWN_DRAIN_TIMEOUT, session_tasks.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                "{} session(s) still running after {:?}",
                session_tasks.len(),
                SHUTDOWN_DRAIN_TIMEOUT
            );
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
