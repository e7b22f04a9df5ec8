//! Per-session runtime.
//!
//! One admitted WebSocket runs three concurrent loops:
//!
//! - writer: drains the session outbox into the socket (events and pings)
//! - probe: enqueues a ping every `ping_interval` and closes the session after
//!   `idle_timeout` without inbound activity
//! - reader (this task): decodes inbound frames and dispatches them
//!
//! All three stop on the session's cancellation token, including a writer that
//! is blocked on a peer which stopped reading. The reader then runs the
//! exactly-once teardown and reaps the other two within a bounded time.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::ws::{Message, WebSocket},
};
use devlink_shared::time::Clock;
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use parking_lot::Mutex;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    domain::{InboundFrame, Outgoing, SessionHandle},
    infrastructure::dto::conversion::decode_inbound,
    ui::state::{AppState, SessionSettings},
    usecase::{AdmittedIdentity, SendMessageError},
};

/// Upper bound for flushing the Close frame to the peer
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);
/// Upper bound for the writer and probe to stop after teardown
const REAP_TIMEOUT: Duration = Duration::from_secs(2);

/// Time of the last inbound frame of any kind
type Activity = Arc<Mutex<Instant>>;

pub async fn run_session(socket: WebSocket, state: Arc<AppState>, identity: AdmittedIdentity) {
    let settings = state.session_settings;
    let (tx, rx) = mpsc::channel(settings.outbox_capacity);
    let session = SessionHandle::new(identity.user_id, identity.room_id, state.clock.now(), tx);
    let (sink, stream) = socket.split();
    let activity: Activity = Arc::new(Mutex::new(Instant::now()));

    let writer = spawn_writer(session.clone(), rx, sink);
    state.connect_participant_usecase.execute(&session);
    let probe = spawn_probe(session.clone(), settings, activity.clone());

    read_loop(&state, &session, stream, &activity).await;

    state.disconnect_participant_usecase.execute(&session).await;
    for mut task in [writer, probe] {
        match tokio::time::timeout(REAP_TIMEOUT, &mut task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(session_id = %session.id, "Session task failed: {}", e);
            }
            Err(_) => {
                tracing::warn!(session_id = %session.id, "Session task did not stop, aborting");
                task.abort();
            }
        }
    }
}

async fn read_loop(
    state: &AppState,
    session: &SessionHandle,
    mut stream: SplitStream<WebSocket>,
    activity: &Activity,
) {
    let shutdown = session.shutdown_token();
    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = stream.next() => frame,
        };
        let message = match frame {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::debug!(session_id = %session.id, "WebSocket read error: {}", e);
                break;
            }
            None => break,
        };
        *activity.lock() = Instant::now();

        match message {
            Message::Text(text) => dispatch(state, session, decode_inbound(text.as_str())).await,
            Message::Binary(_) => {
                tracing::debug!(session_id = %session.id, "Ignoring binary frame");
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                tracing::debug!(session_id = %session.id, "Client requested close");
                break;
            }
        }
    }
}

async fn dispatch(state: &AppState, session: &SessionHandle, frame: InboundFrame) {
    match frame {
        InboundFrame::Typing { is_typing } => {
            state.notify_typing_usecase.execute(session, is_typing);
        }
        InboundFrame::Message { content } => {
            match state.send_message_usecase.execute(session, &content).await {
                Ok(_) => {}
                Err(SendMessageError::Persistence(e)) => {
                    tracing::error!(
                        session_id = %session.id,
                        room_id = %session.room_id,
                        "Message not persisted, broadcast suppressed: {}",
                        e
                    );
                }
                Err(e) => {
                    tracing::warn!(session_id = %session.id, "Message rejected: {}", e);
                }
            }
        }
        InboundFrame::Unrecognized => {
            tracing::debug!(session_id = %session.id, "Ignoring unrecognized frame");
        }
    }
}

fn spawn_writer(
    session: SessionHandle,
    mut rx: mpsc::Receiver<Outgoing>,
    mut sink: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let shutdown = session.shutdown_token();
        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                item = rx.recv() => item,
            };
            let message = match item {
                Some(Outgoing::Event(text)) => Message::Text(text.to_string().into()),
                Some(Outgoing::Ping) => Message::Ping(Bytes::new()),
                None => break,
            };
            let sent = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                sent = sink.send(message) => sent,
            };
            if let Err(e) = sent {
                tracing::debug!(session_id = %session.id, "WebSocket write error: {}", e);
                session.force_close();
                break;
            }
        }

        // 読まない相手に対しても Close の送信で止まらない
        let closing = async {
            sink.send(Message::Close(None)).await.ok();
            sink.close().await.ok();
        };
        if tokio::time::timeout(CLOSE_TIMEOUT, closing).await.is_err() {
            tracing::debug!(session_id = %session.id, "Close frame not flushed in time");
        }
    })
}

fn spawn_probe(
    session: SessionHandle,
    settings: SessionSettings,
    activity: Activity,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let shutdown = session.shutdown_token();
        let mut ticker = tokio::time::interval_at(
            Instant::now() + settings.ping_interval,
            settings.ping_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let idle = activity.lock().elapsed();
            if idle >= settings.idle_timeout {
                tracing::info!(
                    session_id = %session.id,
                    user_id = %session.user_id,
                    idle_secs = idle.as_secs(),
                    "Liveness timeout"
                );
                session.force_close();
                break;
            }
            if session.probe().is_err() {
                session.force_close();
                break;
            }
        }
    })
}
