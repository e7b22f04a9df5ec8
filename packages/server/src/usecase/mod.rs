//! UseCase layer for the chat hub.
//!
//! Each use case owns one step of the session lifecycle and depends only on
//! the domain collaborators (and the shared registries).

pub mod authenticate_handshake;
pub mod connect_participant;
pub mod disconnect_participant;
pub mod error;
pub mod notify_typing;
pub mod send_message;

pub use authenticate_handshake::{AdmittedIdentity, AuthenticateHandshakeUseCase};
pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::{DisconnectParticipantUseCase, Teardown};
pub use error::SendMessageError;
pub use notify_typing::NotifyTypingUseCase;
pub use send_message::SendMessageUseCase;
