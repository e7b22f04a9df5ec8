//! Domain layer for the chat hub.
//!
//! This module contains types and collaborator interfaces that are
//! independent of the transport, the wire format and the persistent store.

pub mod entity;
pub mod error;
pub mod event;
pub mod repository;
pub mod value_object;

pub use entity::{ChatMessage, Outgoing, PusherChannel, Room, SessionHandle};
pub use error::{CredentialError, HandshakeError, PushError, StoreError, ValueObjectError};
pub use event::{HubEvent, InboundFrame};
pub use repository::{ChatStore, CredentialVerifier, MessagePusher, PublishReport, VerifiedCredential};
pub use value_object::{MessageContent, MessageId, RoomId, SessionId, UserId};

#[cfg(test)]
pub use repository::{MockChatStore, MockCredentialVerifier};
