//! Infrastructure layer for the chat hub.
//!
//! Concrete implementations of the collaborators defined by the domain layer.

pub mod auth;
pub mod dto;
pub mod message_pusher;
pub mod registry;
pub mod store;
