//! Real-time chat hub.
//!
//! Room-scoped WebSocket sessions with reference-counted presence, per-room
//! broadcast fan-out and persist-then-broadcast chat messages.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
