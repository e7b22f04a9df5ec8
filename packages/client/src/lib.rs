//! Terminal chat client for the devlink chat hub.
//!
//! Joins one room over WebSocket, prints presence / typing / message events
//! and sends each line typed on stdin as a chat message.

mod domain;
mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use runner::{ClientOptions, run_client};
