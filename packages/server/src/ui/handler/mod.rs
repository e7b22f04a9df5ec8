//! Request handlers.

mod http;
mod websocket;

pub use http::{debug_room_presence, health_check};
pub use websocket::websocket_handler;
