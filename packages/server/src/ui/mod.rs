//! WebSocket chat hub server.

mod handler;
mod server;
mod session;
mod signal;
pub mod state;

pub use server::Server;
