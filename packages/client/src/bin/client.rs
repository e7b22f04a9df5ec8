//! Terminal chat client for the devlink chat hub with reconnection support.
//!
//! Joins one room and sends every line typed at the prompt as a chat message.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//! A rejected handshake (401 / 403 / 400) ends the client immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin devlink-client -- --room <room-uuid> --token <credential>
//! cargo run --bin devlink-client -- -u ws://127.0.0.1:8080 -r <room-uuid> -t <credential>
//! ```

use clap::Parser;
use devlink_client::{ClientOptions, run_client};
use devlink_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "devlink-client")]
#[command(about = "Terminal chat client for the devlink chat hub", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long)]
    room: String,

    /// Realtime credential (see `devlink-hub issue-token`)
    #[arg(short = 't', long, env = "DEVLINK_TOKEN", hide_env_values = true)]
    token: String,

    /// Hub base URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let options = ClientOptions {
        base_url: args.url,
        room_id: args.room,
        token: args.token,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
