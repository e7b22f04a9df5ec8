//! Real-time chat hub server.
//!
//! Run with:
//! ```not_rust
//! JWT_SECRET=dev cargo run --bin devlink-hub
//! JWT_SECRET=dev cargo run --bin devlink-hub -- --host 0.0.0.0 --port 3000
//! JWT_SECRET=dev cargo run --bin devlink-hub -- create-room --participant <uuid> --participant <uuid>
//! JWT_SECRET=dev cargo run --bin devlink-hub -- issue-token --user-id <uuid>
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use devlink_hub::{
    config::ServerConfig,
    domain::UserId,
    infrastructure::{auth::JwtCredentialVerifier, store::SqliteChatStore},
    ui::Server,
};
use devlink_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "devlink-hub")]
#[command(about = "Real-time chat hub (room-scoped WebSocket sessions)", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the chat hub (default)
    Serve,
    /// Print a realtime credential for a user
    IssueToken {
        #[arg(long)]
        user_id: String,
        /// Lifetime of the credential in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: i64,
    },
    /// Create a two-participant room in the configured store
    CreateRoom {
        #[arg(long = "participant", num_args = 1, required = true)]
        participants: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logger(env!("CARGO_PKG_NAME"), env!("CARGO_BIN_NAME"), "info");

    let cli = Cli::parse();
    cli.config.validate()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.config).await,
        Command::IssueToken { user_id, ttl_secs } => {
            let user_id = UserId::parse(&user_id)?;
            let verifier = JwtCredentialVerifier::new(&cli.config.jwt_secret);
            let token = verifier.issue(
                &user_id.to_string(),
                &cli.config.realtime_subtype,
                ttl_secs,
            )?;
            println!("{token}");
            Ok(())
        }
        Command::CreateRoom { participants } => {
            let [first, second] = participants.as_slice() else {
                anyhow::bail!("a room needs exactly two participants");
            };
            let participants = [UserId::parse(first)?, UserId::parse(second)?];
            let store = SqliteChatStore::connect(&cli.config.database_url).await?;
            let room = store.create_room(participants, SystemClock.now()).await?;
            println!("{}", room.id);
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize dependencies in order:
    // 1. Store
    // 2. Credential verifier
    // 3. Server (registries, MessagePusher, UseCases)

    // 1. Store
    let store = SqliteChatStore::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    // 2. Credential verifier
    let verifier = JwtCredentialVerifier::new(&config.jwt_secret);

    // 3. Create and run the server
    let server = Server::new(
        &config,
        Arc::new(store),
        Arc::new(verifier),
        Arc::new(SystemClock),
    );
    server.run(&config.host, config.port).await?;
    Ok(())
}
