//! Logging setup utilities for the devlink hub binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The filter covers the calling crate, the binary and the shared libraries.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `crate_name` - The calling crate (pass `env!("CARGO_PKG_NAME")`)
/// * `binary_name` - The name of the binary (pass `env!("CARGO_BIN_NAME")`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use devlink_shared::logger::setup_logger;
///
/// setup_logger("devlink-hub", "devlink-hub", "debug");
/// ```
pub fn setup_logger(crate_name: &str, binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(crate_name, binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(crate_name: &str, binary_name: &str, default_log_level: &str) -> String {
    format!(
        "{}={level},{}={level},devlink_shared={level},tower_http={level}",
        crate_name.replace('-', "_"),
        binary_name.replace('-', "_"),
        level = default_log_level,
    )
}
