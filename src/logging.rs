//! Logging configuration using the tracing ecosystem.
//!
//! Output goes to a daily-rotated file so it never draws over the terminal
//! UI.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if neither `RUST_LOG` nor the config sets one.
const DEFAULT_LOG_FILTER: &str = "typeahead=info,warn";

/// Initialize the logging system.
///
/// The filter comes from `RUST_LOG`, then `configured`, then
/// [`DEFAULT_LOG_FILTER`].
///
/// Logs are stored under the platform local data directory, e.g.
/// `~/.local/share/typeahead/logs/` on Linux.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the global
/// subscriber is already set.
pub fn init(configured: Option<&str>) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "typeahead.log");

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(build_filter(configured));

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "typeahead starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

fn build_filter(configured: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("typeahead").join("logs"))
}

/// Get the path where logs are stored.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

/// Log shutdown.
pub fn shutdown() {
    tracing::info!("typeahead shutting down");
}
