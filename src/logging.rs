//! Log setup.
//!
//! The terminal belongs to the UI, so logs go to a file through a
//! non-blocking writer.  `RUST_LOG` overrides the default level.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE: &str = "earthview.log";

/// Keeps the background writer alive; logs are flushed when it drops.
pub struct LoggerGuard(#[allow(dead_code)] WorkerGuard);

/// Default log directory: `<tmp>/earthview`.
pub fn default_log_dir() -> PathBuf {
    std::env::temp_dir().join("earthview")
}

pub fn init_logging(log_dir: impl AsRef<Path>, level: &str) -> Result<LoggerGuard> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(LoggerGuard(guard))
}
