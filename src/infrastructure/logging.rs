//! File-based tracing setup.
//!
//! The terminal belongs to the UI, so all log output goes to
//! `<log dir>/clubvote.log` through a non-blocking writer.

use std::fs;
use std::io;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::settings::Settings;

pub const LOG_FILE: &str = "clubvote.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not create log directory: {0}")]
    Io(#[from] io::Error),
    #[error("could not install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global subscriber.
///
/// The returned guard flushes buffered lines when dropped and must be held
/// until the process exits.
pub fn init(settings: &Settings) -> Result<WorkerGuard, LoggingError> {
    let directory = settings.log_directory();
    fs::create_dir_all(&directory)?;

    let appender = tracing_appender::rolling::never(&directory, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer),
        )
        .try_init()?;

    Ok(guard)
}
