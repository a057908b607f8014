//! Shared tracing setup for binaries: stderr by default, or append to `LOG_FILE`.
//!
//! - **RUST_LOG**: filter, e.g. `info`, `supervisor=debug`. Default: `info`.
//! - **LOG_FILE**: when set, logs go to that file (no ANSI) instead of stderr.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("LOG_FILE has no file name: {0}")]
    InvalidLogFile(String),
    #[error("install subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber. Keep the returned guard alive for the whole process
/// so buffered file output is flushed on exit.
pub fn init(default_filter: &str) -> Result<Option<WorkerGuard>, InitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match std::env::var("LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let p = Path::new(&path);
            let file_name = p
                .file_name()
                .ok_or_else(|| InitError::InvalidLogFile(path.clone()))?;
            let dir = p.parent().filter(|d| !d.as_os_str().is_empty());
            let appender =
                tracing_appender::rolling::never(dir.unwrap_or_else(|| Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
            tracing::info!(path = %path, "logging to file");
            Ok(Some(guard))
        }
        _ => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(layer).try_init()?;
            Ok(None)
        }
    }
}
