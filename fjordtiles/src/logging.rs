//! Logging setup.
//!
//! Structured `tracing` output on two sinks: a compact ANSI stream on
//! stdout for the terminal, and a plain non-blocking file under the log
//! directory for after-the-fact debugging on a device that was offline
//! at sea. Filtering follows `RUST_LOG`, defaulting to `info`.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the file writer alive.
///
/// Dropping this guard flushes and closes the log file, so hold it for
/// the lifetime of the process.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global tracing subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for the log file, created if needed
/// * `log_file` - Log filename within `log_dir`
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init_logging(log_dir: &str, log_file: &str) -> Result<LoggingGuard, io::Error> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Default log directory.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "fjordtiles.log"
}
