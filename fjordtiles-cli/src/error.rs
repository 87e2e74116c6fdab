//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the terminal with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command-line arguments.
    #[error("{0}")]
    InvalidArgs(String),

    /// Configuration file problem.
    #[error(transparent)]
    Config(#[from] fjordtiles::config::ConfigError),

    /// The tile pipeline could not be built.
    #[error(transparent)]
    Service(#[from] fjordtiles::service::ServiceError),

    /// Tile store operation failed.
    #[error(transparent)]
    Store(#[from] fjordtiles::store::StoreError),

    /// The requested tile could not be produced from cache or network.
    #[error("tile {0} is unavailable (offline and not cached?)")]
    Unavailable(String),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output failed to serialize.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The Ctrl-C handler could not be installed.
    #[error("failed to install Ctrl-C handler: {0}")]
    Ctrlc(#[from] ctrlc::Error),
}
