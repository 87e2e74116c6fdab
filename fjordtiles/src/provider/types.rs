//! Provider error types.

use thiserror::Error;

/// Errors from fetching a tile over the network.
///
/// The resolver treats every variant the same way: the tile is
/// unavailable from the network. The distinction exists for logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not complete (offline, timeout, DNS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
