//! Network side of the tile pipeline.
//!
//! [`HttpFetch`] is the injected GET capability, [`ReqwestFetcher`] its
//! production implementation, and [`TileServer`] turns tile addresses
//! into sharded URLs.

mod http;
mod server;
mod types;

pub use http::{HttpFetch, ReqwestFetcher};
pub use server::{TileServer, DEFAULT_SHARDS, DEFAULT_URL_TEMPLATE};
pub use types::FetchError;

#[cfg(test)]
pub use http::tests::MockFetcher;
