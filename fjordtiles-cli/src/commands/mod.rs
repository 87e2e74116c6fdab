//! CLI subcommand implementations.

pub mod cache;
pub mod download;
pub mod tile;
