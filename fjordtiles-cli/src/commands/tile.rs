//! `fjordtiles tile` - resolve one tile, cache first.

use std::path::PathBuf;

use clap::Args;

use fjordtiles::config::ConfigFile;
use fjordtiles::coord::TileCoord;
use fjordtiles::service::TileService;
use fjordtiles::tile::TileImage;

use crate::error::CliError;

/// Arguments for the tile command.
#[derive(Debug, Args)]
pub struct TileArgs {
    /// Zoom level
    pub zoom: u8,

    /// Tile column (slippy x)
    pub x: u32,

    /// Tile row (slippy y)
    pub y: u32,

    /// Write the image bytes to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Run the tile command.
pub async fn run(args: TileArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let service = TileService::new(&config)?;

    let tile = TileCoord::new(args.x, args.y, args.zoom);
    match service.resolve_tile(&tile).await {
        TileImage::Ready(bytes) => {
            match &args.output {
                Some(path) => {
                    std::fs::write(path, &bytes)?;
                    println!("{tile}: {} bytes -> {}", bytes.len(), path.display());
                }
                None => println!("{tile}: {} bytes", bytes.len()),
            }
            Ok(())
        }
        TileImage::Unavailable => Err(CliError::Unavailable(tile.to_string())),
    }
}
