//! `fjordtiles cache` - cache inspection and maintenance.

use clap::Subcommand;

use fjordtiles::config::ConfigFile;
use fjordtiles::service::TileService;

use crate::error::CliError;

/// Cache subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show how full the tile cache is
    Stats {
        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Remove every cached tile
    Clear,
}

/// Run a cache subcommand.
pub async fn run(action: CacheAction) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let service = TileService::new(&config)?;

    match action {
        CacheAction::Stats { json } => {
            let stats = service.stats().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Tile cache: {}", config.cache.directory.display());
                println!("  {stats}");
            }
            Ok(())
        }
        CacheAction::Clear => {
            service.clear().await?;
            println!("Tile cache cleared");
            Ok(())
        }
    }
}
