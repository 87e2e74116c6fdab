//! FjordTiles CLI - provision and inspect the offline tile cache.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::download::DownloadArgs;
use commands::tile::TileArgs;

#[derive(Debug, Parser)]
#[command(
    name = "fjordtiles",
    version,
    about = "Offline map tiles for salmon-farm field work"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download every tile covering an area, for use offline
    Download(DownloadArgs),
    /// Inspect or empty the tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Resolve a single tile and optionally write it to a file
    Tile(TileArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logging = match fjordtiles::logging::init_logging(
        fjordtiles::logging::default_log_dir(),
        fjordtiles::logging::default_log_file(),
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: file logging disabled: {e}");
            None
        }
    };

    let result = match cli.command {
        Command::Download(args) => commands::download::run(args).await,
        Command::Cache { action } => commands::cache::run(action).await,
        Command::Tile(args) => commands::tile::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
