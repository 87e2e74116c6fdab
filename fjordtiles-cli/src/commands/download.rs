//! `fjordtiles download` - provision an area for offline use.

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::info;

use fjordtiles::config::ConfigFile;
use fjordtiles::coord::{tile_nw_corner, TileCoord, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
use fjordtiles::prefetch::{enumerate_tiles, tile_rect, AreaBounds};
use fjordtiles::service::TileService;

use crate::error::CliError;

/// Arguments for the download command.
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Northern edge of the area, degrees latitude
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,

    /// Southern edge of the area, degrees latitude
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    /// Eastern edge of the area, degrees longitude
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    /// Western edge of the area, degrees longitude
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,

    /// Lowest zoom level to download
    #[arg(long, default_value_t = 10)]
    pub min_zoom: u8,

    /// Highest zoom level to download
    #[arg(long, default_value_t = 14)]
    pub max_zoom: u8,
}

fn validate(args: &DownloadArgs) -> Result<AreaBounds, CliError> {
    if !(MIN_LAT..=MAX_LAT).contains(&args.south) || !(MIN_LAT..=MAX_LAT).contains(&args.north) {
        return Err(CliError::InvalidArgs(format!(
            "latitudes must be within {MIN_LAT}..{MAX_LAT}"
        )));
    }
    if !(MIN_LON..=MAX_LON).contains(&args.west) || !(MIN_LON..=MAX_LON).contains(&args.east) {
        return Err(CliError::InvalidArgs(format!(
            "longitudes must be within {MIN_LON}..{MAX_LON}"
        )));
    }
    if args.north <= args.south {
        return Err(CliError::InvalidArgs(
            "--north must be greater than --south".to_string(),
        ));
    }
    if args.east <= args.west {
        return Err(CliError::InvalidArgs(
            "--east must be greater than --west".to_string(),
        ));
    }
    if args.min_zoom > args.max_zoom {
        return Err(CliError::InvalidArgs(
            "--min-zoom must not exceed --max-zoom".to_string(),
        ));
    }
    if args.max_zoom > 19 {
        return Err(CliError::InvalidArgs(
            "--max-zoom must be 19 or lower".to_string(),
        ));
    }
    Ok(AreaBounds::new(args.north, args.south, args.east, args.west))
}

/// Run the download command.
pub async fn run(args: DownloadArgs) -> Result<(), CliError> {
    let bounds = validate(&args)?;
    let config = ConfigFile::load()?;
    let service = TileService::new(&config)?;

    let total = enumerate_tiles(bounds, args.min_zoom, args.max_zoom).len() as u64;
    let rect = tile_rect(bounds, args.min_zoom);
    let (snap_lat, snap_lon) = tile_nw_corner(&TileCoord::new(
        rect.min_col,
        rect.min_row,
        args.min_zoom,
    ));

    println!(
        "Downloading {total} tiles, zoom {}-{} (grid corner {snap_lat:.4}N {snap_lon:.4}E)",
        args.min_zoom, args.max_zoom
    );

    let cancel = CancellationToken::new();
    let ctrlc_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nstopping after the current tile...");
        ctrlc_token.cancel();
    })?;

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} ({eta})")
            .map_err(|e| CliError::InvalidArgs(format!("bad progress template: {e}")))?,
    );

    let report = service
        .provision(bounds, args.min_zoom, args.max_zoom, &cancel, |done, _| {
            bar.set_position(done);
        })
        .await;
    bar.finish_and_clear();

    info!(?report, "download finished");
    if cancel.is_cancelled() {
        println!(
            "Cancelled: {} of {} tiles downloaded ({} failed); progress is kept",
            report.attempted, report.total, report.failed
        );
    } else {
        println!(
            "Done: {} tiles ({} ok, {} failed)",
            report.attempted, report.succeeded, report.failed
        );
    }

    let stats = service.stats().await;
    println!("{stats}");
    Ok(())
}
