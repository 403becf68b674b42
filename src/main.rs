//! NDVI trend analysis of a satellite scene strip.
//!
//! Usage:
//! ```
//! cargo run --release -- --data-dir data --figures-dir figures
//! cargo run --release -- --remove-first-image --water-mask-percentile 30
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use strip_ndvi_rs::logger;
use strip_ndvi_rs::ndvi_pipeline::{AnalysisConfig, NdviAnalysis, StripAlignment, TiffCompression};
use tracing::info;

#[derive(Parser)]
#[command(name = "strip_ndvi")]
#[command(about = "NDVI trends across the scenes of a satellite strip")]
#[command(version)]
struct Args {
    /// Directory holding the analytic, UDM2 and metadata files of every scene
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory receiving figures, NDVI rasters and the JSON report
    #[arg(long, default_value = "figures")]
    figures_dir: PathBuf,

    /// Blue-band percentile above which pixels are treated as water
    #[arg(long, default_value_t = 50.0, value_name = "PERCENT")]
    water_mask_percentile: f64,

    /// Drop scenes whose extent differs from the rest instead of clipping rows
    #[arg(long)]
    remove_first_image: bool,

    /// Skip per-scene band and UDM2 images
    #[arg(long)]
    skip_plot_images_masks: bool,

    /// Compute NDVI from raw counts instead of TOA reflectance
    #[arg(long)]
    no_toa: bool,

    /// Write each scene's NDVI raster as a float TIFF
    #[arg(long)]
    export_ndvi: bool,

    /// Compression for exported rasters (none, lzw, deflate-fast, deflate, deflate-best)
    #[arg(long, default_value = "none")]
    compression: TiffCompression,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);

    info!("Starting strip NDVI analysis...");

    let alignment = if args.remove_first_image {
        StripAlignment::DropMismatched
    } else {
        StripAlignment::ClipRows
    };
    let config = AnalysisConfig::builder()
        .water_mask_percentile(args.water_mask_percentile)
        .convert_to_toa(!args.no_toa)
        .alignment(alignment)
        .plot_scene_images(!args.skip_plot_images_masks)
        .export_ndvi(args.export_ndvi)
        .compression(args.compression)
        .build();
    let analysis = NdviAnalysis::new(config);

    info!("Alignment: {}", analysis.config().alignment);
    info!("Water mask percentile: {}", analysis.config().water_mask_percentile);
    info!(
        "TOA reflectance: {}",
        if analysis.config().convert_to_toa {
            "enabled"
        } else {
            "disabled"
        }
    );

    let report = analysis
        .run(&args.data_dir, &args.figures_dir)
        .with_context(|| format!("analysis of {} failed", args.data_dir.display()))?;

    for scene in &report.trend.scenes {
        info!(
            "{} {}: median NDVI {:.4} ± {:.4} over {} pixels",
            scene.name,
            scene.acquired.format("%Y-%m-%d"),
            scene.stats.median,
            scene.stats.std_dev,
            scene.stats.pixel_count
        );
    }
    info!(
        "Report written to {}",
        args.figures_dir.join(strip_ndvi_rs::ndvi_pipeline::report::REPORT_FILE_NAME).display()
    );

    Ok(())
}
