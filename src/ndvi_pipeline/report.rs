//! Reporting module
//!
//! Figures for visual inspection of a strip and a JSON summary of the numbers
//! behind them.

pub mod colormap;
pub mod plots;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::ndvi_pipeline::clip::StripAlignment;
use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::strip::NdviTrend;

pub use plots::{
    plot_bands, plot_ndvi_histograms, plot_ndvi_trends, plot_ndvi_trends_water_mask,
    plot_scene_bands, plot_udm2_bands, plot_water_mask,
};

pub const REPORT_FILE_NAME: &str = "ndvi_report.json";

/// Everything an analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripReport {
    pub alignment: StripAlignment,
    pub convert_to_toa: bool,
    pub scene_count: usize,
    pub width: usize,
    pub height: usize,
    /// Pixels clear in every scene
    pub clean_pixels: usize,
    /// Trend with the configured water mask
    pub trend: NdviTrend,
    /// Trend under the strip mask only
    pub trend_without_water_mask: NdviTrend,
    pub figures: Vec<PathBuf>,
    pub ndvi_rasters: Vec<PathBuf>,
}

impl StripReport {
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| {
            AnalysisError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        info!("{} saved", path.display());
        Ok(())
    }
}

/// File name fragment for a percentile, `50` rather than `50.0`.
pub fn percentile_tag(percentile: f64) -> String {
    format!("blue{percentile}")
}
