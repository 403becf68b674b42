//! Strip NDVI analysis module
//!
//! This module loads the scenes of a satellite strip, aligns them to a common
//! extent, masks artifacts and water, and reports NDVI statistics and trends,
//! with separate modules for scene loading, masking, statistics, figures and
//! orchestration.

pub mod analysis;
pub mod clip;
pub mod common;
pub mod config;
pub mod mask;
pub mod ndvi;
pub mod reflectance;
pub mod report;
pub mod scene;
pub mod strip;
pub mod tiff;

pub use common::{
    AnalysisError,
    Result,
};

pub use scene::{
    discover_scenes,
    MultibandRaster,
    Raster,
    RasterReader,
    Scene,
    SceneFiles,
    SpectralBand,
    TiffRasterReader,
    Udm2Band,
};

pub use tiff::{
    RasterWriter,
    StandardTiffWriter,
    TiffCompression,
    TiffOptions,
};

pub use clip::StripAlignment;
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use mask::Mask;
pub use report::StripReport;
pub use strip::{NdviTrend, Strip};

pub use analysis::NdviAnalysis;
