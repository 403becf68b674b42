use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Missing scene file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Not an analytic scene file: {0}")]
    InvalidSceneName(String),

    #[error("No scenes found in {}", .0.display())]
    EmptyStrip(PathBuf),

    #[error("Failed to decode raster: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Raster extents differ: {0}x{1} vs {2}x{3}")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("Raster has {found} bands, expected at least {expected}")]
    MissingBand { expected: usize, found: usize },

    #[error("Scene index {index} out of range for a strip of {len}")]
    SceneIndexOutOfRange { index: usize, len: usize },

    #[error("No reflectance coefficient for band {0}")]
    MissingCoefficient(u8),

    #[error("Invalid metadata: {0}")]
    MetadataError(String),

    #[error("Percentile must be within [0, 100], got {0}")]
    InvalidPercentile(f64),

    #[error("Failed to render plot: {0}")]
    PlotError(String),

    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    #[error("XML error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Timestamp error: {0}")]
    TimestampError(#[from] chrono::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
