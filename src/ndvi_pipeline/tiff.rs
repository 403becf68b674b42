//! TIFF export module
//!
//! Derived rasters (NDVI) are written back out as single-band float TIFFs.

mod writer;
mod standard_tiff_writer;
pub mod types;

pub use writer::RasterWriter;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{TiffCompression, TiffOptions};
