use std::io::Write;

use crate::ndvi_pipeline::common::error::Result;
use crate::ndvi_pipeline::scene::Raster;
use crate::ndvi_pipeline::tiff::types::TiffOptions;

pub trait RasterWriter {
    fn write_raster(&self, raster: &Raster<f64>, output: &mut dyn Write, options: &TiffOptions) -> Result<()>;
}
