use crate::ndvi_pipeline::common::error::Result;
use crate::ndvi_pipeline::scene::types::MultibandRaster;

pub trait RasterReader {
    fn read_raster(&self, data: &[u8]) -> Result<MultibandRaster>;
}
