use std::io::Write;

use tracing::debug;

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::scene::Raster;
use crate::ndvi_pipeline::tiff::types::{TiffCompression, TiffOptions};
use crate::ndvi_pipeline::tiff::writer::RasterWriter;

pub struct StandardTiffWriter;

impl RasterWriter for StandardTiffWriter {
    fn write_raster(&self, raster: &Raster<f64>, output: &mut dyn Write, options: &TiffOptions) -> Result<()> {
        debug!("Encoding TIFF raster: {}x{}", raster.width, raster.height);

        if raster.width == 0 || raster.height == 0 {
            return Err(AnalysisError::InvalidDimensions(raster.width, raster.height));
        }

        let mut buffer = Vec::new();

        let compression = match options.compression {
            TiffCompression::None => tiff::encoder::Compression::Uncompressed,
            TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
            TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
            TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
        };

        let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
            .map_err(|e| AnalysisError::EncodeError(e.to_string()))?
            .with_compression(compression);

        let samples: Vec<f32> = raster.data.iter().map(|&v| v as f32).collect();
        encoder
            .write_image::<tiff::encoder::colortype::Gray32Float>(
                raster.width as u32,
                raster.height as u32,
                &samples,
            )
            .map_err(|e| AnalysisError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
