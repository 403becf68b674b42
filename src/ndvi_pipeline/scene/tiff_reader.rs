//! Multiband raster reader built on the `tiff` crate.
//!
//! Analytic scenes and usable data masks are delivered as pixel-interleaved
//! multi-sample TIFFs.
//! Every sample is widened to `f64` so downstream arithmetic is uniform across
//! 8-bit masks and 16-bit radiance counts.

use std::io::Cursor;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::ColorType;
use tracing::debug;

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::scene::reader::RasterReader;
use crate::ndvi_pipeline::scene::types::{MultibandRaster, Raster};

pub struct TiffRasterReader;

impl RasterReader for TiffRasterReader {
    fn read_raster(&self, data: &[u8]) -> Result<MultibandRaster> {
        debug!("Decoding TIFF raster, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))?.with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()?;
        let (width, height) = (width as usize, height as usize);
        let samples = samples_per_pixel(decoder.colortype()?)?;

        debug!(width, height, samples, "TIFF header");

        let values = widen(decoder.read_image()?)?;
        let pixels = width * height;
        if values.len() != pixels * samples {
            return Err(AnalysisError::DecodeError(format!(
                "expected {} samples for {}x{}x{}, got {}",
                pixels * samples,
                width,
                height,
                samples,
                values.len()
            )));
        }

        let bands = (0..samples)
            .map(|band| Raster {
                width,
                height,
                data: values.iter().skip(band).step_by(samples).copied().collect(),
            })
            .collect();

        Ok(MultibandRaster { width, height, bands })
    }
}

fn samples_per_pixel(colortype: ColorType) -> Result<usize> {
    let samples = match colortype {
        ColorType::Gray(_) => 1,
        ColorType::GrayA(_) => 2,
        ColorType::RGB(_) => 3,
        ColorType::RGBA(_) | ColorType::CMYK(_) => 4,
        ColorType::Multiband { num_samples, .. } => usize::from(num_samples),
        other => {
            return Err(AnalysisError::DecodeError(format!(
                "unsupported color type {other:?}"
            )));
        }
    };
    Ok(samples)
}

fn widen(result: DecodingResult) -> Result<Vec<f64>> {
    let values = match result {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
        #[allow(unreachable_patterns)]
        _ => {
            return Err(AnalysisError::DecodeError(
                "unsupported sample format".to_string(),
            ));
        }
    };
    Ok(values)
}
