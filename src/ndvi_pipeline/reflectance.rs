//! Top-of-atmosphere reflectance conversion.

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::scene::{Raster, Scene, SpectralBand};

/// Scales raw counts by a per-band calibration coefficient.
pub fn to_toa_reflectance(band: &Raster<f64>, coefficient: f64) -> Raster<f64> {
    band.map(|v| v * coefficient)
}

impl Scene {
    pub fn toa_reflectance(&self, band: SpectralBand) -> Result<Raster<f64>> {
        let coefficient = self
            .coefficients
            .get(band.number())
            .ok_or(AnalysisError::MissingCoefficient(band.number()))?;
        Ok(to_toa_reflectance(self.band(band)?, coefficient))
    }
}
