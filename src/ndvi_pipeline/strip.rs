//! A strip: scenes along one ground track, aligned to a common extent.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::ndvi_pipeline::clip::{align_scenes, StripAlignment};
use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::mask::{select, strip_clean_mask, water_mask, Mask};
use crate::ndvi_pipeline::ndvi::{delta_days, rate_of_change, SampleStats, SceneStats};
use crate::ndvi_pipeline::scene::{Scene, SpectralBand};

#[derive(Debug, Clone)]
pub struct Strip {
    scenes: Vec<Scene>,
    clean_mask: Mask,
}

/// NDVI trend across a strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviTrend {
    pub water_mask_percentile: f64,
    pub scenes: Vec<SceneStats>,
    /// Days between consecutive acquisitions
    pub delta_days: Vec<f64>,
    /// Median NDVI change per day between consecutive acquisitions
    pub rate_of_change: Vec<f64>,
}

impl NdviTrend {
    pub fn acquired(&self) -> Vec<DateTime<Utc>> {
        self.scenes.iter().map(|s| s.acquired).collect()
    }

    pub fn medians(&self) -> Vec<f64> {
        self.scenes.iter().map(|s| s.stats.median).collect()
    }
}

impl Strip {
    pub fn new(scenes: Vec<Scene>, alignment: StripAlignment) -> Result<Self> {
        let scenes = align_scenes(scenes, alignment)?;
        let clean_mask = strip_clean_mask(&scenes)?;
        Ok(Self { scenes, clean_mask })
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn clean_mask(&self) -> &Mask {
        &self.clean_mask
    }

    pub fn scene(&self, index: usize) -> Result<&Scene> {
        self.scenes.get(index).ok_or(AnalysisError::SceneIndexOutOfRange {
            index,
            len: self.scenes.len(),
        })
    }

    pub fn water_mask(&self, index: usize, percentile: f64) -> Result<Mask> {
        water_mask(self.scene(index)?.band(SpectralBand::Blue)?, percentile)
    }

    /// Strip clean mask intersected with the scene's water mask.
    pub fn scene_mask(&self, index: usize, percentile: f64) -> Result<Mask> {
        self.clean_mask.and(&self.water_mask(index, percentile)?)
    }

    /// NDVI pixels per scene, either masked or the whole raster.
    pub fn ndvi_samples(
        &self,
        apply_mask: bool,
        percentile: f64,
        convert_to_toa: bool,
    ) -> Result<Vec<Vec<f64>>> {
        (0..self.scenes.len())
            .map(|i| {
                let ndvi = self.scenes[i].ndvi(convert_to_toa)?;
                if apply_mask {
                    select(&ndvi, &self.scene_mask(i, percentile)?)
                } else {
                    Ok(ndvi.data)
                }
            })
            .collect()
    }

    pub fn ndvi_stats(&self, percentile: f64, convert_to_toa: bool) -> Result<Vec<SceneStats>> {
        let samples = self.ndvi_samples(true, percentile, convert_to_toa)?;
        Ok(self
            .scenes
            .iter()
            .zip(samples)
            .map(|(scene, sample)| {
                let stats = SampleStats::from_values(&sample);
                debug!(
                    scene = %scene.name,
                    pixels = stats.pixel_count,
                    median = stats.median,
                    std_dev = stats.std_dev,
                    "NDVI stats"
                );
                SceneStats {
                    name: scene.name.clone(),
                    acquired: scene.acquired,
                    stats,
                }
            })
            .collect())
    }

    pub fn trend(&self, percentile: f64, convert_to_toa: bool) -> Result<NdviTrend> {
        let scenes = self.ndvi_stats(percentile, convert_to_toa)?;
        let acquired: Vec<_> = scenes.iter().map(|s| s.acquired).collect();
        let medians: Vec<_> = scenes.iter().map(|s| s.stats.median).collect();
        let delta_days = delta_days(&acquired);
        let rate_of_change = rate_of_change(&medians, &delta_days);

        Ok(NdviTrend {
            water_mask_percentile: percentile,
            scenes,
            delta_days,
            rate_of_change,
        })
    }
}
