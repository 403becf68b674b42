//! Pixel masks. `true` marks a retained pixel.

use tracing::{debug, warn};

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::scene::{Raster, Scene, Udm2Band};

pub type Mask = Raster<bool>;

impl Raster<bool> {
    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.ensure_same_extent(other)?;
        Ok(Raster {
            width: self.width,
            height: self.height,
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| a && b).collect(),
        })
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

/// Pixels flagged clear in the usable data mask of every scene.
pub fn strip_clean_mask(scenes: &[Scene]) -> Result<Mask> {
    let (first, rest) = scenes
        .split_first()
        .ok_or_else(|| AnalysisError::EmptyStrip(Default::default()))?;

    let mut mask = first.udm2_band(Udm2Band::Clear)?.map(|v| v != 0.0);
    for scene in rest {
        let clear = scene.udm2_band(Udm2Band::Clear)?.map(|v| v != 0.0);
        mask = mask.and(&clear)?;
    }

    debug!(
        retained = mask.count(),
        total = mask.len(),
        "Strip clean mask"
    );
    Ok(mask)
}

/// Percentile of the finite values with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], p: f64) -> Result<Option<f64>> {
    if !(0.0..=100.0).contains(&p) {
        return Err(AnalysisError::InvalidPercentile(p));
    }

    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Ok(None);
    }
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac))
}

/// Retains pixels whose value is at or below the `p`-th percentile of the band.
pub fn water_mask(blue: &Raster<f64>, p: f64) -> Result<Mask> {
    let Some(threshold) = percentile(&blue.data, p)? else {
        warn!("Blue band has no finite pixels, water mask retains nothing");
        return Ok(Raster::filled(blue.width, blue.height, false));
    };

    debug!(percentile = p, threshold, "Water mask threshold");
    Ok(blue.map(|v| v.is_finite() && v <= threshold))
}

/// The retained values of `values`, in row-major order.
pub fn select(values: &Raster<f64>, mask: &Mask) -> Result<Vec<f64>> {
    values.ensure_same_extent(mask)?;
    Ok(values
        .data
        .iter()
        .zip(&mask.data)
        .filter_map(|(&v, &keep)| keep.then_some(v))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndvi_pipeline::scene::{MultibandRaster, ReflectanceCoefficients};
    use chrono::Utc;

    fn scene_with_clear(clear: Vec<f64>) -> Scene {
        let width = clear.len();
        let analytic = MultibandRaster {
            width,
            height: 1,
            bands: vec![Raster::filled(width, 1, 1.0); 4],
        };
        let udm2 = MultibandRaster {
            width,
            height: 1,
            bands: vec![Raster::new(width, 1, clear).unwrap()],
        };
        Scene::from_parts("s".into(), Utc::now(), analytic, udm2, ReflectanceCoefficients::default())
            .unwrap()
    }

    #[test]
    fn clean_mask_is_intersection_of_clear_bands() {
        let scenes = vec![
            scene_with_clear(vec![1.0, 1.0, 0.0, 1.0]),
            scene_with_clear(vec![1.0, 0.0, 1.0, 1.0]),
        ];
        let mask = strip_clean_mask(&scenes).unwrap();
        assert_eq!(mask.data, vec![true, false, false, true]);
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn clean_mask_rejects_mismatched_scenes() {
        let scenes = vec![scene_with_clear(vec![1.0, 1.0]), scene_with_clear(vec![1.0])];
        assert!(matches!(
            strip_clean_mask(&scenes),
            Err(AnalysisError::DimensionMismatch(..))
        ));
    }

    #[test]
    fn clean_mask_of_empty_strip_fails() {
        assert!(matches!(strip_clean_mask(&[]), Err(AnalysisError::EmptyStrip(_))));
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 50.0).unwrap(), Some(2.5));
        assert_eq!(percentile(&values, 0.0).unwrap(), Some(1.0));
        assert_eq!(percentile(&values, 100.0).unwrap(), Some(4.0));
        assert_eq!(percentile(&[4.0, f64::NAN, 1.0, 3.0, 2.0], 25.0).unwrap(), Some(1.75));
    }

    #[test]
    fn percentile_bounds_are_checked() {
        assert!(matches!(percentile(&[1.0], 101.0), Err(AnalysisError::InvalidPercentile(_))));
        assert!(matches!(percentile(&[1.0], -1.0), Err(AnalysisError::InvalidPercentile(_))));
        assert_eq!(percentile(&[f64::NAN], 50.0).unwrap(), None);
    }

    #[test]
    fn water_mask_drops_bright_blue_pixels() {
        let blue = Raster::new(5, 1, vec![10.0, 50.0, 20.0, 40.0, 30.0]).unwrap();
        let mask = water_mask(&blue, 50.0).unwrap();
        assert_eq!(mask.data, vec![true, false, true, false, true]);
    }

    #[test]
    fn full_percentile_keeps_every_finite_pixel() {
        let blue = Raster::new(3, 1, vec![10.0, f64::NAN, 99.0]).unwrap();
        let mask = water_mask(&blue, 100.0).unwrap();
        assert_eq!(mask.data, vec![true, false, true]);
    }

    #[test]
    fn select_keeps_masked_values_in_order() {
        let values = Raster::new(3, 1, vec![0.1, 0.2, 0.3]).unwrap();
        let mask = Raster::new(3, 1, vec![true, false, true]).unwrap();
        assert_eq!(select(&values, &mask).unwrap(), vec![0.1, 0.3]);
    }
}
