//! NDVI computation and sample statistics.
//!
//! `NDVI = (NIR - red) / (NIR + red)`. Larger values mean greener vegetation;
//! bare soil sits near 0.1-0.2 and water goes negative.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ndvi_pipeline::common::error::Result;
use crate::ndvi_pipeline::scene::{Raster, Scene, SpectralBand};

const SECONDS_PER_DAY: f64 = 60.0 * 60.0 * 24.0;

/// `(a - b) / (a + b)` per pixel. Zero sums and non-finite inputs give NaN.
pub fn normalized_difference(a: &Raster<f64>, b: &Raster<f64>) -> Result<Raster<f64>> {
    a.ensure_same_extent(b)?;

    let data = a
        .data
        .iter()
        .zip(&b.data)
        .map(|(&a, &b)| {
            let sum = a + b;
            if !a.is_finite() || !b.is_finite() || sum == 0.0 {
                f64::NAN
            } else {
                (a - b) / sum
            }
        })
        .collect();

    Ok(Raster {
        width: a.width,
        height: a.height,
        data,
    })
}

impl Scene {
    pub fn ndvi(&self, convert_to_toa: bool) -> Result<Raster<f64>> {
        debug!(scene = %self.name, convert_to_toa, "Calculating NDVI");
        if convert_to_toa {
            let nir = self.toa_reflectance(SpectralBand::Nir)?;
            let red = self.toa_reflectance(SpectralBand::Red)?;
            normalized_difference(&nir, &red)
        } else {
            normalized_difference(self.band(SpectralBand::Nir)?, self.band(SpectralBand::Red)?)
        }
    }
}

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(f64::total_cmp);
    finite
}

/// Median of the finite values; NaN when there are none.
pub fn median(values: &[f64]) -> f64 {
    let sorted = finite_sorted(values);
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Population standard deviation of the finite values; NaN when there are none.
pub fn std_dev(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return f64::NAN;
    }
    let mean = sum / count as f64;
    let variance = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    variance.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleStats {
    /// Finite pixels contributing to the statistics
    pub pixel_count: usize,
    pub median: f64,
    pub std_dev: f64,
}

impl SampleStats {
    pub fn from_values(values: &[f64]) -> Self {
        let pixel_count = values.iter().filter(|v| v.is_finite()).count();
        if pixel_count == 0 {
            warn!("Empty NDVI sample, statistics are undefined");
        }
        Self {
            pixel_count,
            median: median(values),
            std_dev: std_dev(values),
        }
    }
}

/// Per-scene NDVI statistics in strip order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneStats {
    pub name: String,
    pub acquired: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: SampleStats,
}

/// `n` evenly spaced values over `[start, stop]`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    /// One value per bin, `edges.len() - 1` long
    pub values: Vec<f64>,
}

impl Histogram {
    fn counts(values: &[f64], edges: &[f64]) -> Vec<u64> {
        let bins = edges.len().saturating_sub(1);
        let mut counts = vec![0u64; bins];
        if bins == 0 {
            return counts;
        }
        let (lo, hi) = (edges[0], edges[bins]);
        for &v in values {
            if !v.is_finite() || v < lo || v > hi {
                continue;
            }
            // Right-most edge is inclusive.
            let idx = edges.partition_point(|&e| e <= v).saturating_sub(1).min(bins - 1);
            counts[idx] += 1;
        }
        counts
    }

    /// Density histogram: integrates to 1 over the binned range.
    pub fn density(values: &[f64], edges: &[f64]) -> Self {
        let counts = Self::counts(values, edges);
        let total: u64 = counts.iter().sum();
        let values = counts
            .iter()
            .zip(edges.windows(2))
            .map(|(&c, w)| {
                let width = w[1] - w[0];
                if total == 0 || width <= 0.0 {
                    0.0
                } else {
                    c as f64 / (total as f64 * width)
                }
            })
            .collect();
        Self {
            edges: edges.to_vec(),
            values,
        }
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Days elapsed between consecutive acquisitions.
pub fn delta_days(acquired: &[DateTime<Utc>]) -> Vec<f64> {
    acquired
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY)
        .collect()
}

/// Change of the median NDVI per day between consecutive acquisitions.
pub fn rate_of_change(medians: &[f64], delta_days: &[f64]) -> Vec<f64> {
    medians
        .windows(2)
        .zip(delta_days)
        .map(|(m, &days)| (m[1] - m[0]) / days)
        .collect()
}
