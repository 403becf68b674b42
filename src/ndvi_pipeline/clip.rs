//! Extent alignment across a strip.
//!
//! Scenes of one strip are clipped to the same ground extent but can still
//! differ by a few rows. Building a strip mask needs identical extents, so
//! either the taller scenes are trimmed or the odd scenes are dropped.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::scene::{MultibandRaster, Raster, Scene};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StripAlignment {
    /// Trim trailing rows so every scene has the height of the shortest one
    #[default]
    ClipRows,
    /// Remove scenes whose extent differs from the most common extent
    DropMismatched,
}

impl StripAlignment {
    pub fn label(self) -> &'static str {
        match self {
            Self::ClipRows => "clip",
            Self::DropMismatched => "drop",
        }
    }
}

impl fmt::Display for StripAlignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl<T: Copy> Raster<T> {
    /// Drops the last `rows` rows.
    pub fn clip_rows(&self, rows: usize) -> Raster<T> {
        let height = self.height.saturating_sub(rows);
        Raster {
            width: self.width,
            height,
            data: self.data[..height * self.width].to_vec(),
        }
    }
}

impl MultibandRaster {
    pub fn clip_rows(&self, rows: usize) -> MultibandRaster {
        MultibandRaster {
            width: self.width,
            height: self.height.saturating_sub(rows),
            bands: self.bands.iter().map(|b| b.clip_rows(rows)).collect(),
        }
    }
}

impl Scene {
    /// Drops the last `rows` rows of every analytic and UDM2 band.
    pub fn clip_rows(&self, rows: usize) -> Scene {
        Scene {
            name: self.name.clone(),
            acquired: self.acquired,
            analytic: self.analytic.clip_rows(rows),
            udm2: self.udm2.clip_rows(rows),
            coefficients: self.coefficients.clone(),
        }
    }
}

/// Brings every scene of a strip to one extent, preserving order.
pub fn align_scenes(scenes: Vec<Scene>, alignment: StripAlignment) -> Result<Vec<Scene>> {
    let aligned = match alignment {
        StripAlignment::ClipRows => clip_to_shortest(scenes),
        StripAlignment::DropMismatched => drop_mismatched(scenes),
    };

    if let Some((first, rest)) = aligned.split_first() {
        for scene in rest {
            if scene.width() != first.width() || scene.height() != first.height() {
                return Err(AnalysisError::DimensionMismatch(
                    first.width(),
                    first.height(),
                    scene.width(),
                    scene.height(),
                ));
            }
        }
    }
    Ok(aligned)
}

fn clip_to_shortest(scenes: Vec<Scene>) -> Vec<Scene> {
    let Some(target) = scenes.iter().map(Scene::height).min() else {
        return scenes;
    };

    scenes
        .into_iter()
        .map(|scene| {
            let excess = scene.height() - target;
            if excess == 0 {
                scene
            } else {
                info!(scene = %scene.name, rows = excess, "Clipping rows");
                scene.clip_rows(excess)
            }
        })
        .collect()
}

fn drop_mismatched(scenes: Vec<Scene>) -> Vec<Scene> {
    let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
    for scene in &scenes {
        *counts.entry((scene.width(), scene.height())).or_default() += 1;
    }
    // Most common extent; ties go to the larger extent.
    let Some(target) = counts
        .into_iter()
        .max_by_key(|&((w, h), n)| (n, w * h, h))
        .map(|(extent, _)| extent)
    else {
        return scenes;
    };

    scenes
        .into_iter()
        .filter(|scene| {
            let keep = (scene.width(), scene.height()) == target;
            if !keep {
                warn!(
                    scene = %scene.name,
                    width = scene.width(),
                    height = scene.height(),
                    "Dropping scene with mismatched extent"
                );
            }
            keep
        })
        .collect()
}
