//! Raster and scene data types

use std::fmt;
use std::path::{Path, PathBuf};

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};

/// Suffix of the analytic multispectral raster; everything before it is the scene base.
pub const ANALYTIC_SUFFIX: &str = "_3B_AnalyticMS_clip.tif";
const METADATA_XML_SUFFIX: &str = "_3B_AnalyticMS_metadata_clip.xml";
const METADATA_JSON_SUFFIX: &str = "_metadata.json";
const UDM2_SUFFIX: &str = "_3B_udm2_clip.tif";

/// Single band raster in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    /// Width of the raster in pixels
    pub width: usize,
    /// Height of the raster in pixels
    pub height: usize,
    /// Pixel values, `width * height` long
    pub data: Vec<T>,
}

impl<T: Copy> Raster<T> {
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(AnalysisError::DecodeError(format!(
                "{} samples for a {}x{} raster",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    pub fn same_extent<U>(&self, other: &Raster<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn ensure_same_extent<U>(&self, other: &Raster<U>) -> Result<()> {
        if self.same_extent(other) {
            Ok(())
        } else {
            Err(AnalysisError::DimensionMismatch(
                self.width,
                self.height,
                other.width,
                other.height,
            ))
        }
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Raster<U> {
        Raster {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

/// Decoded multi-sample raster, one [`Raster`] per band.
#[derive(Debug, Clone, PartialEq)]
pub struct MultibandRaster {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<Raster<f64>>,
}

impl MultibandRaster {
    /// Band by its 1-based number in the file.
    pub fn band(&self, number: u8) -> Result<&Raster<f64>> {
        usize::from(number)
            .checked_sub(1)
            .and_then(|idx| self.bands.get(idx))
            .ok_or(AnalysisError::MissingBand {
                expected: usize::from(number),
                found: self.bands.len(),
            })
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }
}

/// Bands of the analytic raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpectralBand {
    Blue,
    Green,
    Red,
    Nir,
}

impl SpectralBand {
    pub const ALL: [SpectralBand; 4] = [Self::Blue, Self::Green, Self::Red, Self::Nir];

    pub fn number(self) -> u8 {
        match self {
            Self::Blue => 1,
            Self::Green => 2,
            Self::Red => 3,
            Self::Nir => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
            Self::Nir => "nir",
        }
    }
}

impl fmt::Display for SpectralBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bands of the usable data mask (UDM2) raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Udm2Band {
    Clear,
    Snow,
    Shadow,
    LightHaze,
    HeavyHaze,
    Cloud,
    Confidence,
    Unusable,
}

impl Udm2Band {
    pub const ALL: [Udm2Band; 8] = [
        Self::Clear,
        Self::Snow,
        Self::Shadow,
        Self::LightHaze,
        Self::HeavyHaze,
        Self::Cloud,
        Self::Confidence,
        Self::Unusable,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::Clear => 1,
            Self::Snow => 2,
            Self::Shadow => 3,
            Self::LightHaze => 4,
            Self::HeavyHaze => 5,
            Self::Cloud => 6,
            Self::Confidence => 7,
            Self::Unusable => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Snow => "snow",
            Self::Shadow => "shadow",
            Self::LightHaze => "light_haze",
            Self::HeavyHaze => "heavy_haze",
            Self::Cloud => "cloud",
            Self::Confidence => "confidence",
            Self::Unusable => "unusable",
        }
    }
}

/// The four files that make up one scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneFiles {
    /// Scene base name (analytic file name without its suffix)
    pub base: String,
    pub analytic: PathBuf,
    pub metadata_xml: PathBuf,
    pub metadata_json: PathBuf,
    pub udm2: PathBuf,
}

impl SceneFiles {
    pub fn from_scene_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AnalysisError::InvalidSceneName(path.display().to_string()))?;
        let base = file_name
            .strip_suffix(ANALYTIC_SUFFIX)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| AnalysisError::InvalidSceneName(file_name.to_string()))?;

        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(Self {
            base: base.to_string(),
            analytic: path.to_path_buf(),
            metadata_xml: dir.join(format!("{base}{METADATA_XML_SUFFIX}")),
            metadata_json: dir.join(format!("{base}{METADATA_JSON_SUFFIX}")),
            udm2: dir.join(format!("{base}{UDM2_SUFFIX}")),
        })
    }

    pub fn check_exists(&self) -> Result<()> {
        for path in [&self.analytic, &self.udm2, &self.metadata_xml, &self.metadata_json] {
            if !path.exists() {
                return Err(AnalysisError::MissingFile(path.clone()));
            }
        }
        Ok(())
    }
}
