//! Analysis configuration types

use crate::ndvi_pipeline::clip::StripAlignment;
use crate::ndvi_pipeline::ndvi::linspace;
use crate::ndvi_pipeline::tiff::{TiffCompression, TiffOptions};

/// Percentile that keeps every pixel, i.e. no water mask.
pub const NO_WATER_MASK_PERCENTILE: f64 = 100.0;

/// Configuration for a strip NDVI analysis
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Blue-band percentile above which pixels are treated as water
    pub water_mask_percentile: f64,
    /// Whether to calibrate to TOA reflectance before computing NDVI
    pub convert_to_toa: bool,
    /// How scenes of different extents are brought together
    pub alignment: StripAlignment,
    /// Whether to render band and UDM2 images for every scene
    pub plot_scene_images: bool,
    /// Whether to render the histogram, trend and water mask figures
    pub plot_analysis: bool,
    /// Whether to write each scene's NDVI raster as a float TIFF
    pub export_ndvi: bool,
    /// Compression of exported rasters
    pub tiff: TiffOptions,
    /// Whether to reject scenes with a zero width or height
    pub validate_dimensions: bool,
    /// Bin edges of the NDVI histograms
    pub histogram_edges: Vec<f64>,
    /// Figure size in pixels
    pub figure_size: (u32, u32),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            water_mask_percentile: 50.0,
            convert_to_toa: true,
            alignment: StripAlignment::ClipRows,
            plot_scene_images: true,
            plot_analysis: true,
            export_ndvi: false,
            tiff: TiffOptions::default(),
            validate_dimensions: true,
            histogram_edges: linspace(0.01, 1.0, 100),
            figure_size: (800, 600),
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }
}

/// Builder for AnalysisConfig
#[derive(Default)]
pub struct AnalysisConfigBuilder {
    water_mask_percentile: Option<f64>,
    convert_to_toa: Option<bool>,
    alignment: Option<StripAlignment>,
    plot_scene_images: Option<bool>,
    plot_analysis: Option<bool>,
    export_ndvi: Option<bool>,
    compression: Option<TiffCompression>,
    validate_dimensions: Option<bool>,
    histogram_edges: Option<Vec<f64>>,
    figure_size: Option<(u32, u32)>,
}

impl AnalysisConfigBuilder {
    pub fn water_mask_percentile(mut self, percentile: f64) -> Self {
        self.water_mask_percentile = Some(percentile);
        self
    }

    pub fn convert_to_toa(mut self, enable: bool) -> Self {
        self.convert_to_toa = Some(enable);
        self
    }

    pub fn alignment(mut self, alignment: StripAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn plot_scene_images(mut self, enable: bool) -> Self {
        self.plot_scene_images = Some(enable);
        self
    }

    pub fn plot_analysis(mut self, enable: bool) -> Self {
        self.plot_analysis = Some(enable);
        self
    }

    pub fn export_ndvi(mut self, enable: bool) -> Self {
        self.export_ndvi = Some(enable);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn histogram_edges(mut self, edges: Vec<f64>) -> Self {
        self.histogram_edges = Some(edges);
        self
    }

    pub fn figure_size(mut self, width: u32, height: u32) -> Self {
        self.figure_size = Some((width, height));
        self
    }

    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();
        AnalysisConfig {
            water_mask_percentile: self.water_mask_percentile.unwrap_or(default.water_mask_percentile),
            convert_to_toa: self.convert_to_toa.unwrap_or(default.convert_to_toa),
            alignment: self.alignment.unwrap_or(default.alignment),
            plot_scene_images: self.plot_scene_images.unwrap_or(default.plot_scene_images),
            plot_analysis: self.plot_analysis.unwrap_or(default.plot_analysis),
            export_ndvi: self.export_ndvi.unwrap_or(default.export_ndvi),
            tiff: TiffOptions {
                compression: self.compression.unwrap_or(default.tiff.compression),
            },
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            histogram_edges: self.histogram_edges.unwrap_or(default.histogram_edges),
            figure_size: self.figure_size.unwrap_or(default.figure_size),
        }
    }
}
