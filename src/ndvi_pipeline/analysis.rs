//! Strip analysis orchestration: load a strip directory, compute NDVI trends,
//! render figures and write the report.


use std::path::{Path, PathBuf};

use tracing::{info, info_span, warn};

use crate::ndvi_pipeline::common::{AnalysisError, PipelineTimings, Result, Timer};
use crate::ndvi_pipeline::config::{AnalysisConfig, NO_WATER_MASK_PERCENTILE};
use crate::ndvi_pipeline::report::{self, percentile_tag, StripReport, REPORT_FILE_NAME};
use crate::ndvi_pipeline::scene::{
    discover_scenes, RasterReader, Scene, SpectralBand, TiffRasterReader,
};
use crate::ndvi_pipeline::strip::{NdviTrend, Strip};
use crate::ndvi_pipeline::tiff::{RasterWriter, StandardTiffWriter};

pub struct NdviAnalysis<R: RasterReader, W: RasterWriter> {
    reader: R,
    writer: W,
    config: AnalysisConfig,
}

impl NdviAnalysis<TiffRasterReader, StandardTiffWriter> {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            reader: TiffRasterReader,
            writer: StandardTiffWriter,
            config,
        }
    }
}

impl<R: RasterReader, W: RasterWriter> NdviAnalysis<R, W> {
    pub fn with_custom(reader: R, writer: W, config: AnalysisConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            warn!("Scene dimensions {}x{} are empty", width, height);
            return Err(AnalysisError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Discovers, loads and aligns every scene of a strip directory.
    pub fn load_strip<P: AsRef<Path>>(&self, data_dir: P) -> Result<Strip> {
        let data_dir = data_dir.as_ref();
        let _span = info_span!("load_strip", dir = %data_dir.display()).entered();

        let files = discover_scenes(data_dir)?;
        info!("Loading {} scenes from {}", files.len(), data_dir.display());

        let mut scenes = Vec::with_capacity(files.len());
        for scene_files in &files {
            let scene = Scene::load(scene_files, &self.reader)?;
            self.validate_dimensions(scene.width(), scene.height())?;
            scenes.push(scene);
        }

        let strip = Strip::new(scenes, self.config.alignment)?;
        info!(
            "Strip ready: {} scenes, {} clean pixels",
            strip.len(),
            strip.clean_mask().count()
        );
        Ok(strip)
    }

    /// Computes the NDVI trends of a loaded strip and writes figures, optional
    /// NDVI rasters and `ndvi_report.json` into `figures_dir`.
    pub fn analyze<P: AsRef<Path>>(&self, strip: &Strip, figures_dir: P) -> Result<StripReport> {
        let figures_dir = figures_dir.as_ref();
        let percentile = self.config.water_mask_percentile;
        if !(0.0..=100.0).contains(&percentile) {
            return Err(AnalysisError::InvalidPercentile(percentile));
        }
        let (width, height) = match strip.scenes().first() {
            Some(scene) => (scene.width(), scene.height()),
            None => return Err(AnalysisError::EmptyStrip(figures_dir.to_path_buf())),
        };

        std::fs::create_dir_all(figures_dir).map_err(|e| {
            AnalysisError::OutputWriteError(format!("{}: {}", figures_dir.display(), e))
        })?;

        let mut timings = PipelineTimings::new();
        let toa = self.config.convert_to_toa;
        info!(
            "Analyzing {} scenes (alignment {}, water mask percentile {}, TOA {})",
            strip.len(),
            self.config.alignment,
            percentile,
            toa
        );

        let trend = timings.time("ndvi_trend", || strip.trend(percentile, toa))?;
        let trend_without_water_mask = timings.time("ndvi_trend_without_water_mask", || {
            strip.trend(NO_WATER_MASK_PERCENTILE, toa)
        })?;

        let mut figures = Vec::new();
        if self.config.plot_scene_images {
            let timer = Timer::start("plot_scene_images");
            figures.extend(self.plot_scene_images(strip, figures_dir)?);
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }
        if self.config.plot_analysis {
            let timer = Timer::start("plot_analysis");
            figures.extend(self.plot_analysis(strip, &trend, &trend_without_water_mask, figures_dir)?);
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }

        let ndvi_rasters = if self.config.export_ndvi {
            timings.time("export_ndvi", || self.export_ndvi(strip, figures_dir))?
        } else {
            Vec::new()
        };

        let report = StripReport {
            alignment: self.config.alignment,
            convert_to_toa: toa,
            scene_count: strip.len(),
            width,
            height,
            clean_pixels: strip.clean_mask().count(),
            trend,
            trend_without_water_mask,
            figures,
            ndvi_rasters,
        };
        timings.time("write_report", || report.write_json(figures_dir.join(REPORT_FILE_NAME)))?;

        timings.log_summary();
        Ok(report)
    }

    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, data_dir: P, figures_dir: Q) -> Result<StripReport> {
        let timer = Timer::start("load_strip");
        let strip = self.load_strip(data_dir)?;
        let (name, duration) = timer.stop();
        info!("{}: {:.3}ms", name, duration.as_secs_f64() * 1000.0);

        self.analyze(&strip, figures_dir)
    }

    /// Band and UDM2 images for every scene.
    fn plot_scene_images(&self, strip: &Strip, figures_dir: &Path) -> Result<Vec<PathBuf>> {
        let size = self.config.figure_size;
        let mut figures = Vec::new();

        for scene in strip.scenes() {
            let path = figures_dir.join(format!("{}_scenes.png", scene.name));
            report::plot_scene_bands(&path, scene, size)?;
            figures.push(path);

            let path = figures_dir.join(format!("{}_udm2.png", scene.name));
            report::plot_udm2_bands(&path, scene, size)?;
            figures.push(path);
        }

        Ok(figures)
    }

    fn plot_analysis(
        &self,
        strip: &Strip,
        trend: &NdviTrend,
        trend_without_water_mask: &NdviTrend,
        figures_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let size = self.config.figure_size;
        let percentile = self.config.water_mask_percentile;
        let toa = self.config.convert_to_toa;
        let tag = percentile_tag(percentile);
        let alignment = self.config.alignment.label();

        let labels: Vec<String> = strip
            .scenes()
            .iter()
            .map(|s| format!("{} {}", s.name, s.acquired_label()))
            .collect();
        let masked = strip.ndvi_samples(true, percentile, toa)?;
        let unmasked = strip.ndvi_samples(false, percentile, toa)?;

        let histograms = figures_dir.join(format!("ndvi_hist_{alignment}_{tag}.png"));
        report::plot_ndvi_histograms(
            &histograms,
            &labels,
            &masked,
            &unmasked,
            &self.config.histogram_edges,
            size,
        )?;

        let trends = figures_dir.join(format!("ndvi_trends_{alignment}_{tag}.png"));
        report::plot_ndvi_trends(&trends, trend, size)?;

        let comparison = figures_dir.join(format!("ndvi_trends_water_mask_{tag}.png"));
        report::plot_ndvi_trends_water_mask(&comparison, trend_without_water_mask, trend, size)?;

        // Water mask of the first scene
        let water_mask = figures_dir.join(format!("water_mask_{tag}.png"));
        let blue = strip.scene(0)?.band(SpectralBand::Blue)?;
        report::plot_water_mask(&water_mask, blue, &strip.water_mask(0, percentile)?, size)?;

        Ok(vec![histograms, trends, comparison, water_mask])
    }

    /// Writes each scene's NDVI raster as `{scene}_ndvi.tif`.
    fn export_ndvi(&self, strip: &Strip, figures_dir: &Path) -> Result<Vec<PathBuf>> {
        strip
            .scenes()
            .iter()
            .map(|scene| {
                let path = figures_dir.join(format!("{}_ndvi.tif", scene.name));
                let ndvi = scene.ndvi(self.config.convert_to_toa)?;
                let mut file = std::fs::File::create(&path).map_err(|e| {
                    AnalysisError::OutputWriteError(format!("{}: {}", path.display(), e))
                })?;
                self.writer.write_raster(&ndvi, &mut file, &self.config.tiff)?;
                info!("{} saved", path.display());
                Ok(path)
            })
            .collect()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AnalysisConfig) {
        self.config = config;
    }
}
