//! Scene loading module
//!
//! A scene is one multispectral capture: its analytic bands, its usable data
//! mask, its reflectance calibration and its acquisition time.

mod reader;
mod tiff_reader;
pub mod metadata;
pub mod types;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

pub use metadata::{parse_acquired, parse_reflectance_coefficients, ReflectanceCoefficients};
pub use reader::RasterReader;
pub use tiff_reader::TiffRasterReader;
pub use types::{MultibandRaster, Raster, SceneFiles, SpectralBand, Udm2Band, ANALYTIC_SUFFIX};

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};

/// Analytic rasters carry blue, green, red and nir.
const ANALYTIC_BAND_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub acquired: DateTime<Utc>,
    pub analytic: MultibandRaster,
    pub udm2: MultibandRaster,
    pub coefficients: ReflectanceCoefficients,
}

impl Scene {
    #[instrument(skip(files, reader), fields(scene = %files.base))]
    pub fn load<R: RasterReader + ?Sized>(files: &SceneFiles, reader: &R) -> Result<Self> {
        files.check_exists()?;

        info!("Loading scene");
        let analytic = {
            let _span = tracing::info_span!("decode_analytic").entered();
            reader.read_raster(&read_file(&files.analytic)?)?
        };
        let udm2 = {
            let _span = tracing::info_span!("decode_udm2").entered();
            reader.read_raster(&read_file(&files.udm2)?)?
        };

        let coefficients =
            parse_reflectance_coefficients(&read_to_string(&files.metadata_xml)?)?;
        let acquired = parse_acquired(&read_to_string(&files.metadata_json)?)?;

        Self::from_parts(files.base.clone(), acquired, analytic, udm2, coefficients)
    }

    /// Assembles a scene from already decoded parts, checking band counts and extents.
    pub fn from_parts(
        name: String,
        acquired: DateTime<Utc>,
        analytic: MultibandRaster,
        udm2: MultibandRaster,
        coefficients: ReflectanceCoefficients,
    ) -> Result<Self> {
        if analytic.band_count() < ANALYTIC_BAND_COUNT {
            return Err(AnalysisError::MissingBand {
                expected: ANALYTIC_BAND_COUNT,
                found: analytic.band_count(),
            });
        }
        if udm2.band_count() == 0 {
            return Err(AnalysisError::MissingBand {
                expected: 1,
                found: 0,
            });
        }
        if analytic.width != udm2.width || analytic.height != udm2.height {
            return Err(AnalysisError::DimensionMismatch(
                analytic.width,
                analytic.height,
                udm2.width,
                udm2.height,
            ));
        }

        debug!(
            scene = %name,
            width = analytic.width,
            height = analytic.height,
            udm2_bands = udm2.band_count(),
            "Scene assembled"
        );

        Ok(Self {
            name,
            acquired,
            analytic,
            udm2,
            coefficients,
        })
    }

    pub fn width(&self) -> usize {
        self.analytic.width
    }

    pub fn height(&self) -> usize {
        self.analytic.height
    }

    pub fn band(&self, band: SpectralBand) -> Result<&Raster<f64>> {
        self.analytic.band(band.number())
    }

    pub fn udm2_band(&self, band: Udm2Band) -> Result<&Raster<f64>> {
        self.udm2.band(band.number())
    }

    pub fn acquired_label(&self) -> String {
        self.acquired.format("%Y-%m-%d").to_string()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| AnalysisError::InputReadError(format!("{}: {}", path.display(), e)))
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| AnalysisError::InputReadError(format!("{}: {}", path.display(), e)))
}

/// Lists the analytic scene files of a strip directory, sorted by file name.
pub fn discover_scenes<P: AsRef<Path>>(data_dir: P) -> Result<Vec<SceneFiles>> {
    let data_dir = data_dir.as_ref();
    let entries = std::fs::read_dir(data_dir).map_err(|e| {
        AnalysisError::InputReadError(format!("{}: {}", data_dir.display(), e))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with("AnalyticMS_clip.tif"))
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(AnalysisError::EmptyStrip(data_dir.to_path_buf()));
    }

    debug!(count = paths.len(), dir = %data_dir.display(), "Discovered scenes");
    paths.iter().map(SceneFiles::from_scene_path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn raster(width: usize, height: usize, bands: usize) -> MultibandRaster {
        MultibandRaster {
            width,
            height,
            bands: (0..bands).map(|b| Raster::filled(width, height, b as f64)).collect(),
        }
    }

    fn coefficients() -> ReflectanceCoefficients {
        ReflectanceCoefficients::new(BTreeMap::from([(1, 1.0), (2, 1.0), (3, 1.0), (4, 1.0)]))
    }

    fn acquired() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 8, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn scene_requires_four_analytic_bands() {
        let err = Scene::from_parts("s".into(), acquired(), raster(2, 2, 3), raster(2, 2, 8), coefficients())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MissingBand { expected: 4, found: 3 }));
    }

    #[test]
    fn scene_and_udm2_extents_must_match() {
        let err = Scene::from_parts("s".into(), acquired(), raster(2, 2, 4), raster(2, 3, 8), coefficients())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::DimensionMismatch(2, 2, 2, 3)));
    }

    #[test]
    fn bands_are_looked_up_by_name() {
        let scene =
            Scene::from_parts("s".into(), acquired(), raster(2, 2, 4), raster(2, 2, 8), coefficients())
                .unwrap();
        assert_eq!(scene.band(SpectralBand::Red).unwrap().data[0], 2.0);
        assert_eq!(scene.udm2_band(Udm2Band::Cloud).unwrap().data[0], 5.0);
        assert_eq!(scene.acquired_label(), "2017-08-01");
    }

    #[test]
    fn discovery_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "20170901_a_3B_AnalyticMS_clip.tif",
            "20170601_b_3B_AnalyticMS_clip.tif",
            "20170601_b_3B_udm2_clip.tif",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let scenes = discover_scenes(dir.path()).unwrap();
        let bases: Vec<_> = scenes.iter().map(|s| s.base.as_str()).collect();
        assert_eq!(bases, vec!["20170601_b", "20170901_a"]);
    }

    #[test]
    fn discovery_of_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_scenes(dir.path()),
            Err(AnalysisError::EmptyStrip(_))
        ));
    }

    #[test]
    fn load_reports_missing_sidecar_files() {
        let dir = tempfile::tempdir().unwrap();
        let analytic = dir.path().join("x_3B_AnalyticMS_clip.tif");
        std::fs::write(&analytic, b"").unwrap();
        let files = SceneFiles::from_scene_path(&analytic).unwrap();

        let err = Scene::load(&files, &TiffRasterReader).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingFile(p) if p == files.udm2));
    }
}
