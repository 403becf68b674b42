use std::fs::File;
use std::path::Path;

use strip_ndvi_rs::ndvi_pipeline::report::REPORT_FILE_NAME;
use strip_ndvi_rs::ndvi_pipeline::{
    AnalysisConfig, AnalysisError, NdviAnalysis, RasterReader, StripAlignment, StripReport,
    TiffRasterReader,
};
use tiff::encoder::{colortype, TiffEncoder};

const XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ps:EarthObservation xmlns:ps="http://schemas.planet.com/ps/v1/planet_product_metadata_geocorrected_level">
  <ps:bandSpecificMetadata><ps:bandNumber>1</ps:bandNumber><ps:reflectanceCoefficient>1e-05</ps:reflectanceCoefficient></ps:bandSpecificMetadata>
  <ps:bandSpecificMetadata><ps:bandNumber>2</ps:bandNumber><ps:reflectanceCoefficient>1e-05</ps:reflectanceCoefficient></ps:bandSpecificMetadata>
  <ps:bandSpecificMetadata><ps:bandNumber>3</ps:bandNumber><ps:reflectanceCoefficient>2e-05</ps:reflectanceCoefficient></ps:bandSpecificMetadata>
  <ps:bandSpecificMetadata><ps:bandNumber>4</ps:bandNumber><ps:reflectanceCoefficient>3e-05</ps:reflectanceCoefficient></ps:bandSpecificMetadata>
</ps:EarthObservation>"#;

/// Red 100 and nir 300 everywhere, blue counts up from 1.
fn write_scene(dir: &Path, base: &str, acquired: &str, width: u32, height: u32, clear: &[u8]) {
    let n = (width * height) as usize;
    let mut analytic = Vec::with_capacity(n * 4);
    for i in 0..n {
        analytic.extend_from_slice(&[i as u16 + 1, 0, 100, 300]);
    }

    let file = File::create(dir.join(format!("{base}_3B_AnalyticMS_clip.tif"))).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::RGBA16>(width, height, &analytic)
        .unwrap();

    let file = File::create(dir.join(format!("{base}_3B_udm2_clip.tif"))).unwrap();
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::Gray8>(width, height, clear)
        .unwrap();

    std::fs::write(dir.join(format!("{base}_3B_AnalyticMS_metadata_clip.xml")), XML).unwrap();
    std::fs::write(
        dir.join(format!("{base}_metadata.json")),
        format!(r#"{{"id": "{base}", "properties": {{"acquired": "{acquired}", "cloud_cover": 0.0}}}}"#),
    )
    .unwrap();
}

fn quiet_config() -> strip_ndvi_rs::ndvi_pipeline::AnalysisConfigBuilder {
    AnalysisConfig::builder()
        .plot_scene_images(false)
        .plot_analysis(false)
}

#[test]
fn strip_report_from_tiff_scenes() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "20170611_174806_0e20", "2017-06-11T17:48:06.470587Z", 3, 2, &[1, 1, 1, 1, 1, 0]);
    write_scene(data.path(), "20170616_174810_1044", "2017-06-16T17:48:10Z", 3, 2, &[1, 1, 1, 1, 1, 1]);

    let analysis = NdviAnalysis::new(quiet_config().build());
    let report = analysis.run(data.path(), figures.path()).unwrap();

    assert_eq!(report.scene_count, 2);
    assert_eq!(report.clean_pixels, 5);
    // blue 1..=6 below the median 3.5 and clear: pixels 0, 1, 2
    assert_eq!(report.trend.scenes[0].stats.pixel_count, 3);
    assert_eq!(report.trend_without_water_mask.scenes[0].stats.pixel_count, 5);

    // TOA: nir 0.009, red 0.002
    let expected = 0.007 / 0.011;
    assert!((report.trend.scenes[1].stats.median - expected).abs() < 1e-9);
    assert!(report.trend.scenes[1].stats.std_dev.abs() < 1e-12);
    assert_eq!(report.trend.delta_days.len(), 1);
    assert!((report.trend.delta_days[0] - 5.0).abs() < 1e-3);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(figures.path().join(REPORT_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(json["alignment"], "clip_rows");
    assert_eq!(json["scene_count"], 2);
    assert_eq!(json["trend"]["water_mask_percentile"], 50.0);
    assert_eq!(json["trend"]["scenes"][0]["name"], "20170611_174806_0e20");
}

#[test]
fn taller_scene_is_clipped() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 2, 3, &[1; 6]);
    write_scene(data.path(), "b", "2017-06-12T00:00:00Z", 2, 2, &[1; 4]);

    let analysis = NdviAnalysis::new(quiet_config().build());
    let report = analysis.run(data.path(), figures.path()).unwrap();

    assert_eq!(report.scene_count, 2);
    assert_eq!((report.width, report.height), (2, 2));
    assert_eq!(report.clean_pixels, 4);
}

#[test]
fn mismatched_scene_is_dropped() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 2, 3, &[1; 6]);
    write_scene(data.path(), "b", "2017-06-12T00:00:00Z", 2, 2, &[1; 4]);
    write_scene(data.path(), "c", "2017-06-13T00:00:00Z", 2, 2, &[1; 4]);

    let config = quiet_config().alignment(StripAlignment::DropMismatched).build();
    let report = NdviAnalysis::new(config).run(data.path(), figures.path()).unwrap();

    assert_eq!(report.scene_count, 2);
    let names: Vec<_> = report.trend.scenes.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["b", "c"]);
}

#[test]
fn exported_ndvi_reads_back() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 2, 2, &[1; 4]);

    let config = quiet_config().convert_to_toa(false).export_ndvi(true).build();
    let report = NdviAnalysis::new(config).run(data.path(), figures.path()).unwrap();

    assert_eq!(report.ndvi_rasters.len(), 1);
    let bytes = std::fs::read(&report.ndvi_rasters[0]).unwrap();
    let raster = TiffRasterReader.read_raster(&bytes).unwrap();
    assert_eq!((raster.width, raster.height), (2, 2));
    assert!(raster.bands[0].data.iter().all(|v| (v - 0.5).abs() < 1e-6));
}

#[test]
fn missing_data_directory_is_reported() {
    let figures = tempfile::tempdir().unwrap();
    let result = NdviAnalysis::new(quiet_config().build()).run("does/not/exist", figures.path());
    assert!(matches!(result, Err(AnalysisError::InputReadError(_))));
}

fn figure_names(report: &StripReport) -> Vec<String> {
    for path in &report.figures {
        let len = std::fs::metadata(path).unwrap().len();
        assert!(len > 0, "{} is empty", path.display());
    }
    report
        .figures
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn every_figure_is_rendered() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 4, 3, &[1; 12]);
    write_scene(data.path(), "b", "2017-06-16T00:00:00Z", 4, 3, &[1; 12]);

    let report = NdviAnalysis::new(AnalysisConfig::default()).run(data.path(), figures.path()).unwrap();

    assert_eq!(figure_names(&report), vec![
        "a_scenes.png",
        "a_udm2.png",
        "b_scenes.png",
        "b_udm2.png",
        "ndvi_hist_clip_blue50.png",
        "ndvi_trends_clip_blue50.png",
        "ndvi_trends_water_mask_blue50.png",
        "water_mask_blue50.png",
    ]);
    assert!(report.figures.iter().all(|p| p.starts_with(figures.path())));
}

#[test]
fn skipping_scene_images_keeps_water_mask_figure() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 4, 3, &[1; 12]);
    write_scene(data.path(), "b", "2017-06-16T00:00:00Z", 4, 3, &[1; 12]);

    let config = AnalysisConfig::builder()
        .plot_scene_images(false)
        .alignment(StripAlignment::DropMismatched)
        .water_mask_percentile(30.0)
        .build();
    let report = NdviAnalysis::new(config).run(data.path(), figures.path()).unwrap();

    assert_eq!(figure_names(&report), vec![
        "ndvi_hist_drop_blue30.png",
        "ndvi_trends_drop_blue30.png",
        "ndvi_trends_water_mask_blue30.png",
        "water_mask_blue30.png",
    ]);
    assert!(!figures.path().join("a_scenes.png").exists());
}

#[test]
fn single_scene_strip_renders_figures() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 4, 3, &[1; 12]);

    let report = NdviAnalysis::new(AnalysisConfig::default()).run(data.path(), figures.path()).unwrap();

    assert_eq!(figure_names(&report), vec![
        "a_scenes.png",
        "a_udm2.png",
        "ndvi_hist_clip_blue50.png",
        "ndvi_trends_clip_blue50.png",
        "ndvi_trends_water_mask_blue50.png",
        "water_mask_blue50.png",
    ]);
    assert!(report.trend.delta_days.is_empty());
    assert!(report.trend.rate_of_change.is_empty());
}

#[test]
fn cloudy_strip_renders_empty_statistics() {
    let data = tempfile::tempdir().unwrap();
    let figures = tempfile::tempdir().unwrap();
    write_scene(data.path(), "a", "2017-06-11T00:00:00Z", 4, 3, &[0; 12]);
    write_scene(data.path(), "b", "2017-06-16T00:00:00Z", 4, 3, &[0; 12]);

    let report = NdviAnalysis::new(AnalysisConfig::default()).run(data.path(), figures.path()).unwrap();

    assert_eq!(figure_names(&report).len(), 8);
    assert_eq!(report.clean_pixels, 0);
    for scene in &report.trend.scenes {
        assert_eq!(scene.stats.pixel_count, 0);
        assert!(scene.stats.median.is_nan());
    }
    assert!(figures.path().join(REPORT_FILE_NAME).exists());
}
