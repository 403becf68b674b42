//! Diagnostic figures rendered to PNG with plotters.

use std::error::Error;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};
use crate::ndvi_pipeline::mask::Mask;
use crate::ndvi_pipeline::ndvi::Histogram;
use crate::ndvi_pipeline::report::colormap::{value_range, ColorScheme};
use crate::ndvi_pipeline::scene::{Raster, Scene, SpectralBand, Udm2Band};
use crate::ndvi_pipeline::strip::NdviTrend;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult<T> = std::result::Result<T, Box<dyn Error>>;

const MS_PER_DAY: f64 = 86_400_000.0;
const FONT: &str = "sans-serif";

fn plot_error(path: &Path, e: Box<dyn Error>) -> AnalysisError {
    AnalysisError::PlotError(format!("{}: {}", path.display(), e))
}

fn finish(path: &Path, result: DrawResult<()>) -> Result<()> {
    result.map_err(|e| plot_error(path, e))?;
    info!("{} saved", path.display());
    Ok(())
}

/// Panel grid with `cols` columns holding `n` panels.
fn grid(n: usize, cols: usize) -> (usize, usize) {
    let cols = cols.clamp(1, n.max(1));
    (n.div_ceil(cols).max(1), cols)
}

fn days_since(start: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - start).num_milliseconds() as f64 / MS_PER_DAY
}

fn date_label(start: DateTime<Utc>, days: f64) -> String {
    (start + TimeDelta::milliseconds((days * MS_PER_DAY) as i64))
        .format("%Y-%m-%d")
        .to_string()
}

/// `[lo, hi]` of the finite values, padded by 10%.
fn padded_range(values: impl IntoIterator<Item = f64>, fallback: (f64, f64)) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return fallback;
    }
    let pad = ((hi - lo) * 0.1).max(1e-3);
    (lo - pad, hi + pad)
}

/// Masked vs unmasked NDVI density, one panel per scene.
pub fn plot_ndvi_histograms(
    path: &Path,
    labels: &[String],
    masked: &[Vec<f64>],
    unmasked: &[Vec<f64>],
    edges: &[f64],
    size: (u32, u32),
) -> Result<()> {
    finish(path, draw_ndvi_histograms(path, labels, masked, unmasked, edges, size))
}

fn draw_ndvi_histograms(
    path: &Path,
    labels: &[String],
    masked: &[Vec<f64>],
    unmasked: &[Vec<f64>],
    edges: &[f64],
    size: (u32, u32),
) -> DrawResult<()> {
    let (rows, cols) = grid(labels.len(), 2);
    let root = BitMapBackend::new(path, (size.0, size.1 / 3 * rows as u32 + 50))
        .into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled("NDVI Pixels", (FONT, 28))?;
    let panels = body.split_evenly((rows, cols));

    let (x_min, x_max) = match (edges.first(), edges.last()) {
        (Some(&lo), Some(&hi)) if hi > lo => (lo, hi),
        _ => (0.0, 1.0),
    };

    for ((panel, label), (m, u)) in panels.iter().zip(labels).zip(masked.iter().zip(unmasked)) {
        let masked_hist = Histogram::density(m, edges);
        let unmasked_hist = Histogram::density(u, edges);
        let y_max = masked_hist.max_value().max(unmasked_hist.max_value()).max(1e-3) * 1.1;

        let mut chart = ChartBuilder::on(panel)
            .caption(label, (FONT, 18))
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(45)
            .build_cartesian_2d(x_min..x_max, 0.0..y_max)?;

        chart
            .configure_mesh()
            .x_desc("NDVI")
            .y_desc("Relative Density")
            .x_label_formatter(&|x| format!("{x:.1}"))
            .y_label_formatter(&|y| format!("{y:.1}"))
            .draw()?;

        for (hist, color, name) in [(&masked_hist, BLUE, "Masked"), (&unmasked_hist, GREEN, "No Mask")] {
            chart
                .draw_series(LineSeries::new(step_points(hist), color.stroke_width(2)))?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(2)));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

/// Outline of a histogram as a stepped line.
fn step_points(hist: &Histogram) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(hist.values.len() * 2);
    for (w, &v) in hist.edges.windows(2).zip(&hist.values) {
        points.push((w[0], v));
        points.push((w[1], v));
    }
    points
}

/// Median NDVI with one-sigma bars, and the daily rate of change underneath.
pub fn plot_ndvi_trends(path: &Path, trend: &NdviTrend, size: (u32, u32)) -> Result<()> {
    finish(path, draw_ndvi_trends(path, trend, size))
}

fn draw_ndvi_trends(path: &Path, trend: &NdviTrend, size: (u32, u32)) -> DrawResult<()> {
    let acquired = trend.acquired();
    let Some(&start) = acquired.first() else {
        return Err("no scenes to plot".into());
    };
    let days: Vec<f64> = acquired.iter().map(|&t| days_since(start, t)).collect();
    let x_range = padded_range(days.iter().copied(), (-1.0, 1.0));
    let x_fmt = |x: &f64| date_label(start, *x);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(
        &format!(
            "Presence of Green Vegetation | {} Percentile Water Mask",
            trend.water_mask_percentile
        ),
        (FONT, 24),
    )?;
    let panels = body.split_evenly((2, 1));
    let (upper, lower) = (&panels[0], &panels[1]);

    draw_trend_panel(upper, &days, &[(trend, BLUE, None)], x_range, &x_fmt)?;

    // Rates sit at the earlier acquisition of each pair.
    let rates: Vec<(f64, f64)> = days
        .iter()
        .zip(&trend.rate_of_change)
        .filter(|(_, r)| r.is_finite())
        .map(|(&d, &r)| (d, r))
        .collect();
    let (y_lo, y_hi) = padded_range(rates.iter().map(|&(_, r)| r).chain([0.0]), (-0.02, 0.08));

    let mut chart = ChartBuilder::on(lower)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_desc("Observation Date")
        .y_desc("d(NDVI) / day")
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&|y| format!("{y:.3}"))
        .draw()?;
    chart.draw_series(LineSeries::new(
        vec![(x_range.0, 0.0), (x_range.1, 0.0)],
        &BLACK.mix(0.5),
    ))?;
    chart.draw_series(LineSeries::new(rates.clone(), BLUE.stroke_width(3)))?;
    chart.draw_series(rates.iter().map(|&(x, y)| Circle::new((x, y), 5, BLUE.filled())))?;

    root.present()?;
    Ok(())
}

/// Trend with and without the water mask, both under the strip mask.
pub fn plot_ndvi_trends_water_mask(
    path: &Path,
    unmasked: &NdviTrend,
    masked: &NdviTrend,
    size: (u32, u32),
) -> Result<()> {
    finish(path, draw_ndvi_trends_water_mask(path, unmasked, masked, size))
}

fn draw_ndvi_trends_water_mask(
    path: &Path,
    unmasked: &NdviTrend,
    masked: &NdviTrend,
    size: (u32, u32),
) -> DrawResult<()> {
    let acquired = masked.acquired();
    let Some(&start) = acquired.first() else {
        return Err("no scenes to plot".into());
    };
    let days: Vec<f64> = acquired.iter().map(|&t| days_since(start, t)).collect();
    let x_range = padded_range(days.iter().copied(), (-1.0, 1.0));
    let x_fmt = |x: &f64| date_label(start, *x);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled("Presence of Green Vegetation", (FONT, 24))?;

    let masked_label = format!("{} Percentile Water Mask", masked.water_mask_percentile);
    draw_trend_panel(
        &body,
        &days,
        &[
            (unmasked, GREEN, Some("No Water Mask")),
            (masked, BLUE, Some(masked_label.as_str())),
        ],
        x_range,
        &x_fmt,
    )?;

    root.present()?;
    Ok(())
}

fn draw_trend_panel(
    area: &Area<'_>,
    days: &[f64],
    series: &[(&NdviTrend, RGBColor, Option<&str>)],
    x_range: (f64, f64),
    x_fmt: &dyn Fn(&f64) -> String,
) -> DrawResult<()> {
    let bounds = series.iter().flat_map(|(trend, _, _)| {
        trend
            .scenes
            .iter()
            .flat_map(|s| [s.stats.median - s.stats.std_dev, s.stats.median + s.stats.std_dev])
    });
    let (y_lo, y_hi) = padded_range(bounds, (0.0, 1.0));

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range.0..x_range.1, y_lo..y_hi)?;
    chart
        .configure_mesh()
        .x_desc("Observation Date")
        .y_desc("NDVI")
        .x_label_formatter(x_fmt)
        .y_label_formatter(&|y| format!("{y:.2}"))
        .draw()?;

    let mut labelled = false;
    for &(trend, color, label) in series {
        let points: Vec<(f64, f64, f64)> = days
            .iter()
            .zip(&trend.scenes)
            .filter(|(_, s)| s.stats.median.is_finite())
            .map(|(&d, s)| (d, s.stats.median, s.stats.std_dev))
            .collect();

        let line = chart.draw_series(LineSeries::new(
            points.iter().map(|&(x, m, _)| (x, m)),
            color.stroke_width(3),
        ))?;
        if let Some(label) = label {
            labelled = true;
            line.label(label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 15, y)], color.stroke_width(3))
            });
        }

        chart.draw_series(points.iter().filter(|(_, _, s)| s.is_finite()).map(|&(x, m, s)| {
            ErrorBar::new_vertical(x, m - s, m, m + s, color.stroke_width(2), 10)
        }))?;
    }

    if labelled {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperMiddle)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

/// Blue band split into the pixels the water mask removes and the ones it keeps.
pub fn plot_water_mask(path: &Path, blue: &Raster<f64>, mask: &Mask, size: (u32, u32)) -> Result<()> {
    blue.ensure_same_extent(mask)?;
    finish(path, draw_water_mask(path, blue, mask, size))
}

fn draw_water_mask(path: &Path, blue: &Raster<f64>, mask: &Mask, size: (u32, u32)) -> DrawResult<()> {
    let removed = Raster {
        width: blue.width,
        height: blue.height,
        data: blue.data.iter().zip(&mask.data).map(|(&v, &keep)| if keep { 0.0 } else { v }).collect(),
    };
    let retained = Raster {
        width: blue.width,
        height: blue.height,
        data: blue.data.iter().zip(&mask.data).map(|(&v, &keep)| if keep { v } else { 0.0 }).collect(),
    };
    let range = value_range(blue);

    let root = BitMapBackend::new(path, (size.0, size.1 / 2 + 40)).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled("Effect of Water Mask", (FONT, 24))?;
    let panels = body.split_evenly((1, 2));
    draw_raster(&panels[0], "Above Water Mask Threshold", &removed, ColorScheme::Blues, range)?;
    draw_raster(&panels[1], "Below Water Mask Threshold", &retained, ColorScheme::Blues, range)?;

    root.present()?;
    Ok(())
}

/// One image panel per band.
pub fn plot_bands(
    path: &Path,
    title: &str,
    bands: &[(&str, &Raster<f64>)],
    cols: usize,
    size: (u32, u32),
) -> Result<()> {
    finish(path, draw_bands(path, title, bands, cols, size))
}

fn draw_bands(
    path: &Path,
    title: &str,
    bands: &[(&str, &Raster<f64>)],
    cols: usize,
    size: (u32, u32),
) -> DrawResult<()> {
    let (rows, cols) = grid(bands.len(), cols);
    let panel_height = size.0 / cols as u32;
    let root = BitMapBackend::new(path, (size.0, panel_height * rows as u32 + 40)).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(title, (FONT, 20))?;

    for (panel, (name, raster)) in body.split_evenly((rows, cols)).iter().zip(bands) {
        draw_raster(panel, name, raster, ColorScheme::Viridis, value_range(raster))?;
    }

    root.present()?;
    Ok(())
}

/// Blue, green, red and nir images of a scene.
pub fn plot_scene_bands(path: &Path, scene: &Scene, size: (u32, u32)) -> Result<()> {
    let bands = SpectralBand::ALL
        .iter()
        .map(|&band| Ok((band.name(), scene.band(band)?)))
        .collect::<Result<Vec<_>>>()?;
    let title = format!("{} ({})", scene.name, scene.acquired_label());
    plot_bands(path, &title, &bands, 2, size)
}

/// Every band present in the scene's usable data mask.
pub fn plot_udm2_bands(path: &Path, scene: &Scene, size: (u32, u32)) -> Result<()> {
    let bands: Vec<_> = Udm2Band::ALL
        .iter()
        .filter_map(|&band| scene.udm2_band(band).ok().map(|raster| (band.name(), raster)))
        .collect();
    let title = format!("{} UDM2", scene.name);
    plot_bands(path, &title, &bands, 2, size)
}

/// Nearest-neighbour render of a raster into a panel, preserving aspect ratio.
fn draw_raster(
    area: &Area<'_>,
    title: &str,
    raster: &Raster<f64>,
    scheme: ColorScheme,
    (min, max): (f64, f64),
) -> DrawResult<()> {
    let inner = area.titled(title, (FONT, 16))?;
    if raster.is_empty() {
        return Ok(());
    }

    let (w, h) = inner.dim_in_pixel();
    let scale = (w as f64 / raster.width as f64).min(h as f64 / raster.height as f64);
    let out_w = (raster.width as f64 * scale) as u32;
    let out_h = (raster.height as f64 * scale) as u32;
    let span = max - min;

    for py in 0..out_h {
        let row = ((py as f64 / scale) as usize).min(raster.height - 1);
        for px in 0..out_w {
            let col = ((px as f64 / scale) as usize).min(raster.width - 1);
            let value = raster.data[row * raster.width + col];
            let color = if value.is_finite() {
                scheme.evaluate((value - min) / span)
            } else {
                WHITE
            };
            inner.draw_pixel((px as i32, py as i32), &color)?;
        }
    }
    Ok(())
}
