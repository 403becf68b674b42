//! Color ramps for raster figures.

use plotters::style::RGBColor;

use crate::ndvi_pipeline::scene::Raster;

/// Position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
struct ColorStop {
    t: f64,
    rgb: (u8, u8, u8),
}

const fn stop(t: f64, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop { t, rgb: (r, g, b) }
}

const VIRIDIS_STOPS: &[ColorStop] = &[
    stop(0.00, 68, 1, 84),
    stop(0.25, 59, 82, 139),
    stop(0.50, 33, 145, 140),
    stop(0.75, 94, 201, 98),
    stop(1.00, 253, 231, 37),
];

const BLUES_STOPS: &[ColorStop] = &[
    stop(0.00, 247, 251, 255),
    stop(0.25, 198, 219, 239),
    stop(0.50, 107, 174, 214),
    stop(0.75, 33, 113, 181),
    stop(1.00, 8, 48, 107),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Viridis,
    Blues,
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

fn multi_stop(stops: &[ColorStop], t: f64) -> RGBColor {
    let first = stops[0].rgb;
    let last = stops[stops.len() - 1].rgb;
    if t.is_nan() || t <= 0.0 {
        return RGBColor(first.0, first.1, first.2);
    }
    if t >= 1.0 {
        return RGBColor(last.0, last.1, last.2);
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let ratio = (t - lo.t) / (hi.t - lo.t);
            return RGBColor(
                lerp(lo.rgb.0, hi.rgb.0, ratio),
                lerp(lo.rgb.1, hi.rgb.1, ratio),
                lerp(lo.rgb.2, hi.rgb.2, ratio),
            );
        }
    }
    RGBColor(last.0, last.1, last.2)
}

impl ColorScheme {
    /// Color at normalized position `t`, clamped to [0, 1].
    pub fn evaluate(self, t: f64) -> RGBColor {
        match self {
            Self::Viridis => multi_stop(VIRIDIS_STOPS, t),
            Self::Blues => multi_stop(BLUES_STOPS, t),
        }
    }
}

/// Min and max of the finite values; `(0, 1)` when there are none, widened
/// to a unit range when the raster is constant.
pub fn value_range(raster: &Raster<f64>) -> (f64, f64) {
    let (min, max) = raster
        .data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        (0.0, 1.0)
    } else if (max - min).abs() < f64::EPSILON {
        (min, min + 1.0)
    } else {
        (min, max)
    }
}
