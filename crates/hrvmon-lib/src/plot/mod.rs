use serde::{Deserialize, Serialize};

use crate::config::Band;
use crate::metrics::hrv::Spectrum;
use crate::signal::RRSeries;

const SPECTRUM_COLOR: u32 = 0x1F77B4;
const LF_COLOR: u32 = 0xFF7F0E;
const HF_COLOR: u32 = 0x2CA02C;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn with_labels(mut self, x: &str, y: &str) -> Self {
        self.x.label = Some(x.into());
        self.y.label = Some(y.into());
        self
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all points; unit ranges when empty.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut bounds = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for p in self.series.iter().flat_map(|s| s.points().iter()) {
            bounds.0 = bounds.0.min(p[0]);
            bounds.1 = bounds.1.max(p[0]);
            bounds.2 = bounds.2.min(p[1]);
            bounds.3 = bounds.3.max(p[1]);
        }
        if !bounds.0.is_finite() {
            return (0.0, 1.0, 0.0, 1.0);
        }
        if bounds.1 <= bounds.0 {
            bounds.1 = bounds.0 + 1.0;
        }
        if bounds.3 <= bounds.2 {
            bounds.3 = bounds.2 + 1.0;
        }
        bounds
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        let sample = points[start];
        result.push(sample);
    }
    result
}

pub fn figure_from_rr_limit(rr: &RRSeries, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some("RR intervals".into())).with_labels("beat", "RR (s)");
    let points: Vec<[f64; 2]> = rr
        .rr
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64, *value])
        .collect();
    let decimated = decimate_points(&points, max_points);
    fig.add_series(Series::Line(LineSeries {
        name: "RR".into(),
        points: decimated,
        style: Style {
            width: 2.0,
            dash: None,
            color: Color(0xFF0077),
        },
    }));
    fig
}

pub fn figure_from_rr(rr: &RRSeries) -> Figure {
    figure_from_rr_limit(rr, 1024)
}

/// PSD up to `max_freq` with dashed markers at the LF and HF band edges.
pub fn figure_from_spectrum(spectrum: &Spectrum, lf: &Band, hf: &Band, max_freq: f64) -> Figure {
    let points: Vec<[f64; 2]> = spectrum
        .points()
        .into_iter()
        .filter(|p| p[0] <= max_freq)
        .collect();
    let peak = points.iter().map(|p| p[1]).fold(0.0, f64::max);
    let mut fig = Figure::new(Some("RR power spectral density".into()))
        .with_labels("frequency (Hz)", "PSD (s^2/Hz)");
    fig.add_series(Series::Line(LineSeries {
        name: "PSD".into(),
        points,
        style: Style {
            width: 1.6,
            dash: None,
            color: Color(SPECTRUM_COLOR),
        },
    }));
    for (name, band, color) in [("LF", lf, LF_COLOR), ("HF", hf, HF_COLOR)] {
        for edge in [band.low, band.high] {
            fig.add_series(Series::Line(LineSeries {
                name: format!("{} edge {:.2} Hz", name, edge),
                points: vec![[edge, 0.0], [edge, peak]],
                style: Style {
                    width: 1.0,
                    dash: Some([4.0, 4.0]),
                    color: Color(color),
                },
            }));
        }
    }
    fig
}
