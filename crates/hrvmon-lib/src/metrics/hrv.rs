use crate::config::{AnalysisConfig, Band};
use crate::signal::{RRSeries, TimeSeries};
use log::{debug, trace};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A metric slot that is either a number or explicitly undefined.
///
/// Serialises as a JSON number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Measure {
    Defined(f64),
    Undefined,
}

impl Measure {
    pub fn value(self) -> Option<f64> {
        match self {
            Measure::Defined(v) => Some(v),
            Measure::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Measure::Defined(_))
    }
}

impl From<Option<f64>> for Measure {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Measure::Undefined, Measure::Defined)
    }
}

impl From<Measure> for Option<f64> {
    fn from(measure: Measure) -> Self {
        measure.value()
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Defined(v) => write!(f, "{:.2}", v),
            Measure::Undefined => f.write_str("--"),
        }
    }
}

/// LF power, HF power and their ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LfHfResult {
    pub lf: Measure,
    pub hf: Measure,
    pub lf_hf: Measure,
}

impl LfHfResult {
    /// Returned when the window holds too few intervals.
    pub const UNDEFINED: LfHfResult = LfHfResult {
        lf: Measure::Undefined,
        hf: Measure::Undefined,
        lf_hf: Measure::Undefined,
    };
}

impl fmt::Display for LfHfResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LF: {} | HF: {} | LF/HF: {}", self.lf, self.hf, self.lf_hf)
    }
}

/// One-sided power spectral density.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spectrum {
    /// Bin frequencies in Hz, 0 up to Nyquist
    pub freqs: Vec<f64>,
    /// Power density per bin
    pub powers: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    pub fn points(&self) -> Vec<[f64; 2]> {
        self.freqs
            .iter()
            .zip(self.powers.iter())
            .map(|(f, p)| [*f, *p])
            .collect()
    }
}

/// Frequency-domain summary of one analysis window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HRVPsd {
    pub n: usize,
    pub lf: f64,
    pub hf: f64,
    pub lf_hf: Measure,
    pub spectrum: Spectrum,
}

impl HRVPsd {
    pub fn result(&self) -> LfHfResult {
        LfHfResult {
            lf: Measure::Defined(self.lf),
            hf: Measure::Defined(self.hf),
            lf_hf: self.lf_hf,
        }
    }
}

/// LF/HF triple for an RR window; all-undefined below `cfg.min_samples`.
pub fn hrv_lf_hf(rr: &RRSeries, cfg: &AnalysisConfig) -> LfHfResult {
    hrv_psd(rr, cfg).map_or(LfHfResult::UNDEFINED, |psd| psd.result())
}

/// Resample, estimate the spectrum and integrate the LF/HF bands.
///
/// Returns `None` when the series is shorter than `cfg.min_samples`; the later
/// stages are not run in that case.
pub fn hrv_psd(rr: &RRSeries, cfg: &AnalysisConfig) -> Option<HRVPsd> {
    if rr.len() < cfg.min_samples.max(2) {
        debug!(
            "LF/HF undefined: {} interval(s) buffered, need {}",
            rr.len(),
            cfg.min_samples
        );
        return None;
    }
    let signal = rr.resample_uniform(cfg.points_per_interval, cfg.resample_fs);
    let spectrum = welch_psd(&signal);
    trace!(
        "resampled {} intervals to {} points, {} spectral bins",
        rr.len(),
        signal.len(),
        spectrum.len()
    );
    let lf = band_power(&spectrum, &cfg.lf_band);
    let hf = band_power(&spectrum, &cfg.hf_band);
    Some(HRVPsd {
        n: rr.len(),
        lf,
        hf,
        lf_hf: lf_hf_ratio(lf, hf),
        spectrum,
    })
}

/// `lf / hf`, undefined unless `hf` is strictly positive.
pub fn lf_hf_ratio(lf: f64, hf: f64) -> Measure {
    if hf > 0.0 {
        Measure::Defined(lf / hf)
    } else {
        Measure::Undefined
    }
}

/// Trapezoidal integral of the bins inside `band`. Fewer than two bins give 0.
pub fn band_power(spectrum: &Spectrum, band: &Band) -> f64 {
    let (freqs, powers): (Vec<f64>, Vec<f64>) = spectrum
        .freqs
        .iter()
        .zip(spectrum.powers.iter())
        .filter(|(f, _)| band.contains(**f))
        .map(|(f, p)| (*f, *p))
        .unzip();
    trapezoid(&freqs, &powers)
}

fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}

/// Welch PSD with one segment spanning the whole signal: constant detrend,
/// periodic Hann window, density scaling, one-sided.
pub fn welch_psd(signal: &TimeSeries) -> Spectrum {
    let n = signal.len();
    if n == 0 {
        return Spectrum::default();
    }
    let fs = signal.fs;
    let window_func = hann(n);
    let mut frame: Vec<f64> = detrend_constant(&signal.data)
        .into_iter()
        .zip(window_func.iter())
        .map(|(x, w)| x * w)
        .collect();

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut spectrum = r2c.make_output_vec();
    r2c.process(&mut frame, &mut spectrum)
        .expect("fft buffers are sized by the planner");

    let scale = 1.0 / (fs * window_func.iter().map(|w| w * w).sum::<f64>());
    let last = spectrum.len() - 1;
    let bin_width = 1.0 / (n as f64 * (1.0 / fs));
    let mut freqs = Vec::with_capacity(spectrum.len());
    let mut powers = Vec::with_capacity(spectrum.len());
    for (k, val) in spectrum.iter().enumerate() {
        freqs.push(k as f64 * bin_width);
        let unpaired = k == 0 || (n % 2 == 0 && k == last);
        let power = if unpaired {
            val.norm_sqr()
        } else {
            2.0 * val.norm_sqr()
        } * scale;
        powers.push(power);
    }
    Spectrum { freqs, powers }
}

/// Subtract the mean, computed relative to the first sample so that a constant
/// segment detrends to exact zeros.
fn detrend_constant(data: &[f64]) -> Vec<f64> {
    let Some(&first) = data.first() else {
        return Vec::new();
    };
    let mean = first + data.iter().map(|x| x - first).sum::<f64>() / data.len() as f64;
    data.iter().map(|x| x - mean).collect()
}

fn hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size as f64)).cos()))
        .collect()
}
