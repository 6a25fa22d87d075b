use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn new(rr: Vec<f64>) -> Self {
        Self { rr }
    }

    /// Build a series from millisecond values (divided by 1000).
    pub fn from_millis(values: &[f64]) -> Self {
        Self {
            rr: values.iter().map(|ms| ms / 1000.0).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    /// Sum of all intervals in seconds.
    pub fn total(&self) -> f64 {
        self.rr.iter().sum()
    }

    /// Beat timestamps relative to the first beat: `time[i] = sum(rr[0..=i]) - rr[0]`.
    pub fn time_axis(&self) -> Vec<f64> {
        let Some(&first) = self.rr.first() else {
            return Vec::new();
        };
        let mut times = Vec::with_capacity(self.rr.len());
        let mut acc = 0.0;
        for interval in &self.rr {
            acc += interval;
            times.push(acc - first);
        }
        times
    }

    /// Resample onto `points_per_interval * len` evenly spaced points spanning the
    /// time axis (both ends included), tagged with the nominal rate `fs`.
    ///
    /// The grid spacing is `duration / (num - 1)`, which is generally not `1 / fs`;
    /// downstream spectra are computed against `fs` regardless.
    ///
    /// # Panics
    /// Panics if the series holds fewer than two intervals.
    pub fn resample_uniform(&self, points_per_interval: usize, fs: f64) -> TimeSeries {
        assert!(
            self.rr.len() >= 2,
            "resampling needs at least two intervals, got {}",
            self.rr.len()
        );
        let times = self.time_axis();
        let num = self.rr.len() * points_per_interval;
        let grid = uniform_grid(times[0], times[times.len() - 1], num);
        TimeSeries {
            fs,
            data: interpolate_linear(&grid, &times, &self.rr),
        }
    }
}

/// `num` evenly spaced points over `[start, stop]`; the last point is exactly `stop`.
pub fn uniform_grid(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut grid: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            grid[num - 1] = stop;
            grid
        }
    }
}

/// Piecewise-linear interpolation of `(xp, fp)` at each of `x`.
///
/// `xp` must be non-decreasing. Points outside `[xp[0], xp[last]]` take the
/// nearest endpoint value.
pub fn interpolate_linear(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    debug_assert_eq!(xp.len(), fp.len());
    let n = xp.len();
    if n == 0 {
        return vec![0.0; x.len()];
    }
    let mut out = Vec::with_capacity(x.len());
    let mut idx = 0;
    for &t in x {
        if t <= xp[0] {
            out.push(fp[0]);
            continue;
        }
        if t >= xp[n - 1] {
            out.push(fp[n - 1]);
            continue;
        }
        // grid is monotone, so the segment index only moves forward
        if t < xp[idx] {
            idx = 0;
        }
        while idx + 1 < n - 1 && xp[idx + 1] <= t {
            idx += 1;
        }
        let slope = (fp[idx + 1] - fp[idx]) / (xp[idx + 1] - xp[idx]);
        out.push(slope * (t - xp[idx]) + fp[idx]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_axis_starts_at_zero() {
        let rr = RRSeries::new(vec![0.8, 0.9, 1.0]);
        let t = rr.time_axis();
        assert_eq!(t[0], 0.0);
        assert!((t[1] - 0.9).abs() < 1e-12);
        assert!((t[2] - 1.9).abs() < 1e-12);
    }

    #[test]
    fn from_millis_divides_by_thousand() {
        let rr = RRSeries::from_millis(&[800.0, 1250.0]);
        assert_eq!(rr.rr, vec![0.8, 1.25]);
    }

    #[test]
    fn resample_produces_four_points_per_interval() {
        let rr = RRSeries::new((0..30).map(|i| 0.8 + 0.01 * (i % 4) as f64).collect());
        let ts = rr.resample_uniform(4, 4.0);
        assert_eq!(ts.len(), 120);
        assert_eq!(ts.fs, 4.0);
        assert_eq!(ts.data[0], rr.rr[0]);
        assert_eq!(ts.data[119], rr.rr[29]);
    }

    #[test]
    fn grid_hits_both_endpoints() {
        let grid = uniform_grid(0.0, 10.0, 5);
        assert_eq!(grid, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn interpolation_is_linear_between_knots() {
        let out = interpolate_linear(&[0.5, 1.5], &[0.0, 1.0, 2.0], &[0.0, 2.0, 6.0]);
        assert_eq!(out, vec![1.0, 4.0]);
    }

    #[test]
    fn interpolation_clamps_outside_range() {
        let out = interpolate_linear(&[-1.0, 3.0], &[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(out, vec![1.0, 3.0]);
    }

    #[test]
    fn interpolation_of_constant_is_exact() {
        let rr = RRSeries::new(vec![0.8; 40]);
        let ts = rr.resample_uniform(4, 4.0);
        assert!(ts.data.iter().all(|&v| v == 0.8));
    }

    #[test]
    #[should_panic]
    fn resample_rejects_single_interval() {
        RRSeries::new(vec![0.8]).resample_uniform(4, 4.0);
    }
}
