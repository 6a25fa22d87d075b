//! Synthetic strap recordings with a sinusoidally modulated RR rhythm.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::io::notification::HeartRateSample;
use crate::signal::RRSeries;

const MIN_RR_S: f64 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub beats: usize,
    pub seed: u64,
    pub mean_rr_s: f64,
    pub modulation_hz: f64,
    /// Peak deviation from `mean_rr_s`
    pub modulation_depth_s: f64,
    /// Uniform noise half-width
    pub jitter_s: f64,
    /// Upper bound on intervals packed into one notification
    pub max_rr_per_notification: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            beats: 120,
            seed: 7,
            mean_rr_s: 0.85,
            modulation_hz: 0.25,
            modulation_depth_s: 0.04,
            jitter_s: 0.01,
            max_rr_per_notification: 2,
        }
    }
}

pub fn simulate_rr(cfg: &SimulationConfig) -> RRSeries {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    RRSeries::new(generate_rr(cfg, &mut rng))
}

/// Beats grouped into notifications of 1..=`max_rr_per_notification`
/// intervals, heart rate taken from the mean of each group.
pub fn simulate_notifications(cfg: &SimulationConfig) -> Vec<HeartRateSample> {
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let rr = generate_rr(cfg, &mut rng);
    let max_group = cfg.max_rr_per_notification.max(1);
    let mut samples = Vec::new();
    let mut idx = 0;
    while idx < rr.len() {
        let take = rng.gen_range(1..=max_group).min(rr.len() - idx);
        let group: Vec<f64> = rr[idx..idx + take].to_vec();
        let mean = group.iter().sum::<f64>() / group.len() as f64;
        samples.push(HeartRateSample {
            heart_rate: (60.0 / mean).round() as u16,
            contact: None,
            energy_expended: None,
            rr: group,
        });
        idx += take;
    }
    samples
}

fn generate_rr(cfg: &SimulationConfig, rng: &mut StdRng) -> Vec<f64> {
    let mut t = 0.0;
    let mut rr = Vec::with_capacity(cfg.beats);
    for _ in 0..cfg.beats {
        let mut value = cfg.mean_rr_s + cfg.modulation_depth_s * (2.0 * PI * cfg.modulation_hz * t).sin();
        if cfg.jitter_s > 0.0 {
            value += rng.gen_range(-cfg.jitter_s..=cfg.jitter_s);
        }
        let value = value.max(MIN_RR_S);
        t += value;
        rr.push(value);
    }
    rr
}
