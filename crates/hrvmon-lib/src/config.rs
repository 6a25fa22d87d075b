use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::buffer::DEFAULT_WINDOW_SPAN_S;

/// Frequency band in Hz. The upper edge is always included; the lower edge only
/// when `low_inclusive` is set, so adjacent bands can share an edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
    #[serde(default = "default_true")]
    pub low_inclusive: bool,
}

impl Band {
    pub const LF: Band = Band {
        low: 0.04,
        high: 0.15,
        low_inclusive: true,
    };
    pub const HF: Band = Band {
        low: 0.15,
        high: 0.4,
        low_inclusive: false,
    };

    pub fn contains(&self, freq: f64) -> bool {
        let above_low = if self.low_inclusive {
            freq >= self.low
        } else {
            freq > self.low
        };
        above_low && freq <= self.high
    }
}

fn default_true() -> bool {
    true
}

/// Parameters of the LF/HF pipeline. Defaults follow the standard short-term
/// HRV setup: 60 s window, 30 beats minimum, 4 Hz resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub window_span_s: f64,
    pub min_samples: usize,
    pub resample_fs: f64,
    pub points_per_interval: usize,
    pub lf_band: Band,
    pub hf_band: Band,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_span_s: DEFAULT_WINDOW_SPAN_S,
            min_samples: 30,
            resample_fs: 4.0,
            points_per_interval: 4,
            lf_band: Band::LF,
            hf_band: Band::HF,
        }
    }
}

impl AnalysisConfig {
    /// Read a TOML config; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.window_span_s > 0.0) {
            bail!("window_span_s must be positive, got {}", self.window_span_s);
        }
        if !(self.resample_fs > 0.0) {
            bail!("resample_fs must be positive, got {}", self.resample_fs);
        }
        if self.min_samples < 2 {
            bail!("min_samples must be at least 2, got {}", self.min_samples);
        }
        if self.points_per_interval == 0 {
            bail!("points_per_interval must be at least 1");
        }
        for (name, band) in [("lf_band", &self.lf_band), ("hf_band", &self.hf_band)] {
            if !(band.low >= 0.0 && band.low < band.high) {
                bail!("{} must satisfy 0 <= low < high, got {:?}", name, band);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn shared_edge_belongs_to_low_band() {
        assert!(Band::LF.contains(0.15));
        assert!(!Band::HF.contains(0.15));
        assert!(Band::LF.contains(0.04));
        assert!(Band::HF.contains(0.4));
        assert!(!Band::HF.contains(0.40001));
        assert!(!Band::LF.contains(0.0399));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = AnalysisConfig::from_toml("").unwrap();
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let cfg = AnalysisConfig::from_toml(
            "window_span_s = 120.0\nhf_band = { low = 0.15, high = 0.5, low_inclusive = false }\n",
        )
        .unwrap();
        assert_eq!(cfg.window_span_s, 120.0);
        assert_eq!(cfg.hf_band.high, 0.5);
        assert_eq!(cfg.min_samples, 30);
    }

    #[test]
    fn rejects_inverted_band() {
        let err = AnalysisConfig::from_toml("lf_band = { low = 0.2, high = 0.1 }\n");
        assert!(err.is_err());
    }

    #[test]
    fn rejects_non_positive_span() {
        assert!(AnalysisConfig::from_toml("window_span_s = 0.0\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("analysis.toml");
        fs::write(&path, "min_samples = 40\n").unwrap();
        let cfg = AnalysisConfig::load(&path).unwrap();
        assert_eq!(cfg.min_samples, 40);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = AnalysisConfig::load(Path::new("/nonexistent/analysis.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("analysis.toml"));
    }
}
