use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::signal::RRSeries;

/// Unit of RR values in a text or CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RrUnit {
    Seconds,
    Millis,
}

impl RrUnit {
    /// Convert a raw value in this unit to seconds.
    pub fn to_seconds(self, value: f64) -> f64 {
        match self {
            RrUnit::Seconds => value,
            RrUnit::Millis => value / 1000.0,
        }
    }
}

/// Reject anything that cannot be a beat-to-beat interval.
pub fn checked_interval(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        anyhow::bail!("RR interval must be finite and positive, got {}", value)
    }
}

/// Parse newline-delimited RR intervals in `unit` into a series in seconds,
/// ignoring blank/comment lines.
pub fn parse_rr_series(text: &str, unit: RrUnit) -> Result<RRSeries> {
    let mut rr = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val = trimmed
            .parse::<f64>()
            .map_err(anyhow::Error::from)
            .and_then(checked_interval)
            .with_context(|| format!("line {} is not an RR interval: {}", idx + 1, trimmed))?;
        rr.push(unit.to_seconds(val));
    }
    if rr.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(RRSeries::new(rr))
}

/// Read RR intervals in `unit` from disk into a series in seconds.
pub fn read_rr_series(path: &Path, unit: RrUnit) -> Result<RRSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_rr_series(&text, unit).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        let rr = parse_rr_series("# header\n\n1.5\n  2.0 \n", RrUnit::Seconds).unwrap();
        assert_eq!(rr.rr, vec![1.5, 2.0]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_rr_series("1.0\nabc\n", RrUnit::Seconds).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_rr_series("# nothing\n", RrUnit::Millis).is_err());
    }

    #[test]
    fn millis_are_converted_to_seconds() {
        let rr = parse_rr_series("800\n1000\n", RrUnit::Millis).unwrap();
        assert_eq!(rr.rr, vec![0.8, 1.0]);
        let rr = parse_rr_series("0.8\n1.0\n", RrUnit::Seconds).unwrap();
        assert_eq!(rr.rr, vec![0.8, 1.0]);
    }

    #[test]
    fn rejects_non_finite_and_non_positive_intervals() {
        let mut text = "800\n".repeat(35);
        text.push_str("nan\n-900\n");
        let err = parse_rr_series(&text, RrUnit::Millis).unwrap_err();
        assert!(err.to_string().contains("line 36"), "{err:#}");
        for bad in ["inf", "-900", "0", "NaN"] {
            assert!(parse_rr_series(&format!("800\n{bad}\n"), RrUnit::Millis).is_err());
        }
    }
}
