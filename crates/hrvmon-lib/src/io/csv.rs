use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::path::Path;

use crate::io::text::{checked_interval, RrUnit};
use crate::signal::RRSeries;

/// Load one RR column from a CSV export with headers (e.g. a strap vendor's
/// RR log). Column lookup is case-insensitive; empty cells are skipped.
pub fn read_rr_csv(path: &Path, column: &str, unit: RrUnit) -> Result<RRSeries> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let column_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(column))
        .with_context(|| format!("missing RR column '{}'", column))?;
    let mut rr = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading record {}", idx + 1))?;
        let Some(cell) = record.get(column_idx).filter(|c| !c.is_empty()) else {
            continue;
        };
        let value = cell
            .parse::<f64>()
            .map_err(anyhow::Error::from)
            .and_then(checked_interval)
            .with_context(|| format!("record {}: '{}' is not an RR interval", idx + 1, cell))?;
        rr.push(unit.to_seconds(value));
    }
    if rr.is_empty() {
        anyhow::bail!("no RR values in column '{}'", column);
    }
    Ok(RRSeries::new(rr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn parses_rr_export() {
        let path = sample_path("test_data/rr_export.csv");
        let rr = read_rr_csv(&path, "rr_ms", RrUnit::Millis).expect("read sample");
        assert_eq!(rr.len(), 60);
        assert!((rr.rr[0] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn missing_column_is_an_error() {
        let path = sample_path("test_data/rr_export.csv");
        let err = read_rr_csv(&path, "ibi", RrUnit::Millis).unwrap_err();
        assert!(err.to_string().contains("ibi"));
    }

    #[test]
    fn skips_empty_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rr.csv");
        fs::write(&path, "t,rr\n0,0.8\n1,\n2,0.9\n").unwrap();
        let rr = read_rr_csv(&path, "RR", RrUnit::Seconds).unwrap();
        assert_eq!(rr.rr, vec![0.8, 0.9]);
    }

    #[test]
    fn rejects_invalid_intervals_with_record_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rr.csv");
        fs::write(&path, "t,rr\n0,800\n1,-5\n").unwrap();
        let err = read_rr_csv(&path, "rr", RrUnit::Millis).unwrap_err();
        assert!(err.to_string().contains("record 2"), "{err:#}");
        fs::write(&path, "t,rr\n0,800\n1,nan\n").unwrap();
        assert!(read_rr_csv(&path, "rr", RrUnit::Millis).is_err());
    }

    fn sample_path(relative: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join(relative)
    }
}
