//! Live recording flow: each notification is decoded, its intervals appended to
//! the window buffer, and the LF/HF pipeline rerun on a snapshot of the window.

use anyhow::Result;
use log::warn;
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::buffer::IntervalBuffer;
use crate::config::AnalysisConfig;
use crate::io::notification::{decode_heart_rate, DecodeError, HeartRateSample};
use crate::io::session::{format_rr_list, SessionLog};
use crate::metrics::hrv::{hrv_lf_hf, hrv_psd, HRVPsd, LfHfResult};

/// Recorded time between session flushes.
pub const DEFAULT_FLUSH_INTERVAL_S: f64 = 5.0;

/// Outcome of one ingested notification.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorUpdate {
    pub heart_rate: u16,
    /// Intervals carried by this notification (seconds)
    pub rr: Vec<f64>,
    /// Intervals in the analysis window after eviction
    pub buffered: usize,
    pub result: LfHfResult,
    /// Set when enough recorded time has passed to flush the session log
    pub flush_due: bool,
}

impl fmt::Display for MonitorUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HR: {} BPM | RR: {} | {}",
            self.heart_rate,
            format_rr_list(&self.rr),
            self.result
        )
    }
}

pub struct Monitor {
    config: AnalysisConfig,
    buffer: IntervalBuffer,
    session: SessionLog,
    flush_interval_s: f64,
    since_flush_s: f64,
}

impl Monitor {
    pub fn new(config: AnalysisConfig) -> Self {
        let buffer = IntervalBuffer::new(config.window_span_s);
        Self {
            config,
            buffer,
            session: SessionLog::new(),
            flush_interval_s: DEFAULT_FLUSH_INTERVAL_S,
            since_flush_s: 0.0,
        }
    }

    pub fn with_flush_interval(mut self, seconds: f64) -> Self {
        self.flush_interval_s = seconds;
        self
    }

    /// Decode and ingest a raw notification payload.
    pub fn ingest_payload(&mut self, payload: &[u8]) -> Result<MonitorUpdate, DecodeError> {
        match decode_heart_rate(payload) {
            Ok(sample) => Ok(self.ingest(sample)),
            Err(err) => {
                warn!("dropping notification ({} bytes): {}", payload.len(), err);
                Err(err)
            }
        }
    }

    pub fn ingest(&mut self, sample: HeartRateSample) -> MonitorUpdate {
        self.ingest_record(sample.heart_rate, sample.rr)
    }

    /// Record one heart rate with its intervals and rerun the analysis.
    /// Intervals that are not finite and positive are dropped.
    pub fn ingest_record(&mut self, heart_rate: u16, mut rr: Vec<f64>) -> MonitorUpdate {
        let received = rr.len();
        rr.retain(|v| v.is_finite() && *v > 0.0);
        if rr.len() < received {
            warn!(
                "dropped {} invalid RR interval(s) at {} BPM",
                received - rr.len(),
                heart_rate
            );
        }
        self.buffer.append(&rr);
        self.since_flush_s += rr.iter().sum::<f64>();
        self.session.push(heart_rate, rr.clone());
        MonitorUpdate {
            heart_rate,
            rr,
            buffered: self.buffer.len(),
            result: self.analyze(),
            flush_due: self.since_flush_s >= self.flush_interval_s,
        }
    }

    /// LF/HF for the current window.
    pub fn analyze(&self) -> LfHfResult {
        hrv_lf_hf(&self.buffer.snapshot(), &self.config)
    }

    /// Full spectrum for the current window, if it holds enough intervals.
    pub fn psd(&self) -> Option<HRVPsd> {
        hrv_psd(&self.buffer.snapshot(), &self.config)
    }

    /// Overwrite `path` with the session so far and restart the flush clock.
    pub fn flush(&mut self, path: &Path) -> Result<()> {
        self.session.flush(path)?;
        self.since_flush_s = 0.0;
        Ok(())
    }

    pub fn buffer(&self) -> &IntervalBuffer {
        &self.buffer
    }

    pub fn session(&self) -> &SessionLog {
        &self.session
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::hrv::Measure;
    use std::fs;
    use tempfile::tempdir;

    fn strap_payload(hr: u8, ticks: &[u16]) -> Vec<u8> {
        let mut payload = vec![0x10, hr];
        for t in ticks {
            payload.extend_from_slice(&t.to_le_bytes());
        }
        payload
    }

    #[test]
    fn undefined_until_thirty_intervals() {
        let mut monitor = Monitor::new(AnalysisConfig::default());
        for i in 0..29u16 {
            let update = monitor
                .ingest_payload(&strap_payload(70, &[870 + (i % 3) * 20]))
                .unwrap();
            assert_eq!(update.result, LfHfResult::UNDEFINED);
        }
        let update = monitor.ingest_payload(&strap_payload(70, &[880])).unwrap();
        assert_eq!(update.buffered, 30);
        assert!(update.result.lf.is_defined());
        assert!(update.result.hf.is_defined());
    }

    #[test]
    fn bad_payload_leaves_state_untouched() {
        let mut monitor = Monitor::new(AnalysisConfig::default());
        assert!(monitor.ingest_payload(&[0x10]).is_err());
        assert!(monitor.buffer().is_empty());
        assert!(monitor.session().is_empty());
    }

    #[test]
    fn notification_without_rr_is_still_recorded() {
        let mut monitor = Monitor::new(AnalysisConfig::default());
        let update = monitor.ingest_payload(&[0x00, 72]).unwrap();
        assert!(update.rr.is_empty());
        assert_eq!(monitor.session().len(), 1);
        assert_eq!(update.to_string(), "HR: 72 BPM | RR: N/A | LF: -- | HF: -- | LF/HF: --");
    }

    #[test]
    fn zero_tick_intervals_are_dropped() {
        let mut monitor = Monitor::new(AnalysisConfig::default());
        let update = monitor
            .ingest_payload(&strap_payload(70, &[0, 1024]))
            .unwrap();
        assert_eq!(update.rr, vec![1.0]);
        assert_eq!(monitor.buffer().snapshot().rr, vec![1.0]);
        assert_eq!(monitor.session().records()[0].rr, vec![1.0]);
    }

    #[test]
    fn flush_due_after_interval_of_recorded_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.txt");
        let mut monitor = Monitor::new(AnalysisConfig::default()).with_flush_interval(2.0);
        assert!(!monitor.ingest_record(60, vec![1.0]).flush_due);
        assert!(monitor.ingest_record(60, vec![1.0]).flush_due);
        monitor.flush(&path).unwrap();
        assert!(!monitor.ingest_record(60, vec![1.0]).flush_due);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn window_follows_configured_span() {
        let config = AnalysisConfig {
            window_span_s: 10.0,
            ..AnalysisConfig::default()
        };
        let mut monitor = Monitor::new(config);
        for _ in 0..20 {
            monitor.ingest_record(60, vec![1.0]);
        }
        assert_eq!(monitor.buffer().len(), 10);
        // 10 intervals never reach the 30 sample minimum
        assert_eq!(monitor.analyze().lf_hf, Measure::Undefined);
        assert_eq!(monitor.session().len(), 20);
    }
}
