//! Plain-text session log.
//!
//! One line per notification: `HR: 63 BPM | RR: 900.4 ms, 959.0 ms`, or
//! `RR: N/A` when the notification carried no intervals. Every flush rewrites
//! the whole file with the full history; a crash during the rewrite can lose
//! everything recorded so far.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::io::text::checked_interval;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub heart_rate: u16,
    /// RR intervals in seconds
    pub rr: Vec<f64>,
}

impl SessionRecord {
    pub fn to_line(&self) -> String {
        format!("HR: {} BPM | RR: {}", self.heart_rate, format_rr_list(&self.rr))
    }
}

/// `900.4 ms, 959.0 ms`, or `N/A` for an empty list.
pub fn format_rr_list(rr: &[f64]) -> String {
    if rr.is_empty() {
        return "N/A".to_string();
    }
    rr.iter()
        .map(|s| format!("{:.1} ms", s * 1000.0))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    records: Vec<SessionRecord>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, heart_rate: u16, rr: Vec<f64>) {
        self.records.push(SessionRecord { heart_rate, rr });
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_line());
            out.push('\n');
        }
        out
    }

    /// Overwrite `path` with the full history.
    pub fn flush(&self, path: &Path) -> Result<()> {
        let file =
            File::create(path).with_context(|| format!("creating session log {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for record in &self.records {
            writeln!(writer, "{}", record.to_line())
                .with_context(|| format!("writing session log {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("writing session log {}", path.display()))?;
        info!(
            "session saved: {} record(s) to {}",
            self.records.len(),
            path.display()
        );
        Ok(())
    }
}

/// Parse a session log back into records (RR values in seconds).
pub fn parse_session_log(text: &str) -> Result<Vec<SessionRecord>> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record =
            parse_line(trimmed).with_context(|| format!("line {}: {}", idx + 1, trimmed))?;
        records.push(record);
    }
    Ok(records)
}

pub fn read_session_log(path: &Path) -> Result<Vec<SessionRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_session_log(&text)
}

fn parse_line(line: &str) -> Result<SessionRecord> {
    let (hr_part, rr_part) = line
        .split_once(" | ")
        .context("expected 'HR: .. | RR: ..'")?;
    let heart_rate: u16 = hr_part
        .strip_prefix("HR: ")
        .and_then(|s| s.strip_suffix(" BPM"))
        .context("malformed heart rate field")?
        .trim()
        .parse()
        .context("heart rate is not an integer")?;
    let rr_list = rr_part
        .strip_prefix("RR: ")
        .context("malformed RR field")?
        .trim();
    let rr = if rr_list == "N/A" {
        Vec::new()
    } else {
        rr_list
            .split(',')
            .map(|item| {
                let item = item.trim();
                let ms = item
                    .strip_suffix("ms")
                    .map(str::trim)
                    .with_context(|| format!("RR value '{}' has no ms suffix", item))?
                    .parse::<f64>()
                    .map_err(anyhow::Error::from)
                    .and_then(checked_interval)
                    .with_context(|| format!("RR value '{}' is not an RR interval", item))?;
                Ok(ms / 1000.0)
            })
            .collect::<Result<Vec<_>>>()?
    };
    Ok(SessionRecord { heart_rate, rr })
}
