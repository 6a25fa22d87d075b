//! Heart Rate Measurement notification payloads.
//!
//! Layout: one flags byte, the heart rate (u8, or LE u16 when flag bit 0 is
//! set), an optional LE u16 energy-expended field (bit 3), then LE u16 RR
//! intervals (bit 4) until the end of the payload. RR values are counted in
//! 1/1024 s, so seconds = raw / 1024 (not 1000).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RR ticks per second in the payload.
pub const RR_TICKS_PER_SECOND: f64 = 1024.0;

const FLAG_HR_U16: u8 = 0x01;
const FLAG_CONTACT_DETECTED: u8 = 0x02;
const FLAG_CONTACT_SUPPORTED: u8 = 0x04;
const FLAG_ENERGY_PRESENT: u8 = 0x08;
const FLAG_RR_PRESENT: u8 = 0x10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty payload")]
    Empty,
    #[error("payload too short for heart rate field ({len} bytes)")]
    TruncatedHeartRate { len: usize },
    #[error("payload too short for energy expended field ({len} bytes)")]
    TruncatedEnergy { len: usize },
    #[error("odd trailing byte in RR section ({len} bytes)")]
    DanglingRrByte { len: usize },
    #[error("invalid hex payload: {0}")]
    InvalidHex(String),
}

/// One decoded notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Beats per minute as reported by the sensor
    pub heart_rate: u16,
    /// `None` when the sensor does not report skin contact
    pub contact: Option<bool>,
    /// Kilojoules, when present
    pub energy_expended: Option<u16>,
    /// RR intervals in seconds
    pub rr: Vec<f64>,
}

impl HeartRateSample {
    /// Encode with the minimal flag set needed for the fields present.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut flags = FLAG_RR_PRESENT;
        let mut out = vec![0u8];
        if self.heart_rate > u8::MAX as u16 {
            flags |= FLAG_HR_U16;
            out.extend_from_slice(&self.heart_rate.to_le_bytes());
        } else {
            out.push(self.heart_rate as u8);
        }
        if let Some(contact) = self.contact {
            flags |= FLAG_CONTACT_SUPPORTED;
            if contact {
                flags |= FLAG_CONTACT_DETECTED;
            }
        }
        if let Some(energy) = self.energy_expended {
            flags |= FLAG_ENERGY_PRESENT;
            out.extend_from_slice(&energy.to_le_bytes());
        }
        for rr in &self.rr {
            let ticks = (rr * RR_TICKS_PER_SECOND).round().clamp(0.0, u16::MAX as f64) as u16;
            out.extend_from_slice(&ticks.to_le_bytes());
        }
        out[0] = flags;
        out
    }
}

/// Decode a Heart Rate Measurement payload.
pub fn decode_heart_rate(payload: &[u8]) -> Result<HeartRateSample, DecodeError> {
    let (&flags, rest) = payload.split_first().ok_or(DecodeError::Empty)?;

    let (heart_rate, rest) = if flags & FLAG_HR_U16 != 0 {
        split_u16(rest).ok_or(DecodeError::TruncatedHeartRate {
            len: payload.len(),
        })?
    } else {
        let (&hr, rest) = rest.split_first().ok_or(DecodeError::TruncatedHeartRate {
            len: payload.len(),
        })?;
        (hr as u16, rest)
    };

    let contact = if flags & FLAG_CONTACT_SUPPORTED != 0 {
        Some(flags & FLAG_CONTACT_DETECTED != 0)
    } else {
        None
    };

    let (energy_expended, rest) = if flags & FLAG_ENERGY_PRESENT != 0 {
        let (energy, rest) = split_u16(rest).ok_or(DecodeError::TruncatedEnergy {
            len: payload.len(),
        })?;
        (Some(energy), rest)
    } else {
        (None, rest)
    };

    let mut rr = Vec::new();
    if flags & FLAG_RR_PRESENT != 0 {
        if rest.len() % 2 != 0 {
            return Err(DecodeError::DanglingRrByte { len: payload.len() });
        }
        rr.extend(
            rest.chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]) as f64 / RR_TICKS_PER_SECOND),
        );
    }

    Ok(HeartRateSample {
        heart_rate,
        contact,
        energy_expended,
        rr,
    })
}

fn split_u16(bytes: &[u8]) -> Option<(u16, &[u8])> {
    if bytes.len() < 2 {
        return None;
    }
    let (head, rest) = bytes.split_at(2);
    Some((u16::from_le_bytes([head[0], head[1]]), rest))
}

/// Parse a hex dump such as `10 3f 9a 03`, `10:3f:9a:03` or `0x103f9a03`.
pub fn parse_hex_payload(text: &str) -> Result<Vec<u8>, DecodeError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = body
        .bytes()
        .filter(|b| !matches!(b, b' ' | b':' | b'-' | b'\t'))
        .collect();
    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(DecodeError::InvalidHex(trimmed.to_string()));
    }
    digits
        .chunks_exact(2)
        .map(|pair| {
            let hi = hex_digit(pair[0]);
            let lo = hex_digit(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok(hi << 4 | lo),
                _ => Err(DecodeError::InvalidHex(trimmed.to_string())),
            }
        })
        .collect()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Lowercase, space separated hex dump.
pub fn to_hex(payload: &[u8]) -> String {
    payload
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
