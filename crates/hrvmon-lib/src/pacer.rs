//! Paced-breathing guide.
//!
//! A breath cycle at `rate` breaths per minute lasts `60 / rate` seconds, split
//! evenly between inhale and exhale. Each tick moves the guide position
//! linearly between 0.0 (fully exhaled) and 1.0 (fully inhaled); reaching
//! either end flips the phase.

use serde::Serialize;
use thiserror::Error;

/// Default guide rate, breaths per minute.
pub const DEFAULT_BREATHING_RATE: f64 = 6.0;
/// Animation tick, milliseconds.
pub const DEFAULT_TICK_MS: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum PacerError {
    #[error("breathing rate must be positive, got {0}")]
    InvalidRate(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inhale,
    Exhale,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PacerFrame {
    pub elapsed_ms: f64,
    pub phase: Phase,
    pub position: f64,
}

#[derive(Debug, Clone)]
pub struct BreathingPacer {
    rate: f64,
    tick_ms: f64,
    phase: Phase,
    position: f64,
    phase_elapsed_ms: f64,
    elapsed_ms: f64,
}

impl BreathingPacer {
    pub fn new(rate: f64) -> Result<Self, PacerError> {
        let mut pacer = Self {
            rate: DEFAULT_BREATHING_RATE,
            tick_ms: DEFAULT_TICK_MS,
            phase: Phase::Inhale,
            position: 0.0,
            phase_elapsed_ms: 0.0,
            elapsed_ms: 0.0,
        };
        pacer.set_rate(rate)?;
        Ok(pacer)
    }

    /// Change the rate and restart from the beginning of an inhale.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), PacerError> {
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(PacerError::InvalidRate(rate));
        }
        self.rate = rate;
        self.stop();
        Ok(())
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn cycle_ms(&self) -> f64 {
        60.0 / self.rate * 1000.0
    }

    pub fn inhale_ms(&self) -> f64 {
        self.cycle_ms() / 2.0
    }

    pub fn exhale_ms(&self) -> f64 {
        self.cycle_ms() / 2.0
    }

    /// Reset to the start of an inhale.
    pub fn stop(&mut self) {
        self.phase = Phase::Inhale;
        self.position = 0.0;
        self.phase_elapsed_ms = 0.0;
        self.elapsed_ms = 0.0;
    }

    /// Advance one tick and return the new frame.
    pub fn tick(&mut self) -> PacerFrame {
        self.elapsed_ms += self.tick_ms;
        self.phase_elapsed_ms += self.tick_ms;
        let (duration, next) = match self.phase {
            Phase::Inhale => (self.inhale_ms(), Phase::Exhale),
            Phase::Exhale => (self.exhale_ms(), Phase::Inhale),
        };
        let progress = (self.phase_elapsed_ms / duration).min(1.0);
        self.position = match self.phase {
            Phase::Inhale => progress,
            Phase::Exhale => 1.0 - progress,
        };
        if progress >= 1.0 {
            self.phase = next;
            self.phase_elapsed_ms = 0.0;
        }
        self.frame()
    }

    pub fn frame(&self) -> PacerFrame {
        PacerFrame {
            elapsed_ms: self.elapsed_ms,
            phase: self.phase,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_breaths_per_minute_is_ten_second_cycle() {
        let pacer = BreathingPacer::new(6.0).unwrap();
        assert_eq!(pacer.cycle_ms(), 10_000.0);
        assert_eq!(pacer.inhale_ms(), 5_000.0);
        assert_eq!(pacer.exhale_ms(), 5_000.0);
    }

    #[test]
    fn full_inhale_then_exhale() {
        let mut pacer = BreathingPacer::new(6.0).unwrap();
        // 5000 ms inhale at 50 ms per tick
        for _ in 0..99 {
            assert_eq!(pacer.tick().phase, Phase::Inhale);
        }
        let top = pacer.tick();
        assert_eq!(top.phase, Phase::Exhale);
        assert_eq!(top.position, 1.0);
        for _ in 0..99 {
            pacer.tick();
        }
        let bottom = pacer.tick();
        assert_eq!(bottom.phase, Phase::Inhale);
        assert_eq!(bottom.position, 0.0);
    }

    #[test]
    fn position_stays_in_unit_range() {
        let mut pacer = BreathingPacer::new(7.5).unwrap();
        for _ in 0..1000 {
            let frame = pacer.tick();
            assert!((0.0..=1.0).contains(&frame.position));
        }
    }

    #[test]
    fn stop_resets_to_inhale() {
        let mut pacer = BreathingPacer::new(6.0).unwrap();
        for _ in 0..150 {
            pacer.tick();
        }
        pacer.stop();
        let frame = pacer.frame();
        assert_eq!(frame.phase, Phase::Inhale);
        assert_eq!(frame.position, 0.0);
    }

    #[test]
    fn rejects_non_positive_rate() {
        assert_eq!(
            BreathingPacer::new(0.0).unwrap_err(),
            PacerError::InvalidRate(0.0)
        );
        assert!(BreathingPacer::new(-3.0).is_err());
        assert!(BreathingPacer::new(f64::NAN).is_err());
    }
}
