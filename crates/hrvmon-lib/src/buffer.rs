//! Time-bounded buffer of RR intervals.
//!
//! The buffer keeps the most recent intervals whose raw sum fits in a window
//! span. Eviction is by insertion order: after every append the oldest value is
//! dropped while the sum exceeds the span, whatever that value's magnitude.

use std::collections::VecDeque;

use log::debug;

use crate::signal::RRSeries;

/// Default window span in seconds.
pub const DEFAULT_WINDOW_SPAN_S: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct IntervalBuffer {
    data: VecDeque<f64>,
    span_s: f64,
}

impl IntervalBuffer {
    pub fn new(span_s: f64) -> Self {
        Self {
            data: VecDeque::new(),
            span_s,
        }
    }

    /// Append intervals (seconds) in order, then evict from the front until the
    /// sum fits the span. A single value larger than the span is kept alone.
    pub fn append(&mut self, values: &[f64]) {
        self.data.extend(values.iter().copied());
        let mut evicted = 0usize;
        // Running sum for the bulk of the eviction, kept clear of the boundary
        // by its worst-case rounding drift.
        let mut running = self.total();
        let drift = f64::EPSILON * running.abs() * (self.data.len() as f64 + 1.0);
        while self.data.len() > 1 && running - self.span_s > drift {
            if let Some(front) = self.data.pop_front() {
                running -= front;
                evicted += 1;
            }
        }
        while self.data.len() > 1 && self.total() > self.span_s {
            self.data.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(
                "evicted {} interval(s), {} remain covering {:.3}s",
                evicted,
                self.data.len(),
                self.total()
            );
        }
    }

    /// Ordered copy of the current contents.
    pub fn snapshot(&self) -> RRSeries {
        RRSeries {
            rr: self.data.iter().copied().collect(),
        }
    }

    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn span(&self) -> f64 {
        self.span_s
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl Default for IntervalBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SPAN_S)
    }
}
