//! Latency aggregation (windowed mean per category).

use std::sync::{Mutex, MutexGuard};

use pizzapulse_core::protocol::event::LatencyCategory;

/// Duration observations (milliseconds) since the last drain.
#[derive(Debug, Default)]
pub struct LatencySeries {
    samples: Mutex<Vec<f64>>,
}

impl LatencySeries {
    /// Append one observation. Negative values clamp to zero, non-finite ones are
    /// dropped.
    pub fn observe(&self, ms: f64) {
        if !ms.is_finite() {
            return;
        }
        self.lock().push(ms.max(0.0));
    }

    /// Mean of everything observed since the previous drain, or `None` if
    /// nothing was observed. Empties the buffer.
    pub fn drain(&self) -> Option<f64> {
        let samples = std::mem::take(&mut *self.lock());
        mean(&samples)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the Vec half-written, so a
    // poisoned guard is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<f64>> {
        self.samples.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One series per latency category.
#[derive(Debug, Default)]
pub struct LatencyAggregator {
    all: LatencySeries,
    pizza_creation: LatencySeries,
}

impl LatencyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, category: LatencyCategory, ms: f64) {
        self.series(category).observe(ms);
    }

    pub fn drain(&self, category: LatencyCategory) -> Option<f64> {
        self.series(category).drain()
    }

    pub fn series(&self, category: LatencyCategory) -> &LatencySeries {
        match category {
            LatencyCategory::All => &self.all,
            LatencyCategory::PizzaCreation => &self.pizza_creation,
        }
    }
}

fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}
