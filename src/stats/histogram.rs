//! Race wall-time histogram using HdrHistogram
//!
//! Tracks how long complete races took (from `solve()` entry to return) across
//! repeated simulated runs.
//!
//! # Example
//!
//! ```
//! use metaplan::stats::histogram::RaceTimeHistogram;
//! use std::time::Duration;
//!
//! let mut hist = RaceTimeHistogram::new()?;
//! hist.record(Duration::from_millis(50));
//! hist.record(Duration::from_millis(70));
//!
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(50.0).is_some());
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::Result;
use anyhow::Context;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Highest trackable value: 1 hour in microseconds
const MAX_MICROS: u64 = 3_600_000_000;

/// Wall-time histogram with microsecond resolution
///
/// Configured for 1us to 1 hour with 3 significant digits. Values outside the
/// range are clamped.
#[derive(Debug, Clone)]
pub struct RaceTimeHistogram {
    histogram: Histogram<u64>,
}

impl RaceTimeHistogram {
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, MAX_MICROS, 3)
            .context("Failed to create race time histogram")?;
        Ok(Self { histogram })
    }

    /// Record one race duration
    #[inline]
    pub fn record(&mut self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros())
            .unwrap_or(u64::MAX)
            .clamp(1, MAX_MICROS);
        // Clamped above, so out-of-range cannot happen
        let _ = self.histogram.record(micros);
    }

    /// Value at `percentile` (0.0 - 100.0), `None` if empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_micros(self.histogram.mean() as u64))
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }
}
