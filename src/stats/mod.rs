//! Statistics collection
//!
//! Two levels of statistics live here:
//!
//! - **`Statistics`**: what a single solver reports about its last `solve` call.
//!   The coordinator compares these to break ties and keeps the winner's copy.
//! - **`RaceSummary`** (see `aggregator`): totals over many races, used by the
//!   simulator to report win counts and race wall-time percentiles.
//!
//! # Example
//!
//! ```
//! use metaplan::stats::Statistics;
//! use std::time::Duration;
//!
//! let fast = Statistics::new(Duration::from_secs(1));
//! let slow = Statistics::new(Duration::from_secs(2));
//!
//! assert!(fast.is_faster_than(&slow));
//! assert!(!slow.is_faster_than(&fast));
//! ```

pub mod aggregator;
pub mod histogram;

pub use aggregator::RaceSummary;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistics reported by a solver after a `solve` call
///
/// Only read once the call that produced them has returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Wall time the solver spent planning
    pub total_planning_time: Duration,
}

impl Statistics {
    pub fn new(total_planning_time: Duration) -> Self {
        Self { total_planning_time }
    }

    /// Strictly-less comparison on planning time
    ///
    /// Equal times are not "faster", which is what makes the first-registered
    /// worker win ties.
    pub fn is_faster_than(&self, other: &Statistics) -> bool {
        self.total_planning_time < other.total_planning_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_times_are_not_faster() {
        let a = Statistics::new(Duration::from_millis(1500));
        let b = Statistics::new(Duration::from_millis(1500));
        assert!(!a.is_faster_than(&b));
        assert!(!b.is_faster_than(&a));
    }

    #[test]
    fn test_default_is_zero() {
        assert_eq!(Statistics::default().total_planning_time, Duration::ZERO);
    }
}
