//! Errors that abort a race
//!
//! Planner failures are not errors: they are resolved by arbitration and show
//! up as `success = false`. Only problems with the race machinery itself end
//! up here.

use crate::coordinator::state::WorkerSlot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RaceError {
    /// The OS refused to start a worker thread
    #[error("failed to spawn {slot} worker thread")]
    Spawn {
        slot: WorkerSlot,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread died outside the guarded solver call
    #[error("{slot} worker thread panicked")]
    WorkerPanicked { slot: WorkerSlot },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_spawn_error_keeps_source() {
        let err = RaceError::Spawn {
            slot: WorkerSlot::Second,
            source: std::io::Error::new(std::io::ErrorKind::WouldBlock, "no threads left"),
        };
        assert_eq!(err.to_string(), "failed to spawn second worker thread");
        assert_eq!(err.source().unwrap().to_string(), "no threads left");
    }
}
