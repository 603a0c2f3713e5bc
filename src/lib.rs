//! metaplan - race two planning strategies, keep the better answer
//!
//! A `Coordinator` owns two instances of the same `Solver` type, each bound to
//! its own `PlannerParameters`. Every `solve` call runs both on scoped threads
//! against the same scene and request:
//!
//! - **First success wins**: a worker that succeeds while its rival is still
//!   running wins, and the rival is cancelled
//! - **Failures wait**: a failed worker leaves the other as the only chance
//! - **Faster plan wins**: when both succeed, the smaller reported planning
//!   time wins, ties to the first worker
//!
//! The `simulation` module and the `metaplan` binary drive the coordinator
//! with scripted mock planners.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod output;
pub mod simulation;
pub mod solver;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::RaceConfig;
pub use coordinator::state::WorkerSlot;
pub use coordinator::{Coordinator, RaceReport, Resolution};
pub use error::RaceError;
pub use solver::{CancelToken, PlannerParameters, Solver, SolveError, SolveOutcome};
pub use stats::Statistics;

/// Result type used throughout metaplan
pub type Result<T> = anyhow::Result<T>;
