//! Solver abstraction
//!
//! A `Solver` is the opaque planning engine the coordinator races. The
//! coordinator never looks inside a plan: it only needs a success flag, a
//! response it can hand back to the caller, and the statistics of the last call
//! so it can break ties.
//!
//! # Contract
//!
//! - One instance serves one worker at a time. The coordinator owns two
//!   instances so the two strategies never share mutable state.
//! - `solve()` must poll the supplied `CancelToken` at reasonable checkpoints and
//!   return `Err(SolveError::Cancelled)` once it reports cancellation.
//! - `last_statistics()` describes the most recent `solve()` call and is only
//!   read after that call returned.
//!
//! # Example
//!
//! ```
//! use metaplan::solver::{CancelToken, PlannerParameters, SolveOutcome, Solver, SolveError};
//! use metaplan::stats::Statistics;
//! use std::time::Instant;
//!
//! /// Succeeds whenever the goal is reachable in one step
//! struct OneStep {
//!     last: Statistics,
//! }
//!
//! impl Solver for OneStep {
//!     type Scene = ();
//!     type Request = (i32, i32);
//!     type Response = Vec<i32>;
//!
//!     fn solve(
//!         &mut self,
//!         _scene: &(),
//!         request: &(i32, i32),
//!         _params: &PlannerParameters,
//!         cancel: &CancelToken,
//!     ) -> Result<SolveOutcome<Vec<i32>>, SolveError> {
//!         let start = Instant::now();
//!         if cancel.is_cancelled() {
//!             return Err(SolveError::Cancelled);
//!         }
//!         let (from, to) = *request;
//!         let outcome = if (to - from).abs() <= 1 {
//!             SolveOutcome::success(vec![from, to])
//!         } else {
//!             SolveOutcome::failure(Vec::new())
//!         };
//!         self.last = Statistics::new(start.elapsed());
//!         Ok(outcome)
//!     }
//!
//!     fn last_statistics(&self) -> Statistics {
//!         self.last
//!     }
//! }
//! ```

pub mod cancel;
pub mod mock;

pub use cancel::CancelToken;

use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Planning engine raced by the coordinator
///
/// Solvers must be `Send` so a worker thread can drive them; scene and request
/// are shared read-only between both workers and therefore must be `Sync`.
pub trait Solver: Send {
    /// Environment the plan is computed in
    type Scene: Sync + ?Sized;

    /// Start state and goal description
    type Request: Sync + ?Sized;

    /// Planner output. `Default` gives each worker an empty result slot.
    type Response: Send + Default;

    /// Run one planning query
    ///
    /// Returns `Ok` with a success flag and response when the planner ran to
    /// completion (including a completed but unsuccessful search).
    ///
    /// # Errors
    ///
    /// - `SolveError::Cancelled` once `cancel` reports cancellation
    /// - `SolveError::Fault` for any other planner error
    fn solve(
        &mut self,
        scene: &Self::Scene,
        request: &Self::Request,
        params: &PlannerParameters,
        cancel: &CancelToken,
    ) -> Result<SolveOutcome<Self::Response>, SolveError>;

    /// Statistics of the most recent `solve()` call
    fn last_statistics(&self) -> Statistics;
}

/// Result of a planner run that completed
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome<R> {
    pub success: bool,
    pub response: R,
}

impl<R> SolveOutcome<R> {
    pub fn success(response: R) -> Self {
        Self {
            success: true,
            response,
        }
    }

    pub fn failure(response: R) -> Self {
        Self {
            success: false,
            response,
        }
    }
}

/// Ways a planner run can end without a result
#[derive(Debug, Error)]
pub enum SolveError {
    /// The run observed its cancel token. Expected when the other worker wins.
    #[error("planning cancelled")]
    Cancelled,

    /// The planner hit an internal error
    #[error("planner fault: {0}")]
    Fault(#[from] anyhow::Error),
}

/// Per-worker planner configuration
///
/// The two workers of a race always get distinct parameter sets; that is the
/// whole point of racing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerParameters {
    /// Human-readable strategy name used in logs and reports
    pub name: String,
    /// Use the breadth-first heuristic instead of the baseline heuristic
    #[serde(default)]
    pub use_bfs: bool,
}

impl PlannerParameters {
    pub fn new(name: impl Into<String>, use_bfs: bool) -> Self {
        Self {
            name: name.into(),
            use_bfs,
        }
    }

    /// Accelerated strategy raced first by default
    pub fn bfs() -> Self {
        Self::new("bfs", true)
    }

    /// Baseline strategy raced second by default
    pub fn no_bfs() -> Self {
        Self::new("no_bfs", false)
    }
}
