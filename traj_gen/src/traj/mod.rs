//! # Trajectory module
//!
//! Trajectories annotate a path with time: a sequence of "moments", each
//! holding the position, velocity, acceleration, heading and time the robot
//! should have at one sampled instant. [`BasicTrajectory`] generates the
//! centre-line profile with the two-pass sweep; [`TankTrajectory`]
//! specializes it into independent left/right wheel streams.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod basic;
pub mod moment;
pub mod tank;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::path::PathError;

pub use basic::BasicTrajectory;
pub use moment::{Moment, TankMoment};
pub use tank::TankTrajectory;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors raised by trajectory generation and queries.
#[derive(Debug, thiserror::Error)]
pub enum TrajError {
    /// Error propagated from the underlying path.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Alpha was left at its NaN default or explicitly set to a non-finite
    /// value.
    #[error("Alpha is not set, or is not finite")]
    AlphaNotSet,

    /// Tank trajectories need the robot's base width.
    #[error("A tank trajectory requires the robot's base width")]
    BaseWidthNotSet,

    /// The specs' limits must be positive finite values.
    #[error("Robot {0} must be positive and finite")]
    InvalidLimit(&'static str),

    /// At least two samples are needed for a single profile step.
    #[error("Segment count must be at least 2, got {0}")]
    InvalidSegmentCount(usize),

    /// The generated path had zero or non-finite arc length, usually caused
    /// by coincident waypoints.
    #[error("Generated path has zero or non-finite length")]
    DegeneratePath,

    /// A waypoint through-velocity cannot be met within the robot's
    /// acceleration and curvature limits. Generation is all-or-nothing, so
    /// nothing is returned.
    #[error("Through-velocity constraint on waypoint {0} cannot be met")]
    ConstraintUnsatisfiable(usize),

    /// The kinematic step equation had no finite duration solution for a
    /// sample, which indicates a degenerate profile (e.g. a demanded full
    /// stop in the middle of the path).
    #[error("Could not assign a finite time to sample {0}")]
    TimeAssignment(usize),

    /// Attempted to specialize a trajectory that was not generated with
    /// `is_tank` set.
    #[error("Trajectory was not generated for a tank drive")]
    NotTank,

    /// Trajectory queries reject NaN and infinite times before any numeric
    /// work.
    #[error("Trajectory query time must be finite, got {0}")]
    NonFiniteTime(f64),
}

// ---------------------------------------------------------------------------
// CRATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the index of the last moment whose time is no greater than `time`.
///
/// `time_at` maps a moment index to its timestamp; the sequence must be
/// non-decreasing. The returned index is always below `len - 1`, so `index`
/// and `index + 1` bracket the query.
pub(crate) fn bracket_by_time<F>(len: usize, time_at: F, time: f64) -> usize
where
    F: Fn(usize) -> f64,
{
    let mut lo = 0;
    let mut hi = len - 1;

    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if time_at(mid) <= time {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    lo
}
