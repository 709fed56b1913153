//! # Robot specifications and generation parameters
//!
//! The immutable data records consumed by trajectory generation. Units are
//! not prescribed; whatever unit system [`RobotSpecs`] uses is the unit
//! system of every generated quantity.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use crate::path::CurveType;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point the generated path must pass through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    /// X position
    pub x: f64,

    /// Y position
    pub y: f64,

    /// Heading (direction of travel) at this point, in radians
    pub heading: f64,

    /// Velocity the robot must be travelling at when it passes through this
    /// point.
    ///
    /// `None` leaves the velocity unconstrained; the first and last waypoints
    /// then default to a standstill. A `Some` value on an intermediate
    /// waypoint is a hard constraint - generation fails if it cannot be met
    /// within the acceleration limit.
    #[serde(default)]
    pub velocity: Option<f64>,
}

/// The physical limits of the robot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RobotSpecs {
    /// Maximum velocity of the robot
    pub max_velocity: f64,

    /// Maximum acceleration of the robot
    pub max_acceleration: f64,

    /// Distance between the left and right wheels.
    ///
    /// Only required for tank drive trajectories.
    #[serde(default)]
    pub base_width: Option<f64>,
}

/// Parameters controlling trajectory generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenParams {
    /// The waypoints the path must pass through
    pub waypoints: Vec<Waypoint>,

    /// Turn smoothness weight.
    ///
    /// A lower value gives a shorter path with sharper turns at the
    /// waypoints, a higher value a longer path with smoother turns. Must be
    /// set explicitly - the NaN default is rejected at generation.
    pub alpha: f64,

    /// Number of samples ("moments") to generate along the path
    pub segment_count: usize,

    /// The type of curve to fit through the waypoints
    pub curve_type: CurveType,

    /// Whether the trajectory is for a tank (differential) drive.
    ///
    /// Tank trajectories derate the per-sample velocity limit with path
    /// curvature and record the extra data the wheel specializer needs.
    pub is_tank: bool,

    /// Tolerance under which a quadratic discriminant is rounded to zero
    /// during time assignment
    pub rounding_limit: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Waypoint {
    /// Create a new waypoint with an unconstrained velocity.
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading,
            velocity: None,
        }
    }

    /// Create a new waypoint with a through-velocity constraint.
    pub fn with_velocity(x: f64, y: f64, heading: f64, velocity: f64) -> Self {
        Self {
            x,
            y,
            heading,
            velocity: Some(velocity),
        }
    }

    /// The position of this waypoint as a vector.
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// True if all set fields are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.heading.is_finite()
            && self.velocity.map(f64::is_finite).unwrap_or(true)
    }
}

impl RobotSpecs {
    /// Specs for a robot without a differential base.
    pub fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
            base_width: None,
        }
    }

    /// Specs for a tank drive robot.
    pub fn new_tank(max_velocity: f64, max_acceleration: f64, base_width: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
            base_width: Some(base_width),
        }
    }
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            waypoints: Vec::new(),
            alpha: std::f64::NAN,
            segment_count: 1000,
            curve_type: CurveType::QuinticHermite,
            is_tank: false,
            rounding_limit: 1e-6,
        }
    }
}
