//! # Moments
//!
//! A moment is one sampled kinematic instant of a trajectory. The heading is
//! the direction of travel; the facing is the direction the chassis points,
//! which differs from the heading by pi when the robot drives backwards.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One sampled instant of a centre-line trajectory.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Moment {
    /// Distance travelled along the path
    pub dist: f64,

    /// Velocity along the path
    pub vel: f64,

    /// Acceleration over the step leaving this moment
    pub accel: f64,

    /// Direction of travel, radians
    pub heading: f64,

    /// Time since the start of the trajectory
    pub time: f64,

    /// The facing of the chassis at the start of the trajectory, radians
    pub init_facing: f64,

    /// True if the robot drives through this moment backwards
    pub backwards: bool,
}

/// One sampled instant of a tank drive trajectory, with independent left and
/// right wheel kinematics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TankMoment {
    /// Distance travelled by the left wheel
    pub l_dist: f64,

    /// Velocity of the left wheel
    pub l_vel: f64,

    /// Acceleration of the left wheel
    pub l_accel: f64,

    /// Distance travelled by the right wheel
    pub r_dist: f64,

    /// Velocity of the right wheel
    pub r_vel: f64,

    /// Acceleration of the right wheel
    pub r_accel: f64,

    /// Direction of travel, radians
    pub heading: f64,

    /// Time since the start of the trajectory
    pub time: f64,

    /// The facing of the chassis at the start of the trajectory, radians
    pub init_facing: f64,

    /// True if the robot drives through this moment backwards
    pub backwards: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Moment {
    /// The absolute facing of the chassis at this moment.
    pub fn facing(&self) -> f64 {
        facing(self.heading, self.backwards)
    }

    /// The facing of the chassis relative to the start of the trajectory.
    ///
    /// This is what a heading sensor zeroed at initialization should read.
    pub fn facing_relative(&self) -> f64 {
        maths::restrict_angle(self.facing() - self.init_facing)
    }
}

impl TankMoment {
    /// The absolute facing of the chassis at this moment.
    pub fn facing(&self) -> f64 {
        facing(self.heading, self.backwards)
    }

    /// The facing of the chassis relative to the start of the trajectory.
    pub fn facing_relative(&self) -> f64 {
        maths::restrict_angle(self.facing() - self.init_facing)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The chassis facing for a travel heading: the heading itself, or its
/// opposite when driving backwards.
fn facing(heading: f64, backwards: bool) -> f64 {
    if backwards {
        maths::restrict_angle(heading + std::f64::consts::PI)
    } else {
        maths::restrict_angle(heading)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
