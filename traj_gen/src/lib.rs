//! # Trajectory generation and following for wheeled robots
//!
//! This library plans and follows motion for wheeled mobile robots. Given the
//! robot's physical limits and an ordered set of waypoints it:
//!
//! - fits a smooth parametric curve through the waypoints,
//! - re-parameterizes the curve by arc length,
//! - derives a velocity/acceleration profile along the curve via a
//!   forward-acceleration/backward-deceleration sweep respecting the
//!   velocity, acceleration and curvature limits,
//! - specializes that profile into independent left/right wheel streams
//!   for differential ("tank") drives,
//! - provides a real-time follower that samples the plan each control
//!   cycle and computes bounded motor commands from feedforward plus
//!   feedback terms.
//!
//! The library never runs the robot's main loop. The host drives the
//! [`follower::TankFollower`] from its own periodic loop, supplying sensor
//! readings through closures and consuming motor outputs through sinks.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Robot specifications and generation parameter records
pub mod specs;

/// Paths - smooth parametric curves through the waypoints, with arc length
/// parameterization
pub mod path;

/// Trajectories - time/velocity/acceleration-annotated paths
pub mod traj;

/// Trajectory follower - the per-cycle control loop decision function
pub mod follower;

/// Standalone 1D point-to-point motion profiles
pub mod profile;
