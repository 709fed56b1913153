//! # Trapezoidal motion profile
//!
//! A standalone 1D point-to-point profile for moves that need no curve: the
//! velocity ramps up at the maximum acceleration, cruises, and ramps back
//! down, tracing a trapezoid against time. When the distance is too short to
//! reach the maximum velocity the cruise phase vanishes and the trapezoid
//! degenerates to a triangle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::specs::RobotSpecs;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A trapezoidal velocity profile covering a signed distance from a
/// standstill to a standstill.
#[derive(Debug, Clone, Copy)]
pub struct TrapezoidalProfile {
    /// Magnitude of the distance covered
    dist: f64,

    /// Maximum acceleration
    max_accel: f64,

    /// Velocity held during the cruise phase
    cruise_vel: f64,

    /// Duration of each ramp phase
    t_ramp: f64,

    /// Duration of the cruise phase
    t_cruise: f64,

    /// True if the profile travels in the negative direction
    reverse: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors raised by profile construction and queries.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The specs' limits must be positive finite values.
    #[error("Robot specs must have positive, finite max velocity and acceleration")]
    InvalidSpecs,

    /// The target distance must be finite.
    #[error("Profile distance must be finite, got {0}")]
    NonFiniteDistance(f64),

    /// Profile queries reject NaN and infinite times before any numeric
    /// work.
    #[error("Profile query time must be finite, got {0}")]
    NonFiniteTime(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrapezoidalProfile {
    /// Build the profile covering `distance` within the specs' limits.
    ///
    /// A negative distance produces a profile travelling backwards, with
    /// negated positions, velocities and accelerations.
    pub fn new(specs: &RobotSpecs, distance: f64) -> Result<Self, ProfileError> {
        if !specs.max_velocity.is_finite()
            || specs.max_velocity <= 0f64
            || !specs.max_acceleration.is_finite()
            || specs.max_acceleration <= 0f64
        {
            return Err(ProfileError::InvalidSpecs);
        }
        if !distance.is_finite() {
            return Err(ProfileError::NonFiniteDistance(distance));
        }

        let dist = distance.abs();
        let max_accel = specs.max_acceleration;

        // The velocity reachable at the midpoint bounds the cruise; a short
        // move degenerates to a triangular profile
        let cruise_vel = specs.max_velocity.min((max_accel * dist).sqrt());
        let t_ramp = cruise_vel / max_accel;

        let ramp_dist = cruise_vel * cruise_vel / (2f64 * max_accel);
        let cruise_dist = dist - 2f64 * ramp_dist;
        let t_cruise = if cruise_vel > 0f64 {
            cruise_dist / cruise_vel
        } else {
            0f64
        };

        Ok(Self {
            dist,
            max_accel,
            cruise_vel,
            t_ramp,
            t_cruise,
            reverse: distance < 0f64,
        })
    }

    /// Total time taken to complete the move.
    pub fn total_time(&self) -> f64 {
        2f64 * self.t_ramp + self.t_cruise
    }

    /// Position at the given time; times outside `[0, total_time]` clamp to
    /// the nearest end.
    pub fn position(&self, time: f64) -> Result<f64, ProfileError> {
        let t = self.clamp_time(time)?;

        let pos = if t < self.t_ramp {
            0.5 * self.max_accel * t * t
        } else if t <= self.t_ramp + self.t_cruise {
            let ramp_dist = self.cruise_vel * self.cruise_vel / (2f64 * self.max_accel);
            ramp_dist + self.cruise_vel * (t - self.t_ramp)
        } else {
            // Symmetric to the ramp-up, measured back from the end
            let tau = self.total_time() - t;
            self.dist - 0.5 * self.max_accel * tau * tau
        };

        Ok(self.signed(pos))
    }

    /// Velocity at the given time; times outside `[0, total_time]` clamp to
    /// the nearest end.
    pub fn velocity(&self, time: f64) -> Result<f64, ProfileError> {
        let t = self.clamp_time(time)?;

        let vel = if t < self.t_ramp {
            self.max_accel * t
        } else if t <= self.t_ramp + self.t_cruise {
            self.cruise_vel
        } else {
            self.cruise_vel - self.max_accel * (t - self.t_ramp - self.t_cruise)
        };

        Ok(self.signed(vel))
    }

    /// Acceleration at the given time; times outside `[0, total_time]`
    /// clamp to the nearest end.
    pub fn acceleration(&self, time: f64) -> Result<f64, ProfileError> {
        let t = self.clamp_time(time)?;

        let accel = if t < self.t_ramp {
            self.max_accel
        } else if t <= self.t_ramp + self.t_cruise {
            0f64
        } else {
            -self.max_accel
        };

        Ok(self.signed(accel))
    }

    /// Clamp a query time into the profile, rejecting non-finite input.
    fn clamp_time(&self, time: f64) -> Result<f64, ProfileError> {
        if !time.is_finite() {
            return Err(ProfileError::NonFiniteTime(time));
        }
        Ok(time.max(0f64).min(self.total_time()))
    }

    /// Apply the travel direction's sign.
    fn signed(&self, value: f64) -> f64 {
        if self.reverse {
            -value
        } else {
            value
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-7;

    #[test]
    fn test_endpoints() {
        let specs = RobotSpecs::new(3f64, 2f64);
        let profile = TrapezoidalProfile::new(&specs, 10f64).unwrap();

        assert!(profile.position(0f64).unwrap().abs() < EPS);
        assert!((profile.position(profile.total_time()).unwrap() - 10f64).abs() < EPS);
        assert!(profile.velocity(0f64).unwrap().abs() < EPS);
        assert!(profile.velocity(profile.total_time()).unwrap().abs() < EPS);
        assert!((profile.acceleration(0f64).unwrap() - 2f64).abs() < EPS);
        assert!((profile.acceleration(profile.total_time()).unwrap() + 2f64).abs() < EPS);
    }

    #[test]
    fn test_endpoints_reversed() {
        let specs = RobotSpecs::new(3f64, 2f64);
        let profile = TrapezoidalProfile::new(&specs, -10f64).unwrap();

        assert!(profile.position(0f64).unwrap().abs() < EPS);
        assert!((profile.position(profile.total_time()).unwrap() + 10f64).abs() < EPS);
        assert!(profile.velocity(0f64).unwrap().abs() < EPS);
        assert!(profile.velocity(profile.total_time()).unwrap().abs() < EPS);
        assert!((profile.acceleration(0f64).unwrap() + 2f64).abs() < EPS);
        assert!((profile.acceleration(profile.total_time()).unwrap() - 2f64).abs() < EPS);
    }

    #[test]
    fn test_bounds_everywhere() {
        let specs = RobotSpecs::new(3f64, 2f64);
        let profile = TrapezoidalProfile::new(&specs, 10f64).unwrap();

        let total = profile.total_time();
        for i in 0..=1000 {
            let t = total * i as f64 / 1000f64;

            let pos = profile.position(t).unwrap();
            assert!(pos >= -EPS && pos <= 10f64 + EPS);

            let vel = profile.velocity(t).unwrap();
            assert!(vel >= -EPS && vel <= specs.max_velocity + EPS);

            assert!(profile.acceleration(t).unwrap().abs() <= specs.max_acceleration + EPS);
        }
    }

    #[test]
    fn test_bounds_everywhere_reversed() {
        let specs = RobotSpecs::new(3f64, 2f64);
        let profile = TrapezoidalProfile::new(&specs, -10f64).unwrap();

        let total = profile.total_time();
        for i in 0..=1000 {
            let t = total * i as f64 / 1000f64;

            let pos = profile.position(t).unwrap();
            assert!(pos <= EPS && pos >= -10f64 - EPS);

            let vel = profile.velocity(t).unwrap();
            assert!(vel <= EPS && vel >= -specs.max_velocity - EPS);

            assert!(profile.acceleration(t).unwrap().abs() <= specs.max_acceleration + EPS);
        }
    }

    #[test]
    fn test_triangular_degeneration() {
        // One unit is too short to reach 3 units/s at 2 units/s^2, so the
        // profile never cruises
        let specs = RobotSpecs::new(3f64, 2f64);
        let profile = TrapezoidalProfile::new(&specs, 1f64).unwrap();

        let peak = profile.velocity(profile.total_time() / 2f64).unwrap();
        assert!(peak < specs.max_velocity);
        assert!((peak - 2f64.sqrt()).abs() < 1e-6);
        assert!((profile.position(profile.total_time()).unwrap() - 1f64).abs() < EPS);
    }

    #[test]
    fn test_query_clamping_and_rejection() {
        let specs = RobotSpecs::new(3f64, 2f64);
        let profile = TrapezoidalProfile::new(&specs, 10f64).unwrap();

        // Out of range times clamp to the ends
        assert!((profile.position(-1f64).unwrap()).abs() < EPS);
        assert!((profile.position(profile.total_time() + 5f64).unwrap() - 10f64).abs() < EPS);

        // Non-finite times are rejected
        assert!(matches!(
            profile.position(std::f64::NAN),
            Err(ProfileError::NonFiniteTime(_))
        ));

        // Invalid specs are rejected at construction
        assert!(matches!(
            TrapezoidalProfile::new(&RobotSpecs::new(0f64, 2f64), 1f64),
            Err(ProfileError::InvalidSpecs)
        ));
        assert!(matches!(
            TrapezoidalProfile::new(&specs, std::f64::INFINITY),
            Err(ProfileError::NonFiniteDistance(_))
        ));
    }
}
