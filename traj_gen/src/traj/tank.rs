//! # Tank drive trajectory
//!
//! Specializes a centre-line trajectory into independent left and right
//! wheel streams for a differential drive. Each wheel's velocity is the
//! centre velocity offset by the differential term from the path's
//! instantaneous curvature, and each wheel's distance accumulates the actual
//! displacement of its contact point rather than a velocity-times-time
//! estimate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector2;
use std::sync::Arc;

// Internal
use crate::path::Path;
use crate::specs::{GenParams, RobotSpecs};
use crate::traj::{bracket_by_time, BasicTrajectory, TankMoment, TrajError};
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A trajectory for a tank (differential) drive: a shared path plus one
/// moment sequence with independent left/right wheel kinematics.
#[derive(Debug, Clone)]
pub struct TankTrajectory {
    /// The path followed, shared with whoever asks for it
    path: Arc<Path>,

    /// The generated moments, non-decreasing in time
    moments: Vec<TankMoment>,

    specs: RobotSpecs,
    params: GenParams,

    /// Chassis facing at the first moment
    init_facing: f64,

    /// True if the robot drives this trajectory backwards
    backwards: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TankTrajectory {
    /// Generate a tank trajectory directly from specs and parameters.
    ///
    /// Equivalent to generating a [`BasicTrajectory`] with `is_tank` set and
    /// specializing it.
    pub fn generate(specs: &RobotSpecs, params: &GenParams) -> Result<Self, TrajError> {
        let basic = BasicTrajectory::generate(specs, params)?;
        Self::from_basic(&basic)
    }

    /// Specialize a centre-line trajectory into wheel streams.
    ///
    /// The trajectory must have been generated with `is_tank` set, otherwise
    /// the per-sample curvature data this needs was never recorded.
    pub fn from_basic(traj: &BasicTrajectory) -> Result<Self, TrajError> {
        if !traj.is_tank() {
            return Err(TrajError::NotTank);
        }
        let path_t = traj.path_t().ok_or(TrajError::NotTank)?;
        let path_radius = traj.path_radius().ok_or(TrajError::NotTank)?;

        let specs = *traj.specs();
        let base_width = match specs.base_width {
            Some(width) => width,
            None => return Err(TrajError::BaseWidthNotSet),
        };

        let path = traj.path();
        let basic_moments = traj.moments();
        let n = basic_moments.len();
        let max_vel = specs.max_velocity;
        let init_facing = traj.init_facing();
        let backwards = traj.backwards();

        let mut moments: Vec<TankMoment> = Vec::with_capacity(n);

        // The differential term is zero at a standstill, so a constrained
        // first waypoint velocity splits across the wheels and an
        // unconstrained start leaves both wheels at rest
        let first = basic_moments[0];
        let d = differential(first.vel, path_radius[0], base_width);
        moments.push(TankMoment {
            l_dist: 0f64,
            r_dist: 0f64,
            l_vel: maths::clamp_abs(first.vel - d, max_vel),
            r_vel: maths::clamp_abs(first.vel + d, max_vel),
            l_accel: 0f64,
            r_accel: 0f64,
            heading: first.heading,
            time: 0f64,
            init_facing,
            backwards,
        });

        let mut prev_wheels = path.wheels_at(path_t[0]);

        for i in 1..n {
            let moment = basic_moments[i];
            let wheels = path.wheels_at(path_t[i]);

            // Wheel distances accumulate the contact point displacement,
            // signed by the wheel's direction of rotation
            let mut dl = (wheels.0 - prev_wheels.0).norm();
            let mut dr = (wheels.1 - prev_wheels.1).norm();
            prev_wheels = wheels;

            let d = differential(moment.vel, path_radius[i], base_width);
            let l_vel = maths::clamp_abs(moment.vel - d, max_vel);
            let r_vel = maths::clamp_abs(moment.vel + d, max_vel);

            if l_vel < 0f64 {
                dl = -dl;
            }
            if r_vel < 0f64 {
                dr = -dr;
            }

            let dt = moment.time - basic_moments[i - 1].time;
            moments.push(TankMoment {
                l_dist: moments[i - 1].l_dist + dl,
                r_dist: moments[i - 1].r_dist + dr,
                l_vel,
                r_vel,
                l_accel: 0f64,
                r_accel: 0f64,
                heading: moment.heading,
                time: moment.time,
                init_facing,
                backwards,
            });

            // Each sample's acceleration is the finite difference to the
            // next sample's velocity; the final sample's stays 0
            moments[i - 1].l_accel = (l_vel - moments[i - 1].l_vel) / dt;
            moments[i - 1].r_accel = (r_vel - moments[i - 1].r_vel) / dt;
        }

        debug!(
            "Specialized {} moment tank trajectory, total time {:.3}",
            n,
            moments[n - 1].time
        );

        Ok(Self {
            path,
            moments,
            specs,
            params: traj.params().clone(),
            init_facing,
            backwards,
        })
    }

    /// Build a trajectory from already-transformed moments.
    fn derived(
        path: Path,
        mut moments: Vec<TankMoment>,
        specs: RobotSpecs,
        params: GenParams,
        backwards: bool,
    ) -> Self {
        for moment in &mut moments {
            moment.backwards = backwards;
        }
        let init_facing = moments[0].facing();
        for moment in &mut moments {
            moment.init_facing = init_facing;
        }

        Self {
            path: Arc::new(path),
            moments,
            specs,
            params,
            init_facing,
            backwards,
        }
    }

    /// The path this trajectory follows; the handle shares ownership.
    pub fn path(&self) -> Arc<Path> {
        Arc::clone(&self.path)
    }

    /// The generated moments.
    pub fn moments(&self) -> &[TankMoment] {
        &self.moments
    }

    /// The robot specs this trajectory was generated with.
    pub fn specs(&self) -> &RobotSpecs {
        &self.specs
    }

    /// The parameters this trajectory was generated with.
    pub fn params(&self) -> &GenParams {
        &self.params
    }

    /// The chassis facing at the start of the trajectory.
    pub fn init_facing(&self) -> f64 {
        self.init_facing
    }

    /// True if the robot drives this trajectory backwards.
    pub fn backwards(&self) -> bool {
        self.backwards
    }

    /// Total time taken to drive the trajectory.
    pub fn total_time(&self) -> f64 {
        self.moments[self.moments.len() - 1].time
    }

    /// The moment at the given time, linearly interpolated between the
    /// bracketing samples.
    ///
    /// Times beyond the end clamp to the final moment, times before the
    /// start to the first. Non-finite times are rejected before any lookup.
    pub fn get(&self, time: f64) -> Result<TankMoment, TrajError> {
        if !time.is_finite() {
            return Err(TrajError::NonFiniteTime(time));
        }

        let last = self.moments[self.moments.len() - 1];
        if time >= last.time {
            return Ok(last);
        }
        let first = self.moments[0];
        if time <= first.time {
            return Ok(first);
        }

        let lo = bracket_by_time(self.moments.len(), |i| self.moments[i].time, time);
        let m0 = self.moments[lo];
        let m1 = self.moments[lo + 1];

        if m1.time == m0.time {
            return Ok(m0);
        }
        let f = (time - m0.time) / (m1.time - m0.time);

        let heading = maths::lerp_angle_vec(
            &Vector2::new(m0.heading.cos(), m0.heading.sin()),
            &Vector2::new(m1.heading.cos(), m1.heading.sin()),
            f,
        );

        Ok(TankMoment {
            l_dist: maths::lerp(m0.l_dist, m1.l_dist, f),
            r_dist: maths::lerp(m0.r_dist, m1.r_dist, f),
            l_vel: maths::lerp(m0.l_vel, m1.l_vel, f),
            r_vel: maths::lerp(m0.r_vel, m1.r_vel, f),
            l_accel: maths::lerp(m0.l_accel, m1.l_accel, f),
            r_accel: maths::lerp(m0.r_accel, m1.r_accel, f),
            heading,
            time,
            init_facing: m0.init_facing,
            backwards: m0.backwards,
        })
    }

    /// Mirror the trajectory left-right: the wheel streams swap sides and
    /// every turn reverses direction.
    pub fn mirror_left_right(&self) -> TankTrajectory {
        let path = self.path.mirror_left_right();
        let reference = self.params.waypoints[0].heading;

        let moments = self
            .moments
            .iter()
            .map(|m| TankMoment {
                l_dist: m.r_dist,
                r_dist: m.l_dist,
                l_vel: m.r_vel,
                r_vel: m.l_vel,
                l_accel: m.r_accel,
                r_accel: m.l_accel,
                heading: maths::mirror_angle(m.heading, reference),
                ..*m
            })
            .collect();

        let params = GenParams {
            waypoints: path.waypoints().to_vec(),
            ..self.params.clone()
        };

        Self::derived(path, moments, self.specs, params, self.backwards)
    }

    /// Mirror the trajectory front-back: the robot drives the reflected
    /// path backwards with both wheel streams negated.
    pub fn mirror_front_back(&self) -> TankTrajectory {
        let path = self.path.mirror_front_back();
        let reference = self.params.waypoints[0].heading + std::f64::consts::PI / 2f64;

        let moments = self
            .moments
            .iter()
            .map(|m| TankMoment {
                l_dist: -m.l_dist,
                r_dist: -m.r_dist,
                l_vel: -m.l_vel,
                r_vel: -m.r_vel,
                l_accel: -m.l_accel,
                r_accel: -m.r_accel,
                heading: maths::mirror_angle(m.heading, reference),
                ..*m
            })
            .collect();

        let params = GenParams {
            waypoints: path.waypoints().to_vec(),
            ..self.params.clone()
        };

        Self::derived(path, moments, self.specs, params, !self.backwards)
    }

    /// Retrace the trajectory: drive it from the end back to the start,
    /// backwards, each wheel retracing its own track.
    pub fn retrace(&self) -> TankTrajectory {
        let path = self.path.retrace();
        let n = self.moments.len();
        let last = self.moments[n - 1];

        let moments = (0..n)
            .map(|i| {
                let cur = self.moments[n - 1 - i];
                TankMoment {
                    l_dist: -(last.l_dist - cur.l_dist),
                    r_dist: -(last.r_dist - cur.r_dist),
                    l_vel: -cur.l_vel,
                    r_vel: -cur.r_vel,
                    l_accel: cur.l_accel,
                    r_accel: cur.r_accel,
                    heading: maths::restrict_angle(cur.heading + std::f64::consts::PI),
                    time: last.time - cur.time,
                    init_facing: 0f64,
                    backwards: false,
                }
            })
            .collect();

        let params = GenParams {
            waypoints: path.waypoints().to_vec(),
            ..self.params.clone()
        };

        Self::derived(path, moments, self.specs, params, !self.backwards)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// The differential velocity offset between the centre line and each wheel
/// at the given signed radius of curvature.
///
/// An infinite radius (straight sample) gives a zero offset.
fn differential(vel: f64, radius: f64, base_width: f64) -> f64 {
    vel / radius * (base_width / 2f64)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::CurveType;
    use crate::specs::Waypoint;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-6;

    /// The concrete acceptance scenario: an S curve through three waypoints
    /// on a 1 unit wide tank drive.
    fn s_curve_scenario() -> (RobotSpecs, GenParams) {
        (
            RobotSpecs::new_tank(5f64, 3f64, 1f64),
            GenParams {
                waypoints: vec![
                    Waypoint::new(0f64, 0f64, PI / 2f64),
                    Waypoint::new(10f64, 10f64, PI / 2f64),
                    Waypoint::new(0f64, 20f64, PI),
                ],
                alpha: 20f64,
                segment_count: 1000,
                curve_type: CurveType::QuinticHermite,
                is_tank: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_s_curve_scenario() {
        let (specs, params) = s_curve_scenario();

        let basic = BasicTrajectory::generate(&specs, &params).unwrap();
        let tank = TankTrajectory::from_basic(&basic).unwrap();

        assert!(tank.total_time() > 0f64);
        assert!((tank.total_time() - basic.total_time()).abs() < 1e-9);

        // Both trajectories start from a standstill
        let m = basic.get(0f64).unwrap();
        assert_eq!(m.vel, 0f64);
        let m = tank.get(0f64).unwrap();
        assert_eq!(m.l_vel, 0f64);
        assert_eq!(m.r_vel, 0f64);

        // Wheel velocities never exceed the robot's limit, and the wheels
        // actually differ somewhere on the curve
        let mut differ = false;
        for moment in tank.moments() {
            assert!(moment.l_vel.abs() <= specs.max_velocity + EPS);
            assert!(moment.r_vel.abs() <= specs.max_velocity + EPS);
            if (moment.l_vel - moment.r_vel).abs() > 0.01 {
                differ = true;
            }
        }
        assert!(differ);

        // Time is non-decreasing
        for pair in tank.moments().windows(2) {
            assert!(pair[1].time >= pair[0].time);
        }
    }

    #[test]
    fn test_from_basic_requires_tank() {
        let specs = RobotSpecs::new(5f64, 3f64);
        let params = GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, 0f64),
                Waypoint::new(10f64, 0f64, 0f64),
            ],
            alpha: 5f64,
            segment_count: 200,
            curve_type: CurveType::CubicHermite,
            is_tank: false,
            ..Default::default()
        };
        let basic = BasicTrajectory::generate(&specs, &params).unwrap();

        assert!(matches!(
            TankTrajectory::from_basic(&basic),
            Err(TrajError::NotTank)
        ));
    }

    #[test]
    fn test_straight_wheels_match_centre() {
        let specs = RobotSpecs::new_tank(2f64, 1f64, 0.6);
        let params = GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, 0f64),
                Waypoint::new(10f64, 0f64, 0f64),
            ],
            alpha: 5f64,
            segment_count: 500,
            curve_type: CurveType::CubicHermite,
            is_tank: true,
            ..Default::default()
        };
        let basic = BasicTrajectory::generate(&specs, &params).unwrap();
        let tank = TankTrajectory::from_basic(&basic).unwrap();

        // On a straight path both wheels track the centre line
        for (b, t) in basic.moments().iter().zip(tank.moments()) {
            assert!((t.l_vel - b.vel).abs() < EPS);
            assert!((t.r_vel - b.vel).abs() < EPS);
        }

        let last = &tank.moments()[tank.moments().len() - 1];
        assert!((last.l_dist - 10f64).abs() < 0.05);
        assert!((last.r_dist - 10f64).abs() < 0.05);
    }

    #[test]
    fn test_mirror_left_right_swaps_wheels() {
        let (specs, params) = s_curve_scenario();
        let tank = TankTrajectory::generate(&specs, &params).unwrap();
        let mirrored = tank.mirror_left_right();

        for (a, b) in tank.moments().iter().zip(mirrored.moments()) {
            assert_eq!(a.l_vel, b.r_vel);
            assert_eq!(a.r_vel, b.l_vel);
            assert_eq!(a.l_dist, b.r_dist);
            assert_eq!(a.time, b.time);
        }

        // Mirroring twice gives back the original
        let double = mirrored.mirror_left_right();
        for (a, b) in tank.moments().iter().zip(double.moments()) {
            assert_eq!(a.l_vel, b.l_vel);
            assert_eq!(a.r_vel, b.r_vel);
            assert!(maths::angle_diff(a.heading, b.heading).abs() < 1e-9);
        }
    }

    #[test]
    fn test_retrace_round_trip() {
        let (specs, params) = s_curve_scenario();
        let tank = TankTrajectory::generate(&specs, &params).unwrap();
        let retraced = tank.retrace();

        assert!(retraced.backwards());
        assert!((retraced.total_time() - tank.total_time()).abs() < 1e-9);
        assert_eq!(retraced.moments()[0].l_dist, 0f64);

        let double = retraced.retrace();
        for (a, b) in tank.moments().iter().zip(double.moments()) {
            assert!((a.l_dist - b.l_dist).abs() < 1e-9);
            assert!((a.r_vel - b.r_vel).abs() < 1e-9);
            assert!((a.time - b.time).abs() < 1e-9);
        }
    }

    #[test]
    fn test_get_interpolates() {
        let (specs, params) = s_curve_scenario();
        let tank = TankTrajectory::generate(&specs, &params).unwrap();

        assert!(matches!(
            tank.get(std::f64::NAN),
            Err(TrajError::NonFiniteTime(_))
        ));

        let m0 = tank.moments()[100];
        let m1 = tank.moments()[101];
        let mid = tank.get((m0.time + m1.time) / 2f64).unwrap();
        assert!(mid.l_dist >= m0.l_dist.min(m1.l_dist) - EPS);
        assert!(mid.l_dist <= m0.l_dist.max(m1.l_dist) + EPS);

        // Beyond the end clamps to the final moment
        let clamped = tank.get(tank.total_time() + 1f64).unwrap();
        assert_eq!(clamped.time, tank.total_time());
    }
}
