//! # Basic trajectory engine
//!
//! Generates the centre-line motion profile: a sequence of moments along the
//! path, each annotated with distance, velocity, acceleration, heading and
//! time, respecting the robot's velocity and acceleration limits and - for
//! tank drives - the curvature-derated velocity cap.
//!
//! The profile is computed with a two-pass sweep. The forward pass
//! accelerates flat out from the start velocity, capping each sample at its
//! theoretical maximum. The backward pass walks from the end velocity and
//! wherever the forward value is unreachable under the deceleration limit,
//! lowers it symmetrically. Afterwards each step's duration falls out of the
//! kinematic equation `ds = v*dt + a*dt^2/2`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Vector2;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

// Internal
use crate::path::Path;
use crate::specs::{GenParams, RobotSpecs};
use crate::traj::{bracket_by_time, Moment, TrajError};
use util::maths::{self, FloatCmp};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A centre-line trajectory: a shared path plus its generated moments.
///
/// The trajectory assumes a robot with limited speed and acceleration but
/// unlimited jerk. For tank drives the per-sample velocity cap couples to the
/// path's curvature, and the extra per-sample data needed by
/// [`crate::traj::TankTrajectory`] is recorded during generation.
#[derive(Debug, Clone)]
pub struct BasicTrajectory {
    /// The path followed, shared with whoever asks for it
    path: Arc<Path>,

    /// The generated moments, non-decreasing in time and distance
    moments: Vec<Moment>,

    specs: RobotSpecs,
    params: GenParams,

    /// Spline parameter of each sample, recorded for tank trajectories
    path_t: Option<Vec<f64>>,

    /// Signed radius of curvature at each sample, recorded for tank
    /// trajectories
    path_radius: Option<Vec<f64>>,

    /// Chassis facing at the first moment
    init_facing: f64,

    /// True if the robot drives this trajectory backwards
    backwards: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl BasicTrajectory {
    /// Generate a trajectory from the robot's specs and the generation
    /// parameters.
    ///
    /// All configuration is validated before any numeric work; generation is
    /// all-or-nothing, so an infeasible through-velocity constraint aborts
    /// with an error rather than producing a clamped profile.
    pub fn generate(specs: &RobotSpecs, params: &GenParams) -> Result<Self, TrajError> {
        validate(specs, params)?;

        let mut path = Path::new(params.waypoints.clone(), params.alpha, params.curve_type)?;

        // Only read under is_tank, which validation guarantees is set
        let base_width = specs.base_width.unwrap_or(std::f64::NAN);
        if params.is_tank {
            path.set_base_radius(base_width / 2f64);
        }

        let n = params.segment_count;
        let total = path.compute_len(n);
        if !total.is_finite() || total <= 0f64 {
            return Err(TrajError::DegeneratePath);
        }

        let ds = 1f64 / (n - 1) as f64;
        let dist_per_sample = total / (n - 1) as f64;
        let cmp = FloatCmp::default();

        // Intermediate through-velocity constraints, ordered by the arc
        // distance of their waypoint
        let mut constraints: VecDeque<(f64, f64, usize)> = VecDeque::new();
        let wp_dt = 1f64 / (params.waypoints.len() - 1) as f64;
        for i in 1..params.waypoints.len() - 1 {
            if let Some(vel) = params.waypoints[i].velocity {
                let arc_dist = path.t2s(i as f64 * wp_dt)? * total;
                constraints.push_back((arc_dist, vel, i));
            }
        }

        // Per-sample headings and theoretical velocity caps. For tank drives
        // the cap comes from the differential drive kinematics: with the
        // faster wheel saturated at max velocity, the chassis can do at most
        // v_max / (1 + base / 2|r|) at radius r.
        let mut headings = Vec::with_capacity(n);
        let mut max_vels = Vec::with_capacity(n);
        let mut sample_t = Vec::new();
        let mut sample_radius = Vec::new();

        for i in 0..n {
            let t = path.s2t(ds * i as f64)?;
            let deriv = path.deriv_at(t);
            headings.push(deriv[1].atan2(deriv[0]));

            if params.is_tank {
                let second = path.second_deriv_at(t);
                let curv = maths::curvature(deriv[0], second[0], deriv[1], second[1]);
                // Straight samples have zero curvature and infinite radius,
                // which correctly leaves the cap at max velocity
                let radius = 1f64 / curv;
                sample_t.push(t);
                sample_radius.push(radius);
                max_vels
                    .push(specs.max_velocity / (1f64 + base_width / (2f64 * radius.abs())));
            } else {
                max_vels.push(specs.max_velocity);
            }
        }

        // Sample index -> waypoint index of every hard velocity constraint,
        // checked again during the backward pass
        let mut constrained: HashMap<usize, usize> = HashMap::new();

        let first_vel = params.waypoints[0].velocity.unwrap_or(0f64);
        if params.waypoints[0].velocity.is_some() {
            if cmp.gt(first_vel, max_vels[0]) {
                return Err(TrajError::ConstraintUnsatisfiable(0));
            }
            constrained.insert(0, 0);
        }

        let mut moments = Vec::with_capacity(n);
        moments.push(Moment {
            dist: 0f64,
            vel: first_vel,
            accel: 0f64,
            heading: headings[0],
            time: 0f64,
            init_facing: 0f64,
            backwards: false,
        });

        // ---- FORWARD PASS ----

        for i in 1..n {
            let dist = i as f64 * dist_per_sample;
            let prev_vel = moments[i - 1].vel;

            // Apply a waypoint through-velocity once we pass its position
            let constraint = match constraints.front() {
                Some(&(c_dist, _, _)) if dist >= c_dist => constraints.pop_front(),
                _ => None,
            };

            if let Some((_, c_vel, wp_index)) = constraint {
                if cmp.gt(c_vel, max_vels[i]) {
                    return Err(TrajError::ConstraintUnsatisfiable(wp_index));
                }

                if c_vel > prev_vel {
                    // The previous velocity is already the fastest reachable,
                    // so the whole speed-up must fit in this one step
                    let accel =
                        (c_vel * c_vel - prev_vel * prev_vel) / (2f64 * dist_per_sample);
                    if cmp.gt(accel, specs.max_acceleration) {
                        return Err(TrajError::ConstraintUnsatisfiable(wp_index));
                    }
                    moments[i - 1].accel = accel;
                } else {
                    // Slowing into the constraint is the backward pass's job,
                    // which spreads the deceleration over preceding samples
                    moments[i - 1].accel = 0f64;
                }
                moments.push(Moment {
                    dist,
                    vel: c_vel,
                    accel: 0f64,
                    heading: headings[i],
                    time: 0f64,
                    init_facing: 0f64,
                    backwards: false,
                });
                constrained.insert(i, wp_index);
                continue;
            }

            if prev_vel < max_vels[i] {
                // Velocity reached by accelerating flat out over the step
                let reachable = (prev_vel * prev_vel
                    + 2f64 * specs.max_acceleration * dist_per_sample)
                    .sqrt();

                let vel;
                if reachable > max_vels[i] {
                    // Too fast - solve for the acceleration that exactly
                    // reaches the cap instead
                    moments[i - 1].accel = (max_vels[i] * max_vels[i] - prev_vel * prev_vel)
                        / (2f64 * dist_per_sample);
                    vel = max_vels[i];
                } else {
                    moments[i - 1].accel = specs.max_acceleration;
                    vel = reachable;
                }

                moments.push(Moment {
                    dist,
                    vel,
                    accel: 0f64,
                    heading: headings[i],
                    time: 0f64,
                    init_facing: 0f64,
                    backwards: false,
                });
            } else {
                moments[i - 1].accel = 0f64;
                moments.push(Moment {
                    dist,
                    vel: max_vels[i],
                    accel: 0f64,
                    heading: headings[i],
                    time: 0f64,
                    init_facing: 0f64,
                    backwards: false,
                });
            }
        }

        // ---- BACKWARD PASS ----

        let last_vel = params.waypoints[params.waypoints.len() - 1]
            .velocity
            .unwrap_or(0f64);
        if cmp.gt(last_vel, moments[n - 1].vel) || cmp.gt(last_vel, max_vels[n - 1]) {
            return Err(TrajError::ConstraintUnsatisfiable(
                params.waypoints.len() - 1,
            ));
        }
        moments[n - 1].vel = last_vel;
        moments[n - 1].accel = 0f64;

        for i in (0..n - 1).rev() {
            // Only samples faster than their successor need deceleration
            if moments[i].vel > moments[i + 1].vel {
                let next_vel = moments[i + 1].vel;
                let reachable = (next_vel * next_vel
                    + 2f64 * specs.max_acceleration * dist_per_sample)
                    .sqrt();

                if reachable > moments[i].vel {
                    // The forward value is reachable, record the exact
                    // deceleration
                    let accel = (moments[i].vel * moments[i].vel - next_vel * next_vel)
                        / (2f64 * dist_per_sample);
                    moments[i].accel = -accel;
                } else {
                    // Lowering a hard-constrained sample means the
                    // constraint cannot be held within the limits
                    if let Some(&wp_index) = constrained.get(&i) {
                        return Err(TrajError::ConstraintUnsatisfiable(wp_index));
                    }
                    moments[i].vel = reachable;
                    moments[i].accel = -specs.max_acceleration;
                }
            }
        }

        // ---- TIME ASSIGNMENT ----

        for i in 1..n {
            let step = moments[i].dist - moments[i - 1].dist;
            let dt = maths::positive_quadratic_root(
                moments[i - 1].accel / 2f64,
                moments[i - 1].vel,
                -step,
                params.rounding_limit,
            );
            if !dt.is_finite() {
                return Err(TrajError::TimeAssignment(i));
            }
            moments[i].time = moments[i - 1].time + dt;
        }

        let init_facing = maths::restrict_angle(headings[0]);
        for moment in &mut moments {
            moment.init_facing = init_facing;
        }

        debug!(
            "Generated {} moment trajectory: length {:.3}, total time {:.3}",
            n,
            total,
            moments[n - 1].time
        );

        let (path_t, path_radius) = if params.is_tank {
            (Some(sample_t), Some(sample_radius))
        } else {
            (None, None)
        };

        Ok(Self {
            path: Arc::new(path),
            moments,
            specs: *specs,
            params: params.clone(),
            path_t,
            path_radius,
            init_facing,
            backwards: false,
        })
    }

    /// Build a trajectory from already-transformed moments. Used by the
    /// structural transforms, which reuse the computed profile rather than
    /// regenerating it.
    fn derived(
        path: Path,
        mut moments: Vec<Moment>,
        specs: RobotSpecs,
        params: GenParams,
        path_t: Option<Vec<f64>>,
        path_radius: Option<Vec<f64>>,
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
            path_t,
            path_radius,
            init_facing,
            backwards,
        }
    }

    /// The path this trajectory follows.
    ///
    /// The returned handle shares ownership: it stays valid however long the
    /// trajectory itself lives.
    pub fn path(&self) -> Arc<Path> {
        Arc::clone(&self.path)
    }

    /// The generated moments.
    pub fn moments(&self) -> &[Moment] {
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

    /// True if this trajectory was generated for a tank drive.
    pub fn is_tank(&self) -> bool {
        self.params.is_tank
    }

    /// The chassis facing at the start of the trajectory.
    pub fn init_facing(&self) -> f64 {
        self.init_facing
    }

    /// True if the robot drives this trajectory backwards.
    pub fn backwards(&self) -> bool {
        self.backwards
    }

    /// Spline parameter of each sample (tank generation only).
    pub(crate) fn path_t(&self) -> Option<&[f64]> {
        self.path_t.as_deref()
    }

    /// Signed radius of curvature of each sample (tank generation only).
    pub(crate) fn path_radius(&self) -> Option<&[f64]> {
        self.path_radius.as_deref()
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
    pub fn get(&self, time: f64) -> Result<Moment, TrajError> {
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

        // Headings interpolate on the unit circle, not the real line
        let heading = maths::lerp_angle_vec(
            &Vector2::new(m0.heading.cos(), m0.heading.sin()),
            &Vector2::new(m1.heading.cos(), m1.heading.sin()),
            f,
        );

        Ok(Moment {
            dist: maths::lerp(m0.dist, m1.dist, f),
            vel: maths::lerp(m0.vel, m1.vel, f),
            accel: maths::lerp(m0.accel, m1.accel, f),
            heading,
            time,
            init_facing: m0.init_facing,
            backwards: m0.backwards,
        })
    }

    /// Mirror the trajectory left-right: every left turn becomes a right
    /// turn. The profile itself (distances, velocities, times) is unchanged.
    pub fn mirror_left_right(&self) -> BasicTrajectory {
        let path = self.path.mirror_left_right();
        let reference = self.params.waypoints[0].heading;

        let mut moments = self.moments.clone();
        for moment in &mut moments {
            moment.heading = maths::mirror_angle(moment.heading, reference);
        }

        // Every left turn becoming a right turn negates the signed radius
        let path_radius = self
            .path_radius
            .as_ref()
            .map(|radii| radii.iter().map(|r| -r).collect());

        let params = GenParams {
            waypoints: path.waypoints().to_vec(),
            ..self.params.clone()
        };

        Self::derived(
            path,
            moments,
            self.specs,
            params,
            self.path_t.clone(),
            path_radius,
            self.backwards,
        )
    }

    /// Mirror the trajectory front-back: the robot drives the reflected path
    /// backwards, with negated positions, velocities and accelerations.
    pub fn mirror_front_back(&self) -> BasicTrajectory {
        let path = self.path.mirror_front_back();
        let reference = self.params.waypoints[0].heading + std::f64::consts::PI / 2f64;

        let mut moments = self.moments.clone();
        for moment in &mut moments {
            moment.dist = -moment.dist;
            moment.vel = -moment.vel;
            moment.accel = -moment.accel;
            moment.heading = maths::mirror_angle(moment.heading, reference);
        }

        let params = GenParams {
            waypoints: path.waypoints().to_vec(),
            ..self.params.clone()
        };

        Self::derived(
            path,
            moments,
            self.specs,
            params,
            self.path_t.clone(),
            self.path_radius.clone(),
            !self.backwards,
        )
    }

    /// Retrace the trajectory: drive it from the end back to the start,
    /// backwards, with the time sequence reversed.
    pub fn retrace(&self) -> BasicTrajectory {
        let path = self.path.retrace();
        let n = self.moments.len();
        let last = self.moments[n - 1];

        let moments = (0..n)
            .map(|i| {
                let cur = self.moments[n - 1 - i];
                Moment {
                    dist: -(last.dist - cur.dist),
                    vel: -cur.vel,
                    accel: cur.accel,
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

        let path_t = self
            .path_t
            .as_ref()
            .map(|t| t.iter().rev().copied().collect());
        let path_radius = self
            .path_radius
            .as_ref()
            .map(|r| r.iter().rev().copied().collect());

        Self::derived(
            path,
            moments,
            self.specs,
            params,
            path_t,
            path_radius,
            !self.backwards,
        )
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Reject malformed specs and parameters before any numeric work.
fn validate(specs: &RobotSpecs, params: &GenParams) -> Result<(), TrajError> {
    if !specs.max_velocity.is_finite() || specs.max_velocity <= 0f64 {
        return Err(TrajError::InvalidLimit("max velocity"));
    }
    if !specs.max_acceleration.is_finite() || specs.max_acceleration <= 0f64 {
        return Err(TrajError::InvalidLimit("max acceleration"));
    }
    if !params.alpha.is_finite() {
        return Err(TrajError::AlphaNotSet);
    }
    if params.segment_count < 2 {
        return Err(TrajError::InvalidSegmentCount(params.segment_count));
    }
    if !params.rounding_limit.is_finite() || params.rounding_limit < 0f64 {
        return Err(TrajError::InvalidLimit("rounding limit"));
    }

    if params.is_tank {
        match specs.base_width {
            Some(width) if width.is_finite() && width > 0f64 => (),
            _ => return Err(TrajError::BaseWidthNotSet),
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::CurveType;
    use crate::specs::Waypoint;

    const EPS: f64 = 1e-6;

    fn straight_params(segment_count: usize) -> GenParams {
        GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, 0f64),
                Waypoint::new(10f64, 0f64, 0f64),
            ],
            alpha: 5f64,
            segment_count,
            curve_type: CurveType::CubicHermite,
            is_tank: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let specs = RobotSpecs::new(2f64, 1f64);

        // Unset alpha
        let params = GenParams {
            waypoints: straight_params(100).waypoints,
            ..Default::default()
        };
        assert!(matches!(
            BasicTrajectory::generate(&specs, &params),
            Err(TrajError::AlphaNotSet)
        ));

        // Tank without base width
        let params = GenParams {
            is_tank: true,
            ..straight_params(100)
        };
        assert!(matches!(
            BasicTrajectory::generate(&specs, &params),
            Err(TrajError::BaseWidthNotSet)
        ));

        // Too few samples
        let params = GenParams {
            segment_count: 1,
            ..straight_params(100)
        };
        assert!(matches!(
            BasicTrajectory::generate(&specs, &params),
            Err(TrajError::InvalidSegmentCount(1))
        ));

        // Non-positive limits
        let params = straight_params(100);
        assert!(matches!(
            BasicTrajectory::generate(&RobotSpecs::new(0f64, 1f64), &params),
            Err(TrajError::InvalidLimit(_))
        ));
        assert!(matches!(
            BasicTrajectory::generate(&RobotSpecs::new(2f64, std::f64::NAN), &params),
            Err(TrajError::InvalidLimit(_))
        ));

        // Too few waypoints surfaces the path error
        let params = GenParams {
            waypoints: vec![Waypoint::new(0f64, 0f64, 0f64)],
            alpha: 5f64,
            ..Default::default()
        };
        assert!(BasicTrajectory::generate(&specs, &params).is_err());
    }

    #[test]
    fn test_profile_invariants() {
        let specs = RobotSpecs::new(2f64, 1f64);
        let traj = BasicTrajectory::generate(&specs, &straight_params(500)).unwrap();
        let moments = traj.moments();

        // Starts and ends at a standstill, at distance and time zero
        assert_eq!(moments[0].dist, 0f64);
        assert_eq!(moments[0].time, 0f64);
        assert_eq!(moments[0].vel, 0f64);
        assert_eq!(moments[moments.len() - 1].vel, 0f64);
        assert!(traj.total_time() > 0f64);

        for pair in moments.windows(2) {
            assert!(pair[1].time >= pair[0].time);
            assert!(pair[1].dist >= pair[0].dist);
        }

        for moment in moments {
            assert!(moment.vel.abs() <= specs.max_velocity + EPS);
            assert!(moment.accel.abs() <= specs.max_acceleration + EPS);
        }

        // A 10 unit run at these limits has room to cruise at max velocity
        assert!(moments.iter().any(|m| m.vel > specs.max_velocity - 0.01));
    }

    #[test]
    fn test_short_profile_is_triangular() {
        let specs = RobotSpecs::new(2f64, 1f64);
        let params = GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, 0f64),
                Waypoint::new(1f64, 0f64, 0f64),
            ],
            alpha: 0.5,
            segment_count: 500,
            curve_type: CurveType::CubicHermite,
            ..Default::default()
        };
        let traj = BasicTrajectory::generate(&specs, &params).unwrap();

        // One unit is too short to reach max velocity from rest
        let peak = traj
            .moments()
            .iter()
            .map(|m| m.vel)
            .fold(0f64, f64::max);
        assert!(peak < specs.max_velocity);
        assert!(peak > 0f64);
    }

    #[test]
    fn test_get_interpolates() {
        let specs = RobotSpecs::new(2f64, 1f64);
        let traj = BasicTrajectory::generate(&specs, &straight_params(500)).unwrap();

        // Non-finite times are rejected
        assert!(matches!(
            traj.get(std::f64::NAN),
            Err(TrajError::NonFiniteTime(_))
        ));

        // Beyond the end clamps to the last moment
        let last = traj.moments()[traj.moments().len() - 1];
        let clamped = traj.get(traj.total_time() + 10f64).unwrap();
        assert_eq!(clamped.dist, last.dist);
        assert_eq!(clamped.vel, last.vel);

        // Before the start clamps to the first
        let first = traj.get(-1f64).unwrap();
        assert_eq!(first.dist, 0f64);

        // Midway between two samples the distance is between theirs
        let m0 = traj.moments()[10];
        let m1 = traj.moments()[11];
        let mid = traj.get((m0.time + m1.time) / 2f64).unwrap();
        assert!(mid.dist >= m0.dist && mid.dist <= m1.dist);
        assert!(mid.vel >= m0.vel.min(m1.vel) && mid.vel <= m0.vel.max(m1.vel));
    }

    #[test]
    fn test_through_velocity_constraint() {
        let specs = RobotSpecs::new(2f64, 1f64);
        let params = GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, 0f64),
                Waypoint::with_velocity(10f64, 0f64, 0f64, 1f64),
                Waypoint::new(20f64, 0f64, 0f64),
            ],
            alpha: 5f64,
            segment_count: 1000,
            curve_type: CurveType::CubicHermite,
            ..Default::default()
        };
        let traj = BasicTrajectory::generate(&specs, &params).unwrap();

        // The constrained sample holds exactly the requested velocity
        assert!(traj.moments().iter().any(|m| m.vel == 1f64));

        for moment in traj.moments() {
            assert!(moment.accel.abs() <= specs.max_acceleration + EPS);
        }
    }

    #[test]
    fn test_infeasible_through_velocity() {
        // The mid waypoint demands nearly max velocity a short distance from
        // a standing start with a tiny acceleration limit
        let specs = RobotSpecs::new(10f64, 0.1);
        let params = GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, 0f64),
                Waypoint::with_velocity(1f64, 0f64, 0f64, 9f64),
                Waypoint::new(2f64, 0f64, 0f64),
            ],
            alpha: 0.5,
            segment_count: 500,
            curve_type: CurveType::CubicHermite,
            ..Default::default()
        };

        assert!(matches!(
            BasicTrajectory::generate(&specs, &params),
            Err(TrajError::ConstraintUnsatisfiable(1))
        ));
    }

    #[test]
    fn test_mirror_left_right_round_trip() {
        let specs = RobotSpecs::new(2f64, 1f64);
        let params = GenParams {
            waypoints: vec![
                Waypoint::new(0f64, 0f64, std::f64::consts::FRAC_PI_2),
                Waypoint::new(10f64, 10f64, 0f64),
            ],
            alpha: 10f64,
            segment_count: 300,
            curve_type: CurveType::QuinticHermite,
            ..Default::default()
        };
        let traj = BasicTrajectory::generate(&specs, &params).unwrap();
        let double = traj.mirror_left_right().mirror_left_right();

        for (a, b) in traj.moments().iter().zip(double.moments()) {
            assert_eq!(a.dist, b.dist);
            assert_eq!(a.vel, b.vel);
            assert_eq!(a.time, b.time);
            assert!(maths::angle_diff(a.heading, b.heading).abs() < 1e-9);
        }
    }

    #[test]
    fn test_retrace() {
        let specs = RobotSpecs::new(2f64, 1f64);
        let traj = BasicTrajectory::generate(&specs, &straight_params(300)).unwrap();
        let retraced = traj.retrace();

        // Same duration, driven backwards from the far end
        assert!((retraced.total_time() - traj.total_time()).abs() < 1e-9);
        assert!(retraced.backwards());
        assert_eq!(retraced.moments()[0].dist, 0f64);
        assert_eq!(retraced.moments()[0].time, 0f64);
        assert!(retraced.moments().iter().all(|m| m.vel <= 0f64));

        // Retracing twice reproduces the original profile
        let double = retraced.retrace();
        for (a, b) in traj.moments().iter().zip(double.moments()) {
            assert!((a.dist - b.dist).abs() < 1e-9);
            assert!((a.vel - b.vel).abs() < 1e-9);
            assert!((a.time - b.time).abs() < 1e-9);
        }
    }
}
