//! # Trajectory follower
//!
//! The follower is the real-time half of the library: a per-cycle decision
//! function the host calls from its own periodic loop. Each cycle it samples
//! the trajectory at the elapsed time, compares the plan to the measured
//! wheel distances and chassis direction, and writes bounded commands to the
//! motor sinks.
//!
//! The output of each wheel is a feedforward term from the planned velocity
//! and acceleration plus feedback terms from the position, derivative and
//! heading errors, clamped to `[-1, 1]`. Sensors are optional: a follower
//! built without distance or direction sources runs pure feedforward with
//! those error terms held at zero.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::warn;
use serde::{Deserialize, Serialize};

// Internal
use crate::traj::TankTrajectory;
use util::maths;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Sink accepting a motor command in `[-1, 1]`.
pub type MotorSink = Box<dyn FnMut(f64)>;

/// Source of a cumulative wheel distance, in the units of the robot specs.
pub type DistanceSource = Box<dyn Fn() -> f64>;

/// Source of the chassis direction, in radians.
pub type DirectionSource = Box<dyn Fn() -> f64>;

/// Source of a monotonic timestamp, in seconds.
pub type TimestampSource = Box<dyn Fn() -> f64>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The follower's feedback loop gains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Gains {
    /// Velocity feedforward
    pub k_v: f64,

    /// Acceleration feedforward
    pub k_a: f64,

    /// Proportional gain on the wheel position error
    pub k_p: f64,

    /// Derivative gain on the wheel position error
    pub k_d: f64,

    /// Directional-proportional gain on the heading error, subtracted from
    /// the left output and added to the right
    pub k_dp: f64,
}

/// Follows a tank drive trajectory in real time.
///
/// The lifecycle is an explicit state machine: idle until
/// [`TankFollower::initialize`] captures the sensor baselines, running while
/// the elapsed time is within the trajectory, finished - stickily - once it
/// is beyond it. [`TankFollower::stop`] forces not-running at any point
/// without touching the finished flag.
pub struct TankFollower {
    traj: TankTrajectory,

    left_motor: MotorSink,
    right_motor: MotorSink,
    left_dist: Option<DistanceSource>,
    right_dist: Option<DistanceSource>,
    direction: Option<DirectionSource>,
    timestamp: TimestampSource,

    gains: Gains,

    running: bool,
    finished: bool,

    /// Timestamp captured at initialization
    init_time: f64,

    /// Timestamp of the previous cycle, for the derivative term
    last_time: f64,

    /// Wheel position errors of the previous cycle
    last_left_err: f64,
    last_right_err: f64,

    /// Wheel distances captured at initialization
    init_left_dist: f64,
    init_right_dist: f64,

    /// Chassis direction captured at initialization
    init_direction: f64,

    /// Last cycle diagnostics
    last_dir_err: f64,
    last_left_output: f64,
    last_right_output: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Gains {
    /// Gains for a full feedback follower.
    pub fn new(k_v: f64, k_a: f64, k_p: f64, k_d: f64, k_dp: f64) -> Self {
        Self {
            k_v,
            k_a,
            k_p,
            k_d,
            k_dp,
        }
    }

    /// Gains for a pure feedforward follower.
    pub fn feedforward(k_v: f64, k_a: f64) -> Self {
        Self::new(k_v, k_a, 0f64, 0f64, 0f64)
    }
}

impl TankFollower {
    /// Create a new follower over the given trajectory.
    ///
    /// Without distance or direction sources the follower runs pure
    /// feedforward; attach sensors with
    /// [`TankFollower::with_distance_sources`] and
    /// [`TankFollower::with_direction_source`].
    pub fn new(
        traj: TankTrajectory,
        left_motor: MotorSink,
        right_motor: MotorSink,
        timestamp: TimestampSource,
        gains: Gains,
    ) -> Self {
        Self {
            traj,
            left_motor,
            right_motor,
            left_dist: None,
            right_dist: None,
            direction: None,
            timestamp,
            gains,
            running: false,
            finished: false,
            init_time: 0f64,
            last_time: 0f64,
            last_left_err: 0f64,
            last_right_err: 0f64,
            init_left_dist: 0f64,
            init_right_dist: 0f64,
            init_direction: 0f64,
            last_dir_err: 0f64,
            last_left_output: 0f64,
            last_right_output: 0f64,
        }
    }

    /// Attach cumulative distance sources for the left and right wheels,
    /// enabling the proportional and derivative feedback terms.
    pub fn with_distance_sources(mut self, left: DistanceSource, right: DistanceSource) -> Self {
        self.left_dist = Some(left);
        self.right_dist = Some(right);
        self
    }

    /// Attach a chassis direction source, enabling the
    /// directional-proportional feedback term.
    pub fn with_direction_source(mut self, direction: DirectionSource) -> Self {
        self.direction = Some(direction);
        self
    }

    /// True if the follower has been initialized and neither completed the
    /// trajectory nor been stopped.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once a `run` cycle has seen the elapsed time pass the end of the
    /// trajectory. Sticky: further cycles never re-initialize.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Capture the sensor baselines and enter the running state.
    ///
    /// Does nothing if the follower is already running.
    pub fn initialize(&mut self) {
        if self.running {
            return;
        }

        if let (Some(left), Some(right)) = (&self.left_dist, &self.right_dist) {
            self.init_left_dist = left();
            self.init_right_dist = right();
        }
        if let Some(direction) = &self.direction {
            self.init_direction = direction();
        }

        self.init_time = (self.timestamp)();
        self.last_time = self.init_time;
        self.last_left_err = 0f64;
        self.last_right_err = 0f64;

        self.running = true;
    }

    /// Run one cycle of the control loop.
    ///
    /// Initializes first if the follower is idle. Once the elapsed time
    /// passes the end of the trajectory the outputs are zeroed, the follower
    /// finishes, and subsequent calls do nothing.
    pub fn run(&mut self) {
        if self.finished {
            return;
        }
        if !self.running {
            self.initialize();
        }

        let timestamp = (self.timestamp)();
        if !timestamp.is_finite() {
            warn!("Follower timestamp source returned {}, stopping", timestamp);
            self.stop();
            return;
        }

        let dt = timestamp - self.last_time;
        let elapsed = timestamp - self.init_time;

        if elapsed > self.traj.total_time() {
            self.finish();
            return;
        }

        // Elapsed is finite here, so the sample cannot fail
        let moment = match self.traj.get(elapsed) {
            Ok(m) => m,
            Err(_) => {
                self.finish();
                return;
            }
        };

        let mut left_err = 0f64;
        let mut right_err = 0f64;
        let mut left_deriv = 0f64;
        let mut right_deriv = 0f64;
        let mut dir_err = 0f64;

        if let (Some(left), Some(right)) = (&self.left_dist, &self.right_dist) {
            left_err = moment.l_dist - (left() - self.init_left_dist);
            right_err = moment.r_dist - (right() - self.init_right_dist);

            // Differentiating the error rather than the measurement, then
            // subtracting the planned velocity, avoids amplifying raw
            // measurement noise
            if dt > 0f64 {
                left_deriv = (left_err - self.last_left_err) / dt - moment.l_vel;
                right_deriv = (right_err - self.last_right_err) / dt - moment.r_vel;
            }
        }

        if let Some(direction) = &self.direction {
            // Positive when the robot needs to turn anticlockwise
            let measured = maths::restrict_angle(direction() - self.init_direction);
            dir_err = maths::angle_diff(measured, moment.facing_relative());
        }

        let left_output = (self.gains.k_a * moment.l_accel
            + self.gains.k_v * moment.l_vel
            + self.gains.k_p * left_err
            + self.gains.k_d * left_deriv
            - self.gains.k_dp * dir_err)
            .max(-1f64)
            .min(1f64);
        let right_output = (self.gains.k_a * moment.r_accel
            + self.gains.k_v * moment.r_vel
            + self.gains.k_p * right_err
            + self.gains.k_d * right_deriv
            + self.gains.k_dp * dir_err)
            .max(-1f64)
            .min(1f64);

        (self.left_motor)(left_output);
        (self.right_motor)(right_output);

        self.last_time = timestamp;
        self.last_left_err = left_err;
        self.last_right_err = right_err;
        self.last_dir_err = dir_err;
        self.last_left_output = left_output;
        self.last_right_output = right_output;
    }

    /// Zero the outputs and force the follower out of the running state.
    ///
    /// Idempotent, and independent of the finished flag: stopping neither
    /// sets nor clears it.
    pub fn stop(&mut self) {
        (self.left_motor)(0f64);
        (self.right_motor)(0f64);
        self.running = false;
    }

    /// Transition running -> finished at the end of the trajectory.
    fn finish(&mut self) {
        (self.left_motor)(0f64);
        (self.right_motor)(0f64);
        self.running = false;
        self.finished = true;
        self.last_left_output = 0f64;
        self.last_right_output = 0f64;
    }

    /// The last cycle's left wheel position error.
    pub fn last_left_error(&self) -> f64 {
        self.last_left_err
    }

    /// The last cycle's right wheel position error.
    pub fn last_right_error(&self) -> f64 {
        self.last_right_err
    }

    /// The last cycle's directional error.
    pub fn last_direction_error(&self) -> f64 {
        self.last_dir_err
    }

    /// The last output written to the left motor.
    pub fn last_left_output(&self) -> f64 {
        self.last_left_output
    }

    /// The last output written to the right motor.
    pub fn last_right_output(&self) -> f64 {
        self.last_right_output
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::CurveType;
    use crate::specs::{GenParams, RobotSpecs, Waypoint};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared state standing in for the robot's clock, encoders and motors.
    #[derive(Default)]
    struct Rig {
        time: Rc<RefCell<f64>>,
        left_out: Rc<RefCell<f64>>,
        right_out: Rc<RefCell<f64>>,
    }

    fn test_trajectory() -> TankTrajectory {
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
        TankTrajectory::generate(&specs, &params).unwrap()
    }

    fn feedforward_follower(gains: Gains) -> (TankFollower, Rig) {
        let rig = Rig::default();

        let time = Rc::clone(&rig.time);
        let left = Rc::clone(&rig.left_out);
        let right = Rc::clone(&rig.right_out);

        let follower = TankFollower::new(
            test_trajectory(),
            Box::new(move |v| *left.borrow_mut() = v),
            Box::new(move |v| *right.borrow_mut() = v),
            Box::new(move || *time.borrow()),
            gains,
        );

        (follower, rig)
    }

    #[test]
    fn test_state_machine() {
        let (mut follower, rig) = feedforward_follower(Gains::feedforward(0.4, 0.1));
        let total_time = follower.traj.total_time();

        // New follower is neither running nor finished
        assert!(!follower.is_running());
        assert!(!follower.is_finished());

        follower.initialize();
        assert!(follower.is_running());
        assert!(!follower.is_finished());

        // Initializing again is a no-op
        follower.initialize();
        assert!(follower.is_running());

        // Mid-trajectory cycles stay running
        *rig.time.borrow_mut() = total_time / 2f64;
        follower.run();
        assert!(follower.is_running());
        assert!(!follower.is_finished());

        // Past the end the follower finishes and zeroes the motors
        *rig.time.borrow_mut() = total_time + 0.1;
        follower.run();
        assert!(!follower.is_running());
        assert!(follower.is_finished());
        assert_eq!(*rig.left_out.borrow(), 0f64);
        assert_eq!(*rig.right_out.borrow(), 0f64);

        // Finished is sticky: further cycles never re-initialize
        *rig.time.borrow_mut() = total_time + 10f64;
        follower.run();
        assert!(!follower.is_running());
        assert!(follower.is_finished());

        // Stop keeps the finished flag
        follower.stop();
        assert!(!follower.is_running());
        assert!(follower.is_finished());
    }

    #[test]
    fn test_stop_midway() {
        let (mut follower, rig) = feedforward_follower(Gains::feedforward(0.4, 0.1));

        follower.initialize();
        *rig.time.borrow_mut() = 0.5;
        follower.run();
        assert!(follower.is_running());

        follower.stop();
        assert!(!follower.is_running());
        assert!(!follower.is_finished());
        assert_eq!(*rig.left_out.borrow(), 0f64);

        // Stop is idempotent
        follower.stop();
        assert!(!follower.is_running());
    }

    #[test]
    fn test_feedforward_outputs() {
        let (mut follower, rig) = feedforward_follower(Gains::feedforward(0.45, 0f64));

        follower.initialize();

        // During the cruise the planned wheel velocity is the robot's max,
        // so the output is kV times it
        let cruise_time = follower.traj.total_time() / 2f64;
        *rig.time.borrow_mut() = cruise_time;
        follower.run();

        assert!((*rig.left_out.borrow() - 0.45 * 2f64).abs() < 0.05);
        assert!((*rig.right_out.borrow() - 0.45 * 2f64).abs() < 0.05);

        // Outputs are always bounded
        assert!(rig.left_out.borrow().abs() <= 1f64);
        assert!(rig.right_out.borrow().abs() <= 1f64);
    }

    #[test]
    fn test_feedback_corrects_lag() {
        let rig = Rig::default();

        let time = Rc::clone(&rig.time);
        let left = Rc::clone(&rig.left_out);
        let right = Rc::clone(&rig.right_out);

        // Encoders stuck at zero: the robot has not moved at all
        let mut follower = TankFollower::new(
            test_trajectory(),
            Box::new(move |v| *left.borrow_mut() = v),
            Box::new(move |v| *right.borrow_mut() = v),
            Box::new(move || *time.borrow()),
            Gains::new(0f64, 0f64, 0.5, 0f64, 0f64),
        )
        .with_distance_sources(Box::new(|| 0f64), Box::new(|| 0f64));

        follower.initialize();

        // Midway the plan expects several units of travel, so a stuck robot
        // sees a large positive error on both wheels
        let mid = follower.traj.total_time() / 2f64;
        *rig.time.borrow_mut() = mid;
        follower.run();

        assert!(follower.last_left_error() > 1f64);
        assert!(follower.last_right_error() > 1f64);
        assert!(*rig.left_out.borrow() > 0f64);
        assert!(*rig.right_out.borrow() > 0f64);
    }

    #[test]
    fn test_heading_feedback_differential() {
        let rig = Rig::default();

        let time = Rc::clone(&rig.time);
        let left = Rc::clone(&rig.left_out);
        let right = Rc::clone(&rig.right_out);

        // The robot drifts 0.1 rad anticlockwise of the plan on a straight
        // path, so it should speed up the left side and slow the right to
        // turn back clockwise
        let direction = Rc::new(RefCell::new(0f64));
        let dir_source = Rc::clone(&direction);

        let mut follower = TankFollower::new(
            test_trajectory(),
            Box::new(move |v| *left.borrow_mut() = v),
            Box::new(move |v| *right.borrow_mut() = v),
            Box::new(move || *time.borrow()),
            Gains::new(0f64, 0f64, 0f64, 0f64, 1f64),
        )
        .with_direction_source(Box::new(move || *dir_source.borrow()));

        // The baseline is captured at initialization, the drift appears after
        follower.initialize();
        *direction.borrow_mut() = 0.1;

        *rig.time.borrow_mut() = 1f64;
        follower.run();

        // Desired relative facing is 0, measured is +0.1, so the error is
        // -0.1: left output rises, right falls
        assert!((follower.last_direction_error() + 0.1).abs() < 1e-9);
        assert!(*rig.left_out.borrow() > 0f64);
        assert!(*rig.right_out.borrow() < 0f64);
    }
}
