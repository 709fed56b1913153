//! # Path module
//!
//! A path is the ordered sequence of spline segments spanning all waypoints.
//! It carries no timing information - that is the trajectory's job - only
//! geometry: sample evaluation, arc length computation, conversion between
//! the spline parameter and the arc length fraction via a lookup table, and
//! structural transforms which always produce a new, independent path.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod spline;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use crate::specs::Waypoint;
use util::maths;

pub use spline::{CurveType, SplineSegment};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A smooth parametric curve through a set of waypoints.
///
/// The global parameter `t` in `[0, 1]` maps uniformly across the segments:
/// `t = 0` is the first waypoint, `t = 1` the last, and values at or beyond 1
/// clamp to the final segment's end rather than extrapolating.
///
/// Arc length queries ([`Path::s2t`], [`Path::t2s`], [`Path::length`])
/// require the lookup table built by [`Path::compute_len`]; using them
/// beforehand is an error.
#[derive(Debug, Clone)]
pub struct Path {
    /// The type of curve each segment is built from
    curve_type: CurveType,

    /// The waypoints the path passes through
    waypoints: Vec<Waypoint>,

    /// Turn smoothness weight used to build the segments
    alpha: f64,

    /// One segment per consecutive waypoint pair
    segments: Vec<SplineSegment>,

    /// Offset of each wheel from the curve, half the robot's base width
    base_radius: f64,

    /// True if the robot drives this path backwards
    backwards: bool,

    /// Total arc length, set by `compute_len`
    total_len: Option<f64>,

    /// Rows of (cumulative arc length, spline parameter), non-decreasing in
    /// both columns
    s2t_table: Vec<(f64, f64)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors produced by path construction and queries.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// A path needs at least two waypoints to have a single segment.
    #[error("At least 2 waypoints are required to build a path, got {0}")]
    NotEnoughWaypoints(usize),

    /// A waypoint or alpha contained NaN or infinity.
    #[error("Waypoints and alpha must be finite")]
    NonFiniteInput,

    /// An arc length query was made before the lookup table was built.
    #[error("The arc length table has not been computed, call compute_len first")]
    LengthNotComputed,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a new path through the given waypoints.
    ///
    /// The base radius defaults to zero and the backwards flag to false; the
    /// arc length table is not built until [`Path::compute_len`] is called.
    pub fn new(
        waypoints: Vec<Waypoint>,
        alpha: f64,
        curve_type: CurveType,
    ) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::NotEnoughWaypoints(waypoints.len()));
        }
        if !alpha.is_finite() || waypoints.iter().any(|w| !w.is_finite()) {
            return Err(PathError::NonFiniteInput);
        }

        Ok(Self::build(waypoints, alpha, curve_type))
    }

    /// Build a path from waypoints already known to be valid.
    fn build(waypoints: Vec<Waypoint>, alpha: f64, curve_type: CurveType) -> Self {
        let segments = waypoints
            .windows(2)
            .map(|pair| SplineSegment::from_waypoints(&pair[0], &pair[1], alpha, curve_type))
            .collect();

        Self {
            curve_type,
            waypoints,
            alpha,
            segments,
            base_radius: 0f64,
            backwards: false,
            total_len: None,
            s2t_table: Vec::new(),
        }
    }

    /// The waypoints this path passes through.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// The curve type of this path's segments.
    pub fn curve_type(&self) -> CurveType {
        self.curve_type
    }

    /// The turn smoothness weight this path was built with.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Set the wheel offset from the curve (half the robot's base width).
    pub fn set_base_radius(&mut self, base_radius: f64) {
        self.base_radius = base_radius;
    }

    /// The wheel offset from the curve.
    pub fn base_radius(&self) -> f64 {
        self.base_radius
    }

    /// Set whether the robot drives this path backwards.
    pub fn set_backwards(&mut self, backwards: bool) {
        self.backwards = backwards;
    }

    /// True if the robot drives this path backwards.
    pub fn backwards(&self) -> bool {
        self.backwards
    }

    /// Evaluate the position at global parameter `t`.
    pub fn at(&self, t: f64) -> Vector2<f64> {
        let (seg, local_t) = self.locate(t);
        self.segments[seg].at(local_t)
    }

    /// Evaluate the first derivative at global parameter `t`.
    pub fn deriv_at(&self, t: f64) -> Vector2<f64> {
        let (seg, local_t) = self.locate(t);
        self.segments[seg].deriv_at(local_t)
    }

    /// Evaluate the second derivative at global parameter `t`.
    pub fn second_deriv_at(&self, t: f64) -> Vector2<f64> {
        let (seg, local_t) = self.locate(t);
        self.segments[seg].second_deriv_at(local_t)
    }

    /// The heading (direction of travel) at global parameter `t`, radians.
    pub fn heading_at(&self, t: f64) -> f64 {
        let deriv = self.deriv_at(t);
        deriv[1].atan2(deriv[0])
    }

    /// The positions of the left and right wheel contact points at `t`.
    ///
    /// Each wheel is offset from the curve by the base radius, perpendicular
    /// to the heading. The offset flips sides when the backwards flag is set
    /// since the robot's left is then on the other side of the direction of
    /// travel.
    pub fn wheels_at(&self, t: f64) -> (Vector2<f64>, Vector2<f64>) {
        let pos = self.at(t);
        let heading = self.heading_at(t);
        let (sin, cos) = heading.sin_cos();

        let radius = if self.backwards {
            -self.base_radius
        } else {
            self.base_radius
        };

        let left = Vector2::new(pos[0] - radius * sin, pos[1] + radius * cos);
        let right = Vector2::new(pos[0] + radius * sin, pos[1] - radius * cos);
        (left, right)
    }

    /// Resolve a global parameter to a segment index and local parameter.
    ///
    /// Values at or beyond 1 clamp to the end of the last segment, negative
    /// values to the start of the first.
    fn locate(&self, t: f64) -> (usize, f64) {
        if t >= 1f64 {
            return (self.segments.len() - 1, 1f64);
        }

        let scaled = t.max(0f64) * self.segments.len() as f64;
        (scaled.floor() as usize, scaled.fract())
    }

    /// Compute the path's total arc length from `points` uniformly spaced
    /// parameter samples, building the lookup table used by [`Path::s2t`]
    /// and [`Path::t2s`].
    ///
    /// Returns the total length. More points give a more accurate table at
    /// the cost of proportionally more work.
    pub fn compute_len(&mut self, points: usize) -> f64 {
        let dt = 1f64 / (points - 1) as f64;

        let mut total = 0f64;
        let mut last = self.at(0f64);

        self.s2t_table = Vec::with_capacity(points);
        self.s2t_table.push((0f64, 0f64));

        for i in 1..points {
            let t = i as f64 * dt;
            let current = self.at(t);
            total += (current - last).norm();
            self.s2t_table.push((total, t));
            last = current;
        }

        self.total_len = Some(total);
        total
    }

    /// The total arc length of the path.
    pub fn length(&self) -> Result<f64, PathError> {
        self.total_len.ok_or(PathError::LengthNotComputed)
    }

    /// Convert an arc length fraction `s` in `[0, 1]` to the spline
    /// parameter `t` at that distance along the path.
    ///
    /// Inputs outside `[0, 1]` clamp to the nearest end.
    pub fn s2t(&self, s: f64) -> Result<f64, PathError> {
        let total = self.length()?;
        let dist = s.max(0f64).min(1f64) * total;

        let (lo, hi) = self.bracket_rows(dist, |row| row.0);
        let (d0, t0) = self.s2t_table[lo];
        let (d1, t1) = self.s2t_table[hi];

        if d1 == d0 {
            return Ok(t0);
        }
        Ok(maths::lerp(t0, t1, (dist - d0) / (d1 - d0)))
    }

    /// Convert a spline parameter `t` to the arc length fraction covered at
    /// that point.
    ///
    /// Inputs outside `[0, 1]` clamp to the nearest end.
    pub fn t2s(&self, t: f64) -> Result<f64, PathError> {
        let total = self.length()?;
        let t = t.max(0f64).min(1f64);

        let (lo, hi) = self.bracket_rows(t, |row| row.1);
        let (d0, t0) = self.s2t_table[lo];
        let (d1, t1) = self.s2t_table[hi];

        if t1 == t0 {
            return Ok(d0 / total);
        }
        Ok(maths::lerp(d0, d1, (t - t0) / (t1 - t0)) / total)
    }

    /// Binary search for the pair of adjacent table rows bracketing `key`
    /// under the given column accessor.
    fn bracket_rows<F>(&self, key: f64, column: F) -> (usize, usize)
    where
        F: Fn(&(f64, f64)) -> f64,
    {
        let mut lo = 0;
        let mut hi = self.s2t_table.len() - 1;

        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            if column(&self.s2t_table[mid]) <= key {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo, hi)
    }

    /// Reflect the path across the axis defined by the first waypoint's
    /// heading, swapping left and right turns.
    ///
    /// Returns a new path; the original is untouched.
    pub fn mirror_left_right(&self) -> Path {
        let reference = self.waypoints[0].heading;
        self.transformed(|w, origin| {
            let pos = reflect(w.position(), origin, reference);
            Waypoint {
                x: pos[0],
                y: pos[1],
                heading: maths::mirror_angle(w.heading, reference),
                velocity: w.velocity,
            }
        })
    }

    /// Reflect the path across the axis perpendicular to the first
    /// waypoint's heading, so the robot drives it backwards.
    ///
    /// Returns a new path with the backwards flag flipped.
    pub fn mirror_front_back(&self) -> Path {
        let reference = self.waypoints[0].heading + std::f64::consts::PI / 2f64;
        let mut path = self.transformed(|w, origin| {
            let pos = reflect(w.position(), origin, reference);
            Waypoint {
                x: pos[0],
                y: pos[1],
                heading: maths::mirror_angle(w.heading, reference),
                velocity: w.velocity,
            }
        });
        path.backwards = !self.backwards;
        path
    }

    /// Reverse the path so it is driven from the last waypoint back to the
    /// first.
    ///
    /// Point order reverses, headings turn by pi, and the backwards flag
    /// flips so the robot retraces the path without turning around.
    pub fn retrace(&self) -> Path {
        let waypoints = self
            .waypoints
            .iter()
            .rev()
            .map(|w| Waypoint {
                x: w.x,
                y: w.y,
                heading: maths::restrict_angle(w.heading + std::f64::consts::PI),
                velocity: w.velocity,
            })
            .collect();

        let mut path = Self::build(waypoints, self.alpha, self.curve_type);
        path.base_radius = self.base_radius;
        path.backwards = !self.backwards;
        if self.total_len.is_some() {
            path.compute_len(self.s2t_table.len());
        }
        path
    }

    /// Build a new path by applying a waypoint transform, carrying over the
    /// base radius, backwards flag and table density.
    fn transformed<F>(&self, transform: F) -> Path
    where
        F: Fn(&Waypoint, Vector2<f64>) -> Waypoint,
    {
        let origin = self.waypoints[0].position();
        let waypoints = self
            .waypoints
            .iter()
            .map(|w| transform(w, origin))
            .collect();

        let mut path = Self::build(waypoints, self.alpha, self.curve_type);
        path.base_radius = self.base_radius;
        path.backwards = self.backwards;
        if self.total_len.is_some() {
            path.compute_len(self.s2t_table.len());
        }
        path
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Reflect a point across the line through `origin` at angle `angle`.
fn reflect(point: Vector2<f64>, origin: Vector2<f64>, angle: f64) -> Vector2<f64> {
    let axis = Vector2::new(angle.cos(), angle.sin());
    let rel = point - origin;
    origin + axis * (2f64 * rel.dot(&axis)) - rel
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
