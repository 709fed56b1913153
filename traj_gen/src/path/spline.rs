//! # Spline segments
//!
//! One smooth curve piece between a pair of waypoints, evaluable for
//! position and its first two derivatives over the local parameter
//! `t` in `[0, 1]`. Segments are a closed enumeration dispatched with
//! `match` - there is exactly one variant per supported curve type.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use crate::specs::Waypoint;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The type of curve fitted through the waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveType {
    /// Cubic Bezier segments
    Bezier,

    /// Cubic Hermite segments
    CubicHermite,

    /// Quintic Hermite segments, with zero second derivative at the knots
    QuinticHermite,
}

/// A single curve piece between two waypoints.
#[derive(Debug, Clone)]
pub enum SplineSegment {
    CubicHermite {
        p0: Vector2<f64>,
        p1: Vector2<f64>,
        m0: Vector2<f64>,
        m1: Vector2<f64>,
    },
    QuinticHermite {
        p0: Vector2<f64>,
        p1: Vector2<f64>,
        v0: Vector2<f64>,
        v1: Vector2<f64>,
        a0: Vector2<f64>,
        a1: Vector2<f64>,
    },
    Bezier {
        b0: Vector2<f64>,
        b1: Vector2<f64>,
        b2: Vector2<f64>,
        b3: Vector2<f64>,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SplineSegment {
    /// Build the segment joining two waypoints.
    ///
    /// The tangent at each end is the unit heading vector scaled by `alpha`,
    /// so alpha directly weights how long the curve keeps each waypoint's
    /// heading. Bezier control points are derived from the same tangents
    /// (`p0 + m0/3`, `p1 - m1/3`), making a Bezier segment the exact cubic
    /// hermite expressed in a different basis.
    pub fn from_waypoints(w0: &Waypoint, w1: &Waypoint, alpha: f64, curve_type: CurveType) -> Self {
        let p0 = w0.position();
        let p1 = w1.position();
        let m0 = Vector2::new(w0.heading.cos(), w0.heading.sin()) * alpha;
        let m1 = Vector2::new(w1.heading.cos(), w1.heading.sin()) * alpha;

        match curve_type {
            CurveType::CubicHermite => SplineSegment::CubicHermite { p0, p1, m0, m1 },
            CurveType::QuinticHermite => SplineSegment::QuinticHermite {
                p0,
                p1,
                v0: m0,
                v1: m1,
                a0: Vector2::zeros(),
                a1: Vector2::zeros(),
            },
            CurveType::Bezier => SplineSegment::Bezier {
                b0: p0,
                b1: p0 + m0 / 3f64,
                b2: p1 - m1 / 3f64,
                b3: p1,
            },
        }
    }

    /// Evaluate the position at local parameter `t` in `[0, 1]`.
    pub fn at(&self, t: f64) -> Vector2<f64> {
        match self {
            SplineSegment::CubicHermite { p0, p1, m0, m1 } => {
                let t2 = t * t;
                let t3 = t2 * t;
                let h00 = 2f64 * t3 - 3f64 * t2 + 1f64;
                let h10 = t3 - 2f64 * t2 + t;
                let h01 = -2f64 * t3 + 3f64 * t2;
                let h11 = t3 - t2;
                p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
            }
            SplineSegment::QuinticHermite {
                p0,
                p1,
                v0,
                v1,
                a0,
                a1,
            } => {
                let t2 = t * t;
                let t3 = t2 * t;
                let t4 = t3 * t;
                let t5 = t4 * t;
                let h0 = 1f64 - 10f64 * t3 + 15f64 * t4 - 6f64 * t5;
                let h1 = t - 6f64 * t3 + 8f64 * t4 - 3f64 * t5;
                let h2 = 0.5 * t2 - 1.5 * t3 + 1.5 * t4 - 0.5 * t5;
                let h3 = 10f64 * t3 - 15f64 * t4 + 6f64 * t5;
                let h4 = -4f64 * t3 + 7f64 * t4 - 3f64 * t5;
                let h5 = 0.5 * t3 - t4 + 0.5 * t5;
                p0 * h0 + v0 * h1 + a0 * h2 + p1 * h3 + v1 * h4 + a1 * h5
            }
            SplineSegment::Bezier { b0, b1, b2, b3 } => {
                let u = 1f64 - t;
                b0 * (u * u * u)
                    + b1 * (3f64 * u * u * t)
                    + b2 * (3f64 * u * t * t)
                    + b3 * (t * t * t)
            }
        }
    }

    /// Evaluate the first derivative with respect to `t`.
    pub fn deriv_at(&self, t: f64) -> Vector2<f64> {
        match self {
            SplineSegment::CubicHermite { p0, p1, m0, m1 } => {
                let t2 = t * t;
                let h00 = 6f64 * t2 - 6f64 * t;
                let h10 = 3f64 * t2 - 4f64 * t + 1f64;
                let h01 = -6f64 * t2 + 6f64 * t;
                let h11 = 3f64 * t2 - 2f64 * t;
                p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
            }
            SplineSegment::QuinticHermite {
                p0,
                p1,
                v0,
                v1,
                a0,
                a1,
            } => {
                let t2 = t * t;
                let t3 = t2 * t;
                let t4 = t3 * t;
                let h0 = -30f64 * t2 + 60f64 * t3 - 30f64 * t4;
                let h1 = 1f64 - 18f64 * t2 + 32f64 * t3 - 15f64 * t4;
                let h2 = t - 4.5 * t2 + 6f64 * t3 - 2.5 * t4;
                let h3 = 30f64 * t2 - 60f64 * t3 + 30f64 * t4;
                let h4 = -12f64 * t2 + 28f64 * t3 - 15f64 * t4;
                let h5 = 1.5 * t2 - 4f64 * t3 + 2.5 * t4;
                p0 * h0 + v0 * h1 + a0 * h2 + p1 * h3 + v1 * h4 + a1 * h5
            }
            SplineSegment::Bezier { b0, b1, b2, b3 } => {
                let u = 1f64 - t;
                (b1 - b0) * (3f64 * u * u) + (b2 - b1) * (6f64 * u * t) + (b3 - b2) * (3f64 * t * t)
            }
        }
    }

    /// Evaluate the second derivative with respect to `t`.
    pub fn second_deriv_at(&self, t: f64) -> Vector2<f64> {
        match self {
            SplineSegment::CubicHermite { p0, p1, m0, m1 } => {
                let h00 = 12f64 * t - 6f64;
                let h10 = 6f64 * t - 4f64;
                let h01 = -12f64 * t + 6f64;
                let h11 = 6f64 * t - 2f64;
                p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
            }
            SplineSegment::QuinticHermite {
                p0,
                p1,
                v0,
                v1,
                a0,
                a1,
            } => {
                let t2 = t * t;
                let t3 = t2 * t;
                let h0 = -60f64 * t + 180f64 * t2 - 120f64 * t3;
                let h1 = -36f64 * t + 96f64 * t2 - 60f64 * t3;
                let h2 = 1f64 - 9f64 * t + 18f64 * t2 - 10f64 * t3;
                let h3 = 60f64 * t - 180f64 * t2 + 120f64 * t3;
                let h4 = -24f64 * t + 84f64 * t2 - 60f64 * t3;
                let h5 = 3f64 * t - 12f64 * t2 + 10f64 * t3;
                p0 * h0 + v0 * h1 + a0 * h2 + p1 * h3 + v1 * h4 + a1 * h5
            }
            SplineSegment::Bezier { b0, b1, b2, b3 } => {
                let u = 1f64 - t;
                (b2 - b1 * 2f64 + b0) * (6f64 * u) + (b3 - b2 * 2f64 + b1) * (6f64 * t)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
