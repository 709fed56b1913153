//! Utility maths functions
//!
//! This module collects the numeric building blocks used by trajectory
//! generation: polynomial root finding, planar curvature, angle handling and
//! tolerance-based floating point comparison.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use num_traits::Float;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default threshold used by [`FloatCmp`] comparisons.
pub const DEFAULT_FLOAT_CMP_EPSILON: f64 = 1e-7;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tolerance-based floating point comparison context.
///
/// Every "equal"/"monotonic" check in the trajectory code is relative to the
/// epsilon held here. The context is passed explicitly to whatever needs it
/// rather than living in a process-wide static, so two generations with
/// different tolerances cannot interfere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FloatCmp {
    /// Maximum difference under which two values are considered equal.
    pub epsilon: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FloatCmp {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_FLOAT_CMP_EPSILON,
        }
    }
}

impl FloatCmp {
    /// Create a new comparison context with the given epsilon.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// True if `a` and `b` differ by no more than the epsilon.
    pub fn eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.epsilon
    }

    /// True if `a` is less than `b`, or roughly equal to it.
    pub fn lt_eq(&self, a: f64, b: f64) -> bool {
        a < b || self.eq(a, b)
    }

    /// True if `a` is greater than `b`, or roughly equal to it.
    pub fn gt_eq(&self, a: f64, b: f64) -> bool {
        a > b || self.eq(a, b)
    }

    /// True if `a` is less than `b` beyond the epsilon.
    pub fn lt(&self, a: f64, b: f64) -> bool {
        !self.gt_eq(a, b)
    }

    /// True if `a` is greater than `b` beyond the epsilon.
    pub fn gt(&self, a: f64, b: f64) -> bool {
        !self.lt_eq(a, b)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the roots of a quadratic `ax^2 + bx + c = 0` in standard form.
///
/// If `a` is zero the equation degenerates to a linear one and both returned
/// roots are the single linear solution. If the magnitude of the discriminant
/// `b^2 - 4ac` is no greater than `rounding_limit` it is rounded down to zero,
/// which stops equations with a near-double root from becoming unsolvable due
/// to accumulated floating point error. A discriminant negative beyond the
/// limit yields `(NaN, NaN)`.
pub fn quadratic_roots(a: f64, b: f64, c: f64, rounding_limit: f64) -> (f64, f64) {
    if a == 0f64 {
        let root = -c / b;
        return (root, root);
    }

    let mut d = b * b - 4f64 * a * c;
    if d.abs() <= rounding_limit {
        d = 0f64;
    }

    // A negative discriminant propagates NaN through the square root
    let r = d.sqrt();
    ((-b + r) / (2f64 * a), (-b - r) / (2f64 * a))
}

/// Find the first non-negative root of a quadratic, preferring
/// `(-b + sqrt(d)) / 2a`.
///
/// Returns NaN if both roots are negative.
pub fn positive_quadratic_root(a: f64, b: f64, c: f64, rounding_limit: f64) -> f64 {
    let (r0, r1) = quadratic_roots(a, b, c, rounding_limit);

    if r0 >= 0f64 {
        r0
    } else if r1 >= 0f64 {
        r1
    } else {
        std::f64::NAN
    }
}

/// Compute the discriminant of a cubic `ax^3 + bx^2 + cx + d`.
///
/// Positive: three distinct real roots. Zero: a multiple root, all real.
/// Negative: one real root and two complex conjugate roots.
pub fn cubic_discriminant(a: f64, b: f64, c: f64, d: f64) -> f64 {
    18f64 * a * b * c * d - 4f64 * b.powi(3) * d + b.powi(2) * c.powi(2)
        - 4f64 * a * c.powi(3)
        - 27f64 * a.powi(2) * d.powi(2)
}

/// Find the single real root of a cubic `ax^3 + bx^2 + cx + d` via Cardano's
/// formula.
///
/// The caller must ensure the cubic's discriminant is negative (exactly one
/// real root); the result is undefined otherwise. If `a` is zero the cubic
/// degenerates and this returns [`positive_quadratic_root`] of the remaining
/// quadratic.
pub fn real_cubic_root(a: f64, b: f64, c: f64, d: f64) -> f64 {
    if a == 0f64 {
        return positive_quadratic_root(b, c, d, 0f64);
    }

    let d0 = b * b - 3f64 * a * c;
    let d1 = 2f64 * b.powi(3) - 9f64 * a * b * c + 27f64 * a.powi(2) * d;
    let inner = (d1 * d1 - 4f64 * d0.powi(3)).sqrt();

    // Either sign may be chosen in front of the square root, unless d0 is 0,
    // in which case the sign must keep the two terms in the cube root from
    // cancelling.
    let big_c = if d0 != 0f64 {
        ((d1 - inner) / 2f64).cbrt()
    } else if d1 >= 0f64 {
        ((d1 + inner) / 2f64).cbrt()
    } else {
        ((d1 - inner) / 2f64).cbrt()
    };

    -1f64 / (3f64 * a) * (b + big_c + d0 / big_c)
}

/// Compute the signed curvature of a planar parametric curve from its first
/// and second derivatives.
///
/// Curvature is `(x'y'' - y'x'') / (x'^2 + y'^2)^1.5`. The radius of
/// curvature is its reciprocal, which the caller must guard against straight
/// segments where the curvature is zero and the radius infinite.
pub fn curvature(x_deriv: f64, x_second_deriv: f64, y_deriv: f64, y_second_deriv: f64) -> f64 {
    (x_deriv * y_second_deriv - y_deriv * x_second_deriv)
        / (x_deriv * x_deriv + y_deriv * y_deriv).powf(1.5)
}

/// Linearly interpolate between two values.
///
/// `f` is the fraction of the way from `a` to `b`. Not suitable for angles,
/// which can wrap; use [`lerp_angle`] for those.
pub fn lerp<T>(a: T, b: T, f: T) -> T
where
    T: Float,
{
    a * (T::one() - f) + b * f
}

/// Linearly interpolate between two angles in radians along the shortest arc.
///
/// The result is restricted to `(-pi, pi]`. Safe to use across the positive
/// and negative angle boundary.
pub fn lerp_angle(a: f64, b: f64, f: f64) -> f64 {
    let delta = restrict_angle(b - a);
    restrict_angle(a + f * delta)
}

/// Linearly interpolate between two angles given as normalized direction
/// vectors.
///
/// Interpolating the vectors and taking the arctangent of the result avoids
/// the loss of precision raw angle interpolation suffers near the `+-pi`
/// boundary.
pub fn lerp_angle_vec(a: &Vector2<f64>, b: &Vector2<f64>, f: f64) -> f64 {
    let dir = Vector2::new(lerp(a[0], b[0], f), lerp(a[1], b[1], f));
    dir[1].atan2(dir[0])
}

/// Restrict an angle in radians to the range `(-pi, pi]`.
pub fn restrict_angle(theta: f64) -> f64 {
    use std::f64::consts::PI;

    let mut theta = theta % (2f64 * PI);
    if theta <= -PI {
        theta += 2f64 * PI;
    } else if theta > PI {
        theta -= 2f64 * PI;
    }
    theta
}

/// Reflect an angle across the line represented by a reference angle.
pub fn mirror_angle(theta: f64, reference: f64) -> f64 {
    restrict_angle(theta - 2f64 * (theta - reference))
}

/// Signed shortest difference between two angles in radians.
///
/// Both angles should be in `(-pi, pi]`; the returned difference is the
/// smaller of the two ways around the circle, positive when `target` is
/// anticlockwise of `src`.
pub fn angle_diff(src: f64, target: f64) -> f64 {
    use std::f64::consts::PI;

    let mut diff = target - src;
    if diff > PI {
        diff -= 2f64 * PI;
    } else if diff <= -PI {
        diff += 2f64 * PI;
    }
    diff
}

/// Restrict the absolute value of `val` to `abs_max`, keeping its sign.
pub fn clamp_abs(val: f64, abs_max: f64) -> f64 {
    if val.abs() <= abs_max {
        val
    } else {
        abs_max.copysign(val)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
