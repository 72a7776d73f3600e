//! Conversions between the Lie algebra so(3), rotation parameterizations and SO(3).
//!
//! Conventions:
//! - Tangent vectors are axis-angle vectors: direction is the axis, length the angle.
//! - Quaternions are scalar-first `[w, x, y, z]` and need not be normalized.
//! - Matrices are active rotations acting on column vectors.
//!
//! The batched, differentiable versions live in `neural_cryo::lie` and follow the same
//! conventions so the two can be checked against each other.

use crate::types::{Mat3, Vec3};

/// Squared rotation angle below which the exponential map switches to its Taylor series.
pub const SMALL_ANGLE_THRESHOLD: f32 = 1e-6;

/// Squared quaternion norm below which a quaternion is treated as the identity.
pub const DEGENERATE_QUATERNION_NORM_SQ: f32 = 1e-12;

/// Lower bound on vector norms during S2×S2 orthogonalization.
pub const S2S2_MIN_NORM: f32 = 1e-5;

/// Skew-symmetric matrix `[w]×` such that `[w]× u = w × u`.
///
/// ```text
/// [w]× = |  0   -w_z   w_y |
///        |  w_z   0   -w_x |
///        | -w_y  w_x    0  |
/// ```
#[inline]
pub fn skew(w: Vec3) -> Mat3 {
    Mat3::from_rows([[0.0, -w.z, w.y], [w.z, 0.0, -w.x], [-w.y, w.x, 0.0]])
}

/// Coefficients `(sin θ / θ, (1 - cos θ) / θ²)` of Rodrigues' formula.
///
/// Uses the half-angle form for the second coefficient and a Taylor series for
/// `θ² < SMALL_ANGLE_THRESHOLD`, so neither term divides by zero or cancels badly.
#[inline]
pub fn rodrigues_coefficients(theta_sq: f32) -> (f32, f32) {
    if theta_sq < SMALL_ANGLE_THRESHOLD {
        (1.0 - theta_sq / 6.0, 0.5 - theta_sq / 24.0)
    } else {
        let theta = libm::sqrtf(theta_sq);
        let half_sin = libm::sinf(0.5 * theta);
        (libm::sinf(theta) / theta, 2.0 * half_sin * half_sin / theta_sq)
    }
}

/// Exponential map so(3) → SO(3) (Rodrigues' formula).
///
/// ```text
/// R = I + a [w]× + b [w]×²,   a = sin θ / θ,   b = (1 - cos θ) / θ²
/// ```
///
/// # Example
/// ```
/// use cryo_core::{expmap, Mat3, Vec3};
///
/// assert_eq!(expmap(Vec3::splat(0.0)), Mat3::IDENTITY);
/// ```
pub fn expmap(w: Vec3) -> Mat3 {
    let (a, b) = rodrigues_coefficients(w.length_squared());
    let k = skew(w);
    Mat3::IDENTITY
        .add_mat(&k.scale(a))
        .add_mat(&k.mul_mat(&k).scale(b))
}

/// Unit-quaternion to rotation matrix, for a scalar-first `[w, x, y, z]` quaternion.
///
/// The quaternion is normalized implicitly by dividing by its squared norm; a zero
/// quaternion maps to the identity.
pub fn quaternion_to_so3(q: [f32; 4]) -> Mat3 {
    let [w, x, y, z] = q;
    let norm_sq = w * w + x * x + y * y + z * z;
    if norm_sq < DEGENERATE_QUATERNION_NORM_SQ {
        return Mat3::IDENTITY;
    }
    let s = 2.0 / norm_sq;

    Mat3::from_rows([
        [
            1.0 - s * (y * y + z * z),
            s * (x * y - w * z),
            s * (x * z + w * y),
        ],
        [
            s * (x * y + w * z),
            1.0 - s * (x * x + z * z),
            s * (y * z - w * x),
        ],
        [
            s * (x * z - w * y),
            s * (y * z + w * x),
            1.0 - s * (x * x + y * y),
        ],
    ])
}

/// Rotation from two (unnormalized) 3-vectors by Gram–Schmidt orthogonalization.
///
/// The rows of the result are `e1 = v1/|v1|`, `e2` the normalized part of `v2`
/// orthogonal to `e1`, and `e3 = e1 × e2`. Norms are clamped below by
/// [`S2S2_MIN_NORM`].
pub fn s2s2_to_so3(v1: Vec3, v2: Vec3) -> Mat3 {
    let e1 = v1.normalize_clamped(S2S2_MIN_NORM);
    let u2 = v2 - e1 * e1.dot(v2);
    let e2 = u2.normalize_clamped(S2S2_MIN_NORM);
    let e3 = e1.cross(e2);
    Mat3::from_row_vectors(e1, e2, e3)
}
