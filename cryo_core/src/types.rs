//! Core types for cryo_core rotation and Fourier-coefficient math.
//!
//! Provides a small 3-vector, a row-major 3×3 matrix and the Hartley pair used in place
//! of complex numbers throughout the ecosystem.

use core::ops::{Add, Mul, Neg, Sub};

use crate::error::CryoCoreError;

/// A Fourier coefficient stored as an ordered (real, imaginary) pair.
pub type Hartley = [f32; 2];

/// Complex conjugate of a Hartley pair: the second component is negated.
#[inline]
pub fn conj(h: Hartley) -> Hartley {
    [h[0], -h[1]]
}

/// A 3D vector with named fields.
///
/// Used both for axis-angle tangent vectors in so(3) and for lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Vec3 {
    /// Create a new Vec3.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Create a Vec3 with all components set to the same value.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Convert to an array.
    #[inline]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Squared length of the vector.
    #[inline]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Length (magnitude) of the vector.
    #[inline]
    pub fn length(self) -> f32 {
        libm::sqrtf(self.length_squared())
    }

    /// Scale to unit length, dividing by at least `min_norm`.
    ///
    /// A zero vector stays zero instead of becoming NaN.
    #[inline]
    pub fn normalize_clamped(self, min_norm: f32) -> Self {
        let len = self.length();
        self * (1.0 / if len > min_norm { len } else { min_norm })
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    #[inline]
    fn from(arr: [f32; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Vec3> for [f32; 3] {
    #[inline]
    fn from(v: Vec3) -> Self {
        v.as_array()
    }
}

/// A row-major 3×3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    /// Matrix rows.
    pub rows: [[f32; 3]; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Create a matrix from its rows.
    #[inline]
    pub const fn from_rows(rows: [[f32; 3]; 3]) -> Self {
        Self { rows }
    }

    /// Create a matrix whose rows are the given vectors.
    #[inline]
    pub fn from_row_vectors(r0: Vec3, r1: Vec3, r2: Vec3) -> Self {
        Self::from_rows([r0.as_array(), r1.as_array(), r2.as_array()])
    }

    /// Row-major flattening, matching the `[..., 3, 3]` tensor layout.
    #[inline]
    pub fn to_flat(&self) -> [f32; 9] {
        let r = &self.rows;
        [
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        ]
    }

    /// Rebuild from a row-major flattening.
    #[inline]
    pub fn from_flat(v: &[f32; 9]) -> Self {
        Self::from_rows([[v[0], v[1], v[2]], [v[3], v[4], v[5]], [v[6], v[7], v[8]]])
    }

    /// Transpose.
    #[inline]
    pub fn transpose(&self) -> Self {
        let r = &self.rows;
        Self::from_rows([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    /// Matrix product `self · rhs`.
    #[inline]
    pub fn mul_mat(&self, rhs: &Self) -> Self {
        let mut out = [[0.0f32; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = self.rows[i][0] * rhs.rows[0][j]
                    + self.rows[i][1] * rhs.rows[1][j]
                    + self.rows[i][2] * rhs.rows[2][j];
            }
        }
        Self::from_rows(out)
    }

    /// Matrix-vector product `self · v`.
    #[inline]
    pub fn mul_vec(&self, v: Vec3) -> Vec3 {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }

    /// Element-wise scale.
    #[inline]
    pub fn scale(&self, s: f32) -> Self {
        let mut out = self.rows;
        for row in out.iter_mut() {
            for v in row.iter_mut() {
                *v *= s;
            }
        }
        Self::from_rows(out)
    }

    /// Element-wise sum.
    #[inline]
    pub fn add_mat(&self, rhs: &Self) -> Self {
        let mut out = self.rows;
        for (row, rhs_row) in out.iter_mut().zip(rhs.rows.iter()) {
            for (v, r) in row.iter_mut().zip(rhs_row.iter()) {
                *v += r;
            }
        }
        Self::from_rows(out)
    }

    /// Determinant.
    #[inline]
    pub fn det(&self) -> f32 {
        let r = &self.rows;
        r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
    }

    /// Largest absolute deviation from orthonormality with determinant 1.
    pub fn rotation_deviation(&self) -> f32 {
        let gram = self.mul_mat(&self.transpose());
        let mut worst = libm::fabsf(self.det() - 1.0);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                let d = libm::fabsf(gram.rows[i][j] - expected);
                if d > worst {
                    worst = d;
                }
            }
        }
        worst
    }

    /// Whether this is a rotation within `tol`.
    #[inline]
    pub fn is_rotation(&self, tol: f32) -> bool {
        self.rotation_deviation() <= tol
    }

    /// Return `self` if it is a rotation within `tol`.
    ///
    /// # Errors
    /// Returns [`CryoCoreError::NotARotation`] with the measured deviation otherwise.
    pub fn checked_rotation(self, tol: f32) -> Result<Self, CryoCoreError> {
        let deviation = self.rotation_deviation();
        if deviation <= tol {
            Ok(self)
        } else {
            Err(CryoCoreError::NotARotation { deviation })
        }
    }

    /// Largest absolute element-wise difference.
    pub fn max_abs_diff(&self, other: &Self) -> f32 {
        let mut worst = 0.0f32;
        for (a, b) in self.to_flat().iter().zip(other.to_flat().iter()) {
            let d = libm::fabsf(a - b);
            if d > worst {
                worst = d;
            }
        }
        worst
    }
}
