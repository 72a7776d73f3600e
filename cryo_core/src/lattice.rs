//! The centered xy-plane of spatial frequencies for a D×D image.

use alloc::vec::Vec;

use crate::error::CryoCoreError;
use crate::types::Mat3;

/// Spatial-frequency coordinates of the z=0 central slice for a D×D image.
///
/// Coordinates follow `linspace(-1, 1, D, endpoint = false)` along both axes, so the
/// origin lands exactly on pixel `(D/2, D/2)` and the lattice is not symmetric about it:
/// row 0 and column 0 hold the unpaired Nyquist frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    size: usize,
    coords: Vec<[f32; 3]>,
}

impl Lattice {
    /// Build the lattice for a D×D image.
    ///
    /// # Errors
    /// Returns [`CryoCoreError::InvalidImageSize`] if `size` is odd or smaller than 2.
    pub fn xy_plane(size: usize) -> Result<Self, CryoCoreError> {
        if size < 2 || size % 2 != 0 {
            return Err(CryoCoreError::InvalidImageSize { size });
        }
        let axis: Vec<f32> = (0..size)
            .map(|i| -1.0 + 2.0 * i as f32 / size as f32)
            .collect();

        let coords = axis
            .iter()
            .flat_map(|&y| axis.iter().map(move |&x| [x, y, 0.0]))
            .collect();

        Ok(Self { size, coords })
    }

    /// Image width (and height) D.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of lattice points, D².
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Always false for a constructed lattice.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Flattened index of the origin.
    #[inline]
    pub fn center_index(&self) -> usize {
        let d2 = self.size / 2;
        d2 * self.size + d2
    }

    /// Row-major coordinates.
    #[inline]
    pub fn coords(&self) -> &[[f32; 3]] {
        &self.coords
    }

    /// Coordinates flattened to `[x0, y0, z0, x1, ...]`, ready for a `[D², 3]` tensor.
    pub fn to_flat(&self) -> Vec<f32> {
        self.coords.iter().flat_map(|c| c.iter().copied()).collect()
    }

    /// In-plane wavevectors in `[-0.5, 0.5)`, the coordinate scale used for phase shifts.
    pub fn wavevectors(&self) -> Vec<[f32; 2]> {
        self.coords.iter().map(|c| [c[0] / 2.0, c[1] / 2.0]).collect()
    }

    /// Coordinates multiplied on the right by `rot` (`x · R`, i.e. `Rᵀ x` per point).
    ///
    /// The input lattice is left untouched.
    pub fn rotated(&self, rot: &Mat3) -> Vec<[f32; 3]> {
        let r = &rot.rows;
        self.coords
            .iter()
            .map(|c| {
                [
                    c[0] * r[0][0] + c[1] * r[1][0] + c[2] * r[2][0],
                    c[0] * r[0][1] + c[1] * r[1][1] + c[2] * r[2][1],
                    c[0] * r[0][2] + c[1] * r[1][2] + c[2] * r[2][2],
                ]
            })
            .collect()
    }
}
