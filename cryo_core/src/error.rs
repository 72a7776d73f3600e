//! Error types for cryo_core operations.
//!
//! Provides a simple error enum with no external dependencies for no_std compatibility.

use core::fmt;

/// Error types that can occur during cryo_core operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CryoCoreError {
    /// The image size is odd or too small to have a center pixel with conjugate partners.
    InvalidImageSize {
        /// The rejected image size.
        size: usize,
    },
    /// A matrix that must be a rotation is not orthonormal with determinant 1.
    NotARotation {
        /// Largest absolute deviation from `R·Rᵀ = I` and `det R = 1`.
        deviation: f32,
    },
}

impl fmt::Display for CryoCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryoCoreError::InvalidImageSize { size } => {
                write!(f, "image size {} must be even and at least 2", size)
            }
            CryoCoreError::NotARotation { deviation } => {
                write!(f, "matrix is not a rotation (deviation {})", deviation)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CryoCoreError {}
