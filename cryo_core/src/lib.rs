//! # cryo_core
//!
//! Pure mathematical building blocks for Fourier-slice decoding of cryo-EM images.
//!
//! This crate has no tensor framework dependency. It provides the closed-form rotation
//! math and the integer bookkeeping that the differentiable layer in `neural_cryo`
//! builds on.
//!
//! ## Features
//!
//! - **no_std compatible**: The Lie-algebra math works without an allocator
//! - **Half-plane indexing**: Index sets that let a decoder evaluate only the
//!   non-redundant half of a centrosymmetric D×D Fourier lattice
//! - **Memoized indices**: One index set per image size, shared behind an `Arc` (`std`)
//! - **Lattice generation**: The centered z=0 plane of spatial frequencies
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support, index cache and `log` output
//! - `alloc`: Heap allocation (index sets, lattices) without full std
//!
//! ## Modules
//!
//! - [`types`]: `Vec3`, `Mat3` and the Hartley pair helpers
//! - [`lie`]: Exponential map, quaternion and S2×S2 conversions to SO(3)
//! - [`half_plane`]: `HalfPlaneIndices` for conjugate-symmetric decoding
//! - [`lattice`]: The xy-plane lattice and its wavevectors
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```
//! use cryo_core::prelude::*;
//!
//! let rot = expmap(Vec3::new(0.0, 0.0, core::f32::consts::FRAC_PI_2));
//! let v = rot.mul_vec(Vec3::new(1.0, 0.0, 0.0));
//! assert!((v.y - 1.0).abs() < 1e-6);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
#[cfg(feature = "alloc")]
pub mod half_plane;
#[cfg(feature = "alloc")]
pub mod lattice;
pub mod lie;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::CryoCoreError;
    pub use crate::lie::{expmap, quaternion_to_so3, s2s2_to_so3, skew, SMALL_ANGLE_THRESHOLD};
    pub use crate::types::{conj, Hartley, Mat3, Vec3};

    #[cfg(feature = "alloc")]
    pub use crate::half_plane::HalfPlaneIndices;
    #[cfg(feature = "alloc")]
    pub use crate::lattice::Lattice;
}

pub use error::CryoCoreError;
#[cfg(feature = "alloc")]
pub use half_plane::HalfPlaneIndices;
#[cfg(feature = "alloc")]
pub use lattice::Lattice;
pub use lie::{expmap, quaternion_to_so3, s2s2_to_so3, skew, SMALL_ANGLE_THRESHOLD};
pub use types::{conj, Hartley, Mat3, Vec3};
