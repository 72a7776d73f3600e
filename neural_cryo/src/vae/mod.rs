//! Variational models that tie encoders, pose heads and the slice decoder together.
//!
//! - [`HetOnlyVae`]: poses are given; infers a heterogeneity latent per image.
//! - [`PoseVae`]: infers pose and in-plane translation for a single structure.
//! - [`TiltVae`]: like [`PoseVae`] but over tilt-series pairs with a known tilt.
//!
//! Every model keeps its lattice as plain coordinates and rotates a fresh copy per
//! call (`coords · R`, i.e. `Rᵀ x` for each point).

mod het;
mod pose;
mod tilt;

pub use het::{HetOnlyOutput, HetOnlyVae};
pub use pose::{PoseEncoding, PoseVae, PoseVaeOutput};
pub use tilt::{TiltVae, TiltVaeOutput};

use burn::prelude::*;
use cryo_core::{Lattice, Mat3};

use crate::error::{ensure_shape, Result};
use crate::nn::FtSliceDecoder;

/// Lattice coordinates as a `[D², 3]` tensor.
pub fn lattice_coords<B: Backend>(lattice: &Lattice, device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(lattice.to_flat(), [lattice.len(), 3]), device)
}

/// Lattice wavevectors as a `[D², 2]` tensor.
pub fn lattice_wavevectors<B: Backend>(lattice: &Lattice, device: &B::Device) -> Tensor<B, 2> {
    let flat: Vec<f32> = lattice.wavevectors().into_iter().flatten().collect();
    Tensor::from_data(TensorData::new(flat, [lattice.len(), 2]), device)
}

/// A fixed rotation as a `[3, 3]` tensor.
pub fn matrix_tensor<B: Backend>(m: &Mat3, device: &B::Device) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(m.to_flat().to_vec(), [3, 3]), device)
}

/// Rotate `[N, 3]` coordinates by each of `[batch, 3, 3]` rotations: `coords · R`.
pub fn rotate_coords<B: Backend>(coords: Tensor<B, 2>, rot: Tensor<B, 3>) -> Result<Tensor<B, 3>> {
    let [batch, r1, r2] = rot.dims();
    ensure_shape(&[batch, 3, 3], &[batch, r1, r2])?;
    let [n, c] = coords.dims();
    ensure_shape(&[n, 3], &[n, c])?;

    let coords: Tensor<B, 3> = coords.unsqueeze_dim(0);
    Ok(coords.repeat_dim(0, batch).matmul(rot))
}

/// Decode rotated slices and shift them by `-t`.
///
/// Returns `[batch, D, D, 2]`.
pub(crate) fn decode_translated<B: Backend>(
    decoder: &FtSliceDecoder<B>,
    lattice: &Lattice,
    coords: Tensor<B, 2>,
    rot: Tensor<B, 3>,
    t: Tensor<B, 2>,
) -> Result<Tensor<B, 4>> {
    let [batch, _] = t.dims();
    let d = lattice.size();

    let x = rotate_coords(coords, rot)?;
    let slice = decoder.decode_full_image(x)?;
    let shifts: Tensor<B, 3> = t.neg().unsqueeze_dim(1);
    let wavevectors = lattice_wavevectors::<B>(lattice, &slice.device());
    let shifted = decoder.translate(wavevectors, slice, shifts)?;
    Ok(shifted.reshape([batch, d, d, 2]))
}
