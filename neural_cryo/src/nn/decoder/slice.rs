//! Fourier-slice decoder over a centrosymmetric lattice.

use std::sync::Arc;

use burn::module::{Ignored, Module};
use burn::prelude::*;
use cryo_core::HalfPlaneIndices;

use crate::config::FtSliceDecoderConfig;
use crate::error::{ensure_shape, NeuralCryoError, Result};
use crate::nn::mlp::{ResidLinearMlp, ResidLinearMlpConfig};

/// Decoder from 3D frequency coordinates (plus latent code) to Hartley pairs.
///
/// The network `f` is only ever evaluated on the `z ≤ 0` half-space: points with
/// `z > 0` are reflected through the origin and the imaginary output negated, which
/// is exact for the Fourier transform of a real-valued density. For full D×D slices
/// only the non-redundant half of the lattice is evaluated and the rest is filled by
/// conjugate mirroring through the center pixel.
#[derive(Module, Debug)]
pub struct FtSliceDecoder<B: Backend> {
    /// Residual MLP `R^(3+k) → R²`.
    decoder: ResidLinearMlp<B>,
    /// Pixel bookkeeping for half-plane evaluation.
    indices: Ignored<Arc<HalfPlaneIndices>>,
    /// Per-point input width.
    #[module(skip)]
    input_dim: usize,
}

impl<B: Backend> FtSliceDecoder<B> {
    /// Create a new decoder from configuration.
    pub fn new(config: &FtSliceDecoderConfig, device: &B::Device) -> Result<Self> {
        config.validate().map_err(NeuralCryoError::invalid_config)?;

        let indices = HalfPlaneIndices::cached(config.image_size)?;
        let decoder =
            ResidLinearMlpConfig::new(config.input_dim, config.num_layers, config.hidden_dim, 2)
                .init(device);

        log::debug!(
            "FtSliceDecoder: D={}, input_dim={}, {} of {} pixels evaluated",
            config.image_size,
            config.input_dim,
            indices.num_evaluated(),
            indices.num_pixels()
        );

        Ok(Self {
            decoder,
            indices: Ignored(indices),
            input_dim: config.input_dim,
        })
    }

    /// Image width (and height) D.
    pub fn image_size(&self) -> usize {
        self.indices.0.size()
    }

    /// Per-point input width.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Half-plane index sets for this image size.
    pub fn indices(&self) -> &HalfPlaneIndices {
        &self.indices.0
    }

    /// Evaluate the network on arbitrary points, reflecting those with `z > 0`.
    ///
    /// Input shape: [batch, points, input_dim]
    /// Output shape: [batch, points, 2]
    ///
    /// The input tensor is not modified; reflected coordinates live in a new tensor.
    pub fn decode_raw(&self, points: Tensor<B, 3>) -> Result<Tensor<B, 3>> {
        let [batch, n, dim] = points.dims();
        ensure_shape(&[batch, n, self.input_dim], &[batch, n, dim])?;

        let z = points.clone().slice([0..batch, 0..n, 2..3]);
        let flip = z.clone().greater_elem(0.0);
        let sign = z.ones_like().mask_fill(flip, -1.0);

        let coords = points.clone().slice([0..batch, 0..n, 0..3]) * sign.clone();
        let input = if dim > 3 {
            let latent = points.slice([0..batch, 0..n, 3..dim]);
            Tensor::cat(vec![coords, latent], 2)
        } else {
            coords
        };

        let out = self.decoder.forward(input);
        let re = out.clone().slice([0..batch, 0..n, 0..1]);
        let im = out.slice([0..batch, 0..n, 1..2]) * sign;
        Ok(Tensor::cat(vec![re, im], 2))
    }

    /// Decode a full D×D central slice, evaluating only the non-redundant half.
    ///
    /// Input shape: [batch, D², input_dim]
    /// Output shape: [batch, D², 2]
    pub fn decode_full_image(&self, lattice: Tensor<B, 3>) -> Result<Tensor<B, 3>> {
        let [batch, n, dim] = lattice.dims();
        ensure_shape(
            &[batch, self.indices.0.num_pixels(), self.input_dim],
            &[batch, n, dim],
        )?;

        let device = lattice.device();
        let all_eval = index_tensor::<B>(self.indices.0.all_eval(), &device);
        let evaluated = self.decode_raw(lattice.select(1, all_eval))?;

        // Every top pixel precedes the center, so its row in `evaluated` is its pixel index.
        let combined = if self.indices.0.top().is_empty() {
            evaluated
        } else {
            let top = index_tensor::<B>(self.indices.0.top(), &device);
            let mirrored = conjugate(evaluated.clone().select(1, top));
            Tensor::cat(vec![evaluated, mirrored], 1)
        };

        let assembly = index_tensor::<B>(self.indices.0.assembly(), &device);
        Ok(combined.select(1, assembly))
    }

    /// Decode a line of `2c + 1` points that is symmetric about index `c`.
    ///
    /// Entries `0..=c` are evaluated; entry `c + k` is the conjugate of entry `c - k`.
    ///
    /// Input shape: [batch, 2c + 1, input_dim]
    /// Output shape: [batch, 2c + 1, 2]
    pub fn decode_symmetric(&self, lattice: Tensor<B, 3>, c: usize) -> Result<Tensor<B, 3>> {
        let [batch, n, dim] = lattice.dims();
        ensure_shape(&[batch, 2 * c + 1, self.input_dim], &[batch, n, dim])?;

        let head = self.decode_raw(lattice.slice([0..batch, 0..c + 1, 0..dim]))?;
        if c == 0 {
            return Ok(head);
        }

        let reversed: Vec<usize> = (0..c).rev().collect();
        let reversed = index_tensor::<B>(&reversed, &head.device());
        let tail = conjugate(head.clone().select(1, reversed));
        Ok(Tensor::cat(vec![head, tail], 1))
    }

    /// Phase-shift `image` by each of `shifts`; see [`translate`].
    pub fn translate(
        &self,
        coords: Tensor<B, 2>,
        image: Tensor<B, 3>,
        shifts: Tensor<B, 3>,
    ) -> Result<Tensor<B, 4>> {
        translate(coords, image, shifts)
    }
}

/// Translate Fourier-space images by phase shifting.
///
/// Inputs:
/// - coords: [N, 2] wavevectors in [-0.5, 0.5)
/// - image: [batch, N, 2] Hartley pairs
/// - shifts: [batch, T, 2] shifts in pixels
///
/// Output: [batch, T, N, 2], each pair rotated by `phase = -2π · (coords · -shift)`.
pub fn translate<B: Backend>(
    coords: Tensor<B, 2>,
    image: Tensor<B, 3>,
    shifts: Tensor<B, 3>,
) -> Result<Tensor<B, 4>> {
    let [n, cdim] = coords.dims();
    ensure_shape(&[n, 2], &[n, cdim])?;
    let [batch, points, channels] = image.dims();
    ensure_shape(&[batch, n, 2], &[batch, points, channels])?;
    let [sbatch, t, sdim] = shifts.dims();
    ensure_shape(&[batch, t, 2], &[sbatch, t, sdim])?;

    let coords: Tensor<B, 4> = coords.reshape([1, 1, n, 2]);
    let shifts: Tensor<B, 4> = shifts.neg().reshape([batch, t, 1, 2]);
    let phase = (coords * shifts)
        .sum_dim(3)
        .mul_scalar(-2.0 * core::f32::consts::PI);
    let (cos, sin) = (phase.clone().cos(), phase.sin());

    let image: Tensor<B, 4> = image.reshape([batch, 1, n, 2]);
    let re = image.clone().slice([0..batch, 0..1, 0..n, 0..1]);
    let im = image.slice([0..batch, 0..1, 0..n, 1..2]);

    let out_re = re.clone() * cos.clone() - im.clone() * sin.clone();
    let out_im = re * sin + im * cos;
    Ok(Tensor::cat(vec![out_re, out_im], 3))
}

/// Complex conjugate of Hartley pairs in the last dim: `(re, im) → (re, -im)`.
pub fn conjugate<B: Backend, const D: usize>(pairs: Tensor<B, D>) -> Tensor<B, D> {
    let mut shape = [1usize; D];
    shape[D - 1] = 2;
    let sign = Tensor::<B, 1>::from_data([1.0f32, -1.0], &pairs.device()).reshape(shape);
    pairs * sign
}

/// Int tensor of gather indices.
fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let values: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(values, [indices.len()]), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use cryo_core::Lattice;

    type TestBackend = NdArray;

    fn small_decoder(input_dim: usize, size: usize) -> FtSliceDecoder<TestBackend> {
        let device = Default::default();
        let config = FtSliceDecoderConfig::new(input_dim, size)
            .with_num_layers(1)
            .with_hidden_dim(16);
        FtSliceDecoder::new(&config, &device).unwrap()
    }

    fn lattice_tensor(size: usize, batch: usize) -> Tensor<TestBackend, 3> {
        let lattice = Lattice::xy_plane(size).unwrap();
        let flat = lattice.to_flat();
        Tensor::<TestBackend, 2>::from_data(TensorData::new(flat, [lattice.len(), 3]), &Default::default())
            .unsqueeze_dim::<3>(0)
            .repeat_dim(0, batch)
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let device = Default::default();
        assert!(FtSliceDecoder::<TestBackend>::new(&FtSliceDecoderConfig::new(3, 7), &device).is_err());
        assert!(FtSliceDecoder::<TestBackend>::new(&FtSliceDecoderConfig::new(2, 8), &device).is_err());
    }

    #[test]
    fn test_decode_raw_shape_and_no_mutation() {
        let decoder = small_decoder(4, 8);
        let device = Default::default();
        let points = Tensor::<TestBackend, 3>::from_data(
            [[[0.1f32, 0.2, 0.3, 1.0], [0.4, -0.5, -0.6, 1.0]]],
            &device,
        );
        let before: Vec<f32> = points.to_data().to_vec().unwrap();

        let out = decoder.decode_raw(points.clone()).unwrap();
        assert_eq!(out.dims(), [1, 2, 2]);

        let after: Vec<f32> = points.to_data().to_vec().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_decode_raw_rejects_wrong_width() {
        let decoder = small_decoder(3, 8);
        let points = Tensor::<TestBackend, 3>::zeros([1, 5, 4], &Default::default());
        assert!(decoder.decode_raw(points).is_err());
    }

    #[test]
    fn test_full_image_shape() {
        let decoder = small_decoder(3, 8);
        let out = decoder.decode_full_image(lattice_tensor(8, 2)).unwrap();
        assert_eq!(out.dims(), [2, 64, 2]);
    }

    #[test]
    fn test_full_image_d2_has_no_mirrored_pixels() {
        let decoder = small_decoder(3, 2);
        let out = decoder.decode_full_image(lattice_tensor(2, 1)).unwrap();
        assert_eq!(out.dims(), [1, 4, 2]);
    }

    #[test]
    fn test_full_image_rejects_wrong_point_count() {
        let decoder = small_decoder(3, 8);
        assert!(decoder.decode_full_image(lattice_tensor(4, 1)).is_err());
    }

    #[test]
    fn test_decode_symmetric() {
        let decoder = small_decoder(3, 8);
        let device = Default::default();
        let c = 3;
        let coords: Vec<f32> = (0..2 * c + 1)
            .flat_map(|i| {
                let t = i as f32 - c as f32;
                [0.1 * t, -0.05 * t, 0.0]
            })
            .collect();
        let line = Tensor::<TestBackend, 2>::from_data(TensorData::new(coords, [2 * c + 1, 3]), &device)
            .unsqueeze_dim::<3>(0);

        let out: Vec<f32> = decoder.decode_symmetric(line, c).unwrap().to_data().to_vec().unwrap();
        for k in 1..=c {
            let lo = &out[2 * (c - k)..2 * (c - k) + 2];
            let hi = &out[2 * (c + k)..2 * (c + k) + 2];
            assert_eq!(hi[0], lo[0]);
            assert_eq!(hi[1], -lo[1]);
        }
    }

    #[test]
    fn test_decode_symmetric_rejects_wrong_length() {
        let decoder = small_decoder(3, 8);
        let line = Tensor::<TestBackend, 3>::zeros([1, 6, 3], &Default::default());
        assert!(decoder.decode_symmetric(line, 3).is_err());
    }

    #[test]
    fn test_conjugate() {
        let device = Default::default();
        let pairs = Tensor::<TestBackend, 3>::from_data([[[1.0f32, 2.0], [-3.0, -4.0]]], &device);
        let out: Vec<f32> = conjugate(pairs).to_data().to_vec().unwrap();
        assert_eq!(out, vec![1.0, -2.0, -3.0, 4.0]);
    }

    #[test]
    fn test_translate_half_pixel() {
        let device = Default::default();
        let coords = Tensor::<TestBackend, 2>::from_data([[0.5f32, 0.0]], &device);
        let image = Tensor::<TestBackend, 3>::from_data([[[1.0f32, 0.0]]], &device);
        let shifts = Tensor::<TestBackend, 3>::from_data([[[1.0f32, 0.0]]], &device);

        // phase = 2π · 0.5 = π, so (1, 0) → (-1, 0).
        let out = translate(coords, image, shifts).unwrap();
        assert_eq!(out.dims(), [1, 1, 1, 2]);
        let v: Vec<f32> = out.to_data().to_vec().unwrap();
        assert!((v[0] + 1.0).abs() < 1e-6);
        assert!(v[1].abs() < 1e-6);
    }

    #[test]
    fn test_translate_rejects_mismatched_points() {
        let device = Default::default();
        let coords = Tensor::<TestBackend, 2>::zeros([4, 2], &device);
        let image = Tensor::<TestBackend, 3>::zeros([1, 5, 2], &device);
        let shifts = Tensor::<TestBackend, 3>::zeros([1, 1, 2], &device);
        assert!(translate(coords, image, shifts).is_err());
    }
}
