//! Heterogeneity-only VAE: poses are known, structure varies.

use burn::module::{Ignored, Module};
use burn::prelude::*;
use cryo_core::Lattice;

use crate::config::{FtSliceDecoderConfig, HetOnlyVaeConfig};
use crate::error::{ensure_shape, NeuralCryoError, Result};
use crate::nn::{EncoderInput, FtSliceDecoder, ImageEncoder};
use crate::sampling::{reparameterize, SamplingMode};

use super::{lattice_coords, rotate_coords};

/// Everything [`HetOnlyVae::forward`] produces.
#[derive(Debug, Clone)]
pub struct HetOnlyOutput<B: Backend> {
    /// [batch, D, D, 2] reconstructed slices.
    pub reconstruction: Tensor<B, 4>,
    /// [batch, z_dim] latent means.
    pub z_mu: Tensor<B, 2>,
    /// [batch, z_dim] latent log-variances.
    pub z_logvar: Tensor<B, 2>,
    /// [batch, z_dim] latent codes used for decoding.
    pub z: Tensor<B, 2>,
}

/// VAE over a heterogeneity latent with externally supplied poses.
#[derive(Module, Debug)]
pub struct HetOnlyVae<B: Backend> {
    encoder: ImageEncoder<B>,
    decoder: FtSliceDecoder<B>,
    lattice: Ignored<Lattice>,
    #[module(skip)]
    z_dim: usize,
}

impl<B: Backend> HetOnlyVae<B> {
    /// Create a new model from configuration.
    pub fn new(config: &HetOnlyVaeConfig, device: &B::Device) -> Result<Self> {
        config.validate().map_err(NeuralCryoError::invalid_config)?;

        let lattice = Lattice::xy_plane(config.image_size)?;
        let encoder = ImageEncoder::new(&config.encoder, config.image_size, 2 * config.z_dim, device)?;
        let decoder = FtSliceDecoder::new(
            &FtSliceDecoderConfig::with_latent(config.z_dim, config.image_size)
                .with_num_layers(config.decoder_layers)
                .with_hidden_dim(config.decoder_dim),
            device,
        )?;

        log::debug!(
            "HetOnlyVae: D={}, z_dim={}, encoder={:?}",
            config.image_size,
            config.z_dim,
            config.encoder
        );

        Ok(Self {
            encoder,
            decoder,
            lattice: Ignored(lattice),
            z_dim: config.z_dim,
        })
    }

    /// Heterogeneity latent width.
    pub fn z_dim(&self) -> usize {
        self.z_dim
    }

    /// The slice decoder.
    pub fn decoder(&self) -> &FtSliceDecoder<B> {
        &self.decoder
    }

    /// Encode images into latent `(mu, logvar)`, each `[batch, z_dim]`.
    pub fn encode(&self, input: EncoderInput<B>) -> Result<(Tensor<B, 2>, Tensor<B, 2>)> {
        let z = self.encoder.forward(input)?;
        let [batch, _] = z.dims();
        let mu = z.clone().slice([0..batch, 0..self.z_dim]);
        let logvar = z.slice([0..batch, self.z_dim..2 * self.z_dim]);
        Ok((mu, logvar))
    }

    /// Append each example's latent code to every one of its points.
    ///
    /// `[batch, N, 3]` and `[batch, z_dim]` → `[batch, N, 3 + z_dim]`.
    pub fn cat_z(&self, coords: Tensor<B, 3>, z: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
        let [batch, n, c] = coords.dims();
        ensure_shape(&[batch, n, 3], &[batch, n, c])?;
        ensure_shape(&[batch, self.z_dim], &z.dims())?;

        let z: Tensor<B, 3> = z.unsqueeze_dim(1);
        Ok(Tensor::cat(vec![coords, z.repeat_dim(1, n)], 2))
    }

    /// Decode slices for rotations `[batch, 3, 3]` and latents `[batch, z_dim]`.
    ///
    /// Returns `[batch, D², 2]`.
    pub fn decode(&self, rot: Tensor<B, 3>, z: Tensor<B, 2>) -> Result<Tensor<B, 3>> {
        let coords = lattice_coords::<B>(&self.lattice.0, &rot.device());
        let x = rotate_coords(coords, rot)?;
        self.decoder.decode_full_image(self.cat_z(x, z)?)
    }

    /// Encode, sample a latent and decode at the given poses.
    pub fn forward(
        &self,
        input: EncoderInput<B>,
        rot: Tensor<B, 3>,
        mode: SamplingMode,
    ) -> Result<HetOnlyOutput<B>> {
        let (z_mu, z_logvar) = self.encode(input)?;
        let z = reparameterize(z_mu.clone(), z_logvar.clone(), mode);

        let [batch, _] = z.dims();
        let d = self.lattice.0.size();
        let reconstruction = self.decode(rot, z.clone())?.reshape([batch, d, d, 2]);

        Ok(HetOnlyOutput {
            reconstruction,
            z_mu,
            z_logvar,
            z,
        })
    }
}
