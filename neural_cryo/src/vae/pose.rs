//! Pose-inferring VAE for a single homogeneous structure.

use burn::module::{Ignored, Module};
use burn::nn::Relu;
use burn::prelude::*;
use cryo_core::Lattice;

use crate::config::{FtSliceDecoderConfig, PoseVaeConfig, So3ReparameterizeConfig};
use crate::error::{NeuralCryoError, Result};
use crate::nn::mlp::{ResidLinearMlp, ResidLinearMlpConfig};
use crate::nn::{EncoderInput, FtSliceDecoder, ImageEncoder, PoseDistribution, So3Reparameterize};
use crate::sampling::{reparameterize, SamplingMode};

use super::{decode_translated, lattice_coords};

/// Pose and translation distributions predicted for a batch of images.
#[derive(Debug, Clone)]
pub struct PoseEncoding<B: Backend> {
    /// Rotation distribution.
    pub pose: PoseDistribution<B>,
    /// [batch, 2] translation means.
    pub t_mu: Tensor<B, 2>,
    /// [batch, 2] translation log-variances.
    pub t_logvar: Tensor<B, 2>,
}

/// Everything [`PoseVae::forward`] produces.
#[derive(Debug, Clone)]
pub struct PoseVaeOutput<B: Backend> {
    /// [batch, D, D, 2] reconstructed, translated slices.
    pub reconstruction: Tensor<B, 4>,
    /// Rotation distribution.
    pub pose: PoseDistribution<B>,
    /// [batch, 3] tangent noise used for the sampled rotation.
    pub tangent: Tensor<B, 2>,
    /// [batch, 2] translation means.
    pub t_mu: Tensor<B, 2>,
    /// [batch, 2] translation log-variances.
    pub t_logvar: Tensor<B, 2>,
}

/// VAE over pose (SO(3)) and in-plane translation.
#[derive(Module, Debug)]
pub struct PoseVae<B: Backend> {
    encoder: ImageEncoder<B>,
    activation: Relu,
    so3: So3Reparameterize<B>,
    translation: ResidLinearMlp<B>,
    decoder: FtSliceDecoder<B>,
    lattice: Ignored<Lattice>,
}

impl<B: Backend> PoseVae<B> {
    /// Create a new model from configuration.
    pub fn new(config: &PoseVaeConfig, device: &B::Device) -> Result<Self> {
        config.validate().map_err(NeuralCryoError::invalid_config)?;

        let d = config.image_size;
        let h = config.encoder.hidden_dim();
        let lattice = Lattice::xy_plane(d)?;

        let encoder = ImageEncoder::new(&config.encoder_network(), d, h, device)?;
        let so3 = So3Reparameterize::new(
            &So3ReparameterizeConfig::new(h)
                .with_num_layers(Some(1))
                .with_hidden_dim(h)
                .with_mean_encoding(config.mean_encoding.clone()),
            device,
        )?;
        let translation = ResidLinearMlpConfig::new(h, 1, h, 4).init(device);
        let decoder = FtSliceDecoder::new(
            &FtSliceDecoderConfig::new(3, d)
                .with_num_layers(config.decoder_layers)
                .with_hidden_dim(config.decoder_dim),
            device,
        )?;

        log::debug!("PoseVae: D={}, encoder={:?}", d, config.encoder);

        Ok(Self {
            encoder,
            activation: Relu::new(),
            so3,
            translation,
            decoder,
            lattice: Ignored(lattice),
        })
    }

    /// The SO(3) head.
    pub fn so3(&self) -> &So3Reparameterize<B> {
        &self.so3
    }

    /// The slice decoder.
    pub fn decoder(&self) -> &FtSliceDecoder<B> {
        &self.decoder
    }

    fn features(&self, images: Tensor<B, 4>) -> Result<Tensor<B, 2>> {
        let enc = self.encoder.forward(EncoderInput::Single(images))?;
        Ok(self.activation.forward(enc))
    }

    fn split_translation(&self, features: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let t = self.translation.forward(features);
        let [batch, _] = t.dims();
        (t.clone().slice([0..batch, 0..2]), t.slice([0..batch, 2..4]))
    }

    /// Predict pose and translation distributions for `[batch, D, D, 2]` images.
    pub fn encode(&self, images: Tensor<B, 4>) -> Result<PoseEncoding<B>> {
        let features = self.features(images)?;
        let pose = self.so3.forward(features.clone())?;
        let (t_mu, t_logvar) = self.split_translation(features);
        Ok(PoseEncoding {
            pose,
            t_mu,
            t_logvar,
        })
    }

    /// Like [`encode`](Self::encode) but with the raw pose regressor output
    /// (mean parameters followed by untransformed log-variances).
    pub fn encode_raw(&self, images: Tensor<B, 4>) -> Result<(Tensor<B, 2>, Tensor<B, 2>, Tensor<B, 2>)> {
        let features = self.features(images)?;
        let raw = self.so3.forward_raw(features.clone())?;
        let (t_mu, t_logvar) = self.split_translation(features);
        Ok((raw, t_mu, t_logvar))
    }

    /// Decode slices at rotations `[batch, 3, 3]`, shifted by `-t` for `t` `[batch, 2]`.
    ///
    /// Returns `[batch, D, D, 2]`.
    pub fn decode(&self, rot: Tensor<B, 3>, t: Tensor<B, 2>) -> Result<Tensor<B, 4>> {
        let coords = lattice_coords::<B>(&self.lattice.0, &rot.device());
        decode_translated(&self.decoder, &self.lattice.0, coords, rot, t)
    }

    /// Encode, sample pose and translation, and decode.
    pub fn forward(&self, images: Tensor<B, 4>, mode: SamplingMode) -> Result<PoseVaeOutput<B>> {
        let PoseEncoding {
            pose,
            t_mu,
            t_logvar,
        } = self.encode(images)?;

        let sample = self.so3.sample(&pose, mode)?;
        let t = reparameterize(t_mu.clone(), t_logvar.clone(), mode);
        let reconstruction = self.decode(sample.rotation, t)?;

        Ok(PoseVaeOutput {
            reconstruction,
            pose,
            tangent: sample.tangent,
            t_mu,
            t_logvar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EncoderKind, MeanEncoding};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config(d: usize) -> PoseVaeConfig {
        PoseVaeConfig::new(d)
            .with_encoder(EncoderKind::Resid {
                num_layers: 3,
                hidden_dim: 16,
            })
            .with_decoder_layers(1)
            .with_decoder_dim(16)
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let vae = PoseVae::<TestBackend>::new(&config(8), &device).unwrap();
        let images = Tensor::<TestBackend, 4>::zeros([3, 8, 8, 2], &device);

        let out = vae.forward(images, SamplingMode::Stochastic).unwrap();
        assert_eq!(out.reconstruction.dims(), [3, 8, 8, 2]);
        assert_eq!(out.pose.mean.dims(), [3, 4]);
        assert_eq!(out.pose.std.dims(), [3, 3]);
        assert_eq!(out.tangent.dims(), [3, 3]);
        assert_eq!(out.t_mu.dims(), [3, 2]);
        assert_eq!(out.t_logvar.dims(), [3, 2]);
    }

    #[test]
    fn test_encode_raw_width() {
        let device = Default::default();
        let vae = PoseVae::<TestBackend>::new(
            &config(8).with_mean_encoding(MeanEncoding::S2S2),
            &device,
        )
        .unwrap();
        let images = Tensor::<TestBackend, 4>::zeros([2, 8, 8, 2], &device);

        let (raw, t_mu, _) = vae.encode_raw(images).unwrap();
        assert_eq!(raw.dims(), [2, 9]);
        assert_eq!(t_mu.dims(), [2, 2]);
    }

    #[test]
    fn test_deterministic_forward_is_repeatable() {
        let device = Default::default();
        let vae = PoseVae::<TestBackend>::new(&config(8), &device).unwrap();
        let images = Tensor::<TestBackend, 4>::ones([1, 8, 8, 2], &device);

        let a: Vec<f32> = vae
            .forward(images.clone(), SamplingMode::Deterministic)
            .unwrap()
            .reconstruction
            .to_data()
            .to_vec()
            .unwrap();
        let b: Vec<f32> = vae
            .forward(images, SamplingMode::Deterministic)
            .unwrap()
            .reconstruction
            .to_data()
            .to_vec()
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_shallow_encoder() {
        let device = Default::default();
        let shallow = config(8).with_encoder(EncoderKind::Mlp {
            num_layers: 2,
            hidden_dim: 8,
        });
        assert!(PoseVae::<TestBackend>::new(&shallow, &device).is_err());
    }

    #[test]
    fn test_rejects_wrong_image_size() {
        let device = Default::default();
        let vae = PoseVae::<TestBackend>::new(&config(8), &device).unwrap();
        let images = Tensor::<TestBackend, 4>::zeros([1, 4, 4, 2], &device);
        assert!(vae.forward(images, SamplingMode::Stochastic).is_err());
    }
}
