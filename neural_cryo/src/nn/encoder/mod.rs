//! Image encoders producing feature vectors for the pose and latent heads.
//!
//! All encoders see real Hartley images: each `(re, im)` pixel pair is collapsed
//! to `re - im` and the image flattened to `[batch, D²]`.

mod conv;
mod tilt;

pub use conv::ConvEncoder;
pub use tilt::TiltEncoder;

use burn::module::Module;
use burn::prelude::*;

use crate::config::{ConvEncoderConfig, EncoderKind, TiltEncoderConfig};
use crate::error::{ensure_shape, NeuralCryoError, Result};
use crate::nn::mlp::{Mlp, MlpConfig, ResidLinearMlp, ResidLinearMlpConfig};

/// Images handed to an [`ImageEncoder`], each `[batch, D, D, 2]`.
#[derive(Debug, Clone)]
pub enum EncoderInput<B: Backend> {
    /// One image per example.
    Single(Tensor<B, 4>),
    /// Untilted and tilted views of the same particle.
    Pair(Tensor<B, 4>, Tensor<B, 4>),
}

/// Collapse `[batch, D, D, 2]` Hartley pairs to a flattened `[batch, D²]` real image.
pub fn hartley_image<B: Backend>(image: Tensor<B, 4>, size: usize) -> Result<Tensor<B, 2>> {
    let dims = image.dims();
    let batch = dims[0];
    ensure_shape(&[batch, size, size, 2], &dims)?;

    let re = image.clone().slice([0..batch, 0..size, 0..size, 0..1]);
    let im = image.slice([0..batch, 0..size, 0..size, 1..2]);
    Ok((re - im).reshape([batch, size * size]))
}

/// Encoder network, one variant per [`EncoderKind`].
#[derive(Module, Debug)]
pub enum EncoderNetwork<B: Backend> {
    /// Plain MLP.
    Mlp(Mlp<B>),
    /// Residual MLP.
    Resid(ResidLinearMlp<B>),
    /// Convolutional encoder.
    Conv(ConvEncoder<B>),
    /// Tilt-pair encoder.
    Tilt(TiltEncoder<B>),
}

/// Image encoder selected once at construction.
#[derive(Module, Debug)]
pub struct ImageEncoder<B: Backend> {
    network: EncoderNetwork<B>,
    #[module(skip)]
    image_size: usize,
    #[module(skip)]
    output_dim: usize,
}

impl<B: Backend> ImageEncoder<B> {
    /// Build the encoder for `kind` over D×D images.
    ///
    /// # Errors
    /// [`NeuralCryoError::InvalidConfig`] if `kind` cannot handle `image_size`.
    pub fn new(
        kind: &EncoderKind,
        image_size: usize,
        output_dim: usize,
        device: &B::Device,
    ) -> Result<Self> {
        kind.validate(image_size)
            .map_err(NeuralCryoError::invalid_config)?;

        let input_dim = image_size * image_size;
        let network = match *kind {
            EncoderKind::Mlp {
                num_layers,
                hidden_dim,
            } => EncoderNetwork::Mlp(
                MlpConfig::uniform(input_dim, num_layers, hidden_dim, output_dim).init(device),
            ),
            EncoderKind::Resid {
                num_layers,
                hidden_dim,
            } => EncoderNetwork::Resid(
                ResidLinearMlpConfig::new(input_dim, num_layers, hidden_dim, output_dim)
                    .init(device),
            ),
            EncoderKind::Conv { hidden_dim } => EncoderNetwork::Conv(ConvEncoder::new(
                &ConvEncoderConfig::new(hidden_dim, output_dim),
                device,
            )),
            EncoderKind::Tilt {
                num_layers,
                hidden_dim,
            } => EncoderNetwork::Tilt(TiltEncoder::new(
                &TiltEncoderConfig::new(input_dim, num_layers, hidden_dim, output_dim),
                device,
            )?),
        };

        log::debug!(
            "ImageEncoder: {:?} on {}x{} images -> {}",
            kind,
            image_size,
            image_size,
            output_dim
        );

        Ok(Self {
            network,
            image_size,
            output_dim,
        })
    }

    /// Image width (and height) D.
    pub fn image_size(&self) -> usize {
        self.image_size
    }

    /// Feature width.
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// True if the encoder expects [`EncoderInput::Pair`].
    pub fn expects_pair(&self) -> bool {
        matches!(self.network, EncoderNetwork::Tilt(_))
    }

    /// Encode images into `[batch, output_dim]` features.
    pub fn forward(&self, input: EncoderInput<B>) -> Result<Tensor<B, 2>> {
        let d = self.image_size;
        match (&self.network, input) {
            (EncoderNetwork::Tilt(net), EncoderInput::Pair(image, tilted)) => {
                let (batch, tilted_batch) = (image.dims()[0], tilted.dims()[0]);
                ensure_shape(&[batch], &[tilted_batch])?;
                Ok(net.forward(hartley_image(image, d)?, hartley_image(tilted, d)?))
            }
            (EncoderNetwork::Tilt(_), EncoderInput::Single(_)) => Err(
                NeuralCryoError::invalid_config("tilt encoder expects an image pair"),
            ),
            (_, EncoderInput::Pair(..)) => Err(NeuralCryoError::invalid_config(
                "only the tilt encoder accepts image pairs",
            )),
            (EncoderNetwork::Mlp(net), EncoderInput::Single(image)) => {
                Ok(net.forward(hartley_image(image, d)?))
            }
            (EncoderNetwork::Resid(net), EncoderInput::Single(image)) => {
                Ok(net.forward(hartley_image(image, d)?))
            }
            (EncoderNetwork::Conv(net), EncoderInput::Single(image)) => {
                net.forward(hartley_image(image, d)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_hartley_image() {
        let device = Default::default();
        let image = Tensor::<TestBackend, 4>::from_data(
            [[[[3.0f32, 1.0], [0.5, 0.5]], [[-1.0, 2.0], [0.0, -4.0]]]],
            &device,
        );
        let flat: Vec<f32> = hartley_image(image, 2).unwrap().to_data().to_vec().unwrap();
        assert_eq!(flat, vec![2.0, 0.0, -3.0, 4.0]);
    }

    #[test]
    fn test_hartley_image_rejects_wrong_size() {
        let image = Tensor::<TestBackend, 4>::zeros([1, 4, 4, 2], &Default::default());
        assert!(hartley_image(image, 8).is_err());
    }

    #[test]
    fn test_resid_and_mlp_encoders() {
        let device = Default::default();
        let image = Tensor::<TestBackend, 4>::zeros([2, 8, 8, 2], &device);

        for kind in [
            EncoderKind::Mlp {
                num_layers: 1,
                hidden_dim: 16,
            },
            EncoderKind::Resid {
                num_layers: 1,
                hidden_dim: 16,
            },
        ] {
            let encoder = ImageEncoder::<TestBackend>::new(&kind, 8, 5, &device).unwrap();
            assert!(!encoder.expects_pair());
            let out = encoder.forward(EncoderInput::Single(image.clone())).unwrap();
            assert_eq!(out.dims(), [2, 5]);
        }
    }

    #[test]
    fn test_conv_encoder_requires_64() {
        let device = Default::default();
        let kind = EncoderKind::Conv { hidden_dim: 4 };
        let err = ImageEncoder::<TestBackend>::new(&kind, 32, 8, &device).unwrap_err();
        assert!(matches!(err, NeuralCryoError::InvalidConfig { .. }));
    }

    #[test]
    fn test_tilt_encoder_arity() {
        let device = Default::default();
        let kind = EncoderKind::Tilt {
            num_layers: 3,
            hidden_dim: 8,
        };
        let encoder = ImageEncoder::<TestBackend>::new(&kind, 4, 6, &device).unwrap();
        assert!(encoder.expects_pair());

        let image = Tensor::<TestBackend, 4>::zeros([3, 4, 4, 2], &device);
        assert!(encoder.forward(EncoderInput::Single(image.clone())).is_err());

        let out = encoder
            .forward(EncoderInput::Pair(image.clone(), image))
            .unwrap();
        assert_eq!(out.dims(), [3, 6]);
    }

    #[test]
    fn test_single_encoder_rejects_pair() {
        let device = Default::default();
        let kind = EncoderKind::Resid {
            num_layers: 0,
            hidden_dim: 8,
        };
        let encoder = ImageEncoder::<TestBackend>::new(&kind, 4, 6, &device).unwrap();
        let image = Tensor::<TestBackend, 4>::zeros([1, 4, 4, 2], &device);
        assert!(encoder
            .forward(EncoderInput::Pair(image.clone(), image))
            .is_err());
    }
}
