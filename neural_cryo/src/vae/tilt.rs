//! Pose-inferring VAE over tilt-series pairs.

use burn::module::{Ignored, Module};
use burn::prelude::*;
use cryo_core::{Lattice, Mat3};

use crate::config::{FtSliceDecoderConfig, So3ReparameterizeConfig, TiltVaeConfig};
use crate::error::{ensure_shape, NeuralCryoError, Result};
use crate::nn::mlp::{ResidLinearMlp, ResidLinearMlpConfig};
use crate::nn::{hartley_image, FtSliceDecoder, PoseDistribution, So3Reparameterize};
use crate::sampling::{reparameterize, SamplingMode};

use super::{decode_translated, lattice_coords, matrix_tensor};

/// Everything [`TiltVae::forward`] produces.
#[derive(Debug, Clone)]
pub struct TiltVaeOutput<B: Backend> {
    /// [batch, D, D, 2] reconstruction of the untilted view.
    pub reconstruction: Tensor<B, 4>,
    /// [batch, D, D, 2] reconstruction of the tilted view.
    pub tilted_reconstruction: Tensor<B, 4>,
    /// Rotation distribution.
    pub pose: PoseDistribution<B>,
    /// [batch, 3] tangent noise used for the sampled rotation.
    pub tangent: Tensor<B, 2>,
    /// [batch, 2] translation means.
    pub t_mu: Tensor<B, 2>,
    /// [batch, 2] translation log-variances.
    pub t_logvar: Tensor<B, 2>,
}

/// VAE over pose and translation, observing each particle at two known tilts.
#[derive(Module, Debug)]
pub struct TiltVae<B: Backend> {
    encoder: ResidLinearMlp<B>,
    so3: So3Reparameterize<B>,
    translation: ResidLinearMlp<B>,
    decoder: FtSliceDecoder<B>,
    lattice: Ignored<Lattice>,
    tilt: Ignored<Mat3>,
}

impl<B: Backend> TiltVae<B> {
    /// Create a new model from configuration.
    ///
    /// # Errors
    /// Fails if the configuration is invalid or `tilt` is not a rotation.
    pub fn new(config: &TiltVaeConfig, device: &B::Device) -> Result<Self> {
        config.validate().map_err(NeuralCryoError::invalid_config)?;
        let tilt = Mat3::from_rows(config.tilt).checked_rotation(TiltVaeConfig::ROTATION_TOLERANCE)?;

        let d = config.image_size;
        let h = config.encoder_dim;
        let lattice = Lattice::xy_plane(d)?;

        let encoder = ResidLinearMlpConfig::new(d * d, config.encoder_layers - 3, h, h).init(device);
        let so3 = So3Reparameterize::new(
            &So3ReparameterizeConfig::new(2 * h)
                .with_num_layers(Some(3))
                .with_hidden_dim(h),
            device,
        )?;
        let translation = ResidLinearMlpConfig::new(2 * h, 2, h, 4).init(device);
        let decoder = FtSliceDecoder::new(
            &FtSliceDecoderConfig::new(3, d)
                .with_num_layers(config.decoder_layers)
                .with_hidden_dim(config.decoder_dim),
            device,
        )?;

        log::debug!("TiltVae: D={}, encoder_layers={}", d, config.encoder_layers);

        Ok(Self {
            encoder,
            so3,
            translation,
            decoder,
            lattice: Ignored(lattice),
            tilt: Ignored(tilt),
        })
    }

    /// The fixed tilt rotation.
    pub fn tilt(&self) -> &Mat3 {
        &self.tilt.0
    }

    /// Encode both views, sample pose and translation, and decode both slices.
    ///
    /// The tilted slice is decoded on `coords · tilt · R`.
    pub fn forward(
        &self,
        image: Tensor<B, 4>,
        tilted: Tensor<B, 4>,
        mode: SamplingMode,
    ) -> Result<TiltVaeOutput<B>> {
        ensure_shape(&image.dims(), &tilted.dims())?;
        let d = self.lattice.0.size();
        let device = image.device();

        let enc1 = self.encoder.forward(hartley_image(image, d)?);
        let enc2 = self.encoder.forward(hartley_image(tilted, d)?);
        let features = Tensor::cat(vec![enc1, enc2], 1);

        let pose = self.so3.forward(features.clone())?;
        let sample = self.so3.sample(&pose, mode)?;

        let t = self.translation.forward(features);
        let [batch, _] = t.dims();
        let t_mu = t.clone().slice([0..batch, 0..2]);
        let t_logvar = t.slice([0..batch, 2..4]);
        let shift = reparameterize(t_mu.clone(), t_logvar.clone(), mode);

        let coords = lattice_coords::<B>(&self.lattice.0, &device);
        let tilted_coords = coords.clone().matmul(matrix_tensor::<B>(&self.tilt.0, &device));

        let reconstruction = decode_translated(
            &self.decoder,
            &self.lattice.0,
            coords,
            sample.rotation.clone(),
            shift.clone(),
        )?;
        let tilted_reconstruction = decode_translated(
            &self.decoder,
            &self.lattice.0,
            tilted_coords,
            sample.rotation,
            shift,
        )?;

        Ok(TiltVaeOutput {
            reconstruction,
            tilted_reconstruction,
            pose,
            tangent: sample.tangent,
            t_mu,
            t_logvar,
        })
    }
}
