//! Reparameterization of encoder features into a distribution over SO(3).
//!
//! The regressor predicts a mean rotation and a per-axis log-variance in the Lie
//! algebra. Samples are drawn as `R = R_mean · exp(ε ⊙ σ)`, a Gaussian in the tangent
//! space at the mean, which keeps the sample differentiable in both the mean and σ.

use burn::module::{Ignored, Module};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;

use crate::config::{MeanEncoding, So3ReparameterizeConfig};
use crate::error::{ensure_shape, NeuralCryoError, Result};
use crate::lie;
use crate::nn::mlp::{ResidLinearMlp, ResidLinearMlpConfig};
use crate::sampling::{standard_normal_like, SamplingMode};

/// Map from features to `[mean ‖ logvar]`.
#[derive(Module, Debug)]
pub enum Regressor<B: Backend> {
    /// Single affine map.
    Linear(Linear<B>),
    /// Residual MLP.
    Resid(ResidLinearMlp<B>),
}

impl<B: Backend> Regressor<B> {
    /// Forward pass: [batch, input_dim] → [batch, output_dim].
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Regressor::Linear(linear) => linear.forward(x),
            Regressor::Resid(mlp) => mlp.forward(x),
        }
    }
}

/// Mean rotation parameters and tangent-space standard deviations.
#[derive(Debug, Clone)]
pub struct PoseDistribution<B: Backend> {
    /// [batch, 4] quaternions or [batch, 6] S2×S2 pairs.
    pub mean: Tensor<B, 2>,
    /// [batch, 3] standard deviations, `exp(logvar / 2)`.
    pub std: Tensor<B, 2>,
}

/// A sampled rotation together with the tangent vector that produced it.
#[derive(Debug, Clone)]
pub struct PoseSample<B: Backend> {
    /// [batch, 3, 3] rotation matrices.
    pub rotation: Tensor<B, 3>,
    /// [batch, 3] tangent noise `ε ⊙ σ`; σ itself when deterministic.
    pub tangent: Tensor<B, 2>,
}

/// SO(3) reparameterization head.
#[derive(Module, Debug)]
pub struct So3Reparameterize<B: Backend> {
    /// Feature regressor.
    regressor: Regressor<B>,
    /// Encoding of the mean.
    mean_encoding: Ignored<MeanEncoding>,
    /// Expected feature width.
    #[module(skip)]
    input_dim: usize,
}

impl<B: Backend> So3Reparameterize<B> {
    /// Create a new head from configuration.
    pub fn new(config: &So3ReparameterizeConfig, device: &B::Device) -> Result<Self> {
        config.validate().map_err(NeuralCryoError::invalid_config)?;

        let output_dim = config.output_dim();
        let regressor = match config.num_layers {
            Some(num_layers) => Regressor::Resid(
                ResidLinearMlpConfig::new(config.input_dim, num_layers, config.hidden_dim, output_dim)
                    .init(device),
            ),
            None => Regressor::Linear(LinearConfig::new(config.input_dim, output_dim).init(device)),
        };

        log::debug!(
            "So3Reparameterize: input_dim={}, layers={:?}, mean={:?}",
            config.input_dim,
            config.num_layers,
            config.mean_encoding
        );

        Ok(Self {
            regressor,
            mean_encoding: Ignored(config.mean_encoding.clone()),
            input_dim: config.input_dim,
        })
    }

    /// Encoding of the mean rotation.
    pub fn mean_encoding(&self) -> &MeanEncoding {
        &self.mean_encoding.0
    }

    /// Regressor output `[mean ‖ logvar]` with the log-variance untransformed.
    pub fn forward_raw(&self, features: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let [batch, dim] = features.dims();
        ensure_shape(&[batch, self.input_dim], &[batch, dim])?;
        Ok(self.regressor.forward(features))
    }

    /// Predict the pose distribution.
    ///
    /// Input shape: [batch, input_dim]
    pub fn forward(&self, features: Tensor<B, 2>) -> Result<PoseDistribution<B>> {
        let [batch, _] = features.dims();
        let m = self.mean_encoding.0.mean_dim();

        let raw = self.forward_raw(features)?;
        let mean = raw.clone().slice([0..batch, 0..m]);
        let logvar = raw.slice([0..batch, m..m + 3]);

        Ok(PoseDistribution {
            mean,
            std: logvar.mul_scalar(0.5).exp(),
        })
    }

    /// Decode the mean parameters into [batch, 3, 3] rotations.
    pub fn mean_rotation(&self, dist: &PoseDistribution<B>) -> Result<Tensor<B, 3>> {
        match self.mean_encoding.0 {
            MeanEncoding::Quaternion => lie::quaternions_to_so3(dist.mean.clone()),
            MeanEncoding::S2S2 => lie::s2s2_packed_to_so3(dist.mean.clone()),
        }
    }

    /// Draw rotations from `dist`.
    ///
    /// Stochastic: `R_mean · expmap(ε ⊙ σ)` with `ε ~ N(0, I₃)`.
    /// Deterministic: `R_mean`, with σ returned as the tangent.
    pub fn sample(&self, dist: &PoseDistribution<B>, mode: SamplingMode) -> Result<PoseSample<B>> {
        let [batch, dim] = dist.mean.dims();
        ensure_shape(&[batch, self.mean_encoding.0.mean_dim()], &[batch, dim])?;
        ensure_shape(&[batch, 3], &dist.std.dims())?;

        let mean_rot = self.mean_rotation(dist)?;
        match mode {
            SamplingMode::Deterministic => Ok(PoseSample {
                rotation: mean_rot,
                tangent: dist.std.clone(),
            }),
            SamplingMode::Stochastic => {
                let tangent = standard_normal_like(&dist.std) * dist.std.clone();
                let rotation = mean_rot.matmul(lie::expmap(tangent.clone())?);
                Ok(PoseSample { rotation, tangent })
            }
        }
    }
}
