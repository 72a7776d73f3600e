//! Explicit stochastic/deterministic switch and Euclidean reparameterization.

use burn::prelude::*;
use burn::tensor::Distribution;

/// Whether latent variables are sampled or collapsed to their means.
///
/// Passed to every call that samples. Nothing in this crate stores or mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMode {
    /// Draw reparameterized samples (training).
    #[default]
    Stochastic,
    /// Return distribution means (evaluation).
    Deterministic,
}

/// Draw standard-normal noise with the shape and device of `like`.
pub fn standard_normal_like<B: Backend, const D: usize>(like: &Tensor<B, D>) -> Tensor<B, D> {
    Tensor::random(like.shape(), Distribution::Normal(0.0, 1.0), &like.device())
}

/// Gaussian reparameterization `mu + ε · exp(logvar / 2)`, or `mu` when deterministic.
///
/// Used for translation and heterogeneity latents.
pub fn reparameterize<B: Backend, const D: usize>(
    mu: Tensor<B, D>,
    logvar: Tensor<B, D>,
    mode: SamplingMode,
) -> Tensor<B, D> {
    match mode {
        SamplingMode::Deterministic => mu,
        SamplingMode::Stochastic => {
            let std = logvar.mul_scalar(0.5).exp();
            let eps = standard_normal_like(&std);
            mu + eps * std
        }
    }
}
