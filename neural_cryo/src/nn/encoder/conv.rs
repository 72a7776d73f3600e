//! DCGAN-style convolutional encoder for 64×64 images.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, LeakyRelu, LeakyReluConfig, PaddingConfig2d};
use burn::prelude::*;

use crate::config::ConvEncoderConfig;
use crate::error::{ensure_shape, Result};

/// Five 4×4 convolutions shrinking 64×64 → 1×1.
///
/// Channel progression: `1 → h → 2h → 4h → 8h → out`. The first four convolutions
/// use stride 2 and padding 1; the last is a valid 4×4 convolution. Layers 2–4 are
/// batch-normalized.
#[derive(Module, Debug)]
pub struct ConvEncoder<B: Backend> {
    convs: Vec<Conv2d<B>>,
    norms: Vec<BatchNorm<B, 2>>,
    activation: LeakyRelu,
    #[module(skip)]
    output_dim: usize,
}

impl<B: Backend> ConvEncoder<B> {
    /// Create a new convolutional encoder from configuration.
    pub fn new(config: &ConvEncoderConfig, device: &B::Device) -> Self {
        let h = config.hidden_dim;
        let channels = [1, h, 2 * h, 4 * h, 8 * h];

        let mut convs: Vec<Conv2d<B>> = channels
            .windows(2)
            .map(|c| {
                Conv2dConfig::new([c[0], c[1]], [4, 4])
                    .with_stride([2, 2])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .with_bias(false)
                    .init(device)
            })
            .collect();
        convs.push(
            Conv2dConfig::new([8 * h, config.output_dim], [4, 4])
                .with_bias(false)
                .init(device),
        );

        let norms = channels[2..]
            .iter()
            .map(|&c| BatchNormConfig::new(c).init(device))
            .collect();

        Self {
            convs,
            norms,
            activation: LeakyReluConfig::new()
                .with_negative_slope(config.negative_slope)
                .init(),
            output_dim: config.output_dim,
        }
    }

    /// Forward pass.
    ///
    /// Input: [batch, 64 * 64] flattened images
    /// Output: [batch, output_dim]
    pub fn forward(&self, images: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let [batch, pixels] = images.dims();
        let size = ConvEncoderConfig::IMAGE_SIZE;
        ensure_shape(&[batch, size * size], &[batch, pixels])?;
        let mut x: Tensor<B, 4> = images.reshape([batch, 1, size, size]);

        let last = self.convs.len() - 1;
        for (i, conv) in self.convs.iter().enumerate() {
            x = conv.forward(x);
            if i == last {
                break;
            }
            if i > 0 {
                x = self.norms[i - 1].forward(x);
            }
            x = self.activation.forward(x);
        }

        Ok(x.reshape([batch, self.output_dim]))
    }
}
