//! Encoder for tilt-series image pairs.

use burn::module::Module;
use burn::prelude::*;

use crate::config::TiltEncoderConfig;
use crate::error::{NeuralCryoError, Result};
use crate::nn::mlp::{ResidLinearMlp, ResidLinearMlpConfig};

/// Shared residual encoder applied to both images, followed by a joint head.
#[derive(Module, Debug)]
pub struct TiltEncoder<B: Backend> {
    /// `ResidLinearMlp(D², n - 2, h, h)`, applied to each image.
    shared: ResidLinearMlp<B>,
    /// `ResidLinearMlp(2h, 2, h, out)` on the concatenated encodings.
    head: ResidLinearMlp<B>,
}

impl<B: Backend> TiltEncoder<B> {
    /// Create a new tilt encoder from configuration.
    pub fn new(config: &TiltEncoderConfig, device: &B::Device) -> Result<Self> {
        config.validate().map_err(NeuralCryoError::invalid_config)?;

        let h = config.hidden_dim;
        Ok(Self {
            shared: ResidLinearMlpConfig::new(config.input_dim, config.num_layers - 2, h, h).init(device),
            head: ResidLinearMlpConfig::new(2 * h, 2, h, config.output_dim).init(device),
        })
    }

    /// Forward pass.
    ///
    /// Inputs: two [batch, D²] flattened images
    /// Output: [batch, output_dim]
    pub fn forward(&self, image: Tensor<B, 2>, tilted: Tensor<B, 2>) -> Tensor<B, 2> {
        let a = self.shared.forward(image);
        let b = self.shared.forward(tilted);
        self.head.forward(Tensor::cat(vec![a, b], 1))
    }
}
