//! MLP (Multi-Layer Perceptron) building blocks.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Configuration for a plain MLP.
#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Input dimension.
    pub input_dim: usize,
    /// Output dimension.
    pub output_dim: usize,
    /// Hidden layer dimensions.
    #[config(default = "vec![]")]
    pub hidden_dims: Vec<usize>,
}

impl MlpConfig {
    /// Plain stack with `num_layers + 1` hidden layers of width `hidden_dim`.
    pub fn uniform(input_dim: usize, num_layers: usize, hidden_dim: usize, output_dim: usize) -> Self {
        Self::new(input_dim, output_dim).with_hidden_dims(vec![hidden_dim; num_layers + 1])
    }

    /// Initialize the MLP.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut layers = Vec::new();
        let mut in_dim = self.input_dim;

        for &out_dim in &self.hidden_dims {
            layers.push(LinearConfig::new(in_dim, out_dim).init(device));
            in_dim = out_dim;
        }

        let output = LinearConfig::new(in_dim, self.output_dim).init(device);

        Mlp {
            layers,
            output,
            activation: Relu::new(),
        }
    }
}

/// Multi-Layer Perceptron module.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    /// Hidden layers.
    layers: Vec<Linear<B>>,
    /// Output layer.
    output: Linear<B>,
    /// Activation function.
    activation: Relu,
}

impl<B: Backend> Mlp<B> {
    /// Forward pass over any leading shape; the last dim is the feature dim.
    ///
    /// Input shape: [..., input_dim]
    /// Output shape: [..., output_dim]
    pub fn forward<const D: usize>(&self, mut x: Tensor<B, D>) -> Tensor<B, D> {
        for layer in &self.layers {
            x = self.activation.forward(layer.forward(x));
        }
        self.output.forward(x)
    }
}

/// Configuration for a residual MLP.
///
/// Layers are `[in→hidden] ReLU`, then `num_layers` × `[hidden→hidden] ReLU`, then
/// `[hidden→out]`. Every layer whose input and output widths match adds its input back.
#[derive(Config, Debug)]
pub struct ResidLinearMlpConfig {
    /// Input dimension.
    pub input_dim: usize,
    /// Number of hidden-to-hidden layers.
    pub num_layers: usize,
    /// Hidden width.
    pub hidden_dim: usize,
    /// Output dimension.
    pub output_dim: usize,
}

impl ResidLinearMlpConfig {
    /// Initialize the residual MLP.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResidLinearMlp<B> {
        let mut hidden = Vec::with_capacity(self.num_layers + 1);
        hidden.push(AffineStage::new(self.input_dim, self.hidden_dim, device));
        for _ in 0..self.num_layers {
            hidden.push(AffineStage::new(self.hidden_dim, self.hidden_dim, device));
        }
        let output = AffineStage::new(self.hidden_dim, self.output_dim, device);

        ResidLinearMlp {
            hidden,
            output,
            activation: Relu::new(),
        }
    }
}

/// One affine layer, with a skip connection when it preserves width.
#[derive(Module, Debug)]
pub struct AffineStage<B: Backend> {
    linear: Linear<B>,
    #[module(skip)]
    residual: bool,
}

impl<B: Backend> AffineStage<B> {
    /// Build a stage mapping `input_dim` to `output_dim`.
    pub fn new(input_dim: usize, output_dim: usize, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(input_dim, output_dim).init(device),
            residual: input_dim == output_dim,
        }
    }

    /// True if the stage adds its input to the affine output.
    pub fn is_residual(&self) -> bool {
        self.residual
    }

    /// `linear(x) + x` for residual stages, `linear(x)` otherwise.
    pub fn forward<const D: usize>(&self, x: Tensor<B, D>) -> Tensor<B, D> {
        if self.residual {
            self.linear.forward(x.clone()) + x
        } else {
            self.linear.forward(x)
        }
    }
}

/// Residual MLP: a list of [`AffineStage`]s interpreted by one forward loop.
#[derive(Module, Debug)]
pub struct ResidLinearMlp<B: Backend> {
    hidden: Vec<AffineStage<B>>,
    output: AffineStage<B>,
    activation: Relu,
}

impl<B: Backend> ResidLinearMlp<B> {
    /// Forward pass over any leading shape; the last dim is the feature dim.
    pub fn forward<const D: usize>(&self, mut x: Tensor<B, D>) -> Tensor<B, D> {
        for stage in &self.hidden {
            x = self.activation.forward(stage.forward(x));
        }
        self.output.forward(x)
    }

    /// Stages in evaluation order, output stage last.
    pub fn stages(&self) -> impl Iterator<Item = &AffineStage<B>> {
        self.hidden.iter().chain(core::iter::once(&self.output))
    }
}
