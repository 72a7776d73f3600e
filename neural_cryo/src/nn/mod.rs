//! Neural network modules for Fourier-slice reconstruction.
//!
//! This module provides:
//! - Encoders: map Hartley images to feature vectors
//! - Decoders: map rotated frequency lattices to Fourier-space slices
//! - The SO(3) reparameterization head
//! - MLP building blocks shared by all of the above

pub mod decoder;
pub mod encoder;
pub mod mlp;
pub mod pose;

pub use decoder::{conjugate, translate, FtSliceDecoder};
pub use encoder::{hartley_image, ConvEncoder, EncoderInput, ImageEncoder, TiltEncoder};
pub use mlp::{AffineStage, Mlp, MlpConfig, ResidLinearMlp, ResidLinearMlpConfig};
pub use pose::{PoseDistribution, PoseSample, Regressor, So3Reparameterize};
