//! # neural_cryo
//!
//! Differentiable Fourier-slice reconstruction with Burn for cryo-EM images.
//!
//! This crate turns 2D projection images into a pose on SO(3) and a structural latent,
//! then decodes the matching central slice of the 3D Fourier transform. It builds on
//! the pure math in `cryo_core`.
//!
//! ## Features
//!
//! - **Slice decoder**: `FtSliceDecoder<B>` evaluates half of a centrosymmetric lattice
//!   and fills the rest by conjugate mirroring
//! - **SO(3) reparameterization**: `So3Reparameterize<B>` samples rotations through
//!   the exponential map
//! - **Phase-shift translation**: closed-form sub-pixel shifts in Fourier space
//! - **Encoders**: MLP, residual MLP, DCGAN-style convolutional and tilt-pair encoders
//! - **VAEs**: heterogeneity-only, pose-inferring and tilt-series models
//!
//! ## Quick Start
//!
//! ```ignore
//! use neural_cryo::prelude::*;
//! use burn::backend::NdArray;
//!
//! let device = Default::default();
//! let config = FtSliceDecoderConfig::with_latent(8, 64);
//! let decoder = FtSliceDecoder::<NdArray>::new(&config, &device)?;
//!
//! // lattice: [batch, 64 * 64, 3 + 8]
//! let slice = decoder.decode_full_image(lattice)?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! cryo_core (pure math: Lie algebra, index sets, lattice)
//!     │
//!     ▼
//! neural_cryo (burn: lie, nn, vae)
//!     │
//!     ▼
//! cryo_demos (runnable binaries)
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `ndarray` (default): CPU backend using ndarray
//! - `wgpu`: GPU acceleration via WebGPU
//! - `autodiff`: Autodiff backend decorator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod lie;
pub mod nn;
pub mod sampling;
pub mod vae;

pub use config::{
    EncoderKind, FtSliceDecoderConfig, HetOnlyVaeConfig, MeanEncoding, PoseVaeConfig,
    So3ReparameterizeConfig, TiltVaeConfig,
};
pub use error::{NeuralCryoError, Result};
pub use nn::{FtSliceDecoder, ImageEncoder, PoseDistribution, PoseSample, So3Reparameterize};
pub use sampling::{reparameterize, SamplingMode};
pub use vae::{HetOnlyVae, PoseVae, TiltVae};

pub use cryo_core::{HalfPlaneIndices, Lattice, Mat3, Vec3};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{
        ConvEncoderConfig, EncoderKind, FtSliceDecoderConfig, HetOnlyVaeConfig, MeanEncoding,
        PoseVaeConfig, So3ReparameterizeConfig, TiltEncoderConfig, TiltVaeConfig,
    };
    pub use crate::error::{NeuralCryoError, Result};
    pub use crate::lie::{expmap, quaternions_to_so3, s2s2_packed_to_so3, s2s2_to_so3, skew};
    pub use crate::nn::{
        conjugate, hartley_image, translate, AffineStage, ConvEncoder, EncoderInput,
        FtSliceDecoder, ImageEncoder, Mlp, MlpConfig, PoseDistribution, PoseSample,
        ResidLinearMlp, ResidLinearMlpConfig, So3Reparameterize, TiltEncoder,
    };
    pub use crate::sampling::{reparameterize, SamplingMode};
    pub use crate::vae::{
        lattice_coords, lattice_wavevectors, rotate_coords, HetOnlyOutput, HetOnlyVae,
        PoseEncoding, PoseVae, PoseVaeOutput, TiltVae, TiltVaeOutput,
    };

    pub use cryo_core::{HalfPlaneIndices, Lattice, Mat3, Vec3};
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_public_api() {
        let _decoder = FtSliceDecoderConfig::new(3, 16);
        let _so3 = So3ReparameterizeConfig::new(32);
        let _vae = PoseVaeConfig::new(16);
        assert_eq!(SamplingMode::default(), SamplingMode::Stochastic);
    }

    #[test]
    fn test_decoder_shares_cached_indices() {
        let device = Default::default();
        let a = FtSliceDecoder::<TestBackend>::new(
            &FtSliceDecoderConfig::new(3, 12).with_hidden_dim(8).with_num_layers(0),
            &device,
        )
        .unwrap();
        let b = FtSliceDecoder::<TestBackend>::new(
            &FtSliceDecoderConfig::new(5, 12).with_hidden_dim(8).with_num_layers(0),
            &device,
        )
        .unwrap();
        assert!(core::ptr::eq(a.indices(), b.indices()));
        assert_eq!(a.image_size(), 12);
        assert_eq!(b.input_dim(), 5);
    }

    #[test]
    fn test_record_round_trip_keeps_metadata() {
        use burn::module::Module;

        let device = Default::default();
        let decoder = FtSliceDecoder::<TestBackend>::new(
            &FtSliceDecoderConfig::new(3, 8).with_hidden_dim(8).with_num_layers(0),
            &device,
        )
        .unwrap();
        let restored = decoder.clone().load_record(decoder.clone().into_record());
        assert_eq!(restored.image_size(), 8);
        assert!(core::ptr::eq(restored.indices(), decoder.indices()));

        let head = So3Reparameterize::<TestBackend>::new(
            &So3ReparameterizeConfig::new(4).with_mean_encoding(MeanEncoding::S2S2),
            &device,
        )
        .unwrap();
        let restored = head.clone().load_record(head.into_record());
        assert_eq!(restored.mean_encoding(), &MeanEncoding::S2S2);

        let tilt = Mat3::from_rows([[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]]);
        let vae = TiltVae::<TestBackend>::new(
            &TiltVaeConfig::new(8, tilt.rows)
                .with_encoder_layers(3)
                .with_encoder_dim(8)
                .with_decoder_layers(0)
                .with_decoder_dim(8),
            &device,
        )
        .unwrap();
        let restored = vae.clone().load_record(vae.into_record());
        assert_eq!(restored.tilt(), &tilt);

        let conv = nn::ConvEncoder::<TestBackend>::new(&config::ConvEncoderConfig::new(1, 2), &device);
        assert!(conv.num_params() > 0);
        let restored = conv.clone().load_record(conv.into_record());
        let out = restored
            .forward(burn::tensor::Tensor::zeros([1, 64 * 64], &device))
            .unwrap();
        assert_eq!(out.dims(), [1, 2]);
    }
}
