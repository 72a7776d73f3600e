//! Configuration types for neural_cryo.
//!
//! This module provides Burn-style configuration structs for the networks and the
//! variational models built from them.

mod model;
mod network;

pub use model::{HetOnlyVaeConfig, PoseVaeConfig, TiltVaeConfig};
pub use network::{
    ConvEncoderConfig, EncoderKind, FtSliceDecoderConfig, MeanEncoding, So3ReparameterizeConfig,
    TiltEncoderConfig,
};
