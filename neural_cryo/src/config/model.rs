//! Configuration types for the variational models.

use burn::config::Config;

use super::network::{EncoderKind, MeanEncoding};

/// Configuration for [`HetOnlyVae`](crate::vae::HetOnlyVae).
#[derive(Config, Debug)]
pub struct HetOnlyVaeConfig {
    /// Image width (and height) D.
    pub image_size: usize,

    /// Heterogeneity latent width.
    #[config(default = 1)]
    pub z_dim: usize,

    /// Image encoder; its output is `2 * z_dim` wide.
    #[config(default = "EncoderKind::Resid { num_layers: 3, hidden_dim: 256 }")]
    pub encoder: EncoderKind,

    /// Residual layers in the slice decoder.
    #[config(default = 3)]
    pub decoder_layers: usize,

    /// Hidden width of the slice decoder.
    #[config(default = 256)]
    pub decoder_dim: usize,
}

impl HetOnlyVaeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.z_dim == 0 {
            return Err("z_dim must be positive".into());
        }
        self.encoder.validate(self.image_size)
    }
}

/// Configuration for [`PoseVae`](crate::vae::PoseVae).
#[derive(Config, Debug)]
pub struct PoseVaeConfig {
    /// Image width (and height) D.
    pub image_size: usize,

    /// Image encoder. For `Mlp` and `Resid`, `num_layers` is the total depth and must
    /// exceed 2; the encoder itself gets `num_layers - 2` hidden-to-hidden layers.
    #[config(default = "EncoderKind::Mlp { num_layers: 3, hidden_dim: 256 }")]
    pub encoder: EncoderKind,

    /// Residual layers in the slice decoder.
    #[config(default = 3)]
    pub decoder_layers: usize,

    /// Hidden width of the slice decoder.
    #[config(default = 256)]
    pub decoder_dim: usize,

    /// Encoding of the rotation mean.
    #[config(default = "MeanEncoding::Quaternion")]
    pub mean_encoding: MeanEncoding,
}

impl PoseVaeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        match self.encoder {
            EncoderKind::Mlp { num_layers, .. } | EncoderKind::Resid { num_layers, .. }
                if num_layers <= 2 =>
            {
                Err(format!("encoder num_layers must exceed 2 (got {})", num_layers))
            }
            EncoderKind::Tilt { .. } => {
                Err("pose VAE encodes single images; use TiltVae for pairs".into())
            }
            _ => self.encoder.validate(self.image_size),
        }
    }

    /// The encoder actually built: total depth converted to hidden-to-hidden layers.
    pub fn encoder_network(&self) -> EncoderKind {
        match self.encoder {
            EncoderKind::Mlp {
                num_layers,
                hidden_dim,
            } => EncoderKind::Mlp {
                num_layers: num_layers.saturating_sub(2),
                hidden_dim,
            },
            EncoderKind::Resid {
                num_layers,
                hidden_dim,
            } => EncoderKind::Resid {
                num_layers: num_layers.saturating_sub(2),
                hidden_dim,
            },
            ref other => other.clone(),
        }
    }
}

/// Configuration for [`TiltVae`](crate::vae::TiltVae).
#[derive(Config, Debug)]
pub struct TiltVaeConfig {
    /// Image width (and height) D.
    pub image_size: usize,

    /// Row-major rotation relating the tilted view to the untilted one.
    pub tilt: [[f32; 3]; 3],

    /// Total encoder depth; must exceed 2.
    #[config(default = 4)]
    pub encoder_layers: usize,

    /// Hidden width of the encoder, pose head and translation head.
    #[config(default = 256)]
    pub encoder_dim: usize,

    /// Residual layers in the slice decoder.
    #[config(default = 3)]
    pub decoder_layers: usize,

    /// Hidden width of the slice decoder.
    #[config(default = 256)]
    pub decoder_dim: usize,
}

impl TiltVaeConfig {
    /// Tolerance used when checking that `tilt` is a rotation.
    pub const ROTATION_TOLERANCE: f32 = 1e-4;

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.encoder_layers <= 2 {
            return Err(format!(
                "encoder_layers must exceed 2 (got {})",
                self.encoder_layers
            ));
        }
        if self.encoder_dim == 0 {
            return Err("encoder_dim must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_het_only_defaults() {
        let config = HetOnlyVaeConfig::new(32);
        assert_eq!(config.z_dim, 1);
        assert!(config.validate().is_ok());
        assert!(config.with_z_dim(0).validate().is_err());
    }

    #[test]
    fn test_pose_vae_depth() {
        let config = PoseVaeConfig::new(16).with_encoder(EncoderKind::Resid {
            num_layers: 5,
            hidden_dim: 32,
        });
        assert!(config.validate().is_ok());
        assert_eq!(
            config.encoder_network(),
            EncoderKind::Resid {
                num_layers: 3,
                hidden_dim: 32
            }
        );

        let shallow = config.with_encoder(EncoderKind::Mlp {
            num_layers: 2,
            hidden_dim: 32,
        });
        assert!(shallow.validate().is_err());
    }

    #[test]
    fn test_pose_vae_rejects_tilt_and_small_conv() {
        let tilt = PoseVaeConfig::new(16).with_encoder(EncoderKind::Tilt {
            num_layers: 4,
            hidden_dim: 8,
        });
        assert!(tilt.validate().is_err());

        let conv = PoseVaeConfig::new(16).with_encoder(EncoderKind::Conv { hidden_dim: 8 });
        assert!(conv.validate().is_err());

        let conv = PoseVaeConfig::new(crate::config::ConvEncoderConfig::IMAGE_SIZE).with_encoder(EncoderKind::Conv { hidden_dim: 8 });
        assert!(conv.validate().is_ok());
    }

    #[test]
    fn test_tilt_vae_depth() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(TiltVaeConfig::new(16, identity).validate().is_ok());
        assert!(TiltVaeConfig::new(16, identity)
            .with_encoder_layers(2)
            .validate()
            .is_err());
    }
}
