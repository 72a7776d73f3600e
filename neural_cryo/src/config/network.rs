//! Neural network configuration types.

use burn::config::Config;

/// Configuration for the Fourier-slice decoder.
#[derive(Config, Debug)]
pub struct FtSliceDecoderConfig {
    /// Per-point input width: 3 coordinates plus the latent code.
    pub input_dim: usize,

    /// Image width (and height) D. Must be even.
    pub image_size: usize,

    /// Number of hidden-to-hidden residual layers.
    #[config(default = 3)]
    pub num_layers: usize,

    /// Hidden width of the residual MLP.
    #[config(default = 256)]
    pub hidden_dim: usize,
}

impl FtSliceDecoderConfig {
    /// Decoder for coordinates followed by a `z_dim`-wide latent code.
    pub fn with_latent(z_dim: usize, image_size: usize) -> Self {
        Self::new(3 + z_dim, image_size)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_dim < 3 {
            return Err(format!(
                "input_dim must be at least 3 (got {})",
                self.input_dim
            ));
        }
        if self.image_size < 2 || self.image_size % 2 != 0 {
            return Err(format!(
                "image_size must be even and at least 2 (got {})",
                self.image_size
            ));
        }
        if self.hidden_dim == 0 {
            return Err("hidden_dim must be positive".into());
        }
        Ok(())
    }
}

/// How the rotation mean is encoded in the regressor output.
#[derive(Config, Debug, PartialEq)]
pub enum MeanEncoding {
    /// Scalar-first quaternion `[w, x, y, z]`, any norm.
    Quaternion,
    /// Two 3-vectors orthonormalized by Gram–Schmidt.
    S2S2,
}

impl MeanEncoding {
    /// Number of regressor outputs used for the mean.
    pub fn mean_dim(&self) -> usize {
        match self {
            MeanEncoding::Quaternion => 4,
            MeanEncoding::S2S2 => 6,
        }
    }
}

/// Configuration for the SO(3) reparameterization head.
#[derive(Config, Debug)]
pub struct So3ReparameterizeConfig {
    /// Width of the incoming features.
    pub input_dim: usize,

    /// Residual layers in the regressor; `None` selects a single linear map.
    #[config(default = "None")]
    pub num_layers: Option<usize>,

    /// Hidden width of the residual regressor.
    #[config(default = 256)]
    pub hidden_dim: usize,

    /// Encoding of the rotation mean.
    #[config(default = "MeanEncoding::Quaternion")]
    pub mean_encoding: MeanEncoding,
}

impl So3ReparameterizeConfig {
    /// Regressor output width: mean parameters followed by 3 log-variances.
    pub fn output_dim(&self) -> usize {
        self.mean_encoding.mean_dim() + 3
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be positive".into());
        }
        if self.num_layers.is_some() && self.hidden_dim == 0 {
            return Err("hidden_dim must be positive for a residual regressor".into());
        }
        Ok(())
    }
}

/// Image encoder architecture, selected once at construction.
#[derive(Config, Debug, PartialEq)]
pub enum EncoderKind {
    /// Plain MLP over the flattened image.
    Mlp {
        /// Hidden-to-hidden layers.
        num_layers: usize,
        /// Hidden width.
        hidden_dim: usize,
    },
    /// Residual MLP over the flattened image.
    Resid {
        /// Hidden-to-hidden layers.
        num_layers: usize,
        /// Hidden width.
        hidden_dim: usize,
    },
    /// DCGAN-style convolutional encoder for 64×64 images.
    Conv {
        /// Base channel count.
        hidden_dim: usize,
    },
    /// Shared encoder over an (untilted, tilted) image pair.
    Tilt {
        /// Total depth; must exceed 2.
        num_layers: usize,
        /// Hidden width.
        hidden_dim: usize,
    },
}

impl EncoderKind {
    /// Hidden width of the encoder.
    pub fn hidden_dim(&self) -> usize {
        match self {
            EncoderKind::Mlp { hidden_dim, .. }
            | EncoderKind::Resid { hidden_dim, .. }
            | EncoderKind::Conv { hidden_dim }
            | EncoderKind::Tilt { hidden_dim, .. } => *hidden_dim,
        }
    }

    /// Validate the architecture against an image size.
    pub fn validate(&self, image_size: usize) -> Result<(), String> {
        if self.hidden_dim() == 0 {
            return Err("encoder hidden_dim must be positive".into());
        }
        match self {
            EncoderKind::Conv { .. } if image_size != ConvEncoderConfig::IMAGE_SIZE => Err(format!(
                "convolutional encoder requires {0}x{0} images (got {1}x{1})",
                ConvEncoderConfig::IMAGE_SIZE,
                image_size
            )),
            EncoderKind::Tilt { num_layers, .. } if *num_layers <= 2 => Err(format!(
                "tilt encoder requires num_layers > 2 (got {})",
                num_layers
            )),
            _ => Ok(()),
        }
    }
}

/// Configuration for the convolutional encoder.
#[derive(Config, Debug)]
pub struct ConvEncoderConfig {
    /// Base channel count; layers use 1×, 2×, 4× and 8× this.
    pub hidden_dim: usize,

    /// Output feature width.
    pub output_dim: usize,

    /// LeakyReLU negative slope.
    #[config(default = 0.2)]
    pub negative_slope: f64,
}

impl ConvEncoderConfig {
    /// The only supported image size.
    pub const IMAGE_SIZE: usize = 64;
}

/// Configuration for the tilt-pair encoder.
#[derive(Config, Debug)]
pub struct TiltEncoderConfig {
    /// Flattened image size D².
    pub input_dim: usize,

    /// Total depth; the shared stage gets `num_layers - 2` residual layers.
    pub num_layers: usize,

    /// Hidden width.
    pub hidden_dim: usize,

    /// Output feature width.
    pub output_dim: usize,
}

impl TiltEncoderConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_layers <= 2 {
            return Err(format!(
                "tilt encoder requires num_layers > 2 (got {})",
                self.num_layers
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_config_defaults() {
        let config = FtSliceDecoderConfig::new(3, 32);
        assert_eq!(config.num_layers, 3);
        assert_eq!(config.hidden_dim, 256);
        assert!(config.validate().is_ok());

        let config = FtSliceDecoderConfig::with_latent(8, 64);
        assert_eq!(config.input_dim, 11);
    }

    #[test]
    fn test_decoder_config_rejects_bad_sizes() {
        assert!(FtSliceDecoderConfig::new(2, 32).validate().is_err());
        assert!(FtSliceDecoderConfig::new(3, 31).validate().is_err());
        assert!(FtSliceDecoderConfig::new(3, 0).validate().is_err());
    }

    #[test]
    fn test_so3_output_dim() {
        let config = So3ReparameterizeConfig::new(128);
        assert_eq!(config.num_layers, None);
        assert_eq!(config.output_dim(), 7);

        let config = config.with_mean_encoding(MeanEncoding::S2S2);
        assert_eq!(config.output_dim(), 9);
    }

    #[test]
    fn test_encoder_kind_validation() {
        let conv = EncoderKind::Conv { hidden_dim: 16 };
        assert!(conv.validate(64).is_ok());
        assert!(conv.validate(32).is_err());

        let tilt = EncoderKind::Tilt {
            num_layers: 2,
            hidden_dim: 16,
        };
        assert!(tilt.validate(32).is_err());

        let resid = EncoderKind::Resid {
            num_layers: 0,
            hidden_dim: 16,
        };
        assert!(resid.validate(30).is_ok());
        assert_eq!(resid.hidden_dim(), 16);
    }

    #[test]
    fn test_tilt_encoder_config() {
        assert!(TiltEncoderConfig::new(64, 3, 16, 8).validate().is_ok());
        assert!(TiltEncoderConfig::new(64, 2, 16, 8).validate().is_err());
    }
}
