//! Error types for neural_cryo.

use thiserror::Error;

use cryo_core::CryoCoreError;

/// Errors that can occur while building or evaluating the slice models.
#[derive(Error, Debug)]
pub enum NeuralCryoError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Tensor shape mismatch.
    #[error("tensor shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Error from the pure math layer.
    #[error(transparent)]
    Core(#[from] CryoCoreError),
}

impl NeuralCryoError {
    /// Shorthand for an [`NeuralCryoError::InvalidConfig`] error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for neural_cryo operations.
pub type Result<T> = std::result::Result<T, NeuralCryoError>;

/// Fail with [`NeuralCryoError::ShapeMismatch`] unless `got == expected`.
pub(crate) fn ensure_shape(expected: &[usize], got: &[usize]) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(NeuralCryoError::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = NeuralCryoError::invalid_config("num_layers must be greater than 2");
        assert_eq!(
            err.to_string(),
            "invalid configuration: num_layers must be greater than 2"
        );

        let err = ensure_shape(&[2, 64, 3], &[2, 64, 4]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "tensor shape mismatch: expected [2, 64, 3], got [2, 64, 4]"
        );
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: NeuralCryoError = CryoCoreError::InvalidImageSize { size: 9 }.into();
        assert_eq!(err.to_string(), "image size 9 must be even and at least 2");
    }

    #[test]
    fn test_ensure_shape_ok() {
        assert!(ensure_shape(&[4, 3], &[4, 3]).is_ok());
    }
}
