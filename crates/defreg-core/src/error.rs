//! Error types for registration operations.
//!
//! All errors are raised at graph-construction time: either the full forward
//! and loss graph builds, or construction aborts with a descriptive error.

use thiserror::Error;

/// Main error type for registration operations.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Spatial dimensions of two tensors expected to align do not.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// Invalid configuration, e.g. a required key is missing.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A method name was not recognized by the respective registry.
    #[error("Unsupported {kind} method: '{name}'")]
    UnsupportedMethod { kind: &'static str, name: String },
}

/// Result type for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: impl Into<Vec<usize>>, actual: impl Into<Vec<usize>>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            kind,
            name: name.into(),
        }
    }
}
