//! Error types for buffer operations.

use thiserror::Error;

/// Error type for buffer operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Invalid target dimensions.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Buffers or arrays have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error raised by the underlying buffer.
    #[error(transparent)]
    Core(#[from] pxbuf_core::Error),
}

/// Result type for buffer operations.
pub type OpsResult<T> = Result<T, OpsError>;
