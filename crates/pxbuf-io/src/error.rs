//! Error types for codec and file operations.

use std::io;
use thiserror::Error;

/// Codec or file operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No codec handles this format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The bytes are not a file this codec produced or accepts.
    #[error("invalid file: {0}")]
    InvalidFile(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Error building the decoded buffer.
    #[error(transparent)]
    Core(#[from] pxbuf_core::Error),
}

/// Result type for codec and file operations.
pub type IoResult<T> = Result<T, IoError>;
