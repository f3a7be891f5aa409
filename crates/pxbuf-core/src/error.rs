//! Error types for pxbuf-core operations.
//!
//! # Overview
//!
//! The [`Error`] enum covers the failure modes of buffer construction:
//! - Physical size overflow or invalid pixel density
//! - Pixel array length that doesn't match the declared size
//!
//! Mask length and resize size errors belong to the operations crate.
//!
//! Out-of-bounds single-pixel access is deliberately *not* an error:
//! [`PixelBuffer::get`](crate::PixelBuffer::get) returns transparent black
//! and [`PixelBuffer::set`](crate::PixelBuffer::set) ignores the write.
//!
//! # Usage
//!
//! ```rust
//! use pxbuf_core::{Error, Format, PixelBuffer};
//!
//! let err = PixelBuffer::with_density(4, 4, Format::Rgb, 0).unwrap_err();
//! assert!(matches!(err, Error::InvalidDensity { density: 0 }));
//! ```

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or mutating a pixel buffer.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid image dimensions.
    ///
    /// Returned when `size * density` overflows the physical dimensions.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: i64,
        /// Requested height
        height: i64,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Pixel density must be at least 1.
    #[error("invalid pixel density {density}: must be >= 1")]
    InvalidDensity {
        /// Requested density
        density: u32,
    },

    /// Pixel array length doesn't match `pixel_width * pixel_height`.
    #[error("pixel array length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Expected element count
        expected: usize,
        /// Actual element count
        got: usize,
    },
}

impl Error {
    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: i64, height: i64, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::LengthMismatch`] error.
    #[inline]
    pub fn length_mismatch(expected: usize, got: usize) -> Self {
        Self::LengthMismatch { expected, got }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimensions_message() {
        let err = Error::invalid_dimensions(0, -3, "both dimensions <= 0");
        let msg = err.to_string();
        assert!(msg.contains("0x-3"));
        assert!(msg.contains("both dimensions"));
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = Error::length_mismatch(16, 12);
        assert_eq!(
            err.to_string(),
            "pixel array length mismatch: expected 16, got 12"
        );
    }
}
