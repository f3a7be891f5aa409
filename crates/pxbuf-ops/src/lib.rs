//! # pxbuf-ops
//!
//! Pixel operations on [`PixelBuffer`](pxbuf_core::PixelBuffer).
//!
//! # Modules
//!
//! - [`composite`] - 8-bit fixed-point blend modes
//! - [`resample`] - scaled region blits and resize
//! - [`filter`] - gray, invert, threshold, posterize, blur, erode/dilate
//! - [`mask`] - alpha masks
//!
//! # Example
//!
//! ```rust
//! use pxbuf_core::{Format, PixelBuffer, Rect};
//! use pxbuf_ops::{blend, BlendMode, Filter, FilterEngine};
//!
//! let src = PixelBuffer::from_pixels(1, 1, Format::Argb, vec![0xFF808080]).unwrap();
//! let mut dst = PixelBuffer::from_pixels(2, 2, Format::Argb, vec![0xFF202020; 4]).unwrap();
//! blend(&src, Rect::from_size(1, 1), &mut dst, Rect::from_size(2, 2), BlendMode::Add);
//! assert!(dst.pixels().iter().all(|&p| p == 0xFFA0A0A0));
//!
//! let mut engine = FilterEngine::new();
//! engine.apply(&mut dst, Filter::Invert).unwrap();
//! assert_eq!(dst.get(0, 0), 0xFF5F5F5F);
//! ```
//!
//! Everything runs single-threaded on the caller's thread. A
//! [`FilterEngine`] holds mutable cache state and is not meant to be shared
//! between threads without external locking.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod composite;
pub mod filter;
pub mod mask;
pub mod resample;

pub use composite::{blend_color, BlendMode};
pub use error::{OpsError, OpsResult};
pub use filter::{Filter, FilterEngine, FilterKind};
pub use mask::{mask, mask_with};
pub use resample::{blend, blend_self, blend_with, copy, copy_self, resize, Sampling};
