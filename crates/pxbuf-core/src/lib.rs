//! # pxbuf-core
//!
//! Core raster type for the pxbuf workspace.
//!
//! - [`PixelBuffer`] - packed 32-bit raster with format tag, pixel density and
//!   dirty-rectangle tracking
//! - [`Format`] - `Rgb`, `Argb` or `Alpha` interpretation of the stored words
//! - [`color`] - packed `0xAARRGGBB` channel helpers
//! - [`Rect`], [`DirtyRegion`] - signed regions and the committed dirty box
//! - [`PixelGuard`] - scoped `load_pixels`/`update_pixels` bracket
//! - [`TextureSource`], [`BlitSurface`] - seams for renderers and windows
//!
//! ## Crate Structure
//!
//! ```text
//! pxbuf-core (this crate)
//!    ^
//!    |
//!    +-- pxbuf-ops (compositing, resampling, filters)
//!    +-- pxbuf-io (TIFF, TGA, generic codecs)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pxbuf_core::prelude::*;
//!
//! let mut buf = PixelBuffer::new(16, 16, Format::Argb);
//! buf.set(3, 4, 0x80FF0000);
//! assert_eq!(buf.get(3, 4), 0x80FF0000);
//! assert_eq!(buf.get(-1, 0), 0);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod color;
pub mod error;
pub mod format;
pub mod guard;
pub mod rect;
pub mod surface;

pub use buffer::PixelBuffer;
pub use error::{Error, Result};
pub use format::Format;
pub use guard::PixelGuard;
pub use rect::{DirtyRegion, Rect};
pub use surface::{BlitSurface, TextureSource, TextureView};

/// Prelude module for convenient imports.
///
/// ```
/// use pxbuf_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{alpha, blue, green, pack, red};
    pub use crate::error::{Error, Result};
    pub use crate::format::Format;
    pub use crate::rect::{DirtyRegion, Rect};
    pub use crate::surface::{BlitSurface, TextureSource, TextureView};
    pub use crate::{PixelBuffer, PixelGuard};
}
