//! Interfaces for the layers that consume buffers.
//!
//! Shape renderers read a buffer as a texture through [`TextureSource`];
//! windowing layers receive it for display through [`BlitSurface`]. Neither
//! layer lives in this crate.

use tracing::trace;

use crate::{DirtyRegion, Format, PixelBuffer};

/// Borrowed view of a buffer's pixels, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureView<'a> {
    /// Physical width.
    pub width: u32,
    /// Physical height.
    pub height: u32,
    /// Storage format of `pixels`.
    pub format: Format,
    /// Row-major pixel data, `width * height` long.
    pub pixels: &'a [u32],
}

/// Anything that can be sampled as a texture.
pub trait TextureSource {
    /// Returns a view of the current pixel data.
    fn texture(&self) -> TextureView<'_>;
}

impl TextureSource for PixelBuffer {
    fn texture(&self) -> TextureView<'_> {
        TextureView {
            width: self.pixel_width(),
            height: self.pixel_height(),
            format: self.format(),
            pixels: self.pixels(),
        }
    }
}

/// A display target that accepts raw pixel arrays.
pub trait BlitSurface {
    /// Copies `pixels` to the surface. `dirty` is the region changed since
    /// the previous present, or `None` when the surface may skip the copy.
    fn blit(&mut self, pixels: &[u32], pixel_width: u32, pixel_height: u32, dirty: Option<DirtyRegion>);
}

impl PixelBuffer {
    /// Hands the live pixels to `surface` and clears the modified state.
    pub fn present_to<S: BlitSurface + ?Sized>(&mut self, surface: &mut S) {
        let dirty = self.take_modified();
        trace!(
            width = self.pixel_width(),
            height = self.pixel_height(),
            dirty = dirty.is_some(),
            "present"
        );
        surface.blit(self.pixels(), self.pixel_width(), self.pixel_height(), dirty);
    }
}
