//! Scoped mutation bracket.
//!
//! [`PixelGuard`] pairs `load_pixels` with `update_pixels` so direct array
//! edits can't forget to commit:
//!
//! ```rust
//! use pxbuf_core::{DirtyRegion, Format, PixelBuffer};
//!
//! let mut buf = PixelBuffer::new(8, 8, Format::Rgb);
//! {
//!     let mut px = buf.edit();
//!     let stride = px.stride();
//!     px[2 * stride + 3] = 0xFFFFFFFF;
//!     px.touch(3, 2, 1, 1);
//! }
//! assert_eq!(
//!     buf.take_modified(),
//!     Some(DirtyRegion { x1: 3, y1: 2, x2: 4, y2: 3 })
//! );
//! ```

use std::ops::{Deref, DerefMut};

use crate::rect::Rect;
use crate::PixelBuffer;

/// Mutable view of a buffer's pixels that commits on drop.
///
/// If [`touch`](Self::touch) was never called the whole buffer is committed.
#[derive(Debug)]
pub struct PixelGuard<'a> {
    buffer: &'a mut PixelBuffer,
    touched: Option<Rect>,
}

impl<'a> PixelGuard<'a> {
    pub(crate) fn new(buffer: &'a mut PixelBuffer) -> Self {
        Self {
            buffer,
            touched: None,
        }
    }

    /// Narrows the region committed on drop. Repeated calls accumulate.
    pub fn touch(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let rect = Rect::new(x, y, w, h);
        self.touched = Some(match self.touched {
            Some(prev) => prev.union(&rect),
            None => rect,
        });
    }

    /// Row stride (physical width) of the underlying array.
    #[inline]
    pub fn stride(&self) -> usize {
        self.buffer.pixel_width() as usize
    }
}

impl Deref for PixelGuard<'_> {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        self.buffer.pixels()
    }
}

impl DerefMut for PixelGuard<'_> {
    fn deref_mut(&mut self) -> &mut [u32] {
        self.buffer.pixels_mut()
    }
}

impl Drop for PixelGuard<'_> {
    fn drop(&mut self) {
        match self.touched {
            Some(r) => self.buffer.update_pixels(r.x, r.y, r.width, r.height),
            None => self.buffer.update_all(),
        }
    }
}
