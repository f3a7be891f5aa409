//! The [`PixelBuffer`] type.
//!
//! # Memory Layout
//!
//! Pixels are one `u32` each, stored **row-major**, top-to-bottom, with no
//! row padding. The array always spans the *physical* size:
//!
//! ```text
//! pixel_width  = width  * density
//! pixel_height = height * density
//! pixels.len() = pixel_width * pixel_height
//! ```
//!
//! All coordinate arguments (`get`, `set`, regions, dirty tracking) are in
//! physical pixels.
//!
//! # Mutation Bracket
//!
//! Direct array access belongs between [`PixelBuffer::load_pixels`] and
//! [`PixelBuffer::update_pixels`]. [`PixelBuffer::edit`] wraps both in a
//! guard that commits on drop:
//!
//! ```rust
//! use pxbuf_core::{Format, PixelBuffer};
//!
//! let mut buf = PixelBuffer::new(4, 4, Format::Argb);
//! {
//!     let mut px = buf.edit();
//!     px[0] = 0xFFFF0000;
//!     px.touch(0, 0, 1, 1);
//! }
//! assert_eq!(buf.get(0, 0), 0xFFFF0000);
//! assert!(buf.is_modified());
//! ```

use crate::color::{ALPHA_MASK, RGB_MASK};
use crate::guard::PixelGuard;
use crate::rect::{to_i32, DirtyRegion, Rect};
use crate::{Error, Format, Result};
use tracing::{debug, trace};

/// An in-memory raster image of packed 32-bit pixels.
///
/// Owned exclusively by its holder; there is no shared ownership and no
/// internal locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    density: u32,
    format: Format,
    pixels: Vec<u32>,
    dirty: Option<DirtyRegion>,
}

impl PixelBuffer {
    /// Creates a zero-filled (transparent black) buffer with density 1.
    pub fn new(width: u32, height: u32, format: Format) -> Self {
        Self {
            width,
            height,
            density: 1,
            format,
            pixels: vec![0; width as usize * height as usize],
            dirty: None,
        }
    }

    /// Creates a zero-filled buffer with the given pixel density.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDensity`] if `density` is 0 and
    /// [`Error::InvalidDimensions`] if the physical size overflows.
    pub fn with_density(width: u32, height: u32, format: Format, density: u32) -> Result<Self> {
        if density == 0 {
            return Err(Error::InvalidDensity { density });
        }
        let (pw, ph) = match (width.checked_mul(density), height.checked_mul(density)) {
            (Some(pw), Some(ph)) => (pw, ph),
            _ => {
                return Err(Error::invalid_dimensions(
                    width as i64,
                    height as i64,
                    format!("physical size overflows at density {density}"),
                ));
            }
        };
        Ok(Self {
            width,
            height,
            density,
            format,
            pixels: vec![0; pw as usize * ph as usize],
            dirty: None,
        })
    }

    /// Wraps an existing pixel array (density 1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthMismatch`] if `pixels.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, format: Format, pixels: Vec<u32>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::length_mismatch(expected, pixels.len()));
        }
        Ok(Self {
            width,
            height,
            density: 1,
            format,
            pixels,
            dirty: None,
        })
    }

    /// Logical width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Logical height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel density (1 normal, 2 high-DPI).
    #[inline]
    pub fn density(&self) -> u32 {
        self.density
    }

    /// Physical width, `width * density`.
    #[inline]
    pub fn pixel_width(&self) -> u32 {
        self.width * self.density
    }

    /// Physical height, `height * density`.
    #[inline]
    pub fn pixel_height(&self) -> u32 {
        self.height * self.density
    }

    /// Number of stored pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixel_width() as usize * self.pixel_height() as usize
    }

    /// Storage format tag.
    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Retags the buffer without touching pixel data.
    #[inline]
    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    /// Read-only view of the pixel array.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable view of the pixel array.
    ///
    /// Call [`load_pixels`](Self::load_pixels) first and
    /// [`update_pixels`](Self::update_pixels) afterwards, or use
    /// [`edit`](Self::edit) which does both.
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Opens a direct-access bracket on the pixel array.
    ///
    /// Every constructor and [`adopt`](Self::adopt) size the array to the
    /// physical dimensions, so there is nothing to allocate here; the call
    /// marks where direct access starts, to be closed by
    /// [`update_pixels`](Self::update_pixels).
    #[inline]
    pub fn load_pixels(&mut self) {
        debug_assert_eq!(self.pixels.len(), self.pixel_count());
        trace!(len = self.pixels.len(), "load_pixels");
    }

    /// Opens a scoped mutation bracket.
    ///
    /// The returned guard dereferences to the pixel slice and commits the
    /// touched region (or the whole buffer) when dropped.
    pub fn edit(&mut self) -> PixelGuard<'_> {
        self.load_pixels();
        PixelGuard::new(self)
    }

    /// Commits a mutation of the given region, growing the dirty rectangle.
    ///
    /// The region is clamped to the physical bounds.
    pub fn update_pixels(&mut self, x: i32, y: i32, w: i32, h: i32) {
        let touched = DirtyRegion::clamped(
            Rect::new(x, y, w, h),
            self.pixel_width(),
            self.pixel_height(),
        );
        match self.dirty.as_mut() {
            Some(dirty) => dirty.grow(touched),
            None => self.dirty = Some(touched),
        }
    }

    /// Commits a mutation of the whole buffer.
    pub fn update_all(&mut self) {
        let (w, h) = (to_i32(self.pixel_width()), to_i32(self.pixel_height()));
        self.update_pixels(0, 0, w, h);
    }

    /// Whether anything was committed since the last [`take_modified`](Self::take_modified).
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.dirty.is_some()
    }

    /// The pending dirty rectangle, if any.
    #[inline]
    pub fn modified_region(&self) -> Option<DirtyRegion> {
        self.dirty
    }

    /// Returns and clears the pending dirty rectangle.
    #[inline]
    pub fn take_modified(&mut self) -> Option<DirtyRegion> {
        self.dirty.take()
    }

    /// Index of (x, y) if it lies inside the physical bounds.
    #[inline]
    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.pixel_width() || y >= self.pixel_height() {
            return None;
        }
        Some(y as usize * self.pixel_width() as usize + x as usize)
    }

    /// Reads one pixel as packed ARGB.
    ///
    /// Out-of-bounds coordinates return `0` (transparent black). `Rgb`
    /// pixels come back with alpha `0xFF`; `Alpha` pixels come back as white
    /// with the stored value as alpha.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> u32 {
        let Some(idx) = self.index_of(x, y) else {
            return 0;
        };
        let c = self.pixels[idx];
        match self.format {
            Format::Rgb => c | ALPHA_MASK,
            Format::Argb => c,
            Format::Alpha => (c << 24) | RGB_MASK,
        }
    }

    /// Copies a region into a new buffer of size `w x h`.
    ///
    /// The part of the region inside this buffer is copied verbatim; the
    /// rest is zero-filled. When anything was cropped away from an `Rgb`
    /// source, the copy becomes `Argb` and the copied pixels get opaque
    /// alpha, so only the cropped border is transparent.
    pub fn get_region(&self, x: i32, y: i32, w: i32, h: i32) -> PixelBuffer {
        trace!(x, y, w, h, "get_region");
        let out_w = w.max(0) as u32;
        let out_h = h.max(0) as u32;
        let mut out = PixelBuffer::new(out_w, out_h, self.format);
        let Some(visible) = Rect::new(x, y, w, h).clamp_to(self.pixel_width(), self.pixel_height())
        else {
            if self.format == Format::Rgb && out_w > 0 && out_h > 0 {
                out.format = Format::Argb;
            }
            return out;
        };

        copy_rows(
            &self.pixels,
            self.pixel_width() as usize,
            (visible.x as usize, visible.y as usize),
            &mut out.pixels,
            out_w as usize,
            ((visible.x - x) as usize, (visible.y - y) as usize),
            (visible.width as usize, visible.height as usize),
        );

        let cropped = visible.width != w || visible.height != h;
        if cropped && self.format == Format::Rgb {
            debug!(x, y, w, h, "cropped rgb region promoted to argb");
            out.format = Format::Argb;
            let ox = (visible.x - x) as usize;
            let oy = (visible.y - y) as usize;
            for row in oy..oy + visible.height as usize {
                let start = row * out_w as usize + ox;
                for px in &mut out.pixels[start..start + visible.width as usize] {
                    *px |= ALPHA_MASK;
                }
            }
        }
        out
    }

    /// Independent duplicate of the whole buffer, with a clean dirty state.
    pub fn copy(&self) -> PixelBuffer {
        PixelBuffer {
            dirty: None,
            ..self.clone()
        }
    }

    /// Writes one pixel and marks it dirty. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, color: u32) {
        if let Some(idx) = self.index_of(x, y) {
            self.pixels[idx] = color;
            self.update_pixels(x, y, 1, 1);
        }
    }

    /// Raw row copy of `src` with its top-left corner at (x, y).
    ///
    /// The source is clipped to this buffer's bounds. No blending and no
    /// format conversion takes place.
    pub fn set_buffer(&mut self, x: i32, y: i32, src: &PixelBuffer) {
        let (mut dx, mut dy) = (x, y);
        let (mut sx, mut sy) = (0i32, 0i32);
        let mut sw = to_i32(src.pixel_width());
        let mut sh = to_i32(src.pixel_height());

        if dx < 0 {
            sx = sx.saturating_sub(dx);
            sw = sw.saturating_add(dx);
            dx = 0;
        }
        if dy < 0 {
            sy = sy.saturating_sub(dy);
            sh = sh.saturating_add(dy);
            dy = 0;
        }
        sw = sw.min(to_i32(self.pixel_width()) - dx);
        sh = sh.min(to_i32(self.pixel_height()) - dy);
        if sw <= 0 || sh <= 0 {
            return;
        }
        trace!(dx, dy, sw, sh, "set_buffer");

        let dst_stride = self.pixel_width() as usize;
        copy_rows(
            &src.pixels,
            src.pixel_width() as usize,
            (sx as usize, sy as usize),
            &mut self.pixels,
            dst_stride,
            (dx as usize, dy as usize),
            (sw as usize, sh as usize),
        );
        self.update_pixels(dx, dy, sw, sh);
    }

    /// Switches an `Rgb` buffer to `Argb` if any pixel is not fully opaque.
    pub fn check_alpha(&mut self) {
        if self.format != Format::Rgb {
            return;
        }
        if self.pixels.iter().any(|&c| c & ALPHA_MASK != ALPHA_MASK) {
            debug!("non-opaque pixel found, switching to argb");
            self.format = Format::Argb;
        }
    }

    /// Replaces dimensions, density, format and pixels with those of
    /// `other`, then marks the whole buffer dirty.
    ///
    /// Used by whole-image operations (resize) that build their result in a
    /// scratch buffer.
    pub fn adopt(&mut self, other: PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.density = other.density;
        self.format = other.format;
        self.pixels = other.pixels;
        self.update_all();
    }
}

/// Copies a `w x h` block between two row-major arrays.
///
/// Both blocks must already be clipped to their arrays.
pub(crate) fn copy_rows(
    src: &[u32],
    src_stride: usize,
    (sx, sy): (usize, usize),
    dst: &mut [u32],
    dst_stride: usize,
    (dx, dy): (usize, usize),
    (w, h): (usize, usize),
) {
    for row in 0..h {
        let s = (sy + row) * src_stride + sx;
        let d = (dy + row) * dst_stride + dx;
        dst[d..d + w].copy_from_slice(&src[s..s + w]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(w: u32, h: u32, format: Format) -> PixelBuffer {
        let pixels = (0..w * h).map(|i| 0xFF00_0000 | i).collect();
        PixelBuffer::from_pixels(w, h, format, pixels).unwrap()
    }

    #[test]
    fn test_new_is_transparent_black() {
        let buf = PixelBuffer::new(3, 2, Format::Argb);
        assert_eq!(buf.pixels().len(), 6);
        assert!(buf.pixels().iter().all(|&p| p == 0));
        assert!(!buf.is_modified());
    }

    #[test]
    fn test_density_scales_physical_size() {
        let buf = PixelBuffer::with_density(4, 3, Format::Rgb, 2).unwrap();
        assert_eq!(buf.width(), 4);
        assert_eq!(buf.pixel_width(), 8);
        assert_eq!(buf.pixel_height(), 6);
        assert_eq!(buf.pixels().len(), 48);
        assert!(PixelBuffer::with_density(4, 3, Format::Rgb, 0).is_err());
    }

    #[test]
    fn test_from_pixels_length_mismatch() {
        let err = PixelBuffer::from_pixels(2, 2, Format::Rgb, vec![0; 3]).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 4, got: 3 }));
    }

    #[test]
    fn test_get_out_of_bounds_is_zero() {
        let buf = numbered(3, 3, Format::Argb);
        for (x, y) in [(-1, 0), (0, -1), (3, 0), (0, 3), (i32::MIN, i32::MAX)] {
            assert_eq!(buf.get(x, y), 0);
        }
    }

    #[test]
    fn test_get_reinterprets_by_format() {
        let mut buf = PixelBuffer::from_pixels(1, 1, Format::Rgb, vec![0x00123456]).unwrap();
        assert_eq!(buf.get(0, 0), 0xFF123456);
        buf.set_format(Format::Argb);
        assert_eq!(buf.get(0, 0), 0x00123456);
        let alpha = PixelBuffer::from_pixels(1, 1, Format::Alpha, vec![0x80]).unwrap();
        assert_eq!(alpha.get(0, 0), 0x80FFFFFF);
    }

    #[test]
    fn test_set_marks_dirty_and_ignores_out_of_bounds() {
        let mut buf = PixelBuffer::new(4, 4, Format::Argb);
        buf.set(9, 9, 0xFFFFFFFF);
        assert!(!buf.is_modified());
        buf.set(1, 2, 0xFF00FF00);
        assert_eq!(buf.get(1, 2), 0xFF00FF00);
        assert_eq!(
            buf.modified_region(),
            Some(DirtyRegion { x1: 1, y1: 2, x2: 2, y2: 3 })
        );
        buf.set(3, 0, 0xFF0000FF);
        assert_eq!(
            buf.take_modified(),
            Some(DirtyRegion { x1: 1, y1: 0, x2: 4, y2: 3 })
        );
        assert!(!buf.is_modified());
    }

    #[test]
    fn test_update_pixels_clamps() {
        let mut buf = PixelBuffer::new(4, 4, Format::Rgb);
        buf.update_pixels(-5, -5, 100, 2);
        assert_eq!(
            buf.modified_region(),
            Some(DirtyRegion { x1: 0, y1: 0, x2: 4, y2: 0 })
        );
    }

    #[test]
    fn test_get_region_inside() {
        let buf = numbered(4, 4, Format::Rgb);
        let sub = buf.get_region(1, 1, 2, 2);
        assert_eq!(sub.format(), Format::Rgb);
        assert_eq!(
            sub.pixels(),
            &[0xFF000005, 0xFF000006, 0xFF000009, 0xFF00000A]
        );
    }

    #[test]
    fn test_get_region_cropped_zero_fills_and_promotes() {
        let buf = PixelBuffer::from_pixels(2, 2, Format::Rgb, vec![0x000001, 0x000002, 0x000003, 0x000004])
            .unwrap();
        let sub = buf.get_region(-1, 0, 2, 3);
        assert_eq!(sub.format(), Format::Argb);
        assert_eq!(sub.width(), 2);
        assert_eq!(sub.height(), 3);
        assert_eq!(
            sub.pixels(),
            &[0, 0xFF000001, 0, 0xFF000003, 0, 0]
        );
    }

    #[test]
    fn test_get_region_cropped_argb_keeps_alpha() {
        let buf = PixelBuffer::from_pixels(1, 1, Format::Argb, vec![0x40102030]).unwrap();
        let sub = buf.get_region(0, 0, 2, 1);
        assert_eq!(sub.format(), Format::Argb);
        assert_eq!(sub.pixels(), &[0x40102030, 0]);
    }

    #[test]
    fn test_far_off_regions_are_empty() {
        let mut buf = numbered(4, 4, Format::Argb);
        let sub = buf.get_region(i32::MAX - 1, 0, 4, 1);
        assert_eq!(sub.pixels(), &[0, 0, 0, 0]);

        let src = numbered(2, 2, Format::Argb);
        buf.set_buffer(i32::MIN, i32::MIN, &src);
        buf.set_buffer(i32::MAX, 0, &src);
        assert!(!buf.is_modified());
    }

    #[test]
    fn test_set_buffer_clips_and_copies_raw() {
        let mut dst = PixelBuffer::new(3, 3, Format::Argb);
        let src = PixelBuffer::from_pixels(2, 2, Format::Argb, vec![1, 2, 3, 4]).unwrap();
        dst.set_buffer(-1, 2, &src);
        assert_eq!(dst.pixels(), &[0, 0, 0, 0, 0, 0, 2, 0, 0]);
        assert_eq!(
            dst.modified_region(),
            Some(DirtyRegion { x1: 0, y1: 2, x2: 1, y2: 3 })
        );
        dst.set_buffer(5, 5, &src);
        assert_eq!(
            dst.modified_region(),
            Some(DirtyRegion { x1: 0, y1: 2, x2: 1, y2: 3 })
        );
    }

    #[test]
    fn test_check_alpha() {
        let mut buf = PixelBuffer::from_pixels(2, 1, Format::Rgb, vec![0xFF000000, 0xFF000000]).unwrap();
        buf.check_alpha();
        assert_eq!(buf.format(), Format::Rgb);
        buf.pixels_mut()[1] = 0x7F000000;
        buf.check_alpha();
        assert_eq!(buf.format(), Format::Argb);
    }

    #[test]
    fn test_adopt_resizes_array_and_marks_all_dirty() {
        let mut buf = PixelBuffer::new(2, 2, Format::Rgb);
        buf.adopt(PixelBuffer::new(5, 1, Format::Argb));
        assert_eq!(buf.pixels().len(), 5);
        assert_eq!(buf.format(), Format::Argb);
        assert_eq!(
            buf.modified_region(),
            Some(DirtyRegion { x1: 0, y1: 0, x2: 5, y2: 1 })
        );
        buf.load_pixels();
        assert_eq!(buf.pixels().len(), 5);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut buf = numbered(2, 2, Format::Argb);
        buf.set(0, 0, 7);
        let dup = buf.copy();
        buf.set(1, 1, 9);
        assert_eq!(dup.get(0, 0), 7);
        assert_ne!(dup.get(1, 1), 9);
        assert!(!dup.is_modified());
    }
}
