//! Fixed-point region blitter and resize.
//!
//! Copies or composites a source rectangle into a destination rectangle of
//! any size, one [`blend_color`] call per destination pixel. Source
//! positions are tracked in 15-bit fixed point:
//!
//! ```text
//! dx   = round(src_w / dst_w * 2^15)
//! sX   = src_x * 2^15 + clipped_left * dx
//! u1   = sX >> 15,  u2 = min(u1 + 1, src_width - 1)
//! frac = sX & (2^15 - 1)
//! ```
//!
//! Bilinear weights are normalized so they sum to exactly `2^15`, which
//! makes a same-size blit reproduce its source bit for bit.
//!
//! # Example
//!
//! ```rust
//! use pxbuf_core::{Format, PixelBuffer, Rect};
//! use pxbuf_ops::resample::copy;
//!
//! let src = PixelBuffer::from_pixels(2, 1, Format::Argb, vec![0xFF000000, 0xFFFFFFFF]).unwrap();
//! let mut dst = PixelBuffer::new(4, 1, Format::Argb);
//! copy(&src, Rect::from_size(2, 1), &mut dst, Rect::from_size(4, 1));
//! assert_eq!(dst.pixels(), &[0xFF000000, 0xFF7F7F7F, 0xFFFFFFFF, 0xFFFFFFFF]);
//! ```

use pxbuf_core::{PixelBuffer, Rect};
use tracing::{debug, trace};

use crate::composite::{blend_color, BlendMode};
use crate::{OpsError, OpsResult};

/// Fractional bits of the source position.
pub const PRECISION_BITS: u32 = 15;
/// `1.0` in source-position fixed point.
pub const PRECISION_ONE: i64 = 1 << PRECISION_BITS;
const PRECISION_MASK: i64 = PRECISION_ONE - 1;

/// How source texels are picked for each destination pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sampling {
    /// Weighted mix of the four surrounding texels.
    #[default]
    Bilinear,
    /// The texel under the sample position.
    Nearest,
}

#[derive(Clone, Copy)]
enum Source<'a> {
    Foreign(&'a [u32]),
    /// The destination array itself (regions known not to overlap).
    Own,
}

/// Clipped destination and starting source position of one blit.
#[derive(Debug, Clone, Copy)]
struct Plan {
    src: Rect,
    dest: Rect,
    dx: i64,
    dy: i64,
    sx0: i64,
    sy0: i64,
    src_width: usize,
    src_height: usize,
}

impl Plan {
    fn new(
        src_size: (u32, u32),
        src_rect: Rect,
        dst_size: (u32, u32),
        dst_rect: Rect,
    ) -> Option<Self> {
        let src = src_rect.clamp_to(src_size.0, src_size.1)?;
        if dst_rect.is_empty() {
            return None;
        }
        let dest = dst_rect.clamp_to(dst_size.0, dst_size.1)?;

        let dx = fixed_step(src.width, dst_rect.width);
        let dy = fixed_step(src.height, dst_rect.height);
        Some(Self {
            src,
            dest,
            dx,
            dy,
            sx0: src.x as i64 * PRECISION_ONE + (dest.x as i64 - dst_rect.x as i64) * dx,
            sy0: src.y as i64 * PRECISION_ONE + (dest.y as i64 - dst_rect.y as i64) * dy,
            src_width: src_size.0 as usize,
            src_height: src_size.1 as usize,
        })
    }

    /// Source pixels the blit will read, anchored at the clipped source
    /// origin.
    ///
    /// Upscaling rounding can push the last sample past the clipped source,
    /// and a bilinear tap with a non-zero fraction reads one more column or
    /// row.
    fn read_extent(&self, sampling: Sampling) -> Rect {
        let reach = |start: i64, step: i64, count: i32, limit: usize, edge: i32| {
            let last = start + (count as i64 - 1) * step;
            let mut end = (last >> PRECISION_BITS) + 1;
            if sampling == Sampling::Bilinear && (start | step) & PRECISION_MASK != 0 {
                end += 1;
            }
            end.min(limit as i64).max(edge as i64)
        };
        let right = reach(self.sx0, self.dx, self.dest.width, self.src_width, self.src.right());
        let bottom = reach(self.sy0, self.dy, self.dest.height, self.src_height, self.src.bottom());
        Rect::new(
            self.src.x,
            self.src.y,
            (right - self.src.x as i64) as i32,
            (bottom - self.src.y as i64) as i32,
        )
    }
}

/// `round(src / dst * 2^15)` in integer math.
#[inline]
fn fixed_step(src: i32, dst: i32) -> i64 {
    let (src, dst) = (src as i64, dst as i64);
    (src * PRECISION_ONE * 2 + dst) / (dst * 2)
}

/// Vertical sampling state for one destination row.
#[derive(Debug, Clone, Copy)]
struct RowTaps {
    v1: usize,
    v2: usize,
    frac_v: i64,
    inv_v: i64,
}

impl RowTaps {
    #[inline]
    fn at(sy: i64, last_row: usize) -> Self {
        let v1 = ((sy >> PRECISION_BITS) as usize).min(last_row);
        let frac_v = sy & PRECISION_MASK;
        Self {
            v1,
            v2: (v1 + 1).min(last_row),
            frac_v,
            inv_v: PRECISION_ONE - frac_v,
        }
    }
}

impl Sampling {
    #[inline]
    fn sample(self, pixels: &[u32], width: usize, row: &RowTaps, sx: i64) -> u32 {
        let last_col = width - 1;
        let u1 = ((sx >> PRECISION_BITS) as usize).min(last_col);
        match self {
            Sampling::Nearest => pixels[row.v1 * width + u1],
            Sampling::Bilinear => {
                let u2 = (u1 + 1).min(last_col);
                let frac_u = sx & PRECISION_MASK;
                let inv_u = PRECISION_ONE - frac_u;

                let ul = (inv_u * row.inv_v) >> PRECISION_BITS;
                let ll = (inv_u * row.frac_v) >> PRECISION_BITS;
                let ur = (frac_u * row.inv_v) >> PRECISION_BITS;
                let lr = PRECISION_ONE - ul - ll - ur;

                let c_ul = pixels[row.v1 * width + u1];
                let c_ur = pixels[row.v1 * width + u2];
                let c_ll = pixels[row.v2 * width + u1];
                let c_lr = pixels[row.v2 * width + u2];

                let mut out = 0u32;
                for shift in [24u32, 16, 8, 0] {
                    let ch = |c: u32| ((c >> shift) & 0xFF) as i64;
                    let v = (ul * ch(c_ul) + ll * ch(c_ll) + ur * ch(c_ur) + lr * ch(c_lr))
                        >> PRECISION_BITS;
                    out |= (v.clamp(0, 255) as u32) << shift;
                }
                out
            }
        }
    }
}

fn run(plan: &Plan, src: Source<'_>, dst: &mut [u32], stride: usize, mode: BlendMode, sampling: Sampling) {
    let last_row = plan.src_height - 1;
    let mut sy = plan.sy0;
    for y in 0..plan.dest.height as usize {
        let taps = RowTaps::at(sy, last_row);
        let base = (plan.dest.y as usize + y) * stride + plan.dest.x as usize;
        let mut sx = plan.sx0;
        for i in base..base + plan.dest.width as usize {
            let c = match src {
                Source::Foreign(pixels) => sampling.sample(pixels, plan.src_width, &taps, sx),
                Source::Own => sampling.sample(dst, plan.src_width, &taps, sx),
            };
            dst[i] = blend_color(dst[i], c, mode);
            sx += plan.dx;
        }
        sy += plan.dy;
    }
}

/// Composites `src_rect` of `src` into `dst_rect` of `dst`, bilinear.
///
/// Both rectangles are in physical pixels. The source rectangle is clipped
/// to the source before the scale factor is taken; the destination is
/// clipped after, so a partially off-screen destination shows the matching
/// part of the source. Nothing happens when either side clips to empty.
pub fn blend(src: &PixelBuffer, src_rect: Rect, dst: &mut PixelBuffer, dst_rect: Rect, mode: BlendMode) {
    blend_with(src, src_rect, dst, dst_rect, mode, Sampling::Bilinear);
}

/// [`blend`] with an explicit sampling mode.
pub fn blend_with(
    src: &PixelBuffer,
    src_rect: Rect,
    dst: &mut PixelBuffer,
    dst_rect: Rect,
    mode: BlendMode,
    sampling: Sampling,
) {
    trace!(
        ?src_rect,
        ?dst_rect,
        mode = mode.name(),
        ?sampling,
        "blit"
    );
    let Some(plan) = Plan::new(
        (src.pixel_width(), src.pixel_height()),
        src_rect,
        (dst.pixel_width(), dst.pixel_height()),
        dst_rect,
    ) else {
        return;
    };

    let mut px = dst.edit();
    px.touch(plan.dest.x, plan.dest.y, plan.dest.width, plan.dest.height);
    let stride = px.stride();
    run(&plan, Source::Foreign(src.pixels()), &mut px, stride, mode, sampling);
}

/// Copies with [`BlendMode::Replace`], scaling as needed.
pub fn copy(src: &PixelBuffer, src_rect: Rect, dst: &mut PixelBuffer, dst_rect: Rect) {
    blend_with(src, src_rect, dst, dst_rect, BlendMode::Replace, Sampling::Bilinear);
}

/// Composites one region of `buf` onto another region of the same buffer.
///
/// When the pixels the blit samples (including bilinear neighbours just
/// past the source rectangle) intersect the destination, the blit runs from
/// a snapshot of them so no pixel is read after it was written. Otherwise
/// the live array is read.
pub fn blend_self(buf: &mut PixelBuffer, src_rect: Rect, dst_rect: Rect, mode: BlendMode, sampling: Sampling) {
    let size = (buf.pixel_width(), buf.pixel_height());
    let Some(plan) = Plan::new(size, src_rect, size, dst_rect) else {
        return;
    };

    let reads = plan.read_extent(sampling);
    if reads.overlaps(&plan.dest) {
        debug!(?reads, dest = ?plan.dest, "overlapping self blit, snapshotting source");
        let snapshot = buf.get_region(reads.x, reads.y, reads.width, reads.height);
        let snap_rect = Rect::from_size(plan.src.width, plan.src.height);
        blend_with(&snapshot, snap_rect, buf, dst_rect, mode, sampling);
        return;
    }

    trace!(?src_rect, ?dst_rect, mode = mode.name(), ?sampling, "self blit");
    let mut px = buf.edit();
    px.touch(plan.dest.x, plan.dest.y, plan.dest.width, plan.dest.height);
    let stride = px.stride();
    run(&plan, Source::Own, &mut px, stride, mode, sampling);
}

/// [`blend_self`] with [`BlendMode::Replace`] and bilinear sampling.
pub fn copy_self(buf: &mut PixelBuffer, src_rect: Rect, dst_rect: Rect) {
    blend_self(buf, src_rect, dst_rect, BlendMode::Replace, Sampling::Bilinear);
}

/// Resamples the whole buffer to a new logical size.
///
/// A non-positive `width` or `height` is derived from the other one,
/// keeping the aspect ratio (truncated). Density and format are kept and
/// the whole buffer is marked dirty.
///
/// # Errors
///
/// [`OpsError::InvalidDimensions`] if both sizes are non-positive, or if
/// one must be derived from an empty buffer.
pub fn resize(buf: &mut PixelBuffer, width: i32, height: i32) -> OpsResult<()> {
    if width <= 0 && height <= 0 {
        return Err(OpsError::InvalidDimensions(format!(
            "width ({width}) or height ({height}) must be > 0"
        )));
    }
    let (w, h) = (buf.width() as i64, buf.height() as i64);
    let (new_w, new_h) = match (width > 0, height > 0) {
        (true, true) => (width as i64, height as i64),
        (false, _) if h > 0 => (w * height as i64 / h, height as i64),
        (_, false) if w > 0 => (width as i64, h * width as i64 / w),
        _ => {
            return Err(OpsError::InvalidDimensions(format!(
                "cannot derive size for {w}x{h} buffer from {width}x{height}"
            )));
        }
    };
    trace!(from_w = w, from_h = h, new_w, new_h, "resize");

    let to_u32 = |v: i64| {
        u32::try_from(v).map_err(|_| OpsError::InvalidDimensions(format!("size {v} out of range")))
    };
    let mut scaled = PixelBuffer::with_density(to_u32(new_w)?, to_u32(new_h)?, buf.format(), buf.density())?;
    let src_rect = Rect::from_size(buf.pixel_width() as i32, buf.pixel_height() as i32);
    let dst_rect = Rect::from_size(scaled.pixel_width() as i32, scaled.pixel_height() as i32);
    copy(buf, src_rect, &mut scaled, dst_rect);
    buf.adopt(scaled);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxbuf_core::{DirtyRegion, Format};

    fn buffer(w: u32, h: u32, pixels: &[u32]) -> PixelBuffer {
        PixelBuffer::from_pixels(w, h, Format::Argb, pixels.to_vec()).unwrap()
    }

    fn pattern(w: u32, h: u32) -> PixelBuffer {
        let px: Vec<u32> = (0..w * h)
            .map(|i| i.wrapping_mul(2_654_435_761) | 0x0100_0000)
            .collect();
        buffer(w, h, &px)
    }

    #[test]
    fn test_fixed_step_rounds() {
        assert_eq!(fixed_step(4, 4), PRECISION_ONE);
        assert_eq!(fixed_step(1, 2), PRECISION_ONE / 2);
        assert_eq!(fixed_step(1, 3), 10923);
        assert_eq!(fixed_step(2, 3), 21845);
    }

    #[test]
    fn test_identity_resample_bilinear() {
        let src = pattern(7, 5);
        let mut dst = PixelBuffer::new(7, 5, Format::Argb);
        copy(&src, Rect::from_size(7, 5), &mut dst, Rect::from_size(7, 5));
        assert_eq!(dst.pixels(), src.pixels());
    }

    #[test]
    fn test_identity_resample_nearest() {
        let src = pattern(3, 9);
        let mut dst = PixelBuffer::new(3, 9, Format::Argb);
        blend_with(
            &src,
            Rect::from_size(3, 9),
            &mut dst,
            Rect::from_size(3, 9),
            BlendMode::Replace,
            Sampling::Nearest,
        );
        assert_eq!(dst.pixels(), src.pixels());
    }

    #[test]
    fn test_sub_region_copy_matches_get_region() {
        let src = pattern(6, 6);
        let mut dst = PixelBuffer::new(3, 2, Format::Argb);
        copy(&src, Rect::new(2, 3, 3, 2), &mut dst, Rect::from_size(3, 2));
        assert_eq!(dst.pixels(), src.get_region(2, 3, 3, 2).pixels());
    }

    #[test]
    fn test_nearest_upscale_duplicates() {
        let src = buffer(2, 1, &[0xFF111111, 0xFF222222]);
        let mut dst = PixelBuffer::new(4, 1, Format::Argb);
        blend_with(
            &src,
            Rect::from_size(2, 1),
            &mut dst,
            Rect::from_size(4, 1),
            BlendMode::Replace,
            Sampling::Nearest,
        );
        assert_eq!(dst.pixels(), &[0xFF111111, 0xFF111111, 0xFF222222, 0xFF222222]);
    }

    #[test]
    fn test_bilinear_clamps_at_last_column() {
        let src = buffer(2, 1, &[0xFF000000, 0xFFFFFFFF]);
        let mut dst = PixelBuffer::new(4, 1, Format::Argb);
        copy(&src, Rect::from_size(2, 1), &mut dst, Rect::from_size(4, 1));
        assert_eq!(dst.pixels(), &[0xFF000000, 0xFF7F7F7F, 0xFFFFFFFF, 0xFFFFFFFF]);
    }

    #[test]
    fn test_negative_destination_skips_source() {
        let src = buffer(4, 1, &[0xFF000001, 0xFF000002, 0xFF000003, 0xFF000004]);
        let mut dst = PixelBuffer::new(4, 1, Format::Argb);
        copy(&src, Rect::from_size(4, 1), &mut dst, Rect::new(-2, 0, 4, 1));
        assert_eq!(dst.pixels(), &[0xFF000003, 0xFF000004, 0, 0]);
        assert_eq!(
            dst.modified_region(),
            Some(DirtyRegion { x1: 0, y1: 0, x2: 2, y2: 1 })
        );
    }

    #[test]
    fn test_empty_rects_are_noops() {
        let src = pattern(4, 4);
        let mut dst = PixelBuffer::new(4, 4, Format::Argb);
        copy(&src, Rect::new(10, 10, 2, 2), &mut dst, Rect::from_size(4, 4));
        copy(&src, Rect::from_size(4, 4), &mut dst, Rect::new(0, 0, 0, 4));
        copy(&src, Rect::from_size(4, 4), &mut dst, Rect::new(4, 0, 2, 2));
        assert!(!dst.is_modified());
        assert!(dst.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_self_copy_overlapping_uses_snapshot() {
        let (a, b, c, d) = (0xFF0000AA, 0xFF0000BB, 0xFF0000CC, 0xFF0000DD);
        let mut buf = buffer(4, 1, &[a, b, c, d]);
        copy_self(&mut buf, Rect::new(0, 0, 3, 1), Rect::new(1, 0, 3, 1));
        assert_eq!(buf.pixels(), &[a, a, b, c]);
    }

    #[test]
    fn test_self_upscale_into_bilinear_neighbour_matches_pre_state() {
        let (a, b) = (0xFF7F0000, 0xFF00FF00);
        let mut buf = buffer(6, 1, &[a, b, 0, 0, 0, 0]);
        let before = buf.copy();
        let mut expected = buf.copy();
        copy(&before, Rect::new(0, 0, 2, 1), &mut expected, Rect::new(2, 0, 4, 1));

        copy_self(&mut buf, Rect::new(0, 0, 2, 1), Rect::new(2, 0, 4, 1));
        assert_eq!(buf.pixels(), expected.pixels());
        assert_eq!(buf.get(5, 0), 0x7F007F00);
    }

    #[test]
    fn test_self_upscale_far_from_source_reads_live() {
        let mut buf = pattern(8, 1);
        let before = buf.copy();
        let mut expected = buf.copy();
        copy(&before, Rect::new(0, 0, 2, 1), &mut expected, Rect::new(4, 0, 4, 1));

        copy_self(&mut buf, Rect::new(0, 0, 2, 1), Rect::new(4, 0, 4, 1));
        assert_eq!(buf.pixels(), expected.pixels());
    }

    #[test]
    fn test_read_extent_covers_bilinear_taps() {
        let plan = Plan::new((6, 1), Rect::new(0, 0, 2, 1), (6, 1), Rect::new(2, 0, 4, 1)).unwrap();
        assert_eq!(plan.read_extent(Sampling::Bilinear), Rect::new(0, 0, 3, 1));
        assert_eq!(plan.read_extent(Sampling::Nearest), Rect::new(0, 0, 2, 1));

        let same = Plan::new((4, 1), Rect::new(0, 0, 2, 1), (4, 1), Rect::new(2, 0, 2, 1)).unwrap();
        assert_eq!(same.read_extent(Sampling::Bilinear), Rect::new(0, 0, 2, 1));
    }

    #[test]
    fn test_far_off_destination_is_noop() {
        let src = pattern(4, 4);
        let mut dst = PixelBuffer::new(4, 4, Format::Argb);
        copy(&src, Rect::from_size(4, 4), &mut dst, Rect::new(i32::MAX - 2, 0, 4, 4));
        copy(&src, Rect::new(i32::MAX - 1, 0, 4, 1), &mut dst, Rect::from_size(4, 4));
        assert!(!dst.is_modified());
    }

    #[test]
    fn test_self_copy_disjoint_reads_live() {
        let (a, b) = (0xFF0000AA, 0xFF0000BB);
        let mut buf = buffer(4, 1, &[a, b, 0, 0]);
        copy_self(&mut buf, Rect::new(0, 0, 2, 1), Rect::new(2, 0, 2, 1));
        assert_eq!(buf.pixels(), &[a, b, a, b]);
        assert_eq!(
            buf.take_modified(),
            Some(DirtyRegion { x1: 2, y1: 0, x2: 4, y2: 1 })
        );
    }

    #[test]
    fn test_blend_mode_applied_per_pixel() {
        let src = buffer(1, 1, &[0xFF808080]);
        let mut dst = buffer(1, 1, &[0xFF202020]);
        blend(&src, Rect::from_size(1, 1), &mut dst, Rect::from_size(1, 1), BlendMode::Add);
        assert_eq!(dst.pixels(), &[0xFFA0A0A0]);
    }

    #[test]
    fn test_resize_derives_missing_dimension() {
        let mut buf = pattern(4, 2);
        resize(&mut buf, 2, 0).unwrap();
        assert_eq!((buf.width(), buf.height()), (2, 1));
        assert_eq!(buf.pixels().len(), 2);
        assert_eq!(
            buf.modified_region(),
            Some(DirtyRegion { x1: 0, y1: 0, x2: 2, y2: 1 })
        );

        let mut buf = pattern(4, 2);
        resize(&mut buf, -1, 6).unwrap();
        assert_eq!((buf.width(), buf.height()), (12, 6));
    }

    #[test]
    fn test_resize_rejects_both_non_positive() {
        let mut buf = pattern(4, 2);
        assert!(matches!(resize(&mut buf, 0, -3), Err(OpsError::InvalidDimensions(_))));
        assert_eq!(buf.width(), 4);
    }

    #[test]
    fn test_resize_keeps_density_and_format() {
        let mut buf = PixelBuffer::with_density(2, 2, Format::Rgb, 2).unwrap();
        resize(&mut buf, 4, 0).unwrap();
        assert_eq!(buf.density(), 2);
        assert_eq!(buf.format(), Format::Rgb);
        assert_eq!((buf.pixel_width(), buf.pixel_height()), (8, 8));
    }

    #[test]
    fn test_resize_same_size_is_identity() {
        let mut buf = pattern(5, 3);
        let before = buf.pixels().to_vec();
        resize(&mut buf, 5, 3).unwrap();
        assert_eq!(buf.pixels(), &before[..]);
    }
}
