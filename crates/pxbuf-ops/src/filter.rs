//! Whole-buffer filters.
//!
//! Every filter runs in place over the full pixel array and marks the whole
//! buffer dirty.
//!
//! # Filters
//!
//! - [`Filter::Gray`] - luma to gray; `Alpha` buffers become inverted opaque gray
//! - [`Filter::Invert`] - flips the color bits, alpha untouched
//! - [`Filter::Opaque`] - forces alpha to `0xFF` and retags as `Rgb`
//! - [`Filter::Threshold`] - black/white on the brightest channel
//! - [`Filter::Posterize`] - quantizes each channel to `levels` steps
//! - [`Filter::Blur`] - separable triangular blur, edge-clamped
//! - [`Filter::Erode`] / [`Filter::Dilate`] - 4-neighbour luminance min/max
//!
//! # Example
//!
//! ```rust
//! use pxbuf_core::{Format, PixelBuffer};
//! use pxbuf_ops::filter::{Filter, FilterEngine};
//!
//! let mut buf = PixelBuffer::from_pixels(
//!     2, 2, Format::Argb,
//!     vec![0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF],
//! ).unwrap();
//! let mut engine = FilterEngine::new();
//! engine.apply(&mut buf, Filter::Invert).unwrap();
//! assert_eq!(buf.pixels(), &[0xFF00FFFF, 0xFFFF00FF, 0xFFFFFF00, 0xFF000000]);
//! ```

use pxbuf_core::color::{blue, green, luminance, pack, red, ALPHA_MASK, RGB_MASK};
use pxbuf_core::{Format, PixelBuffer};
use tracing::{debug, trace};

use crate::{OpsError, OpsResult};

/// Largest blur radius after scaling.
pub const MAX_BLUR_RADIUS: usize = 248;

/// Filter tag without its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// See [`Filter::Gray`].
    Gray,
    /// See [`Filter::Invert`].
    Invert,
    /// See [`Filter::Opaque`].
    Opaque,
    /// See [`Filter::Threshold`].
    Threshold,
    /// See [`Filter::Posterize`].
    Posterize,
    /// See [`Filter::Blur`].
    Blur,
    /// See [`Filter::Erode`].
    Erode,
    /// See [`Filter::Dilate`].
    Dilate,
}

/// A filter together with its parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    /// Weighted luma gray, alpha kept.
    Gray,
    /// `pixel ^ 0xFFFFFF`.
    Invert,
    /// `pixel | 0xFF000000`, format becomes `Rgb`.
    Opaque,
    /// Level in `0.0..=1.0`.
    Threshold(f32),
    /// Level count in `2..=255`.
    Posterize(i32),
    /// Blur radius; scaled by 3.5 and clamped to `1..=248`.
    Blur(f32),
    /// Grow dark areas.
    Erode,
    /// Grow light areas.
    Dilate,
}

impl Filter {
    /// Default level for [`Filter::Threshold`].
    pub const DEFAULT_THRESHOLD: f32 = 0.5;
    /// Default radius for [`Filter::Blur`].
    pub const DEFAULT_BLUR: f32 = 1.0;

    /// Builds a filter from a tag and an optional parameter.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] when a parameterless filter is given a
    /// parameter, or when `Posterize` is given none.
    pub fn from_kind(kind: FilterKind, param: Option<f32>) -> OpsResult<Self> {
        let no_param = |f: Filter| match param {
            None => Ok(f),
            Some(p) => Err(OpsError::InvalidParameter(format!(
                "{kind:?} takes no parameter (got {p})"
            ))),
        };
        match kind {
            FilterKind::Gray => no_param(Filter::Gray),
            FilterKind::Invert => no_param(Filter::Invert),
            FilterKind::Opaque => no_param(Filter::Opaque),
            FilterKind::Erode => no_param(Filter::Erode),
            FilterKind::Dilate => no_param(Filter::Dilate),
            FilterKind::Threshold => Ok(Filter::Threshold(param.unwrap_or(Self::DEFAULT_THRESHOLD))),
            FilterKind::Blur => Ok(Filter::Blur(param.unwrap_or(Self::DEFAULT_BLUR))),
            FilterKind::Posterize => match param {
                Some(levels) => Ok(Filter::Posterize(levels as i32)),
                None => Err(OpsError::InvalidParameter(
                    "Posterize requires a level count".into(),
                )),
            },
        }
    }

    /// The tag of this filter.
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Gray => FilterKind::Gray,
            Filter::Invert => FilterKind::Invert,
            Filter::Opaque => FilterKind::Opaque,
            Filter::Threshold(_) => FilterKind::Threshold,
            Filter::Posterize(_) => FilterKind::Posterize,
            Filter::Blur(_) => FilterKind::Blur,
            Filter::Erode => FilterKind::Erode,
            Filter::Dilate => FilterKind::Dilate,
        }
    }
}

/// Triangular blur kernel.
///
/// `weights[radius +- i] = (radius - i)^2`, so the centre weighs `radius^2`
/// and the two end taps weigh 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlurKernel {
    radius: usize,
    weights: Vec<u64>,
}

impl BlurKernel {
    /// Maps a user radius to taps: `clamp(round(r * 3.5), 1, 248)`.
    pub fn scaled_radius(r: f32) -> usize {
        let scaled = (r * 3.5).round();
        if scaled.is_nan() || scaled < 1.0 {
            1
        } else {
            (scaled as usize).min(MAX_BLUR_RADIUS)
        }
    }

    /// Builds the kernel for an already scaled radius.
    pub fn with_radius(radius: usize) -> Self {
        let radius = radius.clamp(1, MAX_BLUR_RADIUS);
        let weights = (0..2 * radius + 1)
            .map(|i| {
                let d = radius - i.abs_diff(radius);
                (d * d) as u64
            })
            .collect();
        Self { radius, weights }
    }

    /// Scaled radius in taps.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Tap weights, `2 * radius + 1` long.
    pub fn weights(&self) -> &[u64] {
        &self.weights
    }

    /// Weighted mean around `pos` over a line of `len` samples. Taps that
    /// fall outside the line are dropped from both sums.
    #[inline]
    fn convolve<const N: usize>(
        &self,
        len: usize,
        pos: usize,
        get: impl Fn(usize) -> [u32; N],
    ) -> [u32; N] {
        let r = self.radius;
        let first = pos.saturating_sub(r);
        let last = (pos + r + 1).min(len);
        let mut acc = [0u64; N];
        let mut sum = 0u64;
        for read in first..last {
            let w = self.weights[read + r - pos];
            let c = get(read);
            for (a, v) in acc.iter_mut().zip(c) {
                *a += w * v as u64;
            }
            sum += w;
        }
        acc.map(|a| (a / sum) as u32)
    }
}

/// Applies filters, caching the blur kernel between calls.
///
/// The cache is rebuilt only when the scaled blur radius changes.
#[derive(Debug, Default)]
pub struct FilterEngine {
    kernel: Option<BlurKernel>,
}

impl FilterEngine {
    /// Creates an engine with an empty kernel cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached blur kernel, if a blur has run.
    pub fn kernel(&self) -> Option<&BlurKernel> {
        self.kernel.as_ref()
    }

    fn blur_kernel(&mut self, r: f32) -> &BlurKernel {
        let radius = BlurKernel::scaled_radius(r);
        if self.kernel.as_ref().is_none_or(|k| k.radius != radius) {
            debug!(radius, "building blur kernel");
            self.kernel = Some(BlurKernel::with_radius(radius));
        }
        self.kernel.get_or_insert_with(|| BlurKernel::with_radius(radius))
    }

    /// Runs `filter` over the whole buffer.
    ///
    /// # Errors
    ///
    /// [`OpsError::InvalidParameter`] for a posterize level outside `2..=255`.
    /// The buffer is left untouched in that case.
    pub fn apply(&mut self, buf: &mut PixelBuffer, filter: Filter) -> OpsResult<()> {
        trace!(
            ?filter,
            width = buf.pixel_width(),
            height = buf.pixel_height(),
            format = buf.format().name(),
            "filter"
        );
        match filter {
            Filter::Gray => gray(buf),
            Filter::Invert => map_pixels(buf, |c| c ^ RGB_MASK),
            Filter::Opaque => {
                map_pixels(buf, |c| c | ALPHA_MASK);
                buf.set_format(Format::Rgb);
            }
            Filter::Threshold(level) => threshold(buf, level),
            Filter::Posterize(levels) => posterize(buf, levels)?,
            Filter::Blur(r) => {
                let kernel = self.blur_kernel(r);
                blur(buf, kernel);
            }
            Filter::Erode => morph(buf, |cand, cur| cand < cur),
            Filter::Dilate => morph(buf, |cand, cur| cand > cur),
        }
        Ok(())
    }
}

/// Runs one filter with a throwaway engine.
pub fn apply(buf: &mut PixelBuffer, filter: Filter) -> OpsResult<()> {
    FilterEngine::new().apply(buf, filter)
}

fn map_pixels(buf: &mut PixelBuffer, f: impl Fn(u32) -> u32) {
    let mut px = buf.edit();
    for c in px.iter_mut() {
        *c = f(*c);
    }
}

fn gray(buf: &mut PixelBuffer) {
    if buf.format() == Format::Alpha {
        map_pixels(buf, |v| {
            let col = 255 - (v & 0xFF);
            pack(0xFF, col, col, col)
        });
        buf.set_format(Format::Rgb);
    } else {
        map_pixels(buf, |c| {
            let lum = luminance(c) >> 8;
            (c & ALPHA_MASK) | (lum << 16) | (lum << 8) | lum
        });
    }
}

fn threshold(buf: &mut PixelBuffer, level: f32) {
    let thresh = (level * 255.0) as i64;
    map_pixels(buf, |c| {
        let max = red(c).max(green(c)).max(blue(c)) as i64;
        (c & ALPHA_MASK) | if max < thresh { 0 } else { RGB_MASK }
    });
}

fn posterize(buf: &mut PixelBuffer, levels: i32) -> OpsResult<()> {
    if !(2..=255).contains(&levels) {
        return Err(OpsError::InvalidParameter(format!(
            "posterize levels must be between 2 and 255, got {levels}"
        )));
    }
    let levels = levels as u32;
    let quantize = |v: u32| (((v * levels) >> 8) * 255) / (levels - 1);
    map_pixels(buf, |c| {
        (c & ALPHA_MASK) | (quantize(red(c)) << 16) | (quantize(green(c)) << 8) | quantize(blue(c))
    });
    Ok(())
}

fn blur(buf: &mut PixelBuffer, kernel: &BlurKernel) {
    let (w, h) = (buf.pixel_width() as usize, buf.pixel_height() as usize);
    match buf.format() {
        Format::Alpha => blur_planes::<1>(buf, kernel, w, h, |c| [c & 0xFF], |[a]| a),
        Format::Rgb => blur_planes::<3>(
            buf,
            kernel,
            w,
            h,
            |c| [red(c), green(c), blue(c)],
            |[r, g, b]| pack(0xFF, r, g, b),
        ),
        Format::Argb => blur_planes::<4>(
            buf,
            kernel,
            w,
            h,
            |c| [c >> 24, red(c), green(c), blue(c)],
            |[a, r, g, b]| pack(a, r, g, b),
        ),
    }
}

/// Horizontal pass into a scratch plane, vertical pass back into `buf`.
fn blur_planes<const N: usize>(
    buf: &mut PixelBuffer,
    kernel: &BlurKernel,
    w: usize,
    h: usize,
    split: impl Fn(u32) -> [u32; N],
    join: impl Fn([u32; N]) -> u32,
) {
    let mut scratch = vec![[0u32; N]; w * h];
    {
        let src = buf.pixels();
        for y in 0..h {
            let row = &src[y * w..(y + 1) * w];
            for x in 0..w {
                scratch[y * w + x] = kernel.convolve(w, x, |i| split(row[i]));
            }
        }
    }

    let mut px = buf.edit();
    for y in 0..h {
        for x in 0..w {
            let v = kernel.convolve(h, y, |i| scratch[i * w + x]);
            px[y * w + x] = join(v);
        }
    }
}

/// Replaces each pixel with the neighbour that `better` prefers.
///
/// Candidates are visited left, right, up, down; out-of-bounds neighbours
/// are the pixel itself.
fn morph(buf: &mut PixelBuffer, better: impl Fn(u32, u32) -> bool) {
    let (w, h) = (buf.pixel_width() as usize, buf.pixel_height() as usize);
    let src = buf.pixels();
    let mut out = vec![0u32; src.len()];
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let left = if x > 0 { i - 1 } else { i };
            let right = if x + 1 < w { i + 1 } else { i };
            let up = if y > 0 { i - w } else { i };
            let down = if y + 1 < h { i + w } else { i };

            let mut best = src[i];
            let mut best_lum = luminance(best);
            for n in [left, right, up, down] {
                let lum = luminance(src[n]);
                if better(lum, best_lum) {
                    best = src[n];
                    best_lum = lum;
                }
            }
            out[i] = best;
        }
    }
    buf.edit().copy_from_slice(&out);
}
