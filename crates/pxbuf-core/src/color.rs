//! Packed ARGB helpers.
//!
//! A color is one `u32` laid out as `0xAARRGGBB`. These helpers are the only
//! place that knows the byte positions; everything else goes through them.
//!
//! ```rust
//! use pxbuf_core::color::{pack, red, alpha, luminance};
//!
//! let c = pack(0x80, 0xFF, 0x00, 0x00);
//! assert_eq!(c, 0x80FF0000);
//! assert_eq!(red(c), 0xFF);
//! assert_eq!(alpha(c), 0x80);
//! assert_eq!(luminance(c), 77 * 255);
//! ```

/// Alpha byte mask.
pub const ALPHA_MASK: u32 = 0xFF00_0000;
/// Red byte mask.
pub const RED_MASK: u32 = 0x00FF_0000;
/// Green byte mask.
pub const GREEN_MASK: u32 = 0x0000_FF00;
/// Blue byte mask.
pub const BLUE_MASK: u32 = 0x0000_00FF;
/// All three color bytes.
pub const RGB_MASK: u32 = 0x00FF_FFFF;

/// Luma weights scaled by 256: 0.30, 0.59, 0.11.
pub const LUMA_R: u32 = 77;
/// Green luma weight (x256).
pub const LUMA_G: u32 = 151;
/// Blue luma weight (x256).
pub const LUMA_B: u32 = 28;

/// Alpha channel of a packed color.
#[inline(always)]
pub const fn alpha(c: u32) -> u32 {
    c >> 24
}

/// Red channel of a packed color.
#[inline(always)]
pub const fn red(c: u32) -> u32 {
    (c >> 16) & 0xFF
}

/// Green channel of a packed color.
#[inline(always)]
pub const fn green(c: u32) -> u32 {
    (c >> 8) & 0xFF
}

/// Blue channel of a packed color.
#[inline(always)]
pub const fn blue(c: u32) -> u32 {
    c & 0xFF
}

/// Packs four channels. Each argument must already be in `0..=255`.
#[inline(always)]
pub const fn pack(a: u32, r: u32, g: u32, b: u32) -> u32 {
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Weighted luminance `77R + 151G + 28B`, unshifted (range `0..=65280`).
///
/// Used for the erode/dilate comparisons, where the shift would only lose
/// precision.
#[inline(always)]
pub const fn luminance(c: u32) -> u32 {
    LUMA_R * red(c) + LUMA_G * green(c) + LUMA_B * blue(c)
}

/// Luminance scaled back into `0..=255`.
#[inline(always)]
pub const fn gray_level(c: u32) -> u32 {
    luminance(c) >> 8
}
