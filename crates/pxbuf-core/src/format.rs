//! Pixel storage format tags.

use std::fmt;

/// How the 32-bit values of a [`PixelBuffer`](crate::PixelBuffer) are interpreted.
///
/// | Format | Stored value | Read back via `get` |
/// |--------|--------------|---------------------|
/// | `Rgb` | `0x??RRGGBB` | alpha forced to `0xFF` |
/// | `Argb` | `0xAARRGGBB` | as stored |
/// | `Alpha` | `0x000000AA` | white with alpha `AA` |
///
/// For `Rgb` the high byte is conventionally `0xFF` but nothing enforces it
/// until [`PixelBuffer::check_alpha`](crate::PixelBuffer::check_alpha) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Opaque color, high byte ignored.
    #[default]
    Rgb,
    /// Color with a real alpha channel.
    Argb,
    /// Single 8-bit alpha/gray value in the low byte.
    Alpha,
}

impl Format {
    /// Returns `true` if pixels of this format carry meaningful transparency.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Format::Argb | Format::Alpha)
    }

    /// Bytes per pixel when serialized by the uncompressed codecs.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Format::Rgb => 3,
            Format::Argb => 4,
            Format::Alpha => 1,
        }
    }

    /// Short lowercase name, used in log fields.
    pub const fn name(self) -> &'static str {
        match self {
            Format::Rgb => "rgb",
            Format::Argb => "argb",
            Format::Alpha => "alpha",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
