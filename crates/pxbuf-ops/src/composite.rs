//! Per-pixel compositing in 8-bit fixed point.
//!
//! Every mode shares the same shape: a channel operator `op(D, S)` picks
//! the "blended" value, then the result is mixed back over the destination
//! by the source alpha:
//!
//! ```text
//! s_a   = a + (a >= 127 ? 1 : 0)            // 0..=256
//! out_c = (D * (256 - s_a) + op(D, S) * s_a) >> 8
//! out_a = min(dst.a + src.a, 255)
//! ```
//!
//! [`BlendMode::Replace`] skips all of this and returns the source pixel.
//!
//! Products use `>> 8` instead of `/ 255`; `mul(a, b) = (a * (b + 1)) >> 8`
//! keeps `mul(x, 255) == x` and `mul(x, 0) == 0`.
//!
//! # Example
//!
//! ```rust
//! use pxbuf_ops::composite::{blend_color, BlendMode};
//!
//! let dst = 0xFF_20_40_80;
//! let src = 0xFF_FF_00_00;
//! assert_eq!(blend_color(dst, src, BlendMode::Lightest), 0xFF_FF_40_80);
//! assert_eq!(blend_color(dst, 0x00_FF_FF_FF, BlendMode::Add), dst);
//! ```

use pxbuf_core::color::{alpha, blue, green, pack, red};

/// Blend mode for compositing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Source replaces destination, alpha included.
    Replace,
    /// Straight alpha-over.
    #[default]
    Blend,
    /// `min(D + S, 255)`.
    Add,
    /// `max(D - S, 0)`.
    Subtract,
    /// `max(D, S)`.
    Lightest,
    /// `min(D, S)`.
    Darkest,
    /// `|D - S|`.
    Difference,
    /// `D + S - 2DS/255`.
    Exclusion,
    /// `DS/255`.
    Multiply,
    /// `D + S - DS/255`.
    Screen,
    /// Multiply darks, screen lights, keyed on the destination.
    Overlay,
    /// Overlay keyed on the source.
    HardLight,
    /// Pegtop soft light, `2DS + D^2 - 2D^2S` (normalized).
    SoftLight,
    /// Color dodge, `D / (1 - S)`.
    Dodge,
    /// Color burn, `1 - (1 - D) / S`.
    Burn,
}

impl BlendMode {
    /// Every mode, in declaration order.
    pub const ALL: [BlendMode; 15] = [
        BlendMode::Replace,
        BlendMode::Blend,
        BlendMode::Add,
        BlendMode::Subtract,
        BlendMode::Lightest,
        BlendMode::Darkest,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Dodge,
        BlendMode::Burn,
    ];

    /// Lowercase name, used in log fields.
    pub const fn name(self) -> &'static str {
        match self {
            BlendMode::Replace => "replace",
            BlendMode::Blend => "blend",
            BlendMode::Add => "add",
            BlendMode::Subtract => "subtract",
            BlendMode::Lightest => "lightest",
            BlendMode::Darkest => "darkest",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::HardLight => "hard_light",
            BlendMode::SoftLight => "soft_light",
            BlendMode::Dodge => "dodge",
            BlendMode::Burn => "burn",
        }
    }

    /// The per-channel operator `op(D, S)` for this mode.
    #[inline]
    pub fn channel_op(self) -> ChannelOp {
        CHANNEL_OPS[self as usize]
    }
}

/// Channel operator: destination and source channel in, blended channel out.
///
/// Inputs are in `0..=255`; the output is clamped by the caller.
pub type ChannelOp = fn(i32, i32) -> i32;

const CHANNEL_OPS: [ChannelOp; 15] = [
    op_source,
    op_source,
    op_add,
    op_subtract,
    op_lightest,
    op_darkest,
    op_difference,
    op_exclusion,
    op_multiply,
    op_screen,
    op_overlay,
    op_hard_light,
    op_soft_light,
    op_dodge,
    op_burn,
];

#[inline(always)]
fn mul(a: i32, b: i32) -> i32 {
    (a * (b + 1)) >> 8
}

fn op_source(_d: i32, s: i32) -> i32 {
    s
}

fn op_add(d: i32, s: i32) -> i32 {
    (d + s).min(255)
}

fn op_subtract(d: i32, s: i32) -> i32 {
    (d - s).max(0)
}

fn op_lightest(d: i32, s: i32) -> i32 {
    d.max(s)
}

fn op_darkest(d: i32, s: i32) -> i32 {
    d.min(s)
}

fn op_difference(d: i32, s: i32) -> i32 {
    (d - s).abs()
}

fn op_exclusion(d: i32, s: i32) -> i32 {
    d + s - mul(2 * d, s)
}

fn op_multiply(d: i32, s: i32) -> i32 {
    mul(d, s)
}

fn op_screen(d: i32, s: i32) -> i32 {
    d + s - mul(d, s)
}

fn op_overlay(d: i32, s: i32) -> i32 {
    if d < 128 {
        mul(2 * d, s)
    } else {
        255 - mul(2 * (255 - d), 255 - s)
    }
}

fn op_hard_light(d: i32, s: i32) -> i32 {
    op_overlay(s, d)
}

fn op_soft_light(d: i32, s: i32) -> i32 {
    let d2 = mul(d, d);
    mul(2 * d, s) + d2 - mul(2 * d2, s)
}

fn op_dodge(d: i32, s: i32) -> i32 {
    if s == 255 {
        255
    } else {
        ((d << 8) / (255 - s)).min(255)
    }
}

fn op_burn(d: i32, s: i32) -> i32 {
    if s == 0 {
        0
    } else {
        255 - (((255 - d) << 8) / s).min(255)
    }
}

/// Composites `src` over `dst` with the given mode.
///
/// Both pixels are read as full ARGB. A fully opaque source yields
/// `op(dst, src)` exactly; a fully transparent one leaves `dst` unchanged.
#[inline]
pub fn blend_color(dst: u32, src: u32, mode: BlendMode) -> u32 {
    if mode == BlendMode::Replace {
        return src;
    }
    let a = alpha(src);
    let sa = (a + u32::from(a >= 127)) as i32;
    let op = mode.channel_op();
    let mix = |d: u32, s: u32| -> u32 {
        let (d, s) = (d as i32, s as i32);
        let o = op(d, s).clamp(0, 255);
        ((d * (256 - sa) + o * sa) >> 8) as u32
    };
    pack(
        (alpha(dst) + a).min(255),
        mix(red(dst), red(src)),
        mix(green(dst), green(src)),
        mix(blue(dst), blue(src)),
    )
}
