//! Alpha masking.

use pxbuf_core::color::RGB_MASK;
use pxbuf_core::{Format, PixelBuffer};
use tracing::trace;

use crate::{OpsError, OpsResult};

/// Replaces each pixel's alpha with the low byte of the matching mask value.
///
/// The buffer becomes `Argb` and is marked dirty as a whole.
///
/// # Errors
///
/// [`OpsError::SizeMismatch`] if `values` is not exactly one entry per pixel.
pub fn mask(buf: &mut PixelBuffer, values: &[u32]) -> OpsResult<()> {
    if values.len() != buf.pixel_count() {
        return Err(OpsError::SizeMismatch(format!(
            "mask has {} values, buffer has {} pixels",
            values.len(),
            buf.pixel_count()
        )));
    }
    trace!(pixels = values.len(), "mask");
    {
        let mut px = buf.edit();
        for (c, &m) in px.iter_mut().zip(values) {
            *c = ((m & 0xFF) << 24) | (*c & RGB_MASK);
        }
    }
    buf.set_format(Format::Argb);
    Ok(())
}

/// Uses another buffer's blue channel as the alpha mask.
///
/// # Errors
///
/// [`OpsError::SizeMismatch`] if the buffers differ in pixel count.
pub fn mask_with(buf: &mut PixelBuffer, mask_buf: &PixelBuffer) -> OpsResult<()> {
    mask(buf, mask_buf.pixels())
}
