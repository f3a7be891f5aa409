//! Integration tests for pxbuf crates.
//!
//! End-to-end checks across `pxbuf-core`, `pxbuf-ops` and `pxbuf-io`:
//! file round trips through every save path, and edit/filter/blit
//! pipelines on generated images.
//!
//! Set `RUST_LOG=pxbuf_io=debug` (or similar) to see library logs.

use pxbuf_core::{Format, PixelBuffer};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
mod codecs;
#[cfg(test)]
mod pipeline;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a buffer from a per-pixel function of (x, y).
pub fn generate(width: u32, height: u32, format: Format, f: impl Fn(u32, u32) -> u32) -> PixelBuffer {
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| f(x, y))
        .collect();
    match PixelBuffer::from_pixels(width, height, format, pixels) {
        Ok(buf) => buf,
        Err(e) => panic!("generated buffer rejected: {e}"),
    }
}

/// Opaque gradient with every channel varying.
pub fn gradient(width: u32, height: u32) -> PixelBuffer {
    generate(width, height, Format::Rgb, |x, y| {
        0xFF00_0000 | ((x * 255 / width.max(1)) << 16) | ((y * 255 / height.max(1)) << 8) | ((x + y) & 0xFF)
    })
}
