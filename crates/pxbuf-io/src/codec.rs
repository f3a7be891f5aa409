//! Generic codec delegation.
//!
//! PNG, JPEG, BMP and GIF (and TIFFs the raw reader rejects) go through an
//! [`ImageCodec`]. [`ImageCrateCodec`] is the default, backed by the `image`
//! crate; embedders with their own decoder implement the trait and pass it to
//! [`crate::load_with`] / [`crate::save_with`].

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use pxbuf_core::color::{alpha, blue, green, red};
use pxbuf_core::{Format, PixelBuffer};
use tracing::{debug, trace, warn};

use crate::{FileFormat, IoError, IoResult, SaveOptions};

/// Encoder/decoder for formats not handled natively.
pub trait ImageCodec {
    /// Decodes `bytes`, optionally told the expected format.
    ///
    /// With no hint (or [`FileFormat::Unknown`]) the codec guesses.
    fn decode(&self, bytes: &[u8], hint: Option<FileFormat>) -> IoResult<PixelBuffer>;

    /// Encodes `buf` as `format`.
    fn encode(&self, buf: &PixelBuffer, format: FileFormat, options: &SaveOptions) -> IoResult<Vec<u8>>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8], hint: Option<FileFormat>) -> IoResult<PixelBuffer> {
        let img = match hint.and_then(FileFormat::to_image_format) {
            Some(fmt) => image::load_from_memory_with_format(bytes, fmt),
            None => {
                debug!("no format hint, guessing");
                image::load_from_memory(bytes)
            }
        }
        .map_err(|e| IoError::DecodeError(e.to_string()))?;

        dynamic_to_buffer(img)
    }

    fn encode(&self, buf: &PixelBuffer, format: FileFormat, options: &SaveOptions) -> IoResult<Vec<u8>> {
        let Some(image_format) = format.to_image_format() else {
            return Err(IoError::UnsupportedFormat(format!("{format:?}")));
        };
        trace!(?format, width = buf.pixel_width(), height = buf.pixel_height(), "generic encode");

        let img = buffer_to_dynamic(buf, format.forces_rgb());
        let mut out = Cursor::new(Vec::new());
        if format == FileFormat::Jpeg {
            let encoder = JpegEncoder::new_with_quality(&mut out, options.jpeg_quality);
            img.write_with_encoder(encoder)
        } else {
            img.write_to(&mut out, image_format)
        }
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
        Ok(out.into_inner())
    }
}

fn dynamic_to_buffer(img: DynamicImage) -> IoResult<PixelBuffer> {
    let (width, height) = (img.width(), img.height());
    let buf = if img.color().has_alpha() {
        let pixels = img
            .to_rgba8()
            .pixels()
            .map(|&Rgba([r, g, b, a])| u32::from_be_bytes([a, r, g, b]))
            .collect();
        PixelBuffer::from_pixels(width, height, Format::Argb, pixels)?
    } else {
        let pixels = img
            .to_rgb8()
            .pixels()
            .map(|&Rgb([r, g, b])| u32::from_be_bytes([0xFF, r, g, b]))
            .collect();
        PixelBuffer::from_pixels(width, height, Format::Rgb, pixels)?
    };
    trace!(width, height, format = %buf.format(), "generic decode");
    Ok(buf)
}

fn buffer_to_dynamic(buf: &PixelBuffer, force_rgb: bool) -> DynamicImage {
    let (w, h) = (buf.pixel_width(), buf.pixel_height());
    let at = |x: u32, y: u32| buf.get(x as i32, y as i32);

    if force_rgb || !buf.format().has_alpha() {
        if buf.format().has_alpha() {
            warn!(format = %buf.format(), "alpha dropped for rgb-only format");
        }
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            let c = at(x, y);
            Rgb([red(c) as u8, green(c) as u8, blue(c) as u8])
        }))
    } else {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            let c = at(x, y);
            Rgba([red(c) as u8, green(c) as u8, blue(c) as u8, alpha(c) as u8])
        }))
    }
}
