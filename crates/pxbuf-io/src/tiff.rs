//! Raw 24-bit TIFF in a fixed-header layout.
//!
//! This is not a general TIFF reader. Files are a 768-byte header built
//! from one byte template, followed by `width * height` RGB triplets in
//! row-major order. Only the size fields differ between files:
//!
//! | Offset    | Field                         | Type   |
//! |-----------|-------------------------------|--------|
//! | 30..32    | ImageWidth                    | u16 BE |
//! | 42..44    | ImageLength                   | u16 BE |
//! | 102..104  | RowsPerStrip (= ImageLength)  | u16 BE |
//! | 114..118  | StripByteCounts (`w * h * 3`) | u32 BE |
//!
//! Anything else (compressed TIFFs, other bit depths, little-endian files)
//! is rejected by [`decode`]; [`crate::load`] then hands the bytes to the
//! generic codec.
//!
//! # Example
//!
//! ```rust
//! use pxbuf_core::{Format, PixelBuffer};
//! use pxbuf_io::tiff;
//!
//! let mut buf = PixelBuffer::new(2, 1, Format::Rgb);
//! buf.set(0, 0, 0xFF123456);
//! let bytes = tiff::encode(&buf).unwrap();
//! assert_eq!(bytes.len(), tiff::HEADER_LEN + 2 * 3);
//!
//! let back = tiff::decode(&bytes).unwrap();
//! assert_eq!(back.get(0, 0), 0xFF123456);
//! ```

use std::io::Write;

use byteorder::{BigEndian, ByteOrder};
use pxbuf_core::{Format, PixelBuffer};
use tracing::{error, warn};

use crate::{IoError, IoResult};

/// Header length; pixel data starts here.
pub const HEADER_LEN: usize = 768;

const WIDTH_AT: usize = 30;
const HEIGHT_AT: usize = 42;
const ROWS_PER_STRIP_AT: usize = 102;
const BYTE_COUNT_AT: usize = 114;

// Big-endian, 9 IFD entries, one strip at offset 768, 8/8/8 bits per sample.
// Bytes past the template are zero.
const TEMPLATE: [u8; 128] = [
    77, 77, 0, 42, 0, 0, 0, 8, 0, 9, 0, 254, 0, 4, 0, 0, //
    0, 1, 0, 0, 0, 0, 1, 0, 0, 3, 0, 0, 0, 1, 0, 0, //
    0, 0, 1, 1, 0, 3, 0, 0, 0, 1, 0, 0, 0, 0, 1, 2, //
    0, 3, 0, 0, 0, 3, 0, 0, 0, 122, 1, 6, 0, 3, 0, 0, //
    0, 1, 0, 2, 0, 0, 1, 17, 0, 4, 0, 0, 0, 1, 0, 0, //
    3, 0, 1, 21, 0, 3, 0, 0, 0, 1, 0, 3, 0, 0, 1, 22, //
    0, 3, 0, 0, 0, 1, 0, 0, 0, 0, 1, 23, 0, 4, 0, 0, //
    0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 0, 8, 0, 8, //
];

fn is_patched(offset: usize) -> bool {
    (WIDTH_AT..WIDTH_AT + 2).contains(&offset)
        || (HEIGHT_AT..HEIGHT_AT + 2).contains(&offset)
        || (ROWS_PER_STRIP_AT..ROWS_PER_STRIP_AT + 2).contains(&offset)
        || (BYTE_COUNT_AT..BYTE_COUNT_AT + 4).contains(&offset)
}

fn template_byte(offset: usize) -> u8 {
    TEMPLATE.get(offset).copied().unwrap_or(0)
}

/// Builds the header for a `width` x `height` image.
fn header(width: u16, height: u16) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[..TEMPLATE.len()].copy_from_slice(&TEMPLATE);
    BigEndian::write_u16(&mut out[WIDTH_AT..], width);
    BigEndian::write_u16(&mut out[HEIGHT_AT..], height);
    BigEndian::write_u16(&mut out[ROWS_PER_STRIP_AT..], height);
    BigEndian::write_u32(&mut out[BYTE_COUNT_AT..], u32::from(width) * u32::from(height) * 3);
    out
}

/// Decodes a raw TIFF produced by [`encode`] (or any file with the same header).
///
/// The result is an [`Format::Rgb`] buffer with every pixel fully opaque.
///
/// # Errors
///
/// [`IoError::InvalidFile`] if the header deviates from the template, the
/// two height fields disagree, the byte count is not `w * h * 3`, or the
/// pixel data is truncated.
pub fn decode(bytes: &[u8]) -> IoResult<PixelBuffer> {
    if bytes.len() < HEADER_LEN {
        return Err(IoError::InvalidFile(format!(
            "TIFF too short for header: {} bytes",
            bytes.len()
        )));
    }
    if let Some(offset) = (0..HEADER_LEN).find(|&i| !is_patched(i) && bytes[i] != template_byte(i)) {
        return Err(IoError::InvalidFile(format!(
            "not a raw 24-bit TIFF (header differs at byte {offset})"
        )));
    }

    let width = BigEndian::read_u16(&bytes[WIDTH_AT..]);
    let height = BigEndian::read_u16(&bytes[HEIGHT_AT..]);
    let rows = BigEndian::read_u16(&bytes[ROWS_PER_STRIP_AT..]);
    if height != rows {
        return Err(IoError::InvalidFile(format!(
            "TIFF height fields disagree: {height} vs {rows}"
        )));
    }

    let count = BigEndian::read_u32(&bytes[BYTE_COUNT_AT..]) as usize;
    let expected = usize::from(width) * usize::from(height) * 3;
    if count != expected {
        return Err(IoError::InvalidFile(format!(
            "TIFF byte count {count} does not match {width}x{height}x3"
        )));
    }

    let data = &bytes[HEADER_LEN..];
    if data.len() < expected {
        return Err(IoError::InvalidFile(format!(
            "TIFF pixel data truncated: {} of {expected} bytes",
            data.len()
        )));
    }

    let pixels = data[..expected]
        .chunks_exact(3)
        .map(|rgb| 0xFF00_0000 | (u32::from(rgb[0]) << 16) | (u32::from(rgb[1]) << 8) | u32::from(rgb[2]))
        .collect();
    Ok(PixelBuffer::from_pixels(
        u32::from(width),
        u32::from(height),
        Format::Rgb,
        pixels,
    )?)
}

/// Decodes, logging and swallowing failures.
///
/// Returns `None` for anything [`decode`] rejects, so the caller can try
/// another decoder.
pub fn load(bytes: &[u8]) -> Option<PixelBuffer> {
    match decode(bytes) {
        Ok(buf) => Some(buf),
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

/// Encodes a buffer to an in-memory raw TIFF.
pub fn encode(buf: &PixelBuffer) -> IoResult<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + buf.pixel_count() * 3);
    write_to(&mut out, buf)?;
    Ok(out)
}

/// Writes a buffer as raw TIFF to `w`.
///
/// Physical pixels are written; alpha is dropped. `Alpha` buffers write
/// their stored words as-is, so the coverage byte lands in blue.
///
/// # Errors
///
/// [`IoError::EncodeError`] if either physical dimension exceeds 65535.
pub fn write_to<W: Write>(mut w: W, buf: &PixelBuffer) -> IoResult<()> {
    let too_big = || {
        IoError::EncodeError(format!(
            "{}x{} exceeds the 65535 TIFF size limit",
            buf.pixel_width(),
            buf.pixel_height()
        ))
    };
    let width = u16::try_from(buf.pixel_width()).map_err(|_| too_big())?;
    let height = u16::try_from(buf.pixel_height()).map_err(|_| too_big())?;

    if buf.format().has_alpha() {
        warn!(format = %buf.format(), "TIFF has no alpha channel, alpha dropped");
    }

    w.write_all(&header(width, height))?;
    let mut row = Vec::with_capacity(usize::from(width) * 3);
    for line in buf.pixels().chunks_exact(usize::from(width).max(1)) {
        row.clear();
        for &c in line {
            row.extend_from_slice(&[(c >> 16) as u8, (c >> 8) as u8, c as u8]);
        }
        w.write_all(&row)?;
    }
    Ok(())
}
