//! Truevision Targa (TGA) reader and writer.
//!
//! The writer emits top-left-origin files in one of three layouts picked by
//! the buffer format:
//!
//! | Format  | Image type     | Bits | Descriptor |
//! |---------|----------------|------|------------|
//! | `Alpha` | 11 (RLE gray)  | 8    | `0x28`     |
//! | `Rgb`   | 10 (RLE color) | 24   | `0x20`     |
//! | `Argb`  | 10 (RLE color) | 32   | `0x28`     |
//!
//! With RLE disabled the types become 3 and 2. Pixels are stored B, G, R
//! (then A for 32-bit); gray files store the low byte of each word.
//!
//! # RLE chunking
//!
//! The pixel stream is cut into chunks of at most 128 pixels. A run of two
//! or more identical pixels becomes a run chunk (`0x80 | (n - 1)`, then one
//! pixel). Everything else goes into a raw chunk (`n - 1`, then `n` pixels)
//! that grows while pixels keep changing; when a repeat shows up, the raw
//! chunk is cut two pixels early so the repeat starts the next run.
//!
//! The reader accepts types 2, 3, 10 and 11 at 8, 24 or 32 bits, in either
//! vertical origin. Color-mapped files are rejected.

use std::io::{Cursor, Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use pxbuf_core::{Format, PixelBuffer};
use tracing::trace;

use crate::{IoError, IoResult};

const HEADER_LEN: usize = 18;
const MAX_CHUNK: usize = 128;
const TOP_LEFT: u8 = 0x20;

/// TGA writer options.
#[derive(Debug, Clone)]
pub struct TgaWriterOptions {
    /// Run-length encode the pixel stream. Default: true.
    pub rle: bool,
}

impl Default for TgaWriterOptions {
    fn default() -> Self {
        Self { rle: true }
    }
}

/// Encodes a buffer to in-memory TGA with default options.
pub fn encode(buf: &PixelBuffer) -> IoResult<Vec<u8>> {
    encode_with_options(buf, &TgaWriterOptions::default())
}

/// Encodes a buffer to in-memory TGA.
pub fn encode_with_options(buf: &PixelBuffer, options: &TgaWriterOptions) -> IoResult<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + buf.pixel_count() * buf.format().bytes_per_pixel());
    write_to(&mut out, buf, options)?;
    Ok(out)
}

fn header(buf: &PixelBuffer, rle: bool) -> IoResult<[u8; HEADER_LEN]> {
    let too_big = || {
        IoError::EncodeError(format!(
            "{}x{} exceeds the 65535 TGA size limit",
            buf.pixel_width(),
            buf.pixel_height()
        ))
    };
    let width = u16::try_from(buf.pixel_width()).map_err(|_| too_big())?;
    let height = u16::try_from(buf.pixel_height()).map_err(|_| too_big())?;

    let (gray_type, color_type) = if rle { (0x0B, 0x0A) } else { (3, 2) };
    let (kind, bits, descriptor) = match buf.format() {
        Format::Alpha => (gray_type, 8, 0x28),
        Format::Rgb => (color_type, 24, 0x20),
        Format::Argb => (color_type, 32, 0x28),
    };

    let mut h = [0u8; HEADER_LEN];
    h[2] = kind;
    LittleEndian::write_u16(&mut h[12..14], width);
    LittleEndian::write_u16(&mut h[14..16], height);
    h[16] = bits;
    h[17] = descriptor;
    Ok(h)
}

/// Pixel-stream writer for one buffer format.
struct PixelWriter {
    format: Format,
}

impl PixelWriter {
    /// Value compared when looking for runs.
    #[inline]
    fn key(&self, c: u32) -> u32 {
        match self.format {
            Format::Alpha => c & 0xFF,
            _ => c,
        }
    }

    fn push(&self, out: &mut Vec<u8>, c: u32) {
        match self.format {
            Format::Alpha => out.push(c as u8),
            Format::Rgb => out.extend_from_slice(&[c as u8, (c >> 8) as u8, (c >> 16) as u8]),
            Format::Argb => out.extend_from_slice(&[
                c as u8,
                (c >> 8) as u8,
                (c >> 16) as u8,
                (c >> 24) as u8,
            ]),
        }
    }

    fn rle(&self, px: &[u32], out: &mut Vec<u8>) {
        let max = px.len();
        let mut chunk = [0u32; MAX_CHUNK];
        let mut index = 0;

        while index < max {
            let mut col = self.key(px[index]);
            let mut run = 1;
            while index + run < max && run < MAX_CHUNK && self.key(px[index + run]) == col {
                run += 1;
            }

            if run > 1 {
                out.push(0x80 | (run - 1) as u8);
                self.push(out, col);
                index += run;
                continue;
            }

            let mut len = 1;
            chunk[0] = col;
            while index + len < max {
                let c = self.key(px[index + len]);
                if (c != col && len < MAX_CHUNK) || len < 3 {
                    chunk[len] = c;
                    col = c;
                } else {
                    if c == col {
                        len -= 2;
                    }
                    break;
                }
                len += 1;
            }
            out.push((len - 1) as u8);
            for &c in &chunk[..len] {
                self.push(out, c);
            }
            index += len;
        }
    }

    fn raw(&self, px: &[u32], out: &mut Vec<u8>) {
        for &c in px {
            self.push(out, c);
        }
    }
}

/// Writes a buffer as TGA to `w`.
///
/// Physical pixels are written, top row first.
///
/// # Errors
///
/// [`IoError::EncodeError`] if either physical dimension exceeds 65535,
/// [`IoError::Io`] if the writer fails.
pub fn write_to<W: Write>(mut w: W, buf: &PixelBuffer, options: &TgaWriterOptions) -> IoResult<()> {
    let header = header(buf, options.rle)?;
    let writer = PixelWriter { format: buf.format() };

    let mut body = Vec::with_capacity(buf.pixel_count() * buf.format().bytes_per_pixel());
    if options.rle {
        writer.rle(buf.pixels(), &mut body);
    } else {
        writer.raw(buf.pixels(), &mut body);
    }
    trace!(
        format = %buf.format(),
        rle = options.rle,
        bytes = body.len(),
        "tga encoded"
    );

    w.write_all(&header)?;
    w.write_all(&body)?;
    Ok(())
}

fn truncated() -> IoError {
    IoError::DecodeError("TGA pixel data truncated".into())
}

fn read_pixel(cur: &mut Cursor<&[u8]>, bits: u8) -> IoResult<u32> {
    let mut px = [0u8; 4];
    let n = usize::from(bits / 8);
    cur.read_exact(&mut px[..n]).map_err(|_| truncated())?;
    Ok(match bits {
        8 => u32::from(px[0]),
        24 => 0xFF00_0000 | LittleEndian::read_u24(&px[..3]),
        _ => LittleEndian::read_u32(&px),
    })
}

/// Decodes a TGA file.
///
/// 8-bit files become `Alpha` buffers, 24-bit files `Rgb` (opaque) and
/// 32-bit files `Argb`.
///
/// # Errors
///
/// - [`IoError::InvalidFile`] for a short header
/// - [`IoError::UnsupportedFormat`] for color-mapped files, other image
///   types or other bit depths
/// - [`IoError::DecodeError`] for truncated data or runs past the end
pub fn decode(bytes: &[u8]) -> IoResult<PixelBuffer> {
    if bytes.len() < HEADER_LEN {
        return Err(IoError::InvalidFile(format!(
            "TGA too short for header: {} bytes",
            bytes.len()
        )));
    }
    let mut cur = Cursor::new(bytes);
    let id_len = cur.read_u8()?;
    let color_map = cur.read_u8()?;
    let kind = cur.read_u8()?;
    let width = LittleEndian::read_u16(&bytes[12..14]);
    let height = LittleEndian::read_u16(&bytes[14..16]);
    let bits = bytes[16];
    let descriptor = bytes[17];

    if color_map != 0 {
        return Err(IoError::UnsupportedFormat("color-mapped TGA".into()));
    }
    let (format, rle) = match (kind, bits) {
        (3, 8) => (Format::Alpha, false),
        (11, 8) => (Format::Alpha, true),
        (2, 24) => (Format::Rgb, false),
        (10, 24) => (Format::Rgb, true),
        (2, 32) => (Format::Argb, false),
        (10, 32) => (Format::Argb, true),
        _ => {
            return Err(IoError::UnsupportedFormat(format!(
                "TGA image type {kind} at {bits} bits"
            )));
        }
    };

    cur.set_position((HEADER_LEN + usize::from(id_len)) as u64);
    let count = usize::from(width) * usize::from(height);
    let mut pixels = Vec::with_capacity(count);

    if rle {
        while pixels.len() < count {
            let packet = cur.read_u8().map_err(|_| truncated())?;
            let n = usize::from(packet & 0x7F) + 1;
            if pixels.len() + n > count {
                return Err(IoError::DecodeError(format!(
                    "TGA packet of {n} pixels overruns the image"
                )));
            }
            if packet & 0x80 != 0 {
                let c = read_pixel(&mut cur, bits)?;
                pixels.extend(std::iter::repeat_n(c, n));
            } else {
                for _ in 0..n {
                    pixels.push(read_pixel(&mut cur, bits)?);
                }
            }
        }
    } else {
        for _ in 0..count {
            pixels.push(read_pixel(&mut cur, bits)?);
        }
    }

    if descriptor & TOP_LEFT == 0 && width > 0 {
        let stride = usize::from(width);
        pixels = pixels.chunks_exact(stride).rev().flatten().copied().collect();
    }

    Ok(PixelBuffer::from_pixels(
        u32::from(width),
        u32::from(height),
        format,
        pixels,
    )?)
}
