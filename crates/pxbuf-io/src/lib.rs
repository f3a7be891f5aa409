//! # pxbuf-io
//!
//! Reading and writing [`PixelBuffer`]s.
//!
//! | Format | Read | Write | Handled by |
//! |--------|------|-------|------------|
//! | TIFF (raw 24-bit) | Yes | Yes | [`tiff`] |
//! | TIFF (other) | Yes | - | generic codec fallback |
//! | TGA | Yes | Yes | [`tga`] |
//! | PNG | Yes | Yes | generic codec |
//! | JPEG | Yes | Yes (RGB) | generic codec |
//! | BMP | Yes | Yes (RGB) | generic codec |
//! | GIF | Yes | Yes | generic codec |
//!
//! The generic codec is the [`ImageCodec`] trait; [`ImageCrateCodec`] backs
//! it with the `image` crate.
//!
//! # Saving
//!
//! The format comes from the extension. A path with no known extension is
//! written as TIFF with `.tif` appended. Missing parent directories are
//! created. [`save`] logs failures and returns `false`; [`try_save`] returns
//! the error and the path actually written.
//!
//! # Loading
//!
//! [`load`] dispatches on the extension and falls back to magic bytes for
//! unknown ones. A `.tif` that is not a raw 24-bit TIFF goes to the generic
//! codec.
//!
//! # Example
//!
//! ```rust,no_run
//! use pxbuf_core::{Format, PixelBuffer};
//!
//! let mut buf = PixelBuffer::new(64, 64, Format::Argb);
//! buf.set(10, 10, 0x80FF0000);
//! assert!(pxbuf_io::save("out/frame.tga", &buf));
//!
//! let back = pxbuf_io::load("out/frame.tga")?;
//! assert_eq!(back.get(10, 10), 0x80FF0000);
//! # Ok::<(), pxbuf_io::IoError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod codec;
mod detect;
mod error;
pub mod tga;
pub mod tiff;

pub use codec::{ImageCodec, ImageCrateCodec};
pub use detect::FileFormat;
pub use error::{IoError, IoResult};
pub use tga::TgaWriterOptions;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use pxbuf_core::PixelBuffer;
use tracing::{debug, error, trace};

/// Options for [`save_with_options`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// TGA writer settings.
    pub tga: TgaWriterOptions,
    /// JPEG quality (1-100). Default: 90.
    pub jpeg_quality: u8,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            tga: TgaWriterOptions::default(),
            jpeg_quality: 90,
        }
    }
}

/// Loads an image, choosing the decoder from the extension.
///
/// # Errors
///
/// I/O errors, decode errors, or [`IoError::UnsupportedFormat`] when
/// nothing recognizes the bytes.
pub fn load<P: AsRef<Path>>(path: P) -> IoResult<PixelBuffer> {
    load_with(path, &ImageCrateCodec)
}

/// [`load`] with a caller-supplied generic codec.
pub fn load_with<P: AsRef<Path>, C: ImageCodec + ?Sized>(path: P, codec: &C) -> IoResult<PixelBuffer> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let format = FileFormat::from_extension(path);
    trace!(path = %path.display(), ?format, len = bytes.len(), "load");

    let format = match format {
        FileFormat::Unknown => {
            let sniffed = FileFormat::from_bytes(&bytes);
            debug!(?sniffed, "unknown extension, sniffed magic bytes");
            if sniffed == FileFormat::Unknown {
                return codec.decode(&bytes, None).map_err(|e| {
                    IoError::UnsupportedFormat(format!("{}: {e}", path.display()))
                });
            }
            sniffed
        }
        known => known,
    };
    decode(&bytes, format, codec)
}

fn decode<C: ImageCodec + ?Sized>(bytes: &[u8], format: FileFormat, codec: &C) -> IoResult<PixelBuffer> {
    match format {
        FileFormat::Tga => tga::decode(bytes),
        FileFormat::Tiff => match tiff::load(bytes) {
            Some(buf) => Ok(buf),
            None => {
                debug!("not a raw tiff, falling back to generic codec");
                codec.decode(bytes, Some(FileFormat::Tiff))
            }
        },
        other => codec.decode(bytes, Some(other)),
    }
}

/// Saves an image, logging any failure.
///
/// Returns `true` on success. See [`try_save`] for the path rules.
pub fn save<P: AsRef<Path>>(path: P, buf: &PixelBuffer) -> bool {
    save_with_options(path, buf, &SaveOptions::default())
}

/// [`save`] with explicit options.
pub fn save_with_options<P: AsRef<Path>>(path: P, buf: &PixelBuffer, options: &SaveOptions) -> bool {
    save_with(path, buf, options, &ImageCrateCodec)
}

/// [`save`] with explicit options and a caller-supplied generic codec.
pub fn save_with<P: AsRef<Path>, C: ImageCodec + ?Sized>(
    path: P,
    buf: &PixelBuffer,
    options: &SaveOptions,
    codec: &C,
) -> bool {
    let path = path.as_ref();
    match try_save_with(path, buf, options, codec) {
        Ok(_) => true,
        Err(e) => {
            error!(path = %path.display(), "save failed: {e}");
            false
        }
    }
}

/// Saves an image with default options.
///
/// - png, jpg/jpeg, bmp, gif: generic codec (alpha dropped for jpg/bmp)
/// - tga: [`tga`] writer
/// - tif/tiff: [`tiff`] writer
/// - anything else: `.tif` appended, [`tiff`] writer
///
/// The image is fully encoded before the file is created, so an encode
/// failure leaves nothing on disk. Returns the path written.
pub fn try_save<P: AsRef<Path>>(path: P, buf: &PixelBuffer) -> IoResult<PathBuf> {
    try_save_with(path, buf, &SaveOptions::default(), &ImageCrateCodec)
}

/// [`try_save`] with explicit options and codec.
pub fn try_save_with<P: AsRef<Path>, C: ImageCodec + ?Sized>(
    path: P,
    buf: &PixelBuffer,
    options: &SaveOptions,
    codec: &C,
) -> IoResult<PathBuf> {
    let (path, format) = resolve_save_path(path.as_ref());
    trace!(path = %path.display(), ?format, "save");

    // encode first so a rejected image never leaves a partial file behind
    let bytes = match format {
        FileFormat::Tga => tga::encode_with_options(buf, &options.tga)?,
        FileFormat::Tiff => tiff::encode(buf)?,
        generic => codec.encode(buf, generic, options)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &bytes)?;
    Ok(path)
}

fn resolve_save_path(path: &Path) -> (PathBuf, FileFormat) {
    match FileFormat::from_extension(path) {
        FileFormat::Unknown => {
            let mut name = OsString::from(path.as_os_str());
            name.push(".");
            name.push(FileFormat::Tiff.extension());
            (PathBuf::from(name), FileFormat::Tiff)
        }
        format => (path.to_path_buf(), format),
    }
}
