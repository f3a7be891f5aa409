//! Format detection utilities.
//!
//! Detects file formats from extensions and magic bytes.

use std::path::Path;

/// File formats known to the codec layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Uncompressed 24-bit TIFF in the fixed-header layout.
    Tiff,
    /// Truevision Targa.
    Tga,
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// Windows bitmap.
    Bmp,
    /// GIF format.
    Gif,
    /// Unknown/unsupported format.
    Unknown,
}

impl FileFormat {
    /// Detects format from file extension only (case-insensitive).
    pub fn from_extension<P: AsRef<Path>>(path: P) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("tif") | Some("tiff") => FileFormat::Tiff,
            Some("tga") => FileFormat::Tga,
            Some("png") => FileFormat::Png,
            Some("jpg") | Some("jpeg") => FileFormat::Jpeg,
            Some("bmp") => FileFormat::Bmp,
            Some("gif") => FileFormat::Gif,
            _ => FileFormat::Unknown,
        }
    }

    /// Detects format from magic bytes.
    ///
    /// Targa has no signature and is never reported here.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return FileFormat::Png;
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return FileFormat::Jpeg;
        }
        if bytes.starts_with(&[b'M', b'M', 0x00, 0x2A]) || bytes.starts_with(&[b'I', b'I', 0x2A, 0x00]) {
            return FileFormat::Tiff;
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return FileFormat::Gif;
        }
        if bytes.starts_with(b"BM") {
            return FileFormat::Bmp;
        }
        FileFormat::Unknown
    }

    /// Typical file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Tiff => "tif",
            FileFormat::Tga => "tga",
            FileFormat::Png => "png",
            FileFormat::Jpeg => "jpg",
            FileFormat::Bmp => "bmp",
            FileFormat::Gif => "gif",
            FileFormat::Unknown => "",
        }
    }

    /// Returns true if alpha is dropped when saving in this format.
    pub fn forces_rgb(&self) -> bool {
        matches!(self, FileFormat::Jpeg | FileFormat::Bmp | FileFormat::Tiff)
    }

    /// Matching `image` crate format, for the generic codec.
    pub(crate) fn to_image_format(self) -> Option<image::ImageFormat> {
        match self {
            FileFormat::Png => Some(image::ImageFormat::Png),
            FileFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            FileFormat::Bmp => Some(image::ImageFormat::Bmp),
            FileFormat::Gif => Some(image::ImageFormat::Gif),
            FileFormat::Tiff => Some(image::ImageFormat::Tiff),
            FileFormat::Tga | FileFormat::Unknown => None,
        }
    }
}
