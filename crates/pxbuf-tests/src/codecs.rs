//! File round trips through `pxbuf_io::save` / `pxbuf_io::load`.

use std::fs;

use pxbuf_core::{Format, PixelBuffer};
use pxbuf_io::{FileFormat, ImageCodec, ImageCrateCodec, IoError, SaveOptions, TgaWriterOptions};
use tempfile::tempdir;

use crate::{generate, gradient, init_tracing};

#[test]
fn test_tga_roundtrip_all_formats() {
    init_tracing();
    let dir = tempdir().unwrap();

    let cases = [
        ("rgb.tga", gradient(37, 19)),
        ("argb.tga", generate(40, 9, Format::Argb, |x, y| ((x * 6) << 24) | (y << 8) | 0x30)),
        ("alpha.tga", generate(129, 2, Format::Alpha, |x, _| (x / 5) & 0xFF)),
        ("one.tga", generate(1, 1, Format::Argb, |_, _| 0x12345678)),
    ];
    for (name, buf) in &cases {
        let path = dir.path().join(name);
        assert!(pxbuf_io::save(&path, buf), "{name}");
        let back = pxbuf_io::load(&path).unwrap();
        assert_eq!(back.format(), buf.format(), "{name}");
        assert_eq!(back.pixels(), buf.pixels(), "{name}");
    }
}

#[test]
fn test_tga_uncompressed_option() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.tga");
    let buf = gradient(16, 16);
    let opts = SaveOptions {
        tga: TgaWriterOptions { rle: false },
        ..Default::default()
    };
    assert!(pxbuf_io::save_with_options(&path, &buf, &opts));
    assert_eq!(fs::metadata(&path).unwrap().len(), 18 + 16 * 16 * 3);
    assert_eq!(pxbuf_io::load(&path).unwrap().pixels(), buf.pixels());
}

#[test]
fn test_tiff_roundtrip_drops_alpha() {
    init_tracing();
    let dir = tempdir().unwrap();
    let buf = generate(10, 7, Format::Argb, |x, y| (0x40 << 24) | (x << 16) | (y << 8) | 0x99);
    let path = pxbuf_io::try_save(dir.path().join("frame.tiff"), &buf).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 768 + 10 * 7 * 3);

    let back = pxbuf_io::load(&path).unwrap();
    assert_eq!(back.format(), Format::Rgb);
    for y in 0..7 {
        for x in 0..10 {
            assert_eq!(back.get(x, y), buf.get(x, y) | 0xFF00_0000);
        }
    }
}

#[test]
fn test_missing_extension_writes_tif() {
    let dir = tempdir().unwrap();
    let buf = gradient(4, 4);
    assert!(pxbuf_io::save(dir.path().join("nested").join("noext"), &buf));
    let path = dir.path().join("nested").join("noext.tif");
    assert!(path.exists());
    assert_eq!(pxbuf_io::load(&path).unwrap().pixels(), buf.pixels());
}

#[test]
fn test_foreign_tiff_falls_back_to_generic() {
    init_tracing();
    let dir = tempdir().unwrap();
    let buf = gradient(9, 5);
    let bytes = ImageCrateCodec
        .encode(&buf, FileFormat::Tiff, &SaveOptions::default())
        .unwrap();
    assert!(pxbuf_io::tiff::decode(&bytes).is_err());

    let path = dir.path().join("foreign.tif");
    fs::write(&path, &bytes).unwrap();
    let back = pxbuf_io::load(&path).unwrap();
    assert_eq!((back.width(), back.height()), (9, 5));
    assert_eq!(back.pixels(), buf.pixels());
}

#[test]
fn test_png_keeps_alpha() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.png");
    let buf = generate(12, 3, Format::Argb, |x, _| ((x * 20) << 24) | 0x00FF8000);
    assert!(pxbuf_io::save(&path, &buf));
    let back = pxbuf_io::load(&path).unwrap();
    assert_eq!(back.format(), Format::Argb);
    assert_eq!(back.pixels(), buf.pixels());
}

#[test]
fn test_jpeg_and_bmp_are_rgb() {
    let dir = tempdir().unwrap();
    let buf = generate(8, 8, Format::Argb, |_, _| 0x80FFFFFF);
    for name in ["a.jpg", "a.bmp"] {
        let path = dir.path().join(name);
        assert!(pxbuf_io::save(&path, &buf), "{name}");
        let back = pxbuf_io::load(&path).unwrap();
        assert_eq!(back.format(), Format::Rgb, "{name}");
    }
}

/// Codec that refuses everything.
struct Refusing;

impl ImageCodec for Refusing {
    fn decode(&self, _bytes: &[u8], hint: Option<FileFormat>) -> pxbuf_io::IoResult<PixelBuffer> {
        Err(IoError::UnsupportedFormat(format!("refused {hint:?}")))
    }

    fn encode(&self, _buf: &PixelBuffer, format: FileFormat, _options: &SaveOptions) -> pxbuf_io::IoResult<Vec<u8>> {
        Err(IoError::UnsupportedFormat(format!("refused {format:?}")))
    }
}

#[test]
fn test_custom_codec_is_used() {
    let dir = tempdir().unwrap();
    let buf = gradient(2, 2);

    assert!(!pxbuf_io::save_with(dir.path().join("x.png"), &buf, &SaveOptions::default(), &Refusing));
    // native formats never reach the codec
    assert!(pxbuf_io::save_with(dir.path().join("x.tga"), &buf, &SaveOptions::default(), &Refusing));
    assert!(pxbuf_io::load_with(dir.path().join("x.tga"), &Refusing).is_ok());

    fs::write(dir.path().join("y.png"), b"\x89PNG\r\n\x1a\n").unwrap();
    let err = pxbuf_io::load_with(dir.path().join("y.png"), &Refusing).unwrap_err();
    assert!(err.to_string().contains("refused"));
}
