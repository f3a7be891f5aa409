//! Edit, composite, filter and present pipelines.

use pxbuf_core::{BlitSurface, DirtyRegion, Format, PixelBuffer, Rect, TextureSource};
use pxbuf_ops::{BlendMode, Filter, FilterEngine, FilterKind, Sampling};
use tempfile::tempdir;
use tracing::info;

use crate::{generate, gradient, init_tracing};

#[test]
fn test_invert_example() {
    let mut buf = PixelBuffer::from_pixels(
        2,
        2,
        Format::Argb,
        vec![0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF],
    )
    .unwrap();
    pxbuf_ops::filter::apply(&mut buf, Filter::Invert).unwrap();
    assert_eq!(buf.pixels(), &[0xFF00FFFF, 0xFFFF00FF, 0xFFFFFF00, 0xFF000000]);
}

#[test]
fn test_composite_resize_filter_save() {
    init_tracing();
    let mut canvas = PixelBuffer::new(64, 48, Format::Rgb);
    {
        let mut px = canvas.edit();
        px.fill(0xFF202020);
    }
    assert!(canvas.take_modified().is_some());

    let sprite = generate(8, 8, Format::Argb, |x, y| if (x + y) % 2 == 0 { 0xFFFFFFFF } else { 0x00000000 });
    pxbuf_ops::blend(&sprite, Rect::from_size(8, 8), &mut canvas, Rect::new(4, 4, 16, 16), BlendMode::Blend);
    let dirty = canvas.modified_region().unwrap();
    assert_eq!(dirty.to_rect(), Rect::new(4, 4, 16, 16));

    pxbuf_ops::resize(&mut canvas, 32, 0).unwrap();
    assert_eq!((canvas.width(), canvas.height()), (32, 24));

    let mut engine = FilterEngine::new();
    engine.apply(&mut canvas, Filter::Blur(1.0)).unwrap();
    engine.apply(&mut canvas, Filter::Gray).unwrap();
    for &p in canvas.pixels() {
        let (r, g, b) = ((p >> 16) & 0xFF, (p >> 8) & 0xFF, p & 0xFF);
        assert!(r == g && g == b);
    }

    let dir = tempdir().unwrap();
    let path = pxbuf_io::try_save(dir.path().join("out.tga"), &canvas).unwrap();
    info!(path = %path.display(), "pipeline output written");
    let back = pxbuf_io::load(&path).unwrap();
    assert_eq!(back.width(), 32);
    assert_eq!(back.height(), 24);
}

#[test]
fn test_identity_blit_across_modes() {
    let src = gradient(20, 10);
    for mode in [BlendMode::Replace, BlendMode::Blend] {
        let mut dst = PixelBuffer::new(20, 10, Format::Argb);
        pxbuf_ops::blend(&src, Rect::from_size(20, 10), &mut dst, Rect::from_size(20, 10), mode);
        assert_eq!(dst.pixels(), src.pixels(), "{}", mode.name());
    }
}

#[test]
fn test_mask_then_composite() {
    let mut sprite = generate(4, 4, Format::Rgb, |_, _| 0xFFFF0000);
    let mask = generate(4, 4, Format::Alpha, |x, _| if x < 2 { 0xFF } else { 0 });
    pxbuf_ops::mask_with(&mut sprite, &mask).unwrap();
    assert_eq!(sprite.format(), Format::Argb);

    let mut dst = generate(4, 4, Format::Argb, |_, _| 0xFF0000FF);
    pxbuf_ops::blend(&sprite, Rect::from_size(4, 4), &mut dst, Rect::from_size(4, 4), BlendMode::Blend);
    assert_eq!(dst.get(0, 0), 0xFFFF0000);
    assert_eq!(dst.get(3, 3), 0xFF0000FF);
}

#[test]
fn test_self_blit_scroll() {
    let mut buf = gradient(16, 8);
    let before = buf.copy();
    pxbuf_ops::blend_self(&mut buf, Rect::new(0, 0, 15, 8), Rect::new(1, 0, 15, 8), BlendMode::Replace, Sampling::Nearest);
    for y in 0..8 {
        assert_eq!(buf.get(0, y), before.get(0, y));
        for x in 1..16 {
            assert_eq!(buf.get(x, y), before.get(x - 1, y));
        }
    }
}

#[test]
fn test_filter_kinds_validate_parameters() {
    assert!(Filter::from_kind(FilterKind::Posterize, None).is_err());
    assert!(Filter::from_kind(FilterKind::Invert, Some(1.0)).is_err());
    let mut buf = gradient(4, 4);
    let posterize = Filter::from_kind(FilterKind::Posterize, Some(1.0)).unwrap();
    assert!(pxbuf_ops::filter::apply(&mut buf, posterize).is_err());
}

#[test]
fn test_erode_dilate_isolated_pixels() {
    let mut bright = generate(5, 5, Format::Rgb, |x, y| if (x, y) == (2, 2) { 0xFFFFFFFF } else { 0xFF000000 });
    pxbuf_ops::filter::apply(&mut bright, Filter::Erode).unwrap();
    assert!(bright.pixels().iter().all(|&p| p == 0xFF000000));

    let mut dark = generate(5, 5, Format::Rgb, |x, y| if (x, y) == (2, 2) { 0xFF000000 } else { 0xFFFFFFFF });
    pxbuf_ops::filter::apply(&mut dark, Filter::Dilate).unwrap();
    assert!(dark.pixels().iter().all(|&p| p == 0xFFFFFFFF));
}

#[derive(Default)]
struct Screen {
    presents: Vec<(u32, u32, Option<DirtyRegion>)>,
    last: Vec<u32>,
}

impl BlitSurface for Screen {
    fn blit(&mut self, pixels: &[u32], pixel_width: u32, pixel_height: u32, dirty: Option<DirtyRegion>) {
        self.presents.push((pixel_width, pixel_height, dirty));
        self.last = pixels.to_vec();
    }
}

#[test]
fn test_present_dirty_regions() {
    let mut buf = PixelBuffer::with_density(8, 4, Format::Argb, 2).unwrap();
    let mut screen = Screen::default();

    buf.set(3, 1, 0xFFFFFFFF);
    buf.set(10, 6, 0xFFFFFFFF);
    buf.present_to(&mut screen);
    buf.present_to(&mut screen);

    let (w, h, dirty) = screen.presents[0];
    assert_eq!((w, h), (16, 8));
    assert_eq!(dirty.unwrap().to_rect(), Rect::new(3, 1, 8, 6));
    assert_eq!(screen.presents[1].2, None);
    assert_eq!(screen.last.len(), 16 * 8);

    let tex = buf.texture();
    assert_eq!(tex.pixels, screen.last.as_slice());
}
