// tile.rs — compose an icon's background tile, image and overlays
//
// Pure functions: the caller hands in everything that affects the pixels and
// gets back a fresh buffer. Title text and the selection frame are not part
// of the result, they are drawn on every expose (see Icon::paint).

use image::{Rgba, RgbaImage};
use smithay::utils::{Logical, Point};

use crate::font::{blend, TitleFont};
use crate::icon_image::IconImage;
use crate::theme::{Theme, TileKind};

/// Opacity of the light-colour wash on shadowed icons.
pub const SHADOW_ALPHA: u8 = 150;
/// Opacity of the black wash on highlighted icons.
pub const HIGHLIGHT_ALPHA: u8 = 160;

#[derive(Debug, Clone, Copy)]
pub struct TileRequest<'a> {
    pub kind: TileKind,
    pub show_title: bool,
    pub image: Option<&'a IconImage>,
    pub shadowed: bool,
    pub highlighted: bool,
}

pub fn composite(req: &TileRequest<'_>, theme: &Theme, icon_size: u32) -> RgbaImage {
    // The template is shared by every icon; always work on a copy.
    let mut tile = theme.tile(req.kind, req.show_title).clone();

    if let Some(image) = req.image {
        let title_height = if req.show_title {
            theme.title_font.height().max(0) as u32
        } else {
            0
        };
        blit_centered(&mut tile, image.pixels(), icon_size, title_height);
    }

    if req.shadowed {
        wash(&mut tile, theme.light, SHADOW_ALPHA);
    }
    if req.highlighted {
        wash(&mut tile, Rgba([0, 0, 0, 0xFF]), HIGHLIGHT_ALPHA);
    }
    tile
}

/// Source and destination rectangles for placing an image of `img_w`×`img_h`
/// on a `size` tile with `title_height` reserved at the top.
///
/// Returns `(sx, sy, dx, dy, w, h)`.
pub fn placement(img_w: u32, img_h: u32, size: u32, title_height: u32) -> (u32, u32, u32, u32, u32, u32) {
    let title_height = title_height.min(size);
    let w = img_w.min(size);
    let dx = (size - w) / 2;
    let sx = (img_w - w) / 2;

    let h = if img_h + title_height > size {
        size - title_height
    } else {
        img_h
    };
    let dy = title_height + (size - title_height - h) / 2;
    let sy = (img_h - h) / 2;
    (sx, sy, dx, dy, w, h)
}

fn blit_centered(tile: &mut RgbaImage, image: &RgbaImage, size: u32, title_height: u32) {
    let (sx, sy, dx, dy, w, h) = placement(image.width(), image.height(), size, title_height);
    for y in 0..h {
        for x in 0..w {
            let (tx, ty) = (dx + x, dy + y);
            if tx >= tile.width() || ty >= tile.height() {
                continue;
            }
            let src = *image.get_pixel(sx + x, sy + y);
            let dst = tile.get_pixel_mut(tx, ty);
            *dst = blend(*dst, src, src[3]);
        }
    }
}

fn wash(tile: &mut RgbaImage, color: Rgba<u8>, alpha: u8) {
    for px in tile.pixels_mut() {
        *px = blend(*px, color, alpha);
    }
}

// ── title layout ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleLayout {
    pub text: String,
    pub at: Point<i32, Logical>,
}

/// Shrink `title` to the tile and position it: right-aligned when it still
/// overflows `window_width - 4`, centred otherwise, never left of x = 2.
pub fn layout_title(font: &TitleFont, title: &str, icon_size: u32, window_width: i32) -> TitleLayout {
    let text = font.shrink(title, icon_size as i32 - 4);
    let width = font.text_width(&text);
    let x = if width > window_width - 4 {
        (window_width - 4) - width
    } else {
        (window_width - width) / 2
    };
    TitleLayout {
        text,
        at: (x.max(2), 1).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;

    fn theme() -> Theme {
        Theme::with_font(&ThemeConfig::default(), 64, TitleFont::fallback(8.0))
    }

    fn request(image: Option<&IconImage>) -> TileRequest<'_> {
        TileRequest {
            kind: TileKind::Normal,
            show_title: false,
            image,
            shadowed: false,
            highlighted: false,
        }
    }

    #[test]
    fn placement_centres_small_image() {
        assert_eq!(placement(32, 32, 64, 0), (0, 0, 16, 16, 32, 32));
        // 10 px title strip: remaining 54 rows, image centred below the strip.
        assert_eq!(placement(32, 32, 64, 10), (0, 0, 16, 21, 32, 32));
    }

    #[test]
    fn placement_clips_oversized_image_to_centre() {
        // 67×67 passes validation but exceeds the tile.
        assert_eq!(placement(67, 67, 64, 0), (1, 1, 0, 0, 64, 64));
        assert_eq!(placement(61, 60, 64, 10), (0, 3, 1, 10, 61, 54));
    }

    #[test]
    fn image_is_blitted_onto_tile() {
        let t = theme();
        let img = IconImage::new(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        let out = composite(&request(Some(&img)), &t, 64);
        assert_eq!(*out.get_pixel(28, 28), Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(10, 10), t.icon_tile.get_pixel(10, 10));
    }

    #[test]
    fn template_is_never_mutated() {
        let t = theme();
        let before = t.icon_tile.clone();
        let img = IconImage::new(RgbaImage::from_pixel(8, 8, Rgba([255, 0, 0, 255])));
        let mut req = request(Some(&img));
        req.highlighted = true;
        req.shadowed = true;
        let _ = composite(&req, &t, 64);
        assert_eq!(t.icon_tile, before);
    }

    #[test]
    fn compositing_is_deterministic() {
        let t = theme();
        let img = IconImage::new(RgbaImage::from_pixel(20, 12, Rgba([1, 200, 3, 128])));
        let req = request(Some(&img));
        assert_eq!(composite(&req, &t, 64), composite(&req, &t, 64));
    }

    #[test]
    fn highlight_darkens() {
        let t = theme();
        let mut req = request(None);
        let plain = composite(&req, &t, 64);
        req.highlighted = true;
        let dark = composite(&req, &t, 64);
        let (p, d) = (plain.get_pixel(30, 30), dark.get_pixel(30, 30));
        assert!(d[0] < p[0]);
        assert_eq!(*d, blend(*p, Rgba([0, 0, 0, 255]), HIGHLIGHT_ALPHA));
    }

    #[test]
    fn shadow_uses_light_colour() {
        let t = theme();
        let mut req = request(None);
        let plain = composite(&req, &t, 64);
        req.shadowed = true;
        let out = composite(&req, &t, 64);
        assert_eq!(
            *out.get_pixel(30, 30),
            blend(*plain.get_pixel(30, 30), t.light, SHADOW_ALPHA)
        );
    }

    #[test]
    fn titled_normal_tile_uses_miniwindow_template() {
        let t = theme();
        let mut req = request(None);
        req.show_title = true;
        assert_eq!(composite(&req, &t, 64), t.miniwindow_tile);
    }

    #[test]
    fn title_centred_when_it_fits() {
        let font = TitleFont::fallback(10.0);
        // "xterm" = 30 px → (64 - 30) / 2 = 17
        let l = layout_title(&font, "xterm", 64, 64);
        assert_eq!(l, TitleLayout { text: "xterm".into(), at: (17, 1).into() });
    }

    #[test]
    fn title_right_aligned_on_narrow_window_and_clamped() {
        let font = TitleFont::fallback(10.0);
        // Shrunk to 60 px in a 40 px window: (40 - 4) - width < 2 → clamped.
        let l = layout_title(&font, "VeryLongApplicationName", 64, 40);
        assert_eq!(l.at, (2, 1).into());
        // 9 chars = 54 px in a 60 px window: 54 > 56? no → centred at 3.
        let l = layout_title(&font, "Navigator", 64, 60);
        assert_eq!(l.at, (3, 1).into());
        // 54 px in a 57 px window: 54 > 53 → right-aligned at 53 - 54 → clamp.
        let l = layout_title(&font, "Navigator", 64, 57);
        assert_eq!(l.at, (2, 1).into());
    }
}
