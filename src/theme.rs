// theme.rs — tile templates and title styling built from ThemeConfig
//
// Templates are rendered once per theme load. The compositor only ever
// clones them, so a template is never mutated after construction.

use image::{imageops, Rgba, RgbaImage};

use crate::config::{TextureSpec, ThemeConfig};
use crate::font::TitleFont;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Normal,
    Clip,
    Drawer,
}

impl TileKind {
    /// Tile kind by name (`icon`/`normal`, `clip`, `drawer`).
    ///
    /// Unknown names log a warning and map to `Normal`, whose untitled
    /// variant is the plain icon tile.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "icon" | "normal" => TileKind::Normal,
            "clip" => TileKind::Clip,
            "drawer" => TileKind::Drawer,
            other => {
                tracing::warn!("Unknown tile type: {other} — using the icon tile");
                TileKind::Normal
            }
        }
    }
}

#[derive(Debug)]
pub struct Theme {
    pub icon_tile: RgbaImage,
    /// Icon tile with a strip reserved for the title.
    pub miniwindow_tile: RgbaImage,
    pub clip_tile: RgbaImage,
    pub drawer_tile: RgbaImage,
    /// Highlight colour of the icon background texture (used for shadowing).
    pub light: Rgba<u8>,
    pub title_font: TitleFont,
    pub title_color: Rgba<u8>,
    pub select_color: Rgba<u8>,
}

impl Theme {
    pub fn new(cfg: &ThemeConfig, icon_size: u32) -> Self {
        let font = TitleFont::load(&cfg.title_font, cfg.title_font_size);
        Self::with_font(cfg, icon_size, font)
    }

    pub fn with_font(cfg: &ThemeConfig, icon_size: u32, title_font: TitleFont) -> Self {
        let icon_tile = render_tile(&cfg.icon_back, icon_size);
        let mut miniwindow_tile = icon_tile.clone();
        let strip = (title_font.height().max(0) as u32).min(icon_size);
        for y in 0..strip {
            for x in 0..icon_size {
                miniwindow_tile.put_pixel(x, y, cfg.title_back);
            }
        }

        Self {
            light: light_of(&cfg.icon_back),
            clip_tile: render_tile(&cfg.clip_back, icon_size),
            drawer_tile: render_tile(&cfg.drawer_back, icon_size),
            icon_tile,
            miniwindow_tile,
            title_font,
            title_color: cfg.title_color,
            select_color: cfg.select_color,
        }
    }

    /// Template for `kind`; normal tiles with titles use the miniwindow tile.
    pub fn tile(&self, kind: TileKind, show_title: bool) -> &RgbaImage {
        match kind {
            TileKind::Normal if show_title => &self.miniwindow_tile,
            TileKind::Normal => &self.icon_tile,
            TileKind::Clip => &self.clip_tile,
            TileKind::Drawer => &self.drawer_tile,
        }
    }
}

// ── texture rendering ─────────────────────────────────────────────────────────

fn render_tile(spec: &TextureSpec, size: u32) -> RgbaImage {
    let mut tile = match spec {
        TextureSpec::Solid(c) => RgbaImage::from_pixel(size, size, *c),
        TextureSpec::Gradient(top, bottom) => {
            let span = size.saturating_sub(1).max(1);
            RgbaImage::from_fn(size, size, |_, y| lerp(*top, *bottom, y, span))
        }
        TextureSpec::Image(path) => match image::open(path) {
            Ok(img) => imageops::resize(
                &img.to_rgba8(),
                size,
                size,
                imageops::FilterType::Triangle,
            ),
            Err(e) => {
                tracing::warn!("Tile image {}: {e} — using grey", path.display());
                RgbaImage::from_pixel(size, size, Rgba([0x80, 0x80, 0x80, 0xFF]))
            }
        },
    };
    bevel(&mut tile, light_of(spec));
    tile
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, step: u32, span: u32) -> Rgba<u8> {
    let mix = |x: u8, y: u8| ((x as u32 * (span - step) + y as u32 * step) / span) as u8;
    Rgba([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), mix(a[3], b[3])])
}

fn base_color(spec: &TextureSpec) -> Rgba<u8> {
    match spec {
        TextureSpec::Solid(c) | TextureSpec::Gradient(c, _) => *c,
        TextureSpec::Image(_) => Rgba([0x80, 0x80, 0x80, 0xFF]),
    }
}

fn light_of(spec: &TextureSpec) -> Rgba<u8> {
    let c = base_color(spec);
    let up = |v: u8| v + (255 - v) / 2;
    Rgba([up(c[0]), up(c[1]), up(c[2]), 0xFF])
}

fn dark_of(light: Rgba<u8>) -> Rgba<u8> {
    Rgba([light[0] / 4, light[1] / 4, light[2] / 4, 0xFF])
}

/// One-pixel raised frame: light top/left, dark bottom/right.
fn bevel(tile: &mut RgbaImage, light: Rgba<u8>) {
    let (w, h) = tile.dimensions();
    if w < 2 || h < 2 {
        return;
    }
    let dark = dark_of(light);
    for x in 0..w {
        tile.put_pixel(x, 0, light);
        tile.put_pixel(x, h - 1, dark);
    }
    for y in 0..h {
        tile.put_pixel(0, y, light);
        tile.put_pixel(w - 1, y, dark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme() -> Theme {
        Theme::with_font(&ThemeConfig::default(), 64, TitleFont::fallback(8.0))
    }

    #[test]
    fn templates_have_icon_size() {
        let t = theme();
        for tile in [&t.icon_tile, &t.miniwindow_tile, &t.clip_tile, &t.drawer_tile] {
            assert_eq!(tile.dimensions(), (64, 64));
        }
    }

    #[test]
    fn miniwindow_tile_reserves_title_strip() {
        let cfg = ThemeConfig::default();
        let t = theme();
        // fallback 8 px font → 10 px strip
        assert_eq!(*t.miniwindow_tile.get_pixel(10, 5), cfg.title_back);
        assert_eq!(t.miniwindow_tile.get_pixel(10, 30), t.icon_tile.get_pixel(10, 30));
    }

    #[test]
    fn tile_selection() {
        let t = theme();
        assert!(std::ptr::eq(t.tile(TileKind::Normal, true), &t.miniwindow_tile));
        assert!(std::ptr::eq(t.tile(TileKind::Normal, false), &t.icon_tile));
        assert!(std::ptr::eq(t.tile(TileKind::Clip, true), &t.clip_tile));
        assert!(std::ptr::eq(t.tile(TileKind::Drawer, false), &t.drawer_tile));
    }

    #[test]
    fn unknown_tile_name_maps_to_plain_icon_tile() {
        let t = theme();
        let kind = TileKind::from_name("hexagon");
        assert_eq!(kind, TileKind::Normal);
        assert!(std::ptr::eq(t.tile(kind, false), &t.icon_tile));
        assert_eq!(TileKind::from_name("Drawer"), TileKind::Drawer);
        assert_eq!(TileKind::from_name("clip"), TileKind::Clip);
    }

    #[test]
    fn gradient_runs_top_to_bottom() {
        let spec = TextureSpec::Gradient(Rgba([0, 0, 0, 255]), Rgba([200, 200, 200, 255]));
        let tile = render_tile(&spec, 11);
        assert_eq!(tile.get_pixel(5, 5)[0], 100);
    }

    #[test]
    fn light_colour_is_brighter() {
        let light = light_of(&TextureSpec::Solid(Rgba([100, 0, 254, 255])));
        assert_eq!(light, Rgba([177, 127, 254, 255]));
    }
}
