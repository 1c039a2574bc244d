// font.rs — icon title font: metrics, shrinking and rasterisation via ab_glyph
//
// When no font file can be found the font keeps working with synthetic
// monospace metrics (no glyphs are drawn), so titles still lay out and the
// rest of the icon pipeline never depends on the font being installed.

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use smithay::utils::{Logical, Point};

use crate::util::find_font;

pub const ELLIPSIS: &str = "...";

pub struct TitleFont {
    face: Option<FontVec>,
    scale: PxScale,
    size_px: f32,
}

impl std::fmt::Debug for TitleFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleFont")
            .field("size_px", &self.size_px)
            .field("has_face", &self.face.is_some())
            .finish()
    }
}

impl TitleFont {
    /// Locate `name` in the font directories and load it at `size_px`.
    pub fn load(name: &str, size_px: f32) -> Self {
        let Some(path) = find_font(name) else {
            tracing::warn!("Title font '{name}' not found — using fallback metrics");
            return Self::fallback(size_px);
        };
        let loaded = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|data| Self::from_bytes(data, size_px));
        match loaded {
            Ok(font) => font,
            Err(e) => {
                tracing::warn!("Title font {}: {e} — using fallback metrics", path.display());
                Self::fallback(size_px)
            }
        }
    }

    pub fn from_bytes(data: Vec<u8>, size_px: f32) -> Result<Self, String> {
        let face = FontVec::try_from_vec(data).map_err(|e| format!("ab_glyph parse error: {e}"))?;

        // PxScale(n) makes ascent + |descent| = n, while a point/pixel font size
        // means em square = n. Convert so titles match other toolkits.
        let upm = face.units_per_em().unwrap_or(1000.0);
        let height_unscaled = face.ascent_unscaled() - face.descent_unscaled();
        let scale = PxScale::from(size_px * height_unscaled / upm);

        Ok(Self {
            face: Some(face),
            scale,
            size_px,
        })
    }

    pub fn fallback(size_px: f32) -> Self {
        Self {
            face: None,
            scale: PxScale::from(size_px),
            size_px,
        }
    }

    /// Line height in pixels.
    pub fn height(&self) -> i32 {
        match &self.face {
            Some(face) => {
                let sf = face.as_scaled(self.scale);
                (sf.ascent() - sf.descent()).ceil() as i32
            }
            None => (self.size_px * 1.25).ceil() as i32,
        }
    }

    fn ascent(&self) -> f32 {
        match &self.face {
            Some(face) => face.as_scaled(self.scale).ascent(),
            None => self.size_px,
        }
    }

    fn fallback_advance(&self) -> i32 {
        (self.size_px * 0.6).ceil() as i32
    }

    pub fn text_width(&self, text: &str) -> i32 {
        let Some(face) = &self.face else {
            return text.chars().count() as i32 * self.fallback_advance();
        };
        let sf = face.as_scaled(self.scale);
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = sf.glyph_id(ch);
            if let Some(p) = prev {
                width += sf.kern(p, id);
            }
            width += sf.h_advance(id);
            prev = Some(id);
        }
        width.ceil() as i32
    }

    /// Shorten `text` to fit `max_width`.
    ///
    /// The first word is kept when it fits, then an ellipsis, then as much of
    /// the tail of the remaining text as still fits.
    pub fn shrink(&self, text: &str, max_width: i32) -> String {
        if self.text_width(text) <= max_width {
            return text.to_string();
        }

        let mut budget = max_width;
        let (head, rest) = match text.find([' ', ':']) {
            Some(i) => {
                let head = &text[..i];
                let w = self.text_width(head);
                if w > budget {
                    ("", text)
                } else {
                    budget -= w;
                    (head, &text[i + 1..])
                }
            }
            None => ("", text),
        };
        budget -= self.text_width(ELLIPSIS);

        let tail = rest
            .char_indices()
            .map(|(i, _)| &rest[i..])
            .find(|t| self.text_width(t) <= budget)
            .unwrap_or("");

        format!("{head}{ELLIPSIS}{tail}")
    }

    /// Draw `text` with its top-left corner at `at`, alpha-blending `color`.
    pub fn rasterize(&self, canvas: &mut RgbaImage, at: Point<i32, Logical>, text: &str, color: Rgba<u8>) {
        let Some(face) = &self.face else { return };
        let sf = face.as_scaled(self.scale);
        let baseline = at.y as f32 + self.ascent().round();
        let mut caret = at.x as f32;
        let mut prev = None;

        for ch in text.chars() {
            let id = sf.glyph_id(ch);
            if let Some(p) = prev {
                caret += sf.kern(p, id);
            }
            let glyph = id.with_scale_and_position(self.scale, point(caret, baseline));
            caret += sf.h_advance(id);
            prev = Some(id);

            let Some(outlined) = face.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
                    return;
                }
                let alpha = (coverage * color[3] as f32).round() as u8;
                let px = canvas.get_pixel_mut(x as u32, y as u32);
                *px = blend(*px, color, alpha);
            });
        }
    }
}

/// Source-over blend of `src` at `alpha` onto `dst`.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>, alpha: u8) -> Rgba<u8> {
    let a = alpha as u32;
    let inv = 255 - a;
    let mix = |d: u8, s: u8| ((s as u32 * a + d as u32 * inv + 127) / 255) as u8;
    Rgba([
        mix(dst[0], src[0]),
        mix(dst[1], src[1]),
        mix(dst[2], src[2]),
        (a + dst[3] as u32 * inv / 255).min(255) as u8,
    ])
}
