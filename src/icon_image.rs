// icon_image.rs — normalized icon images and the per-screen default slot
//
// An `IconImage` is an immutable, reference-counted RGBA buffer that has
// already been size-validated. Icons share one instance with the default slot
// (or with their owner's protocol icon); nothing ever mutates it in place.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::database::IconDatabase;
use crate::error::IconError;

/// Room kept free around an image for the tile's frame decoration.
pub const ICON_BORDER: u32 = 3;

#[derive(Debug, Clone)]
pub struct IconImage(Rc<RgbaImage>);

impl IconImage {
    pub fn new(image: RgbaImage) -> Self {
        Self(Rc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.0
    }

    /// True when both handles refer to the same buffer.
    pub fn shares(&self, other: &IconImage) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

/// Scale an oversized image so its longer side becomes `max_size - ICON_BORDER`.
///
/// Images within `max_size + ICON_BORDER` on both axes are returned untouched.
pub fn validate_icon_size(image: RgbaImage, max_size: u32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= max_size + ICON_BORDER && h <= max_size + ICON_BORDER {
        return image;
    }
    let target = max_size.saturating_sub(ICON_BORDER).max(1);
    // The short side truncates: 400x110 becomes 61x16, not 61x17.
    let (nw, nh) = if w > h {
        (target, (h * target / w).max(1))
    } else {
        ((w * target / h).max(1), target)
    };
    tracing::debug!("Scaling icon {w}x{h} → {nw}x{nh}");
    imageops::resize(&image, nw, nh, FilterType::Triangle)
}

/// Decode `path` and size-validate it for an icon of `max_size`.
pub fn load_icon_file(path: &Path, max_size: u32) -> Result<IconImage, IconError> {
    let decoded = image::open(path).map_err(|source| match source {
        image::ImageError::IoError(e) => IconError::io(path, e),
        source => IconError::Decode {
            path: path.to_path_buf(),
            source,
        },
    })?;
    Ok(IconImage::new(validate_icon_size(decoded.to_rgba8(), max_size)))
}

/// Built-in last-resort icon: a bevelled grey plate with a dark inner square.
pub fn builtin_default_image(size: u32) -> RgbaImage {
    let edge = size.saturating_sub(2 * ICON_BORDER + 8).max(8);
    let plate = Rgba([0xB0, 0xB0, 0xB0, 0xFF]);
    let light = Rgba([0xE8, 0xE8, 0xE8, 0xFF]);
    let dark = Rgba([0x50, 0x50, 0x50, 0xFF]);
    let inner = Rgba([0x30, 0x30, 0x38, 0xFF]);
    let inset = edge / 4;

    RgbaImage::from_fn(edge, edge, |x, y| {
        if x == 0 || y == 0 {
            light
        } else if x == edge - 1 || y == edge - 1 {
            dark
        } else if (inset..edge - inset).contains(&x) && (inset..edge - inset).contains(&y) {
            inner
        } else {
            plate
        }
    })
}

// ── default image slot ────────────────────────────────────────────────────────

/// Lazily populated, per-screen shared default icon.
#[derive(Debug, Default)]
pub struct DefaultImageSlot {
    image: Option<IconImage>,
}

impl DefaultImageSlot {
    /// Return the shared default image, creating it on first use.
    ///
    /// Tries `configured` first, then the database's `default` entry, then
    /// falls back to the built-in plate. Never fails.
    pub fn get(
        &mut self,
        configured: Option<&Path>,
        database: &IconDatabase,
        icon_size: u32,
    ) -> IconImage {
        if let Some(image) = &self.image {
            return image.clone();
        }

        let candidates: Vec<PathBuf> = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(database.default_icon())
            .collect();

        let image = candidates
            .iter()
            .find_map(|path| match load_icon_file(path, icon_size) {
                Ok(image) => Some(image),
                Err(e) => {
                    tracing::warn!("Default icon unusable: {e}");
                    None
                }
            })
            .unwrap_or_else(|| IconImage::new(builtin_default_image(icon_size)));

        tracing::debug!("Default icon created ({}x{})", image.width(), image.height());
        self.image = Some(image.clone());
        image
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    /// Drop the slot's reference; icons still holding it keep it alive.
    pub fn reset(&mut self) {
        self.image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_scaled_preserving_aspect() {
        let scaled = validate_icon_size(RgbaImage::new(400, 100), 64);
        assert_eq!(scaled.dimensions(), (61, 15));
        // 110 * 61 / 400 = 16.775
        let scaled = validate_icon_size(RgbaImage::new(400, 110), 64);
        assert_eq!(scaled.dimensions(), (61, 16));
    }

    #[test]
    fn tall_image_is_scaled_on_height() {
        let scaled = validate_icon_size(RgbaImage::new(80, 200), 64);
        assert_eq!(scaled.dimensions(), (24, 61));
    }

    #[test]
    fn small_image_untouched() {
        let mut img = RgbaImage::new(50, 40);
        img.put_pixel(3, 4, Rgba([1, 2, 3, 4]));
        let out = validate_icon_size(img.clone(), 64);
        assert_eq!(out, img);
    }

    #[test]
    fn border_tolerance_is_inclusive() {
        // 67 = 64 + ICON_BORDER: still accepted as-is.
        let out = validate_icon_size(RgbaImage::new(67, 67), 64);
        assert_eq!(out.dimensions(), (67, 67));
        let out = validate_icon_size(RgbaImage::new(68, 10), 64);
        assert_eq!(out.dimensions(), (61, 8));
    }

    #[test]
    fn default_slot_is_shared() {
        let db = IconDatabase::default();
        let mut slot = DefaultImageSlot::default();
        assert!(!slot.is_loaded());
        let a = slot.get(None, &db, 64);
        let b = slot.get(None, &db, 64);
        assert!(a.shares(&b));
        assert_eq!(a.holders(), 3);
    }

    #[test]
    fn default_slot_survives_missing_file() {
        let db = IconDatabase::default();
        let mut slot = DefaultImageSlot::default();
        let img = slot.get(Some(Path::new("/nonexistent/default.png")), &db, 64);
        assert_eq!(img.pixels(), &builtin_default_image(64));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_icon_file(Path::new("/nonexistent/x.png"), 64).unwrap_err();
        assert!(matches!(err, IconError::Io { .. }));
    }

    #[test]
    fn load_scales_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbaImage::new(400, 100).save(&path).unwrap();
        let img = load_icon_file(&path, 64).unwrap();
        assert_eq!((img.width(), img.height()), (61, 15));
    }
}
