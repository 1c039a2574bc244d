// store.rs — persist a client-supplied icon into the per-user cache
//
// Files are keyed `<instance>.<class>.tiff`. An existing file is never
// overwritten; its path is returned as-is.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::database::identity_key;
use crate::display::DisplayServer;
use crate::error::IconError;
use crate::icon::Icon;
use crate::owner::ManagedWindow;

const CACHE_EXT: &str = "tiff";

/// Write the owner's icon to `cache_dir`. `None` means nothing could be
/// cached; callers carry on without a persisted copy.
pub fn store_icon<D: DisplayServer>(icon: &Icon, display: &D, cache_dir: &Path) -> Option<PathBuf> {
    let owner = icon.owner()?.borrow();
    match cache_owner_icon(&owner, display, cache_dir) {
        Ok(path) => Some(path),
        Err(e @ (IconError::NoIdentity | IconError::NoImage)) => {
            tracing::debug!("Icon {:?} not cached: {e}", icon.id());
            None
        }
        Err(e) => {
            tracing::warn!("Icon {:?} not cached: {e}", icon.id());
            None
        }
    }
}

fn cache_owner_icon<D: DisplayServer>(
    owner: &ManagedWindow,
    display: &D,
    cache_dir: &Path,
) -> Result<PathBuf, IconError> {
    ensure_dir(cache_dir)?;

    let key = identity_key(owner.instance.as_deref(), owner.class.as_deref())
        .ok_or(IconError::NoIdentity)?;
    let path = cache_dir.join(format!("{key}.{CACHE_EXT}"));
    if path.exists() {
        return Ok(path);
    }

    let image: RgbaImage = match &owner.net_icon_image {
        Some(image) => image.pixels().clone(),
        None => {
            let pixmap = owner.hints.icon_pixmap.ok_or(IconError::NoImage)?;
            display
                .capture_drawable(pixmap, owner.hints.icon_mask)
                .ok_or(IconError::NoImage)?
        }
    };

    save(&image, &path)?;
    tracing::debug!("Stored icon for {key} at {}", path.display());
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), IconError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|e| IconError::io(dir, e))
}

fn save(image: &RgbaImage, path: &Path) -> Result<(), IconError> {
    image.save(path).map_err(|source| IconError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::IconDatabase;
    use crate::headless::HeadlessDisplay;
    use crate::icon_image::IconImage;
    use crate::owner::OwnerRef;
    use crate::yard::tests::yard_with;
    use crate::yard::IconYard;
    use image::Rgba;

    fn yard_in(dir: &Path) -> IconYard<HeadlessDisplay> {
        let mut config = Config::default();
        config.icons.cache_dir = Some(dir.join("cache"));
        config.icons.database = Some(dir.join("icons.json"));
        yard_with(config)
    }

    fn owner_with_icon(instance: Option<&str>, class: Option<&str>) -> OwnerRef {
        let mut w = ManagedWindow::new(instance, class);
        w.net_icon_image = Some(IconImage::new(RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255]))));
        w.into_ref()
    }

    #[test]
    fn stores_protocol_icon_as_tiff() {
        let tmp = tempfile::tempdir().unwrap();
        let mut y = yard_in(tmp.path());
        let id = y.create_for_window(owner_with_icon(Some("xterm"), Some("XTerm"))).unwrap();

        let path = y.store_icon(id).unwrap();
        assert_eq!(path, tmp.path().join("cache").join("xterm.XTerm.tiff"));
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (8, 8));
        assert_eq!(back.get_pixel(3, 3), &Rgba([200, 10, 10, 255]));

        // The cached file becomes the application's database icon.
        let db = IconDatabase::load(&tmp.path().join("icons.json"));
        assert_eq!(db.lookup(Some("xterm"), Some("XTerm"), None), Some(path.as_path()));
    }

    #[test]
    fn existing_database_entry_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let mut y = yard_in(tmp.path());
        y.screen.database.insert("xterm.XTerm", "/icons/mine.png");
        let id = y.create_for_window(owner_with_icon(Some("xterm"), Some("XTerm"))).unwrap();

        assert!(y.store_icon(id).is_some());
        assert_eq!(
            y.screen.database.lookup(Some("xterm"), Some("XTerm"), None),
            Some(Path::new("/icons/mine.png"))
        );
        assert!(!tmp.path().join("icons.json").exists());
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join("cache");
        std::fs::create_dir_all(&cache).unwrap();
        let existing = cache.join("XTerm.tiff");
        std::fs::write(&existing, b"keep").unwrap();

        let mut y = yard_in(tmp.path());
        let id = y.create_for_window(owner_with_icon(None, Some("XTerm"))).unwrap();
        assert_eq!(y.store_icon(id), Some(existing.clone()));
        assert_eq!(std::fs::read(&existing).unwrap(), b"keep");
    }

    #[test]
    fn legacy_pixmap_is_captured() {
        let tmp = tempfile::tempdir().unwrap();
        let mut y = yard_in(tmp.path());
        let pixmap = y
            .screen
            .display
            .add_drawable(RgbaImage::from_pixel(6, 4, Rgba([1, 2, 3, 255])));
        let mut w = ManagedWindow::new(Some("a"), Some("B"));
        w.hints.icon_pixmap = Some(pixmap);
        let id = y.create_for_window(w.into_ref()).unwrap();

        let path = y.store_icon(id).unwrap();
        assert_eq!(image::open(path).unwrap().to_rgba8().dimensions(), (6, 4));
    }

    #[test]
    fn nothing_to_store() {
        let tmp = tempfile::tempdir().unwrap();
        let mut y = yard_in(tmp.path());

        let plain = y.create_for_window(ManagedWindow::new(Some("a"), Some("B")).into_ref()).unwrap();
        assert_eq!(y.store_icon(plain), None);

        let anonymous = y.create_for_window(owner_with_icon(None, None)).unwrap();
        assert_eq!(y.store_icon(anonymous), None);

        let dock = y.create_for_dock(None, Some("a"), Some("B"), crate::theme::TileKind::Normal).unwrap();
        assert_eq!(y.store_icon(dock), None);
    }

    #[test]
    fn uncreatable_cache_dir_yields_none() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let mut config = Config::default();
        config.icons.cache_dir = Some(blocker.join("cache"));
        let mut y = yard_with(config);
        let id = y.create_for_window(owner_with_icon(Some("a"), Some("B"))).unwrap();
        assert_eq!(y.store_icon(id), None);
    }
}
