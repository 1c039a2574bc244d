// resolve.rs — choose where an icon's image comes from and load it
//
// Priority, first match wins:
//   1. owner forces its user icon        → user/database image
//   2. icon has a foreign icon window    → dockapp, no image
//   3. owner carries a protocol icon     → shared, not copied
//   4. owner has a legacy pixmap hint    → captured and size-validated,
//                                          falling through to 5 on failure
//   5. user/database image, else the screen's shared default image
//
// Nothing here fails: every miss is logged and falls through.

use std::path::PathBuf;

use crate::display::{DisplayServer, DrawableId, WindowId};
use crate::icon::Icon;
use crate::icon_image::{load_icon_file, validate_icon_size, IconImage};
use crate::owner::ManagedWindow;
use crate::screen::Screen;
use crate::util::absolute_path_for_file;

#[derive(Debug, Clone)]
pub enum ImageSource {
    User,
    ForeignWindow(WindowId),
    Protocol(IconImage),
    LegacyPixmap {
        pixmap: DrawableId,
        mask: Option<DrawableId>,
    },
}

pub fn select_source(owner: Option<&ManagedWindow>, foreign: Option<WindowId>) -> ImageSource {
    if owner.is_some_and(|o| o.always_user_icon) {
        return ImageSource::User;
    }
    if let Some(window) = foreign {
        return ImageSource::ForeignWindow(window);
    }
    let Some(owner) = owner else {
        return ImageSource::User;
    };
    if let Some(image) = &owner.net_icon_image {
        return ImageSource::Protocol(image.clone());
    }
    if let Some(pixmap) = owner.hints.icon_pixmap {
        return ImageSource::LegacyPixmap {
            pixmap,
            mask: owner.hints.icon_mask,
        };
    }
    ImageSource::User
}

/// Look up and load the per-application image from the icon database.
pub fn database_image<D: DisplayServer>(
    screen: &Screen<D>,
    instance: Option<&str>,
    class: Option<&str>,
    command: Option<&str>,
) -> Option<(PathBuf, IconImage)> {
    let file = screen.database.lookup(instance, class, command)?;
    let path = match file.to_str() {
        Some(name) => absolute_path_for_file(&screen.prefs.image_paths, name),
        None => None,
    };
    let Some(path) = path else {
        tracing::warn!("Icon {} not found in image path", file.display());
        return None;
    };
    match load_icon_file(&path, screen.prefs.icon_size) {
        Ok(image) => Some((path, image)),
        Err(e) => {
            tracing::warn!("Database icon unusable: {e}");
            None
        }
    }
}

impl Icon {
    /// Run the priority chain and install the result as the active image.
    pub(crate) fn resolve_image<D: DisplayServer>(&mut self, screen: &mut Screen<D>) {
        let source = {
            let owner = self.owner().map(|o| o.borrow());
            select_source(owner.as_deref(), self.foreign_window())
        };
        tracing::debug!("Icon {:?} image source: {source:?}", self.id());

        self.image = match source {
            ImageSource::ForeignWindow(_) => None,
            ImageSource::Protocol(image) => Some(image),
            ImageSource::LegacyPixmap { pixmap, mask } => self
                .capture_legacy_pixmap(screen, pixmap, mask)
                .or_else(|| Some(self.user_or_default(screen))),
            ImageSource::User => Some(self.user_or_default(screen)),
        };
    }

    fn capture_legacy_pixmap<D: DisplayServer>(
        &self,
        screen: &Screen<D>,
        pixmap: DrawableId,
        mask: Option<DrawableId>,
    ) -> Option<IconImage> {
        if screen.display.drawable_size(pixmap).is_none() {
            tracing::warn!("Icon pixmap {pixmap:?} is gone — dropping the hint");
            if let Some(owner) = self.owner() {
                owner.borrow_mut().hints.icon_pixmap = None;
            }
            return None;
        }
        let Some(captured) = screen.display.capture_drawable(pixmap, mask) else {
            tracing::warn!("Could not read icon pixmap {pixmap:?}");
            return None;
        };
        Some(IconImage::new(validate_icon_size(captured, screen.prefs.icon_size)))
    }

    fn user_or_default<D: DisplayServer>(&self, screen: &mut Screen<D>) -> IconImage {
        match self.user_image() {
            Some(image) => image.clone(),
            None => screen.default_image(),
        }
    }
}
