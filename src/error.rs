// error.rs — resource-unavailable failures of the icon subsystem
//
// None of these ever reach the caller of update()/paint(): they are logged and
// the resolver falls through to the next image source.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IconError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("image `{0}` not found in search path")]
    NotFound(String),

    #[error("display error: {0}")]
    Display(#[from] crate::display::DisplayError),

    #[error("owner has neither instance nor class name")]
    NoIdentity,

    #[error("owner supplies no icon image")]
    NoImage,
}

impl IconError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
