// database.rs — per-application icon database (icons.json)
//
// Expected file: ~/.config/trixie/icons.json
//
// Example shape:
// {
//   "default": "~/.local/share/icons/default.tiff",
//   "icons": {
//     "xterm.XTerm": "~/.local/share/icons/xterm.png",
//     "Firefox":     "/usr/share/icons/hicolor/64x64/apps/firefox.png",
//     "thunar":      "thunar.png"
//   }
// }
//
// Keys are identity keys ("<instance>.<class>", "<class>" or "<instance>")
// or, for dock entries, a command's base name. Relative paths are resolved
// later against the configured image search path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::expand_tilde;

/// `"<instance>.<class>"` when both are present, otherwise whichever exists.
pub fn identity_key(instance: Option<&str>, class: Option<&str>) -> Option<String> {
    let instance = instance.filter(|s| !s.is_empty());
    let class = class.filter(|s| !s.is_empty());
    match (instance, class) {
        (Some(i), Some(c)) => Some(format!("{i}.{c}")),
        (None, Some(c)) => Some(c.to_string()),
        (Some(i), None) => Some(i.to_string()),
        (None, None) => None,
    }
}

// ── raw deserialization ───────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawDatabase {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    icons: HashMap<String, String>,
}

// ── database ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct IconDatabase {
    default: Option<PathBuf>,
    entries: HashMap<String, PathBuf>,
}

impl IconDatabase {
    /// Load from `path`; a missing or malformed file gives an empty database.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::info!("No icon database at {}: {e}", path.display());
                return Self::default();
            }
        };
        match Self::parse(&text) {
            Ok(db) => {
                tracing::info!(
                    "Icon database {}: {} entries",
                    path.display(),
                    db.entries.len()
                );
                db
            }
            Err(e) => {
                tracing::warn!("Icon database {} unreadable: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawDatabase = serde_json::from_str(text)?;
        Ok(Self {
            default: raw.default.map(|p| PathBuf::from(expand_tilde(&p))),
            entries: raw
                .icons
                .into_iter()
                .map(|(k, v)| (k, PathBuf::from(expand_tilde(&v))))
                .collect(),
        })
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let raw = RawDatabase {
            default: self.default.as_ref().map(|p| p.display().to_string()),
            icons: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.display().to_string()))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&raw)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, json)
    }

    pub fn insert(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.insert(key.into(), path.into());
    }

    pub fn default_icon(&self) -> Option<PathBuf> {
        self.default.clone()
    }

    /// Icon file for an application, most specific key first:
    /// `instance.class`, `class`, `instance`, then the command's base name.
    pub fn lookup(
        &self,
        instance: Option<&str>,
        class: Option<&str>,
        command: Option<&str>,
    ) -> Option<&Path> {
        let mut keys: Vec<String> = Vec::with_capacity(4);
        keys.extend(identity_key(instance, class));
        keys.extend(class.filter(|s| !s.is_empty()).map(str::to_string));
        keys.extend(instance.filter(|s| !s.is_empty()).map(str::to_string));
        keys.extend(command.and_then(command_name));

        keys.iter()
            .find_map(|k| self.entries.get(k))
            .map(PathBuf::as_path)
    }
}

/// Base name of the program in a shell command line.
fn command_name(command: &str) -> Option<String> {
    let program = command.split_whitespace().next()?;
    Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keys() {
        assert_eq!(
            identity_key(Some("xterm"), Some("XTerm")).as_deref(),
            Some("xterm.XTerm")
        );
        assert_eq!(identity_key(None, Some("XTerm")).as_deref(), Some("XTerm"));
        assert_eq!(identity_key(Some("xterm"), None).as_deref(), Some("xterm"));
        assert_eq!(identity_key(None, None), None);
        assert_eq!(identity_key(Some(""), Some("")), None);
    }

    #[test]
    fn parse_and_lookup_order() {
        let db = IconDatabase::parse(
            r#"{
                "default": "/icons/default.png",
                "icons": {
                    "xterm.XTerm": "/icons/xterm.png",
                    "XTerm": "/icons/xterm-class.png",
                    "htop": "/icons/htop.png"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            db.lookup(Some("xterm"), Some("XTerm"), None),
            Some(Path::new("/icons/xterm.png"))
        );
        assert_eq!(
            db.lookup(Some("uxterm"), Some("XTerm"), None),
            Some(Path::new("/icons/xterm-class.png"))
        );
        assert_eq!(
            db.lookup(None, None, Some("/usr/bin/htop -d 10")),
            Some(Path::new("/icons/htop.png"))
        );
        assert_eq!(db.lookup(None, None, None), None);
        assert_eq!(db.default_icon(), Some(PathBuf::from("/icons/default.png")));
    }

    #[test]
    fn malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icons.json");
        std::fs::write(&path, "{ not json").unwrap();
        let db = IconDatabase::load(&path);
        assert_eq!(db.lookup(Some("a"), Some("b"), None), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("icons.json");
        let mut db = IconDatabase::default();
        db.insert("mpv.mpv", "/icons/mpv.png");
        db.save(&path).unwrap();

        let loaded = IconDatabase::load(&path);
        assert_eq!(
            loaded.lookup(Some("mpv"), Some("mpv"), None),
            Some(Path::new("/icons/mpv.png"))
        );
    }
}
