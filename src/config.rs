// config.rs — icon subsystem configuration
//
// Config is loaded from ~/.config/trixie/icons.conf (or $TRIXIE_CONFIG_DIR).
// Uses Hyprland-style key = value / section { } syntax.
//
// Recognised sections and the keys they carry (all optional):
//
//   icons {  size, minipreview_size, move_threshold, double_click_delay,
//            auto_arrange, single_click, dont_blink, show_titles,
//            cmd_modifier, image_paths, cache_dir, database,
//            default_icon, exempt_instance }
//   theme {  icon_back, clip_back, drawer_back, title_back,
//            title_font, title_font_size, title_color, select_color }
//
// Textures are written `solid #RRGGBB`, `gradient #RRGGBB #RRGGBB` or
// `image <path>`. `source = <file>` includes another file.

use std::path::{Path, PathBuf};

use image::Rgba;

use crate::display::ModifierState;
use crate::util::{
    expand_tilde, hex_color, parse_bool, parse_hex_color, resolve_path, split_search_path,
    strip_comment,
};

pub const CONFIG_FILE: &str = "icons.conf";

// ── top-level ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub icons: IconPreferences,
    pub theme: ThemeConfig,
}

// ── icon preferences ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct IconPreferences {
    /// Edge length of every icon tile.
    pub icon_size: u32,
    pub minipreview_size: u32,
    /// Pointer travel (either axis) before a press turns into a drag.
    pub move_threshold: i32,
    /// Milliseconds between two presses that still count as a double click.
    pub double_click_delay: u32,
    pub auto_arrange: bool,
    pub single_click: bool,
    pub dont_blink: bool,
    pub show_titles: bool,
    /// Held during a press: lower instead of raise.
    pub cmd_modifier: Modifier,
    pub image_paths: Vec<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub default_icon: Option<PathBuf>,
    /// Owner instance that ignores tile-settings notifications (the
    /// compositor's own dock icon).
    pub exempt_instance: Option<String>,
}

impl Default for IconPreferences {
    fn default() -> Self {
        Self {
            icon_size: 64,
            minipreview_size: 128,
            move_threshold: 5,
            double_click_delay: 250,
            auto_arrange: false,
            single_click: false,
            dont_blink: false,
            show_titles: true,
            cmd_modifier: Modifier::default(),
            image_paths: vec![],
            cache_dir: None,
            database: None,
            default_icon: None,
            exempt_instance: Some("trixie".into()),
        }
    }
}

// ── modifier ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    #[default]
    Super,
    Alt,
    Ctrl,
}

impl Modifier {
    pub fn is_held(self, mods: &ModifierState) -> bool {
        match self {
            Modifier::Super => mods.logo,
            Modifier::Alt => mods.alt,
            Modifier::Ctrl => mods.ctrl,
        }
    }
}

// ── theme ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TextureSpec {
    Solid(Rgba<u8>),
    /// Vertical gradient, top colour first.
    Gradient(Rgba<u8>, Rgba<u8>),
    Image(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeConfig {
    pub icon_back: TextureSpec,
    pub clip_back: TextureSpec,
    pub drawer_back: TextureSpec,
    /// Strip behind the title on miniwindow tiles.
    pub title_back: Rgba<u8>,
    pub title_font: String,
    pub title_font_size: f32,
    pub title_color: Rgba<u8>,
    pub select_color: Rgba<u8>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            icon_back: TextureSpec::Gradient(Rgba([0x9A, 0x9A, 0x9A, 0xFF]), Rgba([0x5E, 0x5E, 0x5E, 0xFF])),
            clip_back: TextureSpec::Gradient(Rgba([0x7C, 0x8C, 0xA0, 0xFF]), Rgba([0x3C, 0x4C, 0x60, 0xFF])),
            drawer_back: TextureSpec::Solid(Rgba([0x6E, 0x6E, 0x6E, 0xFF])),
            title_back: Rgba([0x22, 0x22, 0x22, 0xFF]),
            title_font: "DejaVuSans".into(),
            title_font_size: 9.0,
            title_color: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            select_color: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
        }
    }
}

// ── loading ───────────────────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        let path = Self::config_dir().join(CONFIG_FILE);
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) => {
                tracing::info!("Could not read {}: {e} — using defaults", path.display());
                return Config::default();
            }
        };

        tracing::info!("Loading config: {}", path.display());
        let mut cfg = Config::default();
        let mut stack = vec![path.canonicalize().unwrap_or_else(|_| path.to_path_buf())];
        if let Err(e) = parse_into(&text, path, &mut stack, &mut cfg) {
            tracing::warn!("Config error in {}: {e}", path.display());
        }

        tracing::info!(
            "Config loaded — icon_size={} show_titles={} dont_blink={} auto_arrange={}",
            cfg.icons.icon_size,
            cfg.icons.show_titles,
            cfg.icons.dont_blink,
            cfg.icons.auto_arrange
        );
        cfg
    }

    pub fn config_dir() -> PathBuf {
        if let Ok(p) = std::env::var("TRIXIE_CONFIG_DIR") {
            return PathBuf::from(p);
        }
        let base = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                PathBuf::from(std::env::var("HOME").unwrap_or_default()).join(".config")
            });
        base.join("trixie")
    }

    /// Per-user cache root for persisted icons.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.icons.cache_dir {
            return dir.clone();
        }
        let base = std::env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                PathBuf::from(std::env::var("HOME").unwrap_or_default()).join(".cache")
            });
        base.join("trixie").join("icons")
    }

    /// Location of the per-application icon database.
    pub fn database_path(&self) -> PathBuf {
        self.icons
            .database
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("icons.json"))
    }
}

// ── parser ────────────────────────────────────────────────────────────────────

fn parse_into(
    text: &str,
    file: &Path,
    stack: &mut Vec<PathBuf>,
    cfg: &mut Config,
) -> Result<(), String> {
    let mut section_stack: Vec<String> = Vec::new();

    for (raw_no, raw_line) in text.lines().enumerate() {
        let lineno = raw_no + 1;
        let line = strip_comment(raw_line).trim();

        if line.is_empty() {
            continue;
        }

        if line.ends_with('{') {
            let name = line.trim_end_matches('{').trim().to_lowercase();
            section_stack.push(name);
            continue;
        }

        if line == "}" {
            section_stack
                .pop()
                .ok_or_else(|| format!("{}:{} — unexpected `}}`", file.display(), lineno))?;
            continue;
        }

        let (key, value) = split_kv(line).ok_or_else(|| {
            format!(
                "{}:{} — expected `key = value`, got `{line}`",
                file.display(),
                lineno
            )
        })?;

        let section = section_stack.last().map(String::as_str).unwrap_or("");

        if key == "source" && section.is_empty() {
            let path = resolve_path(value, file);
            if !path.exists() {
                tracing::warn!(
                    "{}:{} — source `{}` not found (skipping)",
                    file.display(),
                    lineno,
                    path.display()
                );
                continue;
            }
            let canon = path.canonicalize().unwrap_or_else(|_| path.clone());
            if stack.contains(&canon) {
                return Err(format!("circular source: {}", path.display()));
            }
            let text2 = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read source `{}`: {e}", path.display()))?;
            stack.push(canon);
            parse_into(&text2, &path, stack, cfg)?;
            stack.pop();
            continue;
        }

        match section {
            "icons" => apply_icons(key, value, file, lineno, &mut cfg.icons),
            "theme" => apply_theme(key, value, file, lineno, &mut cfg.theme),
            "" => tracing::warn!(
                "{}:{} — key `{key}` outside of a section",
                file.display(),
                lineno
            ),
            other => tracing::warn!("{}:{} — unknown section `{other}`", file.display(), lineno),
        }
    }

    if !section_stack.is_empty() {
        return Err(format!(
            "{} — unclosed section(s): {}",
            file.display(),
            section_stack.join(" > ")
        ));
    }
    Ok(())
}

// ── section appliers ──────────────────────────────────────────────────────────

fn apply_icons(key: &str, value: &str, file: &Path, lineno: usize, p: &mut IconPreferences) {
    let bad = |what: &str| {
        tracing::warn!("{}:{} — bad {what} `{value}`", file.display(), lineno);
    };
    match key {
        "size" => match value.parse::<u32>() {
            Ok(n) if n >= 16 => p.icon_size = n,
            _ => bad("size"),
        },
        "minipreview_size" => match value.parse::<u32>() {
            Ok(n) if n > 2 * crate::icon::MINIPREVIEW_BORDER => p.minipreview_size = n,
            _ => bad("minipreview_size"),
        },
        "move_threshold" => match value.parse::<i32>() {
            Ok(n) if n > 0 => p.move_threshold = n,
            _ => bad("move_threshold"),
        },
        "double_click_delay" => match value.parse::<u32>() {
            Ok(n) => p.double_click_delay = n,
            Err(_) => bad("double_click_delay"),
        },
        "auto_arrange" => match parse_bool(value) {
            Some(b) => p.auto_arrange = b,
            None => bad("bool"),
        },
        "single_click" => match parse_bool(value) {
            Some(b) => p.single_click = b,
            None => bad("bool"),
        },
        "dont_blink" => match parse_bool(value) {
            Some(b) => p.dont_blink = b,
            None => bad("bool"),
        },
        "show_titles" => match parse_bool(value) {
            Some(b) => p.show_titles = b,
            None => bad("bool"),
        },
        "cmd_modifier" => {
            p.cmd_modifier = match value.to_lowercase().as_str() {
                "alt" => Modifier::Alt,
                "ctrl" | "control" => Modifier::Ctrl,
                _ => Modifier::Super,
            };
        }
        "image_paths" => p.image_paths = split_search_path(value),
        "cache_dir" => p.cache_dir = Some(PathBuf::from(expand_tilde(value))),
        "database" => p.database = Some(resolve_path(value, file)),
        "default_icon" => p.default_icon = Some(resolve_path(value, file)),
        "exempt_instance" => {
            p.exempt_instance = (!value.is_empty() && value != "none").then(|| value.to_string())
        }
        _ => tracing::warn!("{}:{} — unknown icons.{key}", file.display(), lineno),
    }
}

fn apply_theme(key: &str, value: &str, file: &Path, lineno: usize, t: &mut ThemeConfig) {
    let texture = |slot: &mut TextureSpec| match parse_texture(value, file) {
        Some(tx) => *slot = tx,
        None => tracing::warn!("{}:{} — bad texture `{value}`", file.display(), lineno),
    };
    match key {
        "icon_back" => texture(&mut t.icon_back),
        "clip_back" => texture(&mut t.clip_back),
        "drawer_back" => texture(&mut t.drawer_back),
        "title_back" => t.title_back = hex_color(value),
        "title_font" => t.title_font = value.to_string(),
        "title_font_size" => match value.parse::<f32>() {
            Ok(s) if s > 0.0 => t.title_font_size = s,
            _ => tracing::warn!("{}:{} — bad font size `{value}`", file.display(), lineno),
        },
        "title_color" => t.title_color = hex_color(value),
        "select_color" => t.select_color = hex_color(value),
        _ => tracing::warn!("{}:{} — unknown theme.{key}", file.display(), lineno),
    }
}

// ── primitive parsers ─────────────────────────────────────────────────────────

fn split_kv(line: &str) -> Option<(&str, &str)> {
    line.find('=')
        .map(|i| (line[..i].trim(), line[i + 1..].trim()))
}

fn parse_texture(value: &str, file: &Path) -> Option<TextureSpec> {
    let mut words = value.split_whitespace();
    let kind = words.next()?.to_lowercase();
    match kind.as_str() {
        "solid" => Some(TextureSpec::Solid(parse_hex_color(words.next()?)?)),
        "gradient" | "vgradient" => {
            let top = parse_hex_color(words.next()?)?;
            let bottom = parse_hex_color(words.next()?)?;
            Some(TextureSpec::Gradient(top, bottom))
        }
        "image" => {
            let rest = value[kind.len()..].trim();
            (!rest.is_empty()).then(|| TextureSpec::Image(resolve_path(rest, file)))
        }
        // A bare colour is shorthand for `solid`.
        _ => parse_hex_color(&kind).map(TextureSpec::Solid),
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
