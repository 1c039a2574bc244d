// util.rs — parsing / path helpers shared by config.rs, database.rs and icon.rs

use std::path::{Path, PathBuf};

use image::Rgba;

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn expand_tilde(s: &str) -> String {
    if let Some(rest) = s.strip_prefix('~') {
        let home = std::env::var("HOME").unwrap_or_default();
        format!("{home}{rest}")
    } else {
        s.to_owned()
    }
}

pub fn resolve_path(value: &str, relative_to: &Path) -> PathBuf {
    let expanded = expand_tilde(value);
    let p = PathBuf::from(&expanded);
    if p.is_absolute() {
        p
    } else {
        relative_to.parent().unwrap_or(Path::new(".")).join(p)
    }
}

/// Find `file` in the image search path.
///
/// Absolute (or `~`-prefixed) names are returned as-is when they exist; bare
/// names are tried against every directory of `search` in order.
pub fn absolute_path_for_file(search: &[PathBuf], file: &str) -> Option<PathBuf> {
    let expanded = PathBuf::from(expand_tilde(file));
    if expanded.is_absolute() {
        return expanded.is_file().then_some(expanded);
    }
    search
        .iter()
        .map(|dir| dir.join(&expanded))
        .find(|candidate| candidate.is_file())
}

/// Split a `:`-separated search path, expanding `~` in every entry.
pub fn split_search_path(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| PathBuf::from(expand_tilde(s)))
        .collect()
}

// ── Comment stripper ──────────────────────────────────────────────────────────
//
// A `#` starts a comment only at column 0 or after whitespace. On the value
// side of `key = value` tokens may themselves start with `#` (hex colour
// literals), so a `#` directly followed by hex digits is kept.

pub fn strip_comment(line: &str) -> &str {
    if let Some(eq_pos) = line.find('=') {
        let key_part = &line[..eq_pos];
        let key_end = key_part
            .as_bytes()
            .iter()
            .enumerate()
            .find(|&(i, &b)| {
                b == b'#' && (i == 0 || key_part.as_bytes()[i - 1].is_ascii_whitespace())
            })
            .map(|(i, _)| i)
            .unwrap_or(eq_pos);

        if key_end < eq_pos {
            return &line[..key_end];
        }

        let val = &line[eq_pos + 1..];
        let mut prev_ws = true;
        for (i, b) in val.bytes().enumerate() {
            match b {
                b'#' if prev_ws => {
                    // `gradient #111111 #222222` carries several colour tokens:
                    // a `#` followed by hex digits is a colour, anything else a comment.
                    let rest = &val[i + 1..];
                    let token_len = rest
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(rest.len());
                    let is_colour = token_len > 0
                        && rest[..token_len].bytes().all(|c| c.is_ascii_hexdigit());
                    if !is_colour {
                        return &line[..eq_pos + 1 + i];
                    }
                    prev_ws = false;
                }
                b'#' => return &line[..eq_pos + 1 + i],
                b if b.is_ascii_whitespace() => prev_ws = true,
                _ => prev_ws = false,
            }
        }
        line
    } else {
        let bytes = line.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
                return &line[..i];
            }
        }
        line
    }
}

// ── Hex colour helpers ────────────────────────────────────────────────────────

/// Parse `#RRGGBB` or `#RRGGBBAA`.
pub fn parse_hex_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim().trim_start_matches('#');
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let p = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    match s.len() {
        6 => Some(Rgba([p(0)?, p(2)?, p(4)?, 0xFF])),
        8 => Some(Rgba([p(0)?, p(2)?, p(4)?, p(6)?])),
        _ => None,
    }
}

/// Parse a colour, falling back to magenta with a warning.
pub fn hex_color(s: &str) -> Rgba<u8> {
    parse_hex_color(s).unwrap_or_else(|| {
        tracing::warn!("Bad hex colour '{s}' — using magenta");
        Rgba([0xFF, 0x00, 0xFF, 0xFF])
    })
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

// ── Font search ───────────────────────────────────────────────────────────────

pub fn find_font(needle: &str) -> Option<PathBuf> {
    let direct = PathBuf::from(expand_tilde(needle));
    if direct.is_absolute() && direct.is_file() {
        return Some(direct);
    }
    let home = std::env::var("HOME").unwrap_or_default();
    let roots: &[String] = &[
        "/usr/share/fonts".into(),
        "/usr/local/share/fonts".into(),
        format!("{home}/.local/share/fonts"),
        format!("{home}/.fonts"),
    ];
    let needle_lower = needle.to_lowercase();
    roots
        .iter()
        .find_map(|root| walk_fonts(Path::new(root), &needle_lower))
}

fn walk_fonts(dir: &Path, needle: &str) -> Option<PathBuf> {
    let rd = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in rd.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            let lower = name.to_lowercase();
            if lower.contains(needle) && (lower.ends_with(".ttf") || lower.ends_with(".otf")) {
                tracing::info!("Font search: found '{needle}' at {}", path.display());
                return Some(path);
            }
        }
    }
    subdirs.iter().find_map(|sub| walk_fonts(sub, needle))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
