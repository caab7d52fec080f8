use std::path::{Path, PathBuf};

use crate::app::{MAX_GRID_DIM, validate_grid_size};
use crate::components::history::MAX_HISTORY_SIZE;
use crate::error::EditorError;
use crate::io::MAX_EXPORT_CELL_SIZE;
use crate::ops::quantize::{MAX_COLOR_LEVELS, MIN_COLOR_LEVELS};

const SETTINGS_FILE: &str = "dotboard_settings.cfg";

/// Persistent editor preferences, stored as `key=value` lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSettings {
    pub grid_width: u32,
    pub grid_height: u32,
    pub brush_size: u32,
    /// Posterization levels used by image import.
    pub color_levels: u32,
    pub max_undo_steps: usize,
    /// Pixel size of one cell in PNG/SVG export.
    pub export_cell_size: u32,
    /// 0 disables refinement after import.
    pub refine_strength: u8,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_width: 51,
            grid_height: 26,
            brush_size: 3,
            color_levels: 8,
            max_undo_steps: MAX_HISTORY_SIZE,
            export_cell_size: 25,
            refine_strength: 0,
        }
    }
}

impl EditorSettings {
    /// `<config dir>/dotboard_settings.cfg`, e.g.
    /// `~/.config/dotboard/dotboard_settings.cfg` on Linux.
    pub fn settings_path() -> Option<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "dotboard")?;
        let config_dir = dirs.config_dir().to_path_buf();
        let _ = std::fs::create_dir_all(&config_dir);
        Some(config_dir.join(SETTINGS_FILE))
    }

    /// Load from the default location (defaults if missing or unreadable).
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        Self::parse(&content)
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log_warn!("Failed to save settings to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_config_string())
    }

    /// Parse `key=value` lines. Unknown keys and unparsable values are
    /// skipped; numbers are clamped into range.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "grid_width" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.grid_width = v.clamp(1, MAX_GRID_DIM);
                    }
                }
                "grid_height" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.grid_height = v.clamp(1, MAX_GRID_DIM);
                    }
                }
                "brush_size" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.brush_size = v.clamp(1, 64);
                    }
                }
                "color_levels" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.color_levels = v.clamp(MIN_COLOR_LEVELS, MAX_COLOR_LEVELS);
                    }
                }
                "max_undo_steps" => {
                    if let Ok(v) = val.parse::<usize>() {
                        s.max_undo_steps = v.clamp(1, 500);
                    }
                }
                "export_cell_size" => {
                    if let Ok(v) = val.parse::<u32>() {
                        s.export_cell_size = v.clamp(1, MAX_EXPORT_CELL_SIZE);
                    }
                }
                "refine_strength" => {
                    if let Ok(v) = val.parse::<u8>() {
                        s.refine_strength = v.min(4);
                    }
                }
                _ => {}
            }
        }
        s
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "grid_width={}\n\
             grid_height={}\n\
             brush_size={}\n\
             color_levels={}\n\
             max_undo_steps={}\n\
             export_cell_size={}\n\
             refine_strength={}\n",
            self.grid_width,
            self.grid_height,
            self.brush_size,
            self.color_levels,
            self.max_undo_steps,
            self.export_cell_size,
            self.refine_strength,
        )
    }
}

/// Parse a `WxH` grid size such as `51x26`.
pub fn parse_grid_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    validate_grid_size(w, h).map_err(|e: EditorError| e.to_string())?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let s = EditorSettings::parse("grid_width=64\nnonsense\ncolor_levels=abc\n");
        assert_eq!(s.grid_width, 64);
        assert_eq!(s.grid_height, 26);
        assert_eq!(s.color_levels, 8);
    }

    #[test]
    fn values_are_clamped() {
        let s = EditorSettings::parse("color_levels=99\nbrush_size=0\nrefine_strength=7\ngrid_width=0");
        assert_eq!(s.color_levels, MAX_COLOR_LEVELS);
        assert_eq!(s.brush_size, 1);
        assert_eq!(s.refine_strength, 4);
        assert_eq!(s.grid_width, 1);
    }

    #[test]
    fn config_string_parses_back() {
        let s = EditorSettings {
            grid_width: 80,
            grid_height: 40,
            brush_size: 5,
            color_levels: 12,
            max_undo_steps: 20,
            export_cell_size: 10,
            refine_strength: 3,
        };
        assert_eq!(EditorSettings::parse(&s.to_config_string()), s);
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("dotboard_settings_{}.cfg", uuid::Uuid::new_v4()));
        let s = EditorSettings {
            brush_size: 9,
            ..Default::default()
        };
        s.save_to(&path).unwrap();
        assert_eq!(EditorSettings::load_from(&path), s);
        let _ = std::fs::remove_file(&path);
        assert_eq!(EditorSettings::load_from(&path), EditorSettings::default());
    }

    #[test]
    fn grid_size_strings() {
        assert_eq!(parse_grid_size("51x26"), Ok((51, 26)));
        assert_eq!(parse_grid_size(" 8X4 "), Ok((8, 4)));
        assert!(parse_grid_size("51").is_err());
        assert!(parse_grid_size("0x5").is_err());
        assert!(parse_grid_size("ax5").is_err());
    }
}
