use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownColor;

// ============================================================================
// PALETTE
// ============================================================================

/// A cell value on the artboard: one of the eleven palette colors or the
/// mask marker.
///
/// Serialized as the lowercase hex string of the palette entry (`"#ff0000"`)
/// or `"mask"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Color {
    NearBlack,
    #[default]
    White,
    Red,
    Orange,
    Yellow,
    Lime,
    Green,
    Blue,
    Cyan,
    Pink,
    Purple,
    /// Placeholder for a generated background. Not drawable as a real color.
    Mask,
}

/// The eleven drawable colors, in swatch order. Index 0 is near-black and
/// index 1 is the default (white).
pub const PALETTE: [Color; 11] = [
    Color::NearBlack,
    Color::White,
    Color::Red,
    Color::Orange,
    Color::Yellow,
    Color::Lime,
    Color::Green,
    Color::Blue,
    Color::Cyan,
    Color::Pink,
    Color::Purple,
];

/// Sub-palette used by the gradient generators.
pub const RAINBOW_PALETTE: [Color; 6] = [
    Color::Red,
    Color::Orange,
    Color::Yellow,
    Color::Lime,
    Color::Blue,
    Color::Purple,
];

/// Display color for mask cells.
pub const MASK_DISPLAY_RGB: [u8; 3] = [0x88, 0x88, 0x88];
/// Near-black dots are drawn slightly lighter so they stay visible on a
/// black canvas background.
pub const NEAR_BLACK_DISPLAY_RGB: [u8; 3] = [0x33, 0x33, 0x33];

const MASK_NAME: &str = "mask";

impl Color {
    /// The background color. Never stored explicitly on the artboard.
    pub const DEFAULT: Color = Color::White;

    pub fn is_mask(self) -> bool {
        self == Color::Mask
    }

    pub fn is_default(self) -> bool {
        self == Color::DEFAULT
    }

    /// True for palette colors other than the default.
    pub fn is_ink(self) -> bool {
        !self.is_mask() && !self.is_default()
    }

    /// Logical RGB value. `None` for the mask marker.
    pub fn rgb(self) -> Option<[u8; 3]> {
        let rgb = match self {
            Color::NearBlack => [0x22, 0x22, 0x22],
            Color::White => [0xff, 0xff, 0xff],
            Color::Red => [0xff, 0x00, 0x00],
            Color::Orange => [0xff, 0x9a, 0x0d],
            Color::Yellow => [0xff, 0xff, 0x00],
            Color::Lime => [0x29, 0xff, 0x0f],
            Color::Green => [0x0f, 0x8d, 0x0f],
            Color::Blue => [0x0f, 0x49, 0xff],
            Color::Cyan => [0x0f, 0xff, 0xff],
            Color::Pink => [0xff, 0xb3, 0xd7],
            Color::Purple => [0x9a, 0x0f, 0x9a],
            Color::Mask => return None,
        };
        Some(rgb)
    }

    /// Color the renderer paints for this cell. Differs from [`Color::rgb`]
    /// for the mask marker and near-black.
    pub fn display_rgb(self) -> [u8; 3] {
        match self {
            Color::Mask => MASK_DISPLAY_RGB,
            Color::NearBlack => NEAR_BLACK_DISPLAY_RGB,
            other => other.rgb().unwrap_or(MASK_DISPLAY_RGB),
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Color::NearBlack => "#222222",
            Color::White => "#ffffff",
            Color::Red => "#ff0000",
            Color::Orange => "#ff9a0d",
            Color::Yellow => "#ffff00",
            Color::Lime => "#29ff0f",
            Color::Green => "#0f8d0f",
            Color::Blue => "#0f49ff",
            Color::Cyan => "#0fffff",
            Color::Pink => "#ffb3d7",
            Color::Purple => "#9a0f9a",
            Color::Mask => MASK_NAME,
        }
    }

    /// Parse `#rrggbb` / `rrggbb` (case-insensitive) or `mask`.
    /// Only exact palette entries are accepted.
    pub fn from_hex(s: &str) -> Option<Color> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(MASK_NAME) {
            return Some(Color::Mask);
        }
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        let rgb = [(value >> 16) as u8, (value >> 8) as u8, value as u8];
        PALETTE.iter().copied().find(|c| c.rgb() == Some(rgb))
    }

    /// Position in [`PALETTE`]. `None` for the mask marker.
    pub fn palette_index(self) -> Option<usize> {
        PALETTE.iter().position(|&c| c == self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

impl FromStr for Color {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s).ok_or_else(|| UnknownColor(s.to_string()))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.hex().to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = UnknownColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_order_is_fixed() {
        assert_eq!(PALETTE.len(), 11);
        assert_eq!(PALETTE[0], Color::NearBlack);
        assert_eq!(PALETTE[1], Color::DEFAULT);
        assert!(!PALETTE.contains(&Color::Mask));
    }

    #[test]
    fn hex_parsing_accepts_palette_entries_only() {
        assert_eq!(Color::from_hex("#FF0000"), Some(Color::Red));
        assert_eq!(Color::from_hex("0f49ff"), Some(Color::Blue));
        assert_eq!(Color::from_hex("MASK"), Some(Color::Mask));
        assert_eq!(Color::from_hex("#123456"), None);
        assert_eq!(Color::from_hex("#fff"), None);
        assert!("nope".parse::<Color>().is_err());
    }

    #[test]
    fn every_color_parses_back_from_its_hex() {
        for color in PALETTE.iter().copied().chain([Color::Mask]) {
            assert_eq!(Color::from_hex(color.hex()), Some(color));
        }
    }

    #[test]
    fn display_substitutes_mask_and_near_black() {
        assert_eq!(Color::Mask.display_rgb(), MASK_DISPLAY_RGB);
        assert_eq!(Color::NearBlack.display_rgb(), NEAR_BLACK_DISPLAY_RGB);
        assert_eq!(Color::Red.display_rgb(), [0xff, 0, 0]);
        assert_eq!(Color::NearBlack.rgb(), Some([0x22, 0x22, 0x22]));
        assert_eq!(Color::Mask.rgb(), None);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&vec![Color::Red, Color::Mask]).unwrap();
        assert_eq!(json, r##"["#ff0000","mask"]"##);
        let back: Vec<Color> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Color::Red, Color::Mask]);
        assert!(serde_json::from_str::<Color>(r##""#010203""##).is_err());
    }
}
