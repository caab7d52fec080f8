// ============================================================================
// COLOR QUANTIZER — raster pixels to the fixed palette via CIE LAB
// ============================================================================

use std::sync::LazyLock;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::DenseGrid;
use crate::components::colors::{Color, PALETTE};

/// Pixels with alpha below this are imported as the default color.
pub const ALPHA_THRESHOLD: u8 = 128;
pub const MIN_COLOR_LEVELS: u32 = 2;
pub const MAX_COLOR_LEVELS: u32 = 32;

/// Hue band (degrees) in which blue-ish input is steered away from purple
/// and near-black.
const BLUE_HUE_RANGE: std::ops::RangeInclusive<f64> = 180.0..=280.0;
const PURPLE_PENALTY: f64 = 1.5;
const NEAR_BLACK_PENALTY: f64 = 1.2;
/// HSL lightness (percent) above which the near-black penalty applies.
const NEAR_BLACK_MIN_LIGHTNESS: f64 = 20.0;

/// CIE L*a*b* color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    /// Euclidean distance (CIE76 ΔE).
    pub fn distance(self, other: Lab) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        (dl * dl + da * da + db * db).sqrt()
    }
}

// ============================================================================
// COLOR SPACE HELPERS
// ============================================================================

#[inline]
fn srgb_to_linear(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

/// sRGB (channels in 0..=255, fractional values allowed) → CIE LAB, D65.
pub fn rgb_to_lab(r: f64, g: f64, b: f64) -> Lab {
    let r = srgb_to_linear(r / 255.0) * 100.0;
    let g = srgb_to_linear(g / 255.0) * 100.0;
    let b = srgb_to_linear(b / 255.0) * 100.0;

    let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

    let fx = lab_f(x / 95.047);
    let fy = lab_f(y / 100.000);
    let fz = lab_f(z / 108.883);

    Lab {
        l: 116.0 * fy - 16.0,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

/// sRGB (0..=255) → HSL with hue in degrees and saturation/lightness in
/// percent.
pub fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let (r, g, b) = (r / 255.0, g / 255.0, b / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < 1e-9 {
        return (0.0, 0.0, l * 100.0);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h * 60.0, s * 100.0, l * 100.0)
}

// ============================================================================
// PALETTE MATCHING
// ============================================================================

static PALETTE_LAB: LazyLock<[(Color, Lab); 11]> = LazyLock::new(|| {
    PALETTE.map(|color| {
        let [r, g, b] = color.rgb().unwrap_or([255, 255, 255]);
        (color, rgb_to_lab(r as f64, g as f64, b as f64))
    })
});

/// Nearest palette color in LAB space with the blue-hue correction applied.
/// Ties keep the earlier palette entry.
pub fn find_closest_color(r: f64, g: f64, b: f64) -> Color {
    let input = rgb_to_lab(r, g, b);
    let (hue, _, lightness) = rgb_to_hsl(r, g, b);
    let blue_band = BLUE_HUE_RANGE.contains(&hue);

    let mut closest = PALETTE[0];
    let mut min_distance = f64::INFINITY;

    for &(color, lab) in PALETTE_LAB.iter() {
        let mut distance = input.distance(lab);
        if blue_band {
            if color == Color::Purple {
                distance *= PURPLE_PENALTY;
            }
            if color == Color::NearBlack && lightness > NEAR_BLACK_MIN_LIGHTNESS {
                distance *= NEAR_BLACK_PENALTY;
            }
        }
        if distance < min_distance {
            min_distance = distance;
            closest = color;
        }
    }
    closest
}

/// Snap a channel to one of `levels` evenly spaced values.
pub fn posterize_channel(value: u8, levels: u32) -> f64 {
    let levels = levels.clamp(MIN_COLOR_LEVELS, MAX_COLOR_LEVELS);
    let factor = 255.0 / (levels - 1) as f64;
    (value as f64 / factor).round() * factor
}

/// Map one RGBA pixel to a palette color.
pub fn quantize_pixel(pixel: [u8; 4], levels: u32) -> Color {
    let [r, g, b, a] = pixel;
    if a < ALPHA_THRESHOLD {
        return Color::DEFAULT;
    }
    find_closest_color(
        posterize_channel(r, levels),
        posterize_channel(g, levels),
        posterize_channel(b, levels),
    )
}

/// Quantize every pixel of a grid-sized image. Rows are processed in
/// parallel; the result is row-major like the source.
pub fn quantize_image(img: &RgbaImage, levels: u32) -> DenseGrid {
    let cells: Vec<Color> = img
        .as_raw()
        .par_chunks_exact(4)
        .map(|p| quantize_pixel([p[0], p[1], p[2], p[3]], levels))
        .collect();
    DenseGrid::from_cells(img.width(), img.height(), cells)
        .unwrap_or_else(|| DenseGrid::new_filled(img.width(), img.height(), Color::DEFAULT))
}

// ============================================================================
// IMPORT FITTING
// ============================================================================

/// How a raster is placed onto the grid before quantization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImportOptions {
    /// Zoom about the fitted image's center. 1.0 = fit.
    pub scale: f32,
    /// Shift in grid cells after scaling.
    pub pan: (f32, f32),
    /// Posterization levels per channel.
    pub color_levels: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            pan: (0.0, 0.0),
            color_levels: 8,
        }
    }
}

/// Resample `src` onto a transparent `grid_w × grid_h` image, letterboxed to
/// keep its aspect ratio, then scaled and panned per `options`.
pub fn fit_to_grid(src: &RgbaImage, grid_w: u32, grid_h: u32, options: &ImportOptions) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(grid_w, grid_h, Rgba([0, 0, 0, 0]));
    if src.width() == 0 || src.height() == 0 || grid_w == 0 || grid_h == 0 {
        return out;
    }

    let (gw, gh) = (grid_w as f64, grid_h as f64);
    let img_aspect = src.width() as f64 / src.height() as f64;
    let (dw, dh, dx, dy) = if img_aspect > gw / gh {
        let dh = gw / img_aspect;
        (gw, dh, 0.0, (gh - dh) / 2.0)
    } else {
        let dw = gh * img_aspect;
        (dw, gh, (gw - dw) / 2.0, 0.0)
    };

    let scale = (options.scale as f64).clamp(0.1, 10.0);
    let final_w = dw * scale;
    let final_h = dh * scale;
    let final_x = dx - (final_w - dw) / 2.0 + options.pan.0 as f64;
    let final_y = dy - (final_h - dh) / 2.0 + options.pan.1 as f64;

    let target_w = (final_w.round() as u32).max(1);
    let target_h = (final_h.round() as u32).max(1);
    let resized = imageops::resize(src, target_w, target_h, FilterType::Triangle);
    imageops::overlay(&mut out, &resized, final_x.round() as i64, final_y.round() as i64);
    out
}

/// Full import pipeline: fit, posterize, match.
pub fn rasterize(src: &RgbaImage, grid_w: u32, grid_h: u32, options: &ImportOptions) -> DenseGrid {
    let fitted = fit_to_grid(src, grid_w, grid_h, options);
    quantize_image(&fitted, options.color_levels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_is_reference_white() {
        let lab = rgb_to_lab(255.0, 255.0, 255.0);
        assert!((lab.l - 100.0).abs() < 0.5);
        assert!(lab.a.abs() < 0.5);
        assert!(lab.b.abs() < 0.5);
    }

    #[test]
    fn black_is_zero_lightness() {
        let lab = rgb_to_lab(0.0, 0.0, 0.0);
        assert!(lab.l.abs() < 1e-6);
    }

    #[test]
    fn palette_entries_match_themselves() {
        for color in PALETTE {
            let [r, g, b] = color.rgb().unwrap();
            assert_eq!(find_closest_color(r as f64, g as f64, b as f64), color);
        }
    }

    #[test]
    fn matching_is_deterministic() {
        let first = find_closest_color(120.0, 33.0, 200.0);
        for _ in 0..10 {
            assert_eq!(find_closest_color(120.0, 33.0, 200.0), first);
        }
    }

    #[test]
    fn hsl_hue_in_degrees() {
        let (h, s, l) = rgb_to_hsl(0.0, 0.0, 255.0);
        assert!((h - 240.0).abs() < 1e-9);
        assert!((s - 100.0).abs() < 1e-9);
        assert!((l - 50.0).abs() < 1e-9);
        let (h, _, _) = rgb_to_hsl(255.0, 0.0, 0.0);
        assert_eq!(h, 0.0);
        let (_, s, l) = rgb_to_hsl(128.0, 128.0, 128.0);
        assert_eq!(s, 0.0);
        assert!((l - 50.2).abs() < 0.1);
    }

    #[test]
    fn blue_band_penalizes_purple() {
        // Plain LAB distance puts this dark blue closest to purple
        let lab = rgb_to_lab(0.0, 0.0, 102.0);
        let purple = PALETTE_LAB[10].1;
        let blue = PALETTE_LAB[7].1;
        assert!(lab.distance(purple) < lab.distance(blue));
        assert_eq!(find_closest_color(0.0, 0.0, 102.0), Color::Blue);
    }

    #[test]
    fn near_black_penalty_needs_lightness_above_twenty() {
        // Lightness 16.7: only the purple penalty applies, near-black wins
        assert_eq!(find_closest_color(0.0, 0.0, 85.0), Color::NearBlack);
        // Lightness 20.4: near-black is the plain nearest but gets penalized
        let lab = rgb_to_lab(0.0, 24.0, 104.0);
        assert!(lab.distance(PALETTE_LAB[0].1) < lab.distance(PALETTE_LAB[7].1));
        assert_eq!(find_closest_color(0.0, 24.0, 104.0), Color::Blue);
    }

    #[test]
    fn outside_blue_band_uses_plain_distance() {
        // Hue 0 (dark red) never gets the band penalties
        assert_eq!(find_closest_color(230.0, 10.0, 10.0), Color::Red);
    }

    #[test]
    fn posterize_snaps_to_levels() {
        assert_eq!(posterize_channel(0, 2), 0.0);
        assert_eq!(posterize_channel(200, 2), 255.0);
        assert_eq!(posterize_channel(100, 2), 0.0);
        // levels = 3: steps of 127.5
        assert_eq!(posterize_channel(100, 3), 127.5);
        // out-of-range level counts are clamped
        assert_eq!(posterize_channel(255, 0), 255.0);
    }

    #[test]
    fn transparent_pixels_become_default() {
        assert_eq!(quantize_pixel([255, 0, 0, 127], 8), Color::DEFAULT);
        assert_eq!(quantize_pixel([255, 0, 0, 128], 8), Color::Red);
    }

    #[test]
    fn fit_letterboxes_wide_image() {
        let src = RgbaImage::from_pixel(40, 10, Rgba([255, 0, 0, 255]));
        let fitted = fit_to_grid(&src, 8, 8, &ImportOptions::default());
        // 4:1 image in a square grid: 8x2 band in the middle rows
        assert_eq!(fitted.get_pixel(0, 0)[3], 0);
        assert_eq!(fitted.get_pixel(4, 3)[3], 255);
        assert_eq!(fitted.get_pixel(4, 7)[3], 0);
    }

    #[test]
    fn rasterize_maps_to_palette() {
        let src = RgbaImage::from_pixel(6, 6, Rgba([10, 250, 250, 255]));
        let grid = rasterize(&src, 6, 6, &ImportOptions::default());
        assert!(grid.as_slice().iter().all(|&c| c == Color::Cyan));
    }
}
