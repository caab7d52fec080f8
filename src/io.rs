use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::app::{Editor, validate_grid_size};
use crate::canvas::Artboard;
use crate::components::colors::Color;
use crate::error::ProjectError;
use crate::ops::quantize::ImportOptions;

// ============================================================================
// DBP / JSON PROJECT FILE FORMAT
// ============================================================================

/// Magic header of binary `.dbp` projects.
const DBP_MAGIC: &str = "DBP1";

/// One stored cell. The color is the palette hex string or `"mask"`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellEntry {
    pub x: i64,
    pub y: i64,
    pub color: Color,
}

/// Serializable project: grid size, viewport offset and every non-default
/// cell. Shared by the binary and JSON encodings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub grid_width: u32,
    pub grid_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
    pub cells: Vec<CellEntry>,
}

/// Binary envelope. bincode writes the magic string first: an 8-byte length
/// prefix followed by the 4 magic bytes.
#[derive(Serialize, Deserialize)]
struct DbpFile {
    magic: String,
    project: ProjectFile,
}

impl ProjectFile {
    /// Cells are sorted row-major so files are stable across saves.
    pub fn from_editor(editor: &Editor) -> Self {
        let mut cells: Vec<CellEntry> = editor
            .artboard()
            .iter()
            .map(|((x, y), color)| CellEntry { x, y, color })
            .collect();
        cells.sort_by_key(|c| (c.y, c.x));
        let (offset_x, offset_y) = editor.offset();
        Self {
            grid_width: editor.width(),
            grid_height: editor.height(),
            offset_x,
            offset_y,
            cells,
        }
    }

    /// Validate and build a fresh editor. Nothing is returned unless the
    /// whole file is acceptable.
    pub fn into_editor(self) -> Result<Editor, ProjectError> {
        validate_grid_size(self.grid_width, self.grid_height)
            .map_err(|e| ProjectError::InvalidFormat(e.to_string()))?;
        let mut artboard = Artboard::new();
        for cell in self.cells {
            artboard.set(cell.x, cell.y, cell.color);
        }
        Editor::from_parts(
            self.grid_width,
            self.grid_height,
            (self.offset_x, self.offset_y),
            artboard,
        )
        .map_err(|e| ProjectError::InvalidFormat(e.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectFormat {
    Dbp,
    Json,
}

impl ProjectFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "dbp" => Some(ProjectFormat::Dbp),
            "json" => Some(ProjectFormat::Json),
            _ => None,
        }
    }
}

pub fn encode_dbp(editor: &Editor) -> Result<Vec<u8>, ProjectError> {
    let file = DbpFile {
        magic: DBP_MAGIC.to_string(),
        project: ProjectFile::from_editor(editor),
    };
    Ok(bincode::serialize(&file)?)
}

pub fn decode_dbp(raw: &[u8]) -> Result<Editor, ProjectError> {
    if raw.len() < 12 {
        return Err(ProjectError::InvalidFormat("File too small".into()));
    }
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != DBP_MAGIC {
        return Err(ProjectError::InvalidFormat(format!("Unknown magic '{}'", magic)));
    }
    let file: DbpFile = bincode::deserialize(raw)?;
    file.project.into_editor()
}

pub fn save_dbp(editor: &Editor, path: &Path) -> Result<(), ProjectError> {
    let bytes = encode_dbp(editor)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

pub fn load_dbp(path: &Path) -> Result<Editor, ProjectError> {
    let raw = std::fs::read(path)?;
    decode_dbp(&raw)
}

pub fn save_json(editor: &Editor, path: &Path) -> Result<(), ProjectError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &ProjectFile::from_editor(editor))?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Editor, ProjectError> {
    let reader = BufReader::new(File::open(path)?);
    let project: ProjectFile = serde_json::from_reader(reader)?;
    project.into_editor()
}

/// Save by extension (`.dbp` or `.json`).
pub fn save_project(editor: &Editor, path: &Path) -> Result<(), ProjectError> {
    match ProjectFormat::from_path(path) {
        Some(ProjectFormat::Dbp) => save_dbp(editor, path),
        Some(ProjectFormat::Json) => save_json(editor, path),
        None => Err(unsupported(path)),
    }?;
    log_info!("Saved project {}", path.display());
    Ok(())
}

/// Load by extension (`.dbp` or `.json`).
pub fn load_project(path: &Path) -> Result<Editor, ProjectError> {
    let editor = match ProjectFormat::from_path(path) {
        Some(ProjectFormat::Dbp) => load_dbp(path),
        Some(ProjectFormat::Json) => load_json(path),
        None => Err(unsupported(path)),
    }?;
    log_info!(
        "Loaded project {} ({}x{}, {} cells)",
        path.display(),
        editor.width(),
        editor.height(),
        editor.artboard().len()
    );
    Ok(editor)
}

fn unsupported(path: &Path) -> ProjectError {
    ProjectError::InvalidFormat(format!("Unsupported file type: {}", path.display()))
}

// ============================================================================
// RASTER IMPORT
// ============================================================================

pub fn is_project_path(path: &Path) -> bool {
    ProjectFormat::from_path(path).is_some()
}

/// Decode any raster the `image` crate was built with.
pub fn load_raster(path: &Path) -> Result<RgbaImage, ProjectError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Decode a raster and import it into `editor`.
pub fn import_image_file(
    editor: &mut Editor,
    path: &Path,
    options: &ImportOptions,
) -> Result<(), ProjectError> {
    let img = load_raster(path)?;
    log_info!(
        "Importing {} ({}x{}) into {}x{} grid",
        path.display(),
        img.width(),
        img.height(),
        editor.width(),
        editor.height()
    );
    editor.import_image(&img, options);
    Ok(())
}

// ============================================================================
// EXPORT — dots on black
// ============================================================================

pub const DEFAULT_EXPORT_CELL_SIZE: u32 = 25;
pub const MAX_EXPORT_CELL_SIZE: u32 = 200;
/// Dot radius as a fraction of the cell size.
const DOT_RADIUS_RATIO: f32 = 0.3;
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Output size in pixels for `cell_size`, which must be 1..=200.
fn export_size(editor: &Editor, cell_size: u32) -> Result<(u32, u32), ProjectError> {
    if !(1..=MAX_EXPORT_CELL_SIZE).contains(&cell_size) {
        return Err(ProjectError::InvalidFormat(format!(
            "Cell size {} out of range 1..={}",
            cell_size, MAX_EXPORT_CELL_SIZE
        )));
    }
    editor
        .width()
        .checked_mul(cell_size)
        .zip(editor.height().checked_mul(cell_size))
        .ok_or_else(|| ProjectError::InvalidFormat("Export image too large".into()))
}

/// Render the viewport as one dot per cell on a black background. Mask
/// cells are left fully transparent. Colors are the logical palette values.
pub fn render_png(editor: &Editor, cell_size: u32) -> Result<RgbaImage, ProjectError> {
    let (img_w, img_h) = export_size(editor, cell_size)?;
    let cell = cell_size;
    let (w, h) = (editor.width(), editor.height());
    let mut img = RgbaImage::from_pixel(img_w, img_h, BACKGROUND);
    let radius = cell as f32 * DOT_RADIUS_RATIO;
    let r_sq = radius * radius;
    let half = cell as f32 / 2.0;

    for ly in 0..h {
        for lx in 0..w {
            let color = editor.cell_color(lx, ly);
            let (ox, oy) = (lx * cell, ly * cell);
            let Some([r, g, b]) = color.rgb() else {
                for py in oy..oy + cell {
                    for px in ox..ox + cell {
                        img.put_pixel(px, py, Rgba([0, 0, 0, 0]));
                    }
                }
                continue;
            };
            for py in 0..cell {
                for px in 0..cell {
                    let dx = px as f32 + 0.5 - half;
                    let dy = py as f32 + 0.5 - half;
                    if dx * dx + dy * dy <= r_sq {
                        img.put_pixel(ox + px, oy + py, Rgba([r, g, b, 255]));
                    }
                }
            }
        }
    }
    Ok(img)
}

/// Same geometry as [`render_png`] as `<circle>` elements. Mask cells get no
/// dot.
pub fn render_svg(editor: &Editor, cell_size: u32) -> Result<String, ProjectError> {
    let (w, h) = export_size(editor, cell_size)?;
    let cell = cell_size;
    let radius = cell as f32 * DOT_RADIUS_RATIO;
    let half = cell as f32 / 2.0;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = writeln!(svg, r##"<rect width="{w}" height="{h}" fill="#000000"/>"##);
    for ly in 0..editor.height() {
        for lx in 0..editor.width() {
            let color = editor.cell_color(lx, ly);
            if color.is_mask() {
                continue;
            }
            let cx = (lx * cell) as f32 + half;
            let cy = (ly * cell) as f32 + half;
            let _ = writeln!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{radius}" fill="{}"/>"#,
                color.hex()
            );
        }
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Commit any pending preview, then write the dot image as PNG.
pub fn export_png(editor: &mut Editor, path: &Path, cell_size: u32) -> Result<(), ProjectError> {
    editor.commit_overlay();
    render_png(editor, cell_size)?.save_with_format(path, image::ImageFormat::Png)?;
    log_info!("Exported PNG {}", path.display());
    Ok(())
}

/// Commit any pending preview, then write the dot image as SVG.
pub fn export_svg(editor: &mut Editor, path: &Path, cell_size: u32) -> Result<(), ProjectError> {
    editor.commit_overlay();
    std::fs::write(path, render_svg(editor, cell_size)?)?;
    log_info!("Exported SVG {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Editor {
        let mut artboard = Artboard::new();
        artboard.set(0, 0, Color::Red);
        artboard.set(-3, 9, Color::Mask);
        artboard.set(1, 1, Color::NearBlack);
        Editor::from_parts(4, 3, (-1, 2), artboard).unwrap()
    }

    #[test]
    fn dbp_bytes_round_trip() {
        let editor = sample();
        let bytes = encode_dbp(&editor).unwrap();
        assert_eq!(&bytes[8..12], b"DBP1");
        let loaded = decode_dbp(&bytes).unwrap();
        assert_eq!(loaded.artboard(), editor.artboard());
        assert_eq!(loaded.offset(), (-1, 2));
        assert_eq!((loaded.width(), loaded.height()), (4, 3));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = encode_dbp(&sample()).unwrap();
        bytes[8] = b'X';
        assert!(matches!(decode_dbp(&bytes), Err(ProjectError::InvalidFormat(_))));
        assert!(decode_dbp(&[0u8; 4]).is_err());
    }

    #[test]
    fn truncated_dbp_is_rejected() {
        let bytes = encode_dbp(&sample()).unwrap();
        assert!(decode_dbp(&bytes[..bytes.len() - 3]).is_err());
    }

    #[test]
    fn json_uses_hex_and_mask_strings() {
        let text = serde_json::to_string(&ProjectFile::from_editor(&sample())).unwrap();
        assert!(text.contains(r##""color":"#ff0000""##));
        assert!(text.contains(r#""color":"mask""#));
        assert!(text.contains(r#""offset_x":-1"#));
    }

    #[test]
    fn invalid_json_projects_are_rejected() {
        let unknown_color = r##"{"grid_width":2,"grid_height":2,"offset_x":0,"offset_y":0,
            "cells":[{"x":0,"y":0,"color":"#123456"}]}"##;
        assert!(serde_json::from_str::<ProjectFile>(unknown_color).is_err());

        let missing = r#"{"grid_width":2,"offset_x":0,"offset_y":0,"cells":[]}"#;
        assert!(serde_json::from_str::<ProjectFile>(missing).is_err());

        let zero: ProjectFile = serde_json::from_str(
            r#"{"grid_width":0,"grid_height":2,"offset_x":0,"offset_y":0,"cells":[]}"#,
        )
        .unwrap();
        assert!(matches!(zero.into_editor(), Err(ProjectError::InvalidFormat(_))));
    }

    #[test]
    fn png_has_dots_on_black_and_clear_mask() {
        let mut artboard = Artboard::new();
        artboard.set(0, 0, Color::NearBlack);
        artboard.set(1, 0, Color::Mask);
        let editor = Editor::from_parts(2, 1, (0, 0), artboard).unwrap();
        let img = render_png(&editor, 10).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        // Logical near-black in the dot center, opaque black at the corner
        assert_eq!(img.get_pixel(5, 5).0, [0x22, 0x22, 0x22, 255]);
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(15, 5).0[3], 0);
    }

    #[test]
    fn svg_has_one_circle_per_visible_color_cell() {
        let svg = render_svg(&sample(), 25).unwrap();
        // 4x3 viewport at (-1, 2): (0,0) and (1,1) are above it, so every
        // visible cell is default white
        assert_eq!(svg.matches("<circle").count(), 12);
        assert!(svg.contains(r#"r="7.5""#));
        assert!(svg.starts_with("<svg"));
    }

    #[test]
    fn oversized_cell_size_is_an_error() {
        let editor = Editor::new(1024, 1).unwrap();
        assert!(matches!(
            render_svg(&editor, 5_000_000),
            Err(ProjectError::InvalidFormat(_))
        ));
        assert!(matches!(render_png(&editor, 0), Err(ProjectError::InvalidFormat(_))));
        assert!(render_svg(&editor, MAX_EXPORT_CELL_SIZE).is_ok());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let path = Path::new("board.txt");
        assert!(matches!(load_project(path), Err(ProjectError::InvalidFormat(_))));
    }
}
