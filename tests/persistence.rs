use std::path::PathBuf;

use dotboard::io::{self, ProjectFile};
use dotboard::{Artboard, Color, Editor, ProjectError};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("dotboard_test_{}_{}", uuid::Uuid::new_v4(), name))
}

fn sample_editor() -> Editor {
    let mut artboard = Artboard::new();
    artboard.set(0, 0, Color::Red);
    artboard.set(-100, 42, Color::Cyan);
    artboard.set(7, 7, Color::Mask);
    artboard.set(3, -9_000_000_000, Color::NearBlack);
    Editor::from_parts(51, 26, (-5, 3), artboard).unwrap()
}

#[test]
fn dbp_file_round_trip() {
    let path = temp_path("board.dbp");
    let editor = sample_editor();
    io::save_project(&editor, &path).unwrap();
    let loaded = io::load_project(&path).unwrap();
    assert_eq!(loaded.artboard(), editor.artboard());
    assert_eq!(loaded.offset(), editor.offset());
    assert_eq!((loaded.width(), loaded.height()), (51, 26));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn json_file_round_trip() {
    let path = temp_path("board.json");
    let editor = sample_editor();
    io::save_project(&editor, &path).unwrap();
    let loaded = io::load_project(&path).unwrap();
    assert_eq!(
        ProjectFile::from_editor(&loaded),
        ProjectFile::from_editor(&editor)
    );
    let _ = std::fs::remove_file(&path);
}

#[test]
fn corrupt_json_applies_nothing() {
    let path = temp_path("bad.json");
    std::fs::write(
        &path,
        r#"{"grid_width":4,"grid_height":4,"offset_x":0,"offset_y":0,"cells":[{"x":0,"y":0,"color":"red"}]}"#,
    )
    .unwrap();
    assert!(matches!(io::load_project(&path), Err(ProjectError::Json(_))));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn oversized_grid_is_rejected() {
    let path = temp_path("huge.json");
    std::fs::write(
        &path,
        r#"{"grid_width":100000,"grid_height":4,"offset_x":0,"offset_y":0,"cells":[]}"#,
    )
    .unwrap();
    assert!(matches!(io::load_project(&path), Err(ProjectError::InvalidFormat(_))));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_file_is_io_error() {
    let path = temp_path("missing.dbp");
    assert!(matches!(io::load_project(&path), Err(ProjectError::Io(_))));
}

#[test]
fn png_export_writes_decodable_image() {
    let path = temp_path("board.png");
    let mut editor = Editor::new(4, 2).unwrap();
    editor.select_color(Color::Pink);
    editor.begin_stroke(1, 1);
    io::export_png(&mut editor, &path, 25).unwrap();

    let img = image::open(&path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (100, 50));
    // Center of cell (1, 1)
    assert_eq!(img.get_pixel(37, 37).0, [0xff, 0xb3, 0xd7, 255]);
    // Gap between dots stays black
    assert_eq!(img.get_pixel(25, 25).0, [0, 0, 0, 255]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn raster_import_from_file() {
    let path = temp_path("source.png");
    image::RgbaImage::from_pixel(10, 5, image::Rgba([15, 140, 15, 255]))
        .save(&path)
        .unwrap();
    let mut editor = Editor::new(10, 5).unwrap();
    io::import_image_file(&mut editor, &path, &Default::default()).unwrap();
    assert_eq!(editor.artboard().len(), 50);
    assert_eq!(editor.artboard().get(9, 4), Color::Green);
    let _ = std::fs::remove_file(&path);
}
