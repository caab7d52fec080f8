use dotboard::components::tools::Tool;
use dotboard::ops::quantize::{ImportOptions, rgb_to_lab};
use dotboard::{Color, Editor, EditorError, PALETTE};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn flood_fill_scenario() {
    let mut ed = Editor::new(3, 3).unwrap();
    ed.select_color(Color::Red);
    ed.begin_stroke(1, 1);
    ed.end_stroke();

    ed.select_tool(Tool::BucketArea);
    ed.select_color(Color::Blue);
    assert_eq!(ed.begin_stroke(0, 0), 8);
    assert_eq!(ed.artboard().get(1, 1), Color::Red);
    for (x, y) in [(0, 0), (2, 0), (0, 2), (2, 2), (1, 0)] {
        assert_eq!(ed.artboard().get(x, y), Color::Blue);
    }
}

#[test]
fn square_brush_scenario() {
    let mut ed = Editor::new(10, 10).unwrap();
    ed.select_tool(Tool::Square);
    ed.set_brush_size(2);
    ed.select_color(Color::Green);
    ed.begin_stroke(5, 5);
    let mut cells: Vec<_> = ed.artboard().iter().map(|(c, _)| c).collect();
    cells.sort();
    assert_eq!(cells, vec![(4, 4), (4, 5), (5, 4), (5, 5)]);
}

#[test]
fn white_lab_scenario() {
    let lab = rgb_to_lab(255.0, 255.0, 255.0);
    assert!((lab.l - 100.0).abs() < 0.5 && lab.a.abs() < 0.5 && lab.b.abs() < 0.5);
}

#[test]
fn mask_generate_commit_scenario() {
    let mut ed = Editor::new(8, 8).unwrap();
    ed.select_color(Color::Mask);
    ed.begin_stroke(4, 4);
    ed.end_stroke();

    let mut rng = StdRng::seed_from_u64(2024);
    ed.generate(&mut rng).unwrap();
    assert_eq!(ed.artboard().get(4, 4), Color::Mask);
    let generated = ed.cell_color(4, 4);
    assert!(PALETTE.contains(&generated));

    assert!(ed.commit_overlay() >= 1);
    assert_eq!(ed.artboard().get(4, 4), generated);
    assert_eq!(ed.history.undo_description(), Some("Commit Background"));
}

#[test]
fn undo_redo_inverse_over_mixed_actions() {
    let mut ed = Editor::new(12, 6).unwrap();
    ed.select_color(Color::Orange);
    ed.select_tool(Tool::Circle);
    ed.set_brush_size(4);
    ed.begin_stroke(3, 3);
    ed.end_stroke();

    ed.begin_pan((0.0, 0.0));
    ed.pan_pointer_moved((-20.0, 10.0));
    assert!(ed.end_pan(10.0));

    ed.select_tool(Tool::BucketGlobal);
    ed.select_color(Color::Purple);
    ed.begin_stroke(2, 0);
    ed.end_stroke();

    let final_board = ed.artboard().clone();
    let final_offset = ed.offset();

    let mut undone = 0;
    while ed.undo().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert!(!ed.has_art());
    assert_eq!(ed.offset(), (0, 0));

    while ed.redo().is_some() {}
    assert_eq!(ed.artboard(), &final_board);
    assert_eq!(ed.offset(), final_offset);
}

#[test]
fn history_is_capped_at_fifty() {
    let mut ed = Editor::new(60, 1).unwrap();
    ed.select_color(Color::Red);
    for x in 0..51 {
        ed.begin_stroke(x, 0);
        ed.end_stroke();
    }
    assert_eq!(ed.history.undo_count(), 50);
    while ed.undo().is_some() {}
    // The first stroke can no longer be undone
    assert_eq!(ed.artboard().len(), 1);
    assert_eq!(ed.artboard().get(0, 0), Color::Red);
}

#[test]
fn stroke_selection_requires_mask_and_real_color() {
    let mut ed = Editor::new(4, 4).unwrap();
    ed.select_color(Color::Yellow);
    assert_eq!(ed.stroke_selection(), Err(EditorError::NoMask));
}

#[test]
fn import_then_refine() {
    let mut img = image::RgbaImage::from_pixel(20, 20, image::Rgba([0, 0, 0, 0]));
    for y in 4..16 {
        for x in 4..16 {
            img.put_pixel(x, y, image::Rgba([250, 250, 10, 255]));
        }
    }
    let mut ed = Editor::new(20, 20).unwrap();
    ed.import_image(&img, &ImportOptions::default());
    assert_eq!(ed.artboard().get(10, 10), Color::Yellow);
    assert_eq!(ed.artboard().get(0, 0), Color::DEFAULT);

    assert!(ed.refine(2).is_ok());
    assert_eq!(ed.artboard().get(10, 10), Color::Yellow);
    assert_eq!(ed.artboard().get(0, 0), Color::DEFAULT);
}
