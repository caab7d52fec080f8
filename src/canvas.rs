use std::collections::HashMap;
use std::sync::Arc;

use crate::components::colors::Color;

/// Absolute artboard coordinate. Unbounded in both directions.
pub type Coord = (i64, i64);

// ============================================================================
// ARTBOARD – sparse, unbounded cell storage
// ============================================================================

/// Sparse mapping from coordinate to color.
///
/// The default color is never stored: writing it removes the key, so
/// [`Artboard::len`] counts exactly the cells that carry art.
///
/// The map is wrapped in an `Arc` for copy-on-write semantics: cloning for a
/// history snapshot only bumps a reference count, and the first write after
/// a snapshot pays for the copy via `Arc::make_mut`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Artboard {
    cells: Arc<HashMap<Coord, Color>>,
}

impl Artboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored color, or the default color for absent cells.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Color {
        self.cells.get(&(x, y)).copied().unwrap_or(Color::DEFAULT)
    }

    /// Write a cell. The default color deletes the entry instead of storing it.
    pub fn set(&mut self, x: i64, y: i64, color: Color) {
        let key = (x, y);
        if color.is_default() {
            if self.cells.contains_key(&key) {
                Arc::make_mut(&mut self.cells).remove(&key);
            }
        } else if self.cells.get(&key) != Some(&color) {
            Arc::make_mut(&mut self.cells).insert(key, color);
        }
    }

    /// Number of non-default cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when `(x, y)` has an explicit entry in the backing map.
    pub fn is_stored(&self, x: i64, y: i64) -> bool {
        self.cells.contains_key(&(x, y))
    }

    pub fn clear(&mut self) {
        self.cells = Arc::default();
    }

    /// All non-default cells, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Color)> + '_ {
        self.cells.iter().map(|(&k, &v)| (k, v))
    }
}

// ============================================================================
// CELL RECTANGLE
// ============================================================================

/// Half-open rectangle of cells: `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl CellRect {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Row-major iterator over every cell.
    pub fn cells(self) -> impl Iterator<Item = Coord> {
        let CellRect { x, y, width, height } = self;
        (y..y + height).flat_map(move |cy| (x..x + width).map(move |cx| (cx, cy)))
    }
}

// ============================================================================
// VIEWPORT – the visible, editable window onto the artboard
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    /// Absolute coordinate of the top-left visible cell.
    pub offset: Coord,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            offset: (0, 0),
        }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn rect(&self) -> CellRect {
        CellRect {
            x: self.offset.0,
            y: self.offset.1,
            width: self.width as i64,
            height: self.height as i64,
        }
    }

    /// True when the absolute coordinate lies inside the viewport.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        self.rect().contains(x, y)
    }

    pub fn to_absolute(&self, local_x: u32, local_y: u32) -> Coord {
        (self.offset.0 + local_x as i64, self.offset.1 + local_y as i64)
    }

    /// Viewport-local position of an absolute coordinate, if visible.
    pub fn to_local(&self, x: i64, y: i64) -> Option<(u32, u32)> {
        if !self.contains(x, y) {
            return None;
        }
        Some(((x - self.offset.0) as u32, (y - self.offset.1) as u32))
    }

    /// Pixels per cell when the grid is fitted into a `pixel_w × pixel_h` area.
    pub fn spacing(&self, pixel_w: f32, pixel_h: f32) -> f32 {
        (pixel_w / self.width as f32).min(pixel_h / self.height as f32)
    }

    /// Map a pointer position (relative to the top-left of the rendered grid)
    /// to an absolute artboard coordinate. `None` outside the grid.
    pub fn screen_to_grid(&self, px: f32, py: f32, pixel_w: f32, pixel_h: f32) -> Option<Coord> {
        let spacing = self.spacing(pixel_w, pixel_h);
        if !(spacing > 0.0) || px < 0.0 || py < 0.0 {
            return None;
        }
        let lx = (px / spacing).floor();
        let ly = (py / spacing).floor();
        if lx >= self.width as f32 || ly >= self.height as f32 {
            return None;
        }
        Some(self.to_absolute(lx as u32, ly as u32))
    }

    /// Absolute coordinates of every visible cell, row-major.
    pub fn cells(&self) -> impl Iterator<Item = Coord> + use<> {
        self.rect().cells()
    }
}

// ============================================================================
// DENSE GRID – viewport-sized scratch layer
// ============================================================================

/// Row-major viewport-sized color buffer, indexed by local coordinates.
/// Used for the generated background layer and for raster import.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseGrid {
    width: u32,
    height: u32,
    cells: Vec<Color>,
}

impl DenseGrid {
    pub fn new_filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            cells: vec![color; width as usize * height as usize],
        }
    }

    pub fn from_cells(width: u32, height: u32, cells: Vec<Color>) -> Option<Self> {
        (cells.len() == width as usize * height as usize).then_some(Self { width, height, cells })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Out-of-range reads return the default color.
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.index(x, y).map_or(Color::DEFAULT, |i| self.cells[i])
    }

    /// Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = color;
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.cells.fill(color);
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.cells
    }
}

// ============================================================================
// CANVAS STATE
// ============================================================================

/// The artboard together with the viewport that frames it. This is the unit
/// of history: one snapshot captures both.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasState {
    pub artboard: Artboard,
    pub viewport: Viewport,
}

impl CanvasState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            artboard: Artboard::new(),
            viewport: Viewport::new(width, height),
        }
    }

    /// Color at a viewport-local position.
    pub fn get_local(&self, local_x: u32, local_y: u32) -> Color {
        let (x, y) = self.viewport.to_absolute(local_x, local_y);
        self.artboard.get(x, y)
    }

    /// True when any visible cell holds the mask marker.
    pub fn has_mask_in_viewport(&self) -> bool {
        // Sparse scan when the board is smaller than the viewport
        if self.artboard.len() < self.viewport.area() {
            let rect = self.viewport.rect();
            return self
                .artboard
                .iter()
                .any(|((x, y), c)| c.is_mask() && rect.contains(x, y));
        }
        self.viewport
            .cells()
            .any(|(x, y)| self.artboard.get(x, y).is_mask())
    }

    /// Copy the visible region into a dense grid.
    pub fn viewport_grid(&self) -> DenseGrid {
        let vp = self.viewport;
        let cells = vp.cells().map(|(x, y)| self.artboard.get(x, y)).collect();
        DenseGrid {
            width: vp.width,
            height: vp.height,
            cells,
        }
    }

    /// Overwrite the visible region with `grid`. Cells beyond the grid's
    /// extent are left untouched.
    pub fn write_viewport(&mut self, grid: &DenseGrid) {
        let w = grid.width.min(self.viewport.width);
        let h = grid.height.min(self.viewport.height);
        for ly in 0..h {
            for lx in 0..w {
                let (x, y) = self.viewport.to_absolute(lx, ly);
                self.artboard.set(x, y, grid.get(lx, ly));
            }
        }
    }
}

// ============================================================================
// PAN GESTURE & FRAME COALESCING
// ============================================================================

/// In-flight pan drag. The committed offset is never touched while dragging;
/// the renderer shows [`PanGesture::preview_offset`] instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanGesture {
    pub start_offset: Coord,
    anchor: (f32, f32),
    pointer: (f32, f32),
}

impl PanGesture {
    pub fn begin(start_offset: Coord, pointer: (f32, f32)) -> Self {
        Self {
            start_offset,
            anchor: pointer,
            pointer,
        }
    }

    pub fn move_to(&mut self, pointer: (f32, f32)) {
        self.pointer = pointer;
    }

    /// Accumulated pixel delta since the drag started.
    pub fn pixel_delta(&self) -> (f32, f32) {
        (self.pointer.0 - self.anchor.0, self.pointer.1 - self.anchor.1)
    }

    /// Pixel delta rounded to whole cells.
    pub fn cell_delta(&self, spacing: f32) -> Coord {
        if !(spacing > 0.0) {
            return (0, 0);
        }
        let (dx, dy) = self.pixel_delta();
        ((dx / spacing).round() as i64, (dy / spacing).round() as i64)
    }

    /// Offset the viewport would have if the drag were released now.
    pub fn preview_offset(&self, spacing: f32) -> Coord {
        let (cx, cy) = self.cell_delta(spacing);
        (self.start_offset.0 - cx, self.start_offset.1 - cy)
    }
}

/// Single-slot coalescer for per-frame work. Each request replaces the
/// pending value; the frame callback takes only the latest one.
#[derive(Clone, Debug, Default)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Store `value` for the next frame. Returns `true` when no frame was
    /// pending yet, i.e. the caller should schedule one.
    pub fn request(&mut self, value: T) -> bool {
        self.pending.replace(value).is_none()
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_is_elided() {
        let mut board = Artboard::new();
        board.set(3, -7, Color::Red);
        assert_eq!(board.len(), 1);
        board.set(3, -7, Color::DEFAULT);
        assert_eq!(board.len(), 0);
        assert!(!board.is_stored(3, -7));
        assert_eq!(board.get(3, -7), Color::DEFAULT);

        board.set(1_000_000_000_000, 5, Color::DEFAULT);
        assert!(board.is_empty());
    }

    #[test]
    fn unbounded_coordinates() {
        let mut board = Artboard::new();
        board.set(i64::MIN + 1, i64::MAX - 1, Color::Blue);
        board.set(-40, 90, Color::Mask);
        assert_eq!(board.get(i64::MIN + 1, i64::MAX - 1), Color::Blue);
        assert_eq!(board.get(-40, 90), Color::Mask);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn snapshot_clone_is_independent() {
        let mut board = Artboard::new();
        board.set(0, 0, Color::Red);
        let snapshot = board.clone();
        board.set(0, 0, Color::Blue);
        board.set(1, 0, Color::Green);
        assert_eq!(snapshot.get(0, 0), Color::Red);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn screen_to_grid_uses_min_spacing_and_offset() {
        let mut vp = Viewport::new(10, 5);
        vp.offset = (100, -20);
        // 200x50 px area: spacing = min(20, 10) = 10
        assert_eq!(vp.spacing(200.0, 50.0), 10.0);
        assert_eq!(vp.screen_to_grid(0.0, 0.0, 200.0, 50.0), Some((100, -20)));
        assert_eq!(vp.screen_to_grid(95.0, 49.0, 200.0, 50.0), Some((109, -16)));
        assert_eq!(vp.screen_to_grid(100.0, 10.0, 200.0, 50.0), None);
        assert_eq!(vp.screen_to_grid(-1.0, 10.0, 200.0, 50.0), None);
    }

    #[test]
    fn local_absolute_round_trip() {
        let mut vp = Viewport::new(4, 3);
        vp.offset = (-2, 7);
        let abs = vp.to_absolute(3, 2);
        assert_eq!(abs, (1, 9));
        assert_eq!(vp.to_local(abs.0, abs.1), Some((3, 2)));
        assert_eq!(vp.to_local(2, 9), None);
    }

    #[test]
    fn viewport_cells_outlive_the_viewport() {
        let cells = {
            let mut vp = Viewport::new(2, 2);
            vp.offset = (5, -1);
            vp.cells()
        };
        assert_eq!(cells.collect::<Vec<_>>(), vec![(5, -1), (6, -1), (5, 0), (6, 0)]);
    }

    #[test]
    fn pan_gesture_rounds_to_cells() {
        let mut pan = PanGesture::begin((0, 0), (50.0, 50.0));
        pan.move_to((54.0, 50.0));
        assert_eq!(pan.cell_delta(10.0), (0, 0));
        pan.move_to((66.0, 29.0));
        assert_eq!(pan.cell_delta(10.0), (2, -2));
        assert_eq!(pan.preview_offset(10.0), (-2, 2));
    }

    #[test]
    fn coalescer_keeps_latest_only() {
        let mut frames = FrameCoalescer::new();
        assert!(frames.request(1));
        assert!(!frames.request(2));
        assert!(!frames.request(3));
        assert_eq!(frames.take(), Some(3));
        assert_eq!(frames.take(), None);
    }

    #[test]
    fn mask_detection_is_viewport_bounded() {
        let mut state = CanvasState::new(3, 3);
        state.artboard.set(5, 5, Color::Mask);
        assert!(!state.has_mask_in_viewport());
        state.artboard.set(2, 2, Color::Mask);
        assert!(state.has_mask_in_viewport());
    }

    #[test]
    fn write_viewport_elides_default() {
        let mut state = CanvasState::new(2, 2);
        state.viewport.offset = (10, 10);
        let mut grid = DenseGrid::new_filled(2, 2, Color::White);
        grid.set(1, 1, Color::Red);
        state.write_viewport(&grid);
        assert_eq!(state.artboard.len(), 1);
        assert_eq!(state.artboard.get(11, 11), Color::Red);
        assert_eq!(state.viewport_grid(), grid);
    }
}
