use image::RgbaImage;
use rand::Rng;

use crate::canvas::{Artboard, CanvasState, Coord, DenseGrid, FrameCoalescer, PanGesture};
use crate::components::colors::Color;
use crate::components::history::HistoryManager;
use crate::components::tools::{self, Tool, ToolProperties};
use crate::error::EditorError;
use crate::ops::generators::{self, Generator};
use crate::ops::mask::{self, OverlayState};
use crate::ops::quantize::{self, ImportOptions};
use crate::ops::refine::{self, RefineMode};
use crate::settings::EditorSettings;

/// Largest accepted grid side, in cells.
pub const MAX_GRID_DIM: u32 = 1024;

pub fn validate_grid_size(width: u32, height: u32) -> Result<(), EditorError> {
    if width == 0 || height == 0 || width > MAX_GRID_DIM || height > MAX_GRID_DIM {
        return Err(EditorError::InvalidGridSize {
            width,
            height,
            max: MAX_GRID_DIM,
        });
    }
    Ok(())
}

// ============================================================================
// EDITOR — the whole mutable state of one board
// ============================================================================

/// Board, history, tool selection and the in-flight gesture state.
///
/// Every mutating entry point snapshots history exactly once before it
/// writes, and commits any pending background preview after that snapshot,
/// so "commit + action" undoes as a single step.
#[derive(Debug)]
pub struct Editor {
    canvas: CanvasState,
    pub history: HistoryManager,
    pub props: ToolProperties,
    overlay: OverlayState,
    pan: Option<PanGesture>,
    pan_frames: FrameCoalescer<(f32, f32)>,
    stroke_active: bool,
    generation_pending: bool,
}

impl Editor {
    pub fn new(width: u32, height: u32) -> Result<Self, EditorError> {
        validate_grid_size(width, height)?;
        Ok(Self {
            canvas: CanvasState::new(width, height),
            history: HistoryManager::default(),
            props: ToolProperties::default(),
            overlay: OverlayState::Idle,
            pan: None,
            pan_frames: FrameCoalescer::new(),
            stroke_active: false,
            generation_pending: false,
        })
    }

    pub fn with_settings(settings: &EditorSettings) -> Result<Self, EditorError> {
        let mut editor = Self::new(settings.grid_width, settings.grid_height)?;
        editor.history = HistoryManager::new(settings.max_undo_steps);
        editor.props.brush_size = settings.brush_size;
        Ok(editor)
    }

    /// Rebuild an editor from persisted parts. History starts empty.
    pub fn from_parts(
        width: u32,
        height: u32,
        offset: Coord,
        artboard: Artboard,
    ) -> Result<Self, EditorError> {
        let mut editor = Self::new(width, height)?;
        editor.canvas.artboard = artboard;
        editor.canvas.viewport.offset = offset;
        Ok(editor)
    }

    // --- accessors ---------------------------------------------------------

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    pub fn artboard(&self) -> &Artboard {
        &self.canvas.artboard
    }

    pub fn width(&self) -> u32 {
        self.canvas.viewport.width
    }

    pub fn height(&self) -> u32 {
        self.canvas.viewport.height
    }

    pub fn offset(&self) -> Coord {
        self.canvas.viewport.offset
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    /// True when there is anything worth exporting or saving.
    pub fn has_art(&self) -> bool {
        !self.canvas.artboard.is_empty()
    }

    pub fn has_mask(&self) -> bool {
        self.canvas.has_mask_in_viewport()
    }

    /// Logical color of a visible cell with the preview composited over
    /// mask cells.
    pub fn cell_color(&self, local_x: u32, local_y: u32) -> Color {
        self.overlay.composite(&self.canvas, local_x, local_y)
    }

    /// RGB the renderer should paint for a visible cell.
    pub fn display_color(&self, local_x: u32, local_y: u32) -> [u8; 3] {
        self.cell_color(local_x, local_y).display_rgb()
    }

    /// Pointer position to absolute cell, for a grid drawn into a
    /// `pixel_w × pixel_h` area.
    pub fn cell_at(&self, px: f32, py: f32, pixel_w: f32, pixel_h: f32) -> Option<Coord> {
        self.canvas.viewport.screen_to_grid(px, py, pixel_w, pixel_h)
    }

    // --- tool selection ----------------------------------------------------

    pub fn select_tool(&mut self, tool: Tool) {
        self.props.tool = tool;
    }

    /// Any palette color or the mask marker.
    pub fn select_color(&mut self, color: Color) {
        self.props.color = color;
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.props.brush_size = size.max(1);
    }

    // --- strokes -----------------------------------------------------------

    /// Pointer down on an absolute cell. Returns the number of cells changed.
    pub fn begin_stroke(&mut self, x: i64, y: i64) -> usize {
        if !self.canvas.viewport.contains(x, y) {
            return 0;
        }
        self.history.save_state(self.props.tool.label(), &self.canvas);
        self.overlay.commit(&mut self.canvas);
        self.stroke_active = self.props.tool.is_continuous();
        tools::apply_tool(&mut self.canvas, &self.props, x, y)
    }

    /// Pointer drag. Only the continuous tools keep painting; the fills fire
    /// once per stroke.
    pub fn continue_stroke(&mut self, x: i64, y: i64) -> usize {
        if !self.stroke_active {
            return 0;
        }
        tools::apply_tool(&mut self.canvas, &self.props, x, y)
    }

    pub fn end_stroke(&mut self) {
        self.stroke_active = false;
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke_active
    }

    // --- history -----------------------------------------------------------

    pub fn undo(&mut self) -> Option<String> {
        self.abort_gestures();
        self.overlay.discard();
        self.history.undo(&mut self.canvas)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.abort_gestures();
        self.overlay.discard();
        self.history.redo(&mut self.canvas)
    }

    fn abort_gestures(&mut self) {
        self.stroke_active = false;
        self.pan = None;
        self.pan_frames.cancel();
    }

    // --- panning -----------------------------------------------------------

    pub fn begin_pan(&mut self, pointer: (f32, f32)) {
        self.stroke_active = false;
        self.pan_frames.cancel();
        self.pan = Some(PanGesture::begin(self.canvas.viewport.offset, pointer));
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Record a pointer move. Returns `true` when the caller should schedule
    /// a frame; further moves before that frame only replace the position.
    pub fn pan_pointer_moved(&mut self, pointer: (f32, f32)) -> bool {
        if self.pan.is_none() {
            return false;
        }
        self.pan_frames.request(pointer)
    }

    /// Frame callback: apply the latest pointer position and return the
    /// offset to draw with.
    pub fn on_frame(&mut self, spacing: f32) -> Coord {
        if let Some(pointer) = self.pan_frames.take()
            && let Some(pan) = self.pan.as_mut()
        {
            pan.move_to(pointer);
        }
        self.render_offset(spacing)
    }

    /// Offset the renderer should use right now: the drag preview while
    /// panning, the committed offset otherwise.
    pub fn render_offset(&self, spacing: f32) -> Coord {
        match &self.pan {
            Some(pan) => pan.preview_offset(spacing),
            None => self.canvas.viewport.offset,
        }
    }

    /// Release the drag. A whole-cell delta becomes one undoable step; a
    /// delta that rounds to zero leaves no trace. Returns `true` if the
    /// offset changed.
    pub fn end_pan(&mut self, spacing: f32) -> bool {
        if let Some(pointer) = self.pan_frames.take()
            && let Some(pan) = self.pan.as_mut()
        {
            pan.move_to(pointer);
        }
        let Some(pan) = self.pan.take() else {
            return false;
        };
        let target = pan.preview_offset(spacing);
        if target == self.canvas.viewport.offset {
            return false;
        }
        self.history.save_state("Pan", &self.canvas);
        self.overlay.commit(&mut self.canvas);
        self.canvas.viewport.offset = target;
        true
    }

    /// Abandon the drag; the committed offset was never touched.
    pub fn cancel_pan(&mut self) {
        self.pan = None;
        self.pan_frames.cancel();
    }

    // --- background generation ---------------------------------------------

    /// Claim the single generation slot. `false` while one is already
    /// pending.
    pub fn request_generation(&mut self) -> bool {
        if self.generation_pending {
            return false;
        }
        self.generation_pending = true;
        true
    }

    pub fn is_generating(&self) -> bool {
        self.generation_pending
    }

    /// Run the pending generation. With a mask in view the pattern becomes a
    /// preview and the board is untouched; otherwise the whole viewport is
    /// overwritten as one undoable step.
    pub fn complete_generation<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Generator> {
        if !std::mem::take(&mut self.generation_pending) {
            return None;
        }
        let (kind, grid) = generators::random_pattern(self.width(), self.height(), rng);
        if self.canvas.has_mask_in_viewport() {
            log_info!("Generated '{}' as mask preview", kind.label());
            self.overlay.set_preview(grid);
        } else {
            log_info!("Generated '{}' over the viewport", kind.label());
            self.overlay.discard();
            self.history.save_state("Generate Background", &self.canvas);
            self.canvas.write_viewport(&grid);
        }
        Some(kind)
    }

    /// Request and complete in one call. `None` if a generation was already
    /// pending.
    pub fn generate<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Generator> {
        if !self.request_generation() {
            return None;
        }
        self.complete_generation(rng)
    }

    /// Accept the preview into the masked cells as its own undo step.
    /// Returns the number of cells written.
    pub fn commit_overlay(&mut self) -> usize {
        if !self.overlay.is_preview() {
            return 0;
        }
        self.history.save_state("Commit Background", &self.canvas);
        self.overlay.commit(&mut self.canvas)
    }

    pub fn discard_overlay(&mut self) {
        self.overlay.discard();
    }

    /// Outline the visible mask region with the selected color.
    ///
    /// Preconditions are checked before anything is touched. The border is
    /// taken from the mask as it was before the pending preview is merged.
    pub fn stroke_selection(&mut self) -> Result<usize, EditorError> {
        if !self.canvas.has_mask_in_viewport() {
            return Err(EditorError::NoMask);
        }
        if self.props.color.is_mask() {
            return Err(EditorError::MaskNotAllowed);
        }
        self.history.save_state("Stroke Selection", &self.canvas);
        let border = mask::border_cells(&self.canvas);
        self.overlay.commit(&mut self.canvas);
        Ok(mask::paint_cells(&mut self.canvas, &border, self.props.color))
    }

    // --- refinement --------------------------------------------------------

    /// Refine the whole artboard. History is only touched when the board
    /// actually changes.
    pub fn refine(&mut self, strength: u8) -> Result<usize, EditorError> {
        RefineMode::from_strength(strength)?;
        let mut scratch = self.canvas.clone();
        let mut overlay = self.overlay.clone();
        let committed = overlay.commit(&mut scratch);
        let changed = refine::refine(&mut scratch.artboard, strength)?;
        if committed == 0 && changed == 0 {
            return Ok(0);
        }
        self.history.save_state("Refine", &self.canvas);
        self.canvas = scratch;
        self.overlay = overlay;
        Ok(changed)
    }

    // --- resets ------------------------------------------------------------

    /// Change the grid size. Destructive: board, preview, history and offset
    /// are all reset.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), EditorError> {
        validate_grid_size(width, height)?;
        log_info!("Grid resized to {}x{}", width, height);
        self.reset(width, height);
        Ok(())
    }

    pub fn new_project(&mut self) {
        log_info!("New project");
        self.reset(self.width(), self.height());
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.abort_gestures();
        self.canvas = CanvasState::new(width, height);
        self.overlay.discard();
        self.history.clear();
    }

    /// Replace the board with an imported grid at the origin. History is
    /// cleared; import is not undoable.
    pub fn import_grid(&mut self, grid: &DenseGrid) {
        self.reset(self.width(), self.height());
        self.canvas.write_viewport(grid);
        log_info!("Imported {} cells", self.canvas.artboard.len());
    }

    /// Fit, posterize and quantize a raster onto the grid.
    pub fn import_image(&mut self, img: &RgbaImage, options: &ImportOptions) {
        let grid = quantize::rasterize(img, self.width(), self.height(), options);
        self.import_grid(&grid);
    }
}
