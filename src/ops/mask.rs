use crate::canvas::{CanvasState, Coord, DenseGrid};
use crate::components::colors::Color;

// ============================================================================
// OVERLAY STATE — transient generated layer over masked cells
// ============================================================================

/// Lifecycle of a generated background: `Idle` until a generation lands on a
/// board with a mask, then `Preview` until committed or discarded.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum OverlayState {
    #[default]
    Idle,
    Preview(DenseGrid),
}

impl OverlayState {
    pub fn is_preview(&self) -> bool {
        matches!(self, OverlayState::Preview(_))
    }

    pub fn grid(&self) -> Option<&DenseGrid> {
        match self {
            OverlayState::Preview(grid) => Some(grid),
            OverlayState::Idle => None,
        }
    }

    /// Replace any pending preview with `grid`.
    pub fn set_preview(&mut self, grid: DenseGrid) {
        *self = OverlayState::Preview(grid);
    }

    pub fn discard(&mut self) {
        *self = OverlayState::Idle;
    }

    /// Merge the preview into every visible mask cell and return to `Idle`.
    /// Returns the number of cells written. No history entry is pushed here;
    /// callers snapshot first.
    pub fn commit(&mut self, state: &mut CanvasState) -> usize {
        let OverlayState::Preview(grid) = std::mem::take(self) else {
            return 0;
        };
        let vp = state.viewport;
        let mut written = 0;
        for ly in 0..vp.height.min(grid.height()) {
            for lx in 0..vp.width.min(grid.width()) {
                let (x, y) = vp.to_absolute(lx, ly);
                if state.artboard.get(x, y).is_mask() {
                    state.artboard.set(x, y, grid.get(lx, ly));
                    written += 1;
                }
            }
        }
        written
    }

    /// Color shown for a viewport-local cell: the preview over mask cells,
    /// the artboard everywhere else.
    pub fn composite(&self, state: &CanvasState, local_x: u32, local_y: u32) -> Color {
        let base = state.get_local(local_x, local_y);
        match self {
            OverlayState::Preview(grid) if base.is_mask() => grid.get(local_x, local_y),
            _ => base,
        }
    }
}

// ============================================================================
// STROKE SELECTION
// ============================================================================

/// Visible mask cells with at least one 4-neighbor that is either outside the
/// viewport or not a mask cell. Row-major order.
pub fn border_cells(state: &CanvasState) -> Vec<Coord> {
    let vp = state.viewport;
    let is_inner_mask = |x: i64, y: i64| vp.contains(x, y) && state.artboard.get(x, y).is_mask();
    vp.cells()
        .filter(|&(x, y)| state.artboard.get(x, y).is_mask())
        .filter(|&(x, y)| {
            [(x, y - 1), (x, y + 1), (x - 1, y), (x + 1, y)]
                .iter()
                .any(|&(nx, ny)| !is_inner_mask(nx, ny))
        })
        .collect()
}

/// Paint `cells` with `color`. Returns how many changed.
pub fn paint_cells(state: &mut CanvasState, cells: &[Coord], color: Color) -> usize {
    let mut changed = 0;
    for &(x, y) in cells {
        if state.artboard.get(x, y) != color {
            state.artboard.set(x, y, color);
            changed += 1;
        }
    }
    changed
}
