use std::collections::VecDeque;

use crate::canvas::{CanvasState, Coord};
use crate::components::colors::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Square,
    Circle,
    /// Flood fill bounded to the viewport.
    BucketArea,
    /// Recolor every cell of the clicked color.
    BucketGlobal,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Square => "Square Brush",
            Tool::Circle => "Circle Brush",
            Tool::BucketArea => "Fill",
            Tool::BucketGlobal => "Global Fill",
        }
    }

    /// Tools that keep painting while the pointer is dragged.
    pub fn is_continuous(&self) -> bool {
        matches!(self, Tool::Pencil | Tool::Square | Tool::Circle)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolProperties {
    pub tool: Tool,
    /// Side length / diameter in cells for the shaped brushes.
    pub brush_size: u32,
    pub color: Color,
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self {
            tool: Tool::Pencil,
            brush_size: 3,
            color: Color::DEFAULT,
        }
    }
}

// ============================================================================
// CIRCLE PATTERNS
// ============================================================================

/// Hand-tuned stamps for small circle brushes (sizes 2..=5). Offsets are
/// relative to the stamp's bounding-box corner.
const SMALL_CIRCLE_PATTERNS: [&[(i64, i64)]; 4] = [
    &[(0, 0), (1, 0), (0, 1), (1, 1)],
    &[(0, 1), (1, 0), (1, 1), (1, 2), (2, 1)],
    &[
        (0, 1), (0, 2), (1, 0), (1, 1), (1, 2), (1, 3),
        (2, 0), (2, 1), (2, 2), (2, 3), (3, 1), (3, 2),
    ],
    &[
        (0, 2), (1, 1), (1, 2), (1, 3), (2, 0), (2, 1), (2, 2),
        (2, 3), (2, 4), (3, 1), (3, 2), (3, 3), (4, 2),
    ],
];

fn small_circle_pattern(size: u32) -> Option<&'static [(i64, i64)]> {
    match size {
        2..=5 => Some(SMALL_CIRCLE_PATTERNS[size as usize - 2]),
        _ => None,
    }
}

// ============================================================================
// TOOL IMPLEMENTATIONS
// ============================================================================
//
// All tools take absolute artboard coordinates, clip writes to the viewport
// and return how many cells actually changed. Zero means nothing happened.

/// Dispatch the current tool at an absolute coordinate.
pub fn apply_tool(state: &mut CanvasState, props: &ToolProperties, x: i64, y: i64) -> usize {
    match props.tool {
        Tool::Pencil => draw_pencil(state, x, y, props.color) as usize,
        Tool::Square => draw_square(state, x, y, props.brush_size, props.color),
        Tool::Circle => draw_circle(state, x, y, props.brush_size, props.color),
        Tool::BucketArea => flood_fill(state, x, y, props.color),
        Tool::BucketGlobal => global_fill(state, x, y, props.color),
    }
}

/// Write one visible cell. Returns `true` if its color changed.
#[inline]
fn paint(state: &mut CanvasState, x: i64, y: i64, color: Color) -> bool {
    if !state.viewport.contains(x, y) || state.artboard.get(x, y) == color {
        return false;
    }
    state.artboard.set(x, y, color);
    true
}

pub fn draw_pencil(state: &mut CanvasState, x: i64, y: i64, color: Color) -> bool {
    paint(state, x, y, color)
}

/// Square of side `size` whose top-left corner is `x - floor(size / 2)`.
/// Even sizes lean towards the top-left.
pub fn draw_square(state: &mut CanvasState, x: i64, y: i64, size: u32, color: Color) -> usize {
    let size = size.max(1) as i64;
    let start_x = x - size / 2;
    let start_y = y - size / 2;
    let mut changed = 0;
    for cy in start_y..start_y + size {
        for cx in start_x..start_x + size {
            changed += paint(state, cx, cy, color) as usize;
        }
    }
    changed
}

/// Round brush. Sizes 2..=5 use curated stamps; other sizes fill every cell
/// whose center lies strictly inside radius `size / 2`.
pub fn draw_circle(state: &mut CanvasState, cx: i64, cy: i64, size: u32, color: Color) -> usize {
    let size = size.max(1);
    let mut changed = 0;

    if let Some(pattern) = small_circle_pattern(size) {
        let offset = (size / 2) as i64;
        for &(px, py) in pattern {
            changed += paint(state, cx + px - offset, cy + py - offset, color) as usize;
        }
        return changed;
    }

    let radius = size as f64 / 2.0;
    let r_sq = radius * radius;
    let start_y = (cy as f64 - radius).floor() as i64;
    let end_y = (cy as f64 + radius).ceil() as i64;
    let start_x = (cx as f64 - radius).floor() as i64;
    let end_x = (cx as f64 + radius).ceil() as i64;

    for y in start_y..end_y {
        for x in start_x..end_x {
            let dx = (x - cx) as f64;
            let dy = (y - cy) as f64;
            if dx * dx + dy * dy < r_sq {
                changed += paint(state, x, y, color) as usize;
            }
        }
    }
    changed
}

/// 4-connected flood fill from `(start_x, start_y)`, never leaving the
/// viewport. Cells outside it are not visited even when they share the
/// seed color.
pub fn flood_fill(state: &mut CanvasState, start_x: i64, start_y: i64, color: Color) -> usize {
    let rect = state.viewport.rect();
    if !rect.contains(start_x, start_y) {
        return 0;
    }
    let target = state.artboard.get(start_x, start_y);
    if target == color {
        return 0;
    }

    let cap = state.viewport.area();
    let mut queue: VecDeque<Coord> = VecDeque::with_capacity(256);
    state.artboard.set(start_x, start_y, color);
    queue.push_back((start_x, start_y));
    let mut painted = 1usize;

    'fill: while let Some((x, y)) = queue.pop_front() {
        let neighbors = [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)];
        for (nx, ny) in neighbors {
            if !rect.contains(nx, ny) || state.artboard.get(nx, ny) != target {
                continue;
            }
            if painted >= cap {
                log_warn!(
                    "flood fill exceeded {} cells at ({}, {}); stopping with partial fill",
                    cap,
                    start_x,
                    start_y
                );
                break 'fill;
            }
            state.artboard.set(nx, ny, color);
            painted += 1;
            queue.push_back((nx, ny));
        }
    }

    painted
}

/// Replace every cell of the clicked color with `color`, anywhere on the
/// artboard.
///
/// When the clicked color is the default, the unbounded background cannot be
/// enumerated; the visible default cells are recolored instead.
pub fn global_fill(state: &mut CanvasState, x: i64, y: i64, color: Color) -> usize {
    if !state.viewport.contains(x, y) {
        return 0;
    }
    let source = state.artboard.get(x, y);
    if source == color {
        return 0;
    }

    let targets: Vec<Coord> = if source.is_default() {
        state
            .viewport
            .cells()
            .filter(|&(cx, cy)| !state.artboard.is_stored(cx, cy))
            .collect()
    } else {
        state
            .artboard
            .iter()
            .filter(|&(_, c)| c == source)
            .map(|(k, _)| k)
            .collect()
    };

    for &(cx, cy) in &targets {
        state.artboard.set(cx, cy, color);
    }
    targets.len()
}
