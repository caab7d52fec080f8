// ============================================================================
// REFINEMENT — neighborhood cleanup and 2×2 block contouring
// ============================================================================
//
// Every pass reads from a snapshot of the board and applies its collected
// changes at the end, so no cell sees a write from the pass it is part of.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::canvas::{Artboard, Coord};
use crate::components::colors::Color;
use crate::error::EditorError;

pub const MIN_STRENGTH: u8 = 1;
pub const MAX_STRENGTH: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefineMode {
    /// Gap filling plus orphan removal, one pass.
    Gentle,
    /// 2×2 block consolidation, repeated `passes` times.
    Contour { passes: u8 },
}

impl RefineMode {
    pub fn from_strength(strength: u8) -> Result<Self, EditorError> {
        match strength {
            1 | 2 => Ok(RefineMode::Gentle),
            3 => Ok(RefineMode::Contour { passes: 1 }),
            4 => Ok(RefineMode::Contour { passes: 2 }),
            other => Err(EditorError::InvalidStrength(other)),
        }
    }
}

/// Refine the whole artboard in place. Returns the number of cell writes
/// that changed a value.
pub fn refine(board: &mut Artboard, strength: u8) -> Result<usize, EditorError> {
    let changed = match RefineMode::from_strength(strength)? {
        RefineMode::Gentle => apply(board, gentle_changes(board)),
        RefineMode::Contour { passes } => {
            let mut total = 0;
            for _ in 0..passes {
                let changes = contour_changes(board);
                total += apply(board, changes);
            }
            total
        }
    };
    crate::log_info!("Refine strength {}: {} cells changed", strength, changed);
    Ok(changed)
}

fn apply(board: &mut Artboard, changes: Vec<(Coord, Color)>) -> usize {
    let mut changed = 0;
    for ((x, y), color) in changes {
        if board.get(x, y) != color {
            board.set(x, y, color);
            changed += 1;
        }
    }
    changed
}

/// Deduplicated coordinates in row-major order, so the parallel collect
/// yields the same sequence a full sweep would.
fn row_major(coords: HashSet<Coord>) -> Vec<Coord> {
    let mut coords: Vec<Coord> = coords.into_iter().collect();
    coords.sort_unstable_by_key(|&(x, y)| (y, x));
    coords
}

// ============================================================================
// GENTLE PASS
// ============================================================================

const NEIGHBORS_8: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Color filling a gap between two equal ink neighbors, N/S first then W/E.
fn gap_color(board: &Artboard, x: i64, y: i64) -> Option<Color> {
    let north = board.get(x, y - 1);
    if north.is_ink() && north == board.get(x, y + 1) {
        return Some(north);
    }
    let west = board.get(x - 1, y);
    if west.is_ink() && west == board.get(x + 1, y) {
        return Some(west);
    }
    None
}

/// Replacement for an ink cell with at most one matching neighbor: the color
/// occurring more often than any other among its 8 neighbors. Mask cells are
/// not candidates. A tie yields `None`.
fn orphan_color(board: &Artboard, x: i64, y: i64, color: Color) -> Option<Color> {
    let neighbors = NEIGHBORS_8.map(|(dx, dy)| board.get(x + dx, y + dy));
    let same = neighbors.iter().filter(|&&c| c == color).count();
    if same > 1 {
        return None;
    }

    let mut counts: Vec<(Color, usize)> = Vec::with_capacity(8);
    for c in neighbors.into_iter().filter(|c| !c.is_mask()) {
        match counts.iter_mut().find(|(k, _)| *k == c) {
            Some((_, n)) => *n += 1,
            None => counts.push((c, 1)),
        }
    }

    let best = counts.iter().map(|&(_, n)| n).max()?;
    let mut leaders = counts.iter().filter(|&&(_, n)| n == best);
    let (winner, _) = *leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    (winner != color).then_some(winner)
}

/// Changes of one gentle pass, computed against `board` as it is now.
///
/// Only stored cells and the neighbors of ink cells can change: an orphan is
/// ink itself, and a gap always has an ink cell beside it.
pub fn gentle_changes(board: &Artboard) -> Vec<(Coord, Color)> {
    let mut candidates = HashSet::new();
    for ((x, y), color) in board.iter() {
        candidates.insert((x, y));
        if color.is_ink() {
            candidates.extend(NEIGHBORS_8.iter().map(|&(dx, dy)| (x + dx, y + dy)));
        }
    }
    row_major(candidates)
        .par_iter()
        .filter_map(|&(x, y)| {
            let current = board.get(x, y);
            let replacement = if current.is_ink() {
                orphan_color(board, x, y, current)
            } else {
                gap_color(board, x, y)
            };
            replacement.map(|c| ((x, y), c))
        })
        .collect()
}

// ============================================================================
// CONTOUR PASS
// ============================================================================

/// Changes of one contour pass. Each 2×2 block with exactly three cells of
/// one ink color forces the fourth. When two blocks disagree about a cell,
/// the first block in row-major order wins.
pub fn contour_changes(board: &Artboard) -> Vec<(Coord, Color)> {
    // Top-left corners of every block holding at least one ink cell.
    let mut blocks = HashSet::new();
    for ((x, y), color) in board.iter() {
        if color.is_ink() {
            blocks.extend([(x - 1, y - 1), (x, y - 1), (x - 1, y), (x, y)]);
        }
    }
    let proposals: Vec<(Coord, Color)> = row_major(blocks)
        .par_iter()
        .filter_map(|&(x, y)| block_fix(board, x, y))
        .collect();

    let mut seen: HashMap<Coord, Color> = HashMap::new();
    let mut changes = Vec::new();
    for (coord, color) in proposals {
        if let std::collections::hash_map::Entry::Vacant(e) = seen.entry(coord) {
            e.insert(color);
            changes.push((coord, color));
        }
    }
    changes
}

fn block_fix(board: &Artboard, x: i64, y: i64) -> Option<(Coord, Color)> {
    let block = [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)];
    let colors = block.map(|(bx, by)| board.get(bx, by));
    for &candidate in &colors {
        if !candidate.is_ink() {
            continue;
        }
        if colors.iter().filter(|&&c| c == candidate).count() == 3 {
            let odd = colors.iter().position(|&c| c != candidate)?;
            return Some((block[odd], candidate));
        }
    }
    None
}
