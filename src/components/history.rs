use std::collections::VecDeque;

use crate::canvas::{Artboard, CanvasState, Coord};

/// Default number of undo steps kept.
pub const MAX_HISTORY_SIZE: usize = 50;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Artboard contents plus viewport offset, captured before a mutating action.
///
/// Cloning the artboard is a reference-count bump; the copy happens lazily
/// on the next write to the live board.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardSnapshot {
    pub description: String,
    pub artboard: Artboard,
    pub offset: Coord,
}

impl BoardSnapshot {
    pub fn capture(description: impl Into<String>, state: &CanvasState) -> Self {
        Self {
            description: description.into(),
            artboard: state.artboard.clone(),
            offset: state.viewport.offset,
        }
    }

    /// Replace the live artboard and offset. Viewport size is not part of
    /// history; a resize resets history instead.
    pub fn restore_into(self, state: &mut CanvasState) {
        state.artboard = self.artboard;
        state.viewport.offset = self.offset;
    }
}

// ============================================================================
// HISTORY MANAGER - linear undo/redo over full snapshots
// ============================================================================

/// Two bounded stacks of [`BoardSnapshot`]s. Any new save clears redo.
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<BoardSnapshot>,
    redo_stack: VecDeque<BoardSnapshot>,
    max_history_size: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_history_size: max_history_size.max(1),
        }
    }

    /// Record the current state before a mutating action.
    pub fn save_state(&mut self, description: impl Into<String>, state: &CanvasState) {
        self.undo_stack
            .push_back(BoardSnapshot::capture(description, state));
        Self::prune(&mut self.undo_stack, self.max_history_size);
        self.redo_stack.clear();
    }

    /// Step back one action. Returns the description of the undone action,
    /// `None` when there is nothing to undo.
    pub fn undo(&mut self, state: &mut CanvasState) -> Option<String> {
        let previous = self.undo_stack.pop_back()?;
        let description = previous.description.clone();
        self.redo_stack
            .push_back(BoardSnapshot::capture(description.clone(), state));
        Self::prune(&mut self.redo_stack, self.max_history_size);
        previous.restore_into(state);
        Some(description)
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self, state: &mut CanvasState) -> Option<String> {
        let next = self.redo_stack.pop_back()?;
        let description = next.description.clone();
        self.undo_stack
            .push_back(BoardSnapshot::capture(description.clone(), state));
        Self::prune(&mut self.undo_stack, self.max_history_size);
        next.restore_into(state);
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|s| s.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    fn prune(stack: &mut VecDeque<BoardSnapshot>, max: usize) {
        while stack.len() > max {
            stack.pop_front();
        }
    }
}
