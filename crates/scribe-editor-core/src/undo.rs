//! Undo/redo history for the in-memory document engine.
//!
//! One step is one transaction: a text replacement together with the marks
//! before and after it, or a mark-only change. Reconciliation steps are folded
//! into the step they follow, so undoing a keystroke also restores its marks.

use smol_str::SmolStr;

use crate::marks::InlineMark;
use crate::types::Selection;

/// Undo over whole transactions. `undo` and `redo` revert or re-apply the
/// step and return false when there was none.
pub trait UndoManager {
    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn undo(&mut self) -> bool;

    fn redo(&mut self) -> bool;

    fn clear_history(&mut self);
}

/// A recorded text replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Char offset of the replaced range.
    pub pos: usize,
    pub deleted: SmolStr,
    pub inserted: SmolStr,
}

/// One undoable transaction.
#[derive(Debug, Clone)]
pub struct HistoryStep {
    pub text: Option<TextEdit>,
    pub marks_before: Vec<InlineMark>,
    pub marks_after: Vec<InlineMark>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

/// Bounded undo/redo stacks of transaction steps.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<HistoryStep>,
    redo_stack: Vec<HistoryStep>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record a new step, clearing redo.
    pub fn record(&mut self, step: HistoryStep) {
        self.redo_stack.clear();
        self.undo_stack.push(step);

        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Fold a mark-only change into the latest step.
    ///
    /// Returns false when there is no step to join, in which case the caller
    /// should `record` a fresh one.
    pub fn join_marks(&mut self, marks_after: Vec<InlineMark>) -> bool {
        match self.undo_stack.last_mut() {
            Some(step) => {
                step.marks_after = marks_after;
                self.redo_stack.clear();
                true
            }
            None => false,
        }
    }

    /// Move the latest step to the redo stack and hand it out for reverting.
    pub fn take_undo(&mut self) -> Option<HistoryStep> {
        let step = self.undo_stack.pop()?;
        self.redo_stack.push(step.clone());
        Some(step)
    }

    /// Move the latest undone step back and hand it out for re-applying.
    pub fn take_redo(&mut self) -> Option<HistoryStep> {
        let step = self.redo_stack.pop()?;
        self.undo_stack.push(step.clone());
        Some(step)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
