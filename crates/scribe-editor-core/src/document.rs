//! In-memory document engine.
//!
//! `MemoryEngine` implements `DocumentEngine` over a `TextBuffer`: paragraphs
//! are `\n`-separated lines, marks are char ranges mapped through every text
//! edit, history groups each transaction into one undo step, and notifications
//! are queued until the host drains them. Caret coordinates come from a fixed
//! monospace grid. It backs the test-suite and non-browser hosts.

use std::collections::VecDeque;
use std::ops::Range;

use smol_str::SmolStr;

use crate::engine::{ChangeOrigin, ChangeSpan, DocumentEngine, EngineEvent, ReplaceOptions};
use crate::error::EngineError;
use crate::marks::{InlineMark, MarkOp, MarkTransaction};
use crate::paragraph::{ParagraphText, all_paragraphs, paragraph_at};
use crate::text::{EditorRope, TextBuffer};
use crate::types::{CursorRect, MarkKind, Selection};
use crate::undo::{History, HistoryStep, TextEdit, UndoManager};

/// Grid used to fake screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub char_width: f64,
    pub line_height: f64,
    /// Container padding on every side
    pub padding: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding: 12.0,
        }
    }
}

/// Simple field-based document engine.
pub struct MemoryEngine<T: TextBuffer = EditorRope> {
    buffer: T,
    selection: Selection,
    marks: Vec<InlineMark>,
    mark_kinds: Vec<MarkKind>,
    history: History,
    events: VecDeque<EngineEvent>,
    metrics: GridMetrics,
    focused: bool,
    destroyed: bool,
}

impl MemoryEngine<EditorRope> {
    /// Create an engine holding `content`, caret at the end.
    pub fn new(content: &str) -> Self {
        Self::with_buffer(EditorRope::from_str(content))
    }
}

impl Default for MemoryEngine<EditorRope> {
    fn default() -> Self {
        Self::new("")
    }
}

impl<T: TextBuffer> MemoryEngine<T> {
    pub fn with_buffer(buffer: T) -> Self {
        let end = buffer.len_chars();
        Self {
            buffer,
            selection: Selection::collapsed(end),
            marks: Vec::new(),
            mark_kinds: MarkKind::ALL.to_vec(),
            history: History::default(),
            events: VecDeque::new(),
            metrics: GridMetrics::default(),
            focused: true,
            destroyed: false,
        }
    }

    /// Restrict the schema to the given mark kinds.
    pub fn with_mark_kinds(mut self, kinds: &[MarkKind]) -> Self {
        self.mark_kinds = kinds.to_vec();
        self
    }

    pub fn with_metrics(mut self, metrics: GridMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn content(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    /// All marks, sorted by position.
    pub fn marks(&self) -> &[InlineMark] {
        &self.marks
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Take every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.check_range(&selection.to_range())?;
        self.selection = selection;
        self.events.push_back(EngineEvent::SelectionChanged);
        Ok(())
    }

    /// Type text at the selection, as a user would.
    pub fn type_text(&mut self, text: &str) -> Result<(), EngineError> {
        let range = self.selection.to_range();
        self.replace_text(range, text, ReplaceOptions::from_origin(ChangeOrigin::User))
    }

    /// Backspace: delete the selection, or the char before the caret.
    pub fn delete_backward(&mut self) -> Result<(), EngineError> {
        let range = if self.selection.is_collapsed() {
            let head = self.selection.head;
            if head == 0 {
                return Ok(());
            }
            head - 1..head
        } else {
            self.selection.to_range()
        };
        self.replace_text(range, "", ReplaceOptions::from_origin(ChangeOrigin::User))
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.events.push_back(EngineEvent::Blur);
    }

    /// Tear the engine down; every later mutation fails with `Destroyed`.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.events.clear();
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), EngineError> {
        let len = self.buffer.len_chars();
        if range.start > range.end || range.end > len {
            return Err(EngineError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(())
    }

    fn check_kind(&self, kind: MarkKind) -> Result<(), EngineError> {
        if self.mark_kinds.contains(&kind) {
            Ok(())
        } else {
            Err(EngineError::UnknownMarkKind(kind))
        }
    }

    /// Move marks through a replacement of `start..end` by `inserted` chars.
    ///
    /// Mark starts stick to the text after an edit and mark ends to the text
    /// before it, so typing at either edge of a mark does not extend it.
    fn map_marks(&mut self, start: usize, end: usize, inserted: usize) {
        let map = |pos: usize, stick_after: bool| -> usize {
            if pos < start {
                pos
            } else if pos > end {
                pos - (end - start) + inserted
            } else if stick_after {
                start + inserted
            } else {
                start
            }
        };

        let mapped: Vec<InlineMark> = self
            .marks
            .drain(..)
            .map(|mark| {
                let range = map(mark.range.start, true)..map(mark.range.end, false);
                InlineMark { range, ..mark }
            })
            .filter(|mark| mark.range.start < mark.range.end)
            .collect();

        self.marks = mapped
            .into_iter()
            .flat_map(|mark| split_at_newlines(&self.buffer, mark))
            .collect();
        sort_marks(&mut self.marks);
    }

    fn push_change(&mut self, origin: ChangeOrigin, span: Option<ChangeSpan>) {
        self.events.push_back(EngineEvent::DocumentChanged { origin, span });
    }
}

fn sort_marks(marks: &mut [InlineMark]) {
    marks.sort_by_key(|m| (m.range.start, m.range.end, m.kind));
}

/// Marks never cross paragraph boundaries.
fn split_at_newlines<T: TextBuffer>(buffer: &T, mark: InlineMark) -> Vec<InlineMark> {
    let mut pieces = Vec::new();
    let mut piece_start = mark.range.start;
    for pos in mark.range.clone() {
        if buffer.char_at(pos) == Some('\n') {
            if piece_start < pos {
                pieces.push(InlineMark::new(mark.kind, piece_start..pos, mark.value.clone()));
            }
            piece_start = pos + 1;
        }
    }
    if piece_start < mark.range.end {
        pieces.push(InlineMark::new(
            mark.kind,
            piece_start..mark.range.end,
            mark.value,
        ));
    }
    pieces
}

/// Clear marks of `kind` over `range`, keeping the parts that stick out.
fn remove_kind_over(marks: &mut Vec<InlineMark>, kind: MarkKind, range: &Range<usize>) {
    if range.is_empty() {
        return;
    }
    let mut kept = Vec::with_capacity(marks.len());
    for mark in marks.drain(..) {
        if mark.kind != kind || mark.range.end <= range.start || mark.range.start >= range.end {
            kept.push(mark);
            continue;
        }
        if mark.range.start < range.start {
            kept.push(InlineMark::new(kind, mark.range.start..range.start, mark.value.clone()));
        }
        if mark.range.end > range.end {
            kept.push(InlineMark::new(kind, range.end..mark.range.end, mark.value.clone()));
        }
    }
    *marks = kept;
}

impl<T: TextBuffer> DocumentEngine for MemoryEngine<T> {
    fn selection(&self) -> Option<Selection> {
        (!self.destroyed).then_some(self.selection)
    }

    fn paragraph_at(&self, offset: usize) -> Option<ParagraphText> {
        paragraph_at(&self.buffer, offset)
    }

    fn paragraphs(&self) -> Vec<ParagraphText> {
        all_paragraphs(&self.buffer)
    }

    fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    fn coords_at(&self, offset: usize) -> Option<CursorRect> {
        if self.destroyed || offset > self.buffer.len_chars() {
            return None;
        }
        let line = self.buffer.char_to_line(offset);
        let column = offset - self.buffer.line_to_char(line);
        let GridMetrics {
            char_width,
            line_height,
            padding,
        } = self.metrics;
        Some(CursorRect::new(
            padding + column as f64 * char_width,
            padding + line as f64 * line_height,
            line_height,
        ))
    }

    fn has_mark_kind(&self, kind: MarkKind) -> bool {
        self.mark_kinds.contains(&kind)
    }

    fn marks_in(&self, range: Range<usize>, kind: MarkKind) -> Vec<InlineMark> {
        self.marks
            .iter()
            .filter(|m| m.kind == kind && m.range.start < range.end && m.range.end > range.start)
            .map(|m| {
                let start = m.range.start.max(range.start);
                let end = m.range.end.min(range.end);
                InlineMark::new(kind, start..end, m.value.clone())
            })
            .collect()
    }

    fn apply_marks(&mut self, tx: MarkTransaction) -> Result<(), EngineError> {
        self.ensure_live()?;
        // Validate everything up front so a bad op leaves no partial state.
        for op in &tx.ops {
            match op {
                MarkOp::Remove { kind, range } => {
                    self.check_kind(*kind)?;
                    self.check_range(range)?;
                }
                MarkOp::Add(mark) => {
                    self.check_kind(mark.kind)?;
                    self.check_range(&mark.range)?;
                }
            }
        }

        let before = self.marks.clone();
        for op in tx.ops.clone() {
            match op {
                MarkOp::Remove { kind, range } => remove_kind_over(&mut self.marks, kind, &range),
                MarkOp::Add(mark) => {
                    remove_kind_over(&mut self.marks, mark.kind, &mark.range);
                    if !mark.range.is_empty() {
                        self.marks.push(mark);
                    }
                }
            }
        }
        sort_marks(&mut self.marks);

        if self.marks == before {
            return Ok(());
        }

        if tx.add_to_history {
            let joined = tx.origin == ChangeOrigin::Reconcile
                && self.history.join_marks(self.marks.clone());
            if !joined {
                self.history.record(HistoryStep {
                    text: None,
                    marks_before: before,
                    marks_after: self.marks.clone(),
                    selection_before: self.selection,
                    selection_after: self.selection,
                });
            }
        }
        let span = tx
            .ops
            .iter()
            .map(|op| match op {
                MarkOp::Remove { range, .. } => range.clone(),
                MarkOp::Add(mark) => mark.range.clone(),
            })
            .reduce(|a, b| a.start.min(b.start)..a.end.max(b.end))
            .map(|r| ChangeSpan::new(r.start, r.end));
        self.push_change(tx.origin, span);
        Ok(())
    }

    fn replace_text(
        &mut self,
        range: Range<usize>,
        text: &str,
        options: ReplaceOptions,
    ) -> Result<(), EngineError> {
        self.ensure_live()?;
        self.check_range(&range)?;
        if range.is_empty() && text.is_empty() {
            return Ok(());
        }

        let deleted = self.buffer.slice(range.clone()).unwrap_or_default();
        let marks_before = self.marks.clone();
        let selection_before = self.selection;

        self.buffer.replace(range.clone(), text);
        let inserted = text.chars().count();
        self.map_marks(range.start, range.end, inserted);
        self.selection = Selection::collapsed(range.start + inserted);

        self.history.record(HistoryStep {
            text: Some(TextEdit {
                pos: range.start,
                deleted,
                inserted: SmolStr::new(text),
            }),
            marks_before,
            marks_after: self.marks.clone(),
            selection_before,
            selection_after: self.selection,
        });

        if !options.suppress_notification {
            let span = ChangeSpan::new(range.start, range.start + inserted);
            self.push_change(options.origin, Some(span));
        }
        Ok(())
    }

    fn set_caret(&mut self, offset: usize) -> Result<(), EngineError> {
        self.set_selection(Selection::collapsed(offset))
    }

    fn focus(&mut self) {
        if self.destroyed || self.focused {
            return;
        }
        self.focused = true;
        self.events.push_back(EngineEvent::Focus);
    }
}

impl<T: TextBuffer> UndoManager for MemoryEngine<T> {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(step) = self.history.take_undo() else {
            return false;
        };

        // Apply inverse: remove what was inserted, restore what was deleted
        let span = step.text.as_ref().map(|edit| {
            let inserted = edit.inserted.chars().count();
            self.buffer.replace(edit.pos..edit.pos + inserted, &edit.deleted);
            ChangeSpan::new(edit.pos, edit.pos + edit.deleted.chars().count())
        });
        self.marks = step.marks_before;
        self.selection = step.selection_before;
        self.push_change(ChangeOrigin::User, span);
        true
    }

    fn redo(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(step) = self.history.take_redo() else {
            return false;
        };

        let span = step.text.as_ref().map(|edit| {
            let deleted = edit.deleted.chars().count();
            self.buffer.replace(edit.pos..edit.pos + deleted, &edit.inserted);
            ChangeSpan::new(edit.pos, edit.pos + edit.inserted.chars().count())
        });
        self.marks = step.marks_after;
        self.selection = step.selection_after;
        self.push_change(ChangeOrigin::User, span);
        true
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}
