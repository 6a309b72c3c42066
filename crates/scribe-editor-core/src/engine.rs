//! The document engine seam.
//!
//! The rich-text engine (document model, schema, transactions, undo, DOM
//! projection) lives outside this crate. Everything here talks to it through
//! `DocumentEngine`, so the same logic drives a ProseMirror instance in the
//! browser and `MemoryEngine` in tests.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::marks::{InlineMark, MarkTransaction};
use crate::paragraph::ParagraphText;
use crate::types::{CursorRect, MarkKind, Selection};

/// Who caused a document change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeOrigin {
    /// Typing, paste, undo: anything the user did.
    #[default]
    User,
    /// Content set by the host application.
    Programmatic,
    /// Mark reconciliation issued by this crate.
    Reconcile,
    /// A committed suggestion.
    Suggestion,
}

/// Char range a change touched, in offsets after the change. A pure deletion
/// is the empty span where the text used to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSpan {
    pub from: usize,
    pub to: usize,
}

impl ChangeSpan {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
        }
    }
}

/// Notifications an engine delivers after a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// `span` is None when the engine cannot tell what moved; listeners
    /// then treat the whole document as changed.
    DocumentChanged {
        origin: ChangeOrigin,
        span: Option<ChangeSpan>,
    },
    SelectionChanged,
    Focus,
    Blur,
}

/// Options for literal text replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceOptions {
    pub origin: ChangeOrigin,
    /// Skip the change notification (programmatic content resets).
    pub suppress_notification: bool,
}

impl ReplaceOptions {
    pub fn from_origin(origin: ChangeOrigin) -> Self {
        Self {
            origin,
            suppress_notification: false,
        }
    }

    pub fn silent(origin: ChangeOrigin) -> Self {
        Self {
            origin,
            suppress_notification: true,
        }
    }
}

/// Interface to the external rich-text document engine.
///
/// All offsets are document char offsets. Mutations go through atomic
/// operations only; implementations must not call back into the caller
/// while one of these methods runs.
pub trait DocumentEngine {
    // === Required: queries ===

    /// Current selection, or None if the editor has no selection.
    fn selection(&self) -> Option<Selection>;

    /// The paragraph containing a document offset.
    fn paragraph_at(&self, offset: usize) -> Option<ParagraphText>;

    /// Every paragraph in document order.
    fn paragraphs(&self) -> Vec<ParagraphText>;

    /// Document length in chars, counting paragraph separators.
    fn len_chars(&self) -> usize;

    /// Caret rectangle for an offset, relative to the editor container.
    fn coords_at(&self, offset: usize) -> Option<CursorRect>;

    /// Whether the schema knows this mark kind.
    fn has_mark_kind(&self, kind: MarkKind) -> bool;

    /// Marks of a kind intersecting `range`, clipped to it.
    fn marks_in(&self, range: Range<usize>, kind: MarkKind) -> Vec<InlineMark>;

    // === Required: mutations ===

    /// Apply a mark transaction atomically.
    fn apply_marks(&mut self, tx: MarkTransaction) -> Result<(), EngineError>;

    /// Replace a range with literal text. The caret ends after the inserted text.
    fn replace_text(
        &mut self,
        range: Range<usize>,
        text: &str,
        options: ReplaceOptions,
    ) -> Result<(), EngineError>;

    /// Collapse the selection at an offset.
    fn set_caret(&mut self, offset: usize) -> Result<(), EngineError>;

    /// Give the editor keyboard focus.
    fn focus(&mut self);

    // === Provided ===

    /// Caret offset when the selection is collapsed.
    fn caret(&self) -> Option<usize> {
        self.selection()
            .filter(Selection::is_collapsed)
            .map(|sel| sel.head)
    }

    /// Paragraph holding the selection head.
    fn caret_paragraph(&self) -> Option<ParagraphText> {
        let sel = self.selection()?;
        self.paragraph_at(sel.head)
    }

    /// First mention or hashtag mark covering an offset.
    fn mark_at(&self, offset: usize) -> Option<InlineMark> {
        MarkKind::ALL
            .into_iter()
            .filter(|kind| self.has_mark_kind(*kind))
            .flat_map(|kind| self.marks_in(offset..offset + 1, kind))
            .find(|mark| mark.covers(offset))
    }
}
