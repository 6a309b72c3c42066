//! Inline marks and the paragraph mark reconciler.
//!
//! Mention and hashtag marks are recomputed from scratch for the paragraph under
//! the caret: every mark of the kind is cleared and one mark per scanned token is
//! re-added, all inside one transaction. When the desired marks already match
//! what the engine holds, no transaction is produced at all.

use std::ops::Range;

use smol_str::SmolStr;

use crate::engine::{ChangeOrigin, DocumentEngine};
use crate::error::EngineError;
use crate::paragraph::ParagraphText;
use crate::scanner::{Token, scan};
use crate::types::MarkKind;

/// An inline mark over a document char range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InlineMark {
    pub kind: MarkKind,
    pub range: Range<usize>,
    /// Handle (mentions) or tag (hashtags), without the trigger character.
    pub value: SmolStr,
}

impl InlineMark {
    pub fn new(kind: MarkKind, range: Range<usize>, value: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            range,
            value: value.into(),
        }
    }

    pub fn covers(&self, offset: usize) -> bool {
        self.range.contains(&offset)
    }

    fn sort_key(&self) -> (usize, usize, MarkKind) {
        (self.range.start, self.range.end, self.kind)
    }
}

/// One step of a mark transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOp {
    /// Clear every mark of `kind` over `range`, splitting marks that stick out.
    Remove { kind: MarkKind, range: Range<usize> },
    /// Add a mark; overlapping marks of the same kind are replaced.
    Add(InlineMark),
}

/// A batch of mark operations the engine applies atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkTransaction {
    pub ops: Vec<MarkOp>,
    pub origin: ChangeOrigin,
    /// Whether the engine should record the change in undo history.
    pub add_to_history: bool,
}

impl MarkTransaction {
    pub fn new(origin: ChangeOrigin) -> Self {
        Self {
            ops: Vec::new(),
            origin,
            add_to_history: true,
        }
    }

    pub fn remove(mut self, kind: MarkKind, range: Range<usize>) -> Self {
        self.ops.push(MarkOp::Remove { kind, range });
        self
    }

    pub fn add(mut self, mark: InlineMark) -> Self {
        self.ops.push(MarkOp::Add(mark));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Marks the scanned tokens should produce, in document coordinates.
pub fn desired_marks(
    paragraph: &ParagraphText,
    tokens: &[Token],
    kind: MarkKind,
) -> Vec<InlineMark> {
    tokens
        .iter()
        .map(|token| {
            InlineMark::new(
                kind,
                paragraph.to_document(token.start..token.end),
                token.identifier.clone(),
            )
        })
        .collect()
}

/// Compute the transaction that brings `current` marks of `kind` in line with
/// `tokens`.
///
/// Returns `None` when nothing would change, including the case of no tokens
/// and no existing marks.
pub fn reconcile(
    paragraph: &ParagraphText,
    tokens: &[Token],
    current: &[InlineMark],
    kind: MarkKind,
) -> Option<MarkTransaction> {
    let mut desired = desired_marks(paragraph, tokens, kind);
    let mut existing: Vec<InlineMark> = current
        .iter()
        .filter(|m| m.kind == kind)
        .cloned()
        .collect();

    desired.sort_by_key(InlineMark::sort_key);
    existing.sort_by_key(InlineMark::sort_key);
    if desired == existing {
        return None;
    }

    let mut tx = MarkTransaction::new(ChangeOrigin::Reconcile).remove(kind, paragraph.range());
    for mark in desired {
        tx = tx.add(mark);
    }
    Some(tx)
}

/// Scan a paragraph and reconcile one mark kind against the engine.
///
/// Returns the number of operations applied. A mark kind the engine does not
/// know is skipped silently.
pub fn reconcile_paragraph<E: DocumentEngine + ?Sized>(
    engine: &mut E,
    paragraph: &ParagraphText,
    trigger: char,
    kind: MarkKind,
) -> Result<usize, EngineError> {
    if !engine.has_mark_kind(kind) {
        tracing::trace!(target: "scribe::reconcile", %kind, "mark kind not registered, skipping");
        return Ok(0);
    }

    let tokens = scan(&paragraph.text, trigger);
    let current = engine.marks_in(paragraph.range(), kind);
    let Some(tx) = reconcile(paragraph, &tokens, &current, kind) else {
        return Ok(0);
    };

    let applied = tx.len();
    tracing::trace!(
        target: "scribe::reconcile",
        %kind,
        paragraph = ?paragraph.range(),
        tokens = tokens.len(),
        stale = current.len(),
        "reconciling marks"
    );
    engine.apply_marks(tx)?;
    Ok(applied)
}
