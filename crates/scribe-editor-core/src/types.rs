//! Core editor types: trigger and mark kinds, selection, caret ranges, screen rects.
//!
//! These types are framework-agnostic and shared by every component that talks
//! to a document engine.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// The two kinds of live token the editor highlights and suggests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    Mention,
    Hashtag,
}

impl TriggerKind {
    /// Every trigger kind, in the order the orchestrator processes them.
    pub const ALL: [TriggerKind; 2] = [TriggerKind::Mention, TriggerKind::Hashtag];

    /// The trigger character used when configuration does not override it.
    pub fn default_char(self) -> char {
        match self {
            TriggerKind::Mention => '@',
            TriggerKind::Hashtag => '#',
        }
    }

    /// The inline mark this trigger kind produces.
    pub fn mark_kind(self) -> MarkKind {
        match self {
            TriggerKind::Mention => MarkKind::Mention,
            TriggerKind::Hashtag => MarkKind::Hashtag,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mark_kind().name())
    }
}

/// Engine-level inline mark types owned by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Mention,
    Hashtag,
}

impl MarkKind {
    pub const ALL: [MarkKind; 2] = [MarkKind::Mention, MarkKind::Hashtag];

    /// Schema name of the mark in the document engine.
    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Mention => "mention",
            MarkKind::Hashtag => "hashtag",
        }
    }

    /// Look up a mark kind by its schema name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mention" => Some(MarkKind::Mention),
            "hashtag" => Some(MarkKind::Hashtag),
            _ => None,
        }
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Editor selection. `head` is the caret end; `anchor` may sit on either side.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn collapsed(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Ordered char range, whichever way the selection was made.
    pub fn to_range(&self) -> Range<usize> {
        self.anchor.min(self.head)..self.anchor.max(self.head)
    }
}

/// Document range covered by the token being typed: from the trigger
/// character through the end of its identifier. Offsets are document char
/// offsets.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaretRange {
    pub from: usize,
    pub to: usize,
}

impl CaretRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_range(&self) -> Range<usize> {
        self.from..self.to
    }
}

impl From<Range<usize>> for CaretRange {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<CaretRange> for Range<usize> {
    fn from(r: CaretRange) -> Self {
        r.from..r.to
    }
}

/// Caret rectangle for positioning floating UI next to the cursor.
///
/// Coordinates are relative to the editor container unless stated otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct CursorRect {
    pub x: f64,
    pub y: f64,
    pub height: f64,
}

impl CursorRect {
    pub fn new(x: f64, y: f64, height: f64) -> Self {
        Self { x, y, height }
    }

    /// Y coordinate of the bottom edge of the caret line.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}
