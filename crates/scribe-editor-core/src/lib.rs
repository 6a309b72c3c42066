//! scribe-editor-core: live mention/hashtag highlighting and suggestions,
//! without framework dependencies.
//!
//! This crate provides:
//! - `scan` - token scanner for `@handle` and `#tag` spans
//! - `reconcile` / `reconcile_paragraph` - minimal mark transactions per paragraph
//! - `SuggestionController` - debounced, cancellable suggestion state machine
//! - `SuggestionOverlay` - caret-anchored list projection for a host renderer
//! - `UpdateOrchestrator` - per-change glue over a `DocumentEngine`
//! - `MemoryEngine<T>` - in-memory engine with undo, generic over `TextBuffer`

pub mod click;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod keys;
pub mod marks;
pub mod orchestrator;
pub mod overlay;
pub mod paragraph;
pub mod plugin;
pub mod scanner;
pub mod suggestion;
pub mod text;
pub mod types;
pub mod undo;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use click::MarkClickHandlers;
pub use config::{EditorConfig, OverlayConfig};
pub use document::{GridMetrics, MemoryEngine};
pub use engine::{ChangeOrigin, ChangeSpan, DocumentEngine, EngineEvent, ReplaceOptions};
pub use error::{ConfigError, EngineError, PluginError, SourceError};
pub use keys::{KeyResult, Modifiers, SuggestionKey};
pub use marks::{InlineMark, MarkOp, MarkTransaction, reconcile, reconcile_paragraph};
pub use orchestrator::{OrchestratorBuilder, UpdateOrchestrator};
pub use overlay::{
    OverlayPosition, OverlayRenderer, OverlayRow, OverlayView, PointerResult, SuggestionOverlay,
};
pub use paragraph::ParagraphText;
pub use plugin::{Capabilities, Plugin, PluginRegistry};
pub use scanner::{Token, scan};
pub use smol_str::SmolStr;
pub use suggestion::{
    Item, ListenerId, Scheduler, StaticSource, SuggestionConfig, SuggestionController,
    SuggestionFuture, SuggestionPhase, SuggestionSource, SuggestionState, TimerId, TriggerMatch,
};
pub use text::{EditorRope, TextBuffer};
pub use types::{CaretRange, CursorRect, MarkKind, Selection, TriggerKind};
pub use undo::UndoManager;
