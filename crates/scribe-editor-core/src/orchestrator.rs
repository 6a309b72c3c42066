//! The update orchestrator: glue between engine notifications, the reconciler
//! and the suggestion controllers.
//!
//! For every document change it reconciles mention and hashtag marks in the
//! caret's paragraph, then feeds the new caret context to each controller and
//! refreshes overlay anchors. Reconciliation always finishes before any
//! controller sees the change.

use std::rc::Rc;

use crate::click::MarkClickHandlers;
use crate::config::EditorConfig;
use crate::document::MemoryEngine;
use crate::engine::{ChangeOrigin, ChangeSpan, DocumentEngine, EngineEvent, ReplaceOptions};
use crate::error::{ConfigError, EngineError};
use crate::keys::{KeyResult, SuggestionKey};
use crate::marks::reconcile_paragraph;
use crate::overlay::{OverlayRenderer, OverlayView, PointerResult, SuggestionOverlay};
use crate::paragraph::ParagraphText;
use crate::plugin::PluginRegistry;
use crate::suggestion::{Scheduler, SuggestionController, SuggestionSource};
use crate::text::TextBuffer;
use crate::types::TriggerKind;

/// Renderer used when the host does not draw overlays.
struct NoopRenderer;

impl OverlayRenderer for NoopRenderer {
    fn render(&self, _kind: TriggerKind, _view: Option<&OverlayView>) {}
}

struct TriggerSlot {
    kind: TriggerKind,
    controller: SuggestionController,
    overlay: SuggestionOverlay,
}

/// Builder for `UpdateOrchestrator`.
pub struct OrchestratorBuilder {
    config: EditorConfig,
    scheduler: Rc<dyn Scheduler>,
    sources: Vec<(TriggerKind, Rc<dyn SuggestionSource>)>,
    renderer: Option<Rc<dyn OverlayRenderer>>,
    registry: PluginRegistry,
    clicks: MarkClickHandlers,
    editable: bool,
}

impl OrchestratorBuilder {
    /// Start with default configuration, built-in plugins, no sources and
    /// an editable document.
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            config: EditorConfig::default(),
            scheduler,
            sources: Vec::new(),
            renderer: None,
            registry: PluginRegistry::with_builtins(),
            clicks: MarkClickHandlers::default(),
            editable: true,
        }
    }

    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    /// Suggestion source for a trigger kind. Kinds without a source are
    /// highlighted but never suggest.
    pub fn source(mut self, kind: TriggerKind, source: Rc<dyn SuggestionSource>) -> Self {
        self.sources.retain(|(k, _)| *k != kind);
        self.sources.push((kind, source));
        self
    }

    pub fn renderer(mut self, renderer: Rc<dyn OverlayRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn click_handlers(mut self, clicks: MarkClickHandlers) -> Self {
        self.clicks = clicks;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Validate the configuration and wire everything to `engine`.
    pub fn build<E: DocumentEngine>(self, engine: E) -> Result<UpdateOrchestrator<E>, ConfigError> {
        self.config.validate()?;
        let renderer = self.renderer.unwrap_or_else(|| Rc::new(NoopRenderer));

        let slots = TriggerKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let (_, source) = self.sources.iter().find(|(k, _)| *k == kind)?;
                let controller = SuggestionController::new(
                    kind,
                    self.config.suggestion(kind).clone(),
                    source.clone(),
                    self.scheduler.clone(),
                );
                let overlay = SuggestionOverlay::new(
                    controller.clone(),
                    renderer.clone(),
                    self.config.overlay.clone(),
                );
                Some(TriggerSlot {
                    kind,
                    controller,
                    overlay,
                })
            })
            .collect();

        Ok(UpdateOrchestrator {
            engine,
            config: self.config,
            registry: self.registry,
            slots,
            clicks: self.clicks,
            editable: self.editable,
            destroyed: false,
        })
    }
}

/// Per-editor coordinator of reconciliation and suggestions.
pub struct UpdateOrchestrator<E: DocumentEngine> {
    engine: E,
    config: EditorConfig,
    registry: PluginRegistry,
    slots: Vec<TriggerSlot>,
    clicks: MarkClickHandlers,
    editable: bool,
    destroyed: bool,
}

impl<E: DocumentEngine> UpdateOrchestrator<E> {
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access. Changes made here are only seen by the
    /// orchestrator through `handle_event`.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Mutable registry access. Call `handle_selection_changed` afterwards so
    /// disabled kinds close their popups.
    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn controller(&self, kind: TriggerKind) -> Option<&SuggestionController> {
        self.slot(kind).map(|slot| &slot.controller)
    }

    pub fn overlay(&self, kind: TriggerKind) -> Option<&SuggestionOverlay> {
        self.slot(kind).map(|slot| &slot.overlay)
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
        if !editable {
            self.reset_all();
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn set_click_handlers(&mut self, clicks: MarkClickHandlers) {
        self.clicks = clicks;
    }

    fn slot(&self, kind: TriggerKind) -> Option<&TriggerSlot> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }

    /// Route one engine notification.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::DocumentChanged { origin, span } => {
                self.handle_document_changed(origin, span)
            }
            EngineEvent::SelectionChanged => self.handle_selection_changed(),
            EngineEvent::Blur => self.handle_blur(),
            EngineEvent::Focus => {}
        }
    }

    /// A document mutation landed. Every paragraph `span` touches is
    /// reconciled; without a span the whole document is. Our own
    /// reconciliation transactions are ignored so they never loop.
    pub fn handle_document_changed(&mut self, origin: ChangeOrigin, span: Option<ChangeSpan>) {
        if self.destroyed || origin == ChangeOrigin::Reconcile {
            return;
        }
        tracing::trace!(target: "scribe::engine", ?origin, ?span, "document changed");
        match span {
            Some(span) => {
                for paragraph in self.paragraphs_in(span) {
                    self.reconcile_marks_in(&paragraph);
                }
            }
            None => {
                if let Err(err) = self.reconcile_document() {
                    tracing::warn!(target: "scribe::reconcile", %err, "document reconciliation failed");
                }
            }
        }
        self.refresh_contexts();
    }

    /// The caret moved without a text change.
    pub fn handle_selection_changed(&mut self) {
        if self.destroyed {
            return;
        }
        self.refresh_contexts();
    }

    pub fn handle_blur(&mut self) {
        if self.destroyed {
            return;
        }
        tracing::trace!(target: "scribe::engine", "editor blurred");
        self.reset_all();
    }

    /// Key press from the editor. The first visible popup gets it.
    pub fn handle_key(&mut self, key: SuggestionKey) -> KeyResult {
        if self.destroyed {
            return KeyResult::PassThrough;
        }
        for slot in &self.slots {
            if slot.controller.is_visible() {
                return slot.controller.handle_key(key, &mut self.engine);
            }
        }
        KeyResult::PassThrough
    }

    pub fn overlay_pointer_down(&self, kind: TriggerKind, index: usize) -> PointerResult {
        match self.slot(kind) {
            Some(slot) if !self.destroyed => slot.overlay.on_pointer_down(index),
            _ => PointerResult::Ignore,
        }
    }

    pub fn overlay_hover(&self, kind: TriggerKind, index: usize) -> bool {
        match self.slot(kind) {
            Some(slot) if !self.destroyed => slot.overlay.on_pointer_enter(index),
            _ => false,
        }
    }

    pub fn overlay_click(&mut self, kind: TriggerKind, index: usize) -> bool {
        if self.destroyed {
            return false;
        }
        let Some(slot) = self.slots.iter().find(|slot| slot.kind == kind) else {
            return false;
        };
        slot.overlay.on_click(index, &mut self.engine)
    }

    /// Replace the whole document without a change notification, then
    /// reconcile every paragraph.
    pub fn set_content(&mut self, text: &str) -> Result<usize, EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        self.reset_all();
        let len = self.engine.len_chars();
        self.engine
            .replace_text(0..len, text, ReplaceOptions::silent(ChangeOrigin::Programmatic))?;
        self.reconcile_document()
    }

    /// Reconcile marks in every paragraph. Returns the number of mark
    /// operations applied.
    pub fn reconcile_document(&mut self) -> Result<usize, EngineError> {
        let mut applied = 0;
        for paragraph in self.engine.paragraphs() {
            for kind in TriggerKind::ALL {
                let mark = kind.mark_kind();
                if !self.registry.is_mark_enabled(mark) {
                    continue;
                }
                let trigger = self.config.trigger_char(kind);
                applied += reconcile_paragraph(&mut self.engine, &paragraph, trigger, mark)?;
            }
        }
        tracing::debug!(target: "scribe::reconcile", applied, "reconciled document");
        Ok(applied)
    }

    /// Click at a document offset. In read mode, clicks on marks reach the
    /// host's handlers.
    pub fn handle_click(&self, offset: usize) -> bool {
        !self.destroyed && self.clicks.dispatch(&self.engine, offset, self.editable)
    }

    /// Tear down controllers and overlays. Later events are ignored.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for slot in &mut self.slots {
            slot.overlay.destroy();
            slot.controller.destroy();
        }
        tracing::debug!(target: "scribe::engine", "orchestrator destroyed");
    }

    /// Paragraphs from the one holding `span.from` through the one holding
    /// `span.to`.
    fn paragraphs_in(&self, span: ChangeSpan) -> Vec<ParagraphText> {
        let mut found = Vec::new();
        let mut offset = span.from;
        while let Some(paragraph) = self.engine.paragraph_at(offset) {
            let end = paragraph.end();
            found.push(paragraph);
            if end >= span.to {
                break;
            }
            offset = end + 1;
        }
        found
    }

    fn reconcile_marks_in(&mut self, paragraph: &ParagraphText) {
        for kind in TriggerKind::ALL {
            let mark = kind.mark_kind();
            if !self.registry.is_mark_enabled(mark) {
                continue;
            }
            let trigger = self.config.trigger_char(kind);
            if let Err(err) = reconcile_paragraph(&mut self.engine, paragraph, trigger, mark) {
                tracing::warn!(target: "scribe::reconcile", %kind, %err, "mark reconciliation failed");
            }
        }
    }

    fn refresh_contexts(&mut self) {
        for slot in &self.slots {
            if self.editable && self.registry.is_trigger_enabled(slot.kind) {
                slot.controller.evaluate(&self.engine);
            } else {
                slot.controller.reset();
            }
            slot.overlay.update_anchor(&self.engine);
        }
    }

    fn reset_all(&self) {
        for slot in &self.slots {
            slot.controller.reset();
        }
    }
}

impl<T: TextBuffer> UpdateOrchestrator<MemoryEngine<T>> {
    /// Drain the memory engine's queued notifications and handle them,
    /// including any raised while handling. Returns how many were handled.
    pub fn flush_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let events = self.engine.drain_events();
            if events.is_empty() {
                return handled;
            }
            for event in events {
                self.handle_event(event);
                handled += 1;
            }
        }
    }
}
