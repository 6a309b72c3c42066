//! Suggestion overlay: positions and renders a controller's list.
//!
//! The overlay holds no list state of its own. It subscribes to its
//! controller, projects the state onto an `OverlayView` anchored below the
//! trigger character, and hands that to the host's `OverlayRenderer`. The
//! anchor is refreshed by the orchestrator after each change, so a fetch
//! resolving later re-renders without touching the engine.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::config::OverlayConfig;
use crate::engine::DocumentEngine;
use crate::suggestion::{Item, ListenerId, SuggestionController, SuggestionState};
use crate::types::{CursorRect, TriggerKind};

/// Top-left corner of the list, relative to the editor container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayPosition {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayRow {
    pub item: Item,
    pub selected: bool,
}

/// Everything a renderer needs to draw the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    pub trigger: TriggerKind,
    pub position: OverlayPosition,
    pub rows: Vec<OverlayRow>,
}

/// Host-side drawing of the overlay. `None` hides it.
pub trait OverlayRenderer {
    fn render(&self, kind: TriggerKind, view: Option<&OverlayView>);
}

/// What the host should do with a pointer event on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerResult {
    /// Prevent the default action so the editor keeps focus.
    PreventDefault,
    Ignore,
}

struct Shared {
    kind: TriggerKind,
    config: OverlayConfig,
    max_rows: usize,
    renderer: Rc<dyn OverlayRenderer>,
    anchor: Option<CursorRect>,
    view: Option<OverlayView>,
}

impl Shared {
    fn project(&self, state: &SuggestionState) -> Option<OverlayView> {
        if !state.visible {
            return None;
        }
        let anchor = self.anchor?;
        let rows = state
            .items
            .iter()
            .take(self.max_rows)
            .enumerate()
            .map(|(i, item)| OverlayRow {
                item: item.clone(),
                selected: i == state.selected_index,
            })
            .collect();
        Some(OverlayView {
            trigger: self.kind,
            position: OverlayPosition {
                left: anchor.x,
                top: anchor.bottom() + self.config.offset_y,
            },
            rows,
        })
    }
}

/// Re-project and render if the view changed. The renderer runs with no
/// borrow held.
fn refresh(shared: &RefCell<Shared>, state: &SuggestionState) {
    let render = {
        let mut shared = shared.borrow_mut();
        let view = shared.project(state);
        if view == shared.view {
            None
        } else {
            shared.view = view.clone();
            Some((shared.renderer.clone(), shared.kind, view))
        }
    };
    if let Some((renderer, kind, view)) = render {
        tracing::trace!(target: "scribe::overlay", %kind, shown = view.is_some(), "render");
        renderer.render(kind, view.as_ref());
    }
}

/// Floating suggestion list for one trigger kind.
pub struct SuggestionOverlay {
    controller: SuggestionController,
    shared: Rc<RefCell<Shared>>,
    listener: Option<ListenerId>,
}

impl SuggestionOverlay {
    pub fn new(
        controller: SuggestionController,
        renderer: Rc<dyn OverlayRenderer>,
        config: OverlayConfig,
    ) -> Self {
        let shared = Rc::new(RefCell::new(Shared {
            kind: controller.kind(),
            config,
            max_rows: controller.config().max_suggestions,
            renderer,
            anchor: None,
            view: None,
        }));

        let weak: Weak<RefCell<Shared>> = Rc::downgrade(&shared);
        let listener = controller.subscribe(move |state| {
            if let Some(shared) = weak.upgrade() {
                refresh(&shared, state);
            }
        });

        Self {
            controller,
            shared,
            listener: Some(listener),
        }
    }

    pub fn kind(&self) -> TriggerKind {
        self.shared.borrow().kind
    }

    /// The view currently on screen.
    pub fn view(&self) -> Option<OverlayView> {
        self.shared.borrow().view.clone()
    }

    pub fn anchor(&self) -> Option<CursorRect> {
        self.shared.borrow().anchor
    }

    pub fn is_visible(&self) -> bool {
        self.shared.borrow().view.is_some()
    }

    /// Re-query the anchor rectangle at the trigger position.
    pub fn update_anchor<E: DocumentEngine + ?Sized>(&self, engine: &E) {
        if self.listener.is_none() {
            return;
        }
        let anchor = self
            .controller
            .active_range()
            .and_then(|range| engine.coords_at(range.from));
        self.shared.borrow_mut().anchor = anchor;
        refresh(&self.shared, &self.controller.state());
    }

    /// Mouse-down on a row: keep editor focus.
    pub fn on_pointer_down(&self, index: usize) -> PointerResult {
        match &self.shared.borrow().view {
            Some(view) if index < view.rows.len() => PointerResult::PreventDefault,
            _ => PointerResult::Ignore,
        }
    }

    /// Hover highlights the row.
    pub fn on_pointer_enter(&self, index: usize) -> bool {
        self.controller.select_index(index)
    }

    /// Click commits the row through the controller.
    pub fn on_click<E: DocumentEngine + ?Sized>(&self, index: usize, engine: &mut E) -> bool {
        if !self.is_visible() {
            return false;
        }
        self.controller.commit_index(index, engine)
    }

    /// Hide and stop observing the controller.
    pub fn destroy(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        self.controller.unsubscribe(listener);
        let hidden = SuggestionState::default();
        refresh(&self.shared, &hidden);
        self.shared.borrow_mut().anchor = None;
    }
}

impl Drop for SuggestionOverlay {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.controller.unsubscribe(listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::document::MemoryEngine;
    use crate::suggestion::{SuggestionConfig, TriggerMatch};
    use crate::testing::{ManualScheduler, RecordingRenderer, ScriptedSource};
    use crate::types::CaretRange;

    struct Fixture {
        controller: SuggestionController,
        overlay: SuggestionOverlay,
        scheduler: Rc<ManualScheduler>,
        source: Rc<ScriptedSource>,
        renderer: Rc<RecordingRenderer>,
    }

    fn fixture(max_suggestions: usize) -> Fixture {
        let scheduler = Rc::new(ManualScheduler::new());
        let source = Rc::new(ScriptedSource::new());
        let renderer = Rc::new(RecordingRenderer::default());
        let controller = SuggestionController::new(
            TriggerKind::Mention,
            SuggestionConfig {
                max_suggestions,
                ..Default::default()
            },
            source.clone(),
            scheduler.clone(),
        );
        let overlay = SuggestionOverlay::new(
            controller.clone(),
            renderer.clone(),
            OverlayConfig::default(),
        );
        Fixture {
            controller,
            overlay,
            scheduler,
            source,
            renderer,
        }
    }

    fn show(f: &Fixture, engine: &MemoryEngine, handles: &[&str]) {
        f.controller.update_context(Some(TriggerMatch {
            range: CaretRange::new(4, 7),
            query: "jo".into(),
        }));
        f.overlay.update_anchor(engine);
        f.scheduler.advance(Duration::from_millis(300));
        f.source
            .resolve("jo", handles.iter().copied().map(Item::new).collect());
        f.scheduler.run_until_stalled();
    }

    #[test]
    fn test_positioned_below_trigger() {
        let f = fixture(10);
        let engine = MemoryEngine::new("Hey @jo");
        show(&f, &engine, &["joan", "john"]);

        let view = f.overlay.view().unwrap();
        // Grid: 12px padding, 8px per char, 20px lines, 4px offset.
        assert_eq!(view.position, OverlayPosition { left: 44.0, top: 36.0 });
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows[0].selected);
        assert!(!view.rows[1].selected);
        assert_eq!(f.renderer.render_count(), 1);
    }

    #[test]
    fn test_rows_capped_and_selection_follows() {
        let f = fixture(2);
        let mut engine = MemoryEngine::new("Hey @jo");
        show(&f, &engine, &["a", "b", "c"]);
        assert_eq!(f.overlay.view().unwrap().rows.len(), 2);

        assert!(f.overlay.on_pointer_enter(1));
        assert!(f.overlay.view().unwrap().rows[1].selected);
        assert!(!f.overlay.on_pointer_enter(2));

        assert_eq!(f.overlay.on_pointer_down(1), PointerResult::PreventDefault);
        assert_eq!(f.overlay.on_pointer_down(2), PointerResult::Ignore);

        assert!(f.overlay.on_click(1, &mut engine));
        assert_eq!(engine.content(), "Hey @b ");
        assert!(f.overlay.view().is_none());
        assert_eq!(f.renderer.last(), Some((TriggerKind::Mention, None)));
    }

    #[test]
    fn test_hidden_without_anchor() {
        let f = fixture(10);
        let engine = MemoryEngine::new("");
        show(&f, &engine, &["joan"]);
        assert!(f.controller.is_visible());
        assert!(f.overlay.view().is_none());
        assert_eq!(f.renderer.render_count(), 0);
    }

    #[test]
    fn test_destroy_hides_and_detaches() {
        let mut f = fixture(10);
        let engine = MemoryEngine::new("Hey @jo");
        show(&f, &engine, &["joan"]);
        f.overlay.destroy();
        assert!(f.overlay.view().is_none());

        let renders = f.renderer.render_count();
        f.controller.select_index(0);
        f.controller.reset();
        assert_eq!(f.renderer.render_count(), renders);
        assert_eq!(f.overlay.on_pointer_down(0), PointerResult::Ignore);
    }
}
