//! The suggestion controller state machine.
//!
//! One controller per trigger kind. It watches the caret context handed to it
//! by the orchestrator, debounces fetches through the `Scheduler`, and keeps
//! a navigable list that observers (the overlay) render.
//!
//! Every scheduled timer and in-flight fetch carries the generation it was
//! issued under. Any re-evaluation, reset or teardown bumps the generation,
//! so a late timer or a superseded result finds a mismatch and does nothing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use web_time::Instant;

use super::config::SuggestionConfig;
use super::context::{TriggerMatch, find_trigger_context};
use super::scheduler::{Scheduler, TimerId};
use super::source::SuggestionSource;
use super::state::{Item, SuggestionPhase, SuggestionState};
use crate::engine::{ChangeOrigin, DocumentEngine, ReplaceOptions};
use crate::error::SourceError;
use crate::keys::{KeyResult, SuggestionKey};
use crate::types::{CaretRange, TriggerKind};

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&SuggestionState)>;

struct Inner {
    kind: TriggerKind,
    trigger: char,
    config: SuggestionConfig,
    source: Rc<dyn SuggestionSource>,
    scheduler: Rc<dyn Scheduler>,
    state: SuggestionState,
    phase: SuggestionPhase,
    active: Option<TriggerMatch>,
    /// Trigger position the user dismissed with Escape.
    dismissed_at: Option<usize>,
    generation: u64,
    timer: Option<TimerId>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    destroyed: bool,
}

impl Inner {
    /// Number of rows that can be navigated.
    fn visible_len(&self) -> usize {
        self.state.items.len().min(self.config.max_suggestions)
    }

    /// Invalidate the pending timer and any in-flight fetch.
    fn invalidate(&mut self) -> Option<TimerId> {
        self.generation += 1;
        self.timer.take()
    }

    fn hide(&mut self) {
        self.state = SuggestionState::default();
    }

    fn clear(&mut self) {
        self.active = None;
        self.state = SuggestionState::default();
        self.phase = SuggestionPhase::Idle;
    }
}

/// Work to do against the scheduler once the state borrow is released.
#[derive(Default)]
struct Effects {
    cancel: Option<TimerId>,
    schedule: Option<(Duration, u64)>,
}

/// Suggestion state machine for one trigger kind.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SuggestionController {
    inner: Rc<RefCell<Inner>>,
}

impl SuggestionController {
    pub fn new(
        kind: TriggerKind,
        config: SuggestionConfig,
        source: Rc<dyn SuggestionSource>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Self {
        let trigger = config.trigger_char(kind);
        Self {
            inner: Rc::new(RefCell::new(Inner {
                kind,
                trigger,
                config,
                source,
                scheduler,
                state: SuggestionState::default(),
                phase: SuggestionPhase::Idle,
                active: None,
                dismissed_at: None,
                generation: 0,
                timer: None,
                listeners: Vec::new(),
                next_listener: 0,
                destroyed: false,
            })),
        }
    }

    pub fn kind(&self) -> TriggerKind {
        self.inner.borrow().kind
    }

    pub fn trigger(&self) -> char {
        self.inner.borrow().trigger
    }

    pub fn config(&self) -> SuggestionConfig {
        self.inner.borrow().config.clone()
    }

    /// Snapshot of the observable state.
    pub fn state(&self) -> SuggestionState {
        self.inner.borrow().state.clone()
    }

    pub fn phase(&self) -> SuggestionPhase {
        self.inner.borrow().phase
    }

    pub fn is_visible(&self) -> bool {
        self.inner.borrow().state.visible
    }

    /// Document range of the live trigger context, if any.
    pub fn active_range(&self) -> Option<CaretRange> {
        self.inner.borrow().active.as_ref().map(|m| m.range)
    }

    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.borrow().destroyed
    }

    /// Visible rows, capped at `maxSuggestions`.
    pub fn visible_items(&self) -> Vec<Item> {
        let inner = self.inner.borrow();
        inner.state.items[..inner.visible_len()].to_vec()
    }

    /// A handle that does not keep the controller alive.
    pub fn downgrade(&self) -> WeakSuggestionController {
        WeakSuggestionController(Rc::downgrade(&self.inner))
    }

    /// Register an observer called after every visible-state change.
    pub fn subscribe(&self, listener: impl Fn(&SuggestionState) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_listener);
        inner.next_listener += 1;
        if !inner.destroyed {
            inner.listeners.push((id, Rc::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// Trigger context at the engine's caret, if any.
    pub fn context_in<E: DocumentEngine + ?Sized>(&self, engine: &E) -> Option<TriggerMatch> {
        let caret = engine.caret()?;
        let paragraph = engine.paragraph_at(caret)?;
        find_trigger_context(&paragraph, caret, self.trigger())
    }

    /// Re-evaluate against the engine's current caret.
    pub fn evaluate<E: DocumentEngine + ?Sized>(&self, engine: &E) {
        self.update_context(self.context_in(engine));
    }

    /// Feed the caret context for the latest change.
    ///
    /// `None` means the caret is outside any trigger context. An unchanged
    /// context is ignored, so selection echoes never refetch.
    pub fn update_context(&self, context: Option<TriggerMatch>) {
        let effects = self.mutate(|inner| {
            let mut effects = Effects::default();
            if inner.destroyed {
                return effects;
            }

            let Some(context) = context else {
                inner.dismissed_at = None;
                if inner.phase.is_active() {
                    tracing::debug!(target: "scribe::suggest", kind = %inner.kind, "left trigger context");
                    effects.cancel = inner.invalidate();
                    inner.clear();
                }
                return effects;
            };

            if inner.dismissed_at == Some(context.range.from) {
                return effects;
            }
            inner.dismissed_at = None;
            if inner.active.as_ref() == Some(&context) {
                return effects;
            }

            // Same query at a shifted position: the shown list still answers it.
            if inner.phase == SuggestionPhase::Showing && inner.state.query == context.query {
                inner.state.caret_range = Some(context.range);
                inner.active = Some(context);
                return effects;
            }

            if !inner.phase.is_active() {
                tracing::debug!(
                    target: "scribe::suggest",
                    kind = %inner.kind,
                    from = context.range.from,
                    "entered trigger context"
                );
                inner.phase = SuggestionPhase::ActiveNoQuery;
            }

            effects.cancel = inner.invalidate();
            let qualifies = inner.config.should_fetch(&context.query);
            if inner.state.visible {
                inner.state.query = context.query.clone();
                inner.state.caret_range = Some(context.range);
            }
            inner.active = Some(context);

            if qualifies {
                effects.schedule = Some((inner.config.debounce_delay, inner.generation));
                inner.phase = SuggestionPhase::Fetching;
            } else {
                inner.hide();
                inner.phase = SuggestionPhase::ActiveNoQuery;
            }
            effects
        });
        self.run_effects(effects);
    }

    /// Return to `Idle`, cancelling any pending work.
    pub fn reset(&self) {
        let effects = self.mutate(|inner| {
            let cancel = inner.invalidate();
            inner.dismissed_at = None;
            inner.clear();
            Effects {
                cancel,
                schedule: None,
            }
        });
        self.run_effects(effects);
    }

    /// Route a key press. Only a visible list consumes keys, and Enter/Tab
    /// only once the list answers the current query.
    pub fn handle_key<E: DocumentEngine + ?Sized>(
        &self,
        key: SuggestionKey,
        engine: &mut E,
    ) -> KeyResult {
        let (visible, len, selected, phase) = {
            let inner = self.inner.borrow();
            (
                inner.state.visible && !inner.destroyed,
                inner.visible_len(),
                inner.state.selected_index,
                inner.phase,
            )
        };
        if !visible || len == 0 {
            return KeyResult::PassThrough;
        }

        match key {
            SuggestionKey::ArrowDown => {
                self.select_index((selected + 1) % len);
                KeyResult::Handled
            }
            SuggestionKey::ArrowUp => {
                self.select_index((selected + len - 1) % len);
                KeyResult::Handled
            }
            SuggestionKey::Enter | SuggestionKey::Tab if phase != SuggestionPhase::Showing => {
                KeyResult::PassThrough
            }
            SuggestionKey::Enter | SuggestionKey::Tab => {
                self.commit_index(selected, engine);
                KeyResult::Handled
            }
            SuggestionKey::Escape => {
                self.dismiss();
                KeyResult::Handled
            }
            SuggestionKey::Other => KeyResult::PassThrough,
        }
    }

    /// Close the list without committing. The same trigger stays closed until
    /// the caret leaves it.
    pub fn dismiss(&self) {
        let effects = self.mutate(|inner| {
            if inner.destroyed {
                return Effects::default();
            }
            let from = inner.active.as_ref().map(|m| m.range.from);
            let cancel = inner.invalidate();
            inner.clear();
            inner.dismissed_at = from;
            tracing::debug!(target: "scribe::suggest", kind = %inner.kind, "dismissed");
            Effects {
                cancel,
                schedule: None,
            }
        });
        self.run_effects(effects);
    }

    /// Highlight a row. Returns false when the index is out of range.
    pub fn select_index(&self, index: usize) -> bool {
        self.mutate(|inner| {
            if inner.destroyed || !inner.state.visible || index >= inner.visible_len() {
                return false;
            }
            inner.state.selected_index = index;
            true
        })
    }

    /// Insert the item at `index` and return to `Idle`.
    ///
    /// The trigger range is replaced by trigger + handle + space and the caret
    /// lands after the space. Nothing happens while a newer query is still
    /// being fetched. State is reset even if the engine refuses the edit.
    /// Returns whether the text was inserted.
    pub fn commit_index<E: DocumentEngine + ?Sized>(&self, index: usize, engine: &mut E) -> bool {
        let picked = {
            let inner = self.inner.borrow();
            let current = inner.phase == SuggestionPhase::Showing && inner.state.visible;
            if inner.destroyed || !current || index >= inner.visible_len() {
                None
            } else {
                inner
                    .active
                    .as_ref()
                    .map(|m| (inner.state.items[index].clone(), m.range, inner.trigger))
            }
        };
        let Some((item, range, trigger)) = picked else {
            return false;
        };

        self.reset();

        let text = format!("{trigger}{} ", item.handle_or_tag);
        let options = ReplaceOptions::from_origin(ChangeOrigin::Suggestion);
        if let Err(err) = engine.replace_text(range.to_range(), &text, options) {
            tracing::warn!(target: "scribe::suggest", %err, handle = %item.handle_or_tag, "commit rejected");
            return false;
        }
        let caret = range.from + text.chars().count();
        if let Err(err) = engine.set_caret(caret) {
            tracing::warn!(target: "scribe::suggest", %err, caret, "failed to place caret after commit");
        }
        engine.focus();
        tracing::debug!(target: "scribe::suggest", handle = %item.handle_or_tag, ?range, "committed suggestion");
        true
    }

    /// Commit the highlighted row.
    pub fn commit_selected<E: DocumentEngine + ?Sized>(&self, engine: &mut E) -> bool {
        let selected = self.inner.borrow().state.selected_index;
        self.commit_index(selected, engine)
    }

    /// Tear down: cancel pending work and drop observers. Every later call is inert.
    pub fn destroy(&self) {
        let cancel = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.listeners.clear();
            let cancel = inner.invalidate();
            inner.clear();
            cancel
        };
        self.run_effects(Effects {
            cancel,
            schedule: None,
        });
    }

    /// Apply `f` to the inner state, then notify observers if the visible
    /// state changed. No borrow is held while listeners run.
    fn mutate<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        let (result, notify) = {
            let mut inner = self.inner.borrow_mut();
            let before = inner.state.clone();
            let result = f(&mut *inner);
            let notify = (inner.state != before).then(|| {
                let listeners: Vec<Listener> =
                    inner.listeners.iter().map(|(_, l)| l.clone()).collect();
                (inner.state.clone(), listeners)
            });
            (result, notify)
        };
        if let Some((state, listeners)) = notify {
            for listener in listeners {
                listener(&state);
            }
        }
        result
    }

    fn run_effects(&self, effects: Effects) {
        let scheduler = self.inner.borrow().scheduler.clone();
        if let Some(id) = effects.cancel {
            scheduler.clear_timeout(id);
        }
        if let Some((delay, generation)) = effects.schedule {
            let weak = self.downgrade();
            let id = scheduler.set_timeout(
                delay,
                Box::new(move || {
                    if let Some(controller) = weak.upgrade() {
                        controller.fire(generation);
                    }
                }),
            );
            let mut inner = self.inner.borrow_mut();
            if inner.generation == generation {
                inner.timer = Some(id);
            }
        }
    }

    /// Debounce elapsed: start the fetch if still current.
    fn fire(&self, generation: u64) {
        let (source, scheduler, query, kind) = {
            let mut inner = self.inner.borrow_mut();
            if inner.destroyed || inner.generation != generation {
                return;
            }
            inner.timer = None;
            let Some(active) = inner.active.as_ref() else {
                return;
            };
            (
                inner.source.clone(),
                inner.scheduler.clone(),
                active.query.clone(),
                inner.kind,
            )
        };

        tracing::trace!(target: "scribe::suggest", %kind, %query, generation, "fetching suggestions");
        let started = Instant::now();
        let fetch = source.fetch(&query);
        let weak = self.downgrade();
        scheduler.spawn_local(
            async move {
                let result = fetch.await;
                if let Some(controller) = weak.upgrade() {
                    controller.resolve(generation, result, started);
                }
            }
            .boxed_local(),
        );
    }

    /// A fetch finished. Stale results are dropped.
    fn resolve(&self, generation: u64, result: Result<Vec<Item>, SourceError>, started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        self.mutate(|inner| {
            if inner.destroyed || inner.generation != generation || inner.active.is_none() {
                tracing::trace!(
                    target: "scribe::suggest",
                    kind = %inner.kind,
                    generation,
                    current = inner.generation,
                    "discarding stale suggestions"
                );
                return;
            }
            let Some(active) = inner.active.clone() else {
                return;
            };

            match result {
                Ok(items) if !items.is_empty() => {
                    tracing::debug!(
                        target: "scribe::suggest",
                        kind = %inner.kind,
                        query = %active.query,
                        count = items.len(),
                        elapsed_ms,
                        "showing suggestions"
                    );
                    inner.state = SuggestionState {
                        visible: true,
                        query: active.query,
                        items,
                        selected_index: 0,
                        caret_range: Some(active.range),
                    };
                    inner.phase = SuggestionPhase::Showing;
                }
                Ok(_) => {
                    tracing::trace!(
                        target: "scribe::suggest",
                        kind = %inner.kind,
                        query = %active.query,
                        "no suggestions"
                    );
                    inner.hide();
                    inner.phase = SuggestionPhase::ActiveNoQuery;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "scribe::suggest",
                        kind = %inner.kind,
                        query = %active.query,
                        %err,
                        "suggestion fetch failed"
                    );
                    inner.hide();
                    inner.phase = SuggestionPhase::ActiveNoQuery;
                }
            }
        });
    }
}

/// Non-owning controller handle for callbacks.
#[derive(Clone)]
pub struct WeakSuggestionController(Weak<RefCell<Inner>>);

impl WeakSuggestionController {
    pub fn upgrade(&self) -> Option<SuggestionController> {
        self.0.upgrade().map(|inner| SuggestionController { inner })
    }
}

impl std::fmt::Debug for SuggestionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SuggestionController")
            .field("kind", &inner.kind)
            .field("phase", &inner.phase)
            .field("generation", &inner.generation)
            .field("state", &inner.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::document::MemoryEngine;
    use crate::testing::{ManualScheduler, ScriptedSource};

    fn harness(
        config: SuggestionConfig,
    ) -> (SuggestionController, Rc<ManualScheduler>, Rc<ScriptedSource>) {
        let scheduler = Rc::new(ManualScheduler::new());
        let source = Rc::new(ScriptedSource::new());
        let controller = SuggestionController::new(
            TriggerKind::Mention,
            config,
            source.clone(),
            scheduler.clone(),
        );
        (controller, scheduler, source)
    }

    fn ctx(from: usize, to: usize, query: &str) -> Option<TriggerMatch> {
        Some(TriggerMatch {
            range: CaretRange::new(from, to),
            query: query.into(),
        })
    }

    fn items(handles: &[&str]) -> Vec<Item> {
        handles.iter().copied().map(Item::new).collect()
    }

    #[test]
    fn test_fetch_after_debounce() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(4, 7, "jo"));
        assert_eq!(controller.phase(), SuggestionPhase::Fetching);

        scheduler.advance(Duration::from_millis(299));
        assert!(source.queries().is_empty());

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(source.queries(), ["jo"]);

        source.resolve("jo", items(&["joan", "john"]));
        scheduler.run_until_stalled();
        let state = controller.state();
        assert!(state.visible);
        assert_eq!(state.query, "jo");
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.caret_range, Some(CaretRange::new(4, 7)));
        assert_eq!(controller.phase(), SuggestionPhase::Showing);
    }

    #[test]
    fn test_empty_query_waits_for_show_on_empty() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 1, ""));
        assert_eq!(controller.phase(), SuggestionPhase::ActiveNoQuery);
        scheduler.advance(Duration::from_secs(1));
        assert!(source.queries().is_empty());

        let (controller, scheduler, source) = harness(SuggestionConfig {
            show_on_empty: true,
            ..Default::default()
        });
        controller.update_context(ctx(0, 1, ""));
        scheduler.advance(Duration::from_millis(300));
        assert_eq!(source.queries(), [""]);
    }

    #[test]
    fn test_failed_fetch_is_no_results() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 2, "x"));
        scheduler.advance(Duration::from_millis(300));
        source.fail("x", "backend down");
        scheduler.run_until_stalled();
        assert!(!controller.is_visible());
        assert_eq!(controller.phase(), SuggestionPhase::ActiveNoQuery);
        assert!(controller.state().items.is_empty());
    }

    #[test]
    fn test_leaving_context_cancels_in_flight() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 2, "x"));
        scheduler.advance(Duration::from_millis(300));
        controller.update_context(None);
        assert_eq!(controller.phase(), SuggestionPhase::Idle);

        source.resolve("x", items(&["xavier"]));
        scheduler.run_until_stalled();
        assert!(!controller.is_visible());
        assert_eq!(controller.state(), SuggestionState::default());
    }

    #[test]
    fn test_unchanged_context_does_not_refetch() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 3, "ab"));
        scheduler.advance(Duration::from_millis(200));
        controller.update_context(ctx(0, 3, "ab"));
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(source.queries(), ["ab"]);
    }

    #[test]
    fn test_navigation_wraps_within_max() {
        let (controller, scheduler, source) = harness(SuggestionConfig {
            max_suggestions: 3,
            ..Default::default()
        });
        let mut engine = MemoryEngine::new("@a");
        controller.update_context(ctx(0, 2, "a"));
        scheduler.advance(Duration::from_millis(300));
        source.resolve("a", items(&["a1", "a2", "a3", "a4", "a5"]));
        scheduler.run_until_stalled();

        let mut seen = Vec::new();
        for key in [
            SuggestionKey::ArrowUp,
            SuggestionKey::ArrowUp,
            SuggestionKey::ArrowDown,
            SuggestionKey::ArrowDown,
            SuggestionKey::ArrowDown,
            SuggestionKey::ArrowDown,
        ] {
            assert_eq!(controller.handle_key(key, &mut engine), KeyResult::Handled);
            seen.push(controller.state().selected_index);
        }
        assert_eq!(seen, [2, 1, 2, 0, 1, 2]);
        assert_eq!(controller.visible_items().len(), 3);
        assert_eq!(engine.content(), "@a");
    }

    #[test]
    fn test_keys_pass_through_when_hidden() {
        let (controller, _scheduler, _source) = harness(SuggestionConfig::default());
        let mut engine = MemoryEngine::new("");
        for key in [
            SuggestionKey::ArrowDown,
            SuggestionKey::Enter,
            SuggestionKey::Escape,
        ] {
            assert_eq!(controller.handle_key(key, &mut engine), KeyResult::PassThrough);
        }
    }

    #[test]
    fn test_escape_stays_closed_until_context_leaves() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        let mut engine = MemoryEngine::new("@al");
        controller.update_context(ctx(0, 3, "al"));
        scheduler.advance(Duration::from_millis(300));
        source.resolve("al", items(&["alice"]));
        scheduler.run_until_stalled();

        assert_eq!(
            controller.handle_key(SuggestionKey::Escape, &mut engine),
            KeyResult::Handled
        );
        assert_eq!(controller.phase(), SuggestionPhase::Idle);

        // Selection echo and further typing on the same trigger stay closed.
        controller.update_context(ctx(0, 3, "al"));
        controller.update_context(ctx(0, 4, "ali"));
        assert_eq!(controller.phase(), SuggestionPhase::Idle);

        controller.update_context(None);
        controller.update_context(ctx(0, 4, "ali"));
        assert_eq!(controller.phase(), SuggestionPhase::Fetching);
    }

    #[test]
    fn test_commit_rejected_still_resets() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        let mut engine = MemoryEngine::new("@al");
        controller.update_context(ctx(0, 3, "al"));
        scheduler.advance(Duration::from_millis(300));
        source.resolve("al", items(&["alice"]));
        scheduler.run_until_stalled();

        engine.destroy();
        assert!(!controller.commit_index(0, &mut engine));
        assert_eq!(controller.phase(), SuggestionPhase::Idle);
        assert!(!controller.is_visible());
    }

    #[test]
    fn test_stale_list_cannot_be_committed() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        let mut engine = MemoryEngine::new("@johx");
        controller.update_context(ctx(0, 3, "jo"));
        scheduler.advance(Duration::from_millis(300));
        source.resolve("jo", items(&["joan", "john"]));
        scheduler.run_until_stalled();

        controller.update_context(ctx(0, 5, "johx"));
        assert_eq!(controller.phase(), SuggestionPhase::Fetching);
        assert!(controller.is_visible());
        assert_eq!(controller.state().query, "johx");

        for key in [SuggestionKey::Enter, SuggestionKey::Tab] {
            assert_eq!(controller.handle_key(key, &mut engine), KeyResult::PassThrough);
        }
        assert!(!controller.commit_index(0, &mut engine));
        assert_eq!(
            controller.handle_key(SuggestionKey::ArrowDown, &mut engine),
            KeyResult::Handled
        );
        assert_eq!(engine.content(), "@johx");

        scheduler.advance(Duration::from_millis(300));
        source.resolve("johx", vec![]);
        scheduler.run_until_stalled();
        assert!(!controller.is_visible());
        assert_eq!(controller.phase(), SuggestionPhase::ActiveNoQuery);
    }

    #[test]
    fn test_moved_range_keeps_shown_list() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 3, "jo"));
        scheduler.advance(Duration::from_millis(300));
        source.resolve("jo", items(&["joan"]));
        scheduler.run_until_stalled();

        controller.update_context(ctx(2, 5, "jo"));
        assert_eq!(controller.phase(), SuggestionPhase::Showing);
        assert_eq!(controller.state().caret_range, Some(CaretRange::new(2, 5)));
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(source.queries(), ["jo"]);
    }

    #[test]
    fn test_listeners_fire_on_visible_changes_only() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let id = controller.subscribe(move |_| counter.set(counter.get() + 1));

        controller.update_context(ctx(0, 2, "x"));
        assert_eq!(calls.get(), 0);

        scheduler.advance(Duration::from_millis(300));
        source.resolve("x", items(&["x1", "x2"]));
        scheduler.run_until_stalled();
        assert_eq!(calls.get(), 1);

        assert!(controller.select_index(1));
        assert!(!controller.select_index(5));
        assert_eq!(calls.get(), 2);

        assert!(controller.unsubscribe(id));
        controller.reset();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_destroy_makes_everything_inert() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 2, "x"));
        let generation = controller.generation();
        controller.destroy();
        assert!(controller.generation() > generation);
        assert_eq!(scheduler.pending_timers(), 0);

        scheduler.advance(Duration::from_secs(1));
        assert!(source.queries().is_empty());

        controller.update_context(ctx(0, 3, "xy"));
        assert_eq!(controller.phase(), SuggestionPhase::Idle);
        assert!(controller.is_destroyed());
    }

    #[test]
    fn test_dropped_controller_ignores_late_timer() {
        let (controller, scheduler, source) = harness(SuggestionConfig::default());
        controller.update_context(ctx(0, 2, "x"));
        drop(controller);
        scheduler.advance(Duration::from_millis(300));
        assert!(source.queries().is_empty());
    }
}
