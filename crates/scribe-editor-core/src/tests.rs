//! End-to-end tests: a `MemoryEngine` driven through the orchestrator with a
//! manual clock and scripted sources.

use std::rc::Rc;
use std::time::Duration;

use crate::config::EditorConfig;
use crate::document::MemoryEngine;
use crate::engine::DocumentEngine;
use crate::keys::{KeyResult, SuggestionKey};
use crate::marks::InlineMark;
use crate::orchestrator::{OrchestratorBuilder, UpdateOrchestrator};
use crate::overlay::OverlayPosition;
use crate::suggestion::{Item, SuggestionPhase, SuggestionState};
use crate::testing::{ManualScheduler, RecordingRenderer, ScriptedSource};
use crate::types::{CaretRange, MarkKind, Selection, TriggerKind};
use crate::undo::UndoManager;

struct Harness {
    editor: UpdateOrchestrator<MemoryEngine>,
    scheduler: Rc<ManualScheduler>,
    people: Rc<ScriptedSource>,
    topics: Rc<ScriptedSource>,
    renderer: Rc<RecordingRenderer>,
}

fn harness() -> Harness {
    harness_with(EditorConfig::default())
}

fn harness_with(config: EditorConfig) -> Harness {
    let scheduler = Rc::new(ManualScheduler::new());
    let people = Rc::new(ScriptedSource::new());
    let topics = Rc::new(ScriptedSource::new());
    let renderer = Rc::new(RecordingRenderer::default());
    let editor = OrchestratorBuilder::new(scheduler.clone())
        .config(config)
        .source(TriggerKind::Mention, people.clone())
        .source(TriggerKind::Hashtag, topics.clone())
        .renderer(renderer.clone())
        .build(MemoryEngine::new(""))
        .unwrap();
    Harness {
        editor,
        scheduler,
        people,
        topics,
        renderer,
    }
}

fn items(handles: &[&str]) -> Vec<Item> {
    handles.iter().copied().map(Item::new).collect()
}

fn mention(range: std::ops::Range<usize>, value: &str) -> InlineMark {
    InlineMark::new(MarkKind::Mention, range, value)
}

fn hashtag(range: std::ops::Range<usize>, value: &str) -> InlineMark {
    InlineMark::new(MarkKind::Hashtag, range, value)
}

impl Harness {
    /// Type one char at a time, handling notifications after each.
    fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.editor
                .engine_mut()
                .type_text(ch.encode_utf8(&mut [0; 4]))
                .unwrap();
            self.editor.flush_events();
        }
    }

    fn wait(&self, ms: u64) {
        self.scheduler.advance(Duration::from_millis(ms));
    }

    fn mentions(&self) -> SuggestionState {
        self.editor.controller(TriggerKind::Mention).unwrap().state()
    }

    fn mention_phase(&self) -> SuggestionPhase {
        self.editor.controller(TriggerKind::Mention).unwrap().phase()
    }

    fn key(&mut self, key: SuggestionKey) -> KeyResult {
        let result = self.editor.handle_key(key);
        self.editor.flush_events();
        result
    }

    /// Type `text`, wait out the debounce and answer the mention fetch.
    fn show_mentions(&mut self, text: &str, query: &str, handles: &[&str]) {
        self.type_text(text);
        self.wait(300);
        self.people.resolve(query, items(handles));
        self.scheduler.run_until_stalled();
    }

    fn marks(&self) -> Vec<InlineMark> {
        self.editor.engine().marks().to_vec()
    }
}

// === Highlighting ===

#[test]
fn test_typed_mention_is_marked() {
    let mut h = harness();
    h.type_text("hello @alice how are you");
    assert_eq!(h.marks(), vec![mention(6..12, "alice")]);
}

#[test]
fn test_adjacent_mentions_marked() {
    let mut h = harness();
    h.type_text("@bob @carol");
    assert_eq!(h.marks(), vec![mention(0..4, "bob"), mention(5..11, "carol")]);
}

#[test]
fn test_mentions_and_hashtags_independent() {
    let mut h = harness();
    h.type_text("#rust with @ferris.");
    assert_eq!(
        h.marks(),
        vec![hashtag(0..5, "rust"), mention(11..18, "ferris")]
    );
}

#[test]
fn test_double_trigger_marks_last() {
    let mut h = harness();
    h.type_text("@@bob");
    assert_eq!(h.marks(), vec![mention(1..5, "bob")]);
}

#[test]
fn test_deleting_shrinks_then_removes_mark() {
    let mut h = harness();
    h.type_text("hi @alice");
    for _ in 0..2 {
        h.editor.engine_mut().delete_backward().unwrap();
        h.editor.flush_events();
    }
    assert_eq!(h.marks(), vec![mention(3..7, "ali")]);

    for _ in 0..4 {
        h.editor.engine_mut().delete_backward().unwrap();
        h.editor.flush_events();
    }
    assert_eq!(h.editor.engine().content(), "hi ");
    assert!(h.marks().is_empty());
}

#[test]
fn test_reconcile_twice_is_noop() {
    let mut h = harness();
    h.type_text("@bob #tag\n@carol");
    assert_eq!(h.editor.reconcile_document().unwrap(), 0);
    let events = h.editor.engine_mut().drain_events();
    assert!(events.is_empty());
}

#[test]
fn test_set_content_reconciles_every_paragraph() {
    let mut h = harness();
    let applied = h.editor.set_content("hi @bob\n#rust and #wasm\nplain").unwrap();
    assert!(applied > 0);
    assert_eq!(
        h.marks(),
        vec![
            mention(3..7, "bob"),
            hashtag(8..13, "rust"),
            hashtag(18..23, "wasm"),
        ]
    );
    assert_eq!(h.editor.reconcile_document().unwrap(), 0);
}

#[test]
fn test_set_content_replaces_everything() {
    let mut h = harness();
    h.type_text("@bob\nold text\n");
    h.editor.set_content("#new").unwrap();
    assert_eq!(h.editor.engine().content(), "#new");
    assert_eq!(h.marks(), vec![hashtag(0..4, "new")]);
}

#[test]
fn test_break_inside_mention_marks_both_halves() {
    let mut h = harness();
    h.type_text("@alice");
    h.editor
        .engine_mut()
        .set_selection(Selection::collapsed(4))
        .unwrap();
    h.editor.flush_events();
    h.type_text("\n");
    assert_eq!(h.editor.engine().content(), "@ali\nce");
    assert_eq!(h.marks(), vec![mention(0..4, "ali")]);
}

#[test]
fn test_pasted_paragraphs_all_marked() {
    let mut h = harness();
    h.editor.engine_mut().type_text("@bob\n@carol").unwrap();
    h.editor.flush_events();
    assert_eq!(h.marks(), vec![mention(0..4, "bob"), mention(5..11, "carol")]);
}

#[test]
fn test_unregistered_mark_kind_is_skipped() {
    let scheduler = Rc::new(ManualScheduler::new());
    let engine = MemoryEngine::new("").with_mark_kinds(&[MarkKind::Mention]);
    let mut editor = OrchestratorBuilder::new(scheduler.clone())
        .source(TriggerKind::Mention, Rc::new(ScriptedSource::new()))
        .source(TriggerKind::Hashtag, Rc::new(ScriptedSource::new()))
        .build(engine)
        .unwrap();
    for ch in "#tag @bob".chars() {
        editor
            .engine_mut()
            .type_text(ch.encode_utf8(&mut [0; 4]))
            .unwrap();
        editor.flush_events();
    }
    assert_eq!(editor.engine().marks().to_vec(), vec![mention(5..9, "bob")]);
    assert_eq!(editor.reconcile_document().unwrap(), 0);
}

#[test]
fn test_disabled_plugin_skips_kind() {
    let mut h = harness();
    h.editor.registry_mut().disable("hashtag").unwrap();
    h.type_text("#tag @bob");
    assert_eq!(h.marks(), vec![mention(5..9, "bob")]);

    h.type_text(" #x");
    h.wait(300);
    assert!(h.topics.queries().is_empty());
    assert_eq!(
        h.editor.controller(TriggerKind::Hashtag).unwrap().phase(),
        SuggestionPhase::Idle
    );
}

#[test]
fn test_undo_restores_marks_with_text() {
    let mut h = harness();
    h.type_text("@bob");
    assert_eq!(h.editor.engine().history().undo_depth(), 4);

    assert!(h.editor.engine_mut().undo());
    h.editor.flush_events();
    assert_eq!(h.editor.engine().content(), "@bo");
    assert_eq!(h.marks(), vec![mention(0..3, "bo")]);

    assert!(h.editor.engine_mut().redo());
    h.editor.flush_events();
    assert_eq!(h.marks(), vec![mention(0..4, "bob")]);
}

// === Suggestions ===

#[test]
fn test_caret_context_fetches_after_debounce() {
    let mut h = harness();
    h.type_text("Hey @jo");
    assert_eq!(h.mention_phase(), SuggestionPhase::Fetching);
    h.wait(299);
    assert!(h.people.queries().is_empty());
    h.wait(1);
    assert_eq!(h.people.queries(), ["jo"]);
}

#[test]
fn test_fast_typing_fetches_once() {
    let mut h = harness();
    h.type_text("@a");
    h.wait(100);
    h.type_text("b");
    h.wait(100);
    h.type_text("c");
    h.wait(300);
    assert_eq!(h.people.queries(), ["abc"]);

    h.people.resolve("abc", items(&["abcd"]));
    h.scheduler.run_until_stalled();
    assert_eq!(h.mentions().items, items(&["abcd"]));
}

#[test]
fn test_stale_result_never_overwrites_newer() {
    let mut h = harness();
    h.type_text("@ab");
    h.wait(300);
    h.type_text("c");
    h.wait(300);
    assert_eq!(h.people.queries(), ["ab", "abc"]);

    h.people.resolve("abc", items(&["abc1"]));
    h.scheduler.run_until_stalled();
    h.people.resolve("ab", items(&["ab1", "ab2"]));
    h.scheduler.run_until_stalled();

    let state = h.mentions();
    assert_eq!(state.query, "abc");
    assert_eq!(state.items, items(&["abc1"]));
}

#[test]
fn test_shown_items_stay_while_refetching() {
    let mut h = harness();
    h.show_mentions("@jo", "jo", &["joan", "john"]);
    h.type_text("h");

    let state = h.mentions();
    assert!(state.visible);
    assert_eq!(state.query, "joh");
    assert_eq!(state.items, items(&["joan", "john"]));
    assert_eq!(state.caret_range, Some(CaretRange::new(0, 4)));
    assert_eq!(h.mention_phase(), SuggestionPhase::Fetching);

    h.wait(300);
    h.people.resolve("joh", items(&["john"]));
    h.scheduler.run_until_stalled();
    assert_eq!(h.mentions().items, items(&["john"]));
    assert_eq!(h.key(SuggestionKey::Enter), KeyResult::Handled);
    assert_eq!(h.editor.engine().content(), "@john ");
}

#[test]
fn test_enter_waits_for_current_query() {
    let mut h = harness();
    h.show_mentions("@jo", "jo", &["joan", "john"]);
    h.type_text("hx");

    assert!(h.mentions().visible);
    assert_eq!(h.key(SuggestionKey::Enter), KeyResult::PassThrough);
    assert_eq!(h.key(SuggestionKey::Tab), KeyResult::PassThrough);
    assert!(!h.editor.overlay_click(TriggerKind::Mention, 0));
    assert_eq!(h.editor.engine().content(), "@johx");
    assert_eq!(h.marks(), vec![mention(0..5, "johx")]);
}

#[test]
fn test_selection_echo_does_not_refetch() {
    let mut h = harness();
    h.show_mentions("@jo", "jo", &["joan"]);
    h.editor
        .engine_mut()
        .set_selection(Selection::collapsed(3))
        .unwrap();
    h.editor.flush_events();
    h.wait(1000);
    assert_eq!(h.people.queries(), ["jo"]);
    assert!(h.mentions().visible);
}

#[test]
fn test_navigation_stays_in_bounds() {
    let mut config = EditorConfig::default();
    config.mention.max_suggestions = 4;
    let mut h = harness_with(config);
    h.show_mentions("@x", "x", &["x1", "x2", "x3", "x4", "x5", "x6"]);

    // Deterministic pseudo-random key sequence.
    let mut seed: u32 = 0x2545_f491;
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let key = if seed >> 16 & 1 == 0 {
            SuggestionKey::ArrowUp
        } else {
            SuggestionKey::ArrowDown
        };
        assert_eq!(h.key(key), KeyResult::Handled);
        assert!(h.mentions().selected_index < 4);
    }
    assert_eq!(h.editor.engine().content(), "@x");
}

#[test]
fn test_escape_closes_without_mutation() {
    let mut h = harness();
    h.show_mentions("@jo", "jo", &["joan", "john", "joy"]);
    assert_eq!(h.key(SuggestionKey::ArrowDown), KeyResult::Handled);
    assert_eq!(h.mentions().selected_index, 1);

    let depth = h.editor.engine().history().undo_depth();
    assert_eq!(h.editor.handle_key(SuggestionKey::Escape), KeyResult::Handled);
    assert!(h.editor.engine_mut().drain_events().is_empty());

    assert_eq!(h.mention_phase(), SuggestionPhase::Idle);
    assert_eq!(h.mentions(), SuggestionState::default());
    assert_eq!(h.editor.engine().content(), "@jo");
    assert_eq!(h.editor.engine().history().undo_depth(), depth);
    assert_eq!(h.renderer.last_for(TriggerKind::Mention), Some(None));
}

#[test]
fn test_enter_commits_selected() {
    let mut h = harness();
    h.show_mentions("hello @al", "al", &["alice", "alan"]);
    assert_eq!(h.mentions().caret_range, Some(CaretRange::new(6, 9)));

    assert_eq!(h.key(SuggestionKey::Enter), KeyResult::Handled);
    assert_eq!(h.editor.engine().content(), "hello @alice ");
    assert_eq!(h.editor.engine().caret(), Some(13));
    assert_eq!(h.mention_phase(), SuggestionPhase::Idle);
    assert_eq!(h.marks(), vec![mention(6..12, "alice")]);
}

#[test]
fn test_tab_commits_hashtag() {
    let mut h = harness();
    h.type_text("learning #ru");
    h.wait(300);
    h.topics.resolve("ru", items(&["rust", "ruby"]));
    h.scheduler.run_until_stalled();

    assert_eq!(h.key(SuggestionKey::ArrowDown), KeyResult::Handled);
    assert_eq!(h.key(SuggestionKey::Tab), KeyResult::Handled);
    assert_eq!(h.editor.engine().content(), "learning #ruby ");
    assert_eq!(h.marks(), vec![hashtag(9..14, "ruby")]);
}

#[test]
fn test_keys_pass_through_without_popup() {
    let mut h = harness();
    h.type_text("plain");
    assert_eq!(h.key(SuggestionKey::Enter), KeyResult::PassThrough);
    assert_eq!(h.key(SuggestionKey::Other), KeyResult::PassThrough);
}

#[test]
fn test_caret_leaving_closes_popup() {
    let mut h = harness();
    h.show_mentions("x @jo", "jo", &["joan"]);
    h.editor.engine_mut().set_caret(1).unwrap();
    h.editor.flush_events();
    assert_eq!(h.mention_phase(), SuggestionPhase::Idle);
    assert!(h.editor.overlay(TriggerKind::Mention).unwrap().view().is_none());
}

#[test]
fn test_blur_resets() {
    let mut h = harness();
    h.show_mentions("@jo", "jo", &["joan"]);
    h.editor.engine_mut().blur();
    h.editor.flush_events();
    assert_eq!(h.mention_phase(), SuggestionPhase::Idle);
}

#[test]
fn test_failed_fetch_shows_nothing() {
    let mut h = harness();
    h.type_text("@zz");
    h.wait(300);
    h.people.fail("zz", "503");
    h.scheduler.run_until_stalled();
    assert!(!h.mentions().visible);
    assert_eq!(h.mention_phase(), SuggestionPhase::ActiveNoQuery);
    assert_eq!(h.renderer.render_count(), 0);
}

// === Overlay ===

#[test]
fn test_overlay_follows_trigger() {
    let mut h = harness();
    h.show_mentions("x @jo", "jo", &["joan", "john"]);
    let view = h.editor.overlay(TriggerKind::Mention).unwrap().view().unwrap();
    assert_eq!(view.trigger, TriggerKind::Mention);
    assert_eq!(view.position, OverlayPosition { left: 28.0, top: 36.0 });
    assert_eq!(view.rows.len(), 2);
}

#[test]
fn test_overlay_click_commits() {
    let mut h = harness();
    h.show_mentions("@jo", "jo", &["joan", "john"]);
    assert!(h.editor.overlay_hover(TriggerKind::Mention, 1));
    assert!(h.editor.overlay_click(TriggerKind::Mention, 1));
    h.editor.flush_events();
    assert_eq!(h.editor.engine().content(), "@john ");
    assert!(!h.editor.overlay_click(TriggerKind::Mention, 0));
}

// === Read mode and teardown ===

#[test]
fn test_read_mode_click_dispatch() {
    use std::cell::RefCell;

    use crate::click::MarkClickHandlers;

    let clicked = Rc::new(RefCell::new(None));
    let sink = clicked.clone();
    let scheduler = Rc::new(ManualScheduler::new());
    let mut editor = OrchestratorBuilder::new(scheduler)
        .click_handlers(MarkClickHandlers::new().on_mention(move |h| {
            *sink.borrow_mut() = Some(h.to_string());
        }))
        .editable(false)
        .build(MemoryEngine::new(""))
        .unwrap();
    editor.set_content("ping @bob").unwrap();

    assert!(editor.handle_click(6));
    assert_eq!(clicked.borrow().as_deref(), Some("bob"));
    assert!(!editor.handle_click(1));

    editor.set_editable(true);
    assert!(!editor.handle_click(6));
}

#[test]
fn test_destroy_stops_everything() {
    let mut h = harness();
    h.type_text("@jo");
    h.editor.destroy();
    assert_eq!(h.scheduler.pending_timers(), 0);
    h.wait(1000);
    assert!(h.people.queries().is_empty());

    h.editor.engine_mut().type_text(" @x").unwrap();
    h.editor.flush_events();
    assert_eq!(h.marks(), vec![mention(0..3, "jo")]);
    assert_eq!(h.editor.handle_key(SuggestionKey::Enter), KeyResult::PassThrough);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = EditorConfig::default();
    config.hashtag.trigger = Some('@');
    let built = OrchestratorBuilder::new(Rc::new(ManualScheduler::new()))
        .config(config)
        .build(MemoryEngine::new(""));
    assert!(built.is_err());
}
