//! JsMentionEditor - mention/hashtag support attached to a host editor.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use scribe_editor_core::{
    ChangeSpan, EditorConfig, EngineEvent, MarkClickHandlers, MarkKind, Modifiers,
    OrchestratorBuilder, PointerResult, SuggestionKey, TriggerKind, UpdateOrchestrator,
};

use crate::engine::{JsDocumentEngine, JsEngine};
use crate::scheduler::BrowserScheduler;
use crate::source::{JsOverlayRenderer, JsSuggestionSource, click_callback};
use crate::types::parse_origin;

type Orchestrator = UpdateOrchestrator<JsEngine>;

/// Mention and hashtag highlighting plus suggestion popups for one editor.
///
/// The host forwards its editor's notifications (`onDocumentChanged`,
/// `onSelectionChanged`, `onBlur`) and key presses. Notifications raised
/// synchronously while a call is in progress are queued and handled once it
/// returns.
#[wasm_bindgen]
pub struct JsMentionEditor {
    inner: RefCell<Orchestrator>,
    deferred: RefCell<VecDeque<EngineEvent>>,
}

fn parse_config(config: JsValue) -> Result<EditorConfig, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(EditorConfig::default());
    }
    if let Some(json) = config.as_string() {
        return EditorConfig::from_json(&json).map_err(|e| JsError::new(&e.to_string()));
    }
    let config: EditorConfig = serde_wasm_bindgen::from_value(config)
        .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?;
    config
        .validate()
        .map_err(|e| JsError::new(&e.to_string()))?;
    Ok(config)
}

fn parse_kind(kind: &str) -> Result<TriggerKind, JsError> {
    MarkKind::from_name(kind)
        .map(|mark| match mark {
            MarkKind::Mention => TriggerKind::Mention,
            MarkKind::Hashtag => TriggerKind::Hashtag,
        })
        .ok_or_else(|| JsError::new(&format!("Unknown kind: {}", kind)))
}

fn click_handlers(
    on_mention: Option<js_sys::Function>,
    on_hashtag: Option<js_sys::Function>,
) -> MarkClickHandlers {
    let mut clicks = MarkClickHandlers::new();
    if let Some(callback) = on_mention {
        clicks = clicks.on_mention(click_callback(callback));
    }
    if let Some(callback) = on_hashtag {
        clicks = clicks.on_hashtag(click_callback(callback));
    }
    clicks
}

#[wasm_bindgen]
impl JsMentionEditor {
    /// Attach to a host engine.
    ///
    /// `config` may be undefined, a JSON string or a plain object.
    /// Sources take a query string and return items or a promise of items.
    /// `render(kind, view)` receives `null` when a popup closes.
    #[wasm_bindgen(constructor)]
    pub fn new(
        engine: JsDocumentEngine,
        config: JsValue,
        mention_source: Option<js_sys::Function>,
        hashtag_source: Option<js_sys::Function>,
        render: Option<js_sys::Function>,
    ) -> Result<JsMentionEditor, JsError> {
        let mut builder = OrchestratorBuilder::new(Rc::new(BrowserScheduler::new()))
            .config(parse_config(config)?);
        if let Some(fetch) = mention_source {
            builder = builder.source(TriggerKind::Mention, Rc::new(JsSuggestionSource::new(fetch)));
        }
        if let Some(fetch) = hashtag_source {
            builder = builder.source(TriggerKind::Hashtag, Rc::new(JsSuggestionSource::new(fetch)));
        }
        if let Some(render) = render {
            builder = builder.renderer(Rc::new(JsOverlayRenderer::new(render)));
        }
        let orchestrator = builder
            .build(JsEngine::new(engine))
            .map_err(|e| JsError::new(&e.to_string()))?;

        tracing::debug!(target: "scribe::engine", "mention editor attached");
        Ok(Self {
            inner: RefCell::new(orchestrator),
            deferred: RefCell::new(VecDeque::new()),
        })
    }

    /// The host document changed. `origin` is one of `user`,
    /// `programmatic`, `reconcile` or `suggestion`; anything else is `user`.
    /// `from`/`to` bound the changed text in post-change offsets; without
    /// them the whole document is re-highlighted.
    #[wasm_bindgen(js_name = onDocumentChanged)]
    pub fn on_document_changed(
        &self,
        origin: Option<String>,
        from: Option<usize>,
        to: Option<usize>,
    ) {
        let origin = parse_origin(origin.as_deref());
        let span = from.zip(to).map(|(from, to)| ChangeSpan::new(from, to));
        self.dispatch(EngineEvent::DocumentChanged { origin, span });
    }

    #[wasm_bindgen(js_name = onSelectionChanged)]
    pub fn on_selection_changed(&self) {
        self.dispatch(EngineEvent::SelectionChanged);
    }

    #[wasm_bindgen(js_name = onBlur)]
    pub fn on_blur(&self) {
        self.dispatch(EngineEvent::Blur);
    }

    /// Handle keydown event.
    ///
    /// Returns whether to preventDefault.
    #[wasm_bindgen(js_name = handleKeydown)]
    pub fn handle_keydown(
        &self,
        key: &str,
        ctrl: bool,
        alt: bool,
        shift: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            ctrl,
            alt,
            shift,
            meta,
        };
        let key = SuggestionKey::from_key_press(key, modifiers);
        self.with_orchestrator("handleKeydown", |o| o.handle_key(key).is_handled())
            .unwrap_or(false)
    }

    /// Pointer down on a popup row. Returns whether to preventDefault so the
    /// editor keeps focus.
    #[wasm_bindgen(js_name = overlayPointerDown)]
    pub fn overlay_pointer_down(&self, kind: &str, index: usize) -> Result<bool, JsError> {
        let kind = parse_kind(kind)?;
        Ok(self
            .with_orchestrator("overlayPointerDown", |o| {
                o.overlay_pointer_down(kind, index) == PointerResult::PreventDefault
            })
            .unwrap_or(false))
    }

    #[wasm_bindgen(js_name = overlayHover)]
    pub fn overlay_hover(&self, kind: &str, index: usize) -> Result<bool, JsError> {
        let kind = parse_kind(kind)?;
        Ok(self
            .with_orchestrator("overlayHover", |o| o.overlay_hover(kind, index))
            .unwrap_or(false))
    }

    /// Commit the clicked row. Returns whether anything was inserted.
    #[wasm_bindgen(js_name = overlayClick)]
    pub fn overlay_click(&self, kind: &str, index: usize) -> Result<bool, JsError> {
        let kind = parse_kind(kind)?;
        Ok(self
            .with_orchestrator("overlayClick", |o| o.overlay_click(kind, index))
            .unwrap_or(false))
    }

    /// Replace the whole document and highlight it. Returns the number of
    /// mark operations applied.
    #[wasm_bindgen(js_name = setContent)]
    pub fn set_content(&self, text: &str) -> Result<usize, JsError> {
        self.with_orchestrator("setContent", |o| o.set_content(text))
            .ok_or_else(|| JsError::new("Editor is busy"))?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = reconcileDocument)]
    pub fn reconcile_document(&self) -> Result<usize, JsError> {
        self.with_orchestrator("reconcileDocument", |o| o.reconcile_document())
            .ok_or_else(|| JsError::new("Editor is busy"))?
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Click at a document offset. Returns whether a mark handler ran.
    #[wasm_bindgen(js_name = handleClick)]
    pub fn handle_click(&self, offset: usize) -> bool {
        self.with_orchestrator("handleClick", |o| o.handle_click(offset))
            .unwrap_or(false)
    }

    #[wasm_bindgen(js_name = setEditable)]
    pub fn set_editable(&self, editable: bool) {
        self.with_orchestrator("setEditable", |o| o.set_editable(editable));
    }

    #[wasm_bindgen(js_name = isEditable)]
    pub fn is_editable(&self) -> bool {
        self.inner
            .try_borrow()
            .map(|o| o.is_editable())
            .unwrap_or(false)
    }

    /// Callbacks receiving the mark value when a mark is clicked in read mode.
    #[wasm_bindgen(js_name = setClickHandlers)]
    pub fn set_click_handlers(
        &self,
        on_mention: Option<js_sys::Function>,
        on_hashtag: Option<js_sys::Function>,
    ) {
        let clicks = click_handlers(on_mention, on_hashtag);
        self.with_orchestrator("setClickHandlers", |o| o.set_click_handlers(clicks));
    }

    /// Snapshot of a kind's suggestion state, or undefined when that kind
    /// has no source.
    #[wasm_bindgen(js_name = suggestionState)]
    pub fn suggestion_state(&self, kind: &str) -> Result<JsValue, JsError> {
        let kind = parse_kind(kind)?;
        let Ok(orchestrator) = self.inner.try_borrow() else {
            return Ok(JsValue::UNDEFINED);
        };
        match orchestrator.controller(kind) {
            Some(controller) => serde_wasm_bindgen::to_value(&controller.state())
                .map_err(|e| JsError::new(&e.to_string())),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = enablePlugin)]
    pub fn enable_plugin(&self, name: &str) -> Result<(), JsError> {
        self.set_plugin_enabled(name, true)
    }

    #[wasm_bindgen(js_name = disablePlugin)]
    pub fn disable_plugin(&self, name: &str) -> Result<(), JsError> {
        self.set_plugin_enabled(name, false)
    }

    /// Detach. Later calls are ignored.
    pub fn destroy(&self) {
        self.deferred.borrow_mut().clear();
        self.with_orchestrator("destroy", |o| o.destroy());
    }
}

impl JsMentionEditor {
    fn set_plugin_enabled(&self, name: &str, enabled: bool) -> Result<(), JsError> {
        self.with_orchestrator("setPluginEnabled", |o| {
            let registry = o.registry_mut();
            let result = if enabled {
                registry.enable(name)
            } else {
                registry.disable(name)
            };
            if result.is_ok() {
                o.handle_selection_changed();
            }
            result
        })
        .ok_or_else(|| JsError::new("Editor is busy"))?
        .map_err(|e| JsError::new(&e.to_string()))
    }

    fn dispatch(&self, event: EngineEvent) {
        self.deferred.borrow_mut().push_back(event);
        self.drain();
    }

    /// Run `f` against the orchestrator, then handle anything the host
    /// raised meanwhile. None when called reentrantly.
    fn with_orchestrator<R>(
        &self,
        what: &'static str,
        f: impl FnOnce(&mut Orchestrator) -> R,
    ) -> Option<R> {
        let result = match self.inner.try_borrow_mut() {
            Ok(mut orchestrator) => f(&mut orchestrator),
            Err(_) => {
                tracing::warn!(target: "scribe::engine", what, "reentrant call ignored");
                return None;
            }
        };
        self.drain();
        Some(result)
    }

    fn drain(&self) {
        let Ok(mut orchestrator) = self.inner.try_borrow_mut() else {
            return;
        };
        loop {
            let Some(event) = self.deferred.borrow_mut().pop_front() else {
                break;
            };
            orchestrator.handle_event(event);
        }
    }
}

impl Drop for JsMentionEditor {
    fn drop(&mut self) {
        self.inner.get_mut().destroy();
    }
}
