//! Suggestion sources and overlay renderers backed by JS callbacks.

use futures_util::FutureExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use scribe_editor_core::{
    Item, OverlayRenderer, OverlayView, SourceError, SuggestionFuture, SuggestionSource,
    TriggerKind,
};

use crate::types::describe;

/// Calls `fetch(query)`, which may return an array or a promise of one.
pub struct JsSuggestionSource {
    fetch: js_sys::Function,
}

impl JsSuggestionSource {
    pub fn new(fetch: js_sys::Function) -> Self {
        Self { fetch }
    }
}

impl SuggestionSource for JsSuggestionSource {
    fn fetch(&self, query: &str) -> SuggestionFuture {
        let called = self.fetch.call1(&JsValue::NULL, &JsValue::from_str(query));
        async move {
            let value = called.map_err(|e| SourceError::Fetch(describe(&e)))?;
            let resolved = JsFuture::from(js_sys::Promise::resolve(&value))
                .await
                .map_err(|e| SourceError::Fetch(describe(&e)))?;
            serde_wasm_bindgen::from_value::<Vec<Item>>(resolved)
                .map_err(|e| SourceError::Fetch(e.to_string()))
        }
        .boxed_local()
    }
}

/// Calls `render(kind, view)` with `view` null when the popup closes.
pub struct JsOverlayRenderer {
    render: js_sys::Function,
}

impl JsOverlayRenderer {
    pub fn new(render: js_sys::Function) -> Self {
        Self { render }
    }
}

impl OverlayRenderer for JsOverlayRenderer {
    fn render(&self, kind: TriggerKind, view: Option<&OverlayView>) {
        let view = match view.map(serde_wasm_bindgen::to_value).transpose() {
            Ok(view) => view.unwrap_or(JsValue::NULL),
            Err(err) => {
                tracing::warn!(target: "scribe::overlay", %kind, %err, "failed to encode overlay view");
                return;
            }
        };
        let kind = JsValue::from_str(kind.mark_kind().name());
        if let Err(err) = self.render.call2(&JsValue::NULL, &kind, &view) {
            tracing::warn!(target: "scribe::overlay", error = %describe(&err), "overlay renderer threw");
        }
    }
}

/// Click handler for marks in read mode.
pub fn click_callback(callback: js_sys::Function) -> impl Fn(&str) + 'static {
    move |value: &str| {
        if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(value)) {
            tracing::warn!(target: "scribe::engine", error = %describe(&err), "click handler threw");
        }
    }
}
