//! `DocumentEngine` over a JavaScript adapter object.
//!
//! The host wraps its rich-text editor (ProseMirror, Tiptap, ...) in an
//! object implementing `ScribeDocumentEngine` and hands it to the editor
//! constructor. Queries that fail to decode are logged and treated as empty.

use std::ops::Range;

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use scribe_editor_core::{
    CursorRect, DocumentEngine, EngineError, InlineMark, MarkKind, MarkTransaction,
    ParagraphText, ReplaceOptions, Selection,
};

use crate::types::{JsMark, JsMarkTransaction, JsParagraph, JsReplaceOptions, describe};

#[wasm_bindgen(typescript_custom_section)]
const DOCUMENT_ENGINE_TS: &'static str = r#"
export interface ScribeDocumentEngine {
    selection(): { anchor: number; head: number } | null;
    paragraphAt(offset: number): JsParagraph | null;
    paragraphs(): JsParagraph[];
    textLength(): number;
    coordsAt(offset: number): { x: number; y: number; height: number } | null;
    hasMarkKind(kind: "mention" | "hashtag"): boolean;
    marksIn(from: number, to: number, kind: "mention" | "hashtag"): JsMark[];
    applyMarks(tx: JsMarkTransaction): void;
    replaceText(from: number, to: number, text: string, options: JsReplaceOptions): void;
    setCaret(offset: number): void;
    focus(): void;
}
"#;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(typescript_type = "ScribeDocumentEngine")]
    pub type JsDocumentEngine;

    #[wasm_bindgen(method)]
    fn selection(this: &JsDocumentEngine) -> JsValue;

    #[wasm_bindgen(method, js_name = paragraphAt)]
    fn paragraph_at(this: &JsDocumentEngine, offset: usize) -> JsValue;

    #[wasm_bindgen(method)]
    fn paragraphs(this: &JsDocumentEngine) -> JsValue;

    #[wasm_bindgen(method, js_name = textLength)]
    fn text_length(this: &JsDocumentEngine) -> usize;

    #[wasm_bindgen(method, js_name = coordsAt)]
    fn coords_at(this: &JsDocumentEngine, offset: usize) -> JsValue;

    #[wasm_bindgen(method, js_name = hasMarkKind)]
    fn has_mark_kind(this: &JsDocumentEngine, kind: &str) -> bool;

    #[wasm_bindgen(method, js_name = marksIn)]
    fn marks_in(this: &JsDocumentEngine, from: usize, to: usize, kind: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = applyMarks)]
    fn apply_marks(this: &JsDocumentEngine, tx: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = replaceText)]
    fn replace_text(
        this: &JsDocumentEngine,
        from: usize,
        to: usize,
        text: &str,
        options: JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setCaret)]
    fn set_caret(this: &JsDocumentEngine, offset: usize) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn focus(this: &JsDocumentEngine);
}

/// Rust side of the host adapter.
pub struct JsEngine {
    inner: JsDocumentEngine,
}

impl JsEngine {
    pub fn new(inner: JsDocumentEngine) -> Self {
        Self { inner }
    }

    fn decode<T: DeserializeOwned>(&self, what: &'static str, value: JsValue) -> Option<T> {
        if value.is_null() || value.is_undefined() {
            return None;
        }
        match serde_wasm_bindgen::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(target: "scribe::engine", what, %err, "adapter returned malformed value");
                None
            }
        }
    }
}

fn rejected(err: JsValue) -> EngineError {
    EngineError::Rejected(describe(&err))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<JsValue, EngineError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| EngineError::Rejected(e.to_string()))
}

impl DocumentEngine for JsEngine {
    fn selection(&self) -> Option<Selection> {
        self.decode("selection", self.inner.selection())
    }

    fn paragraph_at(&self, offset: usize) -> Option<ParagraphText> {
        self.decode::<JsParagraph>("paragraphAt", self.inner.paragraph_at(offset))
            .map(ParagraphText::from)
    }

    fn paragraphs(&self) -> Vec<ParagraphText> {
        self.decode::<Vec<JsParagraph>>("paragraphs", self.inner.paragraphs())
            .unwrap_or_default()
            .into_iter()
            .map(ParagraphText::from)
            .collect()
    }

    fn len_chars(&self) -> usize {
        self.inner.text_length()
    }

    fn coords_at(&self, offset: usize) -> Option<CursorRect> {
        self.decode("coordsAt", self.inner.coords_at(offset))
    }

    fn has_mark_kind(&self, kind: MarkKind) -> bool {
        self.inner.has_mark_kind(kind.name())
    }

    fn marks_in(&self, range: Range<usize>, kind: MarkKind) -> Vec<InlineMark> {
        let marks = self.inner.marks_in(range.start, range.end, kind.name());
        self.decode::<Vec<JsMark>>("marksIn", marks)
            .unwrap_or_default()
            .into_iter()
            .map(InlineMark::from)
            .collect()
    }

    fn apply_marks(&mut self, tx: MarkTransaction) -> Result<(), EngineError> {
        let tx = encode(&JsMarkTransaction::from(tx))?;
        self.inner.apply_marks(tx).map_err(rejected)
    }

    fn replace_text(
        &mut self,
        range: Range<usize>,
        text: &str,
        options: ReplaceOptions,
    ) -> Result<(), EngineError> {
        let options = encode(&JsReplaceOptions::from(options))?;
        self.inner
            .replace_text(range.start, range.end, text, options)
            .map_err(rejected)
    }

    fn set_caret(&mut self, offset: usize) -> Result<(), EngineError> {
        self.inner.set_caret(offset).map_err(rejected)
    }

    fn focus(&mut self) {
        self.inner.focus();
    }
}
