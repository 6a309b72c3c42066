//! Types exchanged with the JavaScript document engine adapter.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use scribe_editor_core::{
    ChangeOrigin, InlineMark, MarkKind, MarkOp, MarkTransaction, ParagraphText, ReplaceOptions,
};

/// One paragraph as reported by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JsParagraph {
    /// Char offset of the first character in the document.
    pub start: usize,
    pub text: String,
}

impl From<JsParagraph> for ParagraphText {
    fn from(p: JsParagraph) -> Self {
        ParagraphText::new(p.start, p.text)
    }
}

/// An inline mark over a half-open char range.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JsMark {
    #[tsify(type = "\"mention\" | \"hashtag\"")]
    pub kind: MarkKind,
    pub from: usize,
    pub to: usize,
    pub value: String,
}

impl From<JsMark> for InlineMark {
    fn from(m: JsMark) -> Self {
        InlineMark::new(m.kind, m.from..m.to, m.value)
    }
}

/// One step of a mark transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum JsMarkOp {
    /// Clear marks of `kind` over `[from, to)`.
    Remove {
        #[tsify(type = "\"mention\" | \"hashtag\"")]
        kind: MarkKind,
        from: usize,
        to: usize,
    },
    /// Add a mark of `kind` carrying `value`.
    Add {
        #[tsify(type = "\"mention\" | \"hashtag\"")]
        kind: MarkKind,
        from: usize,
        to: usize,
        value: String,
    },
}

/// A mark transaction the adapter must apply atomically.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JsMarkTransaction {
    pub ops: Vec<JsMarkOp>,
    #[tsify(type = "\"user\" | \"programmatic\" | \"reconcile\" | \"suggestion\"")]
    pub origin: ChangeOrigin,
    pub add_to_history: bool,
}

impl From<MarkTransaction> for JsMarkTransaction {
    fn from(tx: MarkTransaction) -> Self {
        let ops = tx
            .ops
            .into_iter()
            .map(|op| match op {
                MarkOp::Remove { kind, range } => JsMarkOp::Remove {
                    kind,
                    from: range.start,
                    to: range.end,
                },
                MarkOp::Add(mark) => JsMarkOp::Add {
                    kind: mark.kind,
                    from: mark.range.start,
                    to: mark.range.end,
                    value: mark.value.to_string(),
                },
            })
            .collect();
        Self {
            ops,
            origin: tx.origin,
            add_to_history: tx.add_to_history,
        }
    }
}

/// Options for `replaceText`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Tsify)]
#[serde(rename_all = "camelCase")]
pub struct JsReplaceOptions {
    #[tsify(type = "\"user\" | \"programmatic\" | \"reconcile\" | \"suggestion\"")]
    pub origin: ChangeOrigin,
    pub suppress_notification: bool,
}

impl From<ReplaceOptions> for JsReplaceOptions {
    fn from(o: ReplaceOptions) -> Self {
        Self {
            origin: o.origin,
            suppress_notification: o.suppress_notification,
        }
    }
}

/// Parse a change origin name, defaulting to `user`.
pub fn parse_origin(name: Option<&str>) -> ChangeOrigin {
    match name {
        Some("programmatic") => ChangeOrigin::Programmatic,
        Some("reconcile") => ChangeOrigin::Reconcile,
        Some("suggestion") => ChangeOrigin::Suggestion,
        _ => ChangeOrigin::User,
    }
}

/// Render a `JsValue` error for logs and `JsError` messages.
pub fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
