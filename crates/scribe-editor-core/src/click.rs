//! Click handling for rendered mention and hashtag marks.

use std::rc::Rc;

use crate::engine::DocumentEngine;
use crate::types::MarkKind;

type ClickHandler = Rc<dyn Fn(&str)>;

/// Host callbacks for clicks on marks while the editor is read-only.
#[derive(Clone, Default)]
pub struct MarkClickHandlers {
    on_mention: Option<ClickHandler>,
    on_hashtag: Option<ClickHandler>,
}

impl MarkClickHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the handle, without `@`.
    pub fn on_mention(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.on_mention = Some(Rc::new(handler));
        self
    }

    /// Called with the tag, without `#`.
    pub fn on_hashtag(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.on_hashtag = Some(Rc::new(handler));
        self
    }

    fn handler(&self, kind: MarkKind) -> Option<&ClickHandler> {
        match kind {
            MarkKind::Mention => self.on_mention.as_ref(),
            MarkKind::Hashtag => self.on_hashtag.as_ref(),
        }
    }

    /// Dispatch a click at a document offset.
    ///
    /// Clicks in an editable document are left to the editor. Returns true
    /// when a handler ran.
    pub fn dispatch<E: DocumentEngine + ?Sized>(
        &self,
        engine: &E,
        offset: usize,
        editable: bool,
    ) -> bool {
        if editable {
            return false;
        }
        let Some(mark) = engine.mark_at(offset) else {
            return false;
        };
        let Some(handler) = self.handler(mark.kind) else {
            return false;
        };
        tracing::debug!(target: "scribe::engine", kind = %mark.kind, value = %mark.value, "mark clicked");
        handler(&mark.value);
        true
    }
}

impl std::fmt::Debug for MarkClickHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkClickHandlers")
            .field("on_mention", &self.on_mention.is_some())
            .field("on_hashtag", &self.on_hashtag.is_some())
            .finish()
    }
}
