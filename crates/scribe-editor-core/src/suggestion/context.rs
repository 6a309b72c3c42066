//! Trigger context detection around the caret.

use smol_str::SmolStr;

use crate::paragraph::ParagraphText;
use crate::scanner::{is_identifier_char, is_word_char};
use crate::types::CaretRange;

/// A live trigger context: the trigger and identifier text under the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Document range from the trigger through the end of the identifier run.
    pub range: CaretRange,
    /// Identifier text between the trigger and the caret.
    pub query: SmolStr,
}

/// Find the trigger context the caret sits in, if any.
///
/// The caret must be preceded by the trigger and zero or more identifier
/// characters. The trigger itself must open the paragraph or follow a
/// non-word character, so `bob@example` is not a context. The range extends
/// over identifier characters after the caret so a commit replaces the whole
/// word.
pub fn find_trigger_context(
    paragraph: &ParagraphText,
    caret: usize,
    trigger: char,
) -> Option<TriggerMatch> {
    let local = paragraph.to_local(caret)?;
    let chars: Vec<char> = paragraph.text.chars().collect();

    let mut start = local;
    while start > 0 && chars[start - 1] != trigger && is_identifier_char(chars[start - 1]) {
        start -= 1;
    }
    if start == 0 || chars[start - 1] != trigger {
        return None;
    }
    let trigger_pos = start - 1;
    if trigger_pos > 0 && is_word_char(chars[trigger_pos - 1]) {
        return None;
    }

    let mut end = local;
    while end < chars.len() && chars[end] != trigger && is_identifier_char(chars[end]) {
        end += 1;
    }

    let query: SmolStr = chars[start..local].iter().copied().collect();
    let range = paragraph.to_document(trigger_pos..end);
    Some(TriggerMatch {
        range: range.into(),
        query,
    })
}
