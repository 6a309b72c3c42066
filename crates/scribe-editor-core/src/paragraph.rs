//! Paragraph text as seen by the scanner and reconciler.
//!
//! Document engines hand out one paragraph at a time: its start offset in the
//! document plus its plain text. Token offsets are paragraph-local; marks live
//! in document coordinates, so conversions happen here.

use std::ops::Range;

use smol_str::SmolStr;

use crate::text::TextBuffer;

/// Plain text of one paragraph and where it starts in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphText {
    /// Document char offset of the first character
    pub start: usize,
    /// Text content, without the paragraph separator
    pub text: SmolStr,
    /// Cached length in chars
    char_len: usize,
}

impl ParagraphText {
    pub fn new(start: usize, text: impl Into<SmolStr>) -> Self {
        let text = text.into();
        let char_len = text.chars().count();
        Self {
            start,
            text,
            char_len,
        }
    }

    /// Document offset just past the last character.
    pub fn end(&self) -> usize {
        self.start + self.char_len
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Document range covered by the paragraph text.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Check if a caret at this document offset sits in the paragraph.
    ///
    /// Both ends are inclusive: a caret after the last char is still inside.
    pub fn contains_caret(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end()
    }

    /// Convert a document offset to a paragraph-local one.
    pub fn to_local(&self, offset: usize) -> Option<usize> {
        self.contains_caret(offset).then(|| offset - self.start)
    }

    /// Convert a paragraph-local range to document coordinates.
    pub fn to_document(&self, local: Range<usize>) -> Range<usize> {
        self.start + local.start..self.start + local.end
    }

    /// Text before a paragraph-local offset.
    pub fn text_before(&self, local: usize) -> &str {
        match self.text.char_indices().nth(local) {
            Some((byte, _)) => &self.text[..byte],
            None => &self.text,
        }
    }
}

/// Find start of the paragraph containing offset.
pub fn find_paragraph_start<T: TextBuffer + ?Sized>(buffer: &T, offset: usize) -> usize {
    let mut pos = offset.min(buffer.len_chars());
    while pos > 0 {
        if let Some('\n') = buffer.char_at(pos - 1) {
            return pos;
        }
        pos -= 1;
    }
    0
}

/// Find end of the paragraph containing offset (position of newline or end of doc).
pub fn find_paragraph_end<T: TextBuffer + ?Sized>(buffer: &T, offset: usize) -> usize {
    let len = buffer.len_chars();
    let mut pos = offset.min(len);
    while pos < len {
        if let Some('\n') = buffer.char_at(pos) {
            return pos;
        }
        pos += 1;
    }
    len
}

/// Extract the paragraph containing `offset` from a buffer.
pub fn paragraph_at<T: TextBuffer + ?Sized>(buffer: &T, offset: usize) -> Option<ParagraphText> {
    if offset > buffer.len_chars() {
        return None;
    }
    let start = find_paragraph_start(buffer, offset);
    let end = find_paragraph_end(buffer, offset);
    let text = buffer.slice(start..end)?;
    Some(ParagraphText::new(start, text))
}

/// Split a buffer into all of its paragraphs, in document order.
pub fn all_paragraphs<T: TextBuffer + ?Sized>(buffer: &T) -> Vec<ParagraphText> {
    let content = buffer.to_string();
    let mut start = 0;
    content
        .split('\n')
        .map(|line| {
            let para = ParagraphText::new(start, line);
            start = para.end() + 1;
            para
        })
        .collect()
}
