//! Text storage behind `MemoryEngine`.
//!
//! Offsets are chars. Only `\n` separates paragraphs, so line queries here
//! ignore CR and the unicode separators ropey would otherwise count.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

/// Editable text addressed by char offset.
pub trait TextBuffer {
    fn len_chars(&self) -> usize;

    fn insert(&mut self, at: usize, text: &str);

    fn delete(&mut self, range: Range<usize>);

    fn replace(&mut self, range: Range<usize>, text: &str) {
        let at = range.start;
        self.delete(range);
        self.insert(at, text);
    }

    /// Text in `range`, or None when it runs past the end.
    fn slice(&self, range: Range<usize>) -> Option<SmolStr>;

    fn char_at(&self, offset: usize) -> Option<char>;

    fn to_string(&self) -> String;

    /// Char offset where the `line`th `\n`-separated line starts. Clamps to
    /// the buffer end.
    fn line_to_char(&self, line: usize) -> usize;

    /// Index of the `\n`-separated line holding `offset`.
    fn char_to_line(&self, offset: usize) -> usize;
}

/// `TextBuffer` over a `ropey::Rope`.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, at: usize, text: &str) {
        self.rope.insert(at, text);
    }

    fn delete(&mut self, range: Range<usize>) {
        self.rope.remove(range);
    }

    fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        let slice = self.rope.get_slice(range)?;
        Some(slice.to_smolstr())
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.rope.get_char(offset)
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn line_to_char(&self, line: usize) -> usize {
        if line == 0 {
            return 0;
        }
        self.rope
            .chars()
            .enumerate()
            .filter(|(_, c)| *c == '\n')
            .nth(line - 1)
            .map(|(idx, _)| idx + 1)
            .unwrap_or_else(|| self.len_chars())
    }

    fn char_to_line(&self, offset: usize) -> usize {
        let end = offset.min(self.len_chars());
        self.rope.slice(..end).chars().filter(|c| *c == '\n').count()
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_and_read_back() {
        let mut rope = EditorRope::from_str("ping @bob");
        rope.insert(5, "cc ");
        assert_eq!(rope.to_string(), "ping cc @bob");
        rope.replace(8..12, "#rust");
        assert_eq!(rope.to_string(), "ping cc #rust");
        rope.delete(0..5);
        assert_eq!(rope.to_string(), "cc #rust");
    }

    #[test]
    fn test_out_of_range_reads() {
        let rope = EditorRope::from_str("@al");
        assert_eq!(rope.char_at(2), Some('l'));
        assert_eq!(rope.char_at(3), None);
        assert_eq!(rope.slice(1..3).as_deref(), Some("al"));
        assert_eq!(rope.slice(1..9), None);
    }

    #[test]
    fn test_only_newline_splits_lines() {
        let rope = EditorRope::from_str("one\ntwo\r\nthree\n");
        assert_eq!(rope.line_to_char(1), 4);
        assert_eq!(rope.line_to_char(2), 9);
        assert_eq!(rope.line_to_char(3), 15);
        assert_eq!(rope.line_to_char(7), 15);
        assert_eq!(rope.char_to_line(3), 0);
        assert_eq!(rope.char_to_line(8), 1);
        assert_eq!(rope.char_to_line(15), 3);
    }

    #[test]
    fn test_offsets_are_chars() {
        let rope = EditorRope::from_str("héllo 🌍 @zoë");
        assert_eq!(rope.len_chars(), 12);
        assert_eq!(rope.char_at(6), Some('🌍'));
        assert_eq!(rope.slice(8..12).as_deref(), Some("@zoë"));
    }
}
