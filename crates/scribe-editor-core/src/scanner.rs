//! Token scanning for mentions and hashtags.
//!
//! A token is a trigger character followed by an identifier made of
//! `[A-Za-z0-9_.-]`, trimmed of trailing `.` and `-`. Scanning is a single
//! left-to-right pass and never touches the document engine.

use smol_str::SmolStr;

/// A recognised token inside one paragraph.
///
/// `start..end` is a half-open char range in paragraph-local offsets and
/// includes the trigger character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub trigger: char,
    pub start: usize,
    pub end: usize,
    pub identifier: SmolStr,
}

impl Token {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Characters allowed inside an identifier.
pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Characters that glue a trigger to a preceding word (`bob@example`).
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_trailing_punct(c: char) -> bool {
    matches!(c, '.' | '-')
}

/// Scan `text` for tokens opened by `trigger`.
///
/// Matches are maximal and non-overlapping, sorted by `start`. A trigger with
/// no identifier characters after it produces nothing, which is how `@@bob`
/// ends up as a single token starting at the second `@`.
pub fn scan(text: &str, trigger: char) -> Vec<Token> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos] != trigger {
            pos += 1;
            continue;
        }

        let ident_start = pos + 1;
        let mut run_end = ident_start;
        while run_end < chars.len() && is_identifier_char(chars[run_end]) {
            run_end += 1;
        }

        let mut ident_end = run_end;
        while ident_end > ident_start && is_trailing_punct(chars[ident_end - 1]) {
            ident_end -= 1;
        }

        if ident_end == ident_start {
            pos += 1;
            continue;
        }

        tokens.push(Token {
            trigger,
            start: pos,
            end: ident_end,
            identifier: chars[ident_start..ident_end].iter().copied().collect(),
        });
        pos = ident_end;
    }

    tokens
}
