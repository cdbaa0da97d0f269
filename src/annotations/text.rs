//! Immutable source text with UTF-16 offset addressing
//!
//! Spans are expressed in UTF-16 code units so they agree with the offsets a
//! browser host reports for the same string. Rust strings are indexed by
//! byte, so every span is translated through a precomputed table before it
//! touches the underlying `str`.
//!
//! ```text
//! Text:    "n€😀"
//! bytes:    n  [€ 3 bytes]  [😀 4 bytes]
//!           0  1            4             8
//! UTF-16:   n  €  😀(hi) 😀(lo)
//!           0  1  2      3      4
//! ```
//!
//! Offset 3 above sits between the two halves of a surrogate pair and has
//! no byte position; spans that start or end there are rejected.

use std::fmt;

use crate::error::AnnotationError;

use super::types::Span;

/// Number of UTF-16 code units needed to encode `s`
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// The text under review, addressed by UTF-16 offsets
#[derive(Clone, PartialEq, Eq)]
pub struct SourceText {
    text: String,
    /// Byte offset for every UTF-16 position (inclusive of the end).
    /// `None` marks positions inside a surrogate pair. Empty for ASCII text.
    utf16_to_byte: Vec<Option<usize>>,
    len: usize,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_ascii() {
            let len = text.len();
            return Self {
                text,
                utf16_to_byte: Vec::new(),
                len,
            };
        }

        let mut table = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            table.push(Some(byte));
            if ch.len_utf16() == 2 {
                table.push(None);
            }
        }
        table.push(Some(text.len()));
        let len = table.len() - 1;

        Self {
            text,
            utf16_to_byte: table,
            len,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn is_ascii(&self) -> bool {
        self.utf16_to_byte.is_empty()
    }

    /// Byte offset of a UTF-16 position, if it falls on a character boundary
    pub fn byte_offset(&self, pos: usize) -> Option<usize> {
        if pos > self.len {
            return None;
        }
        if self.is_ascii() {
            Some(pos)
        } else {
            self.utf16_to_byte[pos]
        }
    }

    /// UTF-16 position of a byte offset, if it falls on a character boundary
    pub fn position_of_byte(&self, byte: usize) -> Option<usize> {
        if byte > self.text.len() || !self.text.is_char_boundary(byte) {
            return None;
        }
        if self.is_ascii() {
            return Some(byte);
        }
        Some(utf16_len(&self.text[..byte]))
    }

    /// Nearest addressable position at or after `pos`, capped at the length
    pub fn ceil_position(&self, pos: usize) -> usize {
        (pos.min(self.len)..self.len)
            .find(|&p| self.byte_offset(p).is_some())
            .unwrap_or(self.len)
    }

    /// Text covered by `span`, or `None` when the span is not addressable
    pub fn slice(&self, span: Span) -> Option<&str> {
        let start = self.byte_offset(span.start())?;
        let end = self.byte_offset(span.end())?;
        self.text.get(start..end)
    }

    /// Check that `span` lies inside this text on character boundaries
    pub fn check_span(&self, span: Span) -> Result<(), AnnotationError> {
        if span.end() > self.len {
            return Err(AnnotationError::SpanOutOfBounds {
                start: span.start(),
                end: span.end(),
                len: self.len,
            });
        }
        for offset in [span.start(), span.end()] {
            if self.byte_offset(offset).is_none() {
                return Err(AnnotationError::SplitCharacter { offset });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceText")
            .field("text", &self.text)
            .field("len", &self.len)
            .finish()
    }
}

impl From<&str> for SourceText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SourceText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
