//! Conversions between byte offsets, 1-based line/column positions, and the
//! LSP wire coordinate system (0-based line, UTF-16 code-unit character).
//!
//! The byte offset is the single source of truth; every other coordinate is
//! derived by scanning newline boundaries in the associated text. Positions
//! are only comparable against the same source text.

#![allow(clippy::cast_possible_truncation)] // spans are bounded by u32 text sizes

use crate::Span;

/// A location in source text.
///
/// `line` and `column` are 1-based and counted in Unicode scalar values;
/// they are derived from `offset`, never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPosition {
    /// Byte offset into the source text.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, in characters from the line start.
    pub column: u32,
}

/// Derive line/column for a byte offset.
///
/// The offset is clamped to the text length (one-past-last is valid) and
/// floored to the nearest character boundary. Empty text yields line 1,
/// column 1.
pub fn position_from_offset(text: &str, offset: usize) -> RawPosition {
    let mut offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }

    let before = &text[..offset];
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() as u32 + 1;

    RawPosition {
        offset,
        line,
        column,
    }
}

/// Extract the text a span covers.
///
/// Returns the empty string for spans that do not lie on character
/// boundaries of this text (a span from a different text revision).
pub fn range_text<'a>(text: &'a str, span: Span) -> &'a str {
    text.get(span.to_range()).unwrap_or("")
}

/// Convert a position to protocol coordinates: 0-based line and the
/// character measured in UTF-16 code units from the line start.
pub fn to_protocol(text: &str, pos: &RawPosition) -> (u32, u32) {
    let offset = pos.offset.min(text.len());
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let character = text[line_start..offset]
        .chars()
        .map(|c| c.len_utf16() as u32)
        .sum();
    (pos.line.saturating_sub(1), character)
}

/// Convert protocol coordinates back to a byte offset.
///
/// A line past the end of the text maps to the text length; a character
/// past the end of its line clamps to the line end (before the newline).
pub fn offset_from_protocol(text: &str, line: u32, character: u32) -> usize {
    let mut line_start = 0usize;
    for _ in 0..line {
        match text[line_start..].find('\n') {
            Some(i) => line_start += i + 1,
            None => return text.len(),
        }
    }

    let mut units = 0u32;
    for (i, ch) in text[line_start..].char_indices() {
        if units >= character || ch == '\n' {
            return line_start + i;
        }
        units += ch.len_utf16() as u32;
    }
    text.len()
}

/// Precomputed line-start table for repeated offset conversions over one
/// text snapshot (the semantic-token encoder does one lookup per token).
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Build the index for a text snapshot.
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        LineIndex { starts }
    }

    /// Protocol coordinates (0-based line, UTF-16 character) for a byte
    /// offset. `text` must be the snapshot the index was built from.
    pub fn line_col_utf16(&self, text: &str, offset: usize) -> (u32, u32) {
        let offset = offset.min(text.len());
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.starts[line];
        let character = text
            .get(line_start..offset)
            .unwrap_or("")
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        (line as u32, character)
    }
}
