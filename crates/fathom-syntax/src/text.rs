//! Source text positions and spans
//!
//! All positions are zero-based (line, character) pairs measured in UTF-16
//! code units, matching editor-protocol conventions. Spans are absolute
//! UTF-16 code-unit offsets into the document.

use serde::{Deserialize, Serialize};

/// A zero-based cursor position measured in UTF-16 code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Zero-based line number
    pub line: u32,
    /// Zero-based character offset within the line, in UTF-16 code units
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open text range between two positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// An absolute span over the document, in UTF-16 code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Cursor containment uses a half-open-left, closed-right rule:
    /// a cursor immediately after the span belongs to it, a cursor
    /// immediately before it does not.
    pub fn contains(&self, offset: u32) -> bool {
        self.start < offset && offset <= self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Line-start index for converting between positions and absolute offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Absolute UTF-16 offset of the first code unit of each line
    line_starts: Vec<u32>,
    /// Total document length in UTF-16 code units
    total: u32,
}

impl LineIndex {
    /// Build an index over the given text
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut offset = 0u32;
        for ch in text.chars() {
            offset += ch.len_utf16() as u32;
            if ch == '\n' {
                line_starts.push(offset);
            }
        }
        Self {
            line_starts,
            total: offset,
        }
    }

    /// Absolute offset of a position. Characters beyond the end of a line
    /// clamp to the line end, matching editor behavior for cursors parked
    /// past the last character.
    pub fn offset_at(&self, position: Position) -> Option<u32> {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|next| next.saturating_sub(1))
            .unwrap_or(self.total);
        // saturate: a huge character column must clamp, not overflow
        Some(start.saturating_add(position.character).min(line_end))
    }

    /// Position of an absolute offset
    pub fn position_at(&self, offset: u32) -> Position {
        let offset = offset.min(self.total);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position::new(line as u32, offset - self.line_starts[line])
    }

    pub fn total_len(&self) -> u32 {
        self.total
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_containment_boundaries() {
        // A token spanning columns [0, 3): cursor at 0 is outside,
        // cursors at 1, 2 and 3 are inside.
        let span = Span::new(0, 3);
        assert!(!span.contains(0));
        assert!(span.contains(1));
        assert!(span.contains(2));
        assert!(span.contains(3));
        assert!(!span.contains(4));
    }

    #[test]
    fn test_offset_round_trip() {
        let index = LineIndex::new("let a = 1\nin a");
        let offset = index.offset_at(Position::new(1, 3)).unwrap();
        assert_eq!(offset, 13);
        assert_eq!(index.position_at(offset), Position::new(1, 3));
    }

    #[test]
    fn test_offset_clamps_past_line_end() {
        let index = LineIndex::new("ab\ncd");
        // Column 10 on line 0 clamps to just before the newline.
        assert_eq!(index.offset_at(Position::new(0, 10)), Some(2));
        assert_eq!(index.offset_at(Position::new(1, 10)), Some(5));
    }

    #[test]
    fn test_offset_survives_extreme_character_column() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset_at(Position::new(0, u32::MAX)), Some(2));
        assert_eq!(index.offset_at(Position::new(1, u32::MAX)), Some(5));
    }

    #[test]
    fn test_offset_out_of_bounds_line() {
        let index = LineIndex::new("ab");
        assert_eq!(index.offset_at(Position::new(3, 0)), None);
    }

    #[test]
    fn test_utf16_wide_characters() {
        // '𐐀' is two UTF-16 code units.
        let index = LineIndex::new("𐐀b");
        assert_eq!(index.total_len(), 3);
        assert_eq!(index.offset_at(Position::new(0, 3)), Some(3));
    }

    #[test]
    fn test_empty_document() {
        let index = LineIndex::new("");
        assert_eq!(index.total_len(), 0);
        assert_eq!(index.offset_at(Position::new(0, 0)), Some(0));
        assert_eq!(index.line_count(), 1);
    }
}
