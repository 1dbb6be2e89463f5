use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// A cursor location in a document.
///
/// Both fields are zero-based. `line_code_unit` counts UTF-16 code units
/// within the line, matching the offsets editor clients report.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub line_number: u32,
    pub line_code_unit: u32,
}

impl Position {
    pub fn new(line_number: u32, line_code_unit: u32) -> Self {
        Self {
            line_number,
            line_code_unit,
        }
    }
}

/// A half-open range between two positions.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PositionRange {
    pub start: Position,
    pub end: Position,
}

impl PositionRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Number of UTF-16 code units in `text`.
pub fn code_unit_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

/// Byte offset in `text` corresponding to a UTF-16 code-unit offset.
///
/// Returns `None` when the offset is past the end of `text` or falls inside
/// a surrogate pair.
pub fn byte_offset_of_code_unit(text: &str, code_unit: u32) -> Option<usize> {
    let mut units = 0u32;
    for (byte_offset, c) in text.char_indices() {
        if units == code_unit {
            return Some(byte_offset);
        }
        if units > code_unit {
            return None;
        }
        units += c.len_utf16() as u32;
    }
    (units == code_unit).then_some(text.len())
}

/// Grapheme-cluster index for a code-unit offset within a line.
///
/// Computed on demand so tokens only carry cheap code-unit offsets; the
/// column is needed for user-facing error messages.
pub fn column_number(line_text: &str, line_code_unit: u32) -> u32 {
    let mut units = 0u32;
    let mut column = 0u32;
    for grapheme in line_text.graphemes(true) {
        if units >= line_code_unit {
            break;
        }
        units += code_unit_len(grapheme);
        column += 1;
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering() {
        let p1 = Position::new(0, 5);
        let p2 = Position::new(0, 9);
        let p3 = Position::new(1, 0);
        assert!(p1 < p2);
        assert!(p2 < p3);
        assert_eq!(p1, Position::new(0, 5));
    }

    #[test]
    fn code_unit_len_ascii() {
        assert_eq!(code_unit_len("let x"), 5);
        assert_eq!(code_unit_len(""), 0);
    }

    #[test]
    fn code_unit_len_supplementary() {
        // U+1F600 is two UTF-16 code units
        assert_eq!(code_unit_len("\u{1F600}"), 2);
        assert_eq!(code_unit_len("a\u{1F600}b"), 4);
    }

    #[test]
    fn byte_offset_round_trip() {
        let text = "a\u{00E9}b";
        assert_eq!(byte_offset_of_code_unit(text, 0), Some(0));
        assert_eq!(byte_offset_of_code_unit(text, 1), Some(1));
        assert_eq!(byte_offset_of_code_unit(text, 2), Some(3));
        assert_eq!(byte_offset_of_code_unit(text, 3), Some(4));
        assert_eq!(byte_offset_of_code_unit(text, 4), None);
    }

    #[test]
    fn column_counts_graphemes_not_units() {
        // e + combining acute is one grapheme but two code units
        let text = "e\u{0301}x";
        assert_eq!(column_number(text, 2), 1);
        assert_eq!(column_number(text, 3), 2);
        assert_eq!(column_number("abc", 2), 2);
    }
}
