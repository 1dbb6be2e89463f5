//! The incremental lexer state: an ordered sequence of tokenized lines.
//!
//! Edit operations re-tokenize the smallest possible suffix of the
//! document: a changed line is re-tokenized, and re-tokenization propagates
//! forward only while the outgoing mode of a re-tokenized line differs from
//! the stored start mode of the line after it. Once the modes reconverge
//! the remaining lines are untouched.

use pq_core::PositionRange;
use pq_core::position::byte_offset_of_code_unit;

use super::error::{ErrorLineMap, LexError};
use super::line::{Line, LineMode, tokenize_line};

/// The set of recognized line terminators.
const LINE_TERMINATORS: [char; 7] = [
    '\n', '\r', '\u{000B}', '\u{000C}', '\u{0085}', '\u{2028}', '\u{2029}',
];

/// Tokenized document state supporting incremental edits.
///
/// Invariants: there is always at least one line (an empty document is one
/// empty line), and `lines[n].mode_at_end == lines[n + 1].mode_at_start`.
#[derive(Clone, PartialEq, Debug)]
pub struct LexerState {
    lines: Vec<Line>,
}

impl LexerState {
    /// Tokenize a whole document.
    pub fn from_text(text: &str) -> Self {
        let mut state = Self { lines: Vec::new() };
        state.splice(0, 0, split_lines(text));
        state
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    /// Append one line, re-tokenizing from the prior line's end mode. The
    /// terminator separates the current last line from the appended one.
    pub fn append_line(&mut self, text: &str, terminator: &str) {
        if let Some(last) = self.lines.last_mut() {
            last.terminator = terminator.to_string();
        }
        let at = self.lines.len();
        self.splice(at, 0, vec![(text.to_string(), String::new())]);
    }

    /// Replace the text of one line, keeping its terminator. Embedded
    /// terminators in `text` split it into multiple lines.
    pub fn try_update_line(&mut self, line_number: u32, text: &str) -> Result<(), LexError> {
        let index = self.checked_line(line_number)?;
        let mut raw = split_lines(text);
        if let Some(last) = raw.last_mut() {
            last.1 = self.lines[index].terminator.clone();
        }
        self.splice(index, 1, raw);
        Ok(())
    }

    /// Replace the text covered by a position range.
    pub fn try_update_range(
        &mut self,
        range: PositionRange,
        text: &str,
    ) -> Result<(), LexError> {
        if range.end < range.start {
            return Err(LexError::BadRange { range });
        }
        let first = self.checked_line(range.start.line_number)?;
        let last = self.checked_line(range.end.line_number)?;

        let first_text = &self.lines[first].text;
        let last_text = &self.lines[last].text;
        let prefix_end = byte_offset_of_code_unit(first_text, range.start.line_code_unit)
            .ok_or(LexError::BadRange { range })?;
        let suffix_start = byte_offset_of_code_unit(last_text, range.end.line_code_unit)
            .ok_or(LexError::BadRange { range })?;

        let mut combined = String::with_capacity(prefix_end + text.len());
        combined.push_str(&first_text[..prefix_end]);
        combined.push_str(text);
        combined.push_str(&last_text[suffix_start..]);

        let mut raw = split_lines(&combined);
        if let Some(raw_last) = raw.last_mut() {
            raw_last.1 = self.lines[last].terminator.clone();
        }
        self.splice(first, last - first + 1, raw);
        Ok(())
    }

    /// Delete a range of lines.
    pub fn try_delete_lines(&mut self, line_number: u32, count: u32) -> Result<(), LexError> {
        let first = self.checked_line(line_number)?;
        if count == 0 || first + count as usize > self.lines.len() {
            return Err(LexError::BadLineNumber {
                line_number: line_number + count,
                line_count: self.line_count(),
            });
        }
        self.splice(first, count as usize, Vec::new());
        Ok(())
    }

    /// Per-line errors in ascending line order, or `None` when clean.
    pub fn error_line_map(&self) -> Option<ErrorLineMap> {
        let map: ErrorLineMap = self
            .lines
            .iter()
            .enumerate()
            .filter_map(|(number, line)| line.error.map(|e| (number as u32, e)))
            .collect();
        (!map.is_empty()).then_some(map)
    }

    fn checked_line(&self, line_number: u32) -> Result<usize, LexError> {
        if (line_number as usize) < self.lines.len() {
            Ok(line_number as usize)
        } else {
            Err(LexError::BadLineNumber {
                line_number,
                line_count: self.line_count(),
            })
        }
    }

    /// Replace `count` lines starting at `first` with the raw
    /// (text, terminator) pairs, then re-tokenize forward until the lexer
    /// mode reconverges with the stored line states.
    fn splice(&mut self, first: usize, count: usize, raw: Vec<(String, String)>) {
        let mut mode = if first == 0 {
            LineMode::Default
        } else {
            self.lines[first - 1].mode_at_end
        };

        let mut replacement = Vec::with_capacity(raw.len());
        for (text, terminator) in raw {
            let line = tokenize_line(&text, terminator, mode);
            mode = line.mode_at_end;
            replacement.push(line);
        }
        let replaced = replacement.len();
        self.lines.splice(first..first + count, replacement);

        if self.lines.is_empty() {
            self.lines.push(tokenize_line("", "", LineMode::Default));
            return;
        }

        let mut index = first + replaced;
        while index < self.lines.len() {
            if self.lines[index].mode_at_start == mode {
                break;
            }
            let line = &self.lines[index];
            let (text, terminator) = (line.text.clone(), line.terminator.clone());
            let retokenized = tokenize_line(&text, terminator, mode);
            mode = retokenized.mode_at_end;
            self.lines[index] = retokenized;
            index += 1;
        }
    }
}

/// Split text into (content, terminator) pairs on the recognized
/// terminator set. The final pair always exists and has an empty
/// terminator, so an empty document is one empty line.
fn split_lines(text: &str) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    let mut line_start = 0usize;
    let mut i = 0usize;
    while let Some(c) = text[i..].chars().next() {
        if !LINE_TERMINATORS.contains(&c) {
            i += c.len_utf8();
            continue;
        }
        let term_end = if c == '\r' && text[i + 1..].starts_with('\n') {
            i + 2
        } else {
            i + c.len_utf8()
        };
        lines.push((text[line_start..i].to_string(), text[i..term_end].to_string()));
        i = term_end;
        line_start = term_end;
    }
    lines.push((text[line_start..].to_string(), String::new()));
    lines
}
