use std::collections::BTreeMap;

use pq_core::error::{ErrorCode, locale};
use pq_core::{Position, PositionRange};
use thiserror::Error;

/// An error confined to a single line. Offsets are code units within that
/// line; the owning line number is the key in the [`ErrorLineMap`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Error)]
pub enum LineLexError {
    #[error("unexpected character at offset {line_code_unit}")]
    UnexpectedRead { line_code_unit: u32 },
    #[error("line ended in the middle of a token at offset {line_code_unit}")]
    UnexpectedEof { line_code_unit: u32 },
}

impl LineLexError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LineLexError::UnexpectedRead { .. } => ErrorCode::E001,
            LineLexError::UnexpectedEof { .. } => ErrorCode::E002,
        }
    }
}

/// Per-line errors keyed by line number, iterated in ascending order.
pub type ErrorLineMap = BTreeMap<u32, LineLexError>;

/// Errors surfaced by lexer state operations and the snapshot step.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum LexError {
    #[error("line {line_number} is out of range (the document has {line_count} lines)")]
    BadLineNumber { line_number: u32, line_count: u32 },
    #[error("invalid position range")]
    BadRange { range: PositionRange },
    #[error("one or more lines failed to tokenize")]
    LineErrors(ErrorLineMap),
    #[error("unterminated text literal starting at line {}", position.line_number)]
    UnterminatedText { position: Position },
    #[error("unterminated quoted identifier starting at line {}", position.line_number)]
    UnterminatedQuotedIdentifier { position: Position },
    #[error("unterminated multi-line comment starting at line {}", position.line_number)]
    UnterminatedMultilineComment { position: Position },
}

impl LexError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LexError::BadLineNumber { .. } => ErrorCode::E003,
            LexError::BadRange { .. } => ErrorCode::E004,
            LexError::LineErrors(_) => ErrorCode::E005,
            LexError::UnterminatedText { .. } => ErrorCode::E051,
            LexError::UnterminatedQuotedIdentifier { .. } => ErrorCode::E052,
            LexError::UnterminatedMultilineComment { .. } => ErrorCode::E053,
        }
    }

    /// The localized message template for this error.
    pub fn message(&self, locale_tag: &str) -> &'static str {
        locale::message(self.code(), locale_tag)
    }
}
