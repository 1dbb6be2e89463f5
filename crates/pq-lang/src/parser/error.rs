use pq_core::error::{ErrorCode, locale};
use pq_core::{CommonError, Token, TokenKind};
use smallvec::SmallVec;
use thiserror::Error;

/// What a comma-separated list was expecting when it stopped.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CsvContinuationKind {
    /// A comma was read but the list terminator followed.
    DanglingComma,
    /// A `let` variable list must continue with `,` or end with `in`.
    LetExpression,
}

/// Errors raised by the parser. Each carries the offending token (when one
/// exists) and its grapheme column. A parse error leaves the node-id map
/// in place so inspection can run against the partial tree.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum ParseError {
    #[error("expected {expected:?}")]
    ExpectedTokenKind {
        expected: TokenKind,
        found: Option<Token>,
        column: Option<u32>,
    },
    #[error("expected one of {expected:?}")]
    ExpectedAnyTokenKind {
        expected: SmallVec<[TokenKind; 4]>,
        found: Option<Token>,
        column: Option<u32>,
    },
    #[error("expected the list to continue ({kind:?})")]
    ExpectedCsvContinuation {
        kind: CsvContinuationKind,
        found: Option<Token>,
        column: Option<u32>,
    },
    #[error("parentheses opened on line {} are never closed", open.position_start.line_number)]
    UnterminatedParentheses { open: Token, column: u32 },
    #[error("bracket opened on line {} is never closed", open.position_start.line_number)]
    UnterminatedBracket { open: Token, column: u32 },
    #[error("tokens remain after the end of the document")]
    UnusedTokensRemain { first_unused: Token, column: u32 },
    #[error("`{}` is not a primitive type", token.data)]
    InvalidPrimitiveType { token: Token, column: u32 },
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl ParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::ExpectedTokenKind { .. } => ErrorCode::E101,
            ParseError::ExpectedAnyTokenKind { .. } => ErrorCode::E102,
            ParseError::ExpectedCsvContinuation { .. } => ErrorCode::E103,
            ParseError::UnterminatedParentheses { .. } => ErrorCode::E104,
            ParseError::UnterminatedBracket { .. } => ErrorCode::E105,
            ParseError::UnusedTokensRemain { .. } => ErrorCode::E106,
            ParseError::InvalidPrimitiveType { .. } => ErrorCode::E107,
            ParseError::Common(common) => common.code(),
        }
    }

    /// The localized message template for this error.
    pub fn message(&self, locale_tag: &str) -> &'static str {
        locale::message(self.code(), locale_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        let err = ParseError::ExpectedTokenKind {
            expected: TokenKind::RightBrace,
            found: None,
            column: None,
        };
        assert_eq!(err.code(), ErrorCode::E101);
        assert_eq!(
            ParseError::Common(CommonError::Cancelled).code(),
            ErrorCode::E902
        );
    }

    #[test]
    fn localized_message() {
        let err = ParseError::ExpectedCsvContinuation {
            kind: CsvContinuationKind::DanglingComma,
            found: None,
            column: None,
        };
        assert_eq!(
            err.message("en-US"),
            "expected a comma or the end of the list"
        );
    }
}
