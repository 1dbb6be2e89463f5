use serde::{Deserialize, Serialize};

use crate::position::Position;

/// Kind of a snapshot-level token.
///
/// Closed enumeration over the M lexical grammar. Multi-line forms (text
/// literals, quoted identifiers) appear here already fused; quoted
/// identifiers (`#"…"`) fuse into [`TokenKind::Identifier`] with the raw
/// quoted form as data.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TokenKind {
    Ampersand,
    Asterisk,
    AtSign,
    Comma,
    Division,
    DotDot,
    Ellipsis,
    Equal,
    FatArrow,
    GreaterThan,
    GreaterThanEqualTo,
    HexLiteral,
    Identifier,
    KeywordAnd,
    KeywordAs,
    KeywordEach,
    KeywordElse,
    KeywordError,
    KeywordFalse,
    KeywordHashBinary,
    KeywordHashDate,
    KeywordHashDateTime,
    KeywordHashDateTimeZone,
    KeywordHashDuration,
    KeywordHashInfinity,
    KeywordHashNan,
    KeywordHashSections,
    KeywordHashShared,
    KeywordHashTable,
    KeywordHashTime,
    KeywordIf,
    KeywordIn,
    KeywordIs,
    KeywordLet,
    KeywordMeta,
    KeywordNot,
    KeywordOr,
    KeywordOtherwise,
    KeywordSection,
    KeywordShared,
    KeywordThen,
    KeywordTrue,
    KeywordTry,
    KeywordType,
    LeftBrace,
    LeftBracket,
    LeftParenthesis,
    LessThan,
    LessThanEqualTo,
    Minus,
    NotEqual,
    NullLiteral,
    NumericLiteral,
    Plus,
    QuestionMark,
    RightBrace,
    RightBracket,
    RightParenthesis,
    Semicolon,
    TextLiteral,
}

impl TokenKind {
    /// True for keyword kinds, including the hash keywords.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KeywordAnd
                | TokenKind::KeywordAs
                | TokenKind::KeywordEach
                | TokenKind::KeywordElse
                | TokenKind::KeywordError
                | TokenKind::KeywordFalse
                | TokenKind::KeywordHashBinary
                | TokenKind::KeywordHashDate
                | TokenKind::KeywordHashDateTime
                | TokenKind::KeywordHashDateTimeZone
                | TokenKind::KeywordHashDuration
                | TokenKind::KeywordHashInfinity
                | TokenKind::KeywordHashNan
                | TokenKind::KeywordHashSections
                | TokenKind::KeywordHashShared
                | TokenKind::KeywordHashTable
                | TokenKind::KeywordHashTime
                | TokenKind::KeywordIf
                | TokenKind::KeywordIn
                | TokenKind::KeywordIs
                | TokenKind::KeywordLet
                | TokenKind::KeywordMeta
                | TokenKind::KeywordNot
                | TokenKind::KeywordOr
                | TokenKind::KeywordOtherwise
                | TokenKind::KeywordSection
                | TokenKind::KeywordShared
                | TokenKind::KeywordThen
                | TokenKind::KeywordTrue
                | TokenKind::KeywordTry
                | TokenKind::KeywordType
        )
    }
}

/// Kind of a line-level token, before multi-line fusion.
///
/// The `Start`/`Content`/`End` partials are produced when a multi-line form
/// crosses a line boundary; the snapshot step fuses each run back into a
/// single [`TokenKind`] token.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LineTokenKind {
    Plain(TokenKind),
    LineComment,
    MultilineComment,
    MultilineCommentStart,
    MultilineCommentContent,
    MultilineCommentEnd,
    QuotedIdentifierStart,
    QuotedIdentifierContent,
    QuotedIdentifierEnd,
    TextLiteralStart,
    TextLiteralContent,
    TextLiteralEnd,
}

/// A token within a single line. Offsets are code units relative to the
/// line start.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LineToken {
    pub kind: LineTokenKind,
    pub start: u32,
    pub end: u32,
    pub data: String,
}

impl LineToken {
    pub fn new(kind: LineTokenKind, start: u32, end: u32, data: impl Into<String>) -> Self {
        Self {
            kind,
            start,
            end,
            data: data.into(),
        }
    }
}

/// A snapshot-level token. Immutable after the snapshot is taken; positions
/// are absolute within the document at snapshot time.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub data: String,
    pub position_start: Position,
    pub position_end: Position,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        data: impl Into<String>,
        position_start: Position,
        position_end: Position,
    ) -> Self {
        Self {
            kind,
            data: data.into(),
            position_start,
            position_end,
        }
    }
}

/// Kind of a comment.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CommentKind {
    /// `// …` to end of line.
    Line,
    /// `/* … */`, possibly spanning lines.
    Multiline,
}

/// A comment, carried out-of-band from the token stream.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Comment {
    pub kind: CommentKind,
    pub data: String,
    pub position_start: Position,
    pub position_end: Position,
    pub contains_newline: bool,
}
