//! The immutable snapshot of a lexer state.
//!
//! The snapshot flattens the line model into a single token stream:
//! line-relative offsets become absolute positions, multi-line
//! `Start`/`Content`/`End` partial runs fuse into single tokens, and
//! comments are routed out-of-band.

use pq_core::{
    Comment, CommentKind, LineToken, LineTokenKind, Position, Token, TokenKind, column_number,
};

use super::error::LexError;
use super::line::Line;
use super::state::LexerState;

/// The fused, immutable view of a [`LexerState`] suitable for parsing.
#[derive(Clone, PartialEq, Debug)]
pub struct LexerSnapshot {
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    line_texts: Vec<String>,
}

impl LexerSnapshot {
    /// Take a snapshot. Fails when any line carries a lexical error or a
    /// multi-line form is never terminated.
    pub fn try_from(state: &LexerState) -> Result<Self, LexError> {
        if let Some(map) = state.error_line_map() {
            return Err(LexError::LineErrors(map));
        }

        let lines = state.lines();
        let flat: Vec<(u32, &LineToken)> = lines
            .iter()
            .enumerate()
            .flat_map(|(number, line)| line.tokens.iter().map(move |t| (number as u32, t)))
            .collect();

        let mut tokens = Vec::new();
        let mut comments = Vec::new();
        let mut index = 0;

        while index < flat.len() {
            let (line_number, line_token) = flat[index];
            let start = Position::new(line_number, line_token.start);
            let end = Position::new(line_number, line_token.end);

            match line_token.kind {
                LineTokenKind::Plain(kind) => {
                    tokens.push(Token::new(kind, line_token.data.clone(), start, end));
                    index += 1;
                }
                LineTokenKind::LineComment => {
                    comments.push(Comment {
                        kind: CommentKind::Line,
                        data: line_token.data.clone(),
                        position_start: start,
                        position_end: end,
                        contains_newline: false,
                    });
                    index += 1;
                }
                LineTokenKind::MultilineComment => {
                    comments.push(Comment {
                        kind: CommentKind::Multiline,
                        data: line_token.data.clone(),
                        position_start: start,
                        position_end: end,
                        contains_newline: false,
                    });
                    index += 1;
                }
                LineTokenKind::MultilineCommentStart => {
                    let fused = fuse(
                        &flat,
                        index,
                        lines,
                        LineTokenKind::MultilineCommentContent,
                        LineTokenKind::MultilineCommentEnd,
                    )
                    .ok_or(LexError::UnterminatedMultilineComment { position: start })?;
                    comments.push(Comment {
                        kind: CommentKind::Multiline,
                        data: fused.data,
                        position_start: start,
                        position_end: fused.position_end,
                        contains_newline: true,
                    });
                    index = fused.next_index;
                }
                LineTokenKind::TextLiteralStart => {
                    let fused = fuse(
                        &flat,
                        index,
                        lines,
                        LineTokenKind::TextLiteralContent,
                        LineTokenKind::TextLiteralEnd,
                    )
                    .ok_or(LexError::UnterminatedText { position: start })?;
                    tokens.push(Token::new(
                        TokenKind::TextLiteral,
                        fused.data,
                        start,
                        fused.position_end,
                    ));
                    index = fused.next_index;
                }
                LineTokenKind::QuotedIdentifierStart => {
                    let fused = fuse(
                        &flat,
                        index,
                        lines,
                        LineTokenKind::QuotedIdentifierContent,
                        LineTokenKind::QuotedIdentifierEnd,
                    )
                    .ok_or(LexError::UnterminatedQuotedIdentifier { position: start })?;
                    tokens.push(Token::new(
                        TokenKind::Identifier,
                        fused.data,
                        start,
                        fused.position_end,
                    ));
                    index = fused.next_index;
                }
                // Content and End partials always follow a Start in a
                // mode-consistent state; the fusion loop consumes them.
                LineTokenKind::MultilineCommentContent
                | LineTokenKind::MultilineCommentEnd
                | LineTokenKind::TextLiteralContent
                | LineTokenKind::TextLiteralEnd
                | LineTokenKind::QuotedIdentifierContent
                | LineTokenKind::QuotedIdentifierEnd => {
                    debug_assert!(false, "orphaned multi-line partial");
                    index += 1;
                }
            }
        }

        Ok(Self {
            tokens,
            comments,
            line_texts: lines.iter().map(|l| l.text.clone()).collect(),
        })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn line_texts(&self) -> &[String] {
        &self.line_texts
    }

    /// Grapheme-cluster column for a snapshot position, for error messages.
    pub fn grapheme_column(&self, position: Position) -> u32 {
        match self.line_texts.get(position.line_number as usize) {
            Some(text) => column_number(text, position.line_code_unit),
            None => position.line_code_unit,
        }
    }
}

struct Fused {
    data: String,
    position_end: Position,
    next_index: usize,
}

/// Fuse a `Start + Content* + End` run beginning at `start_index` into the
/// raw covered text, including the intervening line terminators. Returns
/// `None` when the stream ends before the matching `End`.
fn fuse(
    flat: &[(u32, &LineToken)],
    start_index: usize,
    lines: &[Line],
    content_kind: LineTokenKind,
    end_kind: LineTokenKind,
) -> Option<Fused> {
    let (start_line, start_token) = flat[start_index];
    let mut data = start_token.data.clone();
    data.push_str(&lines[start_line as usize].terminator);

    let mut index = start_index + 1;
    while index < flat.len() {
        let (line_number, line_token) = flat[index];
        if line_token.kind == content_kind {
            data.push_str(&line_token.data);
            data.push_str(&lines[line_number as usize].terminator);
            index += 1;
        } else if line_token.kind == end_kind {
            data.push_str(&line_token.data);
            return Some(Fused {
                data,
                position_end: Position::new(line_number, line_token.end),
                next_index: index + 1,
            });
        } else {
            return None;
        }
    }
    None
}
