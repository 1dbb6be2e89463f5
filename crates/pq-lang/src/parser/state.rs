//! Parser state: token cursor, context protocol, and speculative reads.

use pq_core::keyword::GENERALIZED_IDENTIFIER_KINDS;
use pq_core::{CommonError, Position, Token, TokenKind};
use smallvec::SmallVec;

use crate::lexer::LexerSnapshot;
use crate::settings::Settings;

use super::ast::{AstNode, NodeData, NodeId, NodeKind, TokenRange};
use super::context::ContextState;
use super::error::{CsvContinuationKind, ParseError};

/// O(1) capture of the parser state for a speculative read.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct StateBackup {
    pub token_index: usize,
    pub id_counter: u32,
    pub current_context_id: Option<NodeId>,
}

/// Mutable state of a single parse.
pub struct ParserState<'a> {
    settings: &'a Settings,
    snapshot: &'a LexerSnapshot,
    pub(crate) token_index: usize,
    context: ContextState,
}

impl<'a> ParserState<'a> {
    pub fn new(settings: &'a Settings, snapshot: &'a LexerSnapshot) -> Self {
        Self {
            settings,
            snapshot,
            token_index: 0,
            context: ContextState::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.settings
    }

    pub fn context_state(&self) -> &ContextState {
        &self.context
    }

    pub fn into_context_state(self) -> ContextState {
        self.context
    }

    fn tokens(&self) -> &'a [Token] {
        self.snapshot.tokens()
    }

    pub fn current_token(&self) -> Option<&'a Token> {
        self.tokens().get(self.token_index)
    }

    pub fn current_token_kind(&self) -> Option<TokenKind> {
        self.current_token().map(|t| t.kind)
    }

    pub fn next_token_kind(&self) -> Option<TokenKind> {
        self.tokens().get(self.token_index + 1).map(|t| t.kind)
    }

    pub(crate) fn token_kind_at(&self, index: usize) -> Option<TokenKind> {
        self.tokens().get(index).map(|t| t.kind)
    }

    pub fn is_on(&self, kind: TokenKind) -> bool {
        self.current_token_kind() == Some(kind)
    }

    pub fn is_next(&self, kind: TokenKind) -> bool {
        self.next_token_kind() == Some(kind)
    }

    /// True when on an identifier token whose payload matches a contextual
    /// keyword form such as `optional` or `nullable`.
    pub fn is_on_constant_text(&self, text: &str) -> bool {
        matches!(
            self.current_token(),
            Some(token) if token.kind == TokenKind::Identifier && token.data == text
        )
    }

    /// True when the current token may open a generalized identifier.
    pub fn is_on_generalized_identifier_start(&self) -> bool {
        matches!(
            self.current_token_kind(),
            Some(kind) if GENERALIZED_IDENTIFIER_KINDS.contains(&kind)
        )
    }

    /// True when a recursive-primary tail (`(`, `{`, or `[`) follows.
    pub fn is_recursive_primary_expression_next(&self) -> bool {
        matches!(
            self.current_token_kind(),
            Some(TokenKind::LeftParenthesis)
                | Some(TokenKind::LeftBrace)
                | Some(TokenKind::LeftBracket)
        )
    }

    pub fn backup(&self) -> StateBackup {
        StateBackup {
            token_index: self.token_index,
            id_counter: self.context.id_counter(),
            current_context_id: self.context.current_context_id(),
        }
    }

    /// Delta rollback to a backup. Only legal after the speculated read
    /// raised a parse error; nodes minted before the backup are untouched.
    pub fn restore(&mut self, backup: &StateBackup) {
        self.token_index = backup.token_index;
        self.context
            .rollback(backup.id_counter, backup.current_context_id);
    }

    /// Grapheme column of a position, for error reporting.
    pub fn grapheme_column(&self, position: Position) -> u32 {
        self.snapshot.grapheme_column(position)
    }

    // ---- context protocol ----------------------------------------------

    pub(crate) fn start_context(&mut self, kind: NodeKind) -> Result<(), ParseError> {
        if let Some(cancellation) = &self.settings.cancellation {
            if cancellation() {
                return Err(ParseError::Common(CommonError::Cancelled));
            }
        }
        let token_start = self.current_token().cloned();
        self.context
            .start_context(kind, self.token_index as u32, token_start);
        Ok(())
    }

    pub(crate) fn start_wrapping_context(
        &mut self,
        kind: NodeKind,
        left: NodeId,
    ) -> Result<(), ParseError> {
        if let Some(cancellation) = &self.settings.cancellation {
            if cancellation() {
                return Err(ParseError::Common(CommonError::Cancelled));
            }
        }
        let index_start = self
            .context
            .node_map()
            .ast_node(left)
            .map(|node| node.token_range.index_start)
            .ok_or_else(|| {
                CommonError::Invariant(format!("wrap target {left} is not an AST node"))
            })?;
        let token_start = self.tokens().get(index_start as usize).cloned();
        self.context
            .start_wrapping_context(kind, left, index_start, token_start)?;
        Ok(())
    }

    pub(crate) fn skip_attribute(&mut self) {
        self.context.skip_attribute();
    }

    /// Close the current production, building its AST node from the tokens
    /// consumed since it was opened.
    pub(crate) fn end_context(&mut self, data: Option<NodeData>) -> Result<NodeId, ParseError> {
        let current = self.context.current_context().ok_or_else(|| {
            CommonError::Invariant("end_context called with no open context".into())
        })?;
        let index_start = current.token_index_start;
        let token_range = if (self.token_index as u32) > index_start {
            let index_end = self.token_index as u32 - 1;
            let position_start = match &current.token_start {
                Some(token) => token.position_start,
                None => Position::default(),
            };
            let position_end = self.tokens()[index_end as usize].position_end;
            TokenRange {
                index_start,
                index_end,
                position_start,
                position_end,
            }
        } else {
            // Nothing consumed (an empty wrapper): collapse to the
            // position where the production started.
            let position = self
                .tokens()
                .get(index_start as usize)
                .map(|t| t.position_start)
                .or_else(|| self.tokens().last().map(|t| t.position_end))
                .unwrap_or_default();
            TokenRange {
                index_start,
                index_end: index_start,
                position_start: position,
                position_end: position,
            }
        };
        let node = AstNode {
            id: current.id,
            kind: current.kind,
            attribute_index: current.attribute_index,
            token_range,
            is_leaf: current.kind.is_leaf(),
            data,
        };
        self.context.end_context(node).map_err(ParseError::from)
    }

    // ---- token reads ----------------------------------------------------

    pub(crate) fn read_token_kind(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        match self.current_token() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.token_index += 1;
                Ok(token)
            }
            _ => Err(self.error_expected(kind)),
        }
    }

    pub(crate) fn read_any_token(&mut self, expected: &[TokenKind]) -> Result<Token, ParseError> {
        match self.current_token() {
            Some(token) if expected.contains(&token.kind) => {
                let token = token.clone();
                self.token_index += 1;
                Ok(token)
            }
            _ => Err(self.error_expected_any(expected)),
        }
    }

    // ---- error constructors ---------------------------------------------

    fn found(&self) -> (Option<Token>, Option<u32>) {
        match self.current_token() {
            Some(token) => {
                let column = self.grapheme_column(token.position_start);
                (Some(token.clone()), Some(column))
            }
            None => (None, None),
        }
    }

    pub(crate) fn error_expected(&self, expected: TokenKind) -> ParseError {
        let (found, column) = self.found();
        ParseError::ExpectedTokenKind {
            expected,
            found,
            column,
        }
    }

    pub(crate) fn error_expected_any(&self, expected: &[TokenKind]) -> ParseError {
        let (found, column) = self.found();
        ParseError::ExpectedAnyTokenKind {
            expected: SmallVec::from_slice(expected),
            found,
            column,
        }
    }

    pub(crate) fn error_csv_continuation(&self, kind: CsvContinuationKind) -> ParseError {
        let (found, column) = self.found();
        ParseError::ExpectedCsvContinuation {
            kind,
            found,
            column,
        }
    }

    /// The unterminated-pair error for a closing token that never arrived.
    pub(crate) fn error_unterminated(&self, close: TokenKind, open: &Token) -> ParseError {
        let column = self.grapheme_column(open.position_start);
        match close {
            TokenKind::RightParenthesis => ParseError::UnterminatedParentheses {
                open: open.clone(),
                column,
            },
            _ => ParseError::UnterminatedBracket {
                open: open.clone(),
                column,
            },
        }
    }

    pub(crate) fn error_unused_tokens(&self, first_unused: Token) -> ParseError {
        let column = self.grapheme_column(first_unused.position_start);
        ParseError::UnusedTokensRemain {
            first_unused,
            column,
        }
    }

    pub(crate) fn error_invalid_primitive_type(&self, token: Token) -> ParseError {
        let column = self.grapheme_column(token.position_start);
        ParseError::InvalidPrimitiveType { token, column }
    }
}
