//! pq - a parser library for the Power Query / M formula language.
//!
//! The pipeline: text is tokenized into an incremental, line-oriented
//! [`LexerState`], fused into an immutable [`LexerSnapshot`], and parsed
//! into a node-id map of syntax nodes. On a parse error the partial tree
//! is preserved, and the position inspectors in [`pq_session`] run against
//! complete and partial trees alike.
//!
//! # Quick start
//!
//! ```
//! use pq::{Position, Settings, try_inspection, try_lex_parse};
//!
//! let ok = try_lex_parse(&Settings::default(), "let x = 1 in x + 1")
//!     .expect("parse succeeds");
//! let inspected = try_inspection(Position::new(0, 18), &ok.node_map, &ok.leaf_ids)
//!     .expect("inspection succeeds");
//! assert!(inspected.scope.contains_key("x"));
//! ```

use thiserror::Error;

// Re-export the public surface of the member crates
pub use pq_core::{
    Comment, CommentKind, CommonError, ErrorCode, Position, PositionRange, Token, TokenKind,
    column_number,
};
pub use pq_lang::{
    AstNode, CancellationCallback, ConstantKind, ContextNode, ContextState, CsvContinuationKind,
    ErrorLineMap, LexError, LexerSnapshot, LexerState, LineMode, LiteralKind, NodeData, NodeId,
    NodeIdMap, NodeKind, ParseError, ParserVariant, PrimitiveTypeKind, Settings, TokenRange,
    XorNode,
};
pub use pq_session::{
    ExtendedType, FunctionParameter, Inspected, InspectedInvoke, InspectedNode,
    PositionIdentifier, SemanticType, TypeCache, TypeInspector, TypeKind, try_inspection,
};

/// A fully-parsed document.
#[derive(Clone, PartialEq, Debug)]
pub struct LexParseOk {
    pub snapshot: LexerSnapshot,
    pub root: NodeId,
    pub node_map: NodeIdMap,
    pub leaf_ids: Vec<NodeId>,
}

/// Failure of [`try_lex_parse`]. A parse error keeps the partial context
/// state so inspection can still run against it.
#[derive(Debug, Error)]
pub enum LexParseError {
    #[error(transparent)]
    Lex(LexError),
    #[error("{error}")]
    Parse {
        error: ParseError,
        context: Box<ContextState>,
    },
    #[error(transparent)]
    Common(CommonError),
}

impl LexParseError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LexParseError::Lex(error) => error.code(),
            LexParseError::Parse { error, .. } => error.code(),
            LexParseError::Common(error) => error.code(),
        }
    }

    /// The localized message template for this error.
    pub fn message(&self, locale_tag: &str) -> &'static str {
        pq_core::error::locale::message(self.code(), locale_tag)
    }
}

/// Lex and parse a document in one step.
pub fn try_lex_parse(settings: &Settings, text: &str) -> Result<LexParseOk, LexParseError> {
    let state = LexerState::from_text(text);
    let snapshot = LexerSnapshot::try_from(&state).map_err(LexParseError::Lex)?;
    match pq_lang::try_parse(settings, &snapshot) {
        Ok(ok) => Ok(LexParseOk {
            snapshot,
            root: ok.root,
            node_map: ok.node_map,
            leaf_ids: ok.leaf_ids,
        }),
        Err(failure) => Err(LexParseError::Parse {
            error: failure.error,
            context: Box::new(failure.context),
        }),
    }
}
