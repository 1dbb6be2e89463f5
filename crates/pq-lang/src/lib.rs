//! The pq language engine.
//!
//! This crate provides the core language functionality:
//! - `lexer` - incremental line-oriented tokenization and snapshots
//! - `parser` - the combinator parser runtime and the M grammar
//! - `settings` - per-session options

pub mod lexer;
pub mod parser;
pub mod settings;

// Re-export commonly used types at crate root
pub use lexer::{ErrorLineMap, LexError, LexerSnapshot, LexerState, Line, LineLexError, LineMode};
pub use parser::{
    AstNode, ConstantKind, ContextNode, ContextState, CsvContinuationKind, LiteralKind, NodeData,
    NodeId, NodeIdMap, NodeKind, ParseError, ParseFailure, ParseOk, ParserState, PrimitiveTypeKind,
    StateBackup, TokenRange, XorNode, try_parse,
};
pub use settings::{CancellationCallback, ParserVariant, Settings};
