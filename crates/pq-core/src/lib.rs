//! Core types for the pq parser.
//!
//! This crate provides foundational types used throughout the lexer, parser,
//! and inspectors:
//! - Document positions and grapheme-cluster columns
//! - Tokens, line tokens, and comments
//! - The M keyword tables
//! - Error codes and localized message templates

pub mod error;
pub mod keyword;
pub mod position;
pub mod token;

// Re-export commonly used types at crate root
pub use error::{CommonError, ErrorCode, locale};
pub use position::{Position, PositionRange, code_unit_len, column_number};
pub use token::{Comment, CommentKind, LineToken, LineTokenKind, Token, TokenKind};
