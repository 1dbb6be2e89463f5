//! The incremental lexer.
//!
//! - `line` - single-line tokenization with a mode carried across lines
//! - `state` - the ordered line sequence and its edit operations
//! - `snapshot` - the fused, immutable token stream
//! - `error` - line-level and multi-line lexical errors

pub mod error;
pub mod line;
pub mod snapshot;
pub mod state;

pub use error::{ErrorLineMap, LexError, LineLexError};
pub use line::{Line, LineMode, tokenize_line};
pub use snapshot::LexerSnapshot;
pub use state::LexerState;
