//! The parser runtime.
//!
//! - `ast` - node ids, kinds, and payloads
//! - `node_map` - the arena of context and AST nodes
//! - `context` - open-production bookkeeping and promotion
//! - `state` - token cursor, speculative backup/restore
//! - `grammar` / `binop` - the M productions
//!
//! A document is first read as an expression document; if that fails, a
//! fresh state reads it as a section document, and the error (with its
//! partial tree) from whichever attempt consumed more tokens is reported.

pub mod ast;
mod binop;
pub mod context;
pub mod error;
mod grammar;
pub mod node_map;
pub mod state;


pub use ast::{
    AstNode, ConstantKind, LiteralKind, NodeData, NodeId, NodeKind, PrimitiveTypeKind, TokenRange,
};
pub use context::{ContextNode, ContextState};
pub use error::{CsvContinuationKind, ParseError};
pub use node_map::{NodeIdMap, XorNode};
pub use state::{ParserState, StateBackup};

use crate::lexer::LexerSnapshot;
use crate::settings::Settings;

/// A successful parse: the root node id, the completed node-id map, and
/// the ids of every leaf in completion order.
#[derive(Clone, PartialEq, Debug)]
pub struct ParseOk {
    pub root: NodeId,
    pub node_map: NodeIdMap,
    pub leaf_ids: Vec<NodeId>,
}

/// A failed parse. The context state preserves the partial tree so
/// inspection can still run against it.
#[derive(Debug)]
pub struct ParseFailure {
    pub error: ParseError,
    pub context: ContextState,
}

/// Parse a snapshot into a syntax tree.
pub fn try_parse(settings: &Settings, snapshot: &LexerSnapshot) -> Result<ParseOk, ParseFailure> {
    let mut state = ParserState::new(settings, snapshot);
    match state.read_expression_document() {
        Ok(root) => Ok(finish(state, root)),
        Err(expression_error) => {
            let mut section_state = ParserState::new(settings, snapshot);
            match section_state.read_section_document() {
                Ok(root) => Ok(finish(section_state, root)),
                Err(section_error) => {
                    if state.token_index >= section_state.token_index {
                        Err(ParseFailure {
                            error: expression_error,
                            context: state.into_context_state(),
                        })
                    } else {
                        Err(ParseFailure {
                            error: section_error,
                            context: section_state.into_context_state(),
                        })
                    }
                }
            }
        }
    }
}

fn finish(state: ParserState<'_>, root: NodeId) -> ParseOk {
    let node_map = state.into_context_state().into_node_map();
    ParseOk {
        root,
        leaf_ids: node_map.leaf_ids().to_vec(),
        node_map,
    }
}
