//! Position predicates over XOR nodes.
//!
//! All predicates reduce to `(line, code unit)` lexicographic order on the
//! node's start and end. A context node still being parsed takes its end
//! from the rightmost completed leaf beneath it; a context with no such
//! leaf has no finite end, so the cursor is never "after" it and is "in"
//! it from its start onward.

use pq_core::Position;
use pq_lang::{NodeIdMap, XorNode};

/// Start position of a node, when one is known.
pub fn xor_position_start(xor: XorNode<'_>) -> Option<Position> {
    match xor {
        XorNode::Ast(node) => Some(node.token_range.position_start),
        XorNode::Context(node) => node.token_start.as_ref().map(|t| t.position_start),
    }
}

/// End position of a node, when one is known.
pub fn xor_position_end(map: &NodeIdMap, xor: XorNode<'_>) -> Option<Position> {
    match xor {
        XorNode::Ast(node) => Some(node.token_range.position_end),
        XorNode::Context(node) => map
            .right_most_leaf(node.id)
            .map(|leaf| leaf.token_range.position_end),
    }
}

pub fn is_before_xor(position: Position, xor: XorNode<'_>) -> bool {
    matches!(xor_position_start(xor), Some(start) if position < start)
}

pub fn is_on_xor_start(position: Position, xor: XorNode<'_>) -> bool {
    xor_position_start(xor) == Some(position)
}

pub fn is_on_xor_end(map: &NodeIdMap, position: Position, xor: XorNode<'_>) -> bool {
    xor_position_end(map, xor) == Some(position)
}

pub fn is_in_xor(map: &NodeIdMap, position: Position, xor: XorNode<'_>) -> bool {
    let Some(start) = xor_position_start(xor) else {
        return false;
    };
    if position < start {
        return false;
    }
    match xor_position_end(map, xor) {
        Some(end) => position <= end,
        None => true,
    }
}

pub fn is_after_xor(map: &NodeIdMap, position: Position, xor: XorNode<'_>) -> bool {
    matches!(xor_position_end(map, xor), Some(end) if position > end)
}
