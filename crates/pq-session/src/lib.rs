//! Position-based inspection over pq parse trees.
//!
//! This crate answers "what does the cursor see" questions against a
//! complete or error-partial parse:
//! - `position` - before/in/after predicates over XOR nodes
//! - `scope` - names visible at a position, enclosing contextual nodes,
//!   and the surrounding invocation
//! - `types` - structural type derivation with memoization
//!
//! Everything here is read-only over the node-id map; inspection results
//! borrow the map and own nothing.

pub mod position;
pub mod scope;
pub mod types;

// Re-export commonly used types at crate root
pub use position::{
    is_after_xor, is_before_xor, is_in_xor, is_on_xor_end, is_on_xor_start, xor_position_end,
    xor_position_start,
};
pub use scope::{
    Inspected, InspectedInvoke, InspectedNode, PositionIdentifier, try_inspection,
};
pub use types::{
    ExtendedType, FunctionParameter, SemanticType, TypeCache, TypeInspector, TypeKind,
};
