//! Open-production bookkeeping.
//!
//! Every production under construction is a context node. A context is
//! created by `start_context`, and on success is promoted in place to the
//! AST node with the same id by `end_context`. A speculative rollback
//! deletes every node minted after the backup point, so a context that
//! never completes either survives as a frozen remnant of a failed parse
//! or is deleted wholesale.

use pq_core::{CommonError, Token};

use super::ast::{AstNode, NodeId, NodeKind};
use super::node_map::NodeIdMap;

/// An in-construction syntax node.
#[derive(Clone, PartialEq, Debug)]
pub struct ContextNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub attribute_index: Option<u32>,
    /// Index of the first token this production covers.
    pub token_index_start: u32,
    /// The token at `token_index_start`, if any existed when the
    /// production was entered.
    pub token_start: Option<Token>,
    /// How many child slots have been accounted for so far.
    pub attribute_counter: u32,
    pub parent: Option<NodeId>,
}

/// Owner of the node-id map and the id counter.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ContextState {
    node_map: NodeIdMap,
    id_counter: u32,
    root: Option<NodeId>,
    current: Option<NodeId>,
}

impl ContextState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_map(&self) -> &NodeIdMap {
        &self.node_map
    }

    pub fn into_node_map(self) -> NodeIdMap {
        self.node_map
    }

    pub fn id_counter(&self) -> u32 {
        self.id_counter
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn current_context_id(&self) -> Option<NodeId> {
        self.current
    }

    pub fn current_context(&self) -> Option<&ContextNode> {
        self.node_map.context_node(self.current?)
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.id_counter);
        self.id_counter += 1;
        id
    }

    /// Open a production. The new context claims the parent's current
    /// attribute slot and becomes current.
    pub(crate) fn start_context(
        &mut self,
        kind: NodeKind,
        token_index_start: u32,
        token_start: Option<Token>,
    ) -> NodeId {
        let id = self.next_id();
        let attribute_index = self.current_context().map(|parent| parent.attribute_counter);
        let node = ContextNode {
            id,
            kind,
            attribute_index,
            token_index_start,
            token_start,
            attribute_counter: 0,
            parent: self.current,
        };
        self.node_map.insert_context(node);
        if self.root.is_none() {
            self.root = Some(id);
        }
        self.current = Some(id);
        id
    }

    /// Open a production that takes over an already-completed node's slot
    /// and adopts that node as its first child. Used for left-associative
    /// operator chains and recursive-primary tails, where the wrapping
    /// node is only known after its first operand has parsed.
    pub(crate) fn start_wrapping_context(
        &mut self,
        kind: NodeKind,
        left: NodeId,
        token_index_start: u32,
        token_start: Option<Token>,
    ) -> Result<NodeId, CommonError> {
        let left_node = self
            .node_map
            .ast_node(left)
            .ok_or_else(|| CommonError::Invariant(format!("wrap target {left} is not an AST node")))?;
        let attribute_index = left_node.attribute_index;
        let parent = self.node_map.parent_id(left);

        let id = self.next_id();
        let node = ContextNode {
            id,
            kind,
            attribute_index,
            token_index_start,
            token_start,
            attribute_counter: 1,
            parent,
        };
        self.node_map.wrap_existing(node, left);

        // The wrapper takes over the slot the adopted child had claimed;
        // its own completion will re-increment the parent.
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.node_map.context_node_mut(parent_id) {
                parent_node.attribute_counter = parent_node.attribute_counter.saturating_sub(1);
            }
        }
        if self.root == Some(left) {
            self.root = Some(id);
        }
        self.current = Some(id);
        Ok(id)
    }

    /// Reserve the current context's next attribute slot for an absent
    /// optional child, keeping attribute indexes fixed per kind.
    pub(crate) fn skip_attribute(&mut self) {
        if let Some(id) = self.current {
            if let Some(node) = self.node_map.context_node_mut(id) {
                node.attribute_counter += 1;
            }
        }
    }

    /// Close the current production, promoting its context to `node`.
    pub(crate) fn end_context(&mut self, node: AstNode) -> Result<NodeId, CommonError> {
        let current = self.current.ok_or_else(|| {
            CommonError::Invariant("end_context called with no open context".into())
        })?;
        if current != node.id {
            return Err(CommonError::Invariant(format!(
                "end_context for node {} but context {current} is current",
                node.id
            )));
        }
        let parent = self
            .node_map
            .context_node(current)
            .ok_or_else(|| CommonError::Invariant(format!("context {current} is not in the map")))?
            .parent;
        let id = node.id;
        self.node_map.promote(node);
        self.current = parent;
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.node_map.context_node_mut(parent_id) {
                parent_node.attribute_counter += 1;
            }
        }
        Ok(id)
    }

    /// Delta rollback to a backup point: delete every node minted at or
    /// after `id_counter` and rebind the current context. Only legal when
    /// the speculated read failed, so no surviving node was mutated.
    pub(crate) fn rollback(&mut self, id_counter: u32, current: Option<NodeId>) {
        self.node_map.delete_nodes_at_or_above(id_counter);
        self.id_counter = id_counter;
        self.current = current;
        if self.root.is_some_and(|root| root.0 >= id_counter) {
            self.root = None;
        }
    }
}
