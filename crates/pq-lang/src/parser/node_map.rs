//! The node-id map: an arena over context and AST nodes.
//!
//! Four id-keyed mappings describe the tree: completed nodes, in-progress
//! context nodes (disjoint from the completed ones), parent back-references,
//! and child lists ordered by attribute index. The map owns every node;
//! consumers read through [`XorNode`] views so inspection works identically
//! on complete and error-partial trees.

use std::collections::HashMap;

use pq_core::CommonError;

use super::ast::{AstNode, NodeId, NodeKind};
use super::context::ContextNode;

/// Read-only view of a slot that has either parsed to an AST node or is
/// still a parsing context.
#[derive(Copy, Clone, Debug)]
pub enum XorNode<'a> {
    Ast(&'a AstNode),
    Context(&'a ContextNode),
}

impl<'a> XorNode<'a> {
    pub fn id(&self) -> NodeId {
        match self {
            XorNode::Ast(node) => node.id,
            XorNode::Context(node) => node.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            XorNode::Ast(node) => node.kind,
            XorNode::Context(node) => node.kind,
        }
    }

    pub fn attribute_index(&self) -> Option<u32> {
        match self {
            XorNode::Ast(node) => node.attribute_index,
            XorNode::Context(node) => node.attribute_index,
        }
    }

    pub fn is_ast(&self) -> bool {
        matches!(self, XorNode::Ast(_))
    }

    pub fn ast(&self) -> Option<&'a AstNode> {
        match self {
            XorNode::Ast(node) => Some(node),
            XorNode::Context(_) => None,
        }
    }

    pub fn context(&self) -> Option<&'a ContextNode> {
        match self {
            XorNode::Ast(_) => None,
            XorNode::Context(node) => Some(node),
        }
    }
}

/// Arena of context and AST nodes with parent/child indices.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct NodeIdMap {
    ast_nodes: HashMap<NodeId, AstNode>,
    context_nodes: HashMap<NodeId, ContextNode>,
    parent_ids: HashMap<NodeId, NodeId>,
    child_ids: HashMap<NodeId, Vec<NodeId>>,
    leaf_ids: Vec<NodeId>,
}

impl NodeIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ast_node(&self, id: NodeId) -> Option<&AstNode> {
        self.ast_nodes.get(&id)
    }

    pub fn context_node(&self, id: NodeId) -> Option<&ContextNode> {
        self.context_nodes.get(&id)
    }

    pub fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        self.parent_ids.get(&id).copied()
    }

    pub fn child_ids(&self, id: NodeId) -> &[NodeId] {
        self.child_ids.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of completed leaf nodes, in completion order.
    pub fn leaf_ids(&self) -> &[NodeId] {
        &self.leaf_ids
    }

    pub fn ast_len(&self) -> usize {
        self.ast_nodes.len()
    }

    pub fn context_len(&self) -> usize {
        self.context_nodes.len()
    }

    pub fn xor(&self, id: NodeId) -> Option<XorNode<'_>> {
        if let Some(node) = self.ast_nodes.get(&id) {
            return Some(XorNode::Ast(node));
        }
        self.context_nodes.get(&id).map(XorNode::Context)
    }

    pub fn expect_xor(&self, id: NodeId) -> Result<XorNode<'_>, CommonError> {
        self.xor(id)
            .ok_or_else(|| CommonError::Invariant(format!("node {id} is not in the map")))
    }

    /// The child sitting at `attribute_index`, optionally restricted to a
    /// set of allowed kinds.
    pub fn child_xor_by_attribute_index(
        &self,
        parent: NodeId,
        attribute_index: u32,
        allowed: Option<&[NodeKind]>,
    ) -> Option<XorNode<'_>> {
        for &child in self.child_ids(parent) {
            let Some(xor) = self.xor(child) else { continue };
            if xor.attribute_index() == Some(attribute_index) {
                return match allowed {
                    Some(kinds) if !kinds.contains(&xor.kind()) => None,
                    _ => Some(xor),
                };
            }
        }
        None
    }

    /// Like [`Self::child_xor_by_attribute_index`] but the child must
    /// already be a completed AST node.
    pub fn child_ast_by_attribute_index(
        &self,
        parent: NodeId,
        attribute_index: u32,
        allowed: Option<&[NodeKind]>,
    ) -> Option<&AstNode> {
        self.child_xor_by_attribute_index(parent, attribute_index, allowed)?
            .ast()
    }

    /// The n-th child of the node's parent, by position in the child list.
    pub fn nth_sibling_xor(&self, id: NodeId, n: u32) -> Option<XorNode<'_>> {
        let parent = self.parent_id(id)?;
        let children = self.child_ids(parent);
        if n as usize >= children.len() {
            return None;
        }
        self.xor(children[n as usize])
    }

    /// Rightmost completed leaf under a node, used to find the end of a
    /// context node still being parsed.
    pub fn right_most_leaf(&self, id: NodeId) -> Option<&AstNode> {
        for &child in self.child_ids(id).iter().rev() {
            if let Some(leaf) = self.right_most_leaf(child) {
                return Some(leaf);
            }
        }
        self.ast_nodes.get(&id).filter(|node| node.is_leaf)
    }

    /// The `ArrayWrapper` child of a grouping node.
    pub fn array_wrapper_content(&self, parent: NodeId) -> Option<XorNode<'_>> {
        self.child_ids(parent)
            .iter()
            .filter_map(|&child| self.xor(child))
            .find(|xor| xor.kind() == NodeKind::ArrayWrapper)
    }

    /// The chain from a node to the root, starting with the node itself.
    pub fn ancestry(&self, id: NodeId) -> Vec<XorNode<'_>> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.xor(current) {
                Some(xor) => chain.push(xor),
                None => break,
            }
            cursor = self.parent_id(current);
        }
        chain
    }

    /// Children of an `ArrayWrapper`, in attribute order.
    pub fn iter_array_wrapper(&self, wrapper: NodeId) -> Vec<XorNode<'_>> {
        self.child_ids(wrapper)
            .iter()
            .filter_map(|&child| self.xor(child))
            .collect()
    }

    /// The content (attribute 0) of every `Csv` child of a wrapper.
    pub fn iter_csv_contents(&self, wrapper: NodeId) -> Vec<XorNode<'_>> {
        self.child_ids(wrapper)
            .iter()
            .filter_map(|&csv| self.child_xor_by_attribute_index(csv, 0, None))
            .collect()
    }

    /// Key-value pairs of a `LetExpression`.
    pub fn iter_let_pairs(&self, let_id: NodeId) -> Vec<XorNode<'_>> {
        self.iter_wrapped_csv_contents(let_id)
    }

    /// Key-value pairs of a record expression or literal.
    pub fn iter_record_pairs(&self, record_id: NodeId) -> Vec<XorNode<'_>> {
        self.iter_wrapped_csv_contents(record_id)
    }

    /// Argument expressions of an `InvokeExpression`.
    pub fn iter_invoke_arguments(&self, invoke_id: NodeId) -> Vec<XorNode<'_>> {
        self.iter_wrapped_csv_contents(invoke_id)
    }

    fn iter_wrapped_csv_contents(&self, parent: NodeId) -> Vec<XorNode<'_>> {
        match self.array_wrapper_content(parent) {
            Some(wrapper) => self.iter_csv_contents(wrapper.id()),
            None => Vec::new(),
        }
    }

    pub(crate) fn insert_context(&mut self, node: ContextNode) {
        let id = node.id;
        if let Some(parent) = node.parent {
            self.parent_ids.insert(id, parent);
            self.child_ids.entry(parent).or_default().push(id);
        }
        self.context_nodes.insert(id, node);
    }

    pub(crate) fn context_node_mut(&mut self, id: NodeId) -> Option<&mut ContextNode> {
        self.context_nodes.get_mut(&id)
    }

    /// Promote a context to its completed AST node under the same id.
    pub(crate) fn promote(&mut self, node: AstNode) {
        let id = node.id;
        self.context_nodes.remove(&id);
        if node.is_leaf {
            self.leaf_ids.push(id);
        }
        self.ast_nodes.insert(id, node);
    }

    /// Install `wrapper` in `left`'s place and make `left` its first child.
    pub(crate) fn wrap_existing(&mut self, wrapper: ContextNode, left: NodeId) {
        let id = wrapper.id;
        if let Some(parent) = wrapper.parent {
            if let Some(children) = self.child_ids.get_mut(&parent) {
                for child in children.iter_mut() {
                    if *child == left {
                        *child = id;
                    }
                }
            }
            self.parent_ids.insert(id, parent);
        }
        self.parent_ids.insert(left, id);
        self.child_ids.insert(id, vec![left]);
        if let Some(node) = self.ast_nodes.get_mut(&left) {
            node.attribute_index = Some(0);
        }
        self.context_nodes.insert(id, wrapper);
    }

    /// Delete every node minted at or after `threshold`, unlinking each
    /// from its parent unless the parent dies too.
    pub(crate) fn delete_nodes_at_or_above(&mut self, threshold: u32) {
        let mut doomed: Vec<NodeId> = self
            .ast_nodes
            .keys()
            .chain(self.context_nodes.keys())
            .copied()
            .filter(|id| id.0 >= threshold)
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for id in doomed {
            self.ast_nodes.remove(&id);
            self.context_nodes.remove(&id);
            self.child_ids.remove(&id);
            if let Some(parent) = self.parent_ids.remove(&id) {
                if parent.0 < threshold {
                    if let Some(children) = self.child_ids.get_mut(&parent) {
                        children.retain(|&child| child != id);
                    }
                }
            }
        }
        self.leaf_ids.retain(|id| id.0 < threshold);
    }
}
