//! The scope inspector: names visible at a cursor position.
//!
//! Starting from the leaf closest to the cursor, the ancestry is walked to
//! the root and a per-kind visitor collects bindings. Insertion is
//! first-writer-wins into an insertion-ordered map, so inner bindings
//! shadow outer ones naturally and iteration order is stable for
//! consumers that enumerate the scope.

use indexmap::IndexMap;
use pq_core::{CommonError, Position};
use pq_lang::{AstNode, NodeId, NodeIdMap, NodeKind, XorNode};

use crate::position::{is_in_xor, is_on_xor_end, xor_position_end, xor_position_start};

/// A contextual node (each, invoke, list, record) enclosing the cursor.
#[derive(Clone, Debug)]
pub struct InspectedNode<'a> {
    pub node: XorNode<'a>,
    pub position_start: Option<Position>,
    pub position_end: Option<Position>,
}

/// The identifier the cursor is touching, if any.
#[derive(Clone, Debug)]
pub struct PositionIdentifier<'a> {
    pub name: String,
    pub node: XorNode<'a>,
}

/// The invocation enclosing the cursor: callee name (when the invoke is
/// the first tail of a recursive primary expression headed by an
/// identifier), argument arity, and the argument the cursor sits in.
#[derive(Clone, Debug)]
pub struct InspectedInvoke<'a> {
    pub node: XorNode<'a>,
    pub name: Option<String>,
    pub arity: usize,
    pub argument_index: Option<usize>,
}

/// Everything the position inspector derives at a cursor position.
#[derive(Clone, Debug, Default)]
pub struct Inspected<'a> {
    pub scope: IndexMap<String, XorNode<'a>>,
    pub nodes: Vec<InspectedNode<'a>>,
    pub position_identifier: Option<PositionIdentifier<'a>>,
    pub invoke_expression: Option<InspectedInvoke<'a>>,
}

/// Inspect a (possibly partial) parse tree at a cursor position.
pub fn try_inspection<'a>(
    position: Position,
    map: &'a NodeIdMap,
    leaf_ids: &[NodeId],
) -> Result<Inspected<'a>, CommonError> {
    let Some(leaf) = closest_leaf(map, leaf_ids, position) else {
        return Ok(Inspected::default());
    };

    let mut inspected = Inspected::default();
    for ancestor in map.ancestry(leaf.id) {
        match ancestor.kind() {
            NodeKind::EachExpression => {
                inspect_each(map, position, ancestor, &mut inspected);
            }
            NodeKind::FunctionExpression => {
                inspect_function(map, ancestor, &mut inspected);
            }
            NodeKind::LetExpression => {
                inspect_key_value_pairs(map, position, ancestor.id(), &mut inspected);
            }
            NodeKind::RecordExpression | NodeKind::RecordLiteral => {
                push_node(map, ancestor, &mut inspected);
                inspect_key_value_pairs(map, position, ancestor.id(), &mut inspected);
            }
            NodeKind::ListExpression | NodeKind::ListLiteral => {
                push_node(map, ancestor, &mut inspected);
            }
            NodeKind::Section => {
                inspect_section(map, ancestor.id(), &mut inspected);
            }
            NodeKind::InvokeExpression => {
                push_node(map, ancestor, &mut inspected);
                inspect_invoke(map, position, ancestor, &mut inspected);
            }
            NodeKind::Identifier | NodeKind::GeneralizedIdentifier => {
                inspect_identifier(map, position, ancestor, &mut inspected);
            }
            _ => {}
        }
    }
    Ok(inspected)
}

/// The rightmost leaf ending at or before the position, or the lexically
/// first leaf when every leaf starts after it.
fn closest_leaf<'a>(
    map: &'a NodeIdMap,
    leaf_ids: &[NodeId],
    position: Position,
) -> Option<&'a AstNode> {
    let mut best: Option<&AstNode> = None;
    let mut first: Option<&AstNode> = None;
    for &id in leaf_ids {
        let Some(node) = map.ast_node(id) else { continue };
        if node.token_range.position_end <= position {
            let replace = match best {
                Some(current) => node.token_range.position_end >= current.token_range.position_end,
                None => true,
            };
            if replace {
                best = Some(node);
            }
        }
        let replace_first = match first {
            Some(current) => node.token_range.position_start < current.token_range.position_start,
            None => true,
        };
        if replace_first {
            first = Some(node);
        }
    }
    best.or(first)
}

fn push_node<'a>(map: &'a NodeIdMap, xor: XorNode<'a>, inspected: &mut Inspected<'a>) {
    inspected.nodes.push(InspectedNode {
        node: xor,
        position_start: xor_position_start(xor),
        position_end: xor_position_end(map, xor),
    });
}

fn add_binding<'a>(inspected: &mut Inspected<'a>, name: String, node: XorNode<'a>) {
    inspected.scope.entry(name).or_insert(node);
}

fn inspect_each<'a>(
    map: &'a NodeIdMap,
    _position: Position,
    each: XorNode<'a>,
    inspected: &mut Inspected<'a>,
) {
    push_node(map, each, inspected);
    add_binding(inspected, "_".to_string(), each);
}

fn inspect_function<'a>(map: &'a NodeIdMap, function: XorNode<'a>, inspected: &mut Inspected<'a>) {
    let Some(parameter_list) = map.child_xor_by_attribute_index(
        function.id(),
        0,
        Some(&[NodeKind::ParameterList]),
    ) else {
        return;
    };
    let Some(wrapper) = map.array_wrapper_content(parameter_list.id()) else {
        return;
    };
    for parameter in map.iter_csv_contents(wrapper.id()) {
        if parameter.kind() != NodeKind::Parameter {
            continue;
        }
        let Some(name) = map
            .child_ast_by_attribute_index(parameter.id(), 1, Some(&[NodeKind::Identifier]))
            .and_then(|node| node.identifier_text())
        else {
            continue;
        };
        add_binding(inspected, name.to_string(), parameter);
    }
}

/// Let and record bindings: a key is visible only once its value ends at
/// or before the cursor, so forward references stay out of scope.
fn inspect_key_value_pairs<'a>(
    map: &'a NodeIdMap,
    position: Position,
    parent: NodeId,
    inspected: &mut Inspected<'a>,
) {
    for pair in map.iter_record_pairs(parent) {
        let Some(key) = map
            .child_ast_by_attribute_index(
                pair.id(),
                0,
                Some(&[NodeKind::Identifier, NodeKind::GeneralizedIdentifier]),
            )
            .and_then(|node| node.identifier_text())
        else {
            continue;
        };
        let Some(value) = map.child_xor_by_attribute_index(pair.id(), 2, None) else {
            continue;
        };
        let Some(value_end) = xor_position_end(map, value) else {
            continue;
        };
        if value_end <= position {
            add_binding(inspected, key.to_string(), value);
        }
    }
}

fn inspect_section<'a>(map: &'a NodeIdMap, section: NodeId, inspected: &mut Inspected<'a>) {
    let Some(members) = map.array_wrapper_content(section) else {
        return;
    };
    for member in map.iter_array_wrapper(members.id()) {
        if member.kind() != NodeKind::SectionMember {
            continue;
        }
        let Some(pair) = map.child_xor_by_attribute_index(
            member.id(),
            2,
            Some(&[NodeKind::IdentifierPairedExpression]),
        ) else {
            continue;
        };
        let Some(name) = map
            .child_ast_by_attribute_index(pair.id(), 0, Some(&[NodeKind::Identifier]))
            .and_then(|node| node.identifier_text())
        else {
            continue;
        };
        let binder = map.child_xor_by_attribute_index(pair.id(), 2, None).unwrap_or(pair);
        add_binding(inspected, name.to_string(), binder);
    }
}

fn inspect_invoke<'a>(
    map: &'a NodeIdMap,
    position: Position,
    invoke: XorNode<'a>,
    inspected: &mut Inspected<'a>,
) {
    if inspected.invoke_expression.is_some() {
        return;
    }

    // The callee name: when this invoke is the first tail of a recursive
    // primary expression, the head two ancestors up names it.
    let mut name = None;
    if invoke.attribute_index() == Some(0) {
        if let Some(wrapper) = map.parent_id(invoke.id()) {
            if let Some(recursive) = map.parent_id(wrapper) {
                let is_recursive_primary = map
                    .xor(recursive)
                    .is_some_and(|xor| xor.kind() == NodeKind::RecursivePrimaryExpression);
                if is_recursive_primary {
                    name = map
                        .child_ast_by_attribute_index(
                            recursive,
                            0,
                            Some(&[NodeKind::IdentifierExpression]),
                        )
                        .and_then(|head| {
                            map.child_ast_by_attribute_index(
                                head.id,
                                1,
                                Some(&[NodeKind::Identifier]),
                            )
                        })
                        .and_then(|identifier| identifier.identifier_text())
                        .map(str::to_string);
                }
            }
        }
    }

    let mut argument_index = None;
    if let Some(wrapper) = map.array_wrapper_content(invoke.id()) {
        for (index, csv) in map.iter_array_wrapper(wrapper.id()).iter().enumerate() {
            if csv.kind() == NodeKind::Csv && is_in_xor(map, position, *csv) {
                argument_index = Some(index);
                break;
            }
        }
    }

    let arity = map.iter_invoke_arguments(invoke.id()).len();
    inspected.invoke_expression = Some(InspectedInvoke {
        node: invoke,
        name,
        arity,
        argument_index,
    });
}

fn inspect_identifier<'a>(
    map: &'a NodeIdMap,
    position: Position,
    identifier: XorNode<'a>,
    inspected: &mut Inspected<'a>,
) {
    let Some(name) = identifier.ast().and_then(|node| node.identifier_text()) else {
        return;
    };
    add_binding(inspected, name.to_string(), identifier);
    if inspected.position_identifier.is_none()
        && (is_in_xor(map, position, identifier) || is_on_xor_end(map, position, identifier))
    {
        inspected.position_identifier = Some(PositionIdentifier {
            name: name.to_string(),
            node: identifier,
        });
    }
}

#[cfg(test)]
mod tests {
    use pq_lang::{LexerSnapshot, LexerState, ParseOk, Settings, try_parse};

    use super::*;

    fn parse(text: &str) -> ParseOk {
        let snapshot = LexerSnapshot::try_from(&LexerState::from_text(text)).unwrap();
        try_parse(&Settings::default(), &snapshot).unwrap()
    }

    fn scope_keys(inspected: &Inspected<'_>) -> Vec<String> {
        inspected.scope.keys().cloned().collect()
    }

    #[test]
    fn let_bindings_before_in() {
        let text = "let x = 1, y = x + 1 in y";
        let ok = parse(text);
        // Cursor immediately before `in`.
        let position = Position::new(0, 24);
        let inspected = try_inspection(position, &ok.node_map, &ok.leaf_ids).unwrap();
        assert!(inspected.scope.contains_key("x"));
        assert!(inspected.scope.contains_key("y"));
    }

    #[test]
    fn let_bindings_hide_forward_references() {
        let text = "let x = 1, y = x + 1 in y";
        let ok = parse(text);
        // Cursor immediately after `x =`.
        let position = Position::new(0, 7);
        let inspected = try_inspection(position, &ok.node_map, &ok.leaf_ids).unwrap();
        assert!(!inspected.scope.contains_key("x"));
        assert!(!inspected.scope.contains_key("y"));
    }

    #[test]
    fn each_binds_underscore() {
        let ok = parse("each _ + 1");
        let inspected =
            try_inspection(Position::new(0, 8), &ok.node_map, &ok.leaf_ids).unwrap();
        assert!(inspected.scope.contains_key("_"));
        assert!(
            inspected
                .nodes
                .iter()
                .any(|node| node.node.kind() == NodeKind::EachExpression)
        );
    }

    #[test]
    fn function_parameters_visible_in_body() {
        let ok = parse("(x, optional y as number) => x + y");
        let inspected =
            try_inspection(Position::new(0, 32), &ok.node_map, &ok.leaf_ids).unwrap();
        assert!(inspected.scope.contains_key("x"));
        assert!(inspected.scope.contains_key("y"));
    }

    #[test]
    fn inner_binding_shadows_outer() {
        let text = "let v = 1 in each let v = 2 in v + 1";
        let ok = parse(text);
        // Cursor on the `+` inside the inner let's body.
        let inspected =
            try_inspection(Position::new(0, 34), &ok.node_map, &ok.leaf_ids).unwrap();
        let binder = inspected.scope.get("v").expect("v in scope");
        // The inner binder wins: it is the literal 2, not the outer 1.
        let node = binder.ast().expect("binder is parsed");
        assert_eq!(node.token_range.position_start, Position::new(0, 26));
    }

    #[test]
    fn invoke_context_records_name_and_argument() {
        let text = "Table.AddColumn(tbl, 1)";
        let ok = parse(text);
        // Cursor inside the second argument.
        let inspected =
            try_inspection(Position::new(0, 22), &ok.node_map, &ok.leaf_ids).unwrap();
        let invoke = inspected.invoke_expression.expect("invoke context");
        assert_eq!(invoke.name.as_deref(), Some("Table.AddColumn"));
        assert_eq!(invoke.arity, 2);
        assert_eq!(invoke.argument_index, Some(1));
    }

    #[test]
    fn identifier_under_cursor_is_its_own_binding() {
        let ok = parse("let abc = 1 in abc");
        // Cursor at the end of the trailing `abc`.
        let inspected =
            try_inspection(Position::new(0, 18), &ok.node_map, &ok.leaf_ids).unwrap();
        let identifier = inspected.position_identifier.expect("position identifier");
        assert_eq!(identifier.name, "abc");
        assert!(inspected.scope.contains_key("abc"));
    }

    #[test]
    fn record_keys_bounded_by_position() {
        let text = "[a = 1, b = a + 1]";
        let ok = parse(text);
        // Cursor inside b's value: a is visible, b is not yet.
        let inspected =
            try_inspection(Position::new(0, 13), &ok.node_map, &ok.leaf_ids).unwrap();
        assert!(inspected.scope.contains_key("a"));
        assert!(!inspected.scope.contains_key("b"));
        assert!(
            inspected
                .nodes
                .iter()
                .any(|node| node.node.kind() == NodeKind::RecordExpression)
        );
    }

    #[test]
    fn section_members_all_visible() {
        let text = "section S; x = 1; shared y = x;";
        let ok = parse(text);
        let inspected =
            try_inspection(Position::new(0, 30), &ok.node_map, &ok.leaf_ids).unwrap();
        assert!(inspected.scope.contains_key("x"));
        assert!(inspected.scope.contains_key("y"));
    }

    #[test]
    fn scope_on_partial_tree() {
        let settings = Settings::default();
        let snapshot =
            LexerSnapshot::try_from(&LexerState::from_text("let x = 1, y = ")).unwrap();
        let failure = try_parse(&settings, &snapshot).unwrap_err();
        let map = failure.context.node_map();
        let leaf_ids = map.leaf_ids().to_vec();
        let inspected = try_inspection(Position::new(0, 15), map, &leaf_ids).unwrap();
        assert!(inspected.scope.contains_key("x"));
        assert!(!inspected.scope.contains_key("y"));
    }

    #[test]
    fn no_binder_after_cursor() {
        let text = "let alpha = 1, beta = 2 in alpha";
        let ok = parse(text);
        let position = Position::new(0, 13);
        let inspected = try_inspection(position, &ok.node_map, &ok.leaf_ids).unwrap();
        for (_, binder) in &inspected.scope {
            if let Some(start) = xor_position_start(*binder) {
                assert!(start <= position);
            }
        }
    }
}
