//! End-to-end position inspection tests.

use pq::{
    LexParseError, NodeKind, Position, Settings, TypeCache, TypeInspector, TypeKind,
    try_inspection, try_lex_parse,
};

// ============================================================================
// Scope
// ============================================================================

#[test]
fn let_scope_depends_on_cursor() {
    let text = "let x = 1, y = x + 1 in y";
    let ok = try_lex_parse(&Settings::default(), text).unwrap();

    // Immediately before `in`: both bindings are visible.
    let before_in = try_inspection(Position::new(0, 21), &ok.node_map, &ok.leaf_ids).unwrap();
    assert!(before_in.scope.contains_key("x"));
    assert!(before_in.scope.contains_key("y"));

    // Immediately after `x =`: neither is.
    let after_equal = try_inspection(Position::new(0, 7), &ok.node_map, &ok.leaf_ids).unwrap();
    assert!(!after_equal.scope.contains_key("x"));
    assert!(!after_equal.scope.contains_key("y"));
}

#[test]
fn scope_iterates_in_insertion_order() {
    let text = "let outer = 1 in each let inner = 2 in inner + outer";
    let ok = try_lex_parse(&Settings::default(), text).unwrap();
    let inspected =
        try_inspection(Position::new(0, 45), &ok.node_map, &ok.leaf_ids).unwrap();
    let keys: Vec<&String> = inspected.scope.keys().collect();
    // Inner bindings were inserted first, walking leaf to root.
    assert_eq!(keys, ["inner", "_", "outer"]);
}

#[test]
fn invoke_context_via_facade() {
    let text = "let f = (a, b) => a in f(1, 2)";
    let ok = try_lex_parse(&Settings::default(), text).unwrap();
    // Cursor inside the first argument.
    let inspected =
        try_inspection(Position::new(0, 26), &ok.node_map, &ok.leaf_ids).unwrap();
    let invoke = inspected.invoke_expression.expect("invoke context");
    assert_eq!(invoke.name.as_deref(), Some("f"));
    assert_eq!(invoke.arity, 2);
    assert_eq!(invoke.argument_index, Some(0));
    assert!(
        inspected
            .nodes
            .iter()
            .any(|node| node.node.kind() == NodeKind::InvokeExpression)
    );
}

#[test]
fn inspection_runs_on_partial_trees() {
    let text = "let x = 1, y = ";
    let err = try_lex_parse(&Settings::default(), text).unwrap_err();
    let LexParseError::Parse { context, .. } = err else {
        panic!("expected a parse error");
    };
    let map = context.node_map();
    let leaf_ids = map.leaf_ids().to_vec();
    let inspected = try_inspection(Position::new(0, 15), map, &leaf_ids).unwrap();
    assert!(inspected.scope.contains_key("x"));
    assert!(!inspected.scope.contains_key("y"));
}

// ============================================================================
// Types at a position
// ============================================================================

#[test]
fn type_of_binder_at_cursor() {
    let text = "let x = [a = 1], y = x in y";
    let ok = try_lex_parse(&Settings::default(), text).unwrap();
    let inspected =
        try_inspection(Position::new(0, 25), &ok.node_map, &ok.leaf_ids).unwrap();
    let binder = inspected.scope.get("x").expect("x in scope");

    let cache = TypeCache::default();
    let mut inspector = TypeInspector::new(&ok.node_map, &cache);
    let derived = inspector.type_of(binder.id());
    assert_eq!(derived.kind, TypeKind::Record);
}

#[test]
fn type_cache_persists_across_runs() {
    let text = "[a = 1]";
    let ok = try_lex_parse(&Settings::default(), text).unwrap();

    let mut cache = TypeCache::default();
    let mut first = TypeInspector::new(&ok.node_map, &cache);
    let derived = first.type_of(ok.root);
    assert_eq!(derived.kind, TypeKind::Record);
    cache.type_by_id.extend(first.into_delta());

    // A second run answers from the persistent cache.
    let mut second = TypeInspector::new(&ok.node_map, &cache);
    assert_eq!(second.type_of(ok.root), derived);
    assert!(second.into_delta().is_empty());
}

#[test]
fn types_never_fail_on_partial_trees() {
    let err = try_lex_parse(&Settings::default(), "if x then 1 else ").unwrap_err();
    let LexParseError::Parse { context, .. } = err else {
        panic!("expected a parse error");
    };
    let map = context.node_map();
    let root = context.root().expect("partial root");
    let cache = TypeCache::default();
    let mut inspector = TypeInspector::new(map, &cache);
    // The else branch is missing; the if-expression defers to unknown.
    assert_eq!(inspector.type_of(root).kind, TypeKind::Unknown);
}
