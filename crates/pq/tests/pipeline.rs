//! End-to-end lex + parse tests.

use pq::{
    LexError, LexParseError, LiteralKind, NodeData, NodeKind, ParseError, ParserVariant, Position,
    Settings, try_lex_parse,
};

// ============================================================================
// Successful documents
// ============================================================================

#[test]
fn numeric_literal_document() {
    let ok = try_lex_parse(&Settings::default(), "1").unwrap();
    let root = ok.node_map.ast_node(ok.root).unwrap();
    assert_eq!(root.kind, NodeKind::LiteralExpression);
    assert_eq!(
        root.data,
        Some(NodeData::Literal {
            kind: LiteralKind::Numeric,
            text: "1".into()
        })
    );
    assert_eq!(ok.leaf_ids.len(), 1);
}

#[test]
fn is_chain_left_associates() {
    let ok = try_lex_parse(&Settings::default(), "1 is number is number").unwrap();
    let root = ok.node_map.ast_node(ok.root).unwrap();
    assert_eq!(root.kind, NodeKind::IsExpression);
    let left = ok
        .node_map
        .child_ast_by_attribute_index(ok.root, 0, Some(&[NodeKind::IsExpression]))
        .expect("left operand is the inner is-expression");
    assert_eq!(left.kind, NodeKind::IsExpression);
}

#[test]
fn parser_variants_agree_on_documents() {
    let documents = [
        "let x = 1, y = x + 1 in y",
        "section S; shared f = (x as number) => x * 2;",
        "[a = {1..3}, b = try f(a) otherwise null]",
        "each _[x] & \"suffix\"",
    ];
    for text in documents {
        let recursive = try_lex_parse(
            &Settings::with_variant(ParserVariant::RecursiveDescent),
            text,
        )
        .unwrap();
        let combinatorial = try_lex_parse(
            &Settings::with_variant(ParserVariant::Combinatorial),
            text,
        )
        .unwrap();
        let recursive_root = recursive.node_map.ast_node(recursive.root).unwrap();
        let combinatorial_root = combinatorial.node_map.ast_node(combinatorial.root).unwrap();
        assert_eq!(recursive_root.kind, combinatorial_root.kind, "{text:?}");
        assert_eq!(
            recursive_root.token_range, combinatorial_root.token_range,
            "{text:?}"
        );
        assert_eq!(
            recursive.leaf_ids.len(),
            combinatorial.leaf_ids.len(),
            "{text:?}"
        );
    }
}

#[test]
fn comments_do_not_reach_the_parser() {
    let ok = try_lex_parse(&Settings::default(), "1 /* two */ + 3 // done").unwrap();
    assert_eq!(ok.snapshot.comments().len(), 2);
    let root = ok.node_map.ast_node(ok.root).unwrap();
    assert_eq!(root.kind, NodeKind::ArithmeticExpression);
}

// ============================================================================
// Lexical failures
// ============================================================================

#[test]
fn open_block_comment_is_a_lex_error() {
    let err = try_lex_parse(&Settings::default(), "/* open").unwrap_err();
    match err {
        LexParseError::Lex(LexError::UnterminatedMultilineComment { position }) => {
            assert_eq!(position, Position::new(0, 0));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn open_text_literal_is_a_lex_error() {
    let err = try_lex_parse(&Settings::default(), "x = \"abc\n1").unwrap_err();
    assert!(matches!(
        err,
        LexParseError::Lex(LexError::UnterminatedText { .. })
    ));
}

#[test]
fn line_error_is_a_lex_error() {
    let err = try_lex_parse(&Settings::default(), "1 + #bogus").unwrap_err();
    match err {
        LexParseError::Lex(LexError::LineErrors(map)) => {
            assert_eq!(map.keys().copied().collect::<Vec<u32>>(), vec![0]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

// ============================================================================
// Parse failures keep the partial tree
// ============================================================================

#[test]
fn unterminated_list_preserves_context() {
    let err = try_lex_parse(&Settings::default(), "{ 1, 2, ").unwrap_err();
    let LexParseError::Parse { error, context } = err else {
        panic!("expected a parse error");
    };
    assert!(matches!(error, ParseError::UnterminatedBracket { .. }));

    let map = context.node_map();
    let root = context.root().expect("partial root");
    let root_xor = map.expect_xor(root).unwrap();
    assert_eq!(root_xor.kind(), NodeKind::ListExpression);
    assert!(!root_xor.is_ast());
    // Both completed items survive in the partial tree.
    let wrapper = map.array_wrapper_content(root).expect("wrapper");
    let csv_count = map
        .child_ids(wrapper.id())
        .iter()
        .filter(|&&id| map.ast_node(id).is_some())
        .count();
    assert_eq!(csv_count, 2);
}

#[test]
fn error_messages_are_looked_up_by_locale() {
    let err = try_lex_parse(&Settings::default(), "{ 1, 2, ").unwrap_err();
    assert_eq!(err.code().as_str(), "E105");
    assert_eq!(err.message("en-US"), "the bracket is never closed");
    // Unknown locales fall back to en-US.
    assert_eq!(err.message("de-DE"), err.message("en-US"));
}

#[test]
fn grapheme_column_reported_for_errors() {
    // Two-code-unit emoji before the offending token shifts code units
    // but not grapheme columns.
    let err = try_lex_parse(&Settings::default(), "\"\u{1F600}\" 1").unwrap_err();
    let LexParseError::Parse { error, .. } = err else {
        panic!("expected a parse error");
    };
    match error {
        ParseError::UnusedTokensRemain {
            first_unused,
            column,
        } => {
            assert_eq!(first_unused.position_start, Position::new(0, 5));
            assert_eq!(column, 4);
        }
        other => panic!("unexpected error {other:?}"),
    }
}
