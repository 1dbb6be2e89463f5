//! The structural type inspector.
//!
//! Derives a type for a focused XOR node, bottom-up with memoization.
//! Inference is total: unknown subtrees and unfinished contexts yield
//! `Unknown` rather than failing, so it runs on error-partial trees.

use std::collections::HashMap;

use indexmap::IndexMap;
use pq_lang::{
    ConstantKind, LiteralKind, NodeData, NodeId, NodeIdMap, NodeKind, PrimitiveTypeKind, XorNode,
};

/// The closed family of structural types.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeKind {
    Action,
    Any,
    AnyNonNull,
    Binary,
    Date,
    DateTime,
    DateTimeZone,
    Duration,
    Function,
    List,
    Logical,
    None,
    Null,
    Number,
    Record,
    Table,
    Text,
    Time,
    Type,
    Unknown,
}

impl From<PrimitiveTypeKind> for TypeKind {
    fn from(kind: PrimitiveTypeKind) -> Self {
        match kind {
            PrimitiveTypeKind::Action => TypeKind::Action,
            PrimitiveTypeKind::Any => TypeKind::Any,
            PrimitiveTypeKind::AnyNonNull => TypeKind::AnyNonNull,
            PrimitiveTypeKind::Binary => TypeKind::Binary,
            PrimitiveTypeKind::Date => TypeKind::Date,
            PrimitiveTypeKind::DateTime => TypeKind::DateTime,
            PrimitiveTypeKind::DateTimeZone => TypeKind::DateTimeZone,
            PrimitiveTypeKind::Duration => TypeKind::Duration,
            PrimitiveTypeKind::Function => TypeKind::Function,
            PrimitiveTypeKind::List => TypeKind::List,
            PrimitiveTypeKind::Logical => TypeKind::Logical,
            PrimitiveTypeKind::None => TypeKind::None,
            PrimitiveTypeKind::Null => TypeKind::Null,
            PrimitiveTypeKind::Number => TypeKind::Number,
            PrimitiveTypeKind::Record => TypeKind::Record,
            PrimitiveTypeKind::Table => TypeKind::Table,
            PrimitiveTypeKind::Text => TypeKind::Text,
            PrimitiveTypeKind::Time => TypeKind::Time,
            PrimitiveTypeKind::Type => TypeKind::Type,
        }
    }
}

/// A structural type: its kind, nullability, and an optional richer shape.
#[derive(Clone, PartialEq, Debug)]
pub struct SemanticType {
    pub kind: TypeKind,
    pub is_nullable: bool,
    pub extended: Option<ExtendedType>,
}

impl SemanticType {
    pub fn primitive(kind: TypeKind) -> Self {
        Self {
            kind,
            is_nullable: kind == TypeKind::Null,
            extended: None,
        }
    }

    pub fn unknown() -> Self {
        Self::primitive(TypeKind::Unknown)
    }

    pub fn any() -> Self {
        Self::primitive(TypeKind::Any)
    }
}

/// Richer shapes for records, functions, and lists.
#[derive(Clone, PartialEq, Debug)]
pub enum ExtendedType {
    Record {
        fields: IndexMap<String, SemanticType>,
        is_open: bool,
    },
    Function {
        parameters: Vec<FunctionParameter>,
        return_type: Box<SemanticType>,
    },
    List {
        item: Box<SemanticType>,
    },
}

/// A function parameter's declared shape. Nullability is the disjunction
/// of the `optional` marker and the declared type's nullability.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionParameter {
    pub name: String,
    pub is_optional: bool,
    pub is_nullable: bool,
    pub kind: Option<TypeKind>,
}

/// Persistent cache of derived types, keyed by node id. Safe to reuse
/// across inspections of the same parse; ids are never recycled.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TypeCache {
    pub type_by_id: HashMap<NodeId, SemanticType>,
}

/// One inspection run: reads through the persistent cache and records new
/// derivations in a per-run delta.
pub struct TypeInspector<'a> {
    map: &'a NodeIdMap,
    given: &'a TypeCache,
    delta: HashMap<NodeId, SemanticType>,
}

impl<'a> TypeInspector<'a> {
    pub fn new(map: &'a NodeIdMap, given: &'a TypeCache) -> Self {
        Self {
            map,
            given,
            delta: HashMap::new(),
        }
    }

    /// The per-run derivations, for merging back into the caller's cache.
    pub fn into_delta(self) -> HashMap<NodeId, SemanticType> {
        self.delta
    }

    pub fn type_of(&mut self, id: NodeId) -> SemanticType {
        if let Some(known) = self.given.type_by_id.get(&id) {
            return known.clone();
        }
        if let Some(known) = self.delta.get(&id) {
            return known.clone();
        }
        let derived = self.derive(id);
        self.delta.insert(id, derived.clone());
        derived
    }

    fn derive(&mut self, id: NodeId) -> SemanticType {
        let Some(xor) = self.map.xor(id) else {
            return SemanticType::unknown();
        };
        match xor.kind() {
            NodeKind::LiteralExpression => self.literal_type(xor),
            NodeKind::ParenthesizedExpression => self.child_type(id, 1),
            NodeKind::LetExpression => self.child_type(id, 3),
            NodeKind::OtherwiseExpression => self.child_type(id, 1),
            NodeKind::MetadataExpression => self.child_type(id, 0),
            NodeKind::UnaryExpression => self.unary_type(id),
            NodeKind::ArithmeticExpression => self.arithmetic_type(id),
            NodeKind::EqualityExpression
            | NodeKind::RelationalExpression
            | NodeKind::LogicalExpression
            | NodeKind::IsExpression => SemanticType::primitive(TypeKind::Logical),
            NodeKind::AsExpression => self.declared_value_type(id, 2),
            NodeKind::IfExpression => {
                let then_type = self.child_type(id, 3);
                let else_type = self.child_type(id, 5);
                unify(then_type, else_type)
            }
            NodeKind::EachExpression => self.each_type(id),
            NodeKind::FunctionExpression => self.function_type(id),
            NodeKind::ListExpression | NodeKind::ListLiteral => self.list_type(id),
            NodeKind::RecordExpression | NodeKind::RecordLiteral => self.record_type(id),
            NodeKind::RangeExpression => SemanticType {
                kind: TypeKind::List,
                is_nullable: false,
                extended: Some(ExtendedType::List {
                    item: Box::new(SemanticType::primitive(TypeKind::Number)),
                }),
            },
            NodeKind::RecursivePrimaryExpression => self.recursive_primary_type(id),
            NodeKind::ErrorRaisingExpression | NodeKind::NotImplementedExpression => {
                SemanticType::primitive(TypeKind::None)
            }
            NodeKind::ErrorHandlingExpression => SemanticType::any(),
            NodeKind::TypePrimaryType
            | NodeKind::PrimitiveType
            | NodeKind::RecordType
            | NodeKind::ListType
            | NodeKind::FunctionType
            | NodeKind::TableType
            | NodeKind::NullableType
            | NodeKind::NullablePrimitiveType
            | NodeKind::AsType
            | NodeKind::AsNullablePrimitiveType => SemanticType::primitive(TypeKind::Type),
            _ => SemanticType::unknown(),
        }
    }

    fn child_type(&mut self, parent: NodeId, attribute_index: u32) -> SemanticType {
        match self
            .map
            .child_xor_by_attribute_index(parent, attribute_index, None)
        {
            Some(child) => self.type_of(child.id()),
            None => SemanticType::unknown(),
        }
    }

    fn literal_type(&self, xor: XorNode<'_>) -> SemanticType {
        let Some(NodeData::Literal { kind, .. }) = xor.ast().and_then(|node| node.data.as_ref())
        else {
            return SemanticType::unknown();
        };
        let kind = match kind {
            LiteralKind::Logical => TypeKind::Logical,
            LiteralKind::Null => TypeKind::Null,
            LiteralKind::Numeric => TypeKind::Number,
            LiteralKind::Text => TypeKind::Text,
        };
        SemanticType::primitive(kind)
    }

    fn unary_type(&mut self, id: NodeId) -> SemanticType {
        let negation = self
            .map
            .child_xor_by_attribute_index(id, 0, Some(&[NodeKind::ArrayWrapper]))
            .map(|wrapper| {
                self.map
                    .iter_array_wrapper(wrapper.id())
                    .iter()
                    .filter_map(|constant| constant.ast())
                    .any(|node| node.data == Some(NodeData::Constant(ConstantKind::Not)))
            })
            .unwrap_or(false);
        if negation {
            SemanticType::primitive(TypeKind::Logical)
        } else {
            SemanticType::primitive(TypeKind::Number)
        }
    }

    fn arithmetic_type(&mut self, id: NodeId) -> SemanticType {
        let concatenation = self
            .map
            .child_ast_by_attribute_index(id, 1, Some(&[NodeKind::Constant]))
            .is_some_and(|node| node.data == Some(NodeData::Constant(ConstantKind::Ampersand)));
        if concatenation {
            SemanticType::any()
        } else {
            SemanticType::primitive(TypeKind::Number)
        }
    }

    /// The value type declared by an `as` clause's nullable-primitive-type.
    fn declared_value_type(&mut self, parent: NodeId, attribute_index: u32) -> SemanticType {
        match self
            .map
            .child_xor_by_attribute_index(parent, attribute_index, None)
        {
            Some(declared) => self.primitive_value_type(declared),
            None => SemanticType::unknown(),
        }
    }

    /// Interpret a type node as the type of values it declares.
    fn primitive_value_type(&mut self, xor: XorNode<'_>) -> SemanticType {
        match xor.kind() {
            NodeKind::PrimitiveType => {
                let Some(NodeData::PrimitiveType(kind)) =
                    xor.ast().and_then(|node| node.data.as_ref())
                else {
                    return SemanticType::unknown();
                };
                SemanticType::primitive(TypeKind::from(*kind))
            }
            NodeKind::NullablePrimitiveType => {
                let mut inner = self.declared_child_value_type(xor.id(), 1);
                inner.is_nullable = true;
                inner
            }
            NodeKind::AsNullablePrimitiveType => self.declared_child_value_type(xor.id(), 1),
            _ => SemanticType::unknown(),
        }
    }

    fn declared_child_value_type(&mut self, parent: NodeId, attribute_index: u32) -> SemanticType {
        match self
            .map
            .child_xor_by_attribute_index(parent, attribute_index, None)
        {
            Some(child) => self.primitive_value_type(child),
            None => SemanticType::unknown(),
        }
    }

    fn each_type(&mut self, id: NodeId) -> SemanticType {
        let body = self.child_type(id, 1);
        SemanticType {
            kind: TypeKind::Function,
            is_nullable: false,
            extended: Some(ExtendedType::Function {
                parameters: vec![FunctionParameter {
                    name: "_".to_string(),
                    is_optional: false,
                    is_nullable: true,
                    kind: None,
                }],
                return_type: Box::new(body),
            }),
        }
    }

    fn function_type(&mut self, id: NodeId) -> SemanticType {
        let mut parameters = Vec::new();
        if let Some(parameter_list) =
            self.map
                .child_xor_by_attribute_index(id, 0, Some(&[NodeKind::ParameterList]))
        {
            if let Some(wrapper) = self.map.array_wrapper_content(parameter_list.id()) {
                for parameter in self.map.iter_csv_contents(wrapper.id()) {
                    if parameter.kind() != NodeKind::Parameter {
                        continue;
                    }
                    parameters.push(self.parameter_shape(parameter.id()));
                }
            }
        }
        let return_type = match self
            .map
            .child_xor_by_attribute_index(id, 1, Some(&[NodeKind::AsNullablePrimitiveType]))
        {
            Some(declared) => self.primitive_value_type(declared),
            None => self.child_type(id, 3),
        };
        SemanticType {
            kind: TypeKind::Function,
            is_nullable: false,
            extended: Some(ExtendedType::Function {
                parameters,
                return_type: Box::new(return_type),
            }),
        }
    }

    fn parameter_shape(&mut self, parameter: NodeId) -> FunctionParameter {
        let name = self
            .map
            .child_ast_by_attribute_index(parameter, 1, Some(&[NodeKind::Identifier]))
            .and_then(|node| node.identifier_text())
            .unwrap_or("")
            .to_string();
        let is_optional = self
            .map
            .child_xor_by_attribute_index(parameter, 0, Some(&[NodeKind::Constant]))
            .is_some();
        let declared = self
            .map
            .child_xor_by_attribute_index(parameter, 2, Some(&[NodeKind::AsNullablePrimitiveType]))
            .map(|declared| self.primitive_value_type(declared));
        let declared_nullable = declared.as_ref().is_some_and(|t| t.is_nullable);
        FunctionParameter {
            name,
            is_optional,
            is_nullable: is_optional || declared_nullable,
            kind: declared.map(|t| t.kind),
        }
    }

    fn list_type(&mut self, id: NodeId) -> SemanticType {
        let mut item: Option<SemanticType> = None;
        for content in self.content_types(id) {
            item = Some(match item {
                None => content,
                Some(current) => unify(current, content),
            });
        }
        SemanticType {
            kind: TypeKind::List,
            is_nullable: false,
            extended: Some(ExtendedType::List {
                item: Box::new(item.unwrap_or_else(SemanticType::any)),
            }),
        }
    }

    fn record_type(&mut self, id: NodeId) -> SemanticType {
        let mut fields = IndexMap::new();
        for pair in self.map.iter_record_pairs(id) {
            let Some(key) = self
                .map
                .child_ast_by_attribute_index(
                    pair.id(),
                    0,
                    Some(&[NodeKind::GeneralizedIdentifier, NodeKind::Identifier]),
                )
                .and_then(|node| node.identifier_text())
            else {
                continue;
            };
            let value_type = self.child_type(pair.id(), 2);
            fields.insert(key.to_string(), value_type);
        }
        SemanticType {
            kind: TypeKind::Record,
            is_nullable: false,
            extended: Some(ExtendedType::Record {
                fields,
                is_open: false,
            }),
        }
    }

    fn content_types(&mut self, id: NodeId) -> Vec<SemanticType> {
        let Some(wrapper) = self.map.array_wrapper_content(id) else {
            return Vec::new();
        };
        let contents = self.map.iter_csv_contents(wrapper.id());
        contents
            .iter()
            .map(|content| self.type_of(content.id()))
            .collect()
    }

    /// An invocation of a known function yields its return type; anything
    /// else is unknown.
    fn recursive_primary_type(&mut self, id: NodeId) -> SemanticType {
        let Some(wrapper) = self.map.array_wrapper_content(id) else {
            return SemanticType::unknown();
        };
        let tails = self.map.iter_array_wrapper(wrapper.id());
        let Some(last) = tails.last() else {
            return SemanticType::unknown();
        };
        if last.kind() != NodeKind::InvokeExpression {
            return SemanticType::unknown();
        }
        let head_type = self.child_type(id, 0);
        match head_type.extended {
            Some(ExtendedType::Function { return_type, .. }) => *return_type,
            _ => SemanticType::unknown(),
        }
    }
}

fn unify(a: SemanticType, b: SemanticType) -> SemanticType {
    if a == b {
        return a;
    }
    if a.kind == TypeKind::Unknown || b.kind == TypeKind::Unknown {
        return SemanticType::unknown();
    }
    if a.kind == b.kind {
        return SemanticType {
            kind: a.kind,
            is_nullable: a.is_nullable || b.is_nullable,
            extended: None,
        };
    }
    SemanticType::any()
}

#[cfg(test)]
mod tests {
    use pq_lang::{LexerSnapshot, LexerState, ParseOk, Settings, try_parse};

    use super::*;

    fn parse(text: &str) -> ParseOk {
        let snapshot = LexerSnapshot::try_from(&LexerState::from_text(text)).unwrap();
        try_parse(&Settings::default(), &snapshot).unwrap()
    }

    fn root_type(text: &str) -> SemanticType {
        let ok = parse(text);
        let cache = TypeCache::default();
        let mut inspector = TypeInspector::new(&ok.node_map, &cache);
        inspector.type_of(ok.root)
    }

    #[test]
    fn literal_types() {
        assert_eq!(root_type("1").kind, TypeKind::Number);
        assert_eq!(root_type("\"a\"").kind, TypeKind::Text);
        assert_eq!(root_type("true").kind, TypeKind::Logical);
        let null = root_type("null");
        assert_eq!(null.kind, TypeKind::Null);
        assert!(null.is_nullable);
    }

    #[test]
    fn operator_types() {
        assert_eq!(root_type("1 + 2").kind, TypeKind::Number);
        assert_eq!(root_type("1 = 2").kind, TypeKind::Logical);
        assert_eq!(root_type("1 < 2 and true").kind, TypeKind::Logical);
        assert_eq!(root_type("1 is number").kind, TypeKind::Logical);
        assert_eq!(root_type("\"a\" & \"b\"").kind, TypeKind::Any);
        assert_eq!(root_type("not x").kind, TypeKind::Logical);
        assert_eq!(root_type("- x").kind, TypeKind::Number);
    }

    #[test]
    fn as_expression_takes_declared_type() {
        let t = root_type("x as nullable number");
        assert_eq!(t.kind, TypeKind::Number);
        assert!(t.is_nullable);
    }

    #[test]
    fn if_branches_unify() {
        assert_eq!(root_type("if c then 1 else 2").kind, TypeKind::Number);
        assert_eq!(root_type("if c then 1 else \"a\"").kind, TypeKind::Any);
    }

    #[test]
    fn record_shape() {
        let t = root_type("[a = 1, b = \"x\"]");
        assert_eq!(t.kind, TypeKind::Record);
        match t.extended {
            Some(ExtendedType::Record { fields, is_open }) => {
                assert!(!is_open);
                let keys: Vec<&String> = fields.keys().collect();
                assert_eq!(keys, ["a", "b"]);
                assert_eq!(fields["a"].kind, TypeKind::Number);
                assert_eq!(fields["b"].kind, TypeKind::Text);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn list_item_types() {
        let t = root_type("{1, 2}");
        match t.extended {
            Some(ExtendedType::List { item }) => assert_eq!(item.kind, TypeKind::Number),
            other => panic!("unexpected shape {other:?}"),
        }
        let mixed = root_type("{1, \"a\"}");
        match mixed.extended {
            Some(ExtendedType::List { item }) => assert_eq!(item.kind, TypeKind::Any),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn function_parameter_nullability() {
        let t = root_type("(x as number, optional y as nullable text) => x");
        match t.extended {
            Some(ExtendedType::Function { parameters, .. }) => {
                assert_eq!(parameters.len(), 2);
                assert!(!parameters[0].is_nullable);
                assert_eq!(parameters[0].kind, Some(TypeKind::Number));
                // optional marker or declared nullability both count
                assert!(parameters[1].is_optional);
                assert!(parameters[1].is_nullable);
                assert_eq!(parameters[1].kind, Some(TypeKind::Text));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn function_declared_return_type() {
        let t = root_type("(x) as number => x");
        match t.extended {
            Some(ExtendedType::Function { return_type, .. }) => {
                assert_eq!(return_type.kind, TypeKind::Number);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn each_is_a_unary_function() {
        let t = root_type("each 1");
        assert_eq!(t.kind, TypeKind::Function);
        match t.extended {
            Some(ExtendedType::Function {
                parameters,
                return_type,
            }) => {
                assert_eq!(parameters.len(), 1);
                assert_eq!(parameters[0].name, "_");
                assert_eq!(return_type.kind, TypeKind::Number);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn identifiers_are_unknown() {
        assert_eq!(root_type("x").kind, TypeKind::Unknown);
        assert_eq!(root_type("f(1)").kind, TypeKind::Unknown);
    }

    #[test]
    fn immediate_invocation_returns_body_type() {
        assert_eq!(root_type("((x) => 1)(2)").kind, TypeKind::Number);
    }

    #[test]
    fn error_raising_has_no_value() {
        assert_eq!(root_type("error \"x\"").kind, TypeKind::None);
        assert_eq!(root_type("...").kind, TypeKind::None);
    }

    #[test]
    fn type_expressions_are_types() {
        assert_eq!(root_type("type number").kind, TypeKind::Type);
        assert_eq!(root_type("type [a = number]").kind, TypeKind::Type);
    }

    #[test]
    fn partial_tree_is_unknown_not_an_error() {
        let snapshot = LexerSnapshot::try_from(&LexerState::from_text("let x = 1, y = ")).unwrap();
        let failure = try_parse(&Settings::default(), &snapshot).unwrap_err();
        let map = failure.context.node_map();
        let root = failure.context.root().unwrap();
        let cache = TypeCache::default();
        let mut inspector = TypeInspector::new(map, &cache);
        // A let context with no completed body defers to unknown.
        assert_eq!(inspector.type_of(root).kind, TypeKind::Unknown);
    }

    #[test]
    fn cache_short_circuits_derivation() {
        let ok = parse("1 + 2");
        let mut cache = TypeCache::default();
        cache.type_by_id.insert(
            ok.root,
            SemanticType::primitive(TypeKind::Duration),
        );
        let mut inspector = TypeInspector::new(&ok.node_map, &cache);
        assert_eq!(inspector.type_of(ok.root).kind, TypeKind::Duration);
        assert!(inspector.into_delta().is_empty());
    }

    #[test]
    fn delta_collects_new_derivations() {
        let ok = parse("1 + 2");
        let cache = TypeCache::default();
        let mut inspector = TypeInspector::new(&ok.node_map, &cache);
        inspector.type_of(ok.root);
        let delta = inspector.into_delta();
        assert!(delta.contains_key(&ok.root));
    }
}
