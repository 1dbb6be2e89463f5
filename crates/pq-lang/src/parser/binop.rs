//! Binary-operator parsing.
//!
//! Two implementations share the production protocol and must produce
//! identical trees: the recursive-descent variant reads one precedence
//! layer per call, while the combinatorial variant fuses adjacent operator
//! reads into a single precedence-climbing loop. Both build
//! left-associative chains by wrapping the completed left operand.

use pq_core::TokenKind;

use super::ast::{ConstantKind, NodeId, NodeKind};
use super::error::ParseError;
use super::state::ParserState;

pub(crate) struct BinOp {
    pub token: TokenKind,
    pub constant: ConstantKind,
    pub node_kind: NodeKind,
    pub precedence: u8,
    /// The right operand is a nullable primitive type, not an expression.
    pub type_rhs: bool,
}

const MIN_PRECEDENCE: u8 = 1;
const MAX_PRECEDENCE: u8 = 9;

macro_rules! binop {
    ($token:ident, $constant:ident, $node_kind:ident, $precedence:expr, $type_rhs:expr) => {
        BinOp {
            token: TokenKind::$token,
            constant: ConstantKind::$constant,
            node_kind: NodeKind::$node_kind,
            precedence: $precedence,
            type_rhs: $type_rhs,
        }
    };
}

const BIN_OPS: &[BinOp] = &[
    binop!(KeywordOr, Or, LogicalExpression, 1, false),
    binop!(KeywordAnd, And, LogicalExpression, 2, false),
    binop!(KeywordIs, Is, IsExpression, 3, true),
    binop!(KeywordAs, As, AsExpression, 4, true),
    binop!(Equal, Equal, EqualityExpression, 5, false),
    binop!(NotEqual, NotEqual, EqualityExpression, 5, false),
    binop!(LessThan, LessThan, RelationalExpression, 6, false),
    binop!(LessThanEqualTo, LessThanEqualTo, RelationalExpression, 6, false),
    binop!(GreaterThan, GreaterThan, RelationalExpression, 6, false),
    binop!(
        GreaterThanEqualTo,
        GreaterThanEqualTo,
        RelationalExpression,
        6,
        false
    ),
    binop!(Plus, Plus, ArithmeticExpression, 7, false),
    binop!(Minus, Minus, ArithmeticExpression, 7, false),
    binop!(Ampersand, Ampersand, ArithmeticExpression, 7, false),
    binop!(Asterisk, Asterisk, ArithmeticExpression, 8, false),
    binop!(Division, Division, ArithmeticExpression, 8, false),
    binop!(KeywordMeta, Meta, MetadataExpression, 9, false),
];

fn binop_for(kind: TokenKind) -> Option<&'static BinOp> {
    BIN_OPS.iter().find(|op| op.token == kind)
}

impl ParserState<'_> {
    fn current_binop(&self) -> Option<&'static BinOp> {
        self.current_token_kind().and_then(binop_for)
    }

    /// Layered recursive descent: one left-associative loop per precedence
    /// level, from loosest (`or`) to tightest (`meta`).
    pub(crate) fn read_binary_expression_recursive(&mut self) -> Result<NodeId, ParseError> {
        self.read_precedence_layer(MIN_PRECEDENCE)
    }

    fn read_precedence_layer(&mut self, precedence: u8) -> Result<NodeId, ParseError> {
        if precedence > MAX_PRECEDENCE {
            return self.read_unary_operand();
        }
        let mut left = self.read_precedence_layer(precedence + 1)?;
        while let Some(op) = self
            .current_binop()
            .filter(|op| op.precedence == precedence)
        {
            self.start_wrapping_context(op.node_kind, left)?;
            self.read_token_kind_as_constant(op.token, op.constant)?;
            if op.type_rhs {
                self.read_nullable_primitive_type()?;
            } else {
                self.read_precedence_layer(precedence + 1)?;
            }
            left = self.end_context(None)?;
        }
        Ok(left)
    }

    /// Precedence climbing: a single loop over the operator table, fusing
    /// what the layered variant spreads across its call stack.
    pub(crate) fn read_binary_expression_combinatorial(&mut self) -> Result<NodeId, ParseError> {
        let left = self.read_unary_operand()?;
        self.read_binop_chain(left, MIN_PRECEDENCE)
    }

    fn read_binop_chain(
        &mut self,
        mut left: NodeId,
        min_precedence: u8,
    ) -> Result<NodeId, ParseError> {
        // The ceiling keeps a tighter operator from wrapping a node that a
        // looser operator already completed, matching the layered variant.
        let mut ceiling = u8::MAX;
        while let Some(op) = self
            .current_binop()
            .filter(|op| op.precedence >= min_precedence && op.precedence <= ceiling)
        {
            self.start_wrapping_context(op.node_kind, left)?;
            self.read_token_kind_as_constant(op.token, op.constant)?;
            if op.type_rhs {
                self.read_nullable_primitive_type()?;
            } else {
                self.read_operand_with_climb(op.precedence)?;
            }
            left = self.end_context(None)?;
            ceiling = op.precedence;
        }
        Ok(left)
    }

    /// Read a right operand, folding the tighter-binding chain into it
    /// before the enclosing operator node completes. A single fold is
    /// enough: the recursive chain consumes every operator above this
    /// precedence that its own ceiling allows.
    fn read_operand_with_climb(&mut self, precedence: u8) -> Result<(), ParseError> {
        let right = self.read_unary_operand()?;
        if self
            .current_binop()
            .is_some_and(|next| next.precedence > precedence)
        {
            self.read_binop_chain(right, precedence + 1)?;
        }
        Ok(())
    }
}
