//! Recursive-descent productions for the M grammar.
//!
//! Every production follows the same protocol: open a context, read child
//! productions and tokens, then close the context into the finished AST
//! node. Constants wrap their tokens in `Constant` leaves so every child
//! of a node is itself a node. Optional children that are absent still
//! reserve their attribute slot, keeping attribute indexes fixed per kind.

use pq_core::keyword::GENERALIZED_IDENTIFIER_KINDS;
use pq_core::{Token, TokenKind};

use crate::settings::ParserVariant;

use super::ast::{ConstantKind, LiteralKind, NodeData, NodeId, NodeKind, PrimitiveTypeKind};
use super::error::{CsvContinuationKind, ParseError};
use super::state::ParserState;

/// Token kinds that begin a literal expression.
const LITERAL_KINDS: &[TokenKind] = &[
    TokenKind::HexLiteral,
    TokenKind::KeywordFalse,
    TokenKind::KeywordHashInfinity,
    TokenKind::KeywordHashNan,
    TokenKind::KeywordTrue,
    TokenKind::NullLiteral,
    TokenKind::NumericLiteral,
    TokenKind::TextLiteral,
];

/// Hash keywords that act as identifier-expression heads (`#table(…)`).
const HASH_HEAD_KINDS: &[TokenKind] = &[
    TokenKind::KeywordHashBinary,
    TokenKind::KeywordHashDate,
    TokenKind::KeywordHashDateTime,
    TokenKind::KeywordHashDateTimeZone,
    TokenKind::KeywordHashDuration,
    TokenKind::KeywordHashSections,
    TokenKind::KeywordHashShared,
    TokenKind::KeywordHashTable,
    TokenKind::KeywordHashTime,
];

const PRIMITIVE_TYPE_KINDS: &[TokenKind] = &[
    TokenKind::Identifier,
    TokenKind::NullLiteral,
    TokenKind::KeywordType,
];

impl ParserState<'_> {
    // ---- document --------------------------------------------------------

    /// An expression document: a single expression covering every token.
    pub(crate) fn read_expression_document(&mut self) -> Result<NodeId, ParseError> {
        let root = self.read_expression()?;
        self.expect_eof()?;
        Ok(root)
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        match self.current_token() {
            Some(token) => Err(self.error_unused_tokens(token.clone())),
            None => Ok(()),
        }
    }

    // ---- expressions -----------------------------------------------------

    pub(crate) fn read_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.current_token_kind() {
            Some(TokenKind::KeywordEach) => self.read_each_expression(),
            Some(TokenKind::KeywordLet) => self.read_let_expression(),
            Some(TokenKind::KeywordIf) => self.read_if_expression(),
            Some(TokenKind::KeywordError) => self.read_error_raising_expression(),
            Some(TokenKind::KeywordTry) => self.read_error_handling_expression(),
            Some(TokenKind::LeftParenthesis) => match self.scan_after_matching_paren() {
                Some(TokenKind::FatArrow) => self.read_function_expression(),
                Some(TokenKind::KeywordAs) => {
                    // `(x) as number => …` is a function, `(x) as number`
                    // is an as-expression; only a speculative read tells.
                    let backup = self.backup();
                    match self.read_function_expression() {
                        Ok(id) => Ok(id),
                        Err(_) => {
                            self.restore(&backup);
                            self.read_binary_expression()
                        }
                    }
                }
                _ => self.read_binary_expression(),
            },
            _ => self.read_binary_expression(),
        }
    }

    fn read_binary_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.settings().parser_variant {
            ParserVariant::RecursiveDescent => self.read_binary_expression_recursive(),
            ParserVariant::Combinatorial => self.read_binary_expression_combinatorial(),
        }
    }

    /// Kind of the token after the parenthesis matching the current one.
    fn scan_after_matching_paren(&self) -> Option<TokenKind> {
        let mut depth = 0usize;
        let mut index = self.token_index;
        loop {
            match self.token_kind_at(index)? {
                TokenKind::LeftParenthesis => depth += 1,
                TokenKind::RightParenthesis => {
                    depth -= 1;
                    if depth == 0 {
                        return self.token_kind_at(index + 1);
                    }
                }
                _ => {}
            }
            index += 1;
        }
    }

    fn read_each_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::EachExpression)?;
        self.read_token_kind_as_constant(TokenKind::KeywordEach, ConstantKind::Each)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_let_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::LetExpression)?;
        self.read_token_kind_as_constant(TokenKind::KeywordLet, ConstantKind::Let)?;
        self.read_csv_array(
            Self::read_identifier_paired_expression,
            TokenKind::KeywordIn,
            true,
            None,
        )?;
        self.read_token_kind_as_constant(TokenKind::KeywordIn, ConstantKind::In)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_if_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::IfExpression)?;
        self.read_token_kind_as_constant(TokenKind::KeywordIf, ConstantKind::If)?;
        self.read_expression()?;
        self.read_token_kind_as_constant(TokenKind::KeywordThen, ConstantKind::Then)?;
        self.read_expression()?;
        self.read_token_kind_as_constant(TokenKind::KeywordElse, ConstantKind::Else)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_error_raising_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ErrorRaisingExpression)?;
        self.read_token_kind_as_constant(TokenKind::KeywordError, ConstantKind::Error)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_error_handling_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ErrorHandlingExpression)?;
        self.read_token_kind_as_constant(TokenKind::KeywordTry, ConstantKind::Try)?;
        self.read_expression()?;
        if self.is_on(TokenKind::KeywordOtherwise) {
            self.read_otherwise_expression()?;
        } else {
            self.skip_attribute();
        }
        self.end_context(None)
    }

    fn read_otherwise_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::OtherwiseExpression)?;
        self.read_token_kind_as_constant(TokenKind::KeywordOtherwise, ConstantKind::Otherwise)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_function_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FunctionExpression)?;
        self.read_parameter_list()?;
        if self.is_on(TokenKind::KeywordAs) {
            self.read_as_nullable_primitive_type()?;
        } else {
            self.skip_attribute();
        }
        self.read_token_kind_as_constant(TokenKind::FatArrow, ConstantKind::FatArrow)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_parameter_list(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ParameterList)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftParenthesis, ConstantKind::LeftParenthesis)?;
        let on_eof = self.error_unterminated(TokenKind::RightParenthesis, &open);
        self.read_csv_array(
            Self::read_parameter,
            TokenKind::RightParenthesis,
            false,
            Some(on_eof),
        )?;
        self.read_closing_as_constant(
            TokenKind::RightParenthesis,
            ConstantKind::RightParenthesis,
            &open,
        )?;
        self.end_context(None)
    }

    fn read_parameter(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::Parameter)?;
        if self.is_on_constant_text("optional") {
            self.read_identifier_as_constant(ConstantKind::Optional)?;
        } else {
            self.skip_attribute();
        }
        self.read_identifier_node(&[TokenKind::Identifier])?;
        if self.is_on(TokenKind::KeywordAs) {
            self.read_as_nullable_primitive_type()?;
        } else {
            self.skip_attribute();
        }
        self.end_context(None)
    }

    // ---- unary and primary expressions ----------------------------------

    /// The operand both binary-operator parsers read between operators.
    pub(crate) fn read_unary_operand(&mut self) -> Result<NodeId, ParseError> {
        match self.current_token_kind() {
            Some(TokenKind::Plus) | Some(TokenKind::Minus) | Some(TokenKind::KeywordNot) => {
                self.read_unary_expression()
            }
            Some(TokenKind::KeywordType) => self.read_type_primary_type(),
            _ => self.read_recursive_primary_expression(),
        }
    }

    fn read_unary_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::UnaryExpression)?;
        self.start_context(NodeKind::ArrayWrapper)?;
        loop {
            match self.current_token_kind() {
                Some(TokenKind::Plus) => {
                    self.read_token_kind_as_constant(TokenKind::Plus, ConstantKind::Plus)?;
                }
                Some(TokenKind::Minus) => {
                    self.read_token_kind_as_constant(TokenKind::Minus, ConstantKind::Minus)?;
                }
                Some(TokenKind::KeywordNot) => {
                    self.read_token_kind_as_constant(TokenKind::KeywordNot, ConstantKind::Not)?;
                }
                _ => break,
            }
        }
        self.end_context(None)?;
        if self.is_on(TokenKind::KeywordType) {
            self.read_type_primary_type()?;
        } else {
            self.read_recursive_primary_expression()?;
        }
        self.end_context(None)
    }

    fn read_recursive_primary_expression(&mut self) -> Result<NodeId, ParseError> {
        let head = self.read_primary_expression()?;
        if !self.is_recursive_primary_expression_next() {
            return Ok(head);
        }
        self.start_wrapping_context(NodeKind::RecursivePrimaryExpression, head)?;
        self.start_context(NodeKind::ArrayWrapper)?;
        while let Some(kind) = self.current_token_kind() {
            match kind {
                TokenKind::LeftParenthesis => {
                    self.read_invoke_expression()?;
                }
                TokenKind::LeftBrace => {
                    self.read_item_access_expression()?;
                }
                TokenKind::LeftBracket => {
                    self.read_field_access()?;
                }
                _ => break,
            }
        }
        self.end_context(None)?;
        self.end_context(None)
    }

    fn read_primary_expression(&mut self) -> Result<NodeId, ParseError> {
        match self.current_token_kind() {
            Some(kind) if LITERAL_KINDS.contains(&kind) => self.read_literal_expression(),
            Some(TokenKind::Identifier) | Some(TokenKind::AtSign) => {
                self.read_identifier_expression()
            }
            Some(kind) if HASH_HEAD_KINDS.contains(&kind) => self.read_identifier_expression(),
            Some(TokenKind::LeftParenthesis) => self.read_parenthesized_expression(),
            Some(TokenKind::LeftBrace) => self.read_list_expression(),
            Some(TokenKind::LeftBracket) => self.read_record_expression(),
            Some(TokenKind::Ellipsis) => self.read_not_implemented_expression(),
            _ => Err(self.error_expected_any(&[
                TokenKind::Identifier,
                TokenKind::NumericLiteral,
                TokenKind::TextLiteral,
                TokenKind::LeftParenthesis,
                TokenKind::LeftBrace,
                TokenKind::LeftBracket,
            ])),
        }
    }

    fn read_literal_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::LiteralExpression)?;
        let token = self.read_any_token(LITERAL_KINDS)?;
        let kind = match token.kind {
            TokenKind::KeywordFalse | TokenKind::KeywordTrue => LiteralKind::Logical,
            TokenKind::NullLiteral => LiteralKind::Null,
            TokenKind::TextLiteral => LiteralKind::Text,
            _ => LiteralKind::Numeric,
        };
        self.end_context(Some(NodeData::Literal {
            kind,
            text: token.data,
        }))
    }

    fn read_identifier_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::IdentifierExpression)?;
        if self.is_on(TokenKind::AtSign) {
            self.read_token_kind_as_constant(TokenKind::AtSign, ConstantKind::AtSign)?;
        } else {
            self.skip_attribute();
        }
        let mut allowed = vec![TokenKind::Identifier];
        allowed.extend_from_slice(HASH_HEAD_KINDS);
        self.read_identifier_node(&allowed)?;
        self.end_context(None)
    }

    fn read_parenthesized_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ParenthesizedExpression)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftParenthesis, ConstantKind::LeftParenthesis)?;
        self.read_expression()?;
        self.read_closing_as_constant(
            TokenKind::RightParenthesis,
            ConstantKind::RightParenthesis,
            &open,
        )?;
        self.end_context(None)
    }

    fn read_not_implemented_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::NotImplementedExpression)?;
        self.read_token_kind_as_constant(TokenKind::Ellipsis, ConstantKind::Ellipsis)?;
        self.end_context(None)
    }

    fn read_list_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ListExpression)?;
        let open = self.read_token_kind_as_constant(TokenKind::LeftBrace, ConstantKind::LeftBrace)?;
        let on_eof = self.error_unterminated(TokenKind::RightBrace, &open);
        self.read_csv_array(Self::read_list_item, TokenKind::RightBrace, false, Some(on_eof))?;
        self.read_closing_as_constant(TokenKind::RightBrace, ConstantKind::RightBrace, &open)?;
        self.end_context(None)
    }

    /// A list item: an expression, or an `expr .. expr` range.
    fn read_list_item(&mut self) -> Result<NodeId, ParseError> {
        let left = self.read_expression()?;
        if !self.is_on(TokenKind::DotDot) {
            return Ok(left);
        }
        self.start_wrapping_context(NodeKind::RangeExpression, left)?;
        self.read_token_kind_as_constant(TokenKind::DotDot, ConstantKind::DotDot)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_record_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::RecordExpression)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftBracket, ConstantKind::LeftBracket)?;
        let on_eof = self.error_unterminated(TokenKind::RightBracket, &open);
        self.read_csv_array(
            Self::read_generalized_identifier_paired_expression,
            TokenKind::RightBracket,
            false,
            Some(on_eof),
        )?;
        self.read_closing_as_constant(TokenKind::RightBracket, ConstantKind::RightBracket, &open)?;
        self.end_context(None)
    }

    // ---- recursive-primary tails ----------------------------------------

    fn read_invoke_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::InvokeExpression)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftParenthesis, ConstantKind::LeftParenthesis)?;
        let on_eof = self.error_unterminated(TokenKind::RightParenthesis, &open);
        self.read_csv_array(
            Self::read_expression,
            TokenKind::RightParenthesis,
            false,
            Some(on_eof),
        )?;
        self.read_closing_as_constant(
            TokenKind::RightParenthesis,
            ConstantKind::RightParenthesis,
            &open,
        )?;
        self.end_context(None)
    }

    fn read_item_access_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ItemAccessExpression)?;
        let open = self.read_token_kind_as_constant(TokenKind::LeftBrace, ConstantKind::LeftBrace)?;
        self.read_expression()?;
        self.read_closing_as_constant(TokenKind::RightBrace, ConstantKind::RightBrace, &open)?;
        self.read_optional_question_mark()?;
        self.end_context(None)
    }

    fn read_field_access(&mut self) -> Result<NodeId, ParseError> {
        if self.is_next(TokenKind::LeftBracket) {
            self.read_field_projection()
        } else {
            self.read_field_selector()
        }
    }

    fn read_field_selector(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FieldSelector)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftBracket, ConstantKind::LeftBracket)?;
        self.read_generalized_identifier()?;
        self.read_closing_as_constant(TokenKind::RightBracket, ConstantKind::RightBracket, &open)?;
        self.read_optional_question_mark()?;
        self.end_context(None)
    }

    fn read_field_projection(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FieldProjection)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftBracket, ConstantKind::LeftBracket)?;
        let on_eof = self.error_unterminated(TokenKind::RightBracket, &open);
        self.read_csv_array(
            Self::read_field_selector,
            TokenKind::RightBracket,
            false,
            Some(on_eof),
        )?;
        self.read_closing_as_constant(TokenKind::RightBracket, ConstantKind::RightBracket, &open)?;
        self.read_optional_question_mark()?;
        self.end_context(None)
    }

    fn read_optional_question_mark(&mut self) -> Result<(), ParseError> {
        if self.is_on(TokenKind::QuestionMark) {
            self.read_token_kind_as_constant(TokenKind::QuestionMark, ConstantKind::QuestionMark)?;
        } else {
            self.skip_attribute();
        }
        Ok(())
    }

    // ---- identifiers and pairs ------------------------------------------

    fn read_identifier_node(&mut self, allowed: &[TokenKind]) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::Identifier)?;
        let token = self.read_any_token(allowed)?;
        self.end_context(Some(NodeData::Identifier(token.data)))
    }

    /// One or more adjacent identifier-like tokens fused into a single
    /// generalized identifier, as used on the key side of records.
    fn read_generalized_identifier(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::GeneralizedIdentifier)?;
        let mut parts: Vec<String> = Vec::new();
        while self.is_on_generalized_identifier_start() {
            let token = self.read_any_token(GENERALIZED_IDENTIFIER_KINDS)?;
            parts.push(token.data);
        }
        if parts.is_empty() {
            return Err(self.error_expected(TokenKind::Identifier));
        }
        self.end_context(Some(NodeData::Identifier(parts.join(" "))))
    }

    fn read_identifier_paired_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::IdentifierPairedExpression)?;
        self.read_identifier_node(&[TokenKind::Identifier])?;
        self.read_token_kind_as_constant(TokenKind::Equal, ConstantKind::Equal)?;
        self.read_expression()?;
        self.end_context(None)
    }

    fn read_generalized_identifier_paired_expression(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::GeneralizedIdentifierPairedExpression)?;
        self.read_generalized_identifier()?;
        self.read_token_kind_as_constant(TokenKind::Equal, ConstantKind::Equal)?;
        self.read_expression()?;
        self.end_context(None)
    }

    // ---- literal-only forms (section and document attributes) -----------

    fn read_record_literal(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::RecordLiteral)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftBracket, ConstantKind::LeftBracket)?;
        let on_eof = self.error_unterminated(TokenKind::RightBracket, &open);
        self.read_csv_array(
            Self::read_generalized_identifier_paired_any_literal,
            TokenKind::RightBracket,
            false,
            Some(on_eof),
        )?;
        self.read_closing_as_constant(TokenKind::RightBracket, ConstantKind::RightBracket, &open)?;
        self.end_context(None)
    }

    fn read_list_literal(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ListLiteral)?;
        let open = self.read_token_kind_as_constant(TokenKind::LeftBrace, ConstantKind::LeftBrace)?;
        let on_eof = self.error_unterminated(TokenKind::RightBrace, &open);
        self.read_csv_array(Self::read_any_literal, TokenKind::RightBrace, false, Some(on_eof))?;
        self.read_closing_as_constant(TokenKind::RightBrace, ConstantKind::RightBrace, &open)?;
        self.end_context(None)
    }

    fn read_any_literal(&mut self) -> Result<NodeId, ParseError> {
        match self.current_token_kind() {
            Some(TokenKind::LeftBracket) => self.read_record_literal(),
            Some(TokenKind::LeftBrace) => self.read_list_literal(),
            _ => self.read_literal_expression(),
        }
    }

    fn read_generalized_identifier_paired_any_literal(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::GeneralizedIdentifierPairedAnyLiteral)?;
        self.read_generalized_identifier()?;
        self.read_token_kind_as_constant(TokenKind::Equal, ConstantKind::Equal)?;
        self.read_any_literal()?;
        self.end_context(None)
    }

    // ---- section documents ----------------------------------------------

    pub(crate) fn read_section_document(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::Section)?;
        if self.is_on(TokenKind::LeftBracket) {
            self.read_record_literal()?;
        } else {
            self.skip_attribute();
        }
        self.read_token_kind_as_constant(TokenKind::KeywordSection, ConstantKind::Section)?;
        if self.is_on(TokenKind::Identifier) {
            self.read_identifier_node(&[TokenKind::Identifier])?;
        } else {
            self.skip_attribute();
        }
        self.read_token_kind_as_constant(TokenKind::Semicolon, ConstantKind::Semicolon)?;
        self.start_context(NodeKind::ArrayWrapper)?;
        while self.current_token().is_some() {
            self.read_section_member()?;
        }
        self.end_context(None)?;
        self.end_context(None)
    }

    fn read_section_member(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::SectionMember)?;
        if self.is_on(TokenKind::LeftBracket) {
            self.read_record_literal()?;
        } else {
            self.skip_attribute();
        }
        if self.is_on(TokenKind::KeywordShared) {
            self.read_token_kind_as_constant(TokenKind::KeywordShared, ConstantKind::Shared)?;
        } else {
            self.skip_attribute();
        }
        self.read_identifier_paired_expression()?;
        self.read_token_kind_as_constant(TokenKind::Semicolon, ConstantKind::Semicolon)?;
        self.end_context(None)
    }

    // ---- types -----------------------------------------------------------

    fn read_type_primary_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::TypePrimaryType)?;
        self.read_token_kind_as_constant(TokenKind::KeywordType, ConstantKind::Type)?;
        self.read_primary_type()?;
        self.end_context(None)
    }

    fn read_primary_type(&mut self) -> Result<NodeId, ParseError> {
        match self.current_token_kind() {
            Some(TokenKind::LeftBracket) => self.read_record_type(),
            Some(TokenKind::LeftBrace) => self.read_list_type(),
            Some(TokenKind::Identifier) => {
                if self.is_on_constant_text("function") && self.is_next(TokenKind::LeftParenthesis)
                {
                    self.read_function_type()
                } else if self.is_on_constant_text("table") && self.is_next(TokenKind::LeftBracket)
                {
                    self.read_table_type()
                } else if self.is_on_constant_text("nullable") {
                    self.read_nullable_type()
                } else {
                    self.read_primitive_type()
                }
            }
            _ => self.read_primitive_type(),
        }
    }

    pub(crate) fn read_nullable_primitive_type(&mut self) -> Result<NodeId, ParseError> {
        if !self.is_on_constant_text("nullable") {
            return self.read_primitive_type();
        }
        self.start_context(NodeKind::NullablePrimitiveType)?;
        self.read_identifier_as_constant(ConstantKind::Nullable)?;
        self.read_primitive_type()?;
        self.end_context(None)
    }

    fn read_primitive_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::PrimitiveType)?;
        let token = self.read_any_token(PRIMITIVE_TYPE_KINDS)?;
        let kind = match token.kind {
            TokenKind::NullLiteral => PrimitiveTypeKind::Null,
            TokenKind::KeywordType => PrimitiveTypeKind::Type,
            _ => match PrimitiveTypeKind::from_name(&token.data) {
                Some(kind) => kind,
                None => return Err(self.error_invalid_primitive_type(token)),
            },
        };
        self.end_context(Some(NodeData::PrimitiveType(kind)))
    }

    fn read_as_nullable_primitive_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::AsNullablePrimitiveType)?;
        self.read_token_kind_as_constant(TokenKind::KeywordAs, ConstantKind::As)?;
        self.read_nullable_primitive_type()?;
        self.end_context(None)
    }

    fn read_as_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::AsType)?;
        self.read_token_kind_as_constant(TokenKind::KeywordAs, ConstantKind::As)?;
        self.read_primary_type()?;
        self.end_context(None)
    }

    fn read_record_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::RecordType)?;
        self.read_field_specification_list()?;
        self.end_context(None)
    }

    fn read_field_specification_list(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FieldSpecificationList)?;
        let open =
            self.read_token_kind_as_constant(TokenKind::LeftBracket, ConstantKind::LeftBracket)?;
        self.start_context(NodeKind::ArrayWrapper)?;
        loop {
            match self.current_token_kind() {
                None => return Err(self.error_unterminated(TokenKind::RightBracket, &open)),
                Some(TokenKind::RightBracket) | Some(TokenKind::Ellipsis) => break,
                _ => {}
            }
            self.start_context(NodeKind::Csv)?;
            self.read_field_specification()?;
            let has_comma = self.is_on(TokenKind::Comma);
            if has_comma {
                self.read_token_kind_as_constant(TokenKind::Comma, ConstantKind::Comma)?;
            } else {
                self.skip_attribute();
            }
            self.end_context(None)?;
            if has_comma {
                if self.is_on(TokenKind::RightBracket) {
                    return Err(self.error_csv_continuation(CsvContinuationKind::DanglingComma));
                }
            } else {
                break;
            }
        }
        self.end_context(None)?;
        if self.is_on(TokenKind::Ellipsis) {
            self.read_token_kind_as_constant(TokenKind::Ellipsis, ConstantKind::Ellipsis)?;
        } else {
            self.skip_attribute();
        }
        self.read_closing_as_constant(TokenKind::RightBracket, ConstantKind::RightBracket, &open)?;
        self.end_context(None)
    }

    fn read_field_specification(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FieldSpecification)?;
        if self.is_on_constant_text("optional") {
            self.read_identifier_as_constant(ConstantKind::Optional)?;
        } else {
            self.skip_attribute();
        }
        self.read_generalized_identifier()?;
        if self.is_on(TokenKind::Equal) {
            self.read_field_type_specification()?;
        } else {
            self.skip_attribute();
        }
        self.end_context(None)
    }

    fn read_field_type_specification(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FieldTypeSpecification)?;
        self.read_token_kind_as_constant(TokenKind::Equal, ConstantKind::Equal)?;
        self.read_primary_type()?;
        self.end_context(None)
    }

    fn read_list_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ListType)?;
        let open = self.read_token_kind_as_constant(TokenKind::LeftBrace, ConstantKind::LeftBrace)?;
        self.read_primary_type()?;
        self.read_closing_as_constant(TokenKind::RightBrace, ConstantKind::RightBrace, &open)?;
        self.end_context(None)
    }

    fn read_function_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::FunctionType)?;
        self.read_identifier_as_constant(ConstantKind::Function)?;
        self.read_parameter_list()?;
        self.read_as_type()?;
        self.end_context(None)
    }

    fn read_table_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::TableType)?;
        self.read_identifier_as_constant(ConstantKind::Table)?;
        self.read_field_specification_list()?;
        self.end_context(None)
    }

    fn read_nullable_type(&mut self) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::NullableType)?;
        self.read_identifier_as_constant(ConstantKind::Nullable)?;
        self.read_primary_type()?;
        self.end_context(None)
    }

    // ---- shared machinery ------------------------------------------------

    /// Read a comma-separated list into an `ArrayWrapper` of `Csv` nodes.
    ///
    /// `let_style` lists must continue with a comma or end on the
    /// terminator; other lists leave a mismatched close to the caller. At
    /// end of input `on_eof` is raised while the wrapper is still open, so
    /// a partial tree keeps the wrapper context and its completed items.
    fn read_csv_array(
        &mut self,
        element: fn(&mut Self) -> Result<NodeId, ParseError>,
        terminator: TokenKind,
        let_style: bool,
        on_eof: Option<ParseError>,
    ) -> Result<NodeId, ParseError> {
        self.start_context(NodeKind::ArrayWrapper)?;
        loop {
            match self.current_token_kind() {
                None => {
                    if let Some(err) = &on_eof {
                        return Err(err.clone());
                    }
                }
                Some(kind) if kind == terminator => break,
                _ => {}
            }
            self.start_context(NodeKind::Csv)?;
            element(self)?;
            let has_comma = self.is_on(TokenKind::Comma);
            if has_comma {
                self.read_token_kind_as_constant(TokenKind::Comma, ConstantKind::Comma)?;
            } else {
                self.skip_attribute();
            }
            self.end_context(None)?;
            if has_comma {
                if self.is_on(terminator) {
                    return Err(self.error_csv_continuation(CsvContinuationKind::DanglingComma));
                }
            } else {
                if let_style && !self.is_on(terminator) {
                    return Err(self.error_csv_continuation(CsvContinuationKind::LetExpression));
                }
                break;
            }
        }
        self.end_context(None)
    }

    pub(super) fn read_token_kind_as_constant(
        &mut self,
        kind: TokenKind,
        constant: ConstantKind,
    ) -> Result<Token, ParseError> {
        self.start_context(NodeKind::Constant)?;
        let token = self.read_token_kind(kind)?;
        self.end_context(Some(NodeData::Constant(constant)))?;
        Ok(token)
    }

    /// An identifier token acting as a contextual keyword constant
    /// (`optional`, `nullable`, `function`, `table`).
    fn read_identifier_as_constant(&mut self, constant: ConstantKind) -> Result<Token, ParseError> {
        self.start_context(NodeKind::Constant)?;
        let token = self.read_token_kind(TokenKind::Identifier)?;
        self.end_context(Some(NodeData::Constant(constant)))?;
        Ok(token)
    }

    /// Read a closing token, mapping end-of-input to the matching
    /// unterminated-pair error.
    fn read_closing_as_constant(
        &mut self,
        kind: TokenKind,
        constant: ConstantKind,
        open: &Token,
    ) -> Result<Token, ParseError> {
        if self.current_token().is_none() {
            return Err(self.error_unterminated(kind, open));
        }
        self.read_token_kind_as_constant(kind, constant)
    }
}
