//! The M keyword tables.

use crate::token::TokenKind;

/// Map keyword text to its token kind. `null`, `true`, and `false` resolve
/// to their literal kinds.
pub fn keyword_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "and" => TokenKind::KeywordAnd,
        "as" => TokenKind::KeywordAs,
        "each" => TokenKind::KeywordEach,
        "else" => TokenKind::KeywordElse,
        "error" => TokenKind::KeywordError,
        "false" => TokenKind::KeywordFalse,
        "if" => TokenKind::KeywordIf,
        "in" => TokenKind::KeywordIn,
        "is" => TokenKind::KeywordIs,
        "let" => TokenKind::KeywordLet,
        "meta" => TokenKind::KeywordMeta,
        "not" => TokenKind::KeywordNot,
        "null" => TokenKind::NullLiteral,
        "or" => TokenKind::KeywordOr,
        "otherwise" => TokenKind::KeywordOtherwise,
        "section" => TokenKind::KeywordSection,
        "shared" => TokenKind::KeywordShared,
        "then" => TokenKind::KeywordThen,
        "true" => TokenKind::KeywordTrue,
        "try" => TokenKind::KeywordTry,
        "type" => TokenKind::KeywordType,
        _ => return None,
    };
    Some(kind)
}

/// Map hash-keyword text (leading `#` included) to its token kind.
pub fn hash_keyword_kind(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "#binary" => TokenKind::KeywordHashBinary,
        "#date" => TokenKind::KeywordHashDate,
        "#datetime" => TokenKind::KeywordHashDateTime,
        "#datetimezone" => TokenKind::KeywordHashDateTimeZone,
        "#duration" => TokenKind::KeywordHashDuration,
        "#infinity" => TokenKind::KeywordHashInfinity,
        "#nan" => TokenKind::KeywordHashNan,
        "#sections" => TokenKind::KeywordHashSections,
        "#shared" => TokenKind::KeywordHashShared,
        "#table" => TokenKind::KeywordHashTable,
        "#time" => TokenKind::KeywordHashTime,
        _ => return None,
    };
    Some(kind)
}

/// Token kinds that may open (or continue) a generalized identifier: plain
/// identifiers plus every keyword, including the hash keywords.
pub const GENERALIZED_IDENTIFIER_KINDS: &[TokenKind] = &[
    TokenKind::Identifier,
    TokenKind::KeywordAnd,
    TokenKind::KeywordAs,
    TokenKind::KeywordEach,
    TokenKind::KeywordElse,
    TokenKind::KeywordError,
    TokenKind::KeywordFalse,
    TokenKind::KeywordHashBinary,
    TokenKind::KeywordHashDate,
    TokenKind::KeywordHashDateTime,
    TokenKind::KeywordHashDateTimeZone,
    TokenKind::KeywordHashDuration,
    TokenKind::KeywordHashInfinity,
    TokenKind::KeywordHashNan,
    TokenKind::KeywordHashSections,
    TokenKind::KeywordHashShared,
    TokenKind::KeywordHashTable,
    TokenKind::KeywordHashTime,
    TokenKind::KeywordIf,
    TokenKind::KeywordIn,
    TokenKind::KeywordIs,
    TokenKind::KeywordLet,
    TokenKind::KeywordMeta,
    TokenKind::KeywordNot,
    TokenKind::KeywordOr,
    TokenKind::KeywordOtherwise,
    TokenKind::KeywordSection,
    TokenKind::KeywordShared,
    TokenKind::KeywordThen,
    TokenKind::KeywordTrue,
    TokenKind::KeywordTry,
    TokenKind::KeywordType,
    TokenKind::NullLiteral,
];
