//! Localized message templates.
//!
//! Templates are looked up by BCP-47 locale tag; unknown locales fall back
//! to `en-US`. The lookup is pure so callers can render messages without
//! carrying any localization state.

use super::code::ErrorCode;

/// Default locale tag.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Look up the message template for an error code under a locale.
///
/// Only the en-US table ships today; every locale falls back to it.
pub fn message(code: ErrorCode, _locale: &str) -> &'static str {
    en_us(code)
}

fn en_us(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::E001 => "encountered an unexpected character",
        ErrorCode::E002 => "the line ended in the middle of a token",
        ErrorCode::E003 => "the line number is out of range",
        ErrorCode::E004 => "the position range is invalid",
        ErrorCode::E005 => "one or more lines failed to tokenize",
        ErrorCode::E051 => "the text literal is never terminated",
        ErrorCode::E052 => "the quoted identifier is never terminated",
        ErrorCode::E053 => "the multi-line comment is never terminated",
        ErrorCode::E101 => "expected a different token kind",
        ErrorCode::E102 => "expected one of several token kinds",
        ErrorCode::E103 => "expected a comma or the end of the list",
        ErrorCode::E104 => "the parentheses are never closed",
        ErrorCode::E105 => "the bracket is never closed",
        ErrorCode::E106 => "tokens remain after the end of the document",
        ErrorCode::E107 => "the name is not a primitive type",
        ErrorCode::E901 => "an internal invariant was violated",
        ErrorCode::E902 => "the operation was cancelled",
    }
}
