//! Single-line tokenization.
//!
//! A line is tokenized against the M lexical grammar minus the rules that
//! span newlines. Multi-line forms (text literals, quoted identifiers,
//! block comments) emit `Start`/`Content`/`End` partial tokens and carry a
//! [`LineMode`] across the line boundary; the snapshot step fuses the
//! partials back together.

use pq_core::keyword::{hash_keyword_kind, keyword_kind};
use pq_core::{LineToken, LineTokenKind, TokenKind};

use super::error::LineLexError;

/// Lexer mode at a line boundary.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum LineMode {
    #[default]
    Default,
    /// Inside a `/* … */` comment.
    Comment,
    /// Inside a `#"…"` identifier.
    QuotedIdentifier,
    /// Inside a `"…"` literal.
    Text,
}

/// A tokenized line of source text.
#[derive(Clone, PartialEq, Debug)]
pub struct Line {
    pub mode_at_start: LineMode,
    pub mode_at_end: LineMode,
    pub text: String,
    /// The terminator that ends this line; empty for the last line.
    pub terminator: String,
    pub tokens: Vec<LineToken>,
    pub error: Option<LineLexError>,
}

/// Tokenize one line of text given the mode carried over from the previous
/// line. Errors are line-isolated: tokenization stops at the first error
/// but the tokens read so far are kept.
pub fn tokenize_line(text: &str, terminator: impl Into<String>, mode_at_start: LineMode) -> Line {
    let mut scanner = Scanner::new(text);
    let mut tokens = Vec::new();
    let mut error = None;

    let mode_at_end = match scan_mode_restart(&mut scanner, mode_at_start, &mut tokens) {
        Some(mode) => mode,
        None => scan_default(&mut scanner, &mut tokens, &mut error),
    };

    Line {
        mode_at_start,
        mode_at_end,
        text: text.to_string(),
        terminator: terminator.into(),
        tokens,
        error,
    }
}

/// Finish a multi-line form carried over from the previous line. Returns
/// the line's end mode when the whole line belongs to the form, `None` when
/// scanning should continue in default mode.
fn scan_mode_restart(
    scanner: &mut Scanner<'_>,
    mode: LineMode,
    tokens: &mut Vec<LineToken>,
) -> Option<LineMode> {
    match mode {
        LineMode::Default => None,
        LineMode::Comment => {
            if scanner.seek_str("*/") {
                tokens.push(scanner.token_from_start(LineTokenKind::MultilineCommentEnd));
                None
            } else {
                scanner.seek_end();
                tokens.push(scanner.token_from_start(LineTokenKind::MultilineCommentContent));
                Some(LineMode::Comment)
            }
        }
        LineMode::Text => {
            if scanner.seek_quote_close() {
                tokens.push(scanner.token_from_start(LineTokenKind::TextLiteralEnd));
                None
            } else {
                tokens.push(scanner.token_from_start(LineTokenKind::TextLiteralContent));
                Some(LineMode::Text)
            }
        }
        LineMode::QuotedIdentifier => {
            if scanner.seek_quote_close() {
                tokens.push(scanner.token_from_start(LineTokenKind::QuotedIdentifierEnd));
                None
            } else {
                tokens.push(scanner.token_from_start(LineTokenKind::QuotedIdentifierContent));
                Some(LineMode::QuotedIdentifier)
            }
        }
    }
}

fn scan_default(
    scanner: &mut Scanner<'_>,
    tokens: &mut Vec<LineToken>,
    error: &mut Option<LineLexError>,
) -> LineMode {
    while let Some(c) = scanner.peek() {
        if c.is_whitespace() {
            scanner.bump();
            continue;
        }
        scanner.mark();

        match c {
            '/' => match scanner.peek_second() {
                Some('/') => {
                    scanner.seek_end();
                    tokens.push(scanner.token_from_mark(LineTokenKind::LineComment));
                }
                Some('*') => {
                    scanner.bump();
                    scanner.bump();
                    if scanner.seek_str("*/") {
                        tokens.push(scanner.token_from_mark(LineTokenKind::MultilineComment));
                    } else {
                        scanner.seek_end();
                        tokens.push(scanner.token_from_mark(LineTokenKind::MultilineCommentStart));
                        return LineMode::Comment;
                    }
                }
                _ => {
                    scanner.bump();
                    tokens.push(scanner.token_from_mark(LineTokenKind::Plain(TokenKind::Division)));
                }
            },
            '"' => {
                scanner.bump();
                if scanner.seek_quote_close() {
                    tokens
                        .push(scanner.token_from_mark(LineTokenKind::Plain(TokenKind::TextLiteral)));
                } else {
                    tokens.push(scanner.token_from_mark(LineTokenKind::TextLiteralStart));
                    return LineMode::Text;
                }
            }
            '#' => match scanner.peek_second() {
                Some('"') => {
                    scanner.bump();
                    scanner.bump();
                    if scanner.seek_quote_close() {
                        tokens.push(
                            scanner.token_from_mark(LineTokenKind::Plain(TokenKind::Identifier)),
                        );
                    } else {
                        tokens.push(scanner.token_from_mark(LineTokenKind::QuotedIdentifierStart));
                        return LineMode::QuotedIdentifier;
                    }
                }
                Some(second) if second.is_alphabetic() => {
                    scanner.bump();
                    scanner.seek_identifier_tail();
                    match hash_keyword_kind(scanner.slice_from_mark()) {
                        Some(kind) => {
                            tokens.push(scanner.token_from_mark(LineTokenKind::Plain(kind)));
                        }
                        None => {
                            *error = Some(LineLexError::UnexpectedRead {
                                line_code_unit: scanner.mark_units(),
                            });
                            break;
                        }
                    }
                }
                _ => {
                    *error = Some(LineLexError::UnexpectedRead {
                        line_code_unit: scanner.mark_units(),
                    });
                    break;
                }
            },
            '0'..='9' => match scan_number(scanner) {
                Ok(kind) => tokens.push(scanner.token_from_mark(LineTokenKind::Plain(kind))),
                Err(e) => {
                    *error = Some(e);
                    break;
                }
            },
            '.' => match scanner.peek_second() {
                Some('0'..='9') => match scan_number(scanner) {
                    Ok(kind) => tokens.push(scanner.token_from_mark(LineTokenKind::Plain(kind))),
                    Err(e) => {
                        *error = Some(e);
                        break;
                    }
                },
                Some('.') => {
                    scanner.bump();
                    scanner.bump();
                    let kind = if scanner.peek() == Some('.') {
                        scanner.bump();
                        TokenKind::Ellipsis
                    } else {
                        TokenKind::DotDot
                    };
                    tokens.push(scanner.token_from_mark(LineTokenKind::Plain(kind)));
                }
                _ => {
                    *error = Some(LineLexError::UnexpectedRead {
                        line_code_unit: scanner.mark_units(),
                    });
                    break;
                }
            },
            _ if c.is_alphabetic() || c == '_' => {
                scanner.bump();
                let mut dotted = false;
                loop {
                    scanner.seek_identifier_tail();
                    // A dot continues the identifier only when an
                    // identifier-start character follows it.
                    match (scanner.peek(), scanner.peek_second()) {
                        (Some('.'), Some(next)) if next.is_alphabetic() || next == '_' => {
                            scanner.bump();
                            dotted = true;
                        }
                        _ => break,
                    }
                }
                let text = scanner.slice_from_mark();
                let kind = if dotted {
                    TokenKind::Identifier
                } else {
                    keyword_kind(text).unwrap_or(TokenKind::Identifier)
                };
                tokens.push(scanner.token_from_mark(LineTokenKind::Plain(kind)));
            }
            _ => match scan_operator(scanner, c) {
                Some(kind) => tokens.push(scanner.token_from_mark(LineTokenKind::Plain(kind))),
                None => {
                    *error = Some(LineLexError::UnexpectedRead {
                        line_code_unit: scanner.mark_units(),
                    });
                    break;
                }
            },
        }
    }

    LineMode::Default
}

fn scan_number(scanner: &mut Scanner<'_>) -> Result<TokenKind, LineLexError> {
    if scanner.peek() == Some('0') && matches!(scanner.peek_second(), Some('x') | Some('X')) {
        scanner.bump();
        scanner.bump();
        let mut digits = 0;
        while matches!(scanner.peek(), Some(c) if c.is_ascii_hexdigit()) {
            scanner.bump();
            digits += 1;
        }
        if digits == 0 {
            return Err(unexpected_here(scanner));
        }
        return Ok(TokenKind::HexLiteral);
    }

    while matches!(scanner.peek(), Some('0'..='9')) {
        scanner.bump();
    }
    if scanner.peek() == Some('.') {
        if !matches!(scanner.peek_second(), Some('0'..='9')) {
            return Err(unexpected_here(scanner));
        }
        scanner.bump();
        while matches!(scanner.peek(), Some('0'..='9')) {
            scanner.bump();
        }
    }
    if matches!(scanner.peek(), Some('e') | Some('E')) {
        scanner.bump();
        if matches!(scanner.peek(), Some('+') | Some('-')) {
            scanner.bump();
        }
        let mut digits = 0;
        while matches!(scanner.peek(), Some('0'..='9')) {
            scanner.bump();
            digits += 1;
        }
        if digits == 0 {
            return Err(unexpected_here(scanner));
        }
    }
    Ok(TokenKind::NumericLiteral)
}

fn unexpected_here(scanner: &Scanner<'_>) -> LineLexError {
    if scanner.peek().is_none() {
        LineLexError::UnexpectedEof {
            line_code_unit: scanner.units(),
        }
    } else {
        LineLexError::UnexpectedRead {
            line_code_unit: scanner.units(),
        }
    }
}

fn scan_operator(scanner: &mut Scanner<'_>, c: char) -> Option<TokenKind> {
    let kind = match c {
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semicolon,
        '(' => TokenKind::LeftParenthesis,
        ')' => TokenKind::RightParenthesis,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        '@' => TokenKind::AtSign,
        '?' => TokenKind::QuestionMark,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '*' => TokenKind::Asterisk,
        '&' => TokenKind::Ampersand,
        '=' => {
            scanner.bump();
            if scanner.peek() == Some('>') {
                scanner.bump();
                return Some(TokenKind::FatArrow);
            }
            return Some(TokenKind::Equal);
        }
        '<' => {
            scanner.bump();
            match scanner.peek() {
                Some('=') => {
                    scanner.bump();
                    return Some(TokenKind::LessThanEqualTo);
                }
                Some('>') => {
                    scanner.bump();
                    return Some(TokenKind::NotEqual);
                }
                _ => return Some(TokenKind::LessThan),
            }
        }
        '>' => {
            scanner.bump();
            if scanner.peek() == Some('=') {
                scanner.bump();
                return Some(TokenKind::GreaterThanEqualTo);
            }
            return Some(TokenKind::GreaterThan);
        }
        _ => return None,
    };
    scanner.bump();
    Some(kind)
}

/// Character scanner tracking both byte and UTF-16 code-unit offsets.
struct Scanner<'a> {
    text: &'a str,
    bytes: usize,
    units: u32,
    mark_bytes: usize,
    mark_units: u32,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: 0,
            units: 0,
            mark_bytes: 0,
            mark_units: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.bytes..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.text[self.bytes..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.bytes += c.len_utf8();
        self.units += c.len_utf16() as u32;
        Some(c)
    }

    fn units(&self) -> u32 {
        self.units
    }

    /// Remember the current offset as a token start.
    fn mark(&mut self) {
        self.mark_bytes = self.bytes;
        self.mark_units = self.units;
    }

    fn mark_units(&self) -> u32 {
        self.mark_units
    }

    fn slice_from_mark(&self) -> &'a str {
        &self.text[self.mark_bytes..self.bytes]
    }

    fn token_from_mark(&self, kind: LineTokenKind) -> LineToken {
        LineToken::new(kind, self.mark_units, self.units, self.slice_from_mark())
    }

    /// Token covering everything from the line start to the current offset.
    fn token_from_start(&self, kind: LineTokenKind) -> LineToken {
        LineToken::new(kind, 0, self.units, &self.text[..self.bytes])
    }

    fn seek_end(&mut self) {
        while self.bump().is_some() {}
    }

    /// Advance past the next occurrence of `needle`. Returns false (leaving
    /// the scanner at end of line) when it does not occur.
    fn seek_str(&mut self, needle: &str) -> bool {
        match self.text[self.bytes..].find(needle) {
            Some(relative) => {
                let target = self.bytes + relative + needle.len();
                while self.bytes < target {
                    self.bump();
                }
                true
            }
            None => {
                self.seek_end();
                false
            }
        }
    }

    /// Advance past the closing quote of a text literal or quoted
    /// identifier, honoring the `""` escape. Returns false at end of line.
    fn seek_quote_close(&mut self) -> bool {
        loop {
            match self.peek() {
                None => return false,
                Some('"') => {
                    self.bump();
                    if self.peek() == Some('"') {
                        self.bump();
                    } else {
                        return true;
                    }
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn seek_identifier_tail(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &Line) -> Vec<LineTokenKind> {
        line.tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers_and_operators() {
        let line = tokenize_line("1 + 2.5 * 0xFF", "", LineMode::Default);
        assert_eq!(
            kinds(&line),
            vec![
                LineTokenKind::Plain(TokenKind::NumericLiteral),
                LineTokenKind::Plain(TokenKind::Plus),
                LineTokenKind::Plain(TokenKind::NumericLiteral),
                LineTokenKind::Plain(TokenKind::Asterisk),
                LineTokenKind::Plain(TokenKind::HexLiteral),
            ]
        );
        assert_eq!(line.mode_at_end, LineMode::Default);
        assert!(line.error.is_none());
    }

    #[test]
    fn scientific_notation() {
        let line = tokenize_line("1.5e-3 2E10 .5", "", LineMode::Default);
        assert_eq!(line.tokens.len(), 3);
        assert!(line.error.is_none());
        assert_eq!(line.tokens[2].data, ".5");
    }

    #[test]
    fn keywords_and_identifiers() {
        let line = tokenize_line("let x = each _", "", LineMode::Default);
        assert_eq!(
            kinds(&line),
            vec![
                LineTokenKind::Plain(TokenKind::KeywordLet),
                LineTokenKind::Plain(TokenKind::Identifier),
                LineTokenKind::Plain(TokenKind::Equal),
                LineTokenKind::Plain(TokenKind::KeywordEach),
                LineTokenKind::Plain(TokenKind::Identifier),
            ]
        );
    }

    #[test]
    fn dotted_identifier_is_single_token() {
        let line = tokenize_line("Table.AddColumn", "", LineMode::Default);
        assert_eq!(line.tokens.len(), 1);
        assert_eq!(line.tokens[0].data, "Table.AddColumn");
        assert_eq!(
            line.tokens[0].kind,
            LineTokenKind::Plain(TokenKind::Identifier)
        );
    }

    #[test]
    fn text_literal_with_escape() {
        let line = tokenize_line(r#""he said ""hi""""#, "", LineMode::Default);
        assert_eq!(kinds(&line), vec![LineTokenKind::Plain(TokenKind::TextLiteral)]);
        assert_eq!(line.tokens[0].data, r#""he said ""hi""""#);
    }

    #[test]
    fn unterminated_text_starts_multiline() {
        let line = tokenize_line("x = \"abc", "", LineMode::Default);
        assert_eq!(line.mode_at_end, LineMode::Text);
        assert_eq!(
            line.tokens.last().map(|t| t.kind),
            Some(LineTokenKind::TextLiteralStart)
        );
        assert!(line.error.is_none());
    }

    #[test]
    fn text_continuation_closes() {
        let line = tokenize_line("tail\" + 1", "", LineMode::Text);
        assert_eq!(line.tokens[0].kind, LineTokenKind::TextLiteralEnd);
        assert_eq!(line.tokens[0].data, "tail\"");
        assert_eq!(line.mode_at_end, LineMode::Default);
        assert_eq!(line.tokens.len(), 3);
    }

    #[test]
    fn text_continuation_stays_open() {
        let line = tokenize_line("no close here", "", LineMode::Text);
        assert_eq!(kinds(&line), vec![LineTokenKind::TextLiteralContent]);
        assert_eq!(line.mode_at_end, LineMode::Text);
    }

    #[test]
    fn block_comment_single_line() {
        let line = tokenize_line("1 /* note */ 2", "", LineMode::Default);
        assert_eq!(
            kinds(&line),
            vec![
                LineTokenKind::Plain(TokenKind::NumericLiteral),
                LineTokenKind::MultilineComment,
                LineTokenKind::Plain(TokenKind::NumericLiteral),
            ]
        );
    }

    #[test]
    fn block_comment_open_carries_mode() {
        let line = tokenize_line("1 /* open", "", LineMode::Default);
        assert_eq!(line.mode_at_end, LineMode::Comment);
        assert!(line.error.is_none());

        let next = tokenize_line("still comment", "", LineMode::Comment);
        assert_eq!(kinds(&next), vec![LineTokenKind::MultilineCommentContent]);
        assert_eq!(next.mode_at_end, LineMode::Comment);

        let last = tokenize_line("done */ 3", "", LineMode::Comment);
        assert_eq!(last.tokens[0].kind, LineTokenKind::MultilineCommentEnd);
        assert_eq!(last.tokens[0].data, "done */");
        assert_eq!(last.mode_at_end, LineMode::Default);
    }

    #[test]
    fn line_comment_to_eol() {
        let line = tokenize_line("1 // rest is comment", "", LineMode::Default);
        assert_eq!(line.tokens.len(), 2);
        assert_eq!(line.tokens[1].kind, LineTokenKind::LineComment);
        assert_eq!(line.tokens[1].data, "// rest is comment");
    }

    #[test]
    fn quoted_identifier() {
        let line = tokenize_line(r#"#"weird name" + 1"#, "", LineMode::Default);
        assert_eq!(line.tokens[0].kind, LineTokenKind::Plain(TokenKind::Identifier));
        assert_eq!(line.tokens[0].data, r#"#"weird name""#);
    }

    #[test]
    fn hash_keywords() {
        let line = tokenize_line("#table #nan", "", LineMode::Default);
        assert_eq!(
            kinds(&line),
            vec![
                LineTokenKind::Plain(TokenKind::KeywordHashTable),
                LineTokenKind::Plain(TokenKind::KeywordHashNan),
            ]
        );
    }

    #[test]
    fn unknown_hash_keyword_is_error() {
        let line = tokenize_line("#bogus", "", LineMode::Default);
        assert_eq!(
            line.error,
            Some(LineLexError::UnexpectedRead { line_code_unit: 0 })
        );
    }

    #[test]
    fn error_keeps_earlier_tokens() {
        let line = tokenize_line("1 + \u{00A7}", "", LineMode::Default);
        assert_eq!(line.tokens.len(), 2);
        assert_eq!(
            line.error,
            Some(LineLexError::UnexpectedRead { line_code_unit: 4 })
        );
    }

    #[test]
    fn compound_operators() {
        let line = tokenize_line("<= >= <> => .. ...", "", LineMode::Default);
        assert_eq!(
            kinds(&line),
            vec![
                LineTokenKind::Plain(TokenKind::LessThanEqualTo),
                LineTokenKind::Plain(TokenKind::GreaterThanEqualTo),
                LineTokenKind::Plain(TokenKind::NotEqual),
                LineTokenKind::Plain(TokenKind::FatArrow),
                LineTokenKind::Plain(TokenKind::DotDot),
                LineTokenKind::Plain(TokenKind::Ellipsis),
            ]
        );
    }

    #[test]
    fn code_unit_offsets_track_wide_chars() {
        // The emoji is two UTF-16 code units wide.
        let line = tokenize_line("\"\u{1F600}\" + 1", "", LineMode::Default);
        assert_eq!(line.tokens[0].start, 0);
        assert_eq!(line.tokens[0].end, 4);
        assert_eq!(line.tokens[1].start, 5);
    }
}
