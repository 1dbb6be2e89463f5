use thiserror::Error;

/// Stable error codes for diagnostics.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Error)]
pub enum ErrorCode {
    // Lexical errors, per line (E001-E049)
    #[error("unexpected character")]
    E001,
    #[error("unexpected end of line")]
    E002,
    #[error("line number out of range")]
    E003,
    #[error("invalid position range")]
    E004,
    #[error("one or more lines failed to tokenize")]
    E005,

    // Lexical errors, multi-line (E051-E099)
    #[error("unterminated text literal")]
    E051,
    #[error("unterminated quoted identifier")]
    E052,
    #[error("unterminated multi-line comment")]
    E053,

    // Parse errors (E101-E199)
    #[error("expected a different token kind")]
    E101,
    #[error("expected one of several token kinds")]
    E102,
    #[error("expected a comma or the end of the list")]
    E103,
    #[error("unterminated parentheses")]
    E104,
    #[error("unterminated bracket")]
    E105,
    #[error("tokens remain after the document")]
    E106,
    #[error("not a primitive type name")]
    E107,

    // Runtime errors (E901-E999)
    #[error("internal invariant violated")]
    E901,
    #[error("the operation was cancelled")]
    E902,
}

impl ErrorCode {
    /// The error code as a string (e.g. "E101").
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E051 => "E051",
            ErrorCode::E052 => "E052",
            ErrorCode::E053 => "E053",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E901 => "E901",
            ErrorCode::E902 => "E902",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::E001.as_str(), "E001");
        assert_eq!(ErrorCode::E053.as_str(), "E053");
        assert_eq!(ErrorCode::E107.as_str(), "E107");
        assert_eq!(ErrorCode::E902.as_str(), "E902");
    }

    #[test]
    fn error_code_display() {
        assert_eq!(format!("{}", ErrorCode::E104), "unterminated parentheses");
    }
}
