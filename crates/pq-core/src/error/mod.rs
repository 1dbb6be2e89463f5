//! Error codes, localized message templates, and runtime-level errors.

pub mod code;
pub mod locale;

pub use code::ErrorCode;

use thiserror::Error;

/// Errors that can surface from any subsystem.
///
/// `Invariant` indicates an internal bug and should never be observed for
/// well-formed input; `Cancelled` is raised when the caller's cancellation
/// hook reports true.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum CommonError {
    #[error("internal invariant violated: {0}")]
    Invariant(String),
    #[error("the operation was cancelled")]
    Cancelled,
}

impl CommonError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommonError::Invariant(_) => ErrorCode::E901,
            CommonError::Cancelled => ErrorCode::E902,
        }
    }
}
