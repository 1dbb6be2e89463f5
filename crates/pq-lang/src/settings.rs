//! Parse session settings.

use std::fmt;
use std::sync::Arc;

use pq_core::error::locale::DEFAULT_LOCALE;

/// User-supplied cancellation hook, consulted at production boundaries.
/// Returning `true` aborts the parse with a cancellation error.
pub type CancellationCallback = Arc<dyn Fn() -> bool + Send + Sync>;

/// Which parser implementation to run. Both produce identical trees; the
/// combinatorial parser fuses binary-operator reads into a single
/// precedence loop and is the default.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum ParserVariant {
    RecursiveDescent,
    #[default]
    Combinatorial,
}

/// Options threaded through a lex/parse session.
#[derive(Clone)]
pub struct Settings {
    /// BCP-47 locale tag used to render error messages.
    pub locale: String,
    pub parser_variant: ParserVariant,
    pub cancellation: Option<CancellationCallback>,
}

impl Settings {
    pub fn with_variant(parser_variant: ParserVariant) -> Self {
        Self {
            parser_variant,
            ..Self::default()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            parser_variant: ParserVariant::default(),
            cancellation: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("locale", &self.locale)
            .field("parser_variant", &self.parser_variant)
            .field("cancellation", &self.cancellation.is_some())
            .finish()
    }
}
