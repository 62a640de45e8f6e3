//! External collaborator boundary: the source-to-bytecode translator.

use thiserror::Error;

/// Error returned by the translator
///
/// The message is shown to the user verbatim, so implementations should
/// already phrase it for human eyes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TranslationError {
    /// Human-readable description of why translation failed
    pub message: String,
}

impl TranslationError {
    /// Creates a translation error from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Source-to-bytecode translator
///
/// The controller only sees this boundary: source text goes in, a binary
/// module image or an error comes out. Implementations must be
/// deterministic: identical source yields a module with identical
/// observable behavior.
pub trait Translator {
    /// Translates source text into a binary module image
    fn translate(&self, source: &str) -> Result<Vec<u8>, TranslationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_error_message_is_verbatim() {
        let err = TranslationError::new("unmatched '[' at byte 2");
        assert_eq!(err.to_string(), "unmatched '[' at byte 2");
    }
}
