//! Error types for lexing, parsing, and inference

use serde::{Deserialize, Serialize};

use crate::text::Span;

/// Result type for syntax operations
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Hard failures from the syntax collaborator
///
/// Parse-level problems are deliberately *not* represented here: the parser
/// is error tolerant and reports [`ParseError`]s alongside a partial tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum SyntaxError {
    /// The scanner hit a character the language has no use for
    #[error("illegal character '{ch}' at offset {offset}")]
    IllegalCharacter { ch: char, offset: u32 },

    /// A text literal was opened but never closed
    #[error("unterminated text literal starting at offset {offset}")]
    UnterminatedText { offset: u32 },

    /// A block comment was opened but never closed
    #[error("unterminated comment starting at offset {offset}")]
    UnterminatedComment { offset: u32 },

    /// Cooperative cancellation was requested mid-operation
    #[error("operation canceled")]
    Canceled,
}

/// A recoverable parse problem attached to a partial tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseError {
    /// What the parser was looking for
    pub expected: String,
    /// What it found instead
    pub found: String,
    /// Where the mismatch occurred
    pub span: Span,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {} but found {} at {}..{}",
            self.expected, self.found, self.span.start, self.span.end
        )
    }
}
