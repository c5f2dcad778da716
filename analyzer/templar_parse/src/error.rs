//! Parse error types.
//!
//! A parse error means the template's action delimiters are malformed; the
//! parser never emits a partial [`crate::ParsedTemplateFile`] alongside one.

use templar_source::Span;
use thiserror::Error;

/// Malformed action delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `{{` with no matching `}}` before the next action or end of text.
    #[error("unclosed action: `{{{{` at offset {} has no matching `}}}}`", span.start)]
    UnclosedAction {
        /// Span of the opening delimiter.
        span: Span,
    },

    /// A `{{/*` comment with no closing `*/`.
    #[error("unterminated comment in action at offset {}", span.start)]
    UnterminatedComment {
        /// Span of the opening delimiter.
        span: Span,
    },
}

impl ParseError {
    /// Span of the offending delimiter.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnclosedAction { span } | ParseError::UnterminatedComment { span } => *span,
        }
    }
}
