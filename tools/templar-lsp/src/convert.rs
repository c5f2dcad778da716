//! Conversions between analyzer values and protocol types.
//!
//! The single place where protocol coordinates are minted: every span
//! leaving the analyzer crosses through here.

use templar_analysis::semantic::{EncodedToken, TokenKind};
use templar_analysis::Severity;
use templar_parse::ParseError;
use templar_source::{position_from_offset, to_protocol, Span};
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, Position, Range, SemanticToken, SemanticTokenModifier,
    SemanticTokenType, SemanticTokensLegend,
};

/// Convert a byte span to a protocol range against its source text.
pub fn span_to_range(text: &str, span: Span) -> Range {
    let start = position_from_offset(text, span.start as usize);
    let end = position_from_offset(text, span.end as usize);
    let (start_line, start_char) = to_protocol(text, &start);
    let (end_line, end_char) = to_protocol(text, &end);
    Range {
        start: Position::new(start_line, start_char),
        end: Position::new(end_line, end_char),
    }
}

fn severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

/// Convert one analyzer diagnostic.
pub fn diagnostic(text: &str, diag: &templar_analysis::Diagnostic) -> Diagnostic {
    Diagnostic {
        range: span_to_range(text, diag.span),
        severity: Some(severity(diag.severity)),
        source: Some("templar".to_owned()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

/// A parse failure becomes a single document-level error diagnostic at the
/// offending delimiter.
pub fn parse_error(text: &str, error: &ParseError) -> Diagnostic {
    Diagnostic {
        range: span_to_range(text, error.span()),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some("templar".to_owned()),
        message: error.to_string(),
        ..Default::default()
    }
}

/// The fixed legend advertised at initialize. Order must match
/// [`TokenKind::ALL`] and the bit positions of the analyzer's modifier set.
pub fn legend() -> SemanticTokensLegend {
    let token_types = TokenKind::ALL
        .iter()
        .map(|kind| match kind {
            TokenKind::Keyword => SemanticTokenType::KEYWORD,
            TokenKind::Operator => SemanticTokenType::OPERATOR,
            TokenKind::Variable => SemanticTokenType::VARIABLE,
            TokenKind::Property => SemanticTokenType::PROPERTY,
            TokenKind::Function => SemanticTokenType::FUNCTION,
            TokenKind::Type => SemanticTokenType::TYPE,
            TokenKind::String => SemanticTokenType::STRING,
            TokenKind::Number => SemanticTokenType::NUMBER,
            TokenKind::Comment => SemanticTokenType::COMMENT,
        })
        .collect();

    SemanticTokensLegend {
        token_types,
        token_modifiers: vec![
            SemanticTokenModifier::DECLARATION,
            SemanticTokenModifier::DEFINITION,
            SemanticTokenModifier::READONLY,
            SemanticTokenModifier::STATIC,
            SemanticTokenModifier::DEPRECATED,
            SemanticTokenModifier::ABSTRACT,
            SemanticTokenModifier::ASYNC,
            SemanticTokenModifier::MODIFICATION,
            SemanticTokenModifier::DOCUMENTATION,
            SemanticTokenModifier::DEFAULT_LIBRARY,
        ],
    }
}

/// Map relative-encoded analyzer tokens onto the wire struct.
pub fn semantic_tokens(encoded: &[EncodedToken]) -> Vec<SemanticToken> {
    encoded
        .iter()
        .map(|t| SemanticToken {
            delta_line: t.delta_line,
            delta_start: t.delta_start,
            length: t.length,
            token_type: t.token_type,
            token_modifiers_bitset: t.token_modifiers,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn span_to_range_multiline() {
        let text = "ab\ncdef";
        let range = span_to_range(text, Span::new(1, 5));
        assert_eq!(range.start, Position::new(0, 1));
        assert_eq!(range.end, Position::new(1, 2));
    }

    #[test]
    fn legend_matches_kind_order() {
        let legend = legend();
        assert_eq!(legend.token_types.len(), TokenKind::ALL.len());
        assert_eq!(legend.token_types[0], SemanticTokenType::KEYWORD);
        assert_eq!(
            legend.token_types[TokenKind::Comment.index() as usize],
            SemanticTokenType::COMMENT
        );
    }
}
