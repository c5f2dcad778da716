//! Semantic token classification and relative-delta encoding.

#![allow(clippy::cast_possible_truncation)] // UTF-16 lengths fit u32 by construction

use logos::Logos as _;
use templar_parse::{ActionToken, ParsedTemplateFile};
use templar_source::{LineIndex, Span};

bitflags::bitflags! {
    /// Token modifier bitmask, bit positions matching the legend order the
    /// server advertises.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u32 {
        const DECLARATION     = 1 << 0;
        const DEFINITION      = 1 << 1;
        const READONLY        = 1 << 2;
        const STATIC          = 1 << 3;
        const DEPRECATED      = 1 << 4;
        const ABSTRACT        = 1 << 5;
        const ASYNC           = 1 << 6;
        const MODIFICATION    = 1 << 7;
        const DOCUMENTATION   = 1 << 8;
        const DEFAULT_LIBRARY = 1 << 9;
    }
}

/// Token classification. The discriminant order is the legend order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Operator,
    Variable,
    Property,
    Function,
    Type,
    String,
    Number,
    Comment,
}

impl TokenKind {
    /// Legend order; the server's advertised legend must match this.
    pub const ALL: [TokenKind; 9] = [
        TokenKind::Keyword,
        TokenKind::Operator,
        TokenKind::Variable,
        TokenKind::Property,
        TokenKind::Function,
        TokenKind::Type,
        TokenKind::String,
        TokenKind::Number,
        TokenKind::Comment,
    ];

    /// Index into the legend.
    pub fn index(self) -> u32 {
        self as u32
    }
}

/// A classified token in absolute byte coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSemanticToken {
    pub span: Span,
    pub kind: TokenKind,
    pub modifiers: Modifiers,
}

/// One wire token in the protocol's five-integer relative encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedToken {
    pub delta_line: u32,
    pub delta_start: u32,
    pub length: u32,
    pub token_type: u32,
    pub token_modifiers: u32,
}

/// Classify every highlightable span of the document.
///
/// Works from the parsed file plus a re-lex of each action interior:
/// delimiters and pipe operators, control keywords, strings, numbers,
/// comment actions (with the `gotype:` path classified as a type), field
/// chains, variables, and pipeline call heads.
pub fn collect(text: &str, parsed: &ParsedTemplateFile) -> Vec<RawSemanticToken> {
    let mut out = Vec::new();

    for action in &parsed.actions {
        if action.comment {
            collect_comment(text, parsed, action.span, &mut out);
            continue;
        }

        // Opening and closing delimiters, trim markers included.
        push(&mut out, Span::new(action.span.start, action.inner.start), TokenKind::Operator);
        push(&mut out, Span::new(action.inner.end, action.span.end), TokenKind::Operator);

        let inner = &text[action.inner.to_range()];
        let base = action.inner.start as usize;
        for (tok, range) in ActionToken::lexer(inner).spanned() {
            let Ok(tok) = tok else { continue };
            let span = Span::from_range(base + range.start..base + range.end);
            match tok {
                t if t.is_keyword() => push(&mut out, span, TokenKind::Keyword),
                ActionToken::Pipe | ActionToken::Declare | ActionToken::Assign => {
                    push(&mut out, span, TokenKind::Operator);
                }
                ActionToken::Str | ActionToken::RawStr => {
                    push(&mut out, span, TokenKind::String);
                }
                ActionToken::Number => push(&mut out, span, TokenKind::Number),
                // The bare dot and `$` highlight on their own only when no
                // parsed chain already covers them (`$.Field` spans its `$`).
                ActionToken::Dot | ActionToken::Dollar => {
                    if !parsed.variables.iter().any(|v| v.span.contains_span(span)) {
                        push(&mut out, span, TokenKind::Variable);
                    }
                }
                // Field chains, named variables, and call heads are covered
                // by the parsed entity lists below.
                _ => {}
            }
        }
    }

    for var in &parsed.variables {
        let kind = if var.name.starts_with('$') {
            TokenKind::Variable
        } else {
            TokenKind::Property
        };
        let modifiers = if kind == TokenKind::Variable && is_declaration(text, var.span) {
            Modifiers::DECLARATION
        } else {
            Modifiers::empty()
        };
        out.push(RawSemanticToken {
            span: var.span,
            kind,
            modifiers,
        });
    }

    for call in &parsed.functions {
        push(&mut out, call.span, TokenKind::Function);
    }

    out
}

/// A comment action is comment tokens, unless it carries a type hint: then
/// the dotted path is classified as a type between two comment halves.
/// Comment spans are split at newlines; not every client renders tokens
/// that cross a line boundary.
fn collect_comment(
    text: &str,
    parsed: &ParsedTemplateFile,
    span: Span,
    out: &mut Vec<RawSemanticToken>,
) {
    let hint = parsed
        .type_hints
        .iter()
        .find(|h| span.contains_span(h.span));
    match hint {
        Some(hint) => {
            push_lines(text, out, Span::new(span.start, hint.span.start), TokenKind::Comment);
            push(out, hint.span, TokenKind::Type);
            push_lines(text, out, Span::new(hint.span.end, span.end), TokenKind::Comment);
        }
        None => push_lines(text, out, span, TokenKind::Comment),
    }
}

/// Push one token per line of the span, newlines excluded.
fn push_lines(text: &str, out: &mut Vec<RawSemanticToken>, span: Span, kind: TokenKind) {
    let mut start = span.start as usize;
    for line in text[span.to_range()].split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        push(out, Span::from_range(start..start + content.len()), kind);
        start += line.len();
    }
}

fn push(out: &mut Vec<RawSemanticToken>, span: Span, kind: TokenKind) {
    if !span.is_empty() {
        out.push(RawSemanticToken {
            span,
            kind,
            modifiers: Modifiers::empty(),
        });
    }
}

/// A `$var` span directly followed by `:=` is a declaration site.
fn is_declaration(text: &str, span: Span) -> bool {
    text[span.end as usize..].trim_start().starts_with(":=")
}

/// Sort and delta-encode.
///
/// The sort is stable and ascending by (line, character), so tokens with
/// identical ranges are both emitted, in input order. Delta-line is never
/// negative by construction; the character is relative to the previous
/// token on the same line, absolute otherwise. Lengths are UTF-16 units.
pub fn encode(text: &str, tokens: &[RawSemanticToken]) -> Vec<EncodedToken> {
    let index = LineIndex::new(text);

    let mut positioned: Vec<(u32, u32, &RawSemanticToken)> = tokens
        .iter()
        .map(|t| {
            let (line, character) = index.line_col_utf16(text, t.span.start as usize);
            (line, character, t)
        })
        .collect();
    positioned.sort_by_key(|&(line, character, _)| (line, character));

    let mut out = Vec::with_capacity(positioned.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for (line, character, token) in positioned {
        let delta_line = line - prev_line;
        let delta_start = if delta_line == 0 {
            character - prev_start
        } else {
            character
        };
        let length: u32 = text
            .get(token.span.to_range())
            .unwrap_or("")
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        out.push(EncodedToken {
            delta_line,
            delta_start,
            length,
            token_type: token.kind.index(),
            token_modifiers: token.modifiers.bits(),
        });
        prev_line = line;
        prev_start = character;
    }
    out
}

/// Encode only the tokens whose spans intersect `range`.
pub fn encode_range(
    text: &str,
    tokens: &[RawSemanticToken],
    range: Span,
) -> Vec<EncodedToken> {
    let filtered: Vec<RawSemanticToken> = tokens
        .iter()
        .filter(|t| t.span.overlaps(range))
        .copied()
        .collect();
    encode(text, &filtered)
}

/// Flatten to the wire's `uint32[]` layout.
pub fn flatten(tokens: &[EncodedToken]) -> Vec<u32> {
    let mut data = Vec::with_capacity(tokens.len() * 5);
    for t in tokens {
        data.extend_from_slice(&[
            t.delta_line,
            t.delta_start,
            t.length,
            t.token_type,
            t.token_modifiers,
        ]);
    }
    data
}
